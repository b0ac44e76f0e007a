//! Startup seed data for demo and test environments.
//!
//! Each seedable collection is filled with fixed sample rows only when it is
//! completely empty. The emptiness check is the only idempotence guarantee;
//! partially seeded state is left alone.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

fn day(date: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&format!("{date}T00:00:00Z"))
        .expect("valid seed date")
        .with_timezone(&Utc)
}

/// Seeds testimonials and contacts when their tables are empty.
pub async fn seed_sample_data(pool: &PgPool) -> sqlx::Result<()> {
    seed_testimonials(pool).await?;
    seed_contacts(pool).await?;
    Ok(())
}

async fn seed_testimonials(pool: &PgPool) -> sqlx::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM testimonials")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    // (name, company, position, rating, testimonial, featured, order, date)
    let samples: [(&str, &str, &str, i32, &str, bool, i32, &str); 5] = [
        (
            "Sarah Johnson",
            "Global Tech Solutions",
            "CTO",
            5,
            "Professional team with great attention to detail. Their expertise in web development exceeded our expectations. Will definitely work with them again on future projects.",
            true,
            1,
            "2024-12-24",
        ),
        (
            "David Chen",
            "Innovate Inc",
            "Product Manager",
            4,
            "The platform they built is intuitive and easy to use. The support team was very helpful throughout the development process. Great communication and timely delivery.",
            false,
            2,
            "2024-12-20",
        ),
        (
            "Emily Rodriguez",
            "StartupXYZ",
            "Founder & CEO",
            5,
            "Exceeded our expectations in every way. The team delivered a high-quality solution that perfectly matched our requirements. Highly recommend their services to anyone looking for professional web development.",
            true,
            3,
            "2024-12-18",
        ),
        (
            "Michael Thompson",
            "TechCorp Ltd",
            "Lead Developer",
            5,
            "Outstanding work quality and timely delivery. The code is clean, well-documented, and follows best practices. Great communication throughout the project lifecycle.",
            false,
            4,
            "2024-12-15",
        ),
        (
            "Lisa Wang",
            "Digital Dynamics",
            "Marketing Director",
            4,
            "Professional service and excellent results. The website they created has significantly improved our online presence and user engagement. Very satisfied with the outcome.",
            false,
            5,
            "2024-12-10",
        ),
    ];

    for (name, company, position, rating, testimonial, featured, order, date) in samples {
        let stamp = day(date);
        sqlx::query(
            r#"INSERT INTO testimonials
               (id, name, company, position, rating, testimonial, featured, active, display_order, date, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9, $10, $10)"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(company)
        .bind(position)
        .bind(rating)
        .bind(testimonial)
        .bind(featured)
        .bind(order)
        .bind(date)
        .bind(stamp)
        .execute(pool)
        .await?;
    }

    tracing::info!("sample testimonials seeded");
    Ok(())
}

async fn seed_contacts(pool: &PgPool) -> sqlx::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    // (name, email, phone, subject, message, status, created, read, replied)
    let samples: [(&str, &str, &str, &str, &str, &str, &str, Option<&str>, Option<&str>); 3] = [
        (
            "Akash Rahman",
            "akash@gmail.com",
            "01814726978",
            "Need a website",
            "Hello, I am looking for a professional website for my business. Can you help me with this project?",
            "read",
            "2024-12-29",
            Some("2024-12-29"),
            None,
        ),
        (
            "Sarah Johnson",
            "sarah@example.com",
            "01712345678",
            "Project Inquiry",
            "I would like to discuss a new project for my startup. We need a complete web solution with modern design.",
            "new",
            "2024-12-28",
            None,
            None,
        ),
        (
            "Mike Chen",
            "mike@company.com",
            "01987654321",
            "Support Request",
            "Having issues with the current system. The dashboard is not loading properly and we need urgent assistance.",
            "replied",
            "2024-12-27",
            Some("2024-12-27"),
            Some("2024-12-27"),
        ),
    ];

    for (name, email, phone, subject, message, status, created, read, replied) in samples {
        let stamp = day(created);
        sqlx::query(
            r#"INSERT INTO contacts
               (id, name, email, phone, subject, message, status, read_at, replied_at, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(subject)
        .bind(message)
        .bind(status)
        .bind(read.map(day))
        .bind(replied.map(day))
        .bind(stamp)
        .execute(pool)
        .await?;
    }

    tracing::info!("sample contacts seeded");
    Ok(())
}
