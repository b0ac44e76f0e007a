//! Pagination and filter-building helpers shared by the list endpoints.
//!
//! Every list endpoint speaks the same contract:
//! `{ <items>, total, page, limit, totalPages }` where `totalPages` is
//! `ceil(total / limit)` and `total` counts the filtered set. The helpers
//! here keep the per-entity handlers down to their filter columns and sort
//! order.

use sqlx::{Postgres, QueryBuilder};

/// Normalizes `page`/`limit` query inputs and derives the row offset.
///
/// Pages are 1-based; zero or negative inputs are clamped.
pub fn page_window(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).max(1);
    (page, limit, (page - 1) * limit)
}

/// `ceil(total / limit)`; `limit` has been clamped to >= 1 by
/// [`page_window`].
pub fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

/// Tracks whether a `WHERE` has been emitted yet, so filters can be appended
/// in any combination. The same filter sequence is applied to both the page
/// query and the count query.
#[derive(Default)]
pub struct SqlWhere {
    started: bool,
}

impl SqlWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `WHERE ` on first use and `AND ` afterwards.
    pub fn prefix(&mut self, qb: &mut QueryBuilder<'_, Postgres>) {
        if self.started {
            qb.push(" AND ");
        } else {
            qb.push(" WHERE ");
            self.started = true;
        }
    }
}

/// Appends a case-insensitive substring match OR'd across `columns`.
///
/// A column entry may be any SQL expression yielding text, e.g.
/// `array_to_string(expertise, ' ')`.
pub fn push_search(
    qb: &mut QueryBuilder<'_, Postgres>,
    clause: &mut SqlWhere,
    term: &str,
    columns: &[&str],
) {
    clause.prefix(qb);
    qb.push("(");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column);
        qb.push(" ILIKE ");
        qb.push_bind(format!("%{term}%"));
    }
    qb.push(")");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_applies_defaults_and_clamps() {
        assert_eq!(page_window(None, None, 10), (1, 10, 0));
        assert_eq!(page_window(Some(3), Some(20), 10), (3, 20, 40));
        assert_eq!(page_window(Some(0), Some(0), 10), (1, 1, 0));
        assert_eq!(page_window(Some(-2), None, 20), (1, 20, 0));
    }

    #[test]
    fn total_pages_is_ceiling() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(3, 1), 3);
    }

    #[test]
    fn search_clause_ors_across_columns() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM projects");
        let mut clause = SqlWhere::new();
        push_search(&mut qb, &mut clause, "site", &["title", "description"]);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM projects WHERE (title ILIKE $1 OR description ILIKE $2)"
        );
    }

    #[test]
    fn second_filter_gets_and_prefix() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM projects");
        let mut clause = SqlWhere::new();
        push_search(&mut qb, &mut clause, "site", &["title"]);
        clause.prefix(&mut qb);
        qb.push("is_active = ");
        qb.push_bind(true);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM projects WHERE (title ILIKE $1) AND is_active = $2"
        );
    }
}
