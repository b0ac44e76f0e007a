//! Development IP generator.
//!
//! Local frontends have no real client address to attach to tracking
//! beacons, so dev tooling synthesizes one. A session id always maps to the
//! same IPv4 address (hash-derived, avoiding reserved ranges), and a mock
//! geo lookup provides stable country/city data for an address. The
//! session map is process-local and never persisted.

use once_cell::sync::Lazy;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock geo info for a synthetic address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpInfo {
    pub country: &'static str,
    pub code: &'static str,
    pub city: &'static str,
}

const COUNTRIES: [IpInfo; 10] = [
    IpInfo { country: "United States", code: "US", city: "New York" },
    IpInfo { country: "United Kingdom", code: "GB", city: "London" },
    IpInfo { country: "Germany", code: "DE", city: "Berlin" },
    IpInfo { country: "France", code: "FR", city: "Paris" },
    IpInfo { country: "Japan", code: "JP", city: "Tokyo" },
    IpInfo { country: "Canada", code: "CA", city: "Toronto" },
    IpInfo { country: "Australia", code: "AU", city: "Sydney" },
    IpInfo { country: "Netherlands", code: "NL", city: "Amsterdam" },
    IpInfo { country: "Singapore", code: "SG", city: "Singapore" },
    IpInfo { country: "Brazil", code: "BR", city: "São Paulo" },
];

/// Regions for [`IpGenerator::realistic_ip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpRegion {
    Us,
    Eu,
    Asia,
    Random,
}

/// Session-consistent synthetic IPv4 generator.
#[derive(Default)]
pub struct IpGenerator {
    session_ips: Mutex<HashMap<String, String>>,
}

static SHARED: Lazy<IpGenerator> = Lazy::new(IpGenerator::default);

impl IpGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide generator used by dev tooling.
    pub fn shared() -> &'static IpGenerator {
        &SHARED
    }

    /// Returns the IPv4 address for a session, generating and caching it on
    /// first sight. The same session id always yields the same address.
    pub fn session_ip(&self, session_id: &str) -> String {
        let mut cache = self
            .session_ips
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(ip) = cache.get(session_id) {
            return ip.clone();
        }
        let digest = Sha256::digest(session_id.as_bytes());
        // First octet stays in 1-223, last in 1-254, keeping clear of
        // reserved and broadcast ranges.
        let ip = format!(
            "{}.{}.{}.{}",
            digest[0] as u16 % 223 + 1,
            digest[1] as u16 % 255,
            digest[2] as u16 % 255,
            digest[3] as u16 % 254 + 1,
        );
        cache.insert(session_id.to_string(), ip.clone());
        ip
    }

    /// Random realistic-looking address for a region. Non-deterministic, for
    /// seeding demo traffic.
    pub fn realistic_ip(&self, region: IpRegion) -> String {
        let mut rng = rand::rng();
        match region {
            IpRegion::Us => {
                const US_PREFIXES: [[u8; 2]; 4] = [[8, 8], [208, 67], [173, 252], [199, 16]];
                let prefix = US_PREFIXES[rng.random_range(0..US_PREFIXES.len())];
                format!(
                    "{}.{}.{}.{}",
                    prefix[0],
                    prefix[1],
                    rng.random_range(0..255),
                    rng.random_range(1..=254),
                )
            }
            IpRegion::Eu => format!(
                "{}.{}.{}.{}",
                rng.random_range(80..130),
                rng.random_range(0..255),
                rng.random_range(0..255),
                rng.random_range(1..=254),
            ),
            IpRegion::Asia => format!(
                "{}.{}.{}.{}",
                rng.random_range(110..160),
                rng.random_range(0..255),
                rng.random_range(0..255),
                rng.random_range(1..=254),
            ),
            IpRegion::Random => format!(
                "{}.{}.{}.{}",
                rng.random_range(1..=223),
                rng.random_range(0..255),
                rng.random_range(0..255),
                rng.random_range(1..=254),
            ),
        }
    }

    /// Stable mock geo lookup over a fixed 10-country table.
    pub fn ip_info(&self, ip: &str) -> IpInfo {
        let digest = Sha256::digest(ip.as_bytes());
        COUNTRIES[digest[0] as usize % COUNTRIES.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octets(ip: &str) -> Vec<u16> {
        ip.split('.').map(|o| o.parse().unwrap()).collect()
    }

    #[test]
    fn session_ip_is_stable_per_session() {
        let generator = IpGenerator::new();
        let first = generator.session_ip("session-abc");
        let second = generator.session_ip("session-abc");
        assert_eq!(first, second);
        assert_ne!(first, generator.session_ip("session-xyz"));
    }

    #[test]
    fn session_ip_avoids_reserved_octets() {
        let generator = IpGenerator::new();
        for i in 0..64 {
            let ip = generator.session_ip(&format!("session-{i}"));
            let parts = octets(&ip);
            assert_eq!(parts.len(), 4);
            assert!((1..=223).contains(&parts[0]), "bad first octet in {ip}");
            assert!((1..=254).contains(&parts[3]), "bad last octet in {ip}");
        }
    }

    #[test]
    fn realistic_ip_has_four_octets() {
        let generator = IpGenerator::new();
        for region in [IpRegion::Us, IpRegion::Eu, IpRegion::Asia, IpRegion::Random] {
            let ip = generator.realistic_ip(region);
            assert_eq!(octets(&ip).len(), 4);
        }
    }

    #[test]
    fn ip_info_is_deterministic() {
        let generator = IpGenerator::new();
        let a = generator.ip_info("93.184.216.34");
        let b = generator.ip_info("93.184.216.34");
        assert_eq!(a, b);
    }
}
