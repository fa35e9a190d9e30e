//! Deterministic risk estimator
//!
//! Stands in for a threat-feed response: a 32-bit rolling string hash of
//! `ip + check_name` mapped onto [0, 1). Values must stay bit-for-bit stable
//! across processes so golden tests keep matching.

/// Reserved, private, loopback, link-local and multicast IPv4 blocks, as
/// inclusive per-octet bounds.
const RESERVED_RANGES: &[([u32; 4], [u32; 4])] = &[
    ([0, 0, 0, 0], [0, 255, 255, 255]),
    ([10, 0, 0, 0], [10, 255, 255, 255]),
    ([127, 0, 0, 0], [127, 255, 255, 255]),
    ([169, 254, 0, 0], [169, 254, 255, 255]),
    ([172, 16, 0, 0], [172, 31, 255, 255]),
    ([192, 168, 0, 0], [192, 168, 255, 255]),
    ([224, 0, 0, 0], [255, 255, 255, 255]),
];

/// `hash = (hash << 5) - hash + unit` over UTF-16 code units, wrapping at 32 bits.
pub fn rolling_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    })
}

/// Pseudo-probability in [0, 1) for an (ip, check) pair
pub fn estimate(ip: &str, check_name: &str) -> f64 {
    let hash = i64::from(rolling_hash(&format!("{}{}", ip, check_name))).abs();
    (hash % 1000) as f64 / 1000.0
}

/// Per-octet values of a dotted address. A missing or non-numeric octet is
/// `None` and compares as inside every range, so short or garbled addresses
/// count as reserved. An empty octet reads as 0.
fn octets(ip: &str) -> [Option<f64>; 4] {
    let mut parts = ip.trim().split('.');
    let mut out = [None; 4];
    for slot in &mut out {
        *slot = parts.next().and_then(|part| {
            let part = part.trim();
            if part.is_empty() {
                Some(0.0)
            } else {
                part.parse::<f64>().ok().filter(|v| !v.is_nan())
            }
        });
    }
    out
}

/// True when `ip` falls in a block no threat feed would ever list.
pub fn is_reserved_ip(ip: &str) -> bool {
    let parts = octets(ip);
    RESERVED_RANGES.iter().any(|(start, end)| {
        parts
            .iter()
            .zip(start.iter().zip(end.iter()))
            .all(|(octet, (lo, hi))| match octet {
                Some(v) => *v >= f64::from(*lo) && *v <= f64::from(*hi),
                None => true,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_hash_known_values() {
        assert_eq!(rolling_hash(""), 0);
        assert_eq!(rolling_hash("a"), 97);
        assert_eq!(rolling_hash("hello"), 99162322);
    }

    #[test]
    fn test_estimate_golden_values() {
        assert_eq!(estimate("220.246.84.46", "malware"), 0.959);
        assert_eq!(estimate("220.246.84.46", "spam"), 0.429);
        assert_eq!(estimate("220.246.84.46", "botnet"), 0.074);
        assert_eq!(estimate("220.246.84.46", "attack"), 0.964);
        assert_eq!(estimate("220.246.84.46", "phishing"), 0.56);
        assert_eq!(estimate("8.8.8.8", "phishing"), 0.89);
        assert_eq!(estimate("1.2.3.4", "spam"), 0.935);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(estimate("45.33.32.156", "malware"), 0.855);
        }
        assert_ne!(estimate("45.33.32.156", "malware"), estimate("45.33.32.156", "spam"));
        assert_ne!(estimate("45.33.32.156", "malware"), estimate("8.8.8.8", "malware"));
    }

    #[test]
    fn test_estimate_range() {
        for ip in ["1.1.1.1", "203.0.113.7", "255.255.255.254", "not-an-ip", "::1"] {
            let p = estimate(ip, "botnet");
            assert!((0.0..1.0).contains(&p), "{} -> {}", ip, p);
        }
    }

    #[test]
    fn test_reserved_ranges() {
        for ip in [
            "0.1.2.3",
            "10.0.0.1",
            "10.255.255.255",
            "127.0.0.1",
            "169.254.10.20",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.1",
            "224.0.0.251",
            "255.255.255.255",
        ] {
            assert!(is_reserved_ip(ip), "{} should be reserved", ip);
        }
        for ip in ["172.32.0.1", "172.15.255.255", "8.8.8.8", "223.255.255.255", "8.8"] {
            assert!(!is_reserved_ip(ip), "{} should not be reserved", ip);
        }
    }

    #[test]
    fn test_short_or_garbled_address_is_reserved() {
        // Missing octets match any bound
        assert!(is_reserved_ip("10.1"));
        assert!(is_reserved_ip("192.168"));
        assert!(is_reserved_ip("Unknown"));
        assert!(is_reserved_ip("10.x.1.1"));
        assert!(!is_reserved_ip("11.x.1.1"));
        // Empty octets read as zero
        assert!(is_reserved_ip("0..."));
    }
}
