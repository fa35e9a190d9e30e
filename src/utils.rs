use regex::Regex;
use std::sync::OnceLock;

const IPV4_PATTERN: &str =
    r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$";

fn ipv4_regex() -> &'static Regex {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    IPV4.get_or_init(|| Regex::new(IPV4_PATTERN).expect("IPv4 pattern is valid"))
}

/// Dotted-quad IPv4 check, as used to validate user-supplied addresses
pub fn is_valid_ipv4(ip: &str) -> bool {
    ipv4_regex().is_match(ip.trim())
}

/// Numeric ASN from strings like `"AS13335"` or `"AS 16509 Amazon"`.
/// All digits are concatenated; no digits means no ASN.
pub fn asn_number(asn: &str) -> Option<u64> {
    let digits: String = asn.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Format a millisecond reading for display
pub fn format_latency(ms: Option<f64>) -> String {
    match ms {
        Some(ms) => format!("{:.0} ms", ms),
        None => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ipv4() {
        assert!(is_valid_ipv4("220.246.84.46"));
        assert!(is_valid_ipv4("0.0.0.0"));
        assert!(is_valid_ipv4(" 8.8.8.8 "));
        assert!(!is_valid_ipv4("256.1.1.1"));
        assert!(!is_valid_ipv4("1.2.3"));
        assert!(!is_valid_ipv4("2001:db8::1"));
        assert!(!is_valid_ipv4("example.com"));
    }

    #[test]
    fn test_asn_number() {
        assert_eq!(asn_number("AS13335"), Some(13335));
        assert_eq!(asn_number("as 16509"), Some(16509));
        assert_eq!(asn_number("14061"), Some(14061));
        assert_eq!(asn_number("none"), None);
        assert_eq!(asn_number(""), None);
    }

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(Some(42.4)), "42 ms");
        assert_eq!(format_latency(None), "Unknown");
    }
}
