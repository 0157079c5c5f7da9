use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$").unwrap()
});

/// Lowercase and trim an identifier before validation or lookup.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// A serial number is the 12 hex digits of a MAC address, separators allowed.
pub fn valid_serial_number(serial: &str) -> bool {
    let hex: String = serial.chars().filter(|c| !matches!(c, ':' | '-')).collect();
    hex.len() == 12 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Strip separators down to the bare 12 hex digits.
pub fn serial_digits(serial: &str) -> String {
    serial
        .chars()
        .filter(|c| !matches!(c, ':' | '-'))
        .collect::<String>()
        .to_lowercase()
}

/// Format a 12 hex digit serial as a colon-separated MAC address.
pub fn serial_to_mac(serial: &str) -> String {
    let hex = serial_digits(serial);
    hex.as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(":")
}
