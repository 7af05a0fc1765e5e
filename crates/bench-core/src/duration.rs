//! Duration parsing for CLI flags.

use std::time::Duration;

/// Parse a duration string like "100ms", "1s", "2m", "1h" or "5".
///
/// Supports:
/// - Plain numbers (interpreted as seconds): "5"
/// - Milliseconds suffix: "100ms"
/// - Seconds suffix: "1s"
/// - Minutes suffix: "2m"
/// - Hours suffix: "1h"
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Empty duration string".to_string());
    }

    // "ms" must be checked before "m" and "s"
    if let Some(num_str) = s.strip_suffix("ms") {
        return parse_number(num_str, "milliseconds").map(Duration::from_millis);
    }
    if let Some(num_str) = s.strip_suffix('h') {
        return scaled_secs(parse_number(num_str, "hours")?, 3600, s);
    }
    if let Some(num_str) = s.strip_suffix('m') {
        return scaled_secs(parse_number(num_str, "minutes")?, 60, s);
    }
    if let Some(num_str) = s.strip_suffix('s') {
        return parse_number(num_str, "seconds").map(Duration::from_secs);
    }

    // No suffix - treat as seconds
    parse_number(s, "duration").map(Duration::from_secs)
}

fn scaled_secs(value: u64, factor: u64, input: &str) -> Result<Duration, String> {
    value
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Duration '{input}' is too large"))
}

fn parse_number(num_str: &str, unit: &str) -> Result<u64, String> {
    num_str
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("Invalid {unit} value '{num_str}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration(" 5 ").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("1.5s").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        assert!(parse_duration("18446744073709551615h").is_err());
        assert!(parse_duration("18446744073709551615m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }
}
