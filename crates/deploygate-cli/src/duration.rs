use std::time::Duration;

/// Longest duration accepted on the command line.
pub const MAX_DURATION: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Parse `500ms`, `30s`, `10m`, `2h`, `1d`. A bare number is seconds.
/// Anything longer than [`MAX_DURATION`] is refused.
pub fn parse_duration_arg(input: &str) -> Option<Duration> {
    parse_unbounded(input).filter(|d| *d <= MAX_DURATION)
}

fn parse_unbounded(input: &str) -> Option<Duration> {
    let s = input.trim().to_ascii_lowercase();
    if s.is_empty() {
        return None;
    }
    let (digits, unit) = if let Some(d) = s.strip_suffix("ms") {
        (d, "ms")
    } else if s.ends_with(|c: char| c.is_ascii_alphabetic()) {
        s.split_at(s.len() - 1)
    } else {
        (s.as_str(), "s")
    };
    let value = digits.parse::<u64>().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(60 * 60).map(Duration::from_secs),
        "d" => value.checked_mul(24 * 60 * 60).map(Duration::from_secs),
        _ => None,
    }
}

/// clap `value_parser` adapter.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    parse_duration_arg(input)
        .ok_or_else(|| format!("invalid duration '{input}' (expected e.g. 500ms, 30s, 10m, 2h)"))
}
