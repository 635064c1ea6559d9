//! Human-readable rendering of API values.

/// Renders an ISO 8601 duration such as `PT1H2M3S` as `1:02:03`.
///
/// Durations under an hour render as `M:SS`. Missing components count as zero, and a day
/// component (used by the API for very long streams) adds 24 hours per day.
pub fn parse_duration(duration: &str) -> String {
    let mut days = 0u64;
    let mut hours = 0u64;
    let mut minutes = 0u64;
    let mut seconds = 0u64;

    let mut in_time = false;
    let mut number = String::new();
    for c in duration.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' => number.push(c),
            unit => {
                let value = number.parse().unwrap_or(0);
                number.clear();
                match (unit, in_time) {
                    ('D', false) => days = value,
                    ('H', true) => hours = value,
                    ('M', true) => minutes = value,
                    ('S', true) => seconds = value,
                    _ => {}
                }
            }
        }
    }

    let hours = hours + days * 24;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Abbreviates large counts: `1234` becomes `1.2K`, `5_600_000` becomes `5.6M`.
pub fn format_number(n: u64) -> String {
    const SUFFIXES: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];
    for (scale, suffix) in SUFFIXES {
        if n >= scale {
            return format!("{:.1}{suffix}", n as f64 / scale as f64);
        }
    }
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(parse_duration("PT1H2M3S"), "1:02:03");
        assert_eq!(parse_duration("PT4M5S"), "4:05");
        assert_eq!(parse_duration("PT45S"), "0:45");
        assert_eq!(parse_duration("PT2H"), "2:00:00");
        assert_eq!(parse_duration("PT10M"), "10:00");
        assert_eq!(parse_duration("P1DT2H3M4S"), "26:03:04");
        assert_eq!(parse_duration("P0D"), "0:00");
        assert_eq!(parse_duration(""), "0:00");
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1.0K");
        assert_eq!(format_number(1_234), "1.2K");
        assert_eq!(format_number(5_600_000), "5.6M");
        assert_eq!(format_number(2_500_000_000), "2.5B");
    }
}
