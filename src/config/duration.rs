// Author: Dustin Pilgrim
// License: MIT

/// Parse a human duration into milliseconds.
///
/// Parts are `<number><unit>` separated by whitespace and summed, e.g.
/// `1h 30m` or `250ms`. A bare number counts as seconds.
pub fn parse_duration_ms(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total_ms = 0u64;

    for part in trimmed.split_whitespace() {
        // Find where the number ends and unit begins
        let split_pos = part
            .chars()
            .position(|c| !c.is_ascii_digit())
            .unwrap_or(part.len());

        let (num_str, unit) = part.split_at(split_pos);
        let num: u64 = num_str
            .parse()
            .map_err(|_| format!("invalid number: '{}'", num_str))?;

        let multiplier = match unit.to_lowercase().as_str() {
            "ms" | "msec" | "msecs" | "millis" => 1,
            "" | "s" | "sec" | "secs" | "second" | "seconds" => 1_000,
            "m" | "min" | "mins" | "minute" | "minutes" => 60_000,
            "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000,
            _ => return Err(format!("unknown time unit: '{}' (use ms, s, m, or h)", unit)),
        };

        total_ms = num
            .checked_mul(multiplier)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| format!("duration too large: '{}'", trimmed))?;
    }

    Ok(total_ms)
}

/// Inverse of [`parse_duration_ms`] for display, using the largest exact units.
pub fn format_duration_ms(ms: u64) -> String {
    if ms == 0 {
        return "0s".to_string();
    }

    let units = [(3_600_000, "h"), (60_000, "m"), (1_000, "s"), (1, "ms")];
    let mut rest = ms;
    let mut parts = Vec::new();

    for (size, name) in units {
        if rest >= size {
            parts.push(format!("{}{}", rest / size, name));
            rest %= size;
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_units_and_sums_parts() {
        assert_eq!(parse_duration_ms("15m"), Ok(900_000));
        assert_eq!(parse_duration_ms("1h 30m"), Ok(5_400_000));
        assert_eq!(parse_duration_ms("250ms"), Ok(250));
        assert_eq!(parse_duration_ms("2 5s"), Ok(7_000));
        assert_eq!(parse_duration_ms("0"), Ok(0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration_ms("").is_err());
        assert!(parse_duration_ms("5 fortnights").is_err());
        assert!(parse_duration_ms("-1s").is_err());
        assert!(parse_duration_ms("99999999999999999999h").is_err());
    }

    #[test]
    fn formats_exact_units() {
        assert_eq!(format_duration_ms(900_000), "15m");
        assert_eq!(format_duration_ms(5_400_250), "1h 30m 250ms");
        assert_eq!(format_duration_ms(0), "0s");
    }
}
