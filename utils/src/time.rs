//! Duration formatting for board terms and election windows.

const UNITS: &[(u64, &str)] = &[
    (7 * 86_400, "w"),
    (86_400, "d"),
    (3_600, "h"),
    (60, "m"),
    (1, "s"),
];

/// Format seconds as the two largest units, e.g. `"24w 0d"` or `"20m 0s"`.
pub fn format_duration(secs: u64) -> String {
    let Some(i) = UNITS.iter().position(|(size, _)| secs >= *size) else {
        return "0s".to_string();
    };
    let (size, unit) = UNITS[i];
    match UNITS.get(i + 1) {
        Some(&(next, next_unit)) => {
            format!("{}{} {}{}", secs / size, unit, secs % size / next, next_unit)
        }
        None => format!("{}{}", secs, unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_two_largest_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(1_200), "20m 0s");
        assert_eq!(format_duration(7_260), "2h 1m");
        assert_eq!(format_duration(2_000_000), "3w 2d");
        assert_eq!(format_duration(14_515_200), "24w 0d");
    }
}
