use chrono::{NaiveTime, Timelike};

/// Minutes since midnight for an `HH:mm` string.
pub fn parse_time_of_day(value: &str) -> Option<u32> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .ok()
        .map(|t| t.hour() * 60 + t.minute())
}

pub fn format_time_of_day(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Candidate start times from `start`, every `duration_minutes`, for as long as
/// the start itself is before `end`. The last slot may run past `end`.
///
/// Malformed times, `start >= end` and a zero duration all produce no slots.
pub fn generate_slots(start: &str, end: &str, duration_minutes: u32) -> Vec<String> {
    let (Some(start), Some(end)) = (parse_time_of_day(start), parse_time_of_day(end)) else {
        return Vec::new();
    };
    if duration_minutes == 0 {
        return Vec::new();
    }

    (start..end)
        .step_by(duration_minutes as usize)
        .map(format_time_of_day)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_day_half_hour_grid() {
        let slots = generate_slots("09:00", "17:00", 30);
        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first().map(String::as_str), Some("09:00"));
        assert_eq!(slots.last().map(String::as_str), Some("16:30"));
    }

    #[test]
    fn test_hour_grid() {
        assert_eq!(
            generate_slots("09:00", "12:00", 60),
            vec!["09:00", "10:00", "11:00"]
        );
    }

    #[test]
    fn test_last_slot_may_overrun_end() {
        // 09:45 + 45 minutes ends at 10:30, past the 10:00 close.
        assert_eq!(generate_slots("09:00", "10:00", 45), vec!["09:00", "09:45"]);
        assert_eq!(generate_slots("16:50", "17:00", 60), vec!["16:50"]);
    }

    #[test]
    fn test_empty_windows() {
        assert!(generate_slots("17:00", "09:00", 30).is_empty());
        assert!(generate_slots("09:00", "09:00", 30).is_empty());
        assert!(generate_slots("09:00", "17:00", 0).is_empty());
        assert!(generate_slots("nine", "17:00", 30).is_empty());
        assert!(generate_slots("09:00", "25:00", 30).is_empty());
    }

    #[test]
    fn test_output_is_zero_padded() {
        assert_eq!(generate_slots("07:05", "07:20", 5), vec!["07:05", "07:10", "07:15"]);
    }

    #[test]
    fn test_grid_spacing_property() {
        let windows = [("00:00", "23:59"), ("08:15", "12:40"), ("09:00", "17:00"), ("13:07", "13:08")];
        for (start, end) in windows {
            for duration in [1u32, 7, 15, 30, 45, 60, 90, 1000] {
                let slots = generate_slots(start, end, duration);
                let start_min = parse_time_of_day(start).unwrap();
                let end_min = parse_time_of_day(end).unwrap();

                assert_eq!(slots[0], start, "first slot for {}-{} / {}", start, end, duration);
                for (i, slot) in slots.iter().enumerate() {
                    let minutes = parse_time_of_day(slot).unwrap();
                    assert_eq!(minutes, start_min + i as u32 * duration);
                    assert!(minutes < end_min);
                }
                let next = start_min + slots.len() as u32 * duration;
                assert!(next >= end_min, "grid stopped early for {}-{} / {}", start, end, duration);
            }
        }
    }
}
