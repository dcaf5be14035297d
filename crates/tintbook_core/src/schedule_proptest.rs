#[cfg(test)]
mod tests {
    use crate::schedule::ScheduleRules;
    use chrono::Timelike;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use tintbook_config::{HoursBlock, ScheduleConfig};

    fn config_with_block(
        weekday: u8,
        start_min: u32,
        end_min: u32,
        duration: u32,
    ) -> ScheduleConfig {
        let mut hours = HashMap::new();
        hours.insert(
            weekday.to_string(),
            vec![HoursBlock {
                start: format!("{:02}:{:02}", start_min / 60, start_min % 60),
                end: format!("{:02}:{:02}", end_min / 60, end_min % 60),
            }],
        );
        ScheduleConfig {
            slot_duration_minutes: duration,
            adjacency_weekday: 6,
            time_zone: None,
            hours,
        }
    }

    fn minutes(t: chrono::NaiveTime) -> u32 {
        t.hour() * 60 + t.minute()
    }

    proptest! {
        // No generated slot overruns its opening block, and every slot has
        // exactly the configured duration.
        #[test]
        fn slots_fit_the_block(
            weekday in 0u8..7,
            start_min in (0u32..1200).prop_map(|m| m - m % 5),
            extent in (30u32..600).prop_map(|m| m - m % 5),
            duration in (15u32..180).prop_map(|m| m - m % 5),
        ) {
            let end_min = (start_min + extent).min(23 * 60 + 59);
            prop_assume!(end_min > start_min);
            let cfg = config_with_block(weekday, start_min, end_min, duration);
            let rules = ScheduleRules::from_config(&cfg).unwrap();
            let slots = rules.generate_slots(weekday);

            for slot in &slots {
                prop_assert!(minutes(slot.start) >= start_min);
                prop_assert!(minutes(slot.end) <= end_min);
                prop_assert_eq!(minutes(slot.end) - minutes(slot.start), duration);
            }
        }

        // Slots are strictly ordered and non-overlapping, and their count is
        // exactly the number of whole durations that fit.
        #[test]
        fn slots_are_ordered_and_exhaustive(
            start_min in (0u32..1200).prop_map(|m| m - m % 5),
            extent in (30u32..600).prop_map(|m| m - m % 5),
            duration in (15u32..180).prop_map(|m| m - m % 5),
        ) {
            let end_min = (start_min + extent).min(23 * 60 + 59);
            prop_assume!(end_min > start_min);
            let cfg = config_with_block(6, start_min, end_min, duration);
            let rules = ScheduleRules::from_config(&cfg).unwrap();
            let slots = rules.generate_slots(6);

            prop_assert_eq!(slots.len() as u32, (end_min - start_min) / duration);
            for pair in slots.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
        }

        // Pure function: same input, same output, and other weekdays are
        // untouched.
        #[test]
        fn generation_is_deterministic_and_scoped(
            weekday in 0u8..7,
            duration in (15u32..180).prop_map(|m| m - m % 5),
        ) {
            let cfg = config_with_block(weekday, 9 * 60, 17 * 60, duration);
            let rules = ScheduleRules::from_config(&cfg).unwrap();
            prop_assert_eq!(rules.generate_slots(weekday), rules.generate_slots(weekday));
            let other = (weekday + 1) % 7;
            prop_assert!(rules.generate_slots(other).is_empty());
        }
    }
}
