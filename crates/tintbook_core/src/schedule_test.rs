#[cfg(test)]
mod tests {
    use crate::schedule::{parse_wall_time, weekday_of, ScheduleRules};
    use chrono::{NaiveDate, NaiveTime};
    use tintbook_config::{HoursBlock, ScheduleConfig};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rules() -> ScheduleRules {
        ScheduleRules::from_config(&ScheduleConfig::default()).unwrap()
    }

    #[test]
    fn weekday_is_sunday_indexed() {
        // 2025-05-04 is a Sunday, 2025-05-05 a Monday, 2025-05-10 a Saturday
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2025, 5, 4).unwrap()), 0);
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()), 1);
        assert_eq!(weekday_of(NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()), 6);
    }

    #[test]
    fn sunday_has_two_morning_slots() {
        let slots = rules().generate_slots(0);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start, t(10, 0));
        assert_eq!(slots[0].end, t(11, 0));
        assert_eq!(slots[1].start, t(11, 0));
        assert_eq!(slots[1].end, t(12, 0));
    }

    #[test]
    fn monday_is_closed() {
        assert!(rules().generate_slots(1).is_empty());
    }

    #[test]
    fn saturday_has_eight_slots() {
        let slots = rules().generate_slots(6);
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].start, t(9, 0));
        assert_eq!(slots[7].start, t(16, 0));
        assert_eq!(slots[7].end, t(17, 0));
    }

    #[test]
    fn partial_trailing_slot_is_dropped() {
        let mut cfg = ScheduleConfig::default();
        cfg.hours.insert(
            "2".to_string(),
            vec![HoursBlock {
                start: "14:00".to_string(),
                end: "15:30".to_string(),
            }],
        );
        let slots = ScheduleRules::from_config(&cfg).unwrap().generate_slots(2);
        // 14:00-15:00 fits, 15:00-16:00 would overrun the block
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end, t(15, 0));
    }

    #[test]
    fn block_shorter_than_slot_yields_nothing() {
        let mut cfg = ScheduleConfig::default();
        cfg.hours.insert(
            "2".to_string(),
            vec![HoursBlock {
                start: "14:00".to_string(),
                end: "14:45".to_string(),
            }],
        );
        assert!(ScheduleRules::from_config(&cfg)
            .unwrap()
            .generate_slots(2)
            .is_empty());
    }

    #[test]
    fn generation_is_deterministic() {
        let r = rules();
        assert_eq!(r.generate_slots(6), r.generate_slots(6));
        let date = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        assert_eq!(r.generate_slots_for_date(date), r.generate_slots(6));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = ScheduleConfig::default();
        cfg.slot_duration_minutes = 0;
        assert!(ScheduleRules::from_config(&cfg).is_err());

        let mut cfg = ScheduleConfig::default();
        cfg.hours.insert(
            "2".to_string(),
            vec![HoursBlock {
                start: "17:00".to_string(),
                end: "14:00".to_string(),
            }],
        );
        assert!(ScheduleRules::from_config(&cfg).is_err());

        let mut cfg = ScheduleConfig::default();
        cfg.hours.insert(
            "2".to_string(),
            vec![
                HoursBlock {
                    start: "14:00".to_string(),
                    end: "16:00".to_string(),
                },
                HoursBlock {
                    start: "15:00".to_string(),
                    end: "17:00".to_string(),
                },
            ],
        );
        assert!(ScheduleRules::from_config(&cfg).is_err());

        let mut cfg = ScheduleConfig::default();
        cfg.hours.insert("7".to_string(), Vec::new());
        assert!(ScheduleRules::from_config(&cfg).is_err());

        let mut cfg = ScheduleConfig::default();
        cfg.time_zone = Some("Mars/Olympus_Mons".to_string());
        assert!(ScheduleRules::from_config(&cfg).is_err());
    }

    #[test]
    fn wall_time_parsing() {
        assert_eq!(parse_wall_time("09:30").unwrap(), t(9, 30));
        assert_eq!(parse_wall_time("09:30:00").unwrap(), t(9, 30));
        assert!(parse_wall_time("9h30").is_err());
        assert!(parse_wall_time("25:00").is_err());
    }

    #[test]
    fn adjacency_blocks_the_slot_an_hour_later() {
        assert_eq!(
            ScheduleRules::adjacent_blocked_start(t(9, 0)),
            Some(t(10, 0))
        );
        // no candidate an hour after a late start
        assert_eq!(ScheduleRules::adjacent_blocked_start(t(23, 30)), None);
    }
}
