#[cfg(test)]
mod tests {
    use crate::logic::free_slots;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;
    use tailortalk_common::{TimeInterval, WorkWindow};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    // Minutes since midnight, so busy intervals may start before or end after the window
    fn minutes(m: i64) -> NaiveDateTime {
        base() + Duration::minutes(m)
    }

    fn busy_strategy() -> impl Strategy<Value = Vec<TimeInterval<NaiveDateTime>>> {
        prop::collection::vec((0..1440i64, 1..240i64), 0..12).prop_map(|pairs| {
            pairs
                .into_iter()
                .filter_map(|(start, len)| TimeInterval::new(minutes(start), minutes(start + len)))
                .collect()
        })
    }

    proptest! {
        // Every slot is long enough and lies inside the window
        #[test]
        fn test_slots_within_window_and_long_enough(
            busy in busy_strategy(),
            window_start in 0..720i64,
            window_len in 30..720i64,
            min_minutes in 1..180i64,
        ) {
            let window = WorkWindow::new(minutes(window_start), minutes(window_start + window_len)).unwrap();
            let min_duration = Duration::minutes(min_minutes);

            for slot in free_slots(&busy, &window, min_duration) {
                prop_assert!(slot.duration() >= min_duration);
                prop_assert!(slot.start() >= window.start());
                prop_assert!(slot.end() <= window.end());
            }
        }

        // Slots are sorted and pairwise disjoint
        #[test]
        fn test_slots_sorted_and_disjoint(
            busy in busy_strategy(),
            min_minutes in 0..120i64,
        ) {
            let window = WorkWindow::new(minutes(540), minutes(1080)).unwrap();
            let slots = free_slots(&busy, &window, Duration::minutes(min_minutes));

            for pair in slots.windows(2) {
                prop_assert!(pair[0].end() <= pair[1].start());
                prop_assert!(!pair[0].overlaps(&pair[1]));
            }
        }

        // No slot overlaps a busy interval
        #[test]
        fn test_slots_never_overlap_busy(
            busy in busy_strategy(),
            min_minutes in 0..120i64,
        ) {
            let window = WorkWindow::new(minutes(540), minutes(1080)).unwrap();
            let slots = free_slots(&busy, &window, Duration::minutes(min_minutes));

            for slot in &slots {
                for interval in &busy {
                    prop_assert!(!slot.overlaps(interval), "{} overlaps busy {}", slot, interval);
                }
            }
        }

        // Input order does not matter
        #[test]
        fn test_slots_independent_of_busy_order(
            busy in busy_strategy(),
            min_minutes in 1..120i64,
        ) {
            let window = WorkWindow::new(minutes(540), minutes(1080)).unwrap();
            let min_duration = Duration::minutes(min_minutes);

            let mut reversed = busy.clone();
            reversed.reverse();
            prop_assert_eq!(
                free_slots(&busy, &window, min_duration),
                free_slots(&reversed, &window, min_duration)
            );
        }

        // Free plus busy covers the window when nothing is filtered out
        #[test]
        fn test_any_gap_slots_cover_free_time(busy in busy_strategy()) {
            let window = WorkWindow::new(minutes(540), minutes(1080)).unwrap();
            let slots = free_slots(&busy, &window, Duration::zero());

            let mut minute = window.start();
            while minute < window.end() {
                let in_busy = busy.iter().any(|b| b.start() <= minute && minute < b.end());
                let in_slot = slots.iter().any(|s| s.start() <= minute && minute < s.end());
                prop_assert!(in_busy != in_slot, "minute {} busy={} free={}", minute, in_busy, in_slot);
                minute += Duration::minutes(1);
            }
        }
    }
}
