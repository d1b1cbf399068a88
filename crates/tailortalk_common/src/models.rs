//! Time interval models shared across crates.
//!
//! Both types are generic over the timestamp so the same code handles UTC
//! instants from the calendar API, zone-local instants for slot computation
//! and naive local times in tests.

use std::cmp::{max, min};
use std::fmt;
use std::ops::Sub;

use chrono::Duration;

/// A half-open `[start, end)` range with `start < end` guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeInterval<T> {
    start: T,
    end: T,
}

impl<T: Ord + Copy> TimeInterval<T> {
    /// Returns `None` when `end` is not strictly after `start`.
    pub fn new(start: T, end: T) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn end(&self) -> T {
        self.end
    }

    /// Check for overlap: (StartA < EndB) and (EndA > StartB)
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// The part of this interval inside `window`, if any.
    pub fn clip_to(&self, window: &WorkWindow<T>) -> Option<Self> {
        Self::new(max(self.start, window.start()), min(self.end, window.end()))
    }

    /// Maps both bounds, e.g. to change time zone. Fails if the mapping inverts them.
    pub fn map<U: Ord + Copy>(self, f: impl Fn(T) -> U) -> Option<TimeInterval<U>> {
        TimeInterval::new(f(self.start), f(self.end))
    }
}

impl<T> TimeInterval<T>
where
    T: Copy + Sub<T, Output = Duration>,
{
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl<T: fmt::Display> fmt::Display for TimeInterval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// The part of a civil day in which free slots may be offered (default 09:00–18:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkWindow<T> {
    bounds: TimeInterval<T>,
}

impl<T: Ord + Copy> WorkWindow<T> {
    pub fn new(start: T, end: T) -> Option<Self> {
        TimeInterval::new(start, end).map(|bounds| Self { bounds })
    }

    pub fn start(&self) -> T {
        self.bounds.start
    }

    pub fn end(&self) -> T {
        self.bounds.end
    }

    pub fn as_interval(&self) -> TimeInterval<T> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 6)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_new_rejects_empty_and_inverted() {
        assert!(TimeInterval::new(at(10, 0), at(10, 0)).is_none());
        assert!(TimeInterval::new(at(11, 0), at(10, 0)).is_none());
        assert!(TimeInterval::new(at(10, 0), at(11, 0)).is_some());
    }

    #[test]
    fn test_clip_to_window() {
        let window = WorkWindow::new(at(9, 0), at(18, 0)).unwrap();

        let straddling = TimeInterval::new(at(8, 0), at(10, 0)).unwrap();
        let clipped = straddling.clip_to(&window).unwrap();
        assert_eq!(clipped.start(), at(9, 0));
        assert_eq!(clipped.end(), at(10, 0));

        let outside = TimeInterval::new(at(19, 0), at(20, 0)).unwrap();
        assert!(outside.clip_to(&window).is_none());

        let touching = TimeInterval::new(at(18, 0), at(19, 0)).unwrap();
        assert!(touching.clip_to(&window).is_none());
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let a = TimeInterval::new(at(9, 0), at(10, 0)).unwrap();
        let b = TimeInterval::new(at(10, 0), at(11, 0)).unwrap();
        let c = TimeInterval::new(at(9, 30), at(10, 30)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_duration_and_display() {
        let interval = TimeInterval::new(at(9, 0), at(10, 30)).unwrap();
        assert_eq!(interval.duration(), Duration::minutes(90));
        assert_eq!(
            interval.to_string(),
            "2025-07-06 09:00:00 → 2025-07-06 10:30:00"
        );
    }
}
