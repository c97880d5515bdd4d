//! The playback cursor - walks the timeline one second at a time.
//!
//! The cursor never consults the set of recorded timestamps, only its two
//! ends. Stepping past a gap in the recording lands on a timestamp with no
//! samples, which the render cycle shows as an empty frame.

use crate::store::{StoreError, TimelineBounds};
use crate::timeline::{DayRollover, Timestamp};

/// One step of the playback clock.
///
/// Returns `current` plus one second, except that reaching the end of the
/// timeline (or stepping from it) wraps back to its start. There is no
/// other clamping: a cursor already past the end keeps counting upward.
pub fn advance<B>(
    current: &Timestamp,
    bounds: &B,
    rollover: DayRollover,
) -> Result<Timestamp, StoreError>
where
    B: TimelineBounds + ?Sized,
{
    let max = bounds.max_time()?;
    let next = current.next_second(rollover);
    if next == max || *current == max {
        return bounds.min_time();
    }
    Ok(next)
}

/// Owned playback position.
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    current: Timestamp,
    rollover: DayRollover,
}

impl PlaybackCursor {
    pub fn at(start: Timestamp, rollover: DayRollover) -> Self {
        Self {
            current: start,
            rollover,
        }
    }

    /// Cursor positioned at the start of the recorded timeline.
    pub fn at_start<B>(bounds: &B, rollover: DayRollover) -> Result<Self, StoreError>
    where
        B: TimelineBounds + ?Sized,
    {
        Ok(Self::at(bounds.min_time()?, rollover))
    }

    pub fn current(&self) -> &Timestamp {
        &self.current
    }

    /// Step forward and return the new position.
    pub fn advance<B>(&mut self, bounds: &B) -> Result<&Timestamp, StoreError>
    where
        B: TimelineBounds + ?Sized,
    {
        self.current = advance(&self.current, bounds, self.rollover)?;
        Ok(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Timeline bounds without a database behind them.
    struct FixedBounds {
        start: Timestamp,
        end: Timestamp,
    }

    impl FixedBounds {
        fn new(start: &str, end: &str) -> Self {
            Self {
                start: start.parse().unwrap(),
                end: end.parse().unwrap(),
            }
        }
    }

    impl TimelineBounds for FixedBounds {
        fn min_time(&self) -> Result<Timestamp, StoreError> {
            Ok(self.start)
        }

        fn max_time(&self) -> Result<Timestamp, StoreError> {
            Ok(self.end)
        }
    }

    struct EmptyBounds;

    impl TimelineBounds for EmptyBounds {
        fn min_time(&self) -> Result<Timestamp, StoreError> {
            Err(StoreError::EmptyTimeline)
        }

        fn max_time(&self) -> Result<Timestamp, StoreError> {
            Err(StoreError::EmptyTimeline)
        }
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn test_two_sample_timeline_wraps() {
        let bounds = FixedBounds::new("2024-01-01 00:00:58", "2024-01-01 00:00:59");
        let next = advance(&ts("2024-01-01 00:00:58"), &bounds, DayRollover::default()).unwrap();
        // 00:00:59 is the end of the timeline, so the cursor goes back to the start
        assert_eq!(next, ts("2024-01-01 00:00:58"));
    }

    #[test]
    fn test_advance_inside_timeline_adds_one_second() {
        let bounds = FixedBounds::new("2024-01-01 00:00:00", "2024-01-01 02:00:00");
        let rollover = DayRollover::default();

        assert_eq!(
            advance(&ts("2024-01-01 00:00:59"), &bounds, rollover).unwrap(),
            ts("2024-01-01 00:01:00")
        );
        assert_eq!(
            advance(&ts("2024-01-01 00:59:59"), &bounds, rollover).unwrap(),
            ts("2024-01-01 01:00:00")
        );
    }

    #[test]
    fn test_advance_from_max_wraps() {
        let bounds = FixedBounds::new("2024-01-01 00:00:00", "2024-01-01 00:00:10");
        let next = advance(&ts("2024-01-01 00:00:10"), &bounds, DayRollover::default()).unwrap();
        assert_eq!(next, ts("2024-01-01 00:00:00"));
    }

    #[test]
    fn test_wrap_returns_min_for_any_timeline() {
        let bounds = FixedBounds::new("2023-06-01 12:00:00", "2023-06-01 12:30:00");
        let before_end = ts("2023-06-01 12:29:59");
        assert_eq!(
            advance(&before_end, &bounds, DayRollover::default()).unwrap(),
            ts("2023-06-01 12:00:00")
        );
    }

    #[test]
    fn test_past_end_is_not_clamped() {
        let bounds = FixedBounds::new("2024-01-01 00:00:00", "2024-01-01 00:00:10");
        let next = advance(&ts("2024-05-05 10:00:00"), &bounds, DayRollover::default()).unwrap();
        assert_eq!(next, ts("2024-05-05 10:00:01"));
    }

    #[test]
    fn test_midnight_without_date_rollover() {
        // Known incomplete behavior: the date stays on 2024-01-01.
        let bounds = FixedBounds::new("2024-01-01 00:00:00", "2024-01-02 12:00:00");
        let next =
            advance(&ts("2024-01-01 23:59:59"), &bounds, DayRollover::WrapWithinDay).unwrap();
        assert_eq!(next, ts("2024-01-01 00:00:00"));

        let fixed = advance(&ts("2024-01-01 23:59:59"), &bounds, DayRollover::AdvanceDate).unwrap();
        assert_eq!(fixed, ts("2024-01-02 00:00:00"));
    }

    #[test]
    fn test_empty_timeline_propagates() {
        let result = advance(&ts("2024-01-01 00:00:00"), &EmptyBounds, DayRollover::default());
        assert!(matches!(result, Err(StoreError::EmptyTimeline)));
        assert!(PlaybackCursor::at_start(&EmptyBounds, DayRollover::default()).is_err());
    }

    #[test]
    fn test_cursor_cycles_through_timeline() {
        let bounds = FixedBounds::new("2024-01-01 00:00:00", "2024-01-01 00:00:03");
        let mut cursor = PlaybackCursor::at_start(&bounds, DayRollover::default()).unwrap();
        assert_eq!(cursor.current(), &ts("2024-01-01 00:00:00"));

        let visited: Vec<String> = (0..6)
            .map(|_| cursor.advance(&bounds).unwrap().to_string())
            .collect();
        assert_eq!(
            visited,
            vec![
                "2024-01-01 00:00:01",
                "2024-01-01 00:00:02",
                "2024-01-01 00:00:00",
                "2024-01-01 00:00:01",
                "2024-01-01 00:00:02",
                "2024-01-01 00:00:00",
            ]
        );
    }
}
