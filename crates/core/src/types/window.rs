//! Daily service window of a dish.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// The time of day during which a dish can be ordered.
///
/// Both bounds are optional. A missing bound means the window is open on that
/// side; a window whose start is after its end spans midnight (e.g. a late
/// night menu from 22:00 to 02:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceWindow {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl ServiceWindow {
    #[must_use]
    pub const fn new(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
        Self { start, end }
    }

    /// Whether `at` falls inside the window (bounds inclusive).
    #[must_use]
    pub fn contains(&self, at: NaiveTime) -> bool {
        match (self.start, self.end) {
            (None, None) => true,
            (Some(start), None) => at >= start,
            (None, Some(end)) => at <= end,
            (Some(start), Some(end)) if start <= end => at >= start && at <= end,
            (Some(start), Some(end)) => at >= start || at <= end,
        }
    }

    /// Whether the window wraps past midnight.
    #[must_use]
    pub fn is_overnight(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_unbounded_window_is_always_open() {
        let w = ServiceWindow::default();
        assert!(w.contains(t(0, 0)));
        assert!(w.contains(t(23, 59)));
    }

    #[test]
    fn test_daytime_window() {
        let w = ServiceWindow::new(Some(t(10, 0)), Some(t(14, 0)));
        assert!(!w.contains(t(9, 59)));
        assert!(w.contains(t(10, 0)));
        assert!(w.contains(t(14, 0)));
        assert!(!w.contains(t(14, 1)));
        assert!(!w.is_overnight());
    }

    #[test]
    fn test_overnight_window() {
        let w = ServiceWindow::new(Some(t(22, 0)), Some(t(2, 0)));
        assert!(w.is_overnight());
        assert!(w.contains(t(23, 30)));
        assert!(w.contains(t(1, 0)));
        assert!(!w.contains(t(12, 0)));
    }

    #[test]
    fn test_half_open_windows() {
        let from_six = ServiceWindow::new(Some(t(6, 0)), None);
        assert!(!from_six.contains(t(5, 0)));
        assert!(from_six.contains(t(20, 0)));

        let until_nine = ServiceWindow::new(None, Some(t(9, 0)));
        assert!(until_nine.contains(t(0, 30)));
        assert!(!until_nine.contains(t(9, 30)));
    }
}
