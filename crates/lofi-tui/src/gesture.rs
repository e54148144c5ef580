use std::time::{Duration, Instant};

/// Two taps closer together than this count as a double tap.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(500);

/// Recognises double taps (double clicks) from a stream of tap instants.
#[derive(Debug, Default)]
pub struct TapDetector {
    last: Option<Instant>,
}

impl TapDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tap; true when it completes a double tap. The completing tap
    /// is consumed so a third tap starts over.
    pub fn tap(&mut self, at: Instant) -> bool {
        match self.last.take() {
            Some(prev) if at.saturating_duration_since(prev) < DOUBLE_TAP_WINDOW => true,
            _ => {
                self.last = Some(at);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_tap_within_window() {
        let t0 = Instant::now();
        let mut d = TapDetector::new();
        assert!(!d.tap(t0));
        assert!(d.tap(t0 + Duration::from_millis(300)));
    }

    #[test]
    fn test_slow_taps_do_not_fire() {
        let t0 = Instant::now();
        let mut d = TapDetector::new();
        assert!(!d.tap(t0));
        assert!(!d.tap(t0 + Duration::from_millis(500)));
        // the late tap re-arms
        assert!(d.tap(t0 + Duration::from_millis(700)));
    }

    #[test]
    fn test_triple_tap_fires_once() {
        let t0 = Instant::now();
        let mut d = TapDetector::new();
        let fired: Vec<bool> = (0..3)
            .map(|i| d.tap(t0 + Duration::from_millis(100 * i)))
            .collect();
        assert_eq!(fired, vec![false, true, false]);
    }
}
