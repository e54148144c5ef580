//! Volume slider model: the value the UI shows, independent of whether a
//! player is around to receive it.

/// Level restored by unmute when nothing audible was ever set.
pub const DEFAULT_UNMUTE_LEVEL: f32 = 0.6;

/// Keyboard step for volume up/down.
pub const VOLUME_STEP: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSlider {
    value: f32,
    last_audible: Option<f32>,
}

impl VolumeSlider {
    pub fn new(value: f32) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            last_audible: None,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_muted(&self) -> bool {
        self.value <= 0.0
    }

    pub fn set(&mut self, value: f32) -> f32 {
        self.value = value.clamp(0.0, 1.0);
        self.value
    }

    /// Nudge by `delta`, clamped to 0..=1. Returns the new value.
    pub fn step(&mut self, delta: f32) -> f32 {
        // round to the step grid so repeated nudges don't drift
        let next = ((self.value + delta) * 100.0).round() / 100.0;
        self.set(next)
    }

    /// Mute remembers the current level; unmute restores it.
    pub fn toggle_mute(&mut self) -> f32 {
        if self.value > 0.0 {
            self.last_audible = Some(self.value);
            self.set(0.0)
        } else {
            let restore = self.last_audible.unwrap_or(DEFAULT_UNMUTE_LEVEL);
            self.set(restore)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps() {
        let mut v = VolumeSlider::new(1.4);
        assert_eq!(v.value(), 1.0);
        assert_eq!(v.set(-1.0), 0.0);
    }

    #[test]
    fn test_step_stays_on_grid() {
        let mut v = VolumeSlider::new(0.5);
        for _ in 0..3 {
            v.step(VOLUME_STEP);
        }
        assert_eq!(v.value(), 0.8);
        for _ in 0..20 {
            v.step(-VOLUME_STEP);
        }
        assert_eq!(v.value(), 0.0);
        assert!(v.is_muted());
    }

    #[test]
    fn test_mute_round_trip() {
        let mut v = VolumeSlider::new(0.3);
        assert_eq!(v.toggle_mute(), 0.0);
        assert_eq!(v.toggle_mute(), 0.3);
    }

    #[test]
    fn test_unmute_without_history() {
        let mut v = VolumeSlider::new(0.0);
        assert_eq!(v.toggle_mute(), DEFAULT_UNMUTE_LEVEL);
    }
}
