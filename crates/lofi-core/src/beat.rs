//! Simulated beat envelope.
//!
//! The stream's audio is not available for analysis, so the visualizer is fed
//! by a small procedural model instead: a bass envelope that spikes on
//! randomly spaced "beats" and decays exponentially, a mid channel that
//! follows a sinusoid of the time since the last beat, and uniform noise for
//! the highs. All three are passed through one-pole low-pass filters
//! (`smoothed += (target - smoothed) * α`) with a separate α per channel.
//!
//! ```text
//!   beat ──► bass_raw = peak ──decay/frame──► 0
//!            phase = 0 ──step/frame──► mid_raw = sin(phase)·scale + bias
//!   noise ─► high_raw ∈ [high_min, high_min + high_range)
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Frame duration the per-frame constants are tuned for.
pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;

/// Longest frame gap honoured in frame-independent mode. Anything longer
/// (suspended terminal, debugger) is treated as this.
const MAX_FRAME_GAP_MS: f64 = 250.0;

/// Tuning constants of the envelope model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatParams {
    /// Interval before the first beat (~133 BPM).
    pub initial_interval_ms: f64,
    /// Width of the uniform jitter band applied to each beat deadline.
    pub jitter_ms: f64,
    /// Band the inter-beat interval is resampled from after every beat.
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
    /// Raw bass value set on a beat.
    pub peak: f64,
    /// Multiplicative bass decay per frame.
    pub decay: f64,
    pub phase_step: f64,
    pub mid_scale: f64,
    pub mid_bias: f64,
    pub high_min: f64,
    pub high_range: f64,
    pub alpha_bass: f64,
    pub alpha_mid: f64,
    pub alpha_high: f64,
    /// Horizontal wave scroll per frame.
    pub offset_step: f64,
}

impl Default for BeatParams {
    fn default() -> Self {
        Self {
            initial_interval_ms: 450.0,
            jitter_ms: 80.0,
            min_interval_ms: 400.0,
            max_interval_ms: 550.0,
            peak: 1.0,
            decay: 0.92,
            phase_step: 0.15,
            mid_scale: 0.5,
            mid_bias: 0.2,
            high_min: 0.15,
            high_range: 0.2,
            alpha_bass: 0.35,
            alpha_mid: 0.3,
            alpha_high: 0.25,
            offset_step: 0.025,
        }
    }
}

/// One frame of simulator output. Read-only for consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatSignal {
    pub bass: f64,
    pub mid: f64,
    pub high: f64,
    pub offset: f64,
}

pub struct BeatSimulator {
    params: BeatParams,
    rng: StdRng,
    frame_independent: bool,
    phase: f64,
    last_beat_ms: f64,
    interval_ms: f64,
    bass_raw: f64,
    mid_raw: f64,
    smoothed_bass: f64,
    smoothed_mid: f64,
    smoothed_high: f64,
    wave_offset: f64,
    last_frame_ms: Option<f64>,
    beats: u64,
}

impl BeatSimulator {
    pub fn new(params: BeatParams) -> Self {
        Self::with_rng(params, StdRng::from_entropy())
    }

    pub fn with_seed(params: BeatParams, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: BeatParams, rng: StdRng) -> Self {
        Self {
            interval_ms: params.initial_interval_ms,
            params,
            rng,
            frame_independent: false,
            phase: 0.0,
            last_beat_ms: 0.0,
            bass_raw: 0.0,
            mid_raw: 0.0,
            smoothed_bass: 0.0,
            smoothed_mid: 0.0,
            smoothed_high: 0.0,
            wave_offset: 0.0,
            last_frame_ms: None,
            beats: 0,
        }
    }

    /// Scale increments by measured frame time rather than counting frames.
    pub fn frame_independent(mut self, enabled: bool) -> Self {
        self.frame_independent = enabled;
        self
    }

    pub fn params(&self) -> &BeatParams {
        &self.params
    }

    /// Number of beats fired so far.
    pub fn beats(&self) -> u64 {
        self.beats
    }

    /// Current inter-beat interval.
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Last emitted signal without advancing the model.
    pub fn current(&self) -> BeatSignal {
        BeatSignal {
            bass: self.smoothed_bass,
            mid: self.smoothed_mid,
            high: self.smoothed_high,
            offset: self.wave_offset,
        }
    }

    /// Fire a beat now: re-anchor, resample the tempo, max out the bass.
    pub fn trigger_beat(&mut self, now_ms: f64) {
        let p = &self.params;
        self.interval_ms = if p.max_interval_ms > p.min_interval_ms {
            self.rng.gen_range(p.min_interval_ms..p.max_interval_ms)
        } else {
            p.min_interval_ms
        };
        self.last_beat_ms = now_ms;
        self.bass_raw = p.peak;
        self.phase = 0.0;
        self.beats += 1;
        trace!(
            "beat #{} at {:.0}ms, next in {:.0}ms",
            self.beats,
            now_ms,
            self.interval_ms
        );
    }

    /// Advance one animation frame at wall-clock `now_ms`.
    pub fn advance(&mut self, now_ms: f64) -> BeatSignal {
        let scale = self.frame_scale(now_ms);

        let since_beat = now_ms - self.last_beat_ms;
        let jitter = (self.rng.gen::<f64>() - 0.5) * self.params.jitter_ms;
        if since_beat > self.interval_ms + jitter {
            self.trigger_beat(now_ms);
        }

        let p = &self.params;
        self.bass_raw *= p.decay.powf(scale);
        self.mid_raw = self.phase.sin() * p.mid_scale + p.mid_bias;
        self.phase += p.phase_step * scale;

        let target_bass = self.bass_raw.max(0.0);
        let target_mid = self.mid_raw.max(0.0);
        let target_high = p.high_min + self.rng.gen::<f64>() * p.high_range;

        self.smoothed_bass += (target_bass - self.smoothed_bass) * filter_gain(p.alpha_bass, scale);
        self.smoothed_mid += (target_mid - self.smoothed_mid) * filter_gain(p.alpha_mid, scale);
        self.smoothed_high += (target_high - self.smoothed_high) * filter_gain(p.alpha_high, scale);

        self.wave_offset += p.offset_step * scale;

        self.current()
    }

    fn frame_scale(&mut self, now_ms: f64) -> f64 {
        let previous = self.last_frame_ms.replace(now_ms);
        if !self.frame_independent {
            return 1.0;
        }
        match previous {
            Some(prev) => (now_ms - prev).clamp(0.0, MAX_FRAME_GAP_MS) / NOMINAL_FRAME_MS,
            None => 1.0,
        }
    }
}

/// Gain of a one-pole filter stepped `scale` nominal frames at once.
fn filter_gain(alpha: f64, scale: f64) -> f64 {
    if scale == 1.0 {
        alpha
    } else {
        1.0 - (1.0 - alpha).powf(scale)
    }
}
