//! Layered waveform renderer.
//!
//! Each frame the renderer clears a [`Surface`] and either draws the
//! beat-reactive layers (playing) or a fixed idle pattern (anything else).
//! The surface is an abstract 2D raster in logical pixels, y pointing down,
//! so the same drawing code feeds the terminal painter and the tests'
//! retained [`Scene`].
//!
//! Active z-order, back to front:
//!
//! | layer    | width | curve | amplitude   | spatial freq        | samples |
//! |----------|-------|-------|-------------|---------------------|---------|
//! | bass     | 4.0   | sin   | 15 + 25·b   | 0.006 + 0.003·b     | n       |
//! | mid      | 2.5   | sin   | 8 + 15·m    | 0.012 + 0.006·m     | 1.8·n   |
//! | high     | 1.8   | sin   | 3 + 8·h     | 0.02 + 0.01·h       | 3·n     |
//! | harmonic | 1.2   | cos   | 10 + 18·b   | 0.01                | n       |
//! | pulses   | -     | -     | only when b > 0.2                 | 5 dots  |
//! | glow     | 1.0   | sin   | 20 + 30·b   | 0.005               | n       |
//!
//! with `n = floor(width / 2.5)`.

use crate::beat::{BeatSignal, BeatSimulator};

/// Smoothed bass level above which the pulse dots are drawn.
pub const PULSE_THRESHOLD: f64 = 0.2;
pub const PULSE_COUNT: usize = 5;

/// Logical pixels per bass-layer sample.
const BAR_SPACING: f64 = 2.5;
/// Sample step of the idle pattern.
const IDLE_STEP: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity, 0.0..=1.0.
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Straight linear interpolation, channel by channel.
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

pub const PINK: Rgba = Rgba::new(255, 107, 157, 1.0);
pub const CRIMSON: Rgba = Rgba::new(196, 69, 105, 1.0);
pub const YELLOW: Rgba = Rgba::new(255, 235, 59, 1.0);
/// Pale ink for the mid layer and the idle wave; reads on a dark background.
pub const INK: Rgba = Rgba::new(210, 210, 225, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    /// Colour stops at fractions of the surface width, ascending.
    HorizontalGradient(Vec<(f64, Rgba)>),
}

impl Paint {
    /// Colour at horizontal fraction `t` of the surface.
    pub fn sample(&self, t: f64) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::HorizontalGradient(stops) => {
                let (first, last) = match (stops.first(), stops.last()) {
                    (Some(f), Some(l)) => (f, l),
                    _ => return Rgba::new(0, 0, 0, 0.0),
                };
                if t <= first.0 {
                    return first.1;
                }
                if t >= last.0 {
                    return last.1;
                }
                for pair in stops.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if t <= b.0 {
                        let span = b.0 - a.0;
                        let local = if span > 0.0 { (t - a.0) / span } else { 1.0 };
                        return a.1.lerp(b.1, local);
                    }
                }
                last.1
            }
        }
    }
}

/// Blurred shadow drawn under a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Rgba,
    pub blur: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub paint: Paint,
    pub glow: Option<Glow>,
}

impl StrokeStyle {
    pub fn solid(width: f64, color: Rgba) -> Self {
        Self {
            width,
            paint: Paint::Solid(color),
            glow: None,
        }
    }
}

/// A filled disc fading from `inner` at the centre to `outer` at `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialDot {
    pub center: Point,
    pub radius: f64,
    pub inner: Rgba,
    pub outer: Rgba,
}

/// 2D drawing target in logical pixels, origin top-left.
pub trait Surface {
    fn size(&self) -> (f64, f64);
    fn clear(&mut self);
    /// Stroke an open polyline.
    fn stroke(&mut self, points: &[Point], style: &StrokeStyle);
    fn fill_radial(&mut self, dot: &RadialDot);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Stroke { points: Vec<Point>, style: StrokeStyle },
    Radial(RadialDot),
}

/// Retained display list; shapes are kept in draw order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    width: f64,
    height: f64,
    shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
        }
    }

    /// Change the surface size. Takes effect on the next frame.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl Surface for Scene {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.shapes.clear();
    }

    fn stroke(&mut self, points: &[Point], style: &StrokeStyle) {
        if points.len() < 2 {
            return;
        }
        self.shapes.push(Shape::Stroke {
            points: points.to_vec(),
            style: style.clone(),
        });
    }

    fn fill_radial(&mut self, dot: &RadialDot) {
        self.shapes.push(Shape::Radial(*dot));
    }
}

pub struct WaveformRenderer {
    simulator: BeatSimulator,
}

impl WaveformRenderer {
    pub fn new(simulator: BeatSimulator) -> Self {
        Self { simulator }
    }

    pub fn simulator(&self) -> &BeatSimulator {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut BeatSimulator {
        &mut self.simulator
    }

    /// Draw one frame. The simulator only advances while `playing`; the
    /// signal it produced is returned for the caller's use.
    pub fn render<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        playing: bool,
        now_ms: f64,
    ) -> Option<BeatSignal> {
        surface.clear();
        if playing {
            let signal = self.simulator.advance(now_ms);
            draw_active(surface, &signal);
            Some(signal)
        } else {
            draw_idle(surface);
            None
        }
    }
}

/// `ceil(count)` samples spread over `width`, x = i / count · width.
fn sample_wave(count: f64, width: f64, center_y: f64, y: impl Fn(f64) -> f64) -> Vec<Point> {
    if count <= 0.0 {
        return Vec::new();
    }
    let n = count.ceil() as usize;
    (0..n)
        .map(|i| {
            let i = i as f64;
            Point {
                x: i / count * width,
                y: center_y + y(i),
            }
        })
        .collect()
}

fn draw_active<S: Surface + ?Sized>(surface: &mut S, beat: &BeatSignal) {
    let (width, height) = surface.size();
    let center_y = height / 2.0;
    let bars = (width / BAR_SPACING).floor();
    if bars < 1.0 {
        return;
    }
    let BeatSignal {
        bass,
        mid,
        high,
        offset,
    } = *beat;

    let bass_amp = 15.0 + bass * 25.0;
    let bass_freq = 0.006 + bass * 0.003;
    let points = sample_wave(bars, width, center_y, |i| {
        (offset + i * bass_freq).sin() * bass_amp
    });
    let style = StrokeStyle {
        width: 4.0,
        paint: Paint::HorizontalGradient(vec![
            (0.0, PINK.with_alpha(0.8)),
            (0.5, CRIMSON.with_alpha(0.9)),
            (1.0, YELLOW.with_alpha(0.7)),
        ]),
        glow: None,
    };
    surface.stroke(&points, &style);

    let mid_amp = 8.0 + mid * 15.0;
    let mid_freq = 0.012 + mid * 0.006;
    let points = sample_wave(bars * 1.8, width, center_y, |i| {
        (offset * 1.3 + i * mid_freq).sin() * mid_amp
    });
    surface.stroke(
        &points,
        &StrokeStyle::solid(2.5, INK.with_alpha(0.2 + mid * 0.3)),
    );

    let high_amp = 3.0 + high * 8.0;
    let high_freq = 0.02 + high * 0.01;
    let points = sample_wave(bars * 3.0, width, center_y, |i| {
        (offset * 2.5 + i * high_freq).sin() * high_amp
    });
    surface.stroke(
        &points,
        &StrokeStyle::solid(1.8, PINK.with_alpha(0.3 + high * 0.4)),
    );

    let harmonic_amp = 10.0 + bass * 18.0;
    let points = sample_wave(bars, width, center_y, |i| {
        (offset * 0.7 + i * 0.01).cos() * harmonic_amp
    });
    surface.stroke(
        &points,
        &StrokeStyle::solid(1.2, YELLOW.with_alpha(0.15 + bass * 0.2)),
    );

    if bass > PULSE_THRESHOLD {
        let radius = bass * 3.0 + 2.0;
        for i in 0..PULSE_COUNT {
            let i = i as f64;
            let center = Point {
                x: ((offset + i * 0.5).sin() * 0.4 + 0.5) * width,
                y: center_y + (offset * 1.2 + i * 0.3).cos() * 25.0,
            };
            surface.fill_radial(&RadialDot {
                center,
                radius,
                inner: PINK.with_alpha(bass * 0.8),
                outer: PINK.with_alpha(0.0),
            });
        }
    }

    let glow_amp = 20.0 + bass * 30.0;
    let points = sample_wave(bars, width, center_y, |i| {
        (offset + i * 0.005).sin() * glow_amp
    });
    let style = StrokeStyle {
        width: 1.0,
        paint: Paint::Solid(PINK.with_alpha(0.1 + bass * 0.1)),
        glow: Some(Glow {
            color: PINK.with_alpha(0.3),
            blur: 10.0,
        }),
    };
    surface.stroke(&points, &style);
}

fn draw_idle<S: Surface + ?Sized>(surface: &mut S) {
    let (width, height) = surface.size();
    let center_y = height / 2.0;
    let xs: Vec<f64> = (0..)
        .map(|i| i as f64 * IDLE_STEP)
        .take_while(|x| *x < width)
        .collect();

    let points: Vec<Point> = xs
        .iter()
        .map(|&x| Point {
            x,
            y: center_y + (x / 50.0).sin() * 10.0,
        })
        .collect();
    surface.stroke(&points, &StrokeStyle::solid(2.5, INK.with_alpha(0.2)));

    let points: Vec<Point> = xs
        .iter()
        .map(|&x| Point {
            x,
            y: center_y + (x / 40.0).cos() * 6.0,
        })
        .collect();
    surface.stroke(&points, &StrokeStyle::solid(1.0, PINK.with_alpha(0.15)));
}
