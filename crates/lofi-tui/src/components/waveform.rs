//! Waveform band: paints a [`Scene`] onto a braille canvas.
//!
//! The scene is in logical pixels with y pointing down; the canvas has y
//! pointing up, so every y is flipped against the surface height. Braille
//! dots are one pixel wide, so stroke width becomes stacked 1-dot passes,
//! glow becomes dimmer wider passes drawn first, and radial dots become
//! concentric circles fading outward.

use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine},
    Frame,
};

use lofi_core::waveform::{Point, RadialDot, Rgba, Scene, Shape, StrokeStyle, Surface};

use crate::theme::C_BG;

/// Glow passes are drawn at this fraction of the glow colour's alpha.
const GLOW_STRENGTH: f64 = 0.35;

/// Logical size of one braille dot for `scene` painted into `area`.
fn dot_size(scene: &Scene, area: Rect) -> (f64, f64) {
    let (w, h) = scene.size();
    let cols = f64::from(area.width.max(1)) * 2.0;
    let rows = f64::from(area.height.max(1)) * 4.0;
    (w / cols, h / rows)
}

pub fn draw(frame: &mut Frame, area: Rect, scene: &Scene) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    frame.render_widget(canvas(scene, area), area);
}

/// Canvas widget for `scene` sized to `area`.
pub fn canvas(scene: &Scene, area: Rect) -> Canvas<'_, impl Fn(&mut Context<'_>) + '_> {
    let (w, h) = scene.size();
    let (_, dot_h) = dot_size(scene, area);
    Canvas::default()
        .marker(Marker::Braille)
        .background_color(C_BG)
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(move |ctx| {
            for shape in scene.shapes() {
                match shape {
                    Shape::Stroke { points, style } => paint_stroke(ctx, points, style, w, h, dot_h),
                    Shape::Radial(dot) => paint_radial(ctx, dot, h, dot_h),
                }
                ctx.layer();
            }
        })
}

fn paint_stroke(
    ctx: &mut Context<'_>,
    points: &[Point],
    style: &StrokeStyle,
    width: f64,
    height: f64,
    dot_h: f64,
) {
    if let Some(glow) = style.glow {
        let color = blend(glow.color.with_alpha(glow.color.a * GLOW_STRENGTH), C_BG);
        for dy in stroke_offsets(style.width + glow.blur, dot_h) {
            polyline(ctx, points, height, dy, |_| color);
        }
    }
    for dy in stroke_offsets(style.width, dot_h) {
        polyline(ctx, points, height, dy, |x| {
            let t = if width > 0.0 { x / width } else { 0.0 };
            blend(style.paint.sample(t), C_BG)
        });
    }
}

fn polyline(
    ctx: &mut Context<'_>,
    points: &[Point],
    height: f64,
    dy: f64,
    color_at: impl Fn(f64) -> Color,
) {
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        ctx.draw(&CanvasLine::new(
            a.x,
            height - a.y + dy,
            b.x,
            height - b.y + dy,
            color_at((a.x + b.x) / 2.0),
        ));
    }
}

fn paint_radial(ctx: &mut Context<'_>, dot: &RadialDot, height: f64, dot_h: f64) {
    if dot.radius <= 0.0 {
        return;
    }
    let rings = (dot.radius / dot_h.max(f64::EPSILON)).ceil().max(1.0) as usize;
    // outermost first, inner rings overwrite
    for k in (0..rings).rev() {
        let r = dot.radius * (k + 1) as f64 / rings as f64;
        let color = dot.inner.lerp(dot.outer, r / dot.radius);
        ctx.draw(&Circle {
            x: dot.center.x,
            y: height - dot.center.y,
            radius: r,
            color: blend(color, C_BG),
        });
    }
}

/// Vertical offsets of the 1-dot passes that make up a stroke `width`
/// logical px thick, centred on the path.
pub fn stroke_offsets(width: f64, dot_h: f64) -> Vec<f64> {
    let passes = if dot_h > 0.0 {
        (width / dot_h).round().max(1.0) as usize
    } else {
        1
    };
    let mid = (passes - 1) as f64 / 2.0;
    (0..passes).map(|i| (i as f64 - mid) * dot_h).collect()
}

/// Composite `c` over the opaque background `bg`.
pub fn blend(c: Rgba, bg: Color) -> Color {
    let (br, bgc, bb) = match bg {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => (0, 0, 0),
    };
    let a = c.a.clamp(0.0, 1.0);
    let mix = |fg: u8, back: u8| -> u8 {
        (f64::from(back) + (f64::from(fg) - f64::from(back)) * a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color::Rgb(mix(c.r, br), mix(c.g, bgc), mix(c.b, bb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofi_core::waveform::PINK;
    use ratatui::{buffer::Buffer, widgets::Widget};

    #[test]
    fn test_blend() {
        assert_eq!(blend(Rgba::new(255, 0, 0, 0.5), C_BG), Color::Rgb(136, 7, 11));
        assert_eq!(blend(Rgba::new(1, 2, 3, 1.0), C_BG), Color::Rgb(1, 2, 3));
        assert_eq!(blend(Rgba::new(200, 200, 200, 0.0), C_BG), C_BG);
    }

    #[test]
    fn test_stroke_offsets_are_centred() {
        assert_eq!(stroke_offsets(0.5, 2.0), vec![0.0]);
        assert_eq!(stroke_offsets(4.0, 2.0), vec![-1.0, 1.0]);
        assert_eq!(stroke_offsets(6.0, 2.0), vec![-2.0, 0.0, 2.0]);
        assert_eq!(stroke_offsets(3.0, 0.0), vec![0.0]);
    }

    #[test]
    fn test_stroke_paints_braille_in_its_colour() {
        let mut scene = Scene::new(100.0, 40.0);
        scene.stroke(
            &[Point { x: 0.0, y: 20.0 }, Point { x: 100.0, y: 20.0 }],
            &StrokeStyle::solid(1.0, PINK),
        );
        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        canvas(&scene, area).render(area, &mut buf);

        let pink = blend(PINK, C_BG);
        let painted = buf
            .content()
            .iter()
            .filter(|cell| {
                let ch = cell.symbol().chars().next().unwrap_or(' ');
                ('\u{2801}'..='\u{28FF}').contains(&ch) && cell.fg == pink
            })
            .count();
        // one row of cells across the full width
        assert_eq!(painted, 10);
    }

    #[test]
    fn test_empty_scene_paints_background_only() {
        let scene = Scene::new(100.0, 40.0);
        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        canvas(&scene, area).render(area, &mut buf);
        assert!(buf.content().iter().all(|c| c.symbol() == " " && c.bg == C_BG));
    }
}
