use image::{Rgba, RgbaImage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientMode {
    /// Constant color A, alpha fading from opaque to transparent (vignette).
    Single,
    /// Opaque ramp interpolating color A to color B.
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientDirection {
    Top,
    Bottom,
    Left,
    Right,
}

impl GradientDirection {
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GradientSettings {
    pub enabled: bool,
    pub mode: GradientMode,
    pub direction: GradientDirection,
    /// Ramp length as a percentage of the driven axis, 1..=100.
    pub distance_pct: u32,
    /// Curve stretch percentage, 20..=300; applied as exponent 100/stretch.
    pub stretch_pct: u32,
    pub color_a: [u8; 3],
    pub color_b: [u8; 3],
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: GradientMode::Single,
            direction: GradientDirection::Bottom,
            distance_pct: 50,
            stretch_pct: 100,
            color_a: [0, 0, 0],
            color_b: [0, 0, 0],
        }
    }
}

/// Builds the full-canvas gradient overlay, or `None` when disabled or the
/// canvas is degenerate.
///
/// A 1-D ramp is computed along the driven axis (height for vertical
/// directions, width for horizontal) and replicated across the orthogonal
/// axis. `t` runs from 0 at the starting edge to 1 at `distance_pct` of the
/// axis, shaped by the stretch exponent before the color/alpha lookup.
pub fn synthesize(settings: &GradientSettings, canvas_w: u32, canvas_h: u32) -> Option<RgbaImage> {
    if !settings.enabled || canvas_w == 0 || canvas_h == 0 {
        return None;
    }

    let axis_len = if settings.direction.is_vertical() {
        canvas_h
    } else {
        canvas_w
    };
    let ramp = ramp_1d(settings, axis_len);

    let mut img = RgbaImage::new(canvas_w, canvas_h);
    match settings.direction {
        GradientDirection::Top | GradientDirection::Bottom => {
            for (y, color) in ramp.iter().enumerate() {
                for x in 0..canvas_w {
                    img.put_pixel(x, y as u32, *color);
                }
            }
        }
        GradientDirection::Left | GradientDirection::Right => {
            for y in 0..canvas_h {
                for (x, color) in ramp.iter().enumerate() {
                    img.put_pixel(x as u32, y, *color);
                }
            }
        }
    }
    Some(img)
}

fn ramp_1d(settings: &GradientSettings, axis_len: u32) -> Vec<Rgba<u8>> {
    let distance = settings.distance_pct.clamp(1, 100);
    let fade_len = (f64::from(axis_len) * f64::from(distance) / 100.0).max(1.0);
    // Divisor over the last in-band index so the ramp actually reaches t = 1
    // (and single-mode alpha reaches 0) inside the band.
    let fade_end = (fade_len - 1.0).max(1.0);
    let stretch_ratio = (f64::from(settings.stretch_pct) / 100.0).max(0.2);
    let exponent = 1.0 / stretch_ratio;

    (0..axis_len)
        .map(|i| {
            let along = match settings.direction {
                GradientDirection::Top | GradientDirection::Left => f64::from(i),
                GradientDirection::Bottom | GradientDirection::Right => {
                    f64::from(axis_len - 1 - i)
                }
            };
            let t = (along / fade_end).clamp(0.0, 1.0);
            let t = t.powf(exponent).clamp(0.0, 1.0);
            ramp_color(settings, t)
        })
        .collect()
}

fn ramp_color(settings: &GradientSettings, t: f64) -> Rgba<u8> {
    let [ar, ag, ab] = settings.color_a;
    match settings.mode {
        GradientMode::Single => {
            let alpha = ((1.0 - t) * 255.0).round() as u8;
            Rgba([ar, ag, ab, alpha])
        }
        GradientMode::Double => {
            let [br, bg, bb] = settings.color_b;
            Rgba([lerp_u8(ar, br, t), lerp_u8(ag, bg, t), lerp_u8(ab, bb, t), 255])
        }
    }
}

fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
}
