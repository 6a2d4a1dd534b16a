use image::RgbaImage;

use crate::{
    composite::blit_over,
    preset::Preset,
    text::{LogoTextSettings, ResolvedFont, TextAlign, render_logo_text},
};

/// Canvas width all textbox metrics are specified against; other presets
/// scale proportionally.
pub const REFERENCE_WIDTH: f64 = 1600.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextboxAlign {
    Center,
    Left,
}

/// The optional poster-only label composited last: a rounded-rectangle
/// plate auto-sized around its text.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextboxSettings {
    pub enabled: bool,
    pub text: String,
    pub align: TextboxAlign,
    pub text_color: [u8; 3],
    pub fill_color: [u8; 3],
    pub fill_alpha: u8,
    /// Metrics at the 1600 px reference width.
    pub font_px: f64,
    pub pad_x_px: f64,
    pub pad_y_px: f64,
    pub corner_radius_px: f64,
    pub margin_bottom_px: f64,
}

impl Default for TextboxSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            text: String::new(),
            align: TextboxAlign::Center,
            text_color: [255, 255, 255],
            fill_color: [16, 16, 16],
            fill_alpha: 200,
            font_px: 54.0,
            pad_x_px: 28.0,
            pad_y_px: 16.0,
            corner_radius_px: 18.0,
            margin_bottom_px: 72.0,
        }
    }
}

impl TextboxSettings {
    pub fn is_active(&self) -> bool {
        self.enabled && !self.text.trim().is_empty()
    }
}

/// Composites the textbox onto a poster canvas. Only the poster preset
/// carries the overlay; all other presets are untouched.
pub fn overlay(settings: &TextboxSettings, preset: &Preset, canvas: &mut RgbaImage, font: &ResolvedFont) {
    if preset.id != "poster" || !settings.is_active() {
        return;
    }

    let k = f64::from(preset.width) / REFERENCE_WIDTH;
    let label = LogoTextSettings {
        enabled: true,
        text: settings.text.clone(),
        size_px: (settings.font_px * k).max(1.0) as f32,
        align: match settings.align {
            TextboxAlign::Center => TextAlign::Center,
            TextboxAlign::Left => TextAlign::Left,
        },
        line_spacing: 1.0,
        uppercase: false,
        color: settings.text_color,
    };
    let Some(text) = render_logo_text(&label, font) else {
        return;
    };

    let pad_x = (settings.pad_x_px * k).round().max(0.0) as u32;
    let pad_y = (settings.pad_y_px * k).round().max(0.0) as u32;
    let radius = settings.corner_radius_px * k;

    let box_w = text.width() + 2 * pad_x;
    let box_h = text.height() + 2 * pad_y;
    let plate = rounded_rect(
        box_w,
        box_h,
        radius,
        settings.fill_color,
        settings.fill_alpha,
    );

    let margin = (settings.margin_bottom_px * k).round() as i64;
    let box_x = (i64::from(preset.width) - i64::from(box_w)) / 2;
    let box_y = i64::from(preset.height) - margin - i64::from(box_h);

    blit_over(canvas, &plate, box_x, box_y, 1.0);
    // Line alignment (center vs left) is handled inside the text bitmap;
    // the bitmap itself always sits at the horizontal padding.
    blit_over(
        canvas,
        &text,
        box_x + i64::from(pad_x),
        box_y + i64::from(pad_y),
        1.0,
    );
}

fn rounded_rect(w: u32, h: u32, radius: f64, color: [u8; 3], alpha: u8) -> RgbaImage {
    let radius = radius.max(0.0).min(f64::from(w.min(h)) / 2.0);
    let mut img = RgbaImage::new(w, h);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let fx = f64::from(x) + 0.5;
        let fy = f64::from(y) + 0.5;
        // Distance from the nearest corner circle center, when inside a
        // corner square; elsewhere the pixel is inside the straight edges.
        let cx = if fx < radius {
            Some(radius)
        } else if fx > f64::from(w) - radius {
            Some(f64::from(w) - radius)
        } else {
            None
        };
        let cy = if fy < radius {
            Some(radius)
        } else if fy > f64::from(h) - radius {
            Some(f64::from(h) - radius)
        } else {
            None
        };
        let inside = match (cx, cy) {
            (Some(cx), Some(cy)) => {
                let dx = fx - cx;
                let dy = fy - cy;
                (dx * dx + dy * dy).sqrt() <= radius
            }
            _ => true,
        };
        if inside {
            px.0 = [color[0], color[1], color[2], alpha];
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::preset_by_id;

    fn active(text: &str) -> TextboxSettings {
        TextboxSettings {
            enabled: true,
            text: text.to_string(),
            ..TextboxSettings::default()
        }
    }

    #[test]
    fn disabled_or_empty_is_a_noop() {
        let preset = preset_by_id("poster").unwrap();
        let mut canvas = RgbaImage::new(preset.width, preset.height);
        let before = canvas.clone();
        overlay(&TextboxSettings::default(), preset, &mut canvas, &ResolvedFont::Builtin);
        overlay(&active("  "), preset, &mut canvas, &ResolvedFont::Builtin);
        assert_eq!(canvas, before);
    }

    #[test]
    fn non_poster_presets_never_get_the_overlay() {
        let preset = preset_by_id("hero").unwrap();
        let mut canvas = RgbaImage::new(preset.width, preset.height);
        let before = canvas.clone();
        overlay(&active("Coming soon"), preset, &mut canvas, &ResolvedFont::Builtin);
        assert_eq!(canvas, before);
    }

    #[test]
    fn poster_overlay_paints_near_the_bottom() {
        let preset = preset_by_id("poster").unwrap();
        let mut canvas = RgbaImage::new(preset.width, preset.height);
        overlay(&active("Coming soon"), preset, &mut canvas, &ResolvedFont::Builtin);

        let top_half_untouched = canvas
            .enumerate_pixels()
            .filter(|(_, y, _)| *y < preset.height / 2)
            .all(|(_, _, p)| p.0[3] == 0);
        assert!(top_half_untouched);
        assert!(canvas.pixels().any(|p| p.0[3] != 0));
    }

    #[test]
    fn rounded_corners_are_clipped() {
        let plate = rounded_rect(40, 20, 8.0, [10, 10, 10], 255);
        assert_eq!(plate.get_pixel(0, 0).0[3], 0);
        assert_eq!(plate.get_pixel(39, 0).0[3], 0);
        assert_eq!(plate.get_pixel(20, 10).0[3], 255);
        assert_eq!(plate.get_pixel(0, 10).0[3], 255);
    }
}
