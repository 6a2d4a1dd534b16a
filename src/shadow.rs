use image::RgbaImage;

use crate::{blur::gaussian_blur, composite::blit_over};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShadowSettings {
    pub enabled: bool,
    /// Offset distance in pixels along `angle_deg`.
    pub distance_px: u32,
    /// Gaussian blur radius in pixels; 0 composes a hard silhouette.
    pub blur_px: u32,
    /// Degrees, 0 = east, increasing clockwise in screen space.
    pub angle_deg: f64,
    /// Silhouette alpha scale, 0..=255.
    pub opacity: u8,
    pub color: [u8; 3],
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            distance_px: 12,
            blur_px: 8,
            angle_deg: 45.0,
            opacity: 180,
            color: [0, 0, 0],
        }
    }
}

/// A source composed over its own drop shadow. The canvas grows to the union
/// of both footprints, so `source_origin` reports where the original
/// source's top-left corner landed inside `image`.
#[derive(Clone, Debug)]
pub struct ShadowedImage {
    pub image: RgbaImage,
    pub source_origin: (i64, i64),
}

impl ShadowedImage {
    fn passthrough(source: &RgbaImage) -> Self {
        Self {
            image: source.clone(),
            source_origin: (0, 0),
        }
    }
}

/// Renders `source` over an offset, blurred, alpha-scaled silhouette of
/// itself. Disabled settings or an empty source pass the source through.
pub fn apply(settings: &ShadowSettings, source: &RgbaImage) -> ShadowedImage {
    if !settings.enabled || source.width() == 0 || source.height() == 0 {
        return ShadowedImage::passthrough(source);
    }

    let angle = settings.angle_deg.to_radians();
    // Screen space: y grows downward, so sin() already points clockwise.
    let dx = (f64::from(settings.distance_px) * angle.cos()).round() as i64;
    let dy = (f64::from(settings.distance_px) * angle.sin()).round() as i64;

    let silhouette = silhouette(source, settings.color, settings.opacity);
    let (silhouette, pad) = if settings.blur_px > 0 {
        let pad = i64::from(2 * settings.blur_px);
        let padded = pad_transparent(&silhouette, settings.blur_px * 2);
        (gaussian_blur(&padded, settings.blur_px, 0.0), pad)
    } else {
        (silhouette, 0)
    };

    let (sw, sh) = (i64::from(source.width()), i64::from(source.height()));
    let shadow_x = dx - pad;
    let shadow_y = dy - pad;
    let (shadow_w, shadow_h) = (
        i64::from(silhouette.width()),
        i64::from(silhouette.height()),
    );

    // Union of the source footprint at (0,0) and the shadow footprint.
    let min_x = shadow_x.min(0);
    let min_y = shadow_y.min(0);
    let max_x = (shadow_x + shadow_w).max(sw);
    let max_y = (shadow_y + shadow_h).max(sh);

    let mut canvas = RgbaImage::new((max_x - min_x) as u32, (max_y - min_y) as u32);
    blit_over(&mut canvas, &silhouette, shadow_x - min_x, shadow_y - min_y, 1.0);
    blit_over(&mut canvas, source, -min_x, -min_y, 1.0);

    ShadowedImage {
        image: canvas,
        source_origin: (-min_x, -min_y),
    }
}

fn silhouette(source: &RgbaImage, color: [u8; 3], opacity: u8) -> RgbaImage {
    let mut out = RgbaImage::new(source.width(), source.height());
    for (src, dst) in source.pixels().zip(out.pixels_mut()) {
        let alpha = (u16::from(src.0[3]) * u16::from(opacity) + 127) / 255;
        dst.0 = [color[0], color[1], color[2], alpha as u8];
    }
    out
}

fn pad_transparent(img: &RgbaImage, pad: u32) -> RgbaImage {
    let mut out = RgbaImage::new(img.width() + 2 * pad, img.height() + 2 * pad);
    blit_over(&mut out, img, i64::from(pad), i64::from(pad), 1.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn opaque_square(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([200, 50, 50, 255]))
    }

    fn enabled(distance: u32, blur: u32, angle: f64) -> ShadowSettings {
        ShadowSettings {
            enabled: true,
            distance_px: distance,
            blur_px: blur,
            angle_deg: angle,
            opacity: 255,
            color: [0, 0, 0],
        }
    }

    #[test]
    fn disabled_is_a_passthrough() {
        let src = opaque_square(8);
        let out = apply(&ShadowSettings::default(), &src);
        assert_eq!(out.image, src);
        assert_eq!(out.source_origin, (0, 0));
    }

    #[test]
    fn zero_distance_zero_blur_keeps_origin_and_size() {
        let src = opaque_square(8);
        let out = apply(&enabled(0, 0, 0.0), &src);
        assert_eq!(out.image.dimensions(), (8, 8));
        assert_eq!(out.source_origin, (0, 0));
        // Opaque source fully covers its own silhouette.
        assert_eq!(out.image, src);
    }

    #[test]
    fn blur_grows_the_canvas_monotonically() {
        let src = opaque_square(8);
        let small = apply(&enabled(0, 2, 0.0), &src);
        let large = apply(&enabled(0, 5, 0.0), &src);
        assert!(small.image.width() > 8 && small.image.height() > 8);
        assert!(large.image.width() > small.image.width());
        assert!(large.image.height() > small.image.height());
    }

    #[test]
    fn eastward_offset_puts_shadow_to_the_right() {
        let src = opaque_square(4);
        let out = apply(&enabled(6, 0, 0.0), &src);
        // Union of source at 0..4 and shadow at 6..10.
        assert_eq!(out.image.dimensions(), (10, 4));
        assert_eq!(out.source_origin, (0, 0));
        assert_eq!(out.image.get_pixel(9, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.image.get_pixel(0, 0).0, [200, 50, 50, 255]);
    }

    #[test]
    fn northwest_offset_grows_before_origin() {
        let src = opaque_square(4);
        // 225 degrees points up-left in screen space.
        let out = apply(&enabled(6, 0, 225.0), &src);
        let (ox, oy) = out.source_origin;
        assert!(ox > 0 && oy > 0);
        assert_eq!(
            out.image.get_pixel(ox as u32, oy as u32).0,
            [200, 50, 50, 255]
        );
    }

    #[test]
    fn opacity_scales_silhouette_alpha() {
        let mut settings = enabled(10, 0, 0.0);
        settings.opacity = 128;
        let src = opaque_square(4);
        let out = apply(&settings, &src);
        // A pixel only the shadow covers.
        let px = out.image.get_pixel(9, 0).0;
        assert_eq!(px[..3], [0, 0, 0]);
        assert!(px[3].abs_diff(128) <= 1, "alpha = {}", px[3]);
    }
}
