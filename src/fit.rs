use crate::state::FitMode;

/// Aspect-preserving ratio that fits `src` inside `canvas`. This is the one
/// definition of the base ratio shared by fit resolution and auto-placement;
/// the two must never drift apart.
pub fn contain_ratio(src_w: u32, src_h: u32, canvas_w: u32, canvas_h: u32) -> f64 {
    let rw = f64::from(canvas_w) / f64::from(src_w);
    let rh = f64::from(canvas_h) / f64::from(src_h);
    rw.min(rh)
}

fn cover_ratio(src_w: u32, src_h: u32, canvas_w: u32, canvas_h: u32) -> f64 {
    let rw = f64::from(canvas_w) / f64::from(src_w);
    let rh = f64::from(canvas_h) / f64::from(src_h);
    rw.max(rh)
}

/// Resolves the rendered pixel size of a source under a fit policy and user
/// scale. Returns `None` for degenerate sources (zero in either axis): the
/// layer simply has no render, it is not an error.
pub fn resolve_render_size(
    src_w: u32,
    src_h: u32,
    canvas_w: u32,
    canvas_h: u32,
    fit: FitMode,
    scale: f64,
) -> Option<(u32, u32)> {
    if src_w == 0 || src_h == 0 || canvas_w == 0 || canvas_h == 0 {
        return None;
    }

    // Stretch fills the canvas exactly; axes scale independently and the
    // user scale does not apply.
    if fit == FitMode::Stretch {
        return Some((canvas_w, canvas_h));
    }

    let ratio = match fit {
        FitMode::Contain => contain_ratio(src_w, src_h, canvas_w, canvas_h),
        FitMode::Crop => cover_ratio(src_w, src_h, canvas_w, canvas_h),
        FitMode::Free => 1.0,
        FitMode::Stretch => unreachable!(),
    } * scale;

    let w = (f64::from(src_w) * ratio).round().max(1.0) as u32;
    let h = (f64::from(src_h) * ratio).round().max(1.0) as u32;
    Some((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contain_never_exceeds_canvas_and_touches_one_axis() {
        let cases = [
            (1000, 500, 640, 480),
            (333, 777, 1024, 768),
            (2000, 2000, 100, 300),
            (1, 1, 50, 70),
        ];
        for (sw, sh, cw, ch) in cases {
            let (w, h) = resolve_render_size(sw, sh, cw, ch, FitMode::Contain, 1.0).unwrap();
            assert!(w <= cw && h <= ch, "{sw}x{sh} into {cw}x{ch} gave {w}x{h}");
            // Rounding can land one pixel short of the touched axis.
            assert!(
                w + 1 >= cw || h + 1 >= ch,
                "{sw}x{sh} into {cw}x{ch} touches neither axis ({w}x{h})"
            );
        }
    }

    #[test]
    fn cover_never_undershoots_canvas() {
        let cases = [(1000, 500, 640, 480), (333, 777, 1024, 768), (10, 90, 300, 100)];
        for (sw, sh, cw, ch) in cases {
            let (w, h) = resolve_render_size(sw, sh, cw, ch, FitMode::Crop, 1.0).unwrap();
            assert!(w >= cw && h >= ch, "{sw}x{sh} into {cw}x{ch} gave {w}x{h}");
            assert!(w <= cw + 1 || h <= ch + 1);
        }
    }

    #[test]
    fn stretch_is_exactly_canvas_and_ignores_scale() {
        assert_eq!(
            resolve_render_size(123, 45, 640, 480, FitMode::Stretch, 0.25),
            Some((640, 480))
        );
    }

    #[test]
    fn free_applies_only_user_scale() {
        assert_eq!(
            resolve_render_size(200, 100, 640, 480, FitMode::Free, 0.5),
            Some((100, 50))
        );
    }

    #[test]
    fn tiny_scale_clamps_to_one_pixel() {
        assert_eq!(
            resolve_render_size(200, 100, 640, 480, FitMode::Free, 0.0001),
            Some((1, 1))
        );
    }

    #[test]
    fn degenerate_source_renders_nothing() {
        assert_eq!(
            resolve_render_size(0, 100, 640, 480, FitMode::Contain, 1.0),
            None
        );
        assert_eq!(
            resolve_render_size(100, 0, 640, 480, FitMode::Crop, 1.0),
            None
        );
    }

    #[test]
    fn axes_round_independently() {
        // 3x2 into 10x10 contain: ratio 10/3, w = round(10) = 10, h = round(6.67) = 7.
        assert_eq!(
            resolve_render_size(3, 2, 10, 10, FitMode::Contain, 1.0),
            Some((10, 7))
        );
    }
}
