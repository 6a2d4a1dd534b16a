use crate::{
    fit::{contain_ratio, resolve_render_size},
    guides::GuideSet,
    preset::Preset,
    state::{Anchor, FitMode, LayerId, LayerState, Transform},
};

/// Computes the auto-placement of one layer on one preset: fit mode, anchor,
/// position, and scale. Pure in all inputs, so re-running with unchanged
/// assets and guides yields bit-identical transforms.
///
/// `src_size` is the layer's source pixel size (the decoded asset, or the
/// laid-out logo-text bitmap). Guide regions, when present for the layer,
/// take precedence over the heuristic fallbacks.
pub fn auto_place(
    layer: LayerId,
    preset: &Preset,
    src_size: Option<(u32, u32)>,
    guides: Option<&GuideSet>,
    current: &LayerState,
) -> LayerState {
    let (canvas_w, canvas_h) = preset.canvas_size();
    let (cw, ch) = (f64::from(canvas_w), f64::from(canvas_h));
    let mut state = *current;

    match layer {
        // A background always fills the frame: crop fit, centered, scale
        // reset so no prior edit can leave seams.
        LayerId::Background => {
            state.fit_mode = FitMode::Crop;
            state.transform = Transform {
                x: cw / 2.0,
                y: ch / 2.0,
                scale: 1.0,
                rotation: 0.0,
                anchor: Anchor::Center,
            };
        }
        // Full-canvas procedural overlay.
        LayerId::Gradient => {
            state.fit_mode = FitMode::Stretch;
            state.transform = Transform {
                x: cw / 2.0,
                y: ch / 2.0,
                scale: 1.0,
                rotation: 0.0,
                anchor: Anchor::Center,
            };
        }
        LayerId::Character => {
            let Some((src_w, src_h)) = nondegenerate(src_size) else {
                return state;
            };
            let region = guides.and_then(|g| g.region(LayerId::Character));
            state.fit_mode = FitMode::Contain;
            if let Some(region) = region {
                // Span from the region's top edge to the canvas bottom edge
                // exactly, standing on the bottom of the frame.
                let base = contain_ratio(src_w, src_h, canvas_w, canvas_h);
                let target_height = ch - f64::from(region.y);
                let scale = target_height / (f64::from(src_h) * base);
                let (center_x, _) = region.center();
                state.transform = Transform {
                    x: center_x,
                    y: ch,
                    scale,
                    rotation: 0.0,
                    anchor: Anchor::Bottom,
                };
            } else {
                // Contained at scale 1, bottom-anchored so the image sits
                // vertically centered in the canvas.
                let rendered_h = resolve_render_size(
                    src_w,
                    src_h,
                    canvas_w,
                    canvas_h,
                    FitMode::Contain,
                    1.0,
                )
                .map(|(_, h)| f64::from(h))
                .unwrap_or(0.0);
                state.transform = Transform {
                    x: cw / 2.0,
                    y: ch / 2.0 + rendered_h / 2.0,
                    scale: 1.0,
                    rotation: 0.0,
                    anchor: Anchor::Bottom,
                };
            }
        }
        LayerId::Logo => {
            let Some((src_w, src_h)) = nondegenerate(src_size) else {
                return state;
            };
            let region = guides.and_then(|g| g.region(LayerId::Logo));
            state.fit_mode = FitMode::Contain;
            if let Some(region) = region {
                let base = contain_ratio(src_w, src_h, canvas_w, canvas_h);
                let region_ratio =
                    contain_ratio(src_w, src_h, region.w.max(1), region.h.max(1));
                let (center_x, center_y) = region.center();
                state.transform = Transform {
                    x: center_x,
                    y: center_y,
                    scale: region_ratio / base,
                    rotation: 0.0,
                    anchor: Anchor::Center,
                };
            } else if preset.logo_only {
                // Logo tile without a guide: park the mark bottom-left at
                // its contained render size.
                let (rw, rh) = resolve_render_size(
                    src_w,
                    src_h,
                    canvas_w,
                    canvas_h,
                    FitMode::Contain,
                    1.0,
                )
                .unwrap_or((1, 1));
                state.transform = Transform {
                    x: f64::from(rw) / 2.0,
                    y: ch - f64::from(rh) / 2.0,
                    scale: 1.0,
                    rotation: 0.0,
                    anchor: Anchor::Center,
                };
            } else {
                state.transform = Transform {
                    x: cw / 2.0,
                    y: ch / 2.0,
                    scale: 1.0,
                    rotation: 0.0,
                    anchor: Anchor::Center,
                };
            }
        }
    }

    state
}

fn nondegenerate(size: Option<(u32, u32)>) -> Option<(u32, u32)> {
    match size {
        Some((w, h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guides::extract_regions;
    use crate::preset::preset_by_id;
    use image::{Rgba, RgbaImage};

    fn guides_with_character_rect(
        canvas_w: u32,
        canvas_h: u32,
        rect: (u32, u32, u32, u32),
    ) -> GuideSet {
        let mut tpl = RgbaImage::from_pixel(canvas_w, canvas_h, Rgba([0, 0, 0, 255]));
        let (rx, ry, rw, rh) = rect;
        for y in ry..ry + rh {
            for x in rx..rx + rw {
                tpl.put_pixel(x, y, Rgba([248, 255, 51, 255]));
            }
        }
        extract_regions(&tpl, canvas_w, canvas_h)
    }

    #[test]
    fn background_always_crops_centered_at_scale_one() {
        let preset = preset_by_id("hero").unwrap();
        let dirty = LayerState {
            transform: Transform {
                x: 7.0,
                y: 9.0,
                scale: 0.4,
                ..Transform::default()
            },
            ..LayerState::default_for(LayerId::Background)
        };
        let placed = auto_place(LayerId::Background, preset, Some((800, 600)), None, &dirty);
        assert_eq!(placed.fit_mode, FitMode::Crop);
        assert_eq!(placed.transform.anchor, Anchor::Center);
        assert_eq!(placed.transform.scale, 1.0);
        assert_eq!(placed.transform.x, 1280.0);
        assert_eq!(placed.transform.y, 720.0);
    }

    #[test]
    fn character_guide_spans_region_top_to_canvas_bottom() {
        // The end-to-end scenario: 1000x1000 source, region y=200 on a
        // 1600x2400 poster canvas.
        let preset = preset_by_id("poster").unwrap();
        let guides = guides_with_character_rect(1600, 2400, (0, 200, 1600, 2200));
        let placed = auto_place(
            LayerId::Character,
            preset,
            Some((1000, 1000)),
            Some(&guides),
            &LayerState::default_for(LayerId::Character),
        );
        assert_eq!(placed.transform.anchor, Anchor::Bottom);
        assert_eq!(placed.transform.y, 2400.0);
        assert_eq!(placed.transform.x, 800.0);
        // scale = (2400-200) / (1000 * min(1600/1000, 2400/1000)) = 1.375
        assert!((placed.transform.scale - 1.375).abs() < 1e-9);
    }

    #[test]
    fn character_without_guide_is_bottom_anchored_and_vertically_centered() {
        let preset = preset_by_id("poster").unwrap();
        let placed = auto_place(
            LayerId::Character,
            preset,
            Some((800, 800)),
            None,
            &LayerState::default_for(LayerId::Character),
        );
        assert_eq!(placed.fit_mode, FitMode::Contain);
        assert_eq!(placed.transform.anchor, Anchor::Bottom);
        assert_eq!(placed.transform.x, 800.0);
        assert_eq!(placed.transform.scale, 1.0);
        // Contained render is 1600x1600 on the 1600x2400 canvas.
        assert_eq!(placed.transform.y, 1200.0 + 800.0);
    }

    #[test]
    fn logo_without_guide_centers_on_regular_presets() {
        let preset = preset_by_id("poster").unwrap();
        let placed = auto_place(
            LayerId::Logo,
            preset,
            Some((500, 200)),
            None,
            &LayerState::default_for(LayerId::Logo),
        );
        assert_eq!(placed.transform.x, 800.0);
        assert_eq!(placed.transform.y, 1200.0);
        assert_eq!(placed.transform.scale, 1.0);
    }

    #[test]
    fn logo_tile_without_guide_sits_bottom_left() {
        let preset = preset_by_id("logo").unwrap();
        let placed = auto_place(
            LayerId::Logo,
            preset,
            Some((512, 512)),
            None,
            &LayerState::default_for(LayerId::Logo),
        );
        // Contained render on the 1024x512 tile is 512x512.
        assert_eq!(placed.transform.x, 256.0);
        assert_eq!(placed.transform.y, 512.0 - 256.0);
        assert_eq!(placed.transform.scale, 1.0);
    }

    #[test]
    fn placement_is_idempotent() {
        let preset = preset_by_id("poster").unwrap();
        let guides = guides_with_character_rect(1600, 2400, (100, 300, 1200, 2000));
        let first = auto_place(
            LayerId::Character,
            preset,
            Some((900, 1400)),
            Some(&guides),
            &LayerState::default_for(LayerId::Character),
        );
        let second = auto_place(
            LayerId::Character,
            preset,
            Some((900, 1400)),
            Some(&guides),
            &first,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn degenerate_source_leaves_state_unchanged() {
        let preset = preset_by_id("poster").unwrap();
        let current = LayerState::default_for(LayerId::Character);
        let placed = auto_place(LayerId::Character, preset, Some((0, 100)), None, &current);
        assert_eq!(placed, current);
        let placed = auto_place(LayerId::Character, preset, None, None, &current);
        assert_eq!(placed, current);
    }
}
