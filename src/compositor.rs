use image::RgbaImage;

use crate::{
    composite::{blit_over, has_translucent_pixels},
    fit::resolve_render_size,
    gradient::{self, GradientSettings},
    preset::Preset,
    shadow::{self, ShadowSettings},
    state::{Anchor, LayerId, PresetLayout, RENDER_ORDER},
    text::{LogoTextSettings, ResolvedFont, render_logo_text},
    textbox::{self, TextboxSettings},
};

/// Default rendered-size / source-size ratio above which an upscale warning
/// is emitted for the background and character layers.
pub const DEFAULT_UPSCALE_WARN_THRESHOLD: f64 = 1.75;

#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub upscale_warn_threshold: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            upscale_warn_threshold: DEFAULT_UPSCALE_WARN_THRESHOLD,
        }
    }
}

/// Everything one composite needs, borrowed for the duration of the call.
/// The compositor owns no state: identical inputs give byte-identical
/// output.
pub struct RenderInputs<'a> {
    pub preset: &'a Preset,
    pub layout: &'a PresetLayout,
    pub background: Option<&'a RgbaImage>,
    pub character: Option<&'a RgbaImage>,
    pub logo: Option<&'a RgbaImage>,
    pub gradient: &'a GradientSettings,
    pub shadow: &'a ShadowSettings,
    pub logo_text: &'a LogoTextSettings,
    pub textbox: &'a TextboxSettings,
    pub font: &'a ResolvedFont,
    pub options: RenderOptions,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct UpscaleWarning {
    pub preset_id: String,
    pub layer: LayerId,
    /// Worst-axis rendered / source ratio.
    pub ratio: f64,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct RenderDiagnostics {
    pub upscale: Vec<UpscaleWarning>,
    /// Whether any canvas pixel ended below full alpha; flags incomplete
    /// coverage on opaque-output presets.
    pub residual_transparency: bool,
}

#[derive(Clone, Debug)]
pub struct RenderedPreset {
    pub image: RgbaImage,
    pub diagnostics: RenderDiagnostics,
}

/// Composites the ordered layer stack onto the preset canvas.
///
/// Render order is fixed: background, character, gradient, logo — the
/// gradient sits above the character and below the logo so the logo is never
/// obscured. Layers that are invisible, disallowed on the preset, or resolve
/// to no bitmap are skipped. Layer opacity multiplies per-pixel alpha at
/// composite time only; blur and shadow always operate on the full-opacity
/// source.
#[tracing::instrument(skip_all, fields(preset = inputs.preset.id))]
pub fn render_preset(inputs: &RenderInputs) -> RenderedPreset {
    let preset = inputs.preset;
    let (canvas_w, canvas_h) = preset.canvas_size();
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    let mut diagnostics = RenderDiagnostics::default();

    for layer in RENDER_ORDER {
        if !preset.allows_layer(layer) {
            continue;
        }
        let state = inputs.layout.layer(layer);
        if !state.visible || state.opacity <= 0.0 {
            continue;
        }
        let opacity = state.opacity.clamp(0.0, 1.0) as f32;

        // The gradient is synthesized directly at canvas size and composed
        // at the origin.
        if layer == LayerId::Gradient {
            if let Some(img) = gradient::synthesize(inputs.gradient, canvas_w, canvas_h) {
                blit_over(&mut canvas, &img, 0, 0, opacity);
            }
            continue;
        }

        let logo_text_bitmap = if layer == LayerId::Logo {
            render_logo_text(inputs.logo_text, inputs.font)
        } else {
            None
        };
        let source: Option<&RgbaImage> = match layer {
            LayerId::Background => inputs.background,
            LayerId::Character => inputs.character,
            // Active logo text supersedes any imported logo asset.
            LayerId::Logo => logo_text_bitmap.as_ref().or(inputs.logo),
            LayerId::Gradient => unreachable!(),
        };
        let Some(source) = source else {
            continue;
        };

        let Some((rw, rh)) = resolve_render_size(
            source.width(),
            source.height(),
            canvas_w,
            canvas_h,
            state.fit_mode,
            state.transform.scale,
        ) else {
            continue;
        };

        if matches!(layer, LayerId::Background | LayerId::Character) {
            let ratio = upscale_ratio(source.dimensions(), (rw, rh));
            if ratio > inputs.options.upscale_warn_threshold {
                tracing::warn!(
                    preset = preset.id,
                    layer = layer.as_str(),
                    ratio,
                    "layer upscaled beyond warning threshold"
                );
                diagnostics.upscale.push(UpscaleWarning {
                    preset_id: preset.id.to_string(),
                    layer,
                    ratio,
                });
            }
        }

        let resized = image::imageops::resize(
            source,
            rw,
            rh,
            image::imageops::FilterType::Lanczos3,
        );

        let (bitmap, source_origin) = if layer == LayerId::Logo {
            let shadowed = shadow::apply(inputs.shadow, &resized);
            (shadowed.image, shadowed.source_origin)
        } else {
            (resized, (0, 0))
        };

        // The anchor aligns the *source* footprint, not any shadow growth
        // around it.
        let (ax, ay) = (state.transform.x, state.transform.y);
        let (ox, oy) = match state.transform.anchor {
            Anchor::Center => (
                ax - f64::from(rw) / 2.0,
                ay - f64::from(rh) / 2.0,
            ),
            Anchor::Bottom => (ax - f64::from(rw) / 2.0, ay - f64::from(rh)),
        };
        let origin_x = ox.round() as i64 - source_origin.0;
        let origin_y = oy.round() as i64 - source_origin.1;

        blit_over(&mut canvas, &bitmap, origin_x, origin_y, opacity);
    }

    textbox::overlay(inputs.textbox, preset, &mut canvas, inputs.font);

    diagnostics.residual_transparency = has_translucent_pixels(&canvas);
    RenderedPreset {
        image: canvas,
        diagnostics,
    }
}

fn upscale_ratio(src: (u32, u32), rendered: (u32, u32)) -> f64 {
    let rx = f64::from(rendered.0) / f64::from(src.0);
    let ry = f64::from(rendered.1) / f64::from(src.1);
    rx.max(ry)
}
