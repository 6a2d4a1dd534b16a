use std::io::Cursor;

use image::{ImageEncoder, RgbaImage};

use crate::{
    error::{KeyartError, KeyartResult},
    preset::{OutputFormat, Preset},
};

/// Fixed JPEG quality for all exports.
pub const JPEG_QUALITY: u8 = 95;

/// `{stem}-{sanitized_base}.{ext}`; the base name is reduced to
/// filesystem-safe characters first.
pub fn export_file_name(preset: &Preset, base_name: &str) -> String {
    format!(
        "{}-{}.{}",
        preset.file_stem,
        sanitize_base_name(base_name),
        preset.format.extension()
    )
}

/// Keeps ASCII alphanumerics, `-` and `_`; every other run of characters
/// collapses to a single `-`. An empty result falls back to "untitled".
pub fn sanitize_base_name(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    let mut gap = false;
    for ch in base.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
            gap = false;
        } else if !gap && !out.is_empty() {
            out.push('-');
            gap = true;
        }
    }
    let out = out.trim_matches('-').to_string();
    if out.is_empty() {
        "untitled".to_string()
    } else {
        out
    }
}

/// Encodes a composed canvas into the preset's output format. JPEG drops
/// the alpha channel (quality fixed at 95); PNG keeps it for presets flagged
/// as needing transparency.
pub fn encode(preset: &Preset, image: &RgbaImage) -> KeyartResult<Vec<u8>> {
    let mut out = Vec::new();
    match preset.format {
        OutputFormat::Jpeg => {
            let rgb: image::RgbImage = image::buffer::ConvertBuffer::convert(image);
            image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut out), JPEG_QUALITY)
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| KeyartError::render(format!("jpeg encode failed: {e}")))?;
        }
        OutputFormat::Png => {
            image::codecs::png::PngEncoder::new(Cursor::new(&mut out))
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| KeyartError::render(format!("png encode failed: {e}")))?;
        }
    }
    Ok(out)
}

/// Per-preset result of a batch export.
#[derive(Debug)]
pub struct ExportOutcome {
    pub preset_id: String,
    pub file_name: String,
    pub result: KeyartResult<Vec<u8>>,
}

/// Composes and encodes each selected preset strictly in order. Best-effort
/// batch semantics: one preset failing is recorded and logged, the rest
/// still export; there is no rollback.
pub fn export_batch<F>(
    presets: &[&Preset],
    base_name: &str,
    mut compose: F,
) -> Vec<ExportOutcome>
where
    F: FnMut(&Preset) -> KeyartResult<RgbaImage>,
{
    presets
        .iter()
        .map(|preset| {
            let file_name = export_file_name(preset, base_name);
            let result = compose(preset).and_then(|image| encode(preset, &image));
            if let Err(err) = &result {
                tracing::error!(preset = preset.id, %err, "export failed; continuing batch");
            }
            ExportOutcome {
                preset_id: preset.id.to_string(),
                file_name,
                result,
            }
        })
        .collect()
}
