use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;

use crate::{
    error::{KeyartError, KeyartResult},
    guides::{GuideSet, extract_regions, template_candidates},
    preset::{PRESETS, Preset},
    state::{ASSET_LAYERS, LayerId},
};

/// A decoded source image bound to a layer. Read-only after import; replaced
/// wholesale by the next import of the same layer.
#[derive(Clone, Debug)]
pub struct SourceAsset {
    pub path: Option<PathBuf>,
    pub image: RgbaImage,
}

impl SourceAsset {
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Holds at most one decoded asset per layer, shared across all presets.
/// This store and the guide loader are the only parts of the engine that
/// touch the filesystem; everything downstream consumes decoded buffers.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    assets: BTreeMap<LayerId, SourceAsset>,
}

impl AssetStore {
    pub fn get(&self, layer: LayerId) -> Option<&SourceAsset> {
        self.assets.get(&layer)
    }

    pub fn image(&self, layer: LayerId) -> Option<&RgbaImage> {
        self.assets.get(&layer).map(|a| &a.image)
    }

    pub fn size(&self, layer: LayerId) -> Option<(u32, u32)> {
        self.assets.get(&layer).map(SourceAsset::size)
    }

    /// Decodes and installs an asset from raw bytes, replacing any prior
    /// asset for the layer. On a decode failure the error is returned and
    /// the prior asset, if any, stays untouched.
    pub fn import_bytes(
        &mut self,
        layer: LayerId,
        bytes: &[u8],
        path: Option<PathBuf>,
    ) -> KeyartResult<(u32, u32)> {
        if !ASSET_LAYERS.contains(&layer) {
            return Err(KeyartError::asset(format!(
                "layer '{}' does not take an imported asset",
                layer.as_str()
            )));
        }
        let image = image::load_from_memory(bytes)
            .map_err(|e| KeyartError::asset(format!("decode {} image: {e}", layer.as_str())))?
            .to_rgba8();
        let size = image.dimensions();
        tracing::info!(
            layer = layer.as_str(),
            width = size.0,
            height = size.1,
            "asset imported"
        );
        self.assets.insert(layer, SourceAsset { path, image });
        Ok(size)
    }

    /// Reads and imports an asset file.
    pub fn import_file(&mut self, layer: LayerId, path: &Path) -> KeyartResult<(u32, u32)> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read asset '{}'", path.display()))
            .map_err(KeyartError::Other)?;
        self.import_bytes(layer, &bytes, Some(path.to_path_buf()))
    }

    pub fn remove(&mut self, layer: LayerId) {
        self.assets.remove(&layer);
    }

    /// Project reset: drops every imported asset.
    pub fn clear(&mut self) {
        self.assets.clear();
    }
}

/// Guide regions per preset, derived from template files and invalidated
/// only by a reload (variant change or template change).
#[derive(Clone, Debug, Default)]
pub struct GuideCache {
    regions: BTreeMap<String, GuideSet>,
}

impl GuideCache {
    pub fn regions(&self, preset_id: &str) -> Option<&GuideSet> {
        self.regions.get(preset_id)
    }

    /// Reloads guide regions for every preset from `guide_dir`, trying each
    /// preset's candidate template names in priority order. A preset with no
    /// readable template simply has no regions; that is not an error.
    pub fn reload(&mut self, guide_dir: &Path, active_variant: &str) {
        self.regions.clear();
        for preset in &PRESETS {
            if let Some(set) = load_regions_for(preset, guide_dir, active_variant) {
                self.regions.insert(preset.id.to_string(), set);
            }
        }
    }
}

fn load_regions_for(preset: &Preset, guide_dir: &Path, active_variant: &str) -> Option<GuideSet> {
    for name in template_candidates(preset.id, active_variant) {
        let path = guide_dir.join(&name);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(_) => continue,
        };
        match image::load_from_memory(&bytes) {
            Ok(img) => {
                let template = img.to_rgba8();
                tracing::debug!(preset = preset.id, template = %path.display(), "guide template loaded");
                return Some(extract_regions(&template, preset.width, preset.height));
            }
            Err(err) => {
                // Unreadable template: treated as absent, non-fatal.
                tracing::warn!(template = %path.display(), %err, "guide template undecodable, skipped");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba(px));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn import_decodes_and_reports_size() {
        let mut store = AssetStore::default();
        let size = store
            .import_bytes(LayerId::Character, &png_bytes(7, 9, [1, 2, 3, 255]), None)
            .unwrap();
        assert_eq!(size, (7, 9));
        assert_eq!(store.size(LayerId::Character), Some((7, 9)));
    }

    #[test]
    fn failed_decode_keeps_the_prior_asset() {
        let mut store = AssetStore::default();
        store
            .import_bytes(LayerId::Logo, &png_bytes(3, 3, [9, 9, 9, 255]), None)
            .unwrap();
        let err = store.import_bytes(LayerId::Logo, b"not an image", None);
        assert!(err.is_err());
        assert_eq!(store.size(LayerId::Logo), Some((3, 3)));
    }

    #[test]
    fn reimport_replaces_the_asset() {
        let mut store = AssetStore::default();
        store
            .import_bytes(LayerId::Background, &png_bytes(2, 2, [1, 1, 1, 255]), None)
            .unwrap();
        store
            .import_bytes(LayerId::Background, &png_bytes(5, 4, [2, 2, 2, 255]), None)
            .unwrap();
        assert_eq!(store.size(LayerId::Background), Some((5, 4)));
    }

    #[test]
    fn gradient_takes_no_asset() {
        let mut store = AssetStore::default();
        assert!(
            store
                .import_bytes(LayerId::Gradient, &png_bytes(2, 2, [0, 0, 0, 255]), None)
                .is_err()
        );
    }

    #[test]
    fn missing_guide_dir_loads_no_regions() {
        let mut cache = GuideCache::default();
        cache.reload(Path::new("/definitely/not/a/dir"), "v2");
        for p in &PRESETS {
            assert!(cache.regions(p.id).is_none());
        }
    }
}
