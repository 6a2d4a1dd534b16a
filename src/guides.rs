use std::collections::BTreeMap;

use image::RgbaImage;

use crate::state::LayerId;

/// Per-channel Chebyshev tolerance when matching a template pixel against a
/// layer's reference color.
pub const COLOR_TOLERANCE: u8 = 40;

/// Reference colors keying template zones to layers. The gradient is
/// procedural and has no guide zone.
pub const COLOR_KEYS: [(LayerId, [u8; 3]); 3] = [
    (LayerId::Background, [254, 67, 218]),
    (LayerId::Character, [248, 255, 51]),
    (LayerId::Logo, [62, 195, 52]),
];

/// Known guide template variants, in fallback priority order.
pub const GUIDE_VARIANTS: [&str; 2] = ["v2", "v1"];

/// Axis-aligned bounding box in canvas pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GuideRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GuideRegion {
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.w) / 2.0,
            f64::from(self.y) + f64::from(self.h) / 2.0,
        )
    }
}

/// Guide regions extracted for one preset. Derived data: recomputed whenever
/// the guide variant or active template file changes, never edited directly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuideSet {
    regions: BTreeMap<LayerId, GuideRegion>,
}

impl GuideSet {
    pub fn region(&self, layer: LayerId) -> Option<&GuideRegion> {
        self.regions.get(&layer)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Candidate template file names for a preset, in resolution priority order:
/// the active variant first, then the other known variants, then the
/// unversioned name. The caller takes the first existing file; none existing
/// is not an error (placement falls back to heuristics).
pub fn template_candidates(preset_id: &str, active_variant: &str) -> Vec<String> {
    let mut names = Vec::with_capacity(GUIDE_VARIANTS.len() + 1);
    if GUIDE_VARIANTS.contains(&active_variant) {
        names.push(format!("guide_{preset_id}_{active_variant}.png"));
    }
    for variant in GUIDE_VARIANTS {
        let name = format!("guide_{preset_id}_{variant}.png");
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names.push(format!("guide_{preset_id}.png"));
    names
}

/// Parses a color-keyed template into named rectangular zones.
///
/// The template is first stretched (aspect ratio ignored) to exactly the
/// preset canvas size so regions come out in canvas pixel space. For each
/// reference color the bounding box of all pixels within tolerance is taken;
/// empty or degenerate boxes leave that layer's region absent. A missing
/// background region defaults to the full canvas.
pub fn extract_regions(template: &RgbaImage, canvas_w: u32, canvas_h: u32) -> GuideSet {
    let mut set = GuideSet::default();
    if canvas_w == 0 || canvas_h == 0 || template.width() == 0 || template.height() == 0 {
        return set;
    }

    let scaled;
    let pixels = if template.dimensions() == (canvas_w, canvas_h) {
        template
    } else {
        // Nearest keeps key colors pure; any smoothing filter would bleed
        // neighboring zones past the tolerance band.
        scaled = image::imageops::resize(
            template,
            canvas_w,
            canvas_h,
            image::imageops::FilterType::Nearest,
        );
        &scaled
    };

    for (layer, key) in COLOR_KEYS {
        if let Some(region) = mask_bounds(pixels, key) {
            set.regions.insert(layer, region);
        }
    }

    set.regions.entry(LayerId::Background).or_insert(GuideRegion {
        x: 0,
        y: 0,
        w: canvas_w,
        h: canvas_h,
    });

    set
}

fn mask_bounds(img: &RgbaImage, key: [u8; 3]) -> Option<GuideRegion> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut hit = false;

    for (x, y, px) in img.enumerate_pixels() {
        if !matches_key(px.0, key) {
            continue;
        }
        hit = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    if !hit {
        return None;
    }
    let w = max_x - min_x + 1;
    let h = max_y - min_y + 1;
    if w == 0 || h == 0 {
        return None;
    }
    Some(GuideRegion {
        x: min_x,
        y: min_y,
        w,
        h,
    })
}

fn matches_key(px: [u8; 4], key: [u8; 3]) -> bool {
    px[0].abs_diff(key[0]) <= COLOR_TOLERANCE
        && px[1].abs_diff(key[1]) <= COLOR_TOLERANCE
        && px[2].abs_diff(key[2]) <= COLOR_TOLERANCE
}
