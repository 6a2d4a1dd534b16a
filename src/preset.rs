use crate::state::LayerId;

/// Output encoding chosen per preset at export time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// A named fixed-size output canvas. The table is immutable and defined at
/// process start; all editable state lives in the per-preset layout grid.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Preset {
    pub id: &'static str,
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// The logo layer is never composited on this preset.
    pub skip_logo: bool,
    /// Only the logo layer is composited on this preset (the logo tile).
    pub logo_only: bool,
    /// File-name stem used by export naming.
    pub file_stem: &'static str,
}

impl Preset {
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether a layer may appear at all on this preset, regardless of its
    /// visibility flag.
    pub fn allows_layer(&self, layer: LayerId) -> bool {
        if self.logo_only {
            return layer == LayerId::Logo;
        }
        if self.skip_logo && layer == LayerId::Logo {
            return false;
        }
        true
    }
}

pub const PRESETS: [Preset; 4] = [
    Preset {
        id: "poster",
        label: "Poster",
        width: 1600,
        height: 2400,
        format: OutputFormat::Jpeg,
        skip_logo: false,
        logo_only: false,
        file_stem: "poster",
    },
    Preset {
        id: "hero",
        label: "Hero banner",
        width: 2560,
        height: 1440,
        format: OutputFormat::Jpeg,
        skip_logo: false,
        logo_only: false,
        file_stem: "hero",
    },
    Preset {
        id: "background_no_logo",
        label: "Background (no logo)",
        width: 1920,
        height: 1080,
        format: OutputFormat::Jpeg,
        skip_logo: true,
        logo_only: false,
        file_stem: "background",
    },
    Preset {
        id: "logo",
        label: "Logo tile",
        width: 1024,
        height: 512,
        format: OutputFormat::Png,
        skip_logo: false,
        logo_only: true,
        file_stem: "logo",
    },
];

pub fn preset_by_id(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}
