#![forbid(unsafe_code)]

pub mod assets;
pub mod blur;
pub mod composite;
pub mod compositor;
pub mod error;
pub mod export;
pub mod fit;
pub mod gradient;
pub mod guides;
pub mod placement;
pub mod preset;
pub mod scheduler;
pub mod shadow;
pub mod snapshot;
pub mod state;
pub mod text;
pub mod textbox;

pub use assets::{AssetStore, GuideCache, SourceAsset};
pub use compositor::{
    DEFAULT_UPSCALE_WARN_THRESHOLD, RenderDiagnostics, RenderInputs, RenderOptions,
    RenderedPreset, UpscaleWarning, render_preset,
};
pub use error::{KeyartError, KeyartResult};
pub use export::{ExportOutcome, export_batch, export_file_name};
pub use fit::{contain_ratio, resolve_render_size};
pub use gradient::{GradientDirection, GradientMode, GradientSettings};
pub use guides::{GuideRegion, GuideSet, extract_regions, template_candidates};
pub use placement::auto_place;
pub use preset::{OutputFormat, PRESETS, Preset, preset_by_id};
pub use scheduler::PreviewScheduler;
pub use shadow::{ShadowSettings, ShadowedImage};
pub use snapshot::{
    GuideSettings, MergeOutcome, ProjectState, merge_snapshot, resolve_asset_path, to_snapshot,
};
pub use state::{
    Anchor, FitMode, LayerChange, LayerEdit, LayerId, LayerState, LayoutGrid, PresetLayout,
    RENDER_ORDER, Transform,
};
pub use text::{LogoTextSettings, ResolvedFont, TextAlign, render_logo_text};
pub use textbox::{TextboxAlign, TextboxSettings};
