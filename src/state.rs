use std::collections::BTreeMap;

use crate::preset::PRESETS;

/// Scale bounds applied to interactive edits and snapshot clamping.
/// Auto-placement writes scales outside this range unclamped.
pub const EDIT_SCALE_MIN: f64 = 0.1;
pub const EDIT_SCALE_MAX: f64 = 4.0;

/// The four composable layers, in render order: background first, logo last.
/// The gradient sits above the character and below the logo so the logo is
/// never obscured.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LayerId {
    Background,
    Character,
    Gradient,
    Logo,
}

pub const RENDER_ORDER: [LayerId; 4] = [
    LayerId::Background,
    LayerId::Character,
    LayerId::Gradient,
    LayerId::Logo,
];

/// Layers backed by an imported asset (the gradient is purely procedural).
pub const ASSET_LAYERS: [LayerId; 3] = [LayerId::Background, LayerId::Character, LayerId::Logo];

impl LayerId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Character => "character",
            Self::Gradient => "gradient",
            Self::Logo => "logo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "background" => Some(Self::Background),
            "character" => Some(Self::Character),
            "gradient" => Some(Self::Gradient),
            "logo" => Some(Self::Logo),
            _ => None,
        }
    }
}

/// Policy for scaling a source image into a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fit inside the canvas, preserving aspect ratio.
    Contain,
    /// Fill the canvas, preserving aspect ratio; may clip.
    #[serde(alias = "cover")]
    Crop,
    /// Fill the canvas exactly, ignoring aspect ratio.
    Stretch,
    /// No canvas compensation; only the user scale applies.
    Free,
}

impl FitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contain => "contain",
            Self::Crop => "crop",
            Self::Stretch => "stretch",
            Self::Free => "free",
        }
    }

    /// Accepts the legacy "cover" spelling as an alias of crop. Unknown
    /// values are rejected at the snapshot-merge boundary.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "contain" => Some(Self::Contain),
            "crop" | "cover" => Some(Self::Crop),
            "stretch" => Some(Self::Stretch),
            "free" => Some(Self::Free),
            _ => None,
        }
    }
}

/// Reference point of a layer bitmap that aligns to its transform position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Center,
    /// Bottom-center; used by the character layer.
    Bottom,
}

impl Anchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    /// Canvas-space anchor point, pixels.
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Reserved; not consumed by rendering.
    pub rotation: f64,
    pub anchor: Anchor,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            anchor: Anchor::Center,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerState {
    pub visible: bool,
    /// Composite-time opacity in [0, 1].
    pub opacity: f64,
    pub fit_mode: FitMode,
    pub transform: Transform,
}

impl LayerState {
    pub fn default_for(layer: LayerId) -> Self {
        let fit_mode = match layer {
            LayerId::Background => FitMode::Crop,
            LayerId::Gradient => FitMode::Stretch,
            LayerId::Character | LayerId::Logo => FitMode::Contain,
        };
        let anchor = match layer {
            LayerId::Character => Anchor::Bottom,
            _ => Anchor::Center,
        };
        Self {
            visible: true,
            opacity: 1.0,
            fit_mode,
            transform: Transform {
                anchor,
                ..Transform::default()
            },
        }
    }
}

/// The complete editable state of one preset: one independent `LayerState`
/// per layer. Layouts are never shared across presets.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PresetLayout {
    pub background: LayerState,
    pub character: LayerState,
    pub gradient: LayerState,
    pub logo: LayerState,
}

impl PresetLayout {
    pub fn layer(&self, layer: LayerId) -> &LayerState {
        match layer {
            LayerId::Background => &self.background,
            LayerId::Character => &self.character,
            LayerId::Gradient => &self.gradient,
            LayerId::Logo => &self.logo,
        }
    }

    pub fn layer_mut(&mut self, layer: LayerId) -> &mut LayerState {
        match layer {
            LayerId::Background => &mut self.background,
            LayerId::Character => &mut self.character,
            LayerId::Gradient => &mut self.gradient,
            LayerId::Logo => &mut self.logo,
        }
    }
}

impl Default for PresetLayout {
    fn default() -> Self {
        Self {
            background: LayerState::default_for(LayerId::Background),
            character: LayerState::default_for(LayerId::Character),
            gradient: LayerState::default_for(LayerId::Gradient),
            logo: LayerState::default_for(LayerId::Logo),
        }
    }
}

/// Per-preset layout grid. Keyed by preset id; every known preset is always
/// present (seeded from defaults), so lookups by preset id never miss.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayoutGrid {
    layouts: BTreeMap<String, PresetLayout>,
}

impl LayoutGrid {
    pub fn layout(&self, preset_id: &str) -> Option<&PresetLayout> {
        self.layouts.get(preset_id)
    }

    pub fn layout_mut(&mut self, preset_id: &str) -> Option<&mut PresetLayout> {
        self.layouts.get_mut(preset_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PresetLayout)> {
        self.layouts.iter().map(|(id, layout)| (id.as_str(), layout))
    }

    /// Applies an edit to one (preset, layer) pair and returns the resulting
    /// state-change record, or `None` when the preset id is unknown.
    pub fn apply(&mut self, preset_id: &str, layer: LayerId, edit: LayerEdit) -> Option<LayerChange> {
        let state = self.layouts.get_mut(preset_id)?.layer_mut(layer);
        match edit {
            LayerEdit::SetVisible(v) => state.visible = v,
            LayerEdit::SetOpacity(o) => state.opacity = o.clamp(0.0, 1.0),
            LayerEdit::SetFitMode(m) => state.fit_mode = m,
            LayerEdit::SetScale(s) => {
                state.transform.scale = s.clamp(EDIT_SCALE_MIN, EDIT_SCALE_MAX)
            }
            LayerEdit::SetPosition { x, y } => {
                state.transform.x = x;
                state.transform.y = y;
            }
            LayerEdit::Reset => *state = LayerState::default_for(layer),
        }
        Some(LayerChange {
            preset_id: preset_id.to_string(),
            layer,
            state: *state,
        })
    }
}

impl Default for LayoutGrid {
    fn default() -> Self {
        let layouts = PRESETS
            .iter()
            .map(|p| (p.id.to_string(), PresetLayout::default()))
            .collect();
        Self { layouts }
    }
}

/// An edit operation against one (preset, layer) pair. Interactive scale and
/// opacity edits are clamped here; auto-placement writes transforms directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerEdit {
    SetVisible(bool),
    SetOpacity(f64),
    SetFitMode(FitMode),
    SetScale(f64),
    SetPosition { x: f64, y: f64 },
    Reset,
}

/// Plain state-change record returned by edit operations; consumers such as
/// the preview scheduler subscribe to these instead of widget signals.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerChange {
    pub preset_id: String,
    pub layer: LayerId,
    pub state: LayerState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_seeds_every_preset() {
        let grid = LayoutGrid::default();
        for p in &PRESETS {
            assert!(grid.layout(p.id).is_some());
        }
    }

    #[test]
    fn default_fit_modes_per_layer() {
        let layout = PresetLayout::default();
        assert_eq!(layout.background.fit_mode, FitMode::Crop);
        assert_eq!(layout.character.fit_mode, FitMode::Contain);
        assert_eq!(layout.gradient.fit_mode, FitMode::Stretch);
        assert_eq!(layout.logo.fit_mode, FitMode::Contain);
        assert_eq!(layout.character.transform.anchor, Anchor::Bottom);
    }

    #[test]
    fn cover_is_an_alias_of_crop() {
        assert_eq!(FitMode::from_str("cover"), Some(FitMode::Crop));
        assert_eq!(FitMode::from_str("crop"), Some(FitMode::Crop));
        assert_eq!(FitMode::from_str("sideways"), None);
    }

    #[test]
    fn edits_clamp_and_report() {
        let mut grid = LayoutGrid::default();
        let change = grid
            .apply("poster", LayerId::Character, LayerEdit::SetScale(9.0))
            .unwrap();
        assert_eq!(change.state.transform.scale, EDIT_SCALE_MAX);
        assert_eq!(change.preset_id, "poster");

        let change = grid
            .apply("poster", LayerId::Character, LayerEdit::SetOpacity(1.5))
            .unwrap();
        assert_eq!(change.state.opacity, 1.0);

        assert!(
            grid.apply("nope", LayerId::Logo, LayerEdit::Reset).is_none()
        );
    }

    #[test]
    fn reset_restores_layer_defaults() {
        let mut grid = LayoutGrid::default();
        grid.apply("hero", LayerId::Background, LayerEdit::SetOpacity(0.3));
        grid.apply("hero", LayerId::Background, LayerEdit::Reset);
        assert_eq!(
            *grid.layout("hero").unwrap().layer(LayerId::Background),
            LayerState::default_for(LayerId::Background)
        );
    }

    #[test]
    fn edits_are_independent_across_presets() {
        let mut grid = LayoutGrid::default();
        grid.apply("poster", LayerId::Logo, LayerEdit::SetVisible(false));
        assert!(grid.layout("hero").unwrap().logo.visible);
        assert!(!grid.layout("poster").unwrap().logo.visible);
    }
}
