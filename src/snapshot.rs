use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};

use crate::{
    error::{KeyartError, KeyartResult},
    gradient::{GradientDirection, GradientMode, GradientSettings},
    guides::GUIDE_VARIANTS,
    preset::PRESETS,
    shadow::ShadowSettings,
    state::{
        ASSET_LAYERS, Anchor, EDIT_SCALE_MAX, EDIT_SCALE_MIN, FitMode, LayerId, LayoutGrid,
        RENDER_ORDER,
    },
    text::{LINE_SPACING_MAX, LINE_SPACING_MIN, LogoTextSettings, TextAlign},
    textbox::{TextboxAlign, TextboxSettings},
};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 2;

/// Guide overlay preferences; preview-only, never part of rendering.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GuideSettings {
    pub visible: bool,
    pub opacity: f64,
    pub variant: String,
}

impl Default for GuideSettings {
    fn default() -> Self {
        Self {
            visible: false,
            opacity: 0.5,
            variant: GUIDE_VARIANTS[0].to_string(),
        }
    }
}

/// Recorded source location of an imported asset.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetRef {
    pub path: String,
    pub loaded: bool,
}

/// The canonical in-memory project state. Always complete: every preset ×
/// layer pair resolves to a full `LayerState`, every settings block exists.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectState {
    /// Root directory recorded at save time; used as the last asset path
    /// resolution fallback.
    pub program_root: String,
    pub current_preset: String,
    pub base_name: String,
    pub selected_exports: Vec<String>,
    pub assets: BTreeMap<LayerId, AssetRef>,
    pub logo_text: LogoTextSettings,
    pub poster_textbox: TextboxSettings,
    pub logo_shadow: ShadowSettings,
    pub gradient: GradientSettings,
    pub guides: GuideSettings,
    pub layouts: LayoutGrid,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            program_root: String::new(),
            current_preset: "poster".to_string(),
            base_name: "keyart".to_string(),
            selected_exports: PRESETS.iter().map(|p| p.id.to_string()).collect(),
            assets: BTreeMap::new(),
            logo_text: LogoTextSettings::default(),
            poster_textbox: TextboxSettings::default(),
            logo_shadow: ShadowSettings::default(),
            gradient: GradientSettings::default(),
            guides: GuideSettings::default(),
            layouts: LayoutGrid::default(),
        }
    }
}

/// Result of a snapshot merge: the fully-populated state plus the log of
/// fields that were defaulted, clamped, or ignored.
#[derive(Debug)]
pub struct MergeOutcome {
    pub state: ProjectState,
    pub log: Vec<String>,
}

/// Merges an external snapshot into the canonical default state.
///
/// Every field present and well-typed overwrites its default; out-of-range
/// numerics are clamped to their documented bounds; wrong-typed or unknown
/// fields are skipped with a log entry. Only a malformed top level (not a
/// JSON object) aborts — in that case no state is produced at all.
pub fn merge_snapshot(value: &Value) -> KeyartResult<MergeOutcome> {
    let Some(root) = value.as_object() else {
        return Err(KeyartError::snapshot(
            "snapshot top level must be a JSON object",
        ));
    };

    let mut state = ProjectState::default();
    let mut log = Vec::new();

    if let Some(root_dir) = take_str(root, "program_root", "program_root", &mut log) {
        state.program_root = root_dir;
    }
    if let Some(id) = take_str(root, "current_preset", "current_preset", &mut log) {
        if PRESETS.iter().any(|p| p.id == id) {
            state.current_preset = id;
        } else {
            log.push(format!("current_preset: unknown preset '{id}', default kept"));
        }
    }
    if let Some(name) = take_str(root, "base_name", "base_name", &mut log) {
        state.base_name = name;
    }
    merge_selected_exports(root, &mut state, &mut log);
    merge_assets(root, &mut state, &mut log);

    if let Some(obj) = take_obj(root, "logo_text", &mut log) {
        merge_logo_text(obj, &mut state.logo_text, &mut log);
    }
    if let Some(obj) = take_obj(root, "poster_textbox", &mut log) {
        merge_textbox(obj, &mut state.poster_textbox, &mut log);
    }
    if let Some(obj) = take_obj(root, "logo_shadow", &mut log) {
        merge_shadow(obj, &mut state.logo_shadow, &mut log);
    }
    if let Some(obj) = take_obj(root, "gradient", &mut log) {
        merge_gradient(obj, &mut state.gradient, &mut log);
    }
    if let Some(obj) = take_obj(root, "guides", &mut log) {
        merge_guides(obj, &mut state.guides, &mut log);
    }
    if let Some(obj) = take_obj(root, "state", &mut log) {
        merge_layouts(obj, &mut state.layouts, &mut log);
    }

    if !log.is_empty() {
        tracing::warn!(entries = log.len(), "snapshot merged with defaulted fields");
    }
    Ok(MergeOutcome { state, log })
}

/// Serializes the canonical state back into the snapshot schema. `saved_at`
/// is supplied by the caller so the engine itself stays clock-free.
pub fn to_snapshot(state: &ProjectState, saved_at: &str) -> Value {
    let assets: Map<String, Value> = state
        .assets
        .iter()
        .map(|(layer, a)| {
            (
                layer.as_str().to_string(),
                json!({ "path": a.path, "loaded": a.loaded }),
            )
        })
        .collect();

    let mut layouts = Map::new();
    for (preset_id, layout) in state.layouts.iter() {
        let mut layers = Map::new();
        for layer in RENDER_ORDER {
            let ls = layout.layer(layer);
            layers.insert(
                layer.as_str().to_string(),
                json!({
                    "visible": ls.visible,
                    "opacity": ls.opacity,
                    "fit_mode": ls.fit_mode.as_str(),
                    "transform": {
                        "x": ls.transform.x,
                        "y": ls.transform.y,
                        "scale": ls.transform.scale,
                        "rotation": ls.transform.rotation,
                        "anchor": ls.transform.anchor.as_str(),
                    },
                }),
            );
        }
        layouts.insert(preset_id.to_string(), Value::Object(layers));
    }

    let textbox_align = match state.poster_textbox.align {
        TextboxAlign::Center => "center",
        TextboxAlign::Left => "left",
    };
    let gradient_mode = match state.gradient.mode {
        GradientMode::Single => "single",
        GradientMode::Double => "double",
    };

    json!({
        "schema_version": SNAPSHOT_SCHEMA_VERSION,
        "saved_at": saved_at,
        "program_root": state.program_root,
        "current_preset": state.current_preset,
        "base_name": state.base_name,
        "selected_exports": state.selected_exports,
        "assets": assets,
        "logo_text": {
            "enabled": state.logo_text.enabled,
            "text": state.logo_text.text,
            "size_px": state.logo_text.size_px,
            "align": align_str(state.logo_text.align),
            "line_spacing": state.logo_text.line_spacing,
            "uppercase": state.logo_text.uppercase,
            "color": format_hex_color(state.logo_text.color),
        },
        "poster_textbox": {
            "enabled": state.poster_textbox.enabled,
            "text": state.poster_textbox.text,
            "align": textbox_align,
            "text_color": format_hex_color(state.poster_textbox.text_color),
            "fill_color": format_hex_color(state.poster_textbox.fill_color),
            "fill_alpha": state.poster_textbox.fill_alpha,
        },
        "logo_shadow": {
            "enabled": state.logo_shadow.enabled,
            "distance_px": state.logo_shadow.distance_px,
            "blur_px": state.logo_shadow.blur_px,
            "angle_deg": state.logo_shadow.angle_deg,
            "opacity": state.logo_shadow.opacity,
            "color": format_hex_color(state.logo_shadow.color),
        },
        "gradient": {
            "enabled": state.gradient.enabled,
            "mode": gradient_mode,
            "direction": direction_str(state.gradient.direction),
            "distance_pct": state.gradient.distance_pct,
            "stretch_pct": state.gradient.stretch_pct,
            "color_a": format_hex_color(state.gradient.color_a),
            "color_b": format_hex_color(state.gradient.color_b),
        },
        "guides": {
            "visible": state.guides.visible,
            "opacity": state.guides.opacity,
            "variant": state.guides.variant,
        },
        "state": layouts,
    })
}

/// Resolves an asset path recorded in a snapshot: absolute as-is, then
/// relative to the snapshot's directory, then relative to the recorded
/// program root. First existing candidate wins.
pub fn resolve_asset_path(
    raw: &str,
    snapshot_dir: &Path,
    program_root: Option<&Path>,
) -> Option<PathBuf> {
    let mut candidates = Vec::with_capacity(3);
    let as_is = PathBuf::from(raw);
    if as_is.is_absolute() {
        candidates.push(as_is.clone());
    }
    candidates.push(snapshot_dir.join(raw));
    if let Some(root) = program_root {
        candidates.push(root.join(raw));
    }
    candidates.into_iter().find(|c| c.is_file())
}

pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

pub fn format_hex_color([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn merge_selected_exports(root: &Map<String, Value>, state: &mut ProjectState, log: &mut Vec<String>) {
    let Some(v) = root.get("selected_exports") else {
        return;
    };
    let Some(arr) = v.as_array() else {
        log.push("selected_exports: expected an array, default kept".to_string());
        return;
    };
    let mut selected = Vec::new();
    for item in arr {
        match item.as_str() {
            Some(id) if PRESETS.iter().any(|p| p.id == id) => {
                if !selected.contains(&id.to_string()) {
                    selected.push(id.to_string());
                }
            }
            Some(id) => log.push(format!("selected_exports: unknown preset '{id}' skipped")),
            None => log.push("selected_exports: non-string entry skipped".to_string()),
        }
    }
    state.selected_exports = selected;
}

fn merge_assets(root: &Map<String, Value>, state: &mut ProjectState, log: &mut Vec<String>) {
    let Some(obj) = take_obj(root, "assets", log) else {
        return;
    };
    for (key, entry) in obj {
        let Some(layer) = LayerId::from_str(key).filter(|l| ASSET_LAYERS.contains(l)) else {
            log.push(format!("assets.{key}: unknown asset layer skipped"));
            continue;
        };
        let Some(entry) = entry.as_object() else {
            log.push(format!("assets.{key}: expected an object, skipped"));
            continue;
        };
        let mut asset = AssetRef::default();
        if let Some(path) = take_str(entry, "path", &format!("assets.{key}.path"), log) {
            asset.path = path;
        }
        if let Some(loaded) = take_bool(entry, "loaded", &format!("assets.{key}.loaded"), log) {
            asset.loaded = loaded;
        }
        if !asset.path.is_empty() {
            state.assets.insert(layer, asset);
        }
    }
}

fn merge_logo_text(obj: &Map<String, Value>, out: &mut LogoTextSettings, log: &mut Vec<String>) {
    if let Some(v) = take_bool(obj, "enabled", "logo_text.enabled", log) {
        out.enabled = v;
    }
    if let Some(v) = take_str(obj, "text", "logo_text.text", log) {
        out.text = v;
    }
    if let Some(v) = take_f64(obj, "size_px", "logo_text.size_px", log) {
        out.size_px = v.clamp(4.0, 1024.0) as f32;
    }
    if let Some(v) = take_str(obj, "align", "logo_text.align", log) {
        match v.as_str() {
            "left" => out.align = TextAlign::Left,
            "center" => out.align = TextAlign::Center,
            "right" => out.align = TextAlign::Right,
            other => log.push(format!("logo_text.align: unknown value '{other}', default kept")),
        }
    }
    if let Some(v) = take_f64(obj, "line_spacing", "logo_text.line_spacing", log) {
        out.line_spacing = (v as f32).clamp(LINE_SPACING_MIN, LINE_SPACING_MAX);
    }
    if let Some(v) = take_bool(obj, "uppercase", "logo_text.uppercase", log) {
        out.uppercase = v;
    }
    if let Some(v) = take_color(obj, "color", "logo_text.color", log) {
        out.color = v;
    }
}

fn merge_textbox(obj: &Map<String, Value>, out: &mut TextboxSettings, log: &mut Vec<String>) {
    if let Some(v) = take_bool(obj, "enabled", "poster_textbox.enabled", log) {
        out.enabled = v;
    }
    if let Some(v) = take_str(obj, "text", "poster_textbox.text", log) {
        out.text = v;
    }
    if let Some(v) = take_str(obj, "align", "poster_textbox.align", log) {
        match v.as_str() {
            "center" => out.align = TextboxAlign::Center,
            "left" => out.align = TextboxAlign::Left,
            other => log.push(format!(
                "poster_textbox.align: unknown value '{other}', default kept"
            )),
        }
    }
    if let Some(v) = take_color(obj, "text_color", "poster_textbox.text_color", log) {
        out.text_color = v;
    }
    if let Some(v) = take_color(obj, "fill_color", "poster_textbox.fill_color", log) {
        out.fill_color = v;
    }
    if let Some(v) = take_f64(obj, "fill_alpha", "poster_textbox.fill_alpha", log) {
        out.fill_alpha = v.clamp(0.0, 255.0).round() as u8;
    }
}

fn merge_shadow(obj: &Map<String, Value>, out: &mut ShadowSettings, log: &mut Vec<String>) {
    if let Some(v) = take_bool(obj, "enabled", "logo_shadow.enabled", log) {
        out.enabled = v;
    }
    if let Some(v) = take_f64(obj, "distance_px", "logo_shadow.distance_px", log) {
        out.distance_px = v.clamp(0.0, 500.0).round() as u32;
    }
    if let Some(v) = take_f64(obj, "blur_px", "logo_shadow.blur_px", log) {
        // Blur radii above 256 are rejected upstream by the blur kernel cap.
        out.blur_px = v.clamp(0.0, 256.0).round() as u32;
    }
    if let Some(v) = take_f64(obj, "angle_deg", "logo_shadow.angle_deg", log) {
        out.angle_deg = v;
    }
    if let Some(v) = take_f64(obj, "opacity", "logo_shadow.opacity", log) {
        out.opacity = v.clamp(0.0, 255.0).round() as u8;
    }
    if let Some(v) = take_color(obj, "color", "logo_shadow.color", log) {
        out.color = v;
    }
}

fn merge_gradient(obj: &Map<String, Value>, out: &mut GradientSettings, log: &mut Vec<String>) {
    if let Some(v) = take_bool(obj, "enabled", "gradient.enabled", log) {
        out.enabled = v;
    }
    if let Some(v) = take_str(obj, "mode", "gradient.mode", log) {
        match v.as_str() {
            "single" => out.mode = GradientMode::Single,
            "double" => out.mode = GradientMode::Double,
            other => log.push(format!("gradient.mode: unknown value '{other}', default kept")),
        }
    }
    if let Some(v) = take_str(obj, "direction", "gradient.direction", log) {
        match v.as_str() {
            "top" => out.direction = GradientDirection::Top,
            "bottom" => out.direction = GradientDirection::Bottom,
            "left" => out.direction = GradientDirection::Left,
            "right" => out.direction = GradientDirection::Right,
            other => log.push(format!(
                "gradient.direction: unknown value '{other}', default kept"
            )),
        }
    }
    if let Some(v) = take_f64(obj, "distance_pct", "gradient.distance_pct", log) {
        out.distance_pct = v.clamp(1.0, 100.0).round() as u32;
    }
    if let Some(v) = take_f64(obj, "stretch_pct", "gradient.stretch_pct", log) {
        out.stretch_pct = v.clamp(20.0, 300.0).round() as u32;
    }
    if let Some(v) = take_color(obj, "color_a", "gradient.color_a", log) {
        out.color_a = v;
    }
    if let Some(v) = take_color(obj, "color_b", "gradient.color_b", log) {
        out.color_b = v;
    }
}

fn merge_guides(obj: &Map<String, Value>, out: &mut GuideSettings, log: &mut Vec<String>) {
    if let Some(v) = take_bool(obj, "visible", "guides.visible", log) {
        out.visible = v;
    }
    if let Some(v) = take_f64(obj, "opacity", "guides.opacity", log) {
        out.opacity = v.clamp(0.0, 1.0);
    }
    if let Some(v) = take_str(obj, "variant", "guides.variant", log) {
        if !v.is_empty() {
            out.variant = v;
        }
    }
}

fn merge_layouts(obj: &Map<String, Value>, grid: &mut LayoutGrid, log: &mut Vec<String>) {
    for (preset_id, layers) in obj {
        let Some(layout) = grid.layout_mut(preset_id) else {
            log.push(format!("state.{preset_id}: unknown preset skipped"));
            continue;
        };
        let Some(layers) = layers.as_object() else {
            log.push(format!("state.{preset_id}: expected an object, skipped"));
            continue;
        };
        for (layer_key, layer_value) in layers {
            let Some(layer) = LayerId::from_str(layer_key) else {
                log.push(format!("state.{preset_id}.{layer_key}: unknown layer skipped"));
                continue;
            };
            let Some(fields) = layer_value.as_object() else {
                log.push(format!(
                    "state.{preset_id}.{layer_key}: expected an object, skipped"
                ));
                continue;
            };
            let path = format!("state.{preset_id}.{layer_key}");
            let state = layout.layer_mut(layer);

            if let Some(v) = take_bool(fields, "visible", &format!("{path}.visible"), log) {
                state.visible = v;
            }
            if let Some(v) = take_f64(fields, "opacity", &format!("{path}.opacity"), log) {
                state.opacity = v.clamp(0.0, 1.0);
            }
            if let Some(v) = take_str(fields, "fit_mode", &format!("{path}.fit_mode"), log) {
                match FitMode::from_str(&v) {
                    Some(mode) => state.fit_mode = mode,
                    None => log.push(format!(
                        "{path}.fit_mode: unknown value '{v}', default kept"
                    )),
                }
            }
            if let Some(tf) = take_obj(fields, "transform", log) {
                let tpath = format!("{path}.transform");
                if let Some(v) = take_f64(tf, "x", &format!("{tpath}.x"), log) {
                    state.transform.x = v;
                }
                if let Some(v) = take_f64(tf, "y", &format!("{tpath}.y"), log) {
                    state.transform.y = v;
                }
                if let Some(v) = take_f64(tf, "scale", &format!("{tpath}.scale"), log) {
                    state.transform.scale = v.clamp(EDIT_SCALE_MIN, EDIT_SCALE_MAX);
                }
                if let Some(v) = take_f64(tf, "rotation", &format!("{tpath}.rotation"), log) {
                    state.transform.rotation = v;
                }
                if let Some(v) = take_str(tf, "anchor", &format!("{tpath}.anchor"), log) {
                    match Anchor::from_str(&v) {
                        Some(anchor) => state.transform.anchor = anchor,
                        None => log.push(format!(
                            "{tpath}.anchor: unknown value '{v}', default kept"
                        )),
                    }
                }
            }
        }
    }
}

fn take_obj<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    log: &mut Vec<String>,
) -> Option<&'a Map<String, Value>> {
    let v = obj.get(key)?;
    match v.as_object() {
        Some(o) => Some(o),
        None => {
            log.push(format!("{key}: expected an object, default kept"));
            None
        }
    }
}

fn take_str(obj: &Map<String, Value>, key: &str, path: &str, log: &mut Vec<String>) -> Option<String> {
    let v = obj.get(key)?;
    match v.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            log.push(format!("{path}: expected a string, default kept"));
            None
        }
    }
}

fn take_bool(obj: &Map<String, Value>, key: &str, path: &str, log: &mut Vec<String>) -> Option<bool> {
    let v = obj.get(key)?;
    match v.as_bool() {
        Some(b) => Some(b),
        None => {
            log.push(format!("{path}: expected a boolean, default kept"));
            None
        }
    }
}

fn take_f64(obj: &Map<String, Value>, key: &str, path: &str, log: &mut Vec<String>) -> Option<f64> {
    let v = obj.get(key)?;
    match v.as_f64() {
        Some(n) if n.is_finite() => Some(n),
        Some(_) => {
            log.push(format!("{path}: non-finite number, default kept"));
            None
        }
        None => {
            log.push(format!("{path}: expected a number, default kept"));
            None
        }
    }
}

fn take_color(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    log: &mut Vec<String>,
) -> Option<[u8; 3]> {
    let s = take_str(obj, key, path, log)?;
    match parse_hex_color(&s) {
        Some(c) => Some(c),
        None => {
            log.push(format!("{path}: invalid color '{s}', default kept"));
            None
        }
    }
}

fn align_str(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "left",
        TextAlign::Center => "center",
        TextAlign::Right => "right",
    }
}

fn direction_str(direction: GradientDirection) -> &'static str {
    match direction {
        GradientDirection::Top => "top",
        GradientDirection::Bottom => "bottom",
        GradientDirection::Left => "left",
        GradientDirection::Right => "right",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_object_top_level_is_rejected() {
        assert!(merge_snapshot(&json!([1, 2, 3])).is_err());
        assert!(merge_snapshot(&json!("state")).is_err());
    }

    #[test]
    fn empty_object_yields_complete_defaults() {
        let outcome = merge_snapshot(&json!({})).unwrap();
        assert_eq!(outcome.state, ProjectState::default());
        assert!(outcome.log.is_empty());
        for p in &PRESETS {
            assert!(outcome.state.layouts.layout(p.id).is_some());
        }
    }

    #[test]
    fn well_typed_fields_overwrite_defaults() {
        let outcome = merge_snapshot(&json!({
            "current_preset": "hero",
            "base_name": "saga",
            "selected_exports": ["poster", "logo"],
            "gradient": { "enabled": true, "mode": "double", "distance_pct": 80 },
            "state": {
                "poster": {
                    "character": {
                        "opacity": 0.7,
                        "transform": { "x": 123.0, "scale": 2.0 }
                    }
                }
            }
        }))
        .unwrap();

        let s = &outcome.state;
        assert_eq!(s.current_preset, "hero");
        assert_eq!(s.base_name, "saga");
        assert_eq!(s.selected_exports, vec!["poster", "logo"]);
        assert!(s.gradient.enabled);
        assert_eq!(s.gradient.mode, GradientMode::Double);
        assert_eq!(s.gradient.distance_pct, 80);
        let character = s.layouts.layout("poster").unwrap().character;
        assert_eq!(character.opacity, 0.7);
        assert_eq!(character.transform.x, 123.0);
        assert_eq!(character.transform.scale, 2.0);
        // Untouched siblings keep defaults.
        assert_eq!(character.transform.y, 0.0);
    }

    #[test]
    fn wrong_types_are_ignored_and_logged() {
        let outcome = merge_snapshot(&json!({
            "base_name": 42,
            "gradient": { "enabled": "yes", "distance_pct": "far" },
            "state": { "poster": { "logo": { "visible": "nope" } } }
        }))
        .unwrap();

        assert_eq!(outcome.state.base_name, "keyart");
        assert!(!outcome.state.gradient.enabled);
        assert!(outcome.state.layouts.layout("poster").unwrap().logo.visible);
        assert_eq!(outcome.log.len(), 4);
    }

    #[test]
    fn out_of_range_numerics_are_clamped() {
        let outcome = merge_snapshot(&json!({
            "gradient": { "distance_pct": 900, "stretch_pct": 1 },
            "logo_shadow": { "opacity": 9000.0 },
            "state": {
                "hero": {
                    "background": {
                        "opacity": 3.5,
                        "transform": { "scale": 100.0 }
                    }
                }
            }
        }))
        .unwrap();

        let s = &outcome.state;
        assert_eq!(s.gradient.distance_pct, 100);
        assert_eq!(s.gradient.stretch_pct, 20);
        assert_eq!(s.logo_shadow.opacity, 255);
        let bg = s.layouts.layout("hero").unwrap().background;
        assert_eq!(bg.opacity, 1.0);
        assert_eq!(bg.transform.scale, EDIT_SCALE_MAX);
    }

    #[test]
    fn unknown_enum_strings_keep_defaults() {
        let outcome = merge_snapshot(&json!({
            "gradient": { "direction": "diagonal" },
            "state": { "poster": { "character": { "fit_mode": "tile" } } }
        }))
        .unwrap();
        assert_eq!(
            outcome.state.gradient.direction,
            GradientDirection::Bottom
        );
        assert_eq!(
            outcome.state.layouts.layout("poster").unwrap().character.fit_mode,
            FitMode::Contain
        );
        assert_eq!(outcome.log.len(), 2);
    }

    #[test]
    fn legacy_cover_spelling_is_accepted() {
        let outcome = merge_snapshot(&json!({
            "state": { "poster": { "character": { "fit_mode": "cover" } } }
        }))
        .unwrap();
        assert_eq!(
            outcome.state.layouts.layout("poster").unwrap().character.fit_mode,
            FitMode::Crop
        );
    }

    #[test]
    fn unknown_presets_and_layers_are_skipped() {
        let outcome = merge_snapshot(&json!({
            "state": {
                "billboard": { "background": { "visible": false } },
                "poster": { "caption": { "visible": false } }
            }
        }))
        .unwrap();
        assert_eq!(outcome.state.layouts, LayoutGrid::default());
        assert_eq!(outcome.log.len(), 2);
    }

    #[test]
    fn snapshot_roundtrips_through_merge() {
        let mut state = ProjectState::default();
        state.base_name = "round".to_string();
        state.gradient.enabled = true;
        state.gradient.color_a = [1, 2, 3];
        state
            .layouts
            .layout_mut("hero")
            .unwrap()
            .character
            .transform
            .x = 55.5;
        state.assets.insert(
            LayerId::Background,
            AssetRef {
                path: "bg.png".to_string(),
                loaded: true,
            },
        );

        let value = to_snapshot(&state, "2026-08-06T00:00:00Z");
        let outcome = merge_snapshot(&value).unwrap();
        assert_eq!(outcome.state, state);
        assert!(outcome.log.is_empty());
    }

    #[test]
    fn hex_colors_parse_and_format() {
        assert_eq!(parse_hex_color("#fe43da"), Some([254, 67, 218]));
        assert_eq!(format_hex_color([254, 67, 218]), "#fe43da");
        assert_eq!(parse_hex_color("fe43da"), None);
        assert_eq!(parse_hex_color("#fe43d"), None);
        assert_eq!(parse_hex_color("#gg43da"), None);
    }
}
