use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use keyart::{
    AssetStore, GuideCache, LayerId, RenderInputs, RenderOptions, ResolvedFont, export_batch,
    merge_snapshot, preset_by_id, render_preset, resolve_asset_path,
};

#[derive(Parser, Debug)]
#[command(name = "keyart", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render and write the selected export presets of a project.
    Export(ExportArgs),
    /// Print the merged project state and the snapshot load log.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project snapshot JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for the rendered files.
    #[arg(long)]
    out: PathBuf,

    /// Directory holding guide templates (defaults to the snapshot's
    /// directory).
    #[arg(long)]
    guides: Option<PathBuf>,

    /// Restrict the export to these preset ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    presets: Vec<String>,

    /// Recompute auto-placement for every layer from the loaded assets and
    /// guides before rendering.
    #[arg(long)]
    auto_place: bool,

    /// Extra font file tried before the builtin candidate chain.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input project snapshot JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_snapshot_value(path: &Path) -> anyhow::Result<serde_json::Value> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| "parse project JSON")
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let value = read_snapshot_value(&args.in_path)?;
    let outcome = merge_snapshot(&value)?;
    for entry in &outcome.log {
        eprintln!("load: {entry}");
    }
    let mut state = outcome.state;

    let snapshot_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let program_root = if state.program_root.is_empty() {
        None
    } else {
        Some(PathBuf::from(&state.program_root))
    };

    let mut assets = AssetStore::default();
    for (layer, asset_ref) in &state.assets {
        let Some(path) =
            resolve_asset_path(&asset_ref.path, snapshot_dir, program_root.as_deref())
        else {
            eprintln!(
                "asset missing: {} '{}' not found, layer left empty",
                layer.as_str(),
                asset_ref.path
            );
            continue;
        };
        if let Err(err) = assets.import_file(*layer, &path) {
            eprintln!("asset error: {} ({err}), layer left empty", layer.as_str());
        }
    }

    let guide_dir = args.guides.as_deref().unwrap_or(snapshot_dir);
    let mut guide_cache = GuideCache::default();
    guide_cache.reload(guide_dir, &state.guides.variant);

    let mut font_candidates = keyart::text::default_font_candidates();
    if let Some(extra) = &args.font {
        font_candidates.insert(0, extra.clone());
    }
    let font = ResolvedFont::resolve(&font_candidates);

    let selected: Vec<&keyart::Preset> = if args.presets.is_empty() {
        state
            .selected_exports
            .iter()
            .filter_map(|id| preset_by_id(id))
            .collect()
    } else {
        let mut chosen = Vec::new();
        for id in &args.presets {
            let preset = preset_by_id(id)
                .with_context(|| format!("unknown preset '{id}' in --presets"))?;
            chosen.push(preset);
        }
        chosen
    };
    anyhow::ensure!(!selected.is_empty(), "no presets selected for export");

    if args.auto_place {
        let logo_text_size = render_logo_text_size(&state, &font);
        for preset in &selected {
            let guides = guide_cache.regions(preset.id);
            let Some(layout) = state.layouts.layout_mut(preset.id) else {
                continue;
            };
            for layer in keyart::RENDER_ORDER {
                let src_size = match layer {
                    LayerId::Gradient => Some((preset.width, preset.height)),
                    LayerId::Logo => logo_text_size.or_else(|| assets.size(layer)),
                    _ => assets.size(layer),
                };
                let placed =
                    keyart::auto_place(layer, preset, src_size, guides, layout.layer(layer));
                *layout.layer_mut(layer) = placed;
            }
        }
    }

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let outcomes = export_batch(&selected, &state.base_name, |preset| {
        let layout = state.layouts.layout(preset.id).ok_or_else(|| {
            keyart::KeyartError::render(format!("no layout for preset '{}'", preset.id))
        })?;
        let rendered = render_preset(&RenderInputs {
            preset,
            layout,
            background: assets.image(LayerId::Background),
            character: assets.image(LayerId::Character),
            logo: assets.image(LayerId::Logo),
            gradient: &state.gradient,
            shadow: &state.logo_shadow,
            logo_text: &state.logo_text,
            textbox: &state.poster_textbox,
            font: &font,
            options: RenderOptions::default(),
        });
        for warning in &rendered.diagnostics.upscale {
            eprintln!(
                "warning: {} {} upscaled {:.2}x",
                warning.preset_id,
                warning.layer.as_str(),
                warning.ratio
            );
        }
        if rendered.diagnostics.residual_transparency
            && preset.format == keyart::OutputFormat::Jpeg
        {
            eprintln!(
                "warning: {} has uncovered transparent pixels before JPEG flatten",
                preset.id
            );
        }
        Ok(rendered.image)
    });

    let mut failures = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(bytes) => {
                let path = args.out.join(&outcome.file_name);
                std::fs::write(&path, bytes)
                    .with_context(|| format!("write '{}'", path.display()))?;
                eprintln!("wrote {}", path.display());
            }
            Err(err) => {
                failures += 1;
                eprintln!("export failed for {}: {err}", outcome.preset_id);
            }
        }
    }
    anyhow::ensure!(
        failures < outcomes.len(),
        "every selected preset failed to export"
    );
    Ok(())
}

fn render_logo_text_size(
    state: &keyart::ProjectState,
    font: &ResolvedFont,
) -> Option<(u32, u32)> {
    keyart::render_logo_text(&state.logo_text, font).map(|img| img.dimensions())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let value = read_snapshot_value(&args.in_path)?;
    let outcome = merge_snapshot(&value)?;
    let state = &outcome.state;

    println!("base_name:       {}", state.base_name);
    println!("current_preset:  {}", state.current_preset);
    println!("selected:        {}", state.selected_exports.join(", "));
    println!("guide variant:   {}", state.guides.variant);
    println!(
        "gradient:        {}",
        if state.gradient.enabled { "on" } else { "off" }
    );
    println!(
        "logo text:       {}",
        if state.logo_text.is_active() {
            state.logo_text.text.as_str()
        } else {
            "(off)"
        }
    );
    for (layer, asset) in &state.assets {
        println!("asset {:<10} {}", layer.as_str(), asset.path);
    }
    if outcome.log.is_empty() {
        println!("load log:        clean");
    } else {
        println!("load log:");
        for entry in &outcome.log {
            println!("  {entry}");
        }
    }
    Ok(())
}
