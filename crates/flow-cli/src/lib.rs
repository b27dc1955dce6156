//! CLI logic for the `flowlang` export tool.
//!
//! Loads a diagram file into an [`Editor`], optionally grid-aligns it, and
//! exports it through a headless [`SvgSurface`].

mod args;

pub use args::{Args, Format};

use flow_core::wire::ParseResponse;
use flow_core::{CanvasSize, Diagram, DiagramDocument};
use flow_editor::{ChangeOrigin, ConfigError, Editor, EditorConfig, GraphMutation, Instant};
use flow_render::{
    ExportConfig, ExportEngine, ExportError, ExportOutcome, ExportTarget, ImageClipboard,
    SvgSurface,
};
use log::{info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid diagram JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse response reports a failure: {0}")]
    FailedParse(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, CliError>;

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a saved document, or a parse-flowlang response (recognised by its
/// `success` or `diagram_info` keys).
pub fn load_diagram(json: &str, parse_title: &str) -> Result<Diagram> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let is_response = value.get("success").is_some() || value.get("diagram_info").is_some();
    if is_response {
        let response: ParseResponse = serde_json::from_value(value)?;
        if !response.success {
            return Err(CliError::FailedParse(
                response.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        return Ok(response.into_diagram(parse_title));
    }
    let doc: DiagramDocument = serde_json::from_value(value)?;
    Ok(doc.into_diagram())
}

fn load_configs(args: &Args) -> Result<(EditorConfig, ExportConfig)> {
    let editor = match &args.config {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::default(),
    };
    let mut export = match &args.export_config {
        Some(path) => ExportConfig::from_json_str(&read(path)?)?,
        None => ExportConfig::default(),
    };
    if let Some(scale) = args.scale {
        export.pixel_ratio = scale;
    }
    Ok((editor, export))
}

/// Build the editor state the export is taken from.
pub fn prepare(diagram: Diagram, config: EditorConfig, align: bool) -> Editor {
    let mut editor = Editor::new(config);
    let now = Instant::now();
    match editor.apply_mutation(
        GraphMutation::ReplaceAll {
            diagram: Box::new(diagram),
        },
        ChangeOrigin::ExternalParse,
        now,
    ) {
        Ok(outcome) => {
            if let Some(report) = outcome.report.filter(|r| !r.is_clean()) {
                warn!(
                    "loaded with {} duplicate node(s), {} duplicate edge(s), {} dangling edge(s)",
                    report.duplicate_nodes.len(),
                    report.duplicate_edges.len(),
                    report.dangling_edges.len()
                );
            }
        }
        Err(e) => warn!("diagram did not load cleanly: {e}"),
    }
    if align {
        // An empty selection aligns every node.
        editor.click_background();
        let moved = editor.auto_align(now);
        info!("aligned {moved} node(s)");
    }
    editor
}

#[cfg(feature = "system-clipboard")]
fn clipboard() -> Result<Box<dyn ImageClipboard>> {
    Ok(Box::new(flow_render::SystemClipboard::new()?))
}

#[cfg(not(feature = "system-clipboard"))]
fn clipboard() -> Result<Box<dyn ImageClipboard>> {
    Ok(Box::new(flow_render::NoClipboard))
}

/// Run the export. Returns where the result went.
pub async fn run(args: &Args) -> Result<String> {
    info!("exporting {}", args.input.display());
    let (editor_config, export_config) = load_configs(args)?;
    let diagram = load_diagram(&read(&args.input)?, &editor_config.sync.parse_title)?;
    let editor = prepare(diagram, editor_config, args.align);
    let diagram = editor.snapshot();

    let mut surface = SvgSurface::new(CanvasSize::new(args.width, args.height));
    surface.set_diagram(diagram.clone());

    let target = ExportTarget::from(args.resolved_format());
    let mut sink = clipboard()?;
    let outcome = ExportEngine::new(export_config)
        .export(&mut surface, &diagram, target, sink.as_mut())
        .await?;

    match outcome {
        ExportOutcome::Copied { width, height } => Ok(format!("{width}x{height} image to the clipboard")),
        ExportOutcome::File(artifact) => {
            let path = match &args.output {
                Some(path) => path.clone(),
                None => args
                    .input
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join(&artifact.file_name),
            };
            std::fs::write(&path, &artifact.bytes).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
            Ok(path.display().to_string())
        }
    }
}
