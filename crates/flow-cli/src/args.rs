//! Command-line argument definitions for the `flowlang` tool.

use clap::{Parser, ValueEnum};
use flow_render::ExportTarget;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Svg,
    Png,
    Pdf,
    /// Copy a PNG to the system clipboard.
    Clipboard,
}

impl From<Format> for ExportTarget {
    fn from(format: Format) -> Self {
        match format {
            Format::Svg => ExportTarget::Svg,
            Format::Png => ExportTarget::Png,
            Format::Pdf => ExportTarget::Pdf,
            Format::Clipboard => ExportTarget::Clipboard,
        }
    }
}

/// Export FlowLang Canvas diagrams to SVG, PNG or PDF
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Diagram JSON: a saved document or a parse-flowlang response
    pub input: PathBuf,

    /// Output file. Defaults to `<title>.<ext>` next to the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format. Inferred from `--output` when omitted
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// Grid-align all nodes before exporting
    #[arg(long)]
    pub align: bool,

    /// Editor configuration (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Export configuration (JSON)
    #[arg(long)]
    pub export_config: Option<PathBuf>,

    /// Surface width in pixels for raster exports
    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    /// Surface height in pixels for raster exports
    #[arg(long, default_value_t = 768)]
    pub height: u32,

    /// Device pixel ratio for raster exports, overriding the export config
    #[arg(long)]
    pub scale: Option<f32>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// `--format`, else the output extension, else SVG.
    pub fn resolved_format(&self) -> Format {
        if let Some(format) = self.format {
            return format;
        }
        let ext = self
            .output
            .as_ref()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Format::Png,
            Some("pdf") => Format::Pdf,
            _ => Format::Svg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_inferred_from_output() {
        let args = Args::parse_from(["flowlang", "in.json", "-o", "out.PDF"]);
        assert_eq!(args.resolved_format(), Format::Pdf);

        let args = Args::parse_from(["flowlang", "in.json", "-o", "out.pdf", "-f", "png"]);
        assert_eq!(args.resolved_format(), Format::Png);

        let args = Args::parse_from(["flowlang", "in.json"]);
        assert_eq!(args.resolved_format(), Format::Svg);
        assert_eq!((args.width, args.height), (1024, 768));
    }
}
