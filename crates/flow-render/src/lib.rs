//! Rendering and export for FlowLang Canvas diagrams.
//!
//! - [`svg`] turns a [`flow_core::Diagram`] into SVG, either as a standalone
//!   page or as the scene a surface displays.
//! - [`surface`] defines the [`RenderSurface`] seam and a headless resvg
//!   implementation.
//! - [`export`] drives a surface to produce PNG, PDF, SVG or clipboard output.

pub mod error;
pub mod export;
pub mod surface;
pub mod svg;

pub use error::ExportError;
pub use export::{
    ChromeGuard, ExportArtifact, ExportConfig, ExportEngine, ExportOutcome, ExportTarget,
    ImageClipboard, NoClipboard, export_file_name,
};
#[cfg(feature = "system-clipboard")]
pub use export::SystemClipboard;
pub use surface::{ChromeState, RasterImage, RenderSurface, SvgSurface, rasterize_svg};
pub use svg::{render_diagram_svg, render_scene_svg};
