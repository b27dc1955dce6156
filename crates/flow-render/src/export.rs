//! Diagram export: PNG, PDF, SVG and image clipboard.
//!
//! Raster exports borrow the live surface. A [`ChromeGuard`] hides the
//! on-screen decorations and remembers the viewport; dropping it puts both
//! back, so the surface is restored on success, on error and when the export
//! future is cancelled mid-settle.

use crate::error::{ExportError, Result};
use crate::surface::{ChromeState, RasterImage, RenderSurface};
use crate::svg::render_diagram_svg;
use base64::Engine;
use flow_core::layout::{ZoomRange, content_bounds, fit_bounds};
use flow_core::{Diagram, Size, Viewport};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

// ─── Config ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Node footprint used for content bounds. Default: **200 x 80**.
    pub footprint_width: f64,
    pub footprint_height: f64,

    /// Padding around the content when fitting for a raster. Default: **100**.
    pub fit_padding: f64,

    /// Zoom limits for the fit. Default: **0.1 .. 2.0**.
    pub min_zoom: f64,
    pub max_zoom: f64,

    /// Wait after hiding chrome and fitting, before capture. Default: **100**.
    pub settle_ms: u64,

    /// Device pixels per CSS pixel in rasters. Default: **2.0**.
    pub pixel_ratio: f32,

    /// Padding around the content in vector exports. Default: **50**.
    pub svg_padding: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            footprint_width: 200.0,
            footprint_height: 80.0,
            fit_padding: 100.0,
            min_zoom: 0.1,
            max_zoom: 2.0,
            settle_ms: 100,
            pixel_ratio: 2.0,
            svg_padding: 50.0,
        }
    }
}

impl ExportConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn footprint(&self) -> Size {
        Size::new(self.footprint_width, self.footprint_height)
    }

    pub fn zoom_range(&self) -> ZoomRange {
        ZoomRange {
            min: self.min_zoom,
            max: self.max_zoom,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

// ─── Targets and results ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Png,
    Pdf,
    Svg,
    Clipboard,
}

impl ExportTarget {
    /// File extension, `None` for the clipboard.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            ExportTarget::Png => Some("png"),
            ExportTarget::Pdf => Some("pdf"),
            ExportTarget::Svg => Some("svg"),
            ExportTarget::Clipboard => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportTarget::Png | ExportTarget::Clipboard => "image/png",
            ExportTarget::Pdf => "application/pdf",
            ExportTarget::Svg => "image/svg+xml",
        }
    }
}

/// A file ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    File(ExportArtifact),
    /// The image went to the clipboard.
    Copied { width: u32, height: u32 },
}

/// `<title>.<ext>`, or `diagram.<ext>` for a blank title.
pub fn export_file_name(title: &str, extension: &str) -> String {
    let title = title.trim();
    let stem = if title.is_empty() { "diagram" } else { title };
    format!("{stem}.{extension}")
}

// ─── Clipboard sinks ─────────────────────────────────────────────────────

pub trait ImageClipboard {
    fn supports_images(&self) -> bool {
        true
    }

    fn write_image(&mut self, image: &RasterImage) -> Result<()>;
}

/// A sink without image support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipboard;

impl ImageClipboard for NoClipboard {
    fn supports_images(&self) -> bool {
        false
    }

    fn write_image(&mut self, _image: &RasterImage) -> Result<()> {
        Err(ExportError::ClipboardUnsupported)
    }
}

/// The OS clipboard.
#[cfg(feature = "system-clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "system-clipboard")]
impl ImageClipboard for SystemClipboard {
    fn write_image(&mut self, image: &RasterImage) -> Result<()> {
        let data = arboard::ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: std::borrow::Cow::Owned(image.to_rgba()),
        };
        self.inner
            .set_image(data)
            .map_err(|e| ExportError::Clipboard(e.to_string()))
    }
}

// ─── Chrome guard ────────────────────────────────────────────────────────

/// Hides chrome for the lifetime of the guard and restores chrome and
/// viewport on drop.
pub struct ChromeGuard<'a, S: RenderSurface> {
    surface: &'a mut S,
    viewport: Viewport,
    chrome: ChromeState,
}

impl<'a, S: RenderSurface> ChromeGuard<'a, S> {
    pub fn engage(surface: &'a mut S) -> Self {
        let viewport = surface.viewport();
        let chrome = surface.chrome();
        surface.set_chrome(ChromeState::export());
        Self {
            surface,
            viewport,
            chrome,
        }
    }
}

impl<S: RenderSurface> Deref for ChromeGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: RenderSurface> DerefMut for ChromeGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: RenderSurface> Drop for ChromeGuard<'_, S> {
    fn drop(&mut self) {
        self.surface.set_viewport(self.viewport);
        self.surface.set_chrome(self.chrome);
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ExportEngine {
    config: ExportConfig,
}

impl ExportEngine {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Hide chrome, fit the content, let the surface settle, capture.
    pub async fn rasterize<S: RenderSurface>(
        &self,
        surface: &mut S,
        diagram: &Diagram,
    ) -> Result<RasterImage> {
        let mut guard = ChromeGuard::engage(surface);
        if let Some(bounds) = content_bounds(&diagram.nodes, self.config.footprint()) {
            let fitted = fit_bounds(
                bounds,
                guard.size(),
                self.config.fit_padding,
                self.config.zoom_range(),
            );
            guard.set_viewport(fitted);
        }
        guard.settle(self.config.settle()).await;
        guard.rasterize(self.config.pixel_ratio)
    }

    pub async fn export<S: RenderSurface>(
        &self,
        surface: &mut S,
        diagram: &Diagram,
        target: ExportTarget,
        clipboard: &mut dyn ImageClipboard,
    ) -> Result<ExportOutcome> {
        let file = |extension: &str, bytes: Vec<u8>| {
            ExportOutcome::File(ExportArtifact {
                file_name: export_file_name(&diagram.title, extension),
                mime: target.mime(),
                bytes,
            })
        };

        let outcome = match target {
            ExportTarget::Svg => {
                let svg = render_diagram_svg(diagram, self.config.svg_padding)
                    .ok_or(ExportError::NothingToExport)?;
                file("svg", svg.into_bytes())
            }
            ExportTarget::Png => {
                let image = self.rasterize(surface, diagram).await?;
                file("png", image.encode_png()?)
            }
            ExportTarget::Pdf => {
                let image = self.rasterize(surface, diagram).await?;
                file("pdf", pdf_from_png(&image.encode_png()?, image.width(), image.height())?)
            }
            ExportTarget::Clipboard => {
                if !clipboard.supports_images() {
                    return Err(ExportError::ClipboardUnsupported);
                }
                let image = self.rasterize(surface, diagram).await?;
                clipboard.write_image(&image)?;
                ExportOutcome::Copied {
                    width: image.width(),
                    height: image.height(),
                }
            }
        };
        log::info!("exported diagram as {target:?}");
        Ok(outcome)
    }
}

/// Single-page PDF sized to the image, in points, with the PNG filling it.
pub fn pdf_from_png(png: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let data = base64::engine::general_purpose::STANDARD.encode(png);
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><image x="0" y="0" width="{width}" height="{height}" xlink:href="data:image/png;base64,{data}"/></svg>"#
    );
    let opt = svg2pdf::usvg::Options::default();
    let tree =
        svg2pdf::usvg::Tree::from_str(&svg, &opt).map_err(|e| ExportError::SvgParse(e.to_string()))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| ExportError::PdfConvert(e.to_string()))
}
