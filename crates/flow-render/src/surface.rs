//! Render surfaces.
//!
//! A [`RenderSurface`] is whatever displays the canvas: the browser flow view,
//! or the headless [`SvgSurface`] used by the CLI and tests. Exports drive a
//! surface only through this trait.

use crate::error::{ExportError, Result};
use crate::svg::render_scene_svg;
use flow_core::layout::{CanvasSize, Viewport};
use flow_core::{Color, Diagram};
use std::time::Duration;

/// Which on-screen decorations are visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromeState {
    pub controls: bool,
    pub minimap: bool,
    /// Toolbar, title and export panels.
    pub panels: bool,
    /// Dot grid behind the content.
    pub background_pattern: bool,
    pub background: Color,
}

impl ChromeState {
    /// Everything shown, over the canvas gray.
    pub const fn live() -> Self {
        Self {
            controls: true,
            minimap: true,
            panels: true,
            background_pattern: true,
            background: Color::hex(0xFAFAFA),
        }
    }

    /// Bare content on white.
    pub const fn export() -> Self {
        Self {
            controls: false,
            minimap: false,
            panels: false,
            background_pattern: false,
            background: Color::WHITE,
        }
    }
}

impl Default for ChromeState {
    fn default() -> Self {
        Self::live()
    }
}

/// A rasterized surface: straight-alpha RGBA plus dimensions.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixmap: tiny_skia::Pixmap,
}

impl RasterImage {
    pub fn from_pixmap(pixmap: tiny_skia::Pixmap) -> Self {
        Self { pixmap }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| ExportError::PngEncode(e.to_string()))
    }

    /// Unpremultiplied RGBA8, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

pub trait RenderSurface {
    /// Surface size in CSS pixels.
    fn size(&self) -> CanvasSize;

    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);

    fn chrome(&self) -> ChromeState;
    fn set_chrome(&mut self, chrome: ChromeState);

    /// Resolve once the surface shows the viewport and chrome last set,
    /// waiting at least `delay` where painting is asynchronous.
    fn settle(&mut self, delay: Duration) -> impl Future<Output = ()>;

    /// Capture what the surface currently shows at `pixel_ratio` device
    /// pixels per CSS pixel.
    fn rasterize(&mut self, pixel_ratio: f32) -> Result<RasterImage>;
}

/// Rasterize an SVG document over a solid `background`.
///
/// `fonts` are extra font files (TTF/OTF bytes) added to the font database;
/// without any font, text is dropped from the raster.
pub fn rasterize_svg(
    svg: &str,
    pixel_ratio: f32,
    background: Color,
    system_fonts: bool,
    fonts: &[Vec<u8>],
) -> Result<RasterImage> {
    let mut opt = usvg::Options::default();
    if system_fonts {
        opt.fontdb_mut().load_system_fonts();
    }
    for data in fonts {
        opt.fontdb_mut().load_font_data(data.clone());
    }
    opt.font_family = "Arial".to_string();
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| ExportError::SvgParse(e.to_string()))?;

    let size = tree.size();
    let width = (size.width() * pixel_ratio).ceil().max(1.0) as u32;
    let height = (size.height() * pixel_ratio).ceil().max(1.0) as u32;
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(ExportError::PixmapAlloc { width, height })?;
    pixmap.fill(tiny_skia::Color::from_rgba8(
        background.r,
        background.g,
        background.b,
        background.a,
    ));
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(pixel_ratio, pixel_ratio),
        &mut pixmap.as_mut(),
    );
    log::debug!("rasterized surface at {width}x{height}");
    Ok(RasterImage::from_pixmap(pixmap))
}

// ─── Headless surface ────────────────────────────────────────────────────

/// A surface that exists only as the SVG it would display, rasterized with
/// resvg on demand.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    size: CanvasSize,
    viewport: Viewport,
    chrome: ChromeState,
    diagram: Diagram,
    system_fonts: bool,
}

impl SvgSurface {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            viewport: Viewport::default(),
            chrome: ChromeState::live(),
            diagram: Diagram::default(),
            system_fonts: true,
        }
    }

    /// Skip loading system fonts. Text is then dropped from rasters.
    pub fn without_system_fonts(mut self) -> Self {
        self.system_fonts = false;
        self
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn set_diagram(&mut self, diagram: Diagram) {
        self.diagram = diagram;
    }

    pub fn set_size(&mut self, size: CanvasSize) {
        self.size = size;
    }

    /// The SVG for the current viewport and chrome.
    pub fn scene(&self) -> String {
        render_scene_svg(&self.diagram, self.viewport, self.size, &self.chrome)
    }
}

impl RenderSurface for SvgSurface {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn chrome(&self) -> ChromeState {
        self.chrome
    }

    fn set_chrome(&mut self, chrome: ChromeState) {
        self.chrome = chrome;
    }

    fn settle(&mut self, delay: Duration) -> impl Future<Output = ()> {
        settle_timer(delay)
    }

    fn rasterize(&mut self, pixel_ratio: f32) -> Result<RasterImage> {
        rasterize_svg(
            &self.scene(),
            pixel_ratio,
            self.chrome.background,
            self.system_fonts,
            &[],
        )
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn settle_timer(delay: Duration) {
    tokio::time::sleep(delay).await;
}

// The scene is regenerated from state at capture; there is no paint to wait for.
#[cfg(target_arch = "wasm32")]
async fn settle_timer(_delay: Duration) {}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::{Node, NodeId, NodeKind, Position};

    #[test]
    fn raster_scales_by_pixel_ratio() {
        let mut surface = SvgSurface::new(CanvasSize::new(120, 80)).without_system_fonts();
        surface.set_diagram(Diagram {
            title: "t".into(),
            nodes: vec![Node::new(
                NodeId::intern("surf-a"),
                NodeKind::Activity,
                Position::new(0.0, 0.0),
            )],
            edges: vec![],
        });
        let image = surface.rasterize(2.0).unwrap();
        assert_eq!((image.width(), image.height()), (240, 160));
        assert_eq!(image.to_rgba().len(), 240 * 160 * 4);
        assert!(image.encode_png().unwrap().starts_with(b"\x89PNG"));
    }

    #[test]
    fn export_chrome_is_bare_white() {
        let chrome = ChromeState::export();
        assert!(!chrome.controls && !chrome.minimap && !chrome.panels && !chrome.background_pattern);
        assert_eq!(chrome.background, Color::WHITE);
    }
}
