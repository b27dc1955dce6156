//! Raster and vector export from the browser.
//!
//! [`LiveSurface`] lets the export engine drive the canvas the page displays:
//! it hides chrome and reframes through the same editor viewport and chrome
//! state that [`crate::FlowCanvas::render_svg`] reads, and the engine's guard
//! puts both back before the call returns.

use flow_core::layout::{CanvasSize, Viewport};
use flow_editor::Editor;
use flow_render::{
    ChromeState, ExportConfig, ExportEngine, ExportError, ExportOutcome, ExportTarget,
    ImageClipboard, RasterImage, RenderSurface, rasterize_svg, render_scene_svg,
};
use futures::FutureExt;
use std::time::Duration;

pub fn parse_target(format: &str) -> Option<ExportTarget> {
    match format.trim().to_ascii_lowercase().as_str() {
        "png" => Some(ExportTarget::Png),
        "pdf" => Some(ExportTarget::Pdf),
        "svg" => Some(ExportTarget::Svg),
        "clipboard" => Some(ExportTarget::Clipboard),
        _ => None,
    }
}

pub struct LiveSurface<'a> {
    pub editor: &'a mut Editor,
    pub chrome: &'a mut ChromeState,
    pub size: CanvasSize,
    pub fonts: &'a [Vec<u8>],
}

impl RenderSurface for LiveSurface<'_> {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn viewport(&self) -> Viewport {
        self.editor.viewport()
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.editor.set_viewport(viewport);
    }

    fn chrome(&self) -> ChromeState {
        *self.chrome
    }

    fn set_chrome(&mut self, chrome: ChromeState) {
        *self.chrome = chrome;
    }

    // The capture renders straight from editor state, so nothing is painted
    // in between and there is nothing to wait for.
    fn settle(&mut self, _delay: Duration) -> impl Future<Output = ()> {
        std::future::ready(())
    }

    fn rasterize(&mut self, pixel_ratio: f32) -> flow_render::error::Result<RasterImage> {
        let scene = render_scene_svg(
            &self.editor.snapshot(),
            self.editor.viewport(),
            self.size,
            &*self.chrome,
        );
        rasterize_svg(&scene, pixel_ratio, self.chrome.background, false, self.fonts)
    }
}

/// Holds the PNG for the page to write through `navigator.clipboard`.
pub struct PageClipboard {
    pub supported: bool,
    pub png: Option<Vec<u8>>,
}

impl ImageClipboard for PageClipboard {
    fn supports_images(&self) -> bool {
        self.supported
    }

    fn write_image(&mut self, image: &RasterImage) -> flow_render::error::Result<()> {
        self.png = Some(image.encode_png()?);
        Ok(())
    }
}

/// Run one export to completion. Returns the file bytes, or the clipboard PNG.
pub fn run_export(
    surface: &mut LiveSurface<'_>,
    config: &ExportConfig,
    target: ExportTarget,
    clipboard_images: bool,
) -> flow_render::error::Result<Vec<u8>> {
    let diagram = surface.editor.snapshot();
    let engine = ExportEngine::new(config.clone());
    let mut clipboard = PageClipboard {
        supported: clipboard_images,
        png: None,
    };
    let outcome = engine
        .export(surface, &diagram, target, &mut clipboard)
        .now_or_never()
        .ok_or(ExportError::Unsettled)??;
    match outcome {
        ExportOutcome::File(artifact) => Ok(artifact.bytes),
        ExportOutcome::Copied { width, height } => {
            log::info!("{width}x{height} image ready for the clipboard");
            clipboard
                .png
                .ok_or_else(|| ExportError::Clipboard("no image was captured".into()))
        }
    }
}
