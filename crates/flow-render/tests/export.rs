//! Integration tests: export targets against real and scripted surfaces.
//!
//! Every raster export must leave the surface exactly as it found it, whether
//! the capture succeeds, fails, or the export future is dropped while the
//! surface is settling.

use flow_core::layout::{CanvasSize, Viewport};
use flow_core::{Diagram, DiagramDocument};
use flow_render::{
    ChromeState, ExportConfig, ExportEngine, ExportError, ExportOutcome, ExportTarget,
    ImageClipboard, NoClipboard, RasterImage, RenderSurface, SvgSurface,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn checkout() -> Diagram {
    let doc: DiagramDocument =
        serde_json::from_str(include_str!("fixtures/checkout.json")).unwrap();
    doc.into_diagram()
}

fn panned() -> Viewport {
    Viewport {
        x: -35.0,
        y: 12.0,
        zoom: 1.5,
    }
}

fn surface(diagram: &Diagram) -> SvgSurface {
    let mut surface = SvgSurface::new(CanvasSize::new(400, 300)).without_system_fonts();
    surface.set_diagram(diagram.clone());
    surface.set_viewport(panned());
    surface
}

fn artifact(outcome: ExportOutcome) -> flow_render::ExportArtifact {
    match outcome {
        ExportOutcome::File(artifact) => artifact,
        other => panic!("expected a file, got {other:?}"),
    }
}

/// Records what it sees at capture time, then fails or succeeds as told.
struct ScriptedSurface {
    viewport: Viewport,
    chrome: ChromeState,
    seen: Option<(Viewport, ChromeState)>,
    settled: Option<Duration>,
    fail: bool,
}

impl ScriptedSurface {
    fn new(fail: bool) -> Self {
        Self {
            viewport: panned(),
            chrome: ChromeState::live(),
            seen: None,
            settled: None,
            fail,
        }
    }
}

impl RenderSurface for ScriptedSurface {
    fn size(&self) -> CanvasSize {
        CanvasSize::new(400, 300)
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

    async fn settle(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
        self.settled = Some(delay);
    }

    fn rasterize(&mut self, _pixel_ratio: f32) -> Result<RasterImage, ExportError> {
        self.seen = Some((self.viewport, self.chrome));
        if self.fail {
            return Err(ExportError::PixmapAlloc {
                width: 0,
                height: 0,
            });
        }
        let pixmap = tiny_skia::Pixmap::new(4, 3).ok_or(ExportError::PixmapAlloc {
            width: 4,
            height: 3,
        })?;
        Ok(RasterImage::from_pixmap(pixmap))
    }
}

#[derive(Default)]
struct RecordingClipboard {
    images: Vec<(u32, u32, usize)>,
}

impl ImageClipboard for RecordingClipboard {
    fn write_image(&mut self, image: &RasterImage) -> Result<(), ExportError> {
        self.images
            .push((image.width(), image.height(), image.to_rgba().len()));
        Ok(())
    }
}

// ─── Vector export ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn svg_export_frames_all_nodes() {
    let diagram = checkout();
    let mut surface = surface(&diagram);
    let engine = ExportEngine::default();

    let outcome = engine
        .export(&mut surface, &diagram, ExportTarget::Svg, &mut NoClipboard)
        .await
        .unwrap();
    let file = artifact(outcome);
    assert_eq!(file.file_name, "Checkout.svg");
    assert_eq!(file.mime, "image/svg+xml");

    let svg = String::from_utf8(file.bytes).unwrap();
    assert!(svg.contains(r#"viewBox="50 50 300 480""#));
    assert!(svg.contains(">submit</text>"));
    assert!(svg.contains(r#"marker-end="url(#arrow-EF4444)""#));
    assert!(svg.contains(r#"rx="12""#));
    // The live surface was never touched.
    assert_eq!(surface.viewport(), panned());
}

#[tokio::test(start_paused = true)]
async fn svg_export_of_empty_diagram_is_refused() {
    let diagram = Diagram::default();
    let mut surface = surface(&diagram);
    let err = ExportEngine::default()
        .export(&mut surface, &diagram, ExportTarget::Svg, &mut NoClipboard)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NothingToExport));
}

// ─── Raster export ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn png_export_doubles_pixels_and_restores_surface() {
    let diagram = checkout();
    let mut surface = surface(&diagram);

    let file = artifact(
        ExportEngine::default()
            .export(&mut surface, &diagram, ExportTarget::Png, &mut NoClipboard)
            .await
            .unwrap(),
    );
    assert_eq!(file.file_name, "Checkout.png");
    assert!(file.bytes.starts_with(b"\x89PNG"));

    assert_eq!(surface.viewport(), panned());
    assert_eq!(surface.chrome(), ChromeState::live());
}

#[tokio::test(start_paused = true)]
async fn pdf_export_embeds_a_single_page() {
    let diagram = checkout();
    let mut surface = surface(&diagram);
    let config = ExportConfig {
        pixel_ratio: 1.0,
        ..ExportConfig::default()
    };

    let file = artifact(
        ExportEngine::new(config)
            .export(&mut surface, &diagram, ExportTarget::Pdf, &mut NoClipboard)
            .await
            .unwrap(),
    );
    assert_eq!(file.file_name, "Checkout.pdf");
    assert_eq!(file.mime, "application/pdf");
    assert!(file.bytes.starts_with(b"%PDF"));
}

#[tokio::test(start_paused = true)]
async fn capture_sees_bare_chrome_and_fitted_viewport() {
    let diagram = checkout();
    let mut surface = ScriptedSurface::new(false);
    ExportEngine::default()
        .export(&mut surface, &diagram, ExportTarget::Png, &mut NoClipboard)
        .await
        .unwrap();

    let (viewport, chrome) = surface.seen.unwrap();
    assert_eq!(surface.settled, Some(Duration::from_millis(100)));
    assert_eq!(chrome, ChromeState::export());
    assert_ne!(viewport, panned());
    assert!(viewport.zoom > 0.1 && viewport.zoom < 1.0);

    assert_eq!(surface.viewport, panned());
    assert_eq!(surface.chrome, ChromeState::live());
}

#[tokio::test(start_paused = true)]
async fn failed_capture_still_restores_surface() {
    let diagram = checkout();
    let mut surface = ScriptedSurface::new(true);
    let err = ExportEngine::default()
        .export(&mut surface, &diagram, ExportTarget::Pdf, &mut NoClipboard)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::PixmapAlloc { .. }));
    assert!(surface.seen.is_some());
    assert_eq!(surface.viewport, panned());
    assert_eq!(surface.chrome, ChromeState::live());
}

#[tokio::test(start_paused = true)]
async fn cancelled_export_restores_surface() {
    let diagram = checkout();
    let mut surface = ScriptedSurface::new(false);
    let engine = ExportEngine::default();

    let result = tokio::time::timeout(
        Duration::from_millis(10),
        engine.export(&mut surface, &diagram, ExportTarget::Png, &mut NoClipboard),
    )
    .await;

    assert!(result.is_err());
    assert!(surface.seen.is_none());
    assert!(surface.settled.is_none());
    assert_eq!(surface.viewport, panned());
    assert_eq!(surface.chrome, ChromeState::live());
}

// ─── Clipboard ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn clipboard_without_image_support_is_reported() {
    let diagram = checkout();
    let mut surface = ScriptedSurface::new(false);
    let err = ExportEngine::default()
        .export(&mut surface, &diagram, ExportTarget::Clipboard, &mut NoClipboard)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::ClipboardUnsupported));
    // Refused before the surface was touched.
    assert!(surface.seen.is_none());
}

#[tokio::test(start_paused = true)]
async fn clipboard_receives_rgba_image() {
    let diagram = checkout();
    let mut surface = ScriptedSurface::new(false);
    let mut clipboard = RecordingClipboard::default();
    let outcome = ExportEngine::default()
        .export(&mut surface, &diagram, ExportTarget::Clipboard, &mut clipboard)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ExportOutcome::Copied {
            width: 4,
            height: 3
        }
    );
    assert_eq!(clipboard.images, vec![(4, 3, 4 * 3 * 4)]);
}
