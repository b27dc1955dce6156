use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("diagram has no nodes to export")]
    NothingToExport,

    #[error("failed to parse SVG: {0}")]
    SvgParse(String),

    #[error("failed to allocate a {width}x{height} pixmap")]
    PixmapAlloc { width: u32, height: u32 },

    #[error("failed to encode PNG: {0}")]
    PngEncode(String),

    #[error("failed to convert to PDF: {0}")]
    PdfConvert(String),

    #[error("this clipboard cannot hold images")]
    ClipboardUnsupported,

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("the surface did not settle in time")]
    Unsettled,

    #[error("invalid export config: {0}")]
    Config(#[from] serde_json::Error),
}
