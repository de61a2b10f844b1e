//! Error types shared by the report pipeline.

use thiserror::Error;

/// Errors that abort a report generation run.
///
/// Image-level problems never show up here: the materializer reports them as
/// [`FetchError`] values, logs them and leaves the affected URL out of the cache.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No case record was provided for report generation")]
    MissingCase,

    #[error("Case record is malformed: {0}")]
    InvalidRecord(String),

    #[error("A report generation is already running for this case")]
    AlreadyRunning,

    #[error("Report generation was cancelled")]
    Cancelled,

    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] genpdf::error::Error),

    #[error("PDF post-processing failed: {0}")]
    PdfPostProcess(#[from] lopdf::Error),

    #[error("DOCX markup could not be written: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("DOCX package could not be written: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Failure to turn a single image URL into an embedded image.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("timed out after {0} s")]
    Timeout(u64),

    #[error("could not decode image: {0}")]
    Decode(image::ImageError),

    #[error("could not re-encode image: {0}")]
    Encode(image::ImageError),
}
