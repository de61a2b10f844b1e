//! Investigation report generation for insurance claim case records.
//!
//! A [`CaseRecord`] is laid out according to the section schema of its
//! [`ReportKind`], images referenced by the record are fetched and embedded
//! once per URL, and the result is rendered as a PDF or DOCX document.

pub mod assemble;
pub mod config;
pub mod docx;
pub mod error;
pub mod generate;
pub mod images;
pub mod model;
pub mod pdf;
pub mod record;
pub mod richtext;
pub mod schema;

pub use config::ReportConfig;
pub use error::{FetchError, ReportError};
pub use generate::{
    build_report, report_file_name, GeneratedReport, GenerationState, Notification,
    OutputFormat, ReportGenerator, ReportRequest,
};
pub use images::{HttpImageFetcher, ImageCache, ImageFetcher};
pub use record::CaseRecord;
pub use schema::ReportKind;
