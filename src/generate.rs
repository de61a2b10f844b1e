//! Generation runs: materialize images, assemble, render, report progress.
//!
//! A [`ReportGenerator`] owns the run state machine
//! (`Idle -> Running -> Succeeded | Failed`), published on a `watch` channel,
//! and sends user-facing [`Notification`]s on an `mpsc` channel.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, error, info};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::assemble::ReportAssembler;
use crate::config::ReportConfig;
use crate::docx::render_docx;
use crate::error::ReportError;
use crate::images::{ImageCache, ImageDiagnostics, ImageFetcher, ImageMaterializer};
use crate::pdf::render_pdf;
use crate::record::CaseRecord;
use crate::schema::ReportKind;

/// Output document format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Pdf,
    Docx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// Date pattern used in file names.
    fn date_pattern(self) -> &'static str {
        match self {
            Self::Pdf => "%d-%m-%Y",
            Self::Docx => "%d.%m.%Y",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
        })
    }
}

/// What to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub format: OutputFormat,
    /// Date printed on the report and used in the file name.
    pub report_date: NaiveDate,
}

/// `{ReportKind}_{CaseId}_{date}.{ext}`.
pub fn report_file_name(record: &CaseRecord, request: &ReportRequest) -> String {
    let case_id: String = record
        .case_id()
        .map(|id| {
            id.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
                .collect()
        })
        .filter(|id: &String| !id.is_empty())
        .unwrap_or_else(|| "case".to_owned());
    format!(
        "{}_{}_{}.{}",
        request.kind.file_prefix(),
        case_id,
        request.report_date.format(request.format.date_pattern()),
        request.format.extension()
    )
}

/// Assembles and renders one report from an already materialized cache.
///
/// Pure with respect to its inputs: the same record, request, cache and
/// configuration always produce the same bytes.
pub fn build_report(
    record: &CaseRecord,
    request: &ReportRequest,
    cache: &ImageCache,
    config: &ReportConfig,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, ReportError> {
    let document = ReportAssembler::new(
        record,
        request.kind,
        cache,
        &config.agency,
        request.report_date,
    )
    .assemble(cancel)?;
    debug!(
        "Assembled {} section(s) for {} {}",
        document.sections().len(),
        request.kind,
        request.format
    );

    match request.format {
        OutputFormat::Pdf => render_pdf(&document, cache, config, request.report_date, cancel),
        OutputFormat::Docx => render_docx(&document, cache, request.report_date, cancel),
    }
}

/// A finished report.
#[derive(Clone, Debug)]
pub struct GeneratedReport {
    pub file_name: String,
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
    pub diagnostics: ImageDiagnostics,
}

impl GeneratedReport {
    /// Writes the report into `directory` under its file name.
    pub fn write_to(&self, directory: impl AsRef<Path>) -> Result<PathBuf, ReportError> {
        let path = directory.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Observable state of the generator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum GenerationState {
    #[default]
    Idle,
    Running,
    Succeeded { file_name: String },
    Failed { message: String },
}

/// User-facing progress messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Generating,
    Succeeded { file_name: String },
    Failed { message: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generating => f.write_str("Generating report..."),
            Self::Succeeded { file_name } => write!(f, "Report {file_name} is ready"),
            Self::Failed { message } => write!(f, "Report generation failed: {message}"),
        }
    }
}

/// Runs report generations one at a time.
pub struct ReportGenerator<F: ImageFetcher + ?Sized> {
    fetcher: Arc<F>,
    config: ReportConfig,
    state: watch::Sender<GenerationState>,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl<F: ImageFetcher + ?Sized> ReportGenerator<F> {
    /// Creates a generator and the receiving end of its notifications.
    pub fn new(
        fetcher: Arc<F>,
        config: ReportConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notifications, receiver) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(GenerationState::Idle);
        (
            Self {
                fetcher,
                config,
                state,
                notifications,
            },
            receiver,
        )
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }

    /// Runs one generation.
    ///
    /// `record` is `None` when the case could not be loaded; that fails
    /// without starting a run. A second call while a run is in progress fails
    /// with [`ReportError::AlreadyRunning`] and leaves the running one alone.
    pub async fn generate(
        &self,
        record: Option<&CaseRecord>,
        request: ReportRequest,
        cache: &mut ImageCache,
        cancel: &CancellationToken,
    ) -> Result<GeneratedReport, ReportError> {
        let Some(record) = record else {
            let err = ReportError::MissingCase;
            let message = err.to_string();
            self.state.send_if_modified(|state| {
                if *state == GenerationState::Running {
                    return false;
                }
                *state = GenerationState::Failed {
                    message: message.clone(),
                };
                true
            });
            self.notify(Notification::Failed { message });
            return Err(err);
        };

        let started = self.state.send_if_modified(|state| {
            if *state == GenerationState::Running {
                return false;
            }
            *state = GenerationState::Running;
            true
        });
        if !started {
            return Err(ReportError::AlreadyRunning);
        }

        info!("Generating {} {} report", request.kind, request.format);
        self.notify(Notification::Generating);

        match self.run(record, &request, cache, cancel).await {
            Ok(report) => {
                info!("Generated {}", report.file_name);
                self.state.send_replace(GenerationState::Succeeded {
                    file_name: report.file_name.clone(),
                });
                self.notify(Notification::Succeeded {
                    file_name: report.file_name.clone(),
                });
                Ok(report)
            }
            Err(err) => {
                error!("Report generation failed: {err}");
                let message = err.to_string();
                self.state.send_replace(GenerationState::Failed {
                    message: message.clone(),
                });
                self.notify(Notification::Failed { message });
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        record: &CaseRecord,
        request: &ReportRequest,
        cache: &mut ImageCache,
        cancel: &CancellationToken,
    ) -> Result<GeneratedReport, ReportError> {
        let materializer = ImageMaterializer::new(self.fetcher.as_ref(), &self.config.images);
        let diagnostics = materializer
            .materialize(record, request.kind.schema(), cache, cancel)
            .await?;
        if !diagnostics.failures.is_empty() {
            info!(
                "{} of {} image(s) could not be embedded",
                diagnostics.failures.len(),
                diagnostics.referenced
            );
        }

        let bytes = build_report(record, request, cache, &self.config, cancel)?;
        Ok(GeneratedReport {
            file_name: report_file_name(record, request),
            format: request.format,
            bytes,
            diagnostics,
        })
    }
}
