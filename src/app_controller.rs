use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::app_config::Config;
use crate::document::{DocumentWalker, DxfDocument};
use crate::errors::RunError;
use crate::file_utils::FileManager;
use crate::providers::document_service::{DocumentJob, DocumentService};
use crate::report::{self, ReportRow, RunReport};
use crate::text::{clean_for_log, Sanitizer};
use crate::translation::{Orchestrator, Outcome};

// @module: Application controller for document translation

/// Stage of a document run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Reading,
    Translating,
    Saving,
}

/// Event sent by the worker while a document is processed
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A new stage started
    Stage(RunStage),
    /// One element went through the orchestrator
    Progress {
        done: usize,
        total: usize,
        location: String,
        outcome: String,
    },
    /// The document was saved
    Finished(RunSummary),
    /// The run stopped at a document-level error
    Failed { stage: String, cause: String },
}

/// Result of one successful document run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Companion CSV, when it could be written
    pub report_file: Option<PathBuf>,
    /// Encoding the input was read with
    pub encoding: String,
    pub report: RunReport,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start a background worker for one document
    ///
    /// The worker builds its own orchestrator, so concurrent runs share no
    /// mutable state. Events arrive on the returned channel in processing order.
    pub fn spawn(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
    ) -> (JoinHandle<Result<RunSummary, RunError>>, UnboundedReceiver<RunEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let config = self.config.clone();
        let handle = tokio::spawn(async move {
            let orchestrator = Orchestrator::from_config(&config).map_err(RunError::from);
            let result = match orchestrator {
                Ok(mut orchestrator) => translate_document(&config, &mut orchestrator, &input, output, &sender).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                let _ = sender.send(RunEvent::Failed {
                    stage: e.stage().to_string(),
                    cause: e.to_string(),
                });
            }
            result
        });
        (handle, receiver)
    }

    /// Translate one document, rendering worker events as a progress bar
    pub async fn run(&self, input: PathBuf, output: Option<PathBuf>) -> Result<RunSummary> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input, output, &multi_progress).await
    }

    async fn run_with_progress(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
        multi_progress: &MultiProgress,
    ) -> Result<RunSummary> {
        if !FileManager::file_exists(&input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }

        let start_time = Instant::now();
        let (handle, mut events) = self.spawn(input.clone(), output);

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(progress_style("elements"));

        while let Some(event) = events.recv().await {
            match event {
                RunEvent::Stage(stage) => progress_bar.set_message(format!("{:?}", stage)),
                RunEvent::Progress { done, total, location, .. } => {
                    progress_bar.set_length(total as u64);
                    progress_bar.set_position(done as u64);
                    progress_bar.set_message(location);
                }
                RunEvent::Finished(_) | RunEvent::Failed { .. } => break,
            }
        }
        progress_bar.finish_and_clear();

        let summary = handle.await.map_err(|e| anyhow!("Worker stopped unexpectedly: {}", e))?;
        match summary {
            Ok(summary) => {
                info!("{}: {}", input.display(), summary.report);
                info!(
                    "Saved {} in {}",
                    summary.output.display(),
                    Self::format_duration(start_time.elapsed())
                );
                Ok(summary)
            }
            Err(e) => {
                error!("{} failed at the {} stage: {}", input.display(), e.stage(), e);
                Err(e.into())
            }
        }
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:01}s", seconds, duration.subsec_millis() / 100)
        }
    }

    /// Translate every DXF drawing under a directory
    pub async fn run_folder(&self, input_dir: PathBuf, output_dir: Option<PathBuf>) -> Result<Vec<RunSummary>> {
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }
        let drawings = FileManager::find_files(&input_dir, "dxf")?;
        if drawings.is_empty() {
            return Err(anyhow!("No DXF files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(drawings.len() as u64));
        folder_pb.set_style(progress_style("files"));

        let target = self.config.direction.target();
        let mut summaries = Vec::new();
        let mut error_count = 0;
        for drawing in &drawings {
            let file_name = drawing
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output = output_dir
                .as_deref()
                .map(|dir| FileManager::generate_output_path(drawing, Some(dir), target));
            match self.run_with_progress(drawing.clone(), output, &multi_progress).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    warn!("Skipping {}: {}", file_name, e);
                    error_count += 1;
                }
            }
            folder_pb.inc(1);
        }
        folder_pb.finish_and_clear();

        info!(
            "Folder done: {} translated, {} failed, {} total",
            summaries.len(),
            error_count,
            drawings.len()
        );
        Ok(summaries)
    }

    /// Translate a whole document with the document translation service
    pub async fn run_remote(&self, input: PathBuf, target_lang: Option<String>, source_lang: Option<String>) -> Result<PathBuf> {
        if !FileManager::file_exists(&input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }
        let job = DocumentJob {
            input,
            target_lang: target_lang.unwrap_or_else(|| self.config.direction.target().to_string()),
            source_lang,
        };
        let service = DocumentService::new(&self.config.document_service);
        Ok(service.run(&job).await?)
    }
}

fn progress_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        ))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

/// Read, translate and save one drawing
///
/// Item-level failures are absorbed by the walker; only decode and
/// serialize failures end the run.
pub async fn translate_document(
    config: &Config,
    orchestrator: &mut Orchestrator,
    input: &Path,
    output: Option<PathBuf>,
    events: &UnboundedSender<RunEvent>,
) -> Result<RunSummary, RunError> {
    let output = output.unwrap_or_else(|| FileManager::generate_output_path(input, None, orchestrator.direction().target()));

    let _ = events.send(RunEvent::Stage(RunStage::Reading));
    info!("Reading {}", input.display());
    let (mut document, encoding) =
        FileManager::read_with_fallback(input, &config.document.encodings, DxfDocument::parse)?;

    let sanitizer = Sanitizer::with_debug(config.translation.common.debug_clean);
    let walker = DocumentWalker::new(config.document.include_blocks, config.document.font.clone())
        .with_sanitizer(sanitizer.clone());
    let mut report = RunReport::new();

    let _ = events.send(RunEvent::Stage(RunStage::Translating));
    let items = walker
        .run(&mut document, orchestrator, &mut report, |progress| {
            if let Outcome::Fallback(e) = progress.outcome {
                warn!("Kept original text at {}: {}", clean_for_log(&progress.item.location), e);
            }
            let _ = events.send(RunEvent::Progress {
                done: progress.index,
                total: progress.total,
                location: progress.item.location.clone(),
                outcome: progress.outcome.to_string(),
            });
        })
        .await;

    let _ = events.send(RunEvent::Stage(RunStage::Saving));
    let content = document.to_dxf_string()?;
    FileManager::write_atomic(&output, content.as_bytes())?;
    info!("Saved {}", output.display());

    let report_file = report::report_path(&output);
    let rows: Vec<ReportRow> = items.iter().map(|item| ReportRow::from_item(item, &sanitizer)).collect();
    let report_file = match report::write_csv(&report_file, &rows) {
        Ok(()) => Some(report_file),
        Err(e) => {
            warn!("Report not written: {}", e);
            None
        }
    };

    let (hits, misses, rate) = orchestrator.cache_stats();
    info!("Cache: {} hits, {} misses ({:.1}% hit rate)", hits, misses, rate * 100.0);

    let summary = RunSummary {
        input: input.to_path_buf(),
        output,
        report_file,
        encoding: encoding.name().to_string(),
        report,
    };
    let _ = events.send(RunEvent::Finished(summary.clone()));
    Ok(summary)
}
