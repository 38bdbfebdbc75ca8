//! Parallel file processing for Takeout imports using rayon
//!
//! Files are parsed on a bounded local thread pool. Per-file failures are
//! collected in the summary and never abort the batch. When the pool cannot
//! be built the files are processed sequentially on the calling thread.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::ImportError;

/// Upper bound on worker threads when none is configured
const MAX_DEFAULT_WORKERS: usize = 8;

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Worker threads, `min(cpus, 8)` when unset
    pub num_threads: Option<usize>,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
    /// Files slower than this are reported; parsing is not interrupted
    pub slow_file_limit: Duration,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            show_progress: true,
            slow_file_limit: Duration::from_secs(300),
        }
    }
}

/// Outcome of one file
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub records: usize,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub error: Option<String>,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingSummary {
    pub label: String,
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub total_records: usize,
    #[serde(with = "duration_millis")]
    pub total_duration: Duration,
    pub workers: usize,
    /// Set when the thread pool could not be built
    pub sequential_fallback: bool,
    pub errors: Vec<(PathBuf, String)>,
    pub slow_files: Vec<PathBuf>,
}

impl ProcessingSummary {
    pub fn is_fully_successful(&self) -> bool {
        self.failed_files == 0
    }

    pub fn to_string_pretty(&self) -> String {
        format!(
            "{} Import Summary\n  \
             Files: {}\n  \
             Successful: {}\n  \
             Failed: {}\n  \
             Records: {}\n  \
             Slow files: {}\n  \
             Workers: {}{}\n  \
             Total Time: {:.2}s",
            self.label,
            self.total_files,
            self.successful_files,
            self.failed_files,
            self.total_records,
            self.slow_files.len(),
            self.workers,
            if self.sequential_fallback { " (sequential)" } else { "" },
            self.total_duration.as_secs_f64()
        )
    }
}

/// Runs a per-file parser over many files
pub struct ParallelProcessor {
    config: ParallelConfig,
}

impl ParallelProcessor {
    pub fn new(config: ParallelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Configured thread count, or `min(cpus, 8)`
    pub fn worker_count(&self) -> usize {
        self.config
            .num_threads
            .filter(|n| *n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
                    .min(MAX_DEFAULT_WORKERS)
            })
    }

    /// Parse every file, keeping the records of successful files in input order
    pub fn process<T, F>(
        &self,
        label: &str,
        files: &[PathBuf],
        parse: F,
    ) -> (Vec<T>, ProcessingSummary)
    where
        T: Send,
        F: Fn(&Path) -> Result<Vec<T>, ImportError> + Sync,
    {
        let start = Instant::now();
        let workers = self.worker_count();
        info!("Processing {} {} files with {} workers", files.len(), label, workers);

        let progress = self.progress_bar(files.len(), label);
        let run = |path: &PathBuf| self.process_file(path, &parse, &progress);

        let (outcomes, sequential_fallback) =
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => (
                    pool.install(|| files.par_iter().map(run).collect::<Vec<_>>()),
                    false,
                ),
                Err(e) => {
                    warn!(error = %e, "Thread pool unavailable, processing sequentially");
                    (files.iter().map(run).collect::<Vec<_>>(), true)
                }
            };

        progress.finish_and_clear();

        let mut records = Vec::new();
        let mut summary = ProcessingSummary {
            label: label.to_string(),
            total_files: files.len(),
            workers: if sequential_fallback { 1 } else { workers },
            sequential_fallback,
            ..ProcessingSummary::default()
        };

        for (result, items) in outcomes {
            if result.duration > self.config.slow_file_limit {
                warn!(
                    file = %result.path.display(),
                    secs = result.duration.as_secs(),
                    "File exceeded the processing time limit"
                );
                summary.slow_files.push(result.path.clone());
            }

            match result.error {
                Some(error) => {
                    summary.failed_files += 1;
                    summary.errors.push((result.path, error));
                }
                None => {
                    summary.successful_files += 1;
                    summary.total_records += items.len();
                    records.extend(items);
                }
            }
        }

        summary.total_duration = start.elapsed();
        debug!("{}", summary.to_string_pretty());

        (records, summary)
    }

    fn process_file<T, F>(
        &self,
        path: &Path,
        parse: &F,
        progress: &ProgressBar,
    ) -> (FileResult, Vec<T>)
    where
        F: Fn(&Path) -> Result<Vec<T>, ImportError>,
    {
        let start = Instant::now();
        let outcome = parse(path);
        let duration = start.elapsed();
        progress.inc(1);

        match outcome {
            Ok(items) => (
                FileResult {
                    path: path.to_path_buf(),
                    records: items.len(),
                    duration,
                    error: None,
                },
                items,
            ),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to process file");
                (
                    FileResult {
                        path: path.to_path_buf(),
                        records: 0,
                        duration,
                        error: Some(e.to_string()),
                    },
                    Vec::new(),
                )
            }
        }
    }

    fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.config.show_progress || len == 0 {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress.set_message(label.to_string());
        progress
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(ParallelConfig::default())
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}
