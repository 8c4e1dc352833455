//! Job types.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::compress::CompressError;
use crate::models::CompressionMode;

/// One file to compress.
#[derive(Debug, Clone)]
pub struct CompressionJob {
    /// Source file.
    pub input: PathBuf,
    /// Preset or target-size mode.
    pub mode: CompressionMode,
    /// Output directory override (falls back to settings, then the source folder).
    pub output_dir: Option<PathBuf>,
}

impl CompressionJob {
    /// Create a job writing next to the source (unless settings say otherwise).
    pub fn new(input: impl Into<PathBuf>, mode: CompressionMode) -> Self {
        Self {
            input: input.into(),
            mode,
            output_dir: None,
        }
    }

    /// Write output into `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Name used for logs and errors.
    pub fn name(&self) -> String {
        file_name(&self.input)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Why a job finished without writing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source already fits within the target size.
    AlreadyUnderTarget,
    /// Encoded result was not smaller than the source.
    NotSmaller,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyUnderTarget => write!(f, "source already fits the target size"),
            SkipReason::NotSmaller => write!(f, "compressed result was not smaller"),
        }
    }
}

/// Result of a finished job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Output written.
    Compressed {
        output: PathBuf,
        original_size: u64,
        compressed_size: u64,
        /// False when the target size could not be reached (best effort output).
        within_target: bool,
    },
    /// Nothing written.
    Skipped(SkipReason),
}

impl JobOutcome {
    /// Fraction of the original size saved, if output was written.
    pub fn savings(&self) -> Option<f64> {
        match self {
            JobOutcome::Compressed {
                original_size,
                compressed_size,
                ..
            } if *original_size > 0 => {
                Some(1.0 - *compressed_size as f64 / *original_size as f64)
            }
            _ => None,
        }
    }
}

/// Job error with job context.
#[derive(Error, Debug)]
pub enum JobError {
    /// Compression failed.
    #[error("Job '{job_name}' failed: {source}")]
    Failed {
        job_name: String,
        #[source]
        source: CompressError,
    },

    /// The blocking worker running the job panicked or was cancelled.
    #[error("Job '{job_name}' worker failed: {message}")]
    Worker { job_name: String, message: String },
}

impl JobError {
    /// Create a failed error.
    pub fn failed(job_name: impl Into<String>, source: impl Into<CompressError>) -> Self {
        Self::Failed {
            job_name: job_name.into(),
            source: source.into(),
        }
    }

    /// The underlying compression error, if any.
    pub fn compress_error(&self) -> Option<&CompressError> {
        match self {
            JobError::Failed { source, .. } => Some(source),
            JobError::Worker { .. } => None,
        }
    }
}

/// Result type for jobs.
pub type JobResult<T> = Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_fraction() {
        let outcome = JobOutcome::Compressed {
            output: PathBuf::from("a_compressed.jpg"),
            original_size: 1000,
            compressed_size: 250,
            within_target: true,
        };
        assert_eq!(outcome.savings(), Some(0.75));
        assert_eq!(JobOutcome::Skipped(SkipReason::NotSmaller).savings(), None);
    }

    #[test]
    fn error_carries_job_name() {
        let err = JobError::failed("clip.mov", CompressError::InvalidTarget);
        assert!(err.to_string().contains("clip.mov"));
        assert!(matches!(
            err.compress_error(),
            Some(CompressError::InvalidTarget)
        ));
    }

    #[test]
    fn job_name_is_file_name() {
        let job = CompressionJob::new("/tmp/shots/screen.png", CompressionMode::default());
        assert_eq!(job.name(), "screen.png");
    }
}
