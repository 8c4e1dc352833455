//! Compression jobs.
//!
//! A job takes one source file and a compression mode, runs the matching
//! encoder, and writes `<stem>_compressed.<ext>` only when the result is
//! smaller than the source.
//!
//! # Example
//!
//! ```no_run
//! use droppy_core::config::Settings;
//! use droppy_core::jobs::{run_job, CompressionJob, JobOutcome};
//! use droppy_core::models::{CompressionMode, TargetSize};
//!
//! let target = TargetSize::from_megabytes(1.0).unwrap();
//! let job = CompressionJob::new("holiday.png", CompressionMode::TargetSize(target));
//!
//! match run_job(&job, &Settings::default(), None).unwrap() {
//!     JobOutcome::Compressed { output, .. } => println!("wrote {}", output.display()),
//!     JobOutcome::Skipped(reason) => println!("skipped: {}", reason),
//! }
//! ```

mod output;
mod runner;
mod types;

pub use output::{atomic_write, resolve_output_path};
pub use runner::{open_job_logger, run_job, run_job_async};
pub use types::{CompressionJob, JobError, JobOutcome, JobResult, SkipReason};
