//! Job execution.
//!
//! Jobs run sequentially: encode (or search) first, then compare against the
//! source, then write. Async callers hand the whole job to a blocking worker.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::compress::{search_target_size, CompressError, JpegQualityEncoder, VideoEncoder};
use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{CompressionMode, MediaKind};

use super::output::{atomic_write, partial_path, resolve_output_path};
use super::types::{CompressionJob, JobError, JobOutcome, JobResult, SkipReason};

/// Open a per-job log file if job logs are enabled in settings.
///
/// The log is named `<file name>_<timestamp>.log` so jobs on same-named
/// files from different folders get separate logs.
pub fn open_job_logger(job: &CompressionJob, settings: &Settings) -> Option<JobLogger> {
    if !settings.logging.job_logs {
        return None;
    }
    let log_name = format!(
        "{}_{}",
        job.name(),
        Local::now().format("%Y%m%d_%H%M%S_%3f")
    );
    match JobLogger::new(
        log_name,
        &settings.paths.logs_folder,
        settings.logging.log_config(),
        None,
    ) {
        Ok(logger) => Some(logger),
        Err(e) => {
            tracing::warn!("Could not open job log for '{}': {}", job.name(), e);
            None
        }
    }
}

/// Run a job on the current thread.
pub fn run_job(
    job: &CompressionJob,
    settings: &Settings,
    logger: Option<&JobLogger>,
) -> JobResult<JobOutcome> {
    let job_name = job.name();
    if let Some(log) = logger {
        log.phase(&format!("Compress {} ({})", job_name, job.mode));
    }

    let result = execute(job, settings, logger);
    match (&result, logger) {
        (Ok(outcome), Some(log)) => log_outcome(log, outcome),
        (Err(e), Some(log)) => log.error(&e.to_string()),
        _ => {}
    }
    if let Some(log) = logger {
        log.flush();
    }

    result.map_err(|e| JobError::failed(job_name, e))
}

/// Run a job on a blocking worker thread and await it.
pub async fn run_job_async(
    job: CompressionJob,
    settings: Settings,
    logger: Option<Arc<JobLogger>>,
) -> JobResult<JobOutcome> {
    let job_name = job.name();
    tokio::task::spawn_blocking(move || run_job(&job, &settings, logger.as_deref()))
        .await
        .map_err(|e| JobError::Worker {
            job_name,
            message: e.to_string(),
        })?
}

fn execute(
    job: &CompressionJob,
    settings: &Settings,
    logger: Option<&JobLogger>,
) -> Result<JobOutcome, CompressError> {
    let input = job.input.as_path();
    let kind = MediaKind::from_path(input)
        .ok_or_else(|| CompressError::UnsupportedMedia(input.to_path_buf()))?;
    if !input.exists() {
        return Err(CompressError::SourceNotFound(input.to_path_buf()));
    }

    let original_size = fs::metadata(input)?.len();
    if let CompressionMode::TargetSize(target) = job.mode {
        if target.fits(original_size) {
            tracing::info!(
                "'{}' is {} bytes, already within {}",
                job.name(),
                original_size,
                target
            );
            return Ok(JobOutcome::Skipped(SkipReason::AlreadyUnderTarget));
        }
    }

    let output = resolve_output_path(job, kind, settings);
    tracing::info!(
        "Compressing {} '{}' ({} bytes) with {}",
        kind,
        job.name(),
        original_size,
        job.mode
    );

    match kind {
        MediaKind::Image => compress_image(job, settings, original_size, output),
        MediaKind::Video => compress_video(job, settings, original_size, output, logger),
    }
}

fn compress_image(
    job: &CompressionJob,
    settings: &Settings,
    original_size: u64,
    output: PathBuf,
) -> Result<JobOutcome, CompressError> {
    let mut encoder = JpegQualityEncoder::open(&job.input)?;

    let (data, within_target) = match job.mode {
        CompressionMode::Preset(level) => {
            let quality = settings.image.quality_for(level);
            (encoder.encode_quality(quality)?, true)
        }
        CompressionMode::TargetSize(target) => {
            let outcome =
                search_target_size(&mut encoder, target, &settings.image.search_config())?;
            tracing::debug!(
                "Search settled on quality {:.3} after {} encodes",
                outcome.parameter,
                outcome.encode_calls
            );
            (outcome.data, outcome.within_target)
        }
    };

    let compressed_size = data.len() as u64;
    if compressed_size >= original_size {
        tracing::info!(
            "Discarding {} byte result for '{}' (source is {} bytes)",
            compressed_size,
            job.name(),
            original_size
        );
        return Ok(JobOutcome::Skipped(SkipReason::NotSmaller));
    }

    atomic_write(&output, &data)?;
    Ok(JobOutcome::Compressed {
        output,
        original_size,
        compressed_size,
        within_target,
    })
}

fn compress_video(
    job: &CompressionJob,
    settings: &Settings,
    original_size: u64,
    output: PathBuf,
    logger: Option<&JobLogger>,
) -> Result<JobOutcome, CompressError> {
    let encoder = VideoEncoder::new(settings.video.clone(), &settings.paths.temp_root);
    if !encoder.is_available() {
        return Err(CompressError::ToolMissing(settings.video.ffmpeg.clone()));
    }
    let partial = partial_path(&output);
    if let Some(parent) = partial.parent() {
        fs::create_dir_all(parent)?;
    }

    let encoded = match job.mode {
        CompressionMode::Preset(level) => {
            encoder.compress_preset(&job.input, &partial, level, logger)
        }
        CompressionMode::TargetSize(target) => {
            encoder.compress_to_target(&job.input, &partial, target, logger)
        }
    };
    let encoded = match encoded {
        Ok(encoded) => encoded,
        Err(e) => {
            remove_quietly(&partial);
            return Err(e);
        }
    };

    if encoded.output_size >= original_size {
        tracing::info!(
            "Discarding {} byte result for '{}' (source is {} bytes)",
            encoded.output_size,
            job.name(),
            original_size
        );
        remove_quietly(&partial);
        return Ok(JobOutcome::Skipped(SkipReason::NotSmaller));
    }

    // Two-pass encodes can overshoot their average bitrate
    let within_target = match (job.mode, encoded.plan) {
        (CompressionMode::TargetSize(target), Some(plan)) => {
            let fits = target.fits(encoded.output_size);
            if plan.reachable && !fits {
                tracing::warn!(
                    "'{}' encoded to {} bytes at {} kbps, over target {}",
                    job.name(),
                    encoded.output_size,
                    plan.video_kbps,
                    target
                );
                if let Some(log) = logger {
                    log.warn(&format!(
                        "Encode overshot target {}: {} bytes",
                        target, encoded.output_size
                    ));
                }
            }
            plan.reachable && fits
        }
        _ => true,
    };

    fs::rename(&partial, &output)?;
    Ok(JobOutcome::Compressed {
        output,
        original_size,
        compressed_size: encoded.output_size,
        within_target,
    })
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            tracing::debug!("Could not remove {}: {}", path.display(), e);
        }
    }
}

fn log_outcome(log: &JobLogger, outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Compressed {
            output,
            original_size,
            compressed_size,
            within_target,
        } => {
            if !within_target {
                log.warn("Output is over the target size, kept best-effort result");
            }
            log.success(&format!(
                "{} -> {} bytes, wrote {}",
                original_size,
                compressed_size,
                output.display()
            ));
        }
        JobOutcome::Skipped(reason) => log.info(&format!("Skipped: {}", reason)),
    }
}
