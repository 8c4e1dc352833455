//! Video compression with FFmpeg.
//!
//! Target-size mode does not search: the video bitrate is computed once from
//! `(target_bits - audio_bits) / duration` and a two-pass encode is run at
//! that average bitrate. Preset mode runs a single CRF pass.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::{CompressError, CompressResult};
use super::probe::{probe_media, MediaInfo};
use crate::config::VideoSettings;
use crate::logging::JobLogger;
use crate::models::{CompressionLevel, TargetSize};

/// Number of stderr lines carried in an encode failure.
const ERROR_TAIL_LINES: usize = 5;

/// Bitrates chosen for a target-size encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoBitratePlan {
    /// Video bitrate in kbps.
    pub video_kbps: u32,
    /// Audio bitrate in kbps, None when the source has no audio.
    pub audio_kbps: Option<u32>,
    /// False when the budget was below the minimum video bitrate.
    pub reachable: bool,
}

/// Compute the video bitrate that fills `target` over `duration_secs`.
///
/// The budget is scaled by `settings.safety_margin` to leave room for
/// container overhead. Results below `settings.min_video_kbps` are clamped
/// and flagged unreachable; the encode still runs as a best effort.
pub fn plan_bitrate(
    target: TargetSize,
    duration_secs: f64,
    audio_kbps: Option<u32>,
    settings: &VideoSettings,
) -> CompressResult<VideoBitratePlan> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(CompressError::Probe(format!(
            "cannot plan bitrate for duration {}",
            duration_secs
        )));
    }

    let target_bits = target.bytes() as f64 * 8.0 * settings.safety_margin;
    let audio_bits = audio_kbps.unwrap_or(0) as f64 * 1000.0 * duration_secs;
    let video_kbps = (target_bits - audio_bits) / duration_secs / 1000.0;

    let min = settings.min_video_kbps;
    let plan = if video_kbps < min as f64 {
        VideoBitratePlan {
            video_kbps: min,
            audio_kbps,
            reachable: false,
        }
    } else {
        VideoBitratePlan {
            video_kbps: video_kbps.floor() as u32,
            audio_kbps,
            reachable: true,
        }
    };

    tracing::debug!(
        "[Video] plan for {} over {:.2}s: video {} kbps, audio {:?} kbps, reachable={}",
        target,
        duration_secs,
        plan.video_kbps,
        plan.audio_kbps,
        plan.reachable
    );
    Ok(plan)
}

/// Result of a video encode.
#[derive(Debug, Clone)]
pub struct VideoOutcome {
    /// Bitrate plan used (target-size mode only).
    pub plan: Option<VideoBitratePlan>,
    /// Size of the written output in bytes.
    pub output_size: u64,
}

/// Runs FFmpeg encodes for one job.
pub struct VideoEncoder {
    settings: VideoSettings,
    work_dir: PathBuf,
}

impl VideoEncoder {
    /// Create an encoder writing pass logs into `work_dir`.
    pub fn new(settings: VideoSettings, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            work_dir: work_dir.into(),
        }
    }

    /// Check if FFmpeg is available.
    pub fn is_available(&self) -> bool {
        Command::new(&self.settings.ffmpeg)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Probe `input` with the configured ffprobe binary.
    pub fn probe(&self, input: &Path) -> CompressResult<MediaInfo> {
        probe_media(&self.settings.ffprobe, input)
    }

    /// Audio bitrate for the output: the configured cap, lowered to the
    /// source's own bitrate when that is smaller.
    pub fn audio_bitrate(&self, info: &MediaInfo) -> Option<u32> {
        if !info.has_audio {
            return None;
        }
        let cap = self.settings.audio_bitrate_kbps;
        Some(info.audio_bitrate_kbps.map_or(cap, |source| source.min(cap)))
    }

    /// Encode `input` into `output` so the result fits within `target`.
    pub fn compress_to_target(
        &self,
        input: &Path,
        output: &Path,
        target: TargetSize,
        logger: Option<&JobLogger>,
    ) -> CompressResult<VideoOutcome> {
        let info = self.probe(input)?;
        if !info.has_video {
            return Err(CompressError::UnsupportedMedia(input.to_path_buf()));
        }

        let plan = plan_bitrate(
            target,
            info.duration_secs,
            self.audio_bitrate(&info),
            &self.settings,
        )?;
        if !plan.reachable {
            tracing::warn!(
                "[Video] target {} below minimum bitrate, encoding at {} kbps",
                target,
                plan.video_kbps
            );
            if let Some(log) = logger {
                log.warn(&format!(
                    "Target {} is unreachable, using minimum bitrate {} kbps",
                    target, plan.video_kbps
                ));
            }
        }

        fs::create_dir_all(&self.work_dir)?;
        let passlog = self.passlog_prefix();

        let parameter = plan.video_kbps as f64;
        let result = self
            .run_ffmpeg(
                &self.first_pass_args(input, &plan, &passlog),
                parameter,
                logger,
                "Pass 1",
            )
            .and_then(|_| {
                self.run_ffmpeg(
                    &self.second_pass_args(input, output, &plan, &passlog),
                    parameter,
                    logger,
                    "Pass 2",
                )
            });
        self.remove_pass_logs(&passlog);
        result?;

        let output_size = fs::metadata(output)?.len();
        Ok(VideoOutcome {
            plan: Some(plan),
            output_size,
        })
    }

    /// Encode `input` into `output` at a preset quality.
    pub fn compress_preset(
        &self,
        input: &Path,
        output: &Path,
        level: CompressionLevel,
        logger: Option<&JobLogger>,
    ) -> CompressResult<VideoOutcome> {
        let info = self.probe(input)?;
        if !info.has_video {
            return Err(CompressError::UnsupportedMedia(input.to_path_buf()));
        }

        let crf = self.settings.crf_for(level);
        let args = self.crf_args(input, output, crf, self.audio_bitrate(&info));
        self.run_ffmpeg(&args, crf as f64, logger, "CRF encode")?;

        let output_size = fs::metadata(output)?.len();
        Ok(VideoOutcome {
            plan: None,
            output_size,
        })
    }

    /// Arguments for the analysis pass (no audio, null muxer).
    pub fn first_pass_args(
        &self,
        input: &Path,
        plan: &VideoBitratePlan,
        passlog: &Path,
    ) -> Vec<String> {
        let mut args = self.common_video_args(input);
        args.extend([
            "-b:v".to_string(),
            format!("{}k", plan.video_kbps),
            "-pass".to_string(),
            "1".to_string(),
            "-passlogfile".to_string(),
            passlog.display().to_string(),
            "-an".to_string(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ]);
        args
    }

    /// Arguments for the output pass.
    pub fn second_pass_args(
        &self,
        input: &Path,
        output: &Path,
        plan: &VideoBitratePlan,
        passlog: &Path,
    ) -> Vec<String> {
        let mut args = self.common_video_args(input);
        args.extend([
            "-b:v".to_string(),
            format!("{}k", plan.video_kbps),
            "-pass".to_string(),
            "2".to_string(),
            "-passlogfile".to_string(),
            passlog.display().to_string(),
        ]);
        self.push_audio_args(&mut args, plan.audio_kbps);
        self.push_output_args(&mut args, output);
        args
    }

    /// Arguments for a single-pass constant-quality encode.
    pub fn crf_args(
        &self,
        input: &Path,
        output: &Path,
        crf: u32,
        audio_kbps: Option<u32>,
    ) -> Vec<String> {
        let mut args = self.common_video_args(input);
        args.extend(["-crf".to_string(), crf.to_string()]);
        self.push_audio_args(&mut args, audio_kbps);
        self.push_output_args(&mut args, output);
        args
    }

    fn common_video_args(&self, input: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-c:v".to_string(),
            self.settings.video_codec.clone(),
            "-preset".to_string(),
            self.settings.encoder_preset.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]
    }

    fn push_audio_args(&self, args: &mut Vec<String>, audio_kbps: Option<u32>) {
        match audio_kbps {
            Some(kbps) => args.extend([
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", kbps),
            ]),
            None => args.push("-an".to_string()),
        }
    }

    fn push_output_args(&self, args: &mut Vec<String>, output: &Path) {
        args.extend([
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
            output.display().to_string(),
        ]);
    }

    /// Unique pass log prefix inside the work directory.
    fn passlog_prefix(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        self.work_dir
            .join(format!("droppy-2pass-{}-{}", std::process::id(), nanos))
    }

    /// Remove `<prefix>-0.log`, `<prefix>-0.log.mbtree` and friends.
    fn remove_pass_logs(&self, prefix: &Path) {
        let Some(stem) = prefix.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return;
        };
        let Ok(entries) = fs::read_dir(&self.work_dir) else {
            return;
        };
        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().starts_with(&stem) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    tracing::debug!("[Video] could not remove pass log {:?}: {}", entry.path(), e);
                }
            }
        }
    }

    /// Run FFmpeg, streaming stderr into the job log.
    ///
    /// Failures become `EncodeFailed` at `parameter` with the stderr tail.
    fn run_ffmpeg(
        &self,
        args: &[String],
        parameter: f64,
        logger: Option<&JobLogger>,
        label: &str,
    ) -> CompressResult<()> {
        let command_line = format!("{} {}", self.settings.ffmpeg, args.join(" "));
        tracing::debug!("[Video] {}: {}", label, command_line);
        if let Some(log) = logger {
            log.section(label);
            log.command(&command_line);
        }

        let output = Command::new(&self.settings.ffmpeg)
            .args(args)
            .output()
            .map_err(|e| {
                CompressError::encode_failed(
                    parameter,
                    format!("Failed to spawn {}: {}", self.settings.ffmpeg, e),
                )
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(log) = logger {
            for line in stderr.lines() {
                log.output_line(line, true);
            }
        }

        if !output.status.success() {
            if let Some(log) = logger {
                log.show_tail("ffmpeg");
            }
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(ERROR_TAIL_LINES)..].join("\n");
            return Err(CompressError::encode_failed(
                parameter,
                format!(
                    "{} failed with code {:?}: {}",
                    label,
                    output.status.code(),
                    tail
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings() -> VideoSettings {
        VideoSettings::default()
    }

    #[test]
    fn plan_subtracts_audio_budget() {
        let settings = VideoSettings {
            safety_margin: 1.0,
            ..settings()
        };
        // 10 MB over 40 s = 2000 kbps total, minus 128 kbps audio
        let target = TargetSize::from_megabytes(10.0).unwrap();
        let plan = plan_bitrate(target, 40.0, Some(128), &settings).unwrap();

        assert!(plan.reachable);
        assert_eq!(plan.video_kbps, 1872);
        assert_eq!(plan.audio_kbps, Some(128));
    }

    #[test]
    fn plan_applies_safety_margin() {
        let settings = VideoSettings {
            safety_margin: 0.9,
            ..settings()
        };
        let target = TargetSize::from_megabytes(10.0).unwrap();
        let plan = plan_bitrate(target, 40.0, None, &settings).unwrap();

        assert_eq!(plan.video_kbps, 1800);
        assert_eq!(plan.audio_kbps, None);
    }

    #[test]
    fn plan_clamps_to_minimum_and_flags_unreachable() {
        let target = TargetSize::from_kilobytes(100.0).unwrap();
        let plan = plan_bitrate(target, 600.0, Some(128), &settings()).unwrap();

        assert!(!plan.reachable);
        assert_eq!(plan.video_kbps, settings().min_video_kbps);
    }

    #[test]
    fn plan_rejects_zero_duration() {
        let target = TargetSize::from_megabytes(1.0).unwrap();
        assert!(matches!(
            plan_bitrate(target, 0.0, None, &settings()),
            Err(CompressError::Probe(_))
        ));
        assert!(plan_bitrate(target, f64::NAN, None, &settings()).is_err());
    }

    #[test]
    fn audio_bitrate_respects_source_and_cap() {
        let encoder = VideoEncoder::new(settings(), "/tmp");
        let cap = settings().audio_bitrate_kbps;

        let silent = MediaInfo {
            has_video: true,
            ..Default::default()
        };
        assert_eq!(encoder.audio_bitrate(&silent), None);

        let low = MediaInfo {
            has_audio: true,
            audio_bitrate_kbps: Some(64),
            ..Default::default()
        };
        assert_eq!(encoder.audio_bitrate(&low), Some(64u32.min(cap)));

        let unknown = MediaInfo {
            has_audio: true,
            ..Default::default()
        };
        assert_eq!(encoder.audio_bitrate(&unknown), Some(cap));
    }

    #[test]
    fn pass_arguments_share_bitrate_and_log() {
        let encoder = VideoEncoder::new(settings(), "/tmp/work");
        let plan = VideoBitratePlan {
            video_kbps: 900,
            audio_kbps: Some(96),
            reachable: true,
        };
        let passlog = Path::new("/tmp/work/droppy-2pass-1");
        let first = encoder.first_pass_args(Path::new("in.mov"), &plan, passlog);
        let second =
            encoder.second_pass_args(Path::new("in.mov"), Path::new("out.mp4"), &plan, passlog);

        for args in [&first, &second] {
            assert!(args.windows(2).any(|w| w[0] == "-b:v" && w[1] == "900k"));
            assert!(args
                .windows(2)
                .any(|w| w[0] == "-passlogfile" && w[1] == "/tmp/work/droppy-2pass-1"));
        }

        assert!(first.windows(2).any(|w| w[0] == "-pass" && w[1] == "1"));
        assert!(first.contains(&"-an".to_string()));
        assert_eq!(first.last().map(String::as_str), Some("-"));

        assert!(second.windows(2).any(|w| w[0] == "-pass" && w[1] == "2"));
        assert!(second.windows(2).any(|w| w[0] == "-b:a" && w[1] == "96k"));
        assert_eq!(second.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn crf_arguments_drop_audio_when_silent() {
        let encoder = VideoEncoder::new(settings(), "/tmp/work");
        let args = encoder.crf_args(Path::new("in.mov"), Path::new("out.mp4"), 28, None);

        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "28"));
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-b:v".to_string()));
    }

    #[test]
    fn removes_only_matching_pass_logs() {
        let dir = tempdir().unwrap();
        let encoder = VideoEncoder::new(settings(), dir.path());
        let prefix = dir.path().join("droppy-2pass-42");

        fs::write(dir.path().join("droppy-2pass-42-0.log"), "stats").unwrap();
        fs::write(dir.path().join("droppy-2pass-42-0.log.mbtree"), "tree").unwrap();
        fs::write(dir.path().join("keep.txt"), "keep").unwrap();

        encoder.remove_pass_logs(&prefix);

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining, vec!["keep.txt".to_string()]);
    }

    #[test]
    fn target_compress_rejects_missing_source() {
        let dir = tempdir().unwrap();
        let encoder = VideoEncoder::new(settings(), dir.path());
        let result = encoder.compress_to_target(
            Path::new("/nonexistent/clip.mov"),
            &dir.path().join("out.mp4"),
            TargetSize::from_megabytes(5.0).unwrap(),
            None,
        );
        assert!(matches!(result, Err(CompressError::SourceNotFound(_))));
    }
}
