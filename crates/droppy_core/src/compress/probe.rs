//! Media inspection using ffprobe.
//!
//! Only the fields the bitrate plan needs are extracted: duration, the
//! presence of audio and video streams, and the audio bit rate.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

use super::error::{CompressError, CompressResult};

/// Stream-level facts about a media file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    /// Duration in seconds (0.0 if unknown).
    pub duration_secs: f64,
    /// File contains at least one video stream.
    pub has_video: bool,
    /// File contains at least one audio stream.
    pub has_audio: bool,
    /// First audio stream's bit rate, if reported.
    pub audio_bitrate_kbps: Option<u32>,
}

/// Probe a media file with ffprobe.
pub fn probe_media(ffprobe: &str, path: &Path) -> CompressResult<MediaInfo> {
    if !path.exists() {
        return Err(CompressError::SourceNotFound(path.to_path_buf()));
    }

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=codec_type,bit_rate,duration",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| CompressError::Probe(format!("Failed to run {}: {}", ffprobe, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CompressError::Probe(format!(
            "{} exited with code {:?}: {}",
            ffprobe,
            output.status.code(),
            stderr.trim()
        )));
    }

    let json: Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| CompressError::Probe(format!("Failed to parse ffprobe JSON: {}", e)))?;

    let info = parse_probe_json(&json);
    tracing::debug!(
        "[Probe] {}: {:.2}s, video={}, audio={} ({:?} kbps)",
        path.display(),
        info.duration_secs,
        info.has_video,
        info.has_audio,
        info.audio_bitrate_kbps
    );
    Ok(info)
}

/// Parse the JSON output of `ffprobe -of json`.
fn parse_probe_json(json: &Value) -> MediaInfo {
    let mut info = MediaInfo::default();
    let mut stream_duration = None;

    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .map(|s| s.as_slice())
        .unwrap_or(&[]);

    for stream in streams {
        match stream.get("codec_type").and_then(|t| t.as_str()) {
            Some("video") if !info.has_video => {
                info.has_video = true;
                stream_duration = parse_number(stream.get("duration"));
            }
            Some("audio") if !info.has_audio => {
                info.has_audio = true;
                info.audio_bitrate_kbps = parse_number(stream.get("bit_rate"))
                    .map(|bps| (bps / 1000.0).round() as u32)
                    .filter(|kbps| *kbps > 0);
            }
            _ => {}
        }
    }

    // MKV often only carries a format-level duration
    info.duration_secs = stream_duration
        .or_else(|| parse_number(json.get("format").and_then(|f| f.get("duration"))))
        .unwrap_or(0.0);

    info
}

/// ffprobe reports numbers as strings, and "N/A" when unknown.
fn parse_number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::String(s) if s != "N/A" => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_video_with_audio() {
        let json = json!({
            "streams": [
                {"codec_type": "video", "duration": "12.500000"},
                {"codec_type": "audio", "bit_rate": "128000", "duration": "12.480000"}
            ],
            "format": {"duration": "12.510000"}
        });

        let info = parse_probe_json(&json);
        assert!(info.has_video);
        assert!(info.has_audio);
        assert_eq!(info.audio_bitrate_kbps, Some(128));
        assert!((info.duration_secs - 12.5).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_format_duration() {
        let json = json!({
            "streams": [{"codec_type": "video", "duration": "N/A"}],
            "format": {"duration": "61.2"}
        });

        let info = parse_probe_json(&json);
        assert!(!info.has_audio);
        assert_eq!(info.audio_bitrate_kbps, None);
        assert!((info.duration_secs - 61.2).abs() < 1e-9);
    }

    #[test]
    fn missing_fields_give_defaults() {
        let info = parse_probe_json(&json!({}));
        assert_eq!(info, MediaInfo::default());
    }

    #[test]
    fn probe_rejects_missing_file() {
        let result = probe_media("ffprobe", Path::new("/nonexistent/clip.mov"));
        assert!(matches!(result, Err(CompressError::SourceNotFound(_))));
    }
}
