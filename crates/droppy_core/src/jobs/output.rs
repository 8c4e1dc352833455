//! Output naming and atomic writes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::models::MediaKind;

use super::types::CompressionJob;

/// Choose where a job's output goes.
///
/// Directory: the job override, else the configured output folder, else the
/// source's folder. Name: `<stem>_compressed.<ext>`, then
/// `<stem>_compressed_2.<ext>` and so on if taken.
pub fn resolve_output_path(job: &CompressionJob, kind: MediaKind, settings: &Settings) -> PathBuf {
    let dir = job
        .output_dir
        .clone()
        .or_else(|| {
            let configured = &settings.paths.output_folder;
            (!configured.is_empty()).then(|| PathBuf::from(configured))
        })
        .or_else(|| job.input.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let stem = job
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = kind.output_extension();

    let first = dir.join(format!("{}_compressed.{}", stem, ext));
    if !first.exists() {
        return first;
    }

    (2u32..)
        .map(|n| dir.join(format!("{}_compressed_{}.{}", stem, n, ext)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Write `data` to `path` atomically (temp file in the same folder, then rename).
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = partial_path(path);
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)
}

/// Sibling path used while an output is being produced.
pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}
