//! Artifact persistence: name and write each rendered PDF.
//!
//! Files are named `<DD-MM-YYYY>-label-<NNN>.pdf`, where `NNN` is the
//! 1-indexed batch number of the run, so a directory listing sorts in
//! submission order. The date is taken once per run.
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash never leaves a truncated PDF under the final name.

use crate::error::{BatchError, ZplError};
use crate::pipeline::submit::RenderedArtifact;
use std::path::{Path, PathBuf};
use tracing::info;

/// Today's date in the local time zone, formatted for file names.
pub fn date_stamp() -> String {
    chrono::Local::now().format("%d-%m-%Y").to_string()
}

/// `<date>-label-<NNN>.pdf`, with the index zero-padded to three digits.
pub fn artifact_file_name(date: &str, index: usize) -> String {
    format!("{date}-label-{index:03}.pdf")
}

/// Create the output directory (and parents) if needed.
pub async fn ensure_output_dir(dir: &Path) -> Result<(), ZplError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ZplError::OutputDirFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// Write one artifact into `dir`; returns the final path.
pub async fn write_artifact(
    dir: &Path,
    date: &str,
    artifact: &RenderedArtifact,
) -> Result<PathBuf, BatchError> {
    let path = dir.join(artifact_file_name(date, artifact.index));
    let tmp_path = path.with_extension("pdf.tmp");

    let fail = |e: std::io::Error| BatchError::PersistFailed {
        batch: artifact.index,
        path: path.clone(),
        detail: e.to_string(),
    };

    tokio::fs::write(&tmp_path, &artifact.bytes)
        .await
        .map_err(fail)?;
    tokio::fs::rename(&tmp_path, &path).await.map_err(fail)?;

    info!("✓ {} bytes → {}", artifact.bytes.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(artifact_file_name("19-10-2026", 1), "19-10-2026-label-001.pdf");
        assert_eq!(artifact_file_name("19-10-2026", 42), "19-10-2026-label-042.pdf");
        assert_eq!(artifact_file_name("19-10-2026", 1234), "19-10-2026-label-1234.pdf");
    }

    #[test]
    fn date_stamp_shape() {
        let d = date_stamp();
        let parts: Vec<&str> = d.split('-').collect();
        assert_eq!(parts.len(), 3, "got {d}");
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 4);
        assert!(d.chars().all(|c| c.is_ascii_digit() || c == '-'));
    }

    #[tokio::test]
    async fn writes_artifact_atomically() {
        let dir = TempDir::new().unwrap();
        let artifact = RenderedArtifact {
            index: 3,
            bytes: b"%PDF-1.4 test".to_vec(),
        };
        let path = write_artifact(dir.path(), "01-02-2026", &artifact)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("01-02-2026-label-003.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
        assert!(!path.with_extension("pdf.tmp").exists());
    }

    #[tokio::test]
    async fn ensure_output_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/labels");
        ensure_output_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        // idempotent
        ensure_output_dir(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn missing_directory_is_persist_failure() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let artifact = RenderedArtifact {
            index: 1,
            bytes: vec![1, 2, 3],
        };
        let err = write_artifact(&missing, "01-02-2026", &artifact)
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::PersistFailed { batch: 1, .. }));
    }
}
