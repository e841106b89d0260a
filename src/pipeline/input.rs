//! Input discovery: turn user-supplied paths into ZPL text files.
//!
//! A `.txt` path is taken as-is; a directory is walked recursively for
//! `*.txt` files, in file-name order so repeated runs submit in the same
//! sequence. Archives are not unpacked here. A `.zip` is skipped with a
//! warning telling the user to extract it first.

use crate::error::ZplError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Check if the path has a `.txt` extension (case-insensitive).
pub fn is_txt(path: &Path) -> bool {
    has_extension(path, "txt")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Expand files and directories into the list of `.txt` inputs.
///
/// Order follows the arguments; inside a directory, entries are sorted by
/// file name. Unsupported paths are logged and left out.
pub fn discover_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for path in paths {
        if path.is_dir() {
            let before = found.len();
            for entry in WalkDir::new(path).sort_by_file_name() {
                match entry {
                    Ok(entry) if entry.file_type().is_file() && is_txt(entry.path()) => {
                        found.push(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable entry under {}: {}", path.display(), e),
                }
            }
            if found.len() == before {
                warn!("No .txt files found in {}", path.display());
            } else {
                debug!("{}: {} .txt files", path.display(), found.len() - before);
            }
        } else if is_txt(path) {
            found.push(path.clone());
        } else if has_extension(path, "zip") {
            warn!(
                "Skipping archive {}: extract it and pass the folder instead",
                path.display()
            );
        } else {
            warn!("Skipping {}: not a .txt file or directory", path.display());
        }
    }

    found
}

/// Read one input as UTF-8 text.
pub async fn read_input(path: &Path) -> Result<String, ZplError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            debug!("Read {} bytes from {}", text.len(), path.display());
            Ok(text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ZplError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ZplError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(ZplError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_txt() {
        assert!(is_txt(Path::new("labels.txt")));
        assert!(is_txt(Path::new("/tmp/LABELS.TXT")));
        assert!(!is_txt(Path::new("labels.zpl")));
        assert!(!is_txt(Path::new("labels.zip")));
        assert!(!is_txt(Path::new("txt")));
    }

    #[test]
    fn discovers_txt_recursively_in_name_order() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "^XA^XZ").unwrap();
        std::fs::write(dir.path().join("a.txt"), "^XA^XZ").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignore").unwrap();
        std::fs::write(dir.path().join("sub/c.TXT"), "^XA^XZ").unwrap();

        let found = discover_inputs(&[dir.path().to_path_buf()]);
        let names: Vec<String> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub/c.TXT"]);
    }

    #[test]
    fn direct_files_keep_argument_order_and_skip_archives() {
        let found = discover_inputs(&[
            PathBuf::from("z.txt"),
            PathBuf::from("bundle.zip"),
            PathBuf::from("a.txt"),
            PathBuf::from("image.png"),
        ]);
        assert_eq!(found, vec![PathBuf::from("z.txt"), PathBuf::from("a.txt")]);
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let err = read_input(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ZplError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn read_non_utf8_is_read_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, [0x5e, 0x58, 0x41, 0xff, 0xfe]).unwrap();
        let err = read_input(&path).await.unwrap_err();
        assert!(matches!(err, ZplError::InputReadFailed { .. }));
    }

    #[tokio::test]
    async fn read_returns_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ok.txt");
        std::fs::write(&path, "^XA^FDhi^FS^XZ").unwrap();
        assert_eq!(read_input(&path).await.unwrap(), "^XA^FDhi^FS^XZ");
    }
}
