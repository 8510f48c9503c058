use crate::error::{CancerXError, Result};
use crate::session::CaseFile;
use cancerx_common::is_supported;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// 受付対象外として読み飛ばしたファイル
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub media_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub files: Vec<CaseFile>,
    pub skipped: Vec<SkippedFile>,
}

/// 拡張子からMIMEタイプを推定
pub fn media_type_for(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(str::to_string)
}

/// ファイル/フォルダを走査して受付可能なファイルを読み込む
///
/// フォルダは直下のみ（`recursive` なら再帰）。ファイル名でソート済み
pub fn scan_paths(paths: &[PathBuf], recursive: bool) -> Result<ScanReport> {
    let mut report = ScanReport::default();

    for path in paths {
        if !path.exists() {
            return Err(CancerXError::FileNotFound(path.display().to_string()));
        }

        if path.is_file() {
            admit(path, &mut report)?;
            continue;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(path)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                admit(entry.path(), &mut report)?;
            }
        }
    }

    if report.files.is_empty() {
        let joined = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CancerXError::NoFilesFound(joined));
    }

    Ok(report)
}

fn admit(path: &Path, report: &mut ScanReport) -> Result<()> {
    let media_type = media_type_for(path);

    match media_type {
        Some(media_type) if is_supported(&media_type) => {
            let bytes = std::fs::read(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            debug!(file = %name, %media_type, bytes = bytes.len(), "ファイル読み込み");
            report.files.push(CaseFile::new(name, media_type, bytes));
        }
        media_type => {
            debug!(path = %path.display(), ?media_type, "対象外のファイルをスキップ");
            report.skipped.push(SkippedFile {
                path: path.to_path_buf(),
                media_type,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("a.pdf")).as_deref(), Some("application/pdf"));
        assert_eq!(media_type_for(Path::new("scan.JPG")).as_deref(), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("notes.txt")).as_deref(), Some("text/plain"));
        assert_eq!(media_type_for(Path::new("no_extension")), None);
    }

    #[test]
    fn test_scan_not_found() {
        let result = scan_paths(&[PathBuf::from("/nonexistent/folder")], false);
        assert!(matches!(result, Err(CancerXError::FileNotFound(_))));
    }

    #[test]
    fn test_scan_empty_folder() {
        let dir = tempdir().unwrap();
        let result = scan_paths(&[dir.path().to_path_buf()], false);
        assert!(matches!(result, Err(CancerXError::NoFilesFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("c_scan.png"), b"png").unwrap();
        fs::write(dir.path().join("a_report.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("b_notes.txt"), b"ER positive").unwrap();
        fs::write(dir.path().join("archive.zip"), b"zip").unwrap();

        let report = scan_paths(&[dir.path().to_path_buf()], false).unwrap();
        let names: Vec<&str> = report.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a_report.pdf", "b_notes.txt", "c_scan.png"]);
        assert_eq!(report.files[2].media_type, "image/png");
        assert_eq!(&*report.files[1].bytes, b"ER positive");

        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("archive.zip"));
    }

    #[test]
    fn test_scan_recursive_flag() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("2023");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("top.pdf"), b"%PDF").unwrap();
        fs::write(nested.join("deep.jpg"), b"jpg").unwrap();

        let flat = scan_paths(&[dir.path().to_path_buf()], false).unwrap();
        assert_eq!(flat.files.len(), 1);

        let deep = scan_paths(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(deep.files.len(), 2);
    }

    #[test]
    fn test_scan_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("ct.webp");
        fs::write(&file, b"webp").unwrap();

        let report = scan_paths(&[file], false).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].media_type, "image/webp");
    }
}
