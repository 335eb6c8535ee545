use crate::error::{FinderError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// フォルダ直下のブックを列挙
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(FinderError::FolderNotFound(folder.display().to_string()));
    }

    let mut books = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || is_lock_file(path) {
            continue;
        }

        if path.extension().map(|e| is_workbook_extension(&e.to_string_lossy())).unwrap_or(false) {
            books.push(path.to_path_buf());
        }
    }

    // ファイル名でソート
    books.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(books)
}

/// 引数のファイル・フォルダを検索対象のファイル一覧に展開
///
/// ファイルはそのまま（読めない場合は検索時に個別に報告）、
/// フォルダは直下のブックに展開する。重複は先勝ちで除く。
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for input in inputs {
        let expanded = if input.is_dir() {
            scan_folder(input)?
        } else {
            vec![input.clone()]
        };
        for path in expanded {
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn is_workbook_extension(ext: &str) -> bool {
    WORKBOOK_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Excelが開いている間に作る "~$book.xlsx"
fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with("~$"))
        .unwrap_or(false)
}
