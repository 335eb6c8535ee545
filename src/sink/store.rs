//! マスタ結果ファイルの作成と追記

use super::package::append_to_first_sheet;
use crate::error::{FinderError, Result};
use account_finder_common::export::excel_core::{generate_rows_buffer, RESULTS_SHEET_NAME};
use account_finder_common::CellValue;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// 追記した行の範囲（1始まりのシート行番号）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendedRows {
    pub first_row: usize,
    pub last_row: usize,
}

/// 表形式ファイルの保存先
///
/// テストではロック状態を再現する実装に差し替える。
pub trait MasterStore: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// 全行（ヘッダー含む）を書き出して新規ファイルを作る
    fn create(&self, path: &Path, rows: &[Vec<CellValue>]) -> Result<()>;

    /// 先頭シートの最終行の次から追記する
    ///
    /// 既存の行・他のシートには触れない。シートが空なら `header` から書く。
    fn append(
        &self,
        path: &Path,
        header: &[CellValue],
        rows: &[Vec<CellValue>],
    ) -> Result<AppendedRows>;
}

/// xlsx ファイルへの保存
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxStore;

impl MasterStore for XlsxStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create(&self, path: &Path, rows: &[Vec<CellValue>]) -> Result<()> {
        let buffer = generate_rows_buffer(RESULTS_SHEET_NAME, rows)?;
        replace_file(path, &buffer)
    }

    /// 解析できないマスタは他プロセスが書き込み中の可能性があるため再試行対象とする
    fn append(
        &self,
        path: &Path,
        header: &[CellValue],
        rows: &[Vec<CellValue>],
    ) -> Result<AppendedRows> {
        let package = std::fs::read(path).map_err(|e| FinderError::from_write_io(path, e))?;

        let (patched, appended) =
            append_to_first_sheet(&package, header, rows).map_err(|reason| {
                FinderError::TransientIo {
                    path: path.display().to_string(),
                    reason,
                }
            })?;

        replace_file(path, &patched)?;
        Ok(appended)
    }
}

/// 同じディレクトリの一時ファイルに書いてから置き換える
///
/// 失敗時は一時ファイルを drop で削除し、元のファイルは変更しない。
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| FinderError::from_write_io(path, e))?;
    temp.write_all(bytes)
        .map_err(|e| FinderError::from_write_io(path, e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| FinderError::from_write_io(path, e))?;

    if let Ok(metadata) = std::fs::metadata(path) {
        // 既存ファイルの権限を引き継ぐ
        let _ = temp.as_file().set_permissions(metadata.permissions());
    }

    temp.persist(path)
        .map_err(|e| FinderError::from_write_io(path, e.error))?;
    Ok(())
}
