use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("ブックを開けません: {path} ({reason})")]
    UnreadableFile { path: String, reason: String },

    #[error("シートが見つかりません: {path} / {sheet}")]
    SheetNotFound { path: String, sheet: String },

    #[error("列 '{column}' がシート '{sheet}' にありません")]
    ColumnMissing { sheet: String, column: String },

    #[error("ファイルがロックされています: {path} ({reason})")]
    WriteLocked { path: String, reason: String },

    #[error("一時的なIOエラー: {path} ({reason})")]
    TransientIo { path: String, reason: String },

    #[error("保存に失敗しました: {path} ({reason})")]
    FatalIo { path: String, reason: String },

    #[error("口座番号を入力してください")]
    EmptyIdentifier,

    #[error("Excelファイルが選択されていません")]
    NoFilesSelected,

    #[error("保存する結果がありません")]
    NoResults,

    #[error("検索を実行中です。完了してから再実行してください")]
    SearchInProgress,

    #[error("ワーカー実行エラー: {0}")]
    Worker(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] account_finder_common::Error),
}

impl FinderError {
    /// リトライで回復しうるエラーか
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FinderError::WriteLocked { .. } | FinderError::TransientIo { .. }
        )
    }

    /// マスタファイル書き込み時のIOエラーを分類
    pub fn from_write_io(path: &Path, err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let path = path.display().to_string();
        let reason = err.to_string();
        if is_sharing_violation(&err) {
            return FinderError::WriteLocked { path, reason };
        }
        match err.kind() {
            ErrorKind::PermissionDenied => FinderError::WriteLocked { path, reason },
            ErrorKind::WouldBlock | ErrorKind::Interrupted | ErrorKind::TimedOut => {
                FinderError::TransientIo { path, reason }
            }
            _ => FinderError::FatalIo { path, reason },
        }
    }
}

/// Windows: ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
#[cfg(windows)]
fn is_sharing_violation(err: &std::io::Error) -> bool {
    matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[cfg(not(windows))]
fn is_sharing_violation(_err: &std::io::Error) -> bool {
    false
}

pub type Result<T> = std::result::Result<T, FinderError>;
