//! 結果のマスタファイル追記
//!
//! - マスタがなければヘッダー付きで新規作成
//! - あれば先頭シートの最終行の次に追記（既存のセル・他のシートには触れない）
//! - ロック等で書けなければリトライし、最後はタイムスタンプ付きの別ファイルへ退避

mod package;
mod retry;
mod store;

pub use retry::RetryPolicy;
pub use store::{AppendedRows, MasterStore, XlsxStore};

use crate::config::Config;
use crate::error::{FinderError, Result};
use account_finder_common::{header_row, CellValue, MatchRecord};
use chrono::Local;
use std::path::{Path, PathBuf};

/// 追記結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// 新規作成（データ行数）
    Created { path: PathBuf, rows: usize },
    /// 追記（先頭シートの1始まりの行番号）
    Appended { path: PathBuf, first_row: usize, last_row: usize },
    /// マスタに書けず退避ファイルへ保存
    FallbackSaved { path: PathBuf, reason: String },
}

impl std::fmt::Display for AppendOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppendOutcome::Created { path, rows } => {
                write!(f, "✅ 新規作成: '{}' ({}件)", path.display(), rows)
            }
            AppendOutcome::Appended { path, first_row, last_row } => write!(
                f,
                "✅ '{}' に追記しました (行 {}-{})",
                path.display(),
                first_row,
                last_row
            ),
            AppendOutcome::FallbackSaved { path, reason } => write!(
                f,
                "💾 マスタに書き込めないため '{}' に保存しました ({})",
                path.display(),
                reason
            ),
        }
    }
}

pub struct ResultSink<S: MasterStore = XlsxStore> {
    store: S,
    policy: RetryPolicy,
}

impl ResultSink<XlsxStore> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_store(XlsxStore, policy)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(RetryPolicy::new(config.retry_attempts, config.retry_delay()))
    }
}

impl<S: MasterStore> ResultSink<S> {
    pub fn with_store(store: S, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// 結果をマスタに追記
    ///
    /// 成功・退避ファイル保存・致命的エラーのいずれかで必ず終わる。
    /// 退避ファイルにも書けない場合のみ `FatalIo` を返す。
    pub fn append_results(&self, records: &[MatchRecord], master: &Path) -> Result<AppendOutcome> {
        if records.is_empty() {
            return Err(FinderError::NoResults);
        }

        let merged = self.policy.run(|attempt| {
            tracing::debug!(attempt, path = %master.display(), "マスタへの書き込みを試行");
            self.merge_into_master(records, master)
        });

        match merged {
            Ok(outcome) => {
                tracing::info!(path = %master.display(), records = records.len(), "{}", outcome);
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(path = %master.display(), "マスタへの書き込みを断念: {}", e);
                self.write_fallback(records, master, e)
            }
        }
    }

    fn merge_into_master(&self, records: &[MatchRecord], master: &Path) -> Result<AppendOutcome> {
        if !self.store.exists(master) {
            self.store.create(master, &with_header(records))?;
            return Ok(AppendOutcome::Created {
                path: master.to_path_buf(),
                rows: records.len(),
            });
        }

        let rows: Vec<Vec<CellValue>> = records.iter().map(MatchRecord::to_row).collect();
        let AppendedRows { first_row, last_row } = self.store.append(master, &header_row(), &rows)?;
        Ok(AppendOutcome::Appended {
            path: master.to_path_buf(),
            first_row,
            last_row,
        })
    }

    /// マスタの内容とは混ぜずに、今回の結果だけを別ファイルへ
    fn write_fallback(
        &self,
        records: &[MatchRecord],
        master: &Path,
        cause: FinderError,
    ) -> Result<AppendOutcome> {
        let path = self.fallback_path(master);

        match self.store.create(&path, &with_header(records)) {
            Ok(()) => {
                tracing::info!(path = %path.display(), records = records.len(), "退避ファイルに保存");
                Ok(AppendOutcome::FallbackSaved {
                    path,
                    reason: cause.to_string(),
                })
            }
            Err(e) => Err(FinderError::FatalIo {
                path: path.display().to_string(),
                reason: format!("{} (マスタ: {})", e, cause),
            }),
        }
    }

    /// `<stem>_temp_<YYYYmmdd_HHMMSS>.xlsx`、既存なら `_<n>` を付ける
    fn fallback_path(&self, master: &Path) -> PathBuf {
        let stem = master
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "master_account_results".to_string());
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("{}_temp_{}", stem, stamp);

        let mut candidate = master.with_file_name(format!("{}.xlsx", base));
        let mut n = 1;
        while self.store.exists(&candidate) {
            candidate = master.with_file_name(format!("{}_{}.xlsx", base, n));
            n += 1;
        }
        candidate
    }
}

fn with_header(records: &[MatchRecord]) -> Vec<Vec<CellValue>> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(header_row());
    rows.extend(records.iter().map(MatchRecord::to_row));
    rows
}
