//! シェル向けAPI
//!
//! ファイル選択・シート一覧・検索（ワーカースレッド実行）・保存・TSV出力。
//! 検索結果はセッションに保持せず、呼び出し側が値として持ち回る。

use crate::config::Config;
use crate::error::{FinderError, Result};
use crate::reader::WorkbookHandle;
use crate::search::{self, SearchOptions, SearchProgress, SearchReport, SearchRequest};
use crate::sink::{AppendOutcome, ResultSink};
use account_finder_common::MatchRecord;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// ファイル選択の結果（読めなかったファイルは個別に報告）
#[derive(Debug, Default)]
pub struct FileSetReport {
    pub loaded: usize,
    pub failures: Vec<(PathBuf, FinderError)>,
}

/// 1ユーザー操作セッション
///
/// clone したハンドルは実行中フラグを共有する（同時に1検索まで）。
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    files: Vec<WorkbookHandle>,
    in_flight: Arc<AtomicBool>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            files: Vec::new(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn files(&self) -> &[WorkbookHandle] {
        &self.files
    }

    /// 検索対象ファイルを置き換える
    pub fn set_files(&mut self, paths: &[PathBuf]) -> FileSetReport {
        let mut report = FileSetReport::default();
        let mut files = Vec::with_capacity(paths.len());

        for path in paths {
            match WorkbookHandle::open(path) {
                Ok(handle) => files.push(handle),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "{}", e);
                    report.failures.push((path.clone(), e));
                }
            }
        }

        report.loaded = files.len();
        self.files = files;
        report
    }

    /// 全ファイルのシート名（重複なし・名前順）
    pub fn list_available_sheets(&self) -> Vec<String> {
        self.files
            .iter()
            .flat_map(|f| f.sheet_names.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub async fn search(&self, account: &str, sheets: &[String]) -> Result<SearchReport> {
        self.search_with_progress(account, sheets, |_| {}).await
    }

    /// ワーカースレッドで検索し、完了を待つ
    ///
    /// 口座番号の検証はファイルI/Oより先に行う。実行中なら `SearchInProgress`。
    pub async fn search_with_progress<F>(
        &self,
        account: &str,
        sheets: &[String],
        progress: F,
    ) -> Result<SearchReport>
    where
        F: Fn(SearchProgress) + Send + Sync + 'static,
    {
        let request = SearchRequest::new(
            account,
            self.files.iter().map(|f| f.path.clone()),
            sheets.iter().cloned(),
        )?;
        if self.files.is_empty() {
            return Err(FinderError::NoFilesSelected);
        }
        let options = SearchOptions::from(&self.config);
        let guard = InFlight::acquire(&self.in_flight)?;

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            search::run_search_with_progress(&request, &options, progress)
        })
        .await
        .map_err(|e| FinderError::Worker(e.to_string()))
    }

    /// 設定のマスタファイルへ保存
    pub async fn persist(&self, records: Vec<MatchRecord>) -> Result<AppendOutcome> {
        let master = self.config.master_path.clone();
        self.persist_to(records, master).await
    }

    /// リトライ待機を含むためワーカースレッドで実行
    pub async fn persist_to(&self, records: Vec<MatchRecord>, master: PathBuf) -> Result<AppendOutcome> {
        if records.is_empty() {
            return Err(FinderError::NoResults);
        }

        let sink = ResultSink::from_config(&self.config);
        tokio::task::spawn_blocking(move || sink.append_results(&records, &master))
            .await
            .map_err(|e| FinderError::Worker(e.to_string()))?
    }

    pub fn export_as_delimited_text(&self, records: &[MatchRecord]) -> Result<String> {
        Ok(account_finder_common::export_as_delimited_text(records)?)
    }

    pub fn is_searching(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// 実行中フラグ（drop で解除）
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FinderError::SearchInProgress)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
