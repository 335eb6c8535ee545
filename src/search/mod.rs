//! 検索オーケストレーション
//!
//! ファイル順 → シート順に (ファイル, シート) の組を1つずつ試し、
//! 組ごとの失敗は結果に記録して処理を続ける。

mod types;

pub use types::{AttemptKind, AttemptOutcome, SearchOptions, SearchProgress, SearchReport, SearchRequest};

use crate::error::FinderError;
use crate::matcher;
use crate::reader::{self, display_file_name};
use account_finder_common::MatchRecord;
use rayon::prelude::*;
use std::path::Path;

/// 検索を実行（進捗通知なし）
pub fn run_search(request: &SearchRequest, options: &SearchOptions) -> SearchReport {
    run_search_with_progress(request, options, |_| {})
}

/// 検索を実行し、ファイルごとに進捗を通知
///
/// 並列読み込み時も結果はファイル順・シート順・行順に並ぶ。
pub fn run_search_with_progress<F>(
    request: &SearchRequest,
    options: &SearchOptions,
    progress: F,
) -> SearchReport
where
    F: Fn(SearchProgress) + Send + Sync,
{
    let sheets = request.sheets_or(&options.default_sheet);
    let total = request.files().len();

    tracing::info!(
        target_id = request.target(),
        files = total,
        sheets = sheets.len(),
        parallel = options.parallel,
        "検索開始"
    );

    let search_one = |(index, path): (usize, &std::path::PathBuf)| {
        progress(SearchProgress::FileStarted {
            index,
            total,
            path: path.clone(),
        });
        let result = search_file(path, &sheets, request.target(), options);
        progress(SearchProgress::FileFinished {
            index,
            total,
            path: path.clone(),
            matches: result.0.len(),
        });
        result
    };

    let per_file: Vec<(Vec<MatchRecord>, Vec<AttemptOutcome>)> = if options.parallel {
        request.files().par_iter().enumerate().map(search_one).collect()
    } else {
        request.files().iter().enumerate().map(search_one).collect()
    };

    let mut report = SearchReport::default();
    for (records, outcomes) in per_file {
        report.records.extend(records);
        report.outcomes.extend(outcomes);
    }

    tracing::info!(
        matches = report.records.len(),
        attempts = report.outcomes.len(),
        "検索完了"
    );
    report
}

/// 1ファイル分の全シートを検索
fn search_file(
    path: &Path,
    sheets: &[String],
    target: &str,
    options: &SearchOptions,
) -> (Vec<MatchRecord>, Vec<AttemptOutcome>) {
    let file_name = display_file_name(path);
    let mut records = Vec::new();
    let mut outcomes = Vec::with_capacity(sheets.len());

    for sheet in sheets {
        let kind = match search_sheet(path, &file_name, sheet, target, options) {
            Ok(found) => {
                let count = found.len();
                records.extend(found);
                AttemptKind::Matched(count)
            }
            Err(e) => {
                let kind = AttemptKind::from_error(&e);
                if matches!(kind, AttemptKind::Unreadable(_)) {
                    tracing::warn!(file = %path.display(), sheet = sheet.as_str(), "{}", e);
                } else {
                    tracing::debug!(file = %path.display(), sheet = sheet.as_str(), "{}", e);
                }
                kind
            }
        };

        outcomes.push(AttemptOutcome {
            file: path.to_path_buf(),
            sheet: sheet.clone(),
            kind,
        });
    }

    (records, outcomes)
}

fn search_sheet(
    path: &Path,
    file_name: &str,
    sheet: &str,
    target: &str,
    options: &SearchOptions,
) -> Result<Vec<MatchRecord>, FinderError> {
    let table = reader::read_sheet(path, sheet)?;
    matcher::find_matches(&table, &options.columns, target, file_name, sheet)
}
