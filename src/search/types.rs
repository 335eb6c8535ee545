use crate::config::Config;
use crate::error::{FinderError, Result};
use crate::matcher::{normalize_target, MatchColumns};
use account_finder_common::MatchRecord;
use std::path::PathBuf;

/// 1回分の検索条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    target: String,
    files: Vec<PathBuf>,
    sheets: Vec<String>,
}

impl SearchRequest {
    /// 空の口座番号はファイルを開く前に拒否する。
    /// ファイルとシートの重複は先勝ちで除く。
    pub fn new<P, S>(
        target: &str,
        files: impl IntoIterator<Item = P>,
        sheets: impl IntoIterator<Item = S>,
    ) -> Result<Self>
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let target = normalize_target(target);
        if target.is_empty() {
            return Err(FinderError::EmptyIdentifier);
        }

        Ok(Self {
            target: target.to_string(),
            files: dedup(files.into_iter().map(Into::into)),
            sheets: dedup(sheets.into_iter().map(Into::into)),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn sheets(&self) -> &[String] {
        &self.sheets
    }

    /// シート未指定ならデフォルトシート1つ
    pub fn sheets_or(&self, default_sheet: &str) -> Vec<String> {
        if self.sheets.is_empty() {
            vec![default_sheet.to_string()]
        } else {
            self.sheets.clone()
        }
    }
}

fn dedup<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub columns: MatchColumns,
    pub default_sheet: String,
    pub parallel: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            columns: MatchColumns::default(),
            default_sheet: "Sheet1".into(),
            parallel: false,
        }
    }
}

impl From<&Config> for SearchOptions {
    fn from(config: &Config) -> Self {
        Self {
            columns: MatchColumns::from(config),
            default_sheet: config.default_sheet.clone(),
            parallel: config.parallel,
        }
    }
}

/// (ファイル, シート) 1組の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptKind {
    Matched(usize),
    SheetNotFound,
    ColumnMissing,
    Unreadable(String),
}

impl AttemptKind {
    pub fn from_error(err: &FinderError) -> Self {
        match err {
            FinderError::SheetNotFound { .. } => AttemptKind::SheetNotFound,
            FinderError::ColumnMissing { .. } => AttemptKind::ColumnMissing,
            FinderError::UnreadableFile { reason, .. } => AttemptKind::Unreadable(reason.clone()),
            other => AttemptKind::Unreadable(other.to_string()),
        }
    }
}

impl std::fmt::Display for AttemptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptKind::Matched(n) => write!(f, "{}件一致", n),
            AttemptKind::SheetNotFound => write!(f, "シートなし"),
            AttemptKind::ColumnMissing => write!(f, "検索列なし"),
            AttemptKind::Unreadable(reason) => write!(f, "読み込み不可 ({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub file: PathBuf,
    pub sheet: String,
    pub kind: AttemptKind,
}

/// 進捗通知
#[derive(Debug, Clone)]
pub enum SearchProgress {
    FileStarted { index: usize, total: usize, path: PathBuf },
    FileFinished { index: usize, total: usize, path: PathBuf, matches: usize },
}

/// 検索結果（ヒット一覧と組ごとの結果）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReport {
    pub records: Vec<MatchRecord>,
    pub outcomes: Vec<AttemptOutcome>,
}

impl SearchReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headline(&self) -> String {
        if self.records.is_empty() {
            "❌ Account number not found in the selected sheets.".to_string()
        } else {
            format!("✅ Account Found ({} matches)", self.records.len())
        }
    }

    /// 一致以外の結果
    pub fn failures(&self) -> impl Iterator<Item = &AttemptOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.kind, AttemptKind::Matched(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_target_rejected() {
        let result = SearchRequest::new("   ", ["A.xlsx"], ["2023"]);
        assert!(matches!(result, Err(FinderError::EmptyIdentifier)));
    }

    #[test]
    fn test_target_trimmed_and_duplicates_removed() {
        let request = SearchRequest::new(" 5001 ", ["A.xlsx", "B.xlsx", "A.xlsx"], ["2023", "2023"]).unwrap();
        assert_eq!(request.target(), "5001");
        assert_eq!(request.files().len(), 2);
        assert_eq!(request.sheets(), &["2023"]);
    }

    #[test]
    fn test_default_sheet_when_empty() {
        let request = SearchRequest::new("1", ["A.xlsx"], Vec::<String>::new()).unwrap();
        assert_eq!(request.sheets_or("Sheet1"), vec!["Sheet1".to_string()]);
    }

    #[test]
    fn test_headline() {
        let mut report = SearchReport::default();
        assert!(report.headline().starts_with("❌"));
        report.records.push(MatchRecord::new("A.xlsx", "S", "", ""));
        assert_eq!(report.headline(), "✅ Account Found (1 matches)");
    }

    #[test]
    fn test_attempt_kind_from_error() {
        let err = FinderError::SheetNotFound { path: "B.xlsx".into(), sheet: "2023".into() };
        assert_eq!(AttemptKind::from_error(&err), AttemptKind::SheetNotFound);
        let err = FinderError::UnreadableFile { path: "C.xlsx".into(), reason: "bad zip".into() };
        assert_eq!(AttemptKind::from_error(&err), AttemptKind::Unreadable("bad zip".into()));
    }
}
