//! ブック読み込み
//!
//! シート名の列挙と、シートを行単位のテーブルとして読み込む。
//! 呼び出しごとにディスクから読み直し、キャッシュしない。

mod cell;

pub use cell::to_cell_value;

use crate::error::{FinderError, Result};
use account_finder_common::CellValue;
use calamine::{open_workbook_auto, Reader};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// 選択されたブック（パスとシート名一覧）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookHandle {
    pub path: PathBuf,
    pub sheet_names: Vec<String>,
}

impl WorkbookHandle {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sheet_names = list_sheets(&path)?;
        Ok(Self { path, sheet_names })
    }
}

/// パスのファイル名部分（取得できなければパス全体）
pub fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// 1シート分の行データ
///
/// 列名は先頭行から取り、テーブル内で一意になるよう調整する。
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    /// 先頭行をヘッダーとしてテーブルを構築
    pub fn from_rows(mut rows: Vec<Vec<CellValue>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let header = rows.remove(0);
        let columns = unique_column_names(&header);
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Self { columns, index, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// データ行数（ヘッダー除く）
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 行・列名でセルを取得（列がない、または行が短い場合は None）
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = *self.index.get(column)?;
        self.rows.get(row)?.get(col)
    }
}

/// 重複列名に ".1", ".2" を付け、空の列名は "Unnamed: n" にする
fn unique_column_names(header: &[CellValue]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(header.len());

    for (i, cell) in header.iter().enumerate() {
        let base = match cell.to_text() {
            t if t.is_empty() => format!("Unnamed: {}", i),
            t => t,
        };

        let mut name = base.clone();
        while seen.contains(&name) {
            let n = counts.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{}.{}", base, n);
        }
        seen.insert(name.clone());
        columns.push(name);
    }

    columns
}

fn open(path: &Path) -> Result<calamine::Sheets<std::io::BufReader<std::fs::File>>> {
    open_workbook_auto(path).map_err(|e| FinderError::UnreadableFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// ブック内のシート名を順序通りに取得
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    let workbook = open(path)?;
    let names = workbook.sheet_names();
    tracing::debug!(path = %path.display(), sheets = names.len(), "シート一覧を取得");
    Ok(names)
}

/// シートをテーブルとして読み込み
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<SheetTable> {
    let mut workbook = open(path)?;

    if !workbook.sheet_names().iter().any(|s| s == sheet_name) {
        return Err(FinderError::SheetNotFound {
            path: path.display().to_string(),
            sheet: sheet_name.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| FinderError::UnreadableFile {
            path: path.display().to_string(),
            reason: format!("{}: {}", sheet_name, e),
        })?;

    let rows: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(to_cell_value).collect())
        .collect();

    tracing::debug!(
        path = %path.display(),
        sheet = sheet_name,
        rows = rows.len(),
        "シートを読み込み"
    );

    Ok(SheetTable::from_rows(rows))
}
