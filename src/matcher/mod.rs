//! 行照合
//!
//! 検索列のテキスト表現が口座番号と完全一致する行を MatchRecord に射影する。

mod types;

pub use types::MatchColumns;

use crate::error::{FinderError, Result};
use crate::reader::SheetTable;
use account_finder_common::{CellValue, MatchRecord};

/// 口座番号の正規化（前後の空白を除去）
pub fn normalize_target(target: &str) -> &str {
    target.trim()
}

/// セルを比較用テキストに変換（数値 1024.0 → "1024"）
fn cell_key(cell: &CellValue) -> String {
    cell.to_text().trim().to_string()
}

/// 一致する行を元の行順で返す
///
/// 検索列がなければ `ColumnMissing`。任意列の欠落はエラーにしない。
pub fn find_matches(
    table: &SheetTable,
    columns: &MatchColumns,
    target: &str,
    source_file: &str,
    source_sheet: &str,
) -> Result<Vec<MatchRecord>> {
    if !table.has_column(&columns.account) {
        return Err(FinderError::ColumnMissing {
            sheet: source_sheet.to_string(),
            column: columns.account.clone(),
        });
    }

    let target = normalize_target(target);
    let optional = |row: usize, column: &str| {
        table
            .value(row, column)
            .map(|v| v.to_text())
            .unwrap_or_default()
    };

    let matches = (0..table.len())
        .filter(|&row| {
            table
                .value(row, &columns.account)
                .map(|cell| cell_key(cell) == target)
                .unwrap_or(false)
        })
        .map(|row| MatchRecord {
            source_file: source_file.to_string(),
            source_sheet: source_sheet.to_string(),
            letter_ref: optional(row, &columns.letter_ref),
            letter_date: optional(row, &columns.letter_date),
        })
        .collect();

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn sample_table() -> SheetTable {
        SheetTable::from_rows(vec![
            vec![text("Account No"), text("Letter Ref"), text("Letter Date")],
            vec![CellValue::Number(1024.0), text("LR1"), CellValue::Empty],
            vec![text("2048"), text("LR2"), text("2023-02-01")],
            vec![text(" 1024 "), text("LR3"), CellValue::Empty],
        ])
    }

    #[test]
    fn test_number_cell_matches_text_target() {
        let matches = find_matches(&sample_table(), &MatchColumns::default(), "1024", "A.xlsx", "2023")
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].letter_ref, "LR1");
        assert_eq!(matches[1].letter_ref, "LR3");
    }

    #[test]
    fn test_text_cell_matches_trimmed_target() {
        let matches = find_matches(&sample_table(), &MatchColumns::default(), "  2048\t", "A.xlsx", "2023")
            .unwrap();
        assert_eq!(matches, vec![MatchRecord::new("A.xlsx", "2023", "LR2", "2023-02-01")]);
    }

    #[test]
    fn test_no_partial_match() {
        let matches = find_matches(&sample_table(), &MatchColumns::default(), "102", "A.xlsx", "2023")
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_missing_match_column() {
        let table = SheetTable::from_rows(vec![vec![text("Account"), text("Letter Ref")]]);
        let result = find_matches(&table, &MatchColumns::default(), "1024", "A.xlsx", "2023");
        assert!(matches!(result, Err(FinderError::ColumnMissing { .. })));
    }

    #[test]
    fn test_missing_optional_columns_default_empty() {
        let table = SheetTable::from_rows(vec![
            vec![text("Account No")],
            vec![CellValue::Number(5001.0)],
        ]);
        let matches = find_matches(&table, &MatchColumns::default(), "5001", "B.xlsx", "2024").unwrap();
        assert_eq!(matches, vec![MatchRecord::new("B.xlsx", "2024", "", "")]);
    }

    #[test]
    fn test_date_cell_rendered_as_text() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let table = SheetTable::from_rows(vec![
            vec![text("Account No"), text("Letter Date")],
            vec![text("7"), CellValue::Date(date)],
        ]);
        let matches = find_matches(&table, &MatchColumns::default(), "7", "A.xlsx", "S").unwrap();
        assert_eq!(matches[0].letter_date, "2023-01-05");
    }
}
