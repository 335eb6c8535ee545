//! Excel生成（共通ライブラリ）
//!
//! マスタ結果ファイルの行データを xlsx バッファに書き出す。
//! ファイルへの保存は呼び出し側で行う（ロック検出とリトライのため）。

use crate::cell::{is_date_only, CellValue};
use crate::error::{Error, Result};
use rust_xlsxwriter::*;

/// 結果シート名
pub const RESULTS_SHEET_NAME: &str = "Results";

/// 行データをxlsxバッファに生成
///
/// # Arguments
/// * `sheet_name` - 書き込むシート名
/// * `rows` - 先頭行をヘッダーとして太字にする
pub fn generate_rows_buffer(sheet_name: &str, rows: &[Vec<CellValue>]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .map_err(|e| Error::Excel(format!("シート名設定エラー: {}", e)))?;

    for (row_idx, row) in rows.iter().enumerate() {
        let r = u32::try_from(row_idx)
            .map_err(|_| Error::Excel(format!("行数が上限を超えています: {}", row_idx)))?;

        for (col_idx, cell) in row.iter().enumerate() {
            let c = u16::try_from(col_idx)
                .map_err(|_| Error::Excel(format!("列数が上限を超えています: {}", col_idx)))?;

            let written = match cell {
                CellValue::Empty => continue,
                CellValue::Text(s) | CellValue::Error(s) if r == 0 => {
                    worksheet.write_string_with_format(r, c, s, &header_format)
                }
                CellValue::Text(s) | CellValue::Error(s) => worksheet.write_string(r, c, s),
                CellValue::Number(n) => worksheet.write_number(r, c, *n),
                CellValue::Bool(b) => worksheet.write_boolean(r, c, *b),
                CellValue::Date(dt) => {
                    let format = if is_date_only(dt) {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    worksheet.write_datetime_with_format(r, c, dt, format)
                }
            };
            written.map_err(|e| Error::Excel(format!("セル書き込みエラー ({}, {}): {}", r, c, e)))?;
        }
    }

    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| Error::Excel(format!("Excel保存エラー: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{header_row, MatchRecord};

    #[test]
    fn test_generate_rows_buffer_is_zip() {
        let mut rows = vec![header_row()];
        rows.push(MatchRecord::new("A.xlsx", "2023", "LR1", "").to_row());

        let buffer = generate_rows_buffer(RESULTS_SHEET_NAME, &rows).expect("生成失敗");
        // xlsx は ZIP コンテナ
        assert_eq!(&buffer[..2], b"PK");
    }

    #[test]
    fn test_sub_second_datetime_is_written() {
        let dt = chrono::NaiveDate::from_ymd_opt(2023, 1, 5)
            .unwrap()
            .and_hms_nano_opt(0, 0, 0, 250_000_000)
            .unwrap();
        let rows = vec![header_row(), vec![CellValue::Date(dt)]];
        assert!(generate_rows_buffer(RESULTS_SHEET_NAME, &rows).is_ok());
    }

    #[test]
    fn test_invalid_sheet_name() {
        let result = generate_rows_buffer("bad[name]", &[header_row()]);
        assert!(matches!(result, Err(Error::Excel(_))));
    }
}
