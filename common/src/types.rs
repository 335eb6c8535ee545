//! 検索結果の型定義
//!
//! - MatchRecord: 1件のヒット（ファイル・シート・書簡番号・書簡日付）
//! - RESULT_HEADERS: マスタ結果ファイルの固定ヘッダー

use crate::cell::CellValue;
use serde::{Deserialize, Serialize};

/// マスタ結果ファイルおよびTSV出力のヘッダー行
pub const RESULT_HEADERS: [&str; 4] = ["File", "Sheet", "Letter Ref", "Letter Date"];

/// 検索ヒット1件
///
/// 生成後は変更しない。欠落した任意列は空文字列で保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "File")]
    pub source_file: String,

    #[serde(rename = "Sheet")]
    pub source_sheet: String,

    #[serde(rename = "Letter Ref", default)]
    pub letter_ref: String,

    #[serde(rename = "Letter Date", default)]
    pub letter_date: String,
}

impl MatchRecord {
    pub fn new(
        source_file: impl Into<String>,
        source_sheet: impl Into<String>,
        letter_ref: impl Into<String>,
        letter_date: impl Into<String>,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            source_sheet: source_sheet.into(),
            letter_ref: letter_ref.into(),
            letter_date: letter_date.into(),
        }
    }

    /// ヘッダー順のフィールド
    pub fn fields(&self) -> [&str; 4] {
        [
            self.source_file.as_str(),
            self.source_sheet.as_str(),
            self.letter_ref.as_str(),
            self.letter_date.as_str(),
        ]
    }

    /// ワークシート書き込み用の1行
    pub fn to_row(&self) -> Vec<CellValue> {
        self.fields()
            .iter()
            .map(|f| CellValue::from_text(f))
            .collect()
    }
}

/// ヘッダー行をセル行として返す
pub fn header_row() -> Vec<CellValue> {
    RESULT_HEADERS.iter().map(|h| CellValue::Text(h.to_string())).collect()
}
