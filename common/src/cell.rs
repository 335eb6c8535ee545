//! セル値とテキスト正規化
//!
//! 数値で保存された口座番号（1024.0）と文字列の "1024" を
//! 同じテキストとして比較できるようにする。

use chrono::{NaiveDateTime, Timelike};

/// これ以上の絶対値は整数表記にしない（f64の仮数部精度）
const INTEGER_TEXT_LIMIT: f64 = 1e15;

/// スカラーセル値
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    /// Excelエラー値（#N/A など）
    Error(String),
}

impl CellValue {
    /// 空文字列は Empty として扱う
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// 比較・出力用のテキスト表現
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => number_to_text(*n),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Date(dt) => date_to_text(dt),
            CellValue::Error(e) => e.clone(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// 整数値の浮動小数点は小数部なしで表記（1024.0 → "1024"）
pub fn number_to_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < INTEGER_TEXT_LIMIT {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// 時刻部分がちょうど0時か（日付のみとして扱う）
pub fn is_date_only(dt: &NaiveDateTime) -> bool {
    dt.time().num_seconds_from_midnight() == 0 && dt.time().nanosecond() == 0
}

/// 時刻が0時なら日付のみ
pub fn date_to_text(dt: &NaiveDateTime) -> String {
    if is_date_only(dt) {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
