//! Account Finder Common Library
//!
//! 検索エンジン（CLI）と結果出力で共有される型とユーティリティ

pub mod cell;
pub mod error;
pub mod export;
pub mod types;

pub use cell::CellValue;
pub use error::{Error, Result};
pub use export::{export_as_delimited_text, render_table};
pub use types::{header_row, MatchRecord, RESULT_HEADERS};
