//! タブ区切りテキスト出力（クリップボード貼り付け用）

use crate::error::{Error, Result};
use crate::types::{MatchRecord, RESULT_HEADERS};

/// ヘッダー付きのタブ区切りテキストを生成
///
/// タブ・改行・引用符を含むフィールドは引用符で囲む。
pub fn export_as_delimited_text(records: &[MatchRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(RESULT_HEADERS)?;
    for record in records {
        writer.write_record(record.fields())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
