//! 結果一覧のテキスト表示

use crate::types::{MatchRecord, RESULT_HEADERS};

/// 列幅を揃えたテキスト表を生成
pub fn render_table(records: &[MatchRecord]) -> String {
    let mut widths: Vec<usize> = RESULT_HEADERS.iter().map(|h| h.chars().count()).collect();
    for record in records {
        for (w, field) in widths.iter_mut().zip(record.fields()) {
            *w = (*w).max(field.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(format_line(&RESULT_HEADERS, &widths));
    for record in records {
        lines.push(format_line(&record.fields(), &widths));
    }
    lines.join("\n")
}

fn format_line(fields: &[&str; 4], widths: &[usize]) -> String {
    fields
        .iter()
        .zip(widths)
        .map(|(f, w)| {
            let pad = w.saturating_sub(f.chars().count());
            format!("{}{}", f, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
