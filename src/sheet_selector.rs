//! シート対話式選択モジュール

use crate::error::{FinderError, Result};
use dialoguer::MultiSelect;

/// 対話式で検索シートを選択（初期状態は全選択）
///
/// 何も選ばなかった場合は空を返し、検索側でデフォルトシートを使う。
pub fn select_sheets_interactive(available: &[String]) -> Result<Vec<String>> {
    if available.is_empty() {
        println!("⚠ 選択できるシートがありません。デフォルトシートを使用します");
        return Ok(Vec::new());
    }

    let defaults = vec![true; available.len()];
    let picked = MultiSelect::new()
        .with_prompt("検索するシートを選択してください（スペースで切替、Enterで確定）")
        .items(available)
        .defaults(&defaults)
        .interact()
        .map_err(|e| FinderError::Prompt(e.to_string()))?;

    Ok(pick(available, &picked))
}

fn pick(available: &[String], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .filter_map(|&i| available.get(i).cloned())
        .collect()
}
