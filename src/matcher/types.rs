use crate::config::Config;

/// 照合に使う列名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchColumns {
    /// 必須（検索キー）
    pub account: String,
    /// 任意（なければ空文字列）
    pub letter_ref: String,
    pub letter_date: String,
}

impl Default for MatchColumns {
    fn default() -> Self {
        Self {
            account: "Account No".into(),
            letter_ref: "Letter Ref".into(),
            letter_date: "Letter Date".into(),
        }
    }
}

impl From<&Config> for MatchColumns {
    fn from(config: &Config) -> Self {
        Self {
            account: config.match_column.clone(),
            letter_ref: config.letter_ref_column.clone(),
            letter_date: config.letter_date_column.clone(),
        }
    }
}
