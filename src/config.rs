use crate::error::{FinderError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// マスタ結果ファイル
    pub master_path: PathBuf,
    /// シート未指定時に検索するシート
    pub default_sheet: String,
    pub match_column: String,
    pub letter_ref_column: String,
    pub letter_date_column: String,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// ファイル単位の並列読み込み
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            master_path: PathBuf::from("master_account_results.xlsx"),
            default_sheet: "Sheet1".into(),
            match_column: "Account No".into(),
            letter_ref_column: "Letter Ref".into(),
            letter_date_column: "Letter Date".into(),
            retry_attempts: 5,
            retry_delay_ms: 2000,
            parallel: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FinderError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("account-finder").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.match_column.trim().is_empty() {
            return Err(FinderError::Config("match_column が空です".into()));
        }
        if self.default_sheet.is_empty() {
            return Err(FinderError::Config("default_sheet が空です".into()));
        }
        if self.retry_attempts == 0 {
            return Err(FinderError::Config("retry_attempts は1以上にしてください".into()));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn set_master_path(&mut self, path: PathBuf) -> Result<()> {
        self.master_path = path;
        self.save()
    }

    pub fn set_parallel(&mut self, parallel: bool) -> Result<()> {
        self.parallel = parallel;
        self.save()
    }
}
