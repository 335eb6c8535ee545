use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "account-finder")]
#[command(about = "Excelブックから口座番号を検索し、結果をマスタファイルに追記するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// 検索対象の指定
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// 口座番号
    #[arg(required = true)]
    pub account: String,

    /// Excelファイルまたはフォルダ（フォルダは直下のブックを対象）
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// 検索するシート（複数指定可、省略時はデフォルトシート）
    #[arg(short, long = "sheet")]
    pub sheets: Vec<String>,

    /// 全ファイルの全シートを検索
    #[arg(long, conflicts_with_all = ["sheets", "pick_sheets"])]
    pub all_sheets: bool,

    /// シートを対話式で選択
    #[arg(long)]
    pub pick_sheets: bool,

    /// ファイル単位で並列に読み込む
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 選択ファイルのシート名一覧
    Sheets {
        /// Excelファイルまたはフォルダ
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// 口座番号を検索して結果を表示
    Search {
        #[command(flatten)]
        args: SearchArgs,

        /// 結果をJSONで保存
        #[arg(long)]
        json: Option<PathBuf>,

        /// タブ区切りテキストで出力
        #[arg(long)]
        tsv: bool,
    },

    /// 保存済みの結果JSONをマスタファイルに追記
    Save {
        /// 結果JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// マスタファイル（省略時は設定値）
        #[arg(short, long)]
        master: Option<PathBuf>,
    },

    /// 検索からマスタ追記まで一括実行
    Run {
        #[command(flatten)]
        args: SearchArgs,

        /// マスタファイル（省略時は設定値）
        #[arg(short, long)]
        master: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// マスタファイルのパスを設定
        #[arg(long)]
        set_master: Option<PathBuf>,

        /// 並列読み込みの既定値を設定
        #[arg(long)]
        parallel: Option<bool>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
