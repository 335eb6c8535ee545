use account_finder::{cli, config, error, reader, scanner, search, session, sheet_selector};
use account_finder_common::{render_table, MatchRecord};
use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, SearchArgs};
use config::Config;
use error::FinderError;
use indicatif::{ProgressBar, ProgressStyle};
use search::{SearchProgress, SearchReport};
use session::Session;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Sheets { inputs } => {
            println!("📋 account-finder - シート一覧\n");

            let paths = scanner::collect_inputs(&inputs)?;
            let mut session = Session::new(config);
            let loaded = session.set_files(&paths);
            for (path, err) in &loaded.failures {
                println!("⚠ {}: {}", path.display(), err);
            }
            println!("✔ {}件のファイルを読み込み\n", loaded.loaded);

            for sheet in session.list_available_sheets() {
                println!("  {}", sheet);
            }
        }

        Commands::Search { args, json, tsv } => {
            println!("🔍 account-finder - 口座番号検索\n");

            let (session, report) = search_files(config, &args).await?;
            print_report(&report);

            if tsv {
                println!("\n{}", session.export_as_delimited_text(&report.records)?);
            }

            if let Some(output) = json {
                let content = serde_json::to_string_pretty(&report.records)?;
                std::fs::write(&output, content)
                    .with_context(|| format!("write {}", output.display()))?;
                println!("\n✔ 結果を保存: {}", output.display());
            }
        }

        Commands::Save { input, master } => {
            println!("💾 account-finder - マスタ追記\n");

            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("read {}", input.display()))?;
            let records: Vec<MatchRecord> = serde_json::from_str(&content)
                .with_context(|| format!("parse {}", input.display()))?;

            let session = Session::new(config);
            let master = master.unwrap_or_else(|| session.config().master_path.clone());
            let outcome = session.persist_to(records, master).await?;
            println!("{}", outcome);
        }

        Commands::Run { args, master } => {
            println!("🚀 account-finder - 検索・追記\n");

            println!("[1/2] 検索中...");
            let (session, report) = search_files(config, &args).await?;
            print_report(&report);

            if report.is_empty() {
                println!("\n保存する結果がないため追記をスキップしました");
                return Ok(());
            }

            println!("\n[2/2] マスタファイルに追記中...");
            let master = master.unwrap_or_else(|| session.config().master_path.clone());
            let outcome = session.persist_to(report.records, master).await?;
            println!("{}", outcome);

            println!("\n✅ 完了");
        }

        Commands::Config { set_master, parallel, show } => {
            let mut config = config;

            if let Some(path) = set_master {
                config.set_master_path(path)?;
                println!("✔ マスタファイルを設定しました");
            }

            if let Some(parallel) = parallel {
                config.set_parallel(parallel)?;
                println!("✔ 並列読み込みを{}にしました", if parallel { "有効" } else { "無効" });
            }

            if show {
                println!("設定:");
                println!("  マスタファイル: {}", config.master_path.display());
                println!("  デフォルトシート: {}", config.default_sheet);
                println!("  検索列: {}", config.match_column);
                println!("  書簡番号列: {}", config.letter_ref_column);
                println!("  書簡日付列: {}", config.letter_date_column);
                println!("  リトライ: {}回 / {}ms間隔", config.retry_attempts, config.retry_delay_ms);
                println!("  並列読み込み: {}", if config.parallel { "有効" } else { "無効" });
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// ファイルを読み込んで検索（進捗バー付き）
async fn search_files(mut config: Config, args: &SearchArgs) -> anyhow::Result<(Session, SearchReport)> {
    if args.account.trim().is_empty() {
        return Err(FinderError::EmptyIdentifier.into());
    }
    if args.parallel {
        config.parallel = true;
    }

    let paths = scanner::collect_inputs(&args.inputs)?;
    let mut session = Session::new(config);
    let loaded = session.set_files(&paths);
    for (path, err) in &loaded.failures {
        println!("⚠ {}: {}", path.display(), err);
    }
    println!("✔ {}件のファイルを検出\n", loaded.loaded);

    let sheets = if args.all_sheets {
        session.list_available_sheets()
    } else if args.pick_sheets {
        sheet_selector::select_sheets_interactive(&session.list_available_sheets())?
    } else {
        args.sheets.clone()
    };

    let pb = ProgressBar::new(session.files().len() as u64);
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);

    let bar = pb.clone();
    let report = session
        .search_with_progress(&args.account, &sheets, move |event| match event {
            SearchProgress::FileStarted { path, .. } => {
                bar.set_message(format!("Searching: {}", reader::display_file_name(&path)));
            }
            SearchProgress::FileFinished { .. } => bar.inc(1),
        })
        .await?;
    pb.finish_and_clear();

    Ok((session, report))
}

fn print_report(report: &SearchReport) {
    println!("{}", report.headline());
    if !report.is_empty() {
        println!("\n{}", render_table(&report.records));
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\n検索できなかったシート ({}/{}):", failures.len(), report.outcomes.len());
        for outcome in failures {
            println!(
                "  - {} / {}: {}",
                reader::display_file_name(&outcome.file),
                outcome.sheet,
                outcome.kind
            );
        }
    }
}
