//! シェル向けAPIのテスト
//!
//! ワーカー実行の検索、同時実行の拒否、保存・TSV出力

mod fixtures;

use account_finder::config::Config;
use account_finder::error::FinderError;
use account_finder::search::SearchProgress;
use account_finder::session::Session;
use account_finder::sink::AppendOutcome;
use fixtures::{header, write_book, Blank, Num, Text};
use std::sync::{mpsc, Mutex};
use tempfile::tempdir;

fn fast_config() -> Config {
    Config {
        retry_delay_ms: 0,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_set_files_and_list_sheets() {
    let dir = tempdir().unwrap();
    let a = write_book(&dir.path().join("A.xlsx"), &[("2024", vec![header()]), ("2023", vec![header()])]);
    let b = write_book(&dir.path().join("B.xlsx"), &[("2023", vec![header()]), ("Notes", vec![])]);
    let missing = dir.path().join("missing.xlsx");

    let mut session = Session::new(fast_config());
    let report = session.set_files(&[a, missing.clone(), b]);

    assert_eq!(report.loaded, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, missing);
    assert!(matches!(report.failures[0].1, FinderError::UnreadableFile { .. }));

    assert_eq!(session.list_available_sheets(), vec!["2023", "2024", "Notes"]);
}

#[tokio::test]
async fn test_search_persist_and_export() {
    let dir = tempdir().unwrap();
    let a = write_book(
        &dir.path().join("A.xlsx"),
        &[("Sheet1", vec![header(), vec![Num(5001.0), Text("LR1"), Blank]])],
    );

    let mut session = Session::new(fast_config());
    session.set_files(&[a]);

    let report = session.search("5001", &[]).await.unwrap();
    assert_eq!(report.records.len(), 1);
    assert!(!session.is_searching());

    let tsv = session.export_as_delimited_text(&report.records).unwrap();
    assert_eq!(tsv, "File\tSheet\tLetter Ref\tLetter Date\nA.xlsx\tSheet1\tLR1\t\n");

    let master = dir.path().join("master.xlsx");
    let outcome = session.persist_to(report.records.clone(), master.clone()).await.unwrap();
    assert_eq!(outcome, AppendOutcome::Created { path: master.clone(), rows: 1 });

    let outcome = session.persist_to(report.records, master.clone()).await.unwrap();
    assert_eq!(outcome, AppendOutcome::Appended { path: master, first_row: 3, last_row: 3 });
}

/// 実行中に2つ目の検索は拒否される
#[tokio::test]
async fn test_second_search_rejected_while_running() {
    let dir = tempdir().unwrap();
    let a = write_book(
        &dir.path().join("A.xlsx"),
        &[("Sheet1", vec![header(), vec![Num(5001.0), Text("LR1"), Blank]])],
    );

    let mut session = Session::new(fast_config());
    session.set_files(&[a]);

    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);

    let running = session.clone();
    let first = tokio::spawn(async move {
        running
            .search_with_progress("5001", &[], move |event| {
                if let SearchProgress::FileStarted { .. } = event {
                    let _ = started_tx.send(());
                    let _ = release_rx.lock().unwrap().recv();
                }
            })
            .await
    });

    tokio::task::spawn_blocking(move || started_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(session.is_searching());

    let second = session.search("5001", &[]).await;
    assert!(matches!(second, Err(FinderError::SearchInProgress)));

    release_tx.send(()).unwrap();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.records.len(), 1);

    // 完了後は再び検索できる
    assert!(session.search("5001", &[]).await.is_ok());
}

#[tokio::test]
async fn test_empty_account_rejected() {
    let dir = tempdir().unwrap();
    let a = write_book(&dir.path().join("A.xlsx"), &[("Sheet1", vec![header()])]);

    let mut session = Session::new(fast_config());
    session.set_files(&[a]);

    let result = session.search(" \t ", &[]).await;
    assert!(matches!(result, Err(FinderError::EmptyIdentifier)));
}
