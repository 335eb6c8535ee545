//! テスト用ブック生成

#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

pub enum Cell {
    Text(&'static str),
    Num(f64),
    Blank,
}

pub use Cell::{Blank, Num, Text};

/// シート名と行（先頭行がヘッダー）からブックを作成
pub fn write_book(path: &Path, sheets: &[(&str, Vec<Vec<Cell>>)]) -> PathBuf {
    let mut workbook = Workbook::new();

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("シート名設定失敗");

        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    Text(s) => {
                        worksheet.write_string(r, c, *s).expect("書き込み失敗");
                    }
                    Num(n) => {
                        worksheet.write_number(r, c, *n).expect("書き込み失敗");
                    }
                    Blank => {}
                }
            }
        }
    }

    workbook.save(path).expect("ブック保存失敗");
    path.to_path_buf()
}

pub fn header() -> Vec<Cell> {
    vec![Text("Account No"), Text("Letter Ref"), Text("Letter Date")]
}
