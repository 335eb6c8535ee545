//! xlsx パッケージへの行追記
//!
//! 先頭シートのXMLだけを書き換え、それ以外のパーツ（他のシート・共有文字列・
//! スタイル・計算チェーン）は圧縮データのままコピーする。
//! 既存セルには触れないため、数式や書式、シート名はそのまま残る。

use super::store::AppendedRows;
use account_finder_common::CellValue;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read, Seek, Write};
use std::ops::Range;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

type PatchResult<T> = std::result::Result<T, String>;

/// 先頭シートの最終行の次から行を追記したパッケージを返す
///
/// シートに行が1つもなければ `header` を1行目に書き、続けて `rows` を書く。
/// 追記はA列から始める。
pub fn append_to_first_sheet(
    package: &[u8],
    header: &[CellValue],
    rows: &[Vec<CellValue>],
) -> PatchResult<(Vec<u8>, AppendedRows)> {
    let mut archive = ZipArchive::new(Cursor::new(package)).map_err(zip_error)?;

    let part = first_sheet_part(&mut archive)?;
    let xml = read_part(&mut archive, &part)?;
    let (patched, appended) = append_rows_xml(&xml, header, rows)?;
    let bytes = rewrite_package(&mut archive, &part, patched.as_bytes())?;

    Ok((bytes, appended))
}

fn first_sheet_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> PatchResult<String> {
    let workbook = read_part(archive, WORKBOOK_PART)?;
    let rel_id = first_sheet_rel_id(&workbook)?
        .ok_or_else(|| "ブックにシートがありません".to_string())?;

    let rels = read_part(archive, WORKBOOK_RELS_PART)?;
    let target = relationship_target(&rels, &rel_id)?
        .ok_or_else(|| format!("シートの参照先がありません: {}", rel_id))?;

    Ok(resolve_part(&target))
}

fn first_sheet_rel_id(workbook_xml: &str) -> PatchResult<Option<String>> {
    let mut reader = Reader::from_str(workbook_xml);
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                // r:id
                return attribute(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn relationship_target(rels_xml: &str, rel_id: &str) -> PatchResult<Option<String>> {
    let mut reader = Reader::from_str(rels_xml);
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attribute(&e, b"Id")?.as_deref() == Some(rel_id) {
                    return attribute(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// 関係の Target はブックからの相対パスか、パッケージ絶対パス
fn resolve_part(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> PatchResult<String> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| format!("{} を読み込めません: {}", name, e))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| format!("{} を読み込めません: {}", name, e))?;
    Ok(xml)
}

fn rewrite_package<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    xml: &[u8],
) -> PatchResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(zip_error)?;
        if file.name() == part {
            drop(file);
            zip.start_file(part.to_string(), options).map_err(zip_error)?;
            zip.write_all(xml)
                .map_err(|e| format!("{} を書き込めません: {}", part, e))?;
        } else {
            zip.raw_copy_file(file).map_err(zip_error)?;
        }
    }

    let cursor = zip.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

/// シートXML内で書き換える位置
struct SheetLayout {
    /// 名前空間プレフィックス（"x:" など、なければ空）
    prefix: String,
    last_row: usize,
    dimension: Option<(Range<usize>, String)>,
    sheet_data: Option<SheetData>,
}

enum SheetData {
    /// `</sheetData>` の開始位置
    Open { close_at: usize },
    /// `<sheetData/>` の範囲
    Empty(Range<usize>),
}

fn scan_sheet(xml: &str) -> PatchResult<SheetLayout> {
    let mut reader = Reader::from_str(xml);
    let mut layout = SheetLayout {
        prefix: String::new(),
        last_row: 0,
        dimension: None,
        sheet_data: None,
    };
    let mut in_sheet_data = false;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(xml_error)?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Empty(e) if e.local_name().as_ref() == b"dimension" => {
                if let Some(reference) = attribute(&e, b"ref")? {
                    layout.dimension = Some((start..end, reference));
                }
            }
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                layout.prefix = tag_prefix(e.name().as_ref());
                in_sheet_data = true;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                layout.prefix = tag_prefix(e.name().as_ref());
                layout.sheet_data = Some(SheetData::Empty(start..end));
            }
            Event::Start(e) | Event::Empty(e)
                if in_sheet_data && e.local_name().as_ref() == b"row" =>
            {
                // r 属性は省略可能で、その場合は直前の行の次
                layout.last_row = match attribute(&e, b"r")?.and_then(|r| r.parse().ok()) {
                    Some(r) => layout.last_row.max(r),
                    None => layout.last_row + 1,
                };
            }
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => {
                in_sheet_data = false;
                layout.sheet_data = Some(SheetData::Open { close_at: start });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(layout)
}

fn append_rows_xml(
    xml: &str,
    header: &[CellValue],
    rows: &[Vec<CellValue>],
) -> PatchResult<(String, AppendedRows)> {
    let layout = scan_sheet(xml)?;
    let sheet_data = layout
        .sheet_data
        .as_ref()
        .ok_or_else(|| "sheetData がありません".to_string())?;

    let mut new_rows: Vec<&[CellValue]> = Vec::with_capacity(rows.len() + 1);
    if layout.last_row == 0 {
        new_rows.push(header);
    }
    new_rows.extend(rows.iter().map(Vec::as_slice));

    let start_row = layout.last_row + 1;
    let mut rows_xml = String::new();
    for (offset, cells) in new_rows.iter().enumerate() {
        write_row(&mut rows_xml, &layout.prefix, start_row + offset, cells);
    }

    let last_row = layout.last_row + new_rows.len();
    let appended = AppendedRows {
        first_row: start_row + (new_rows.len() - rows.len()),
        last_row,
    };

    let p = &layout.prefix;
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    if let Some((span, reference)) = &layout.dimension {
        let width = new_rows.iter().map(|cells| cells.len()).max().unwrap_or(0);
        if let Some(updated) = extend_dimension(reference, width, start_row, last_row) {
            edits.push((span.clone(), format!("<{p}dimension ref=\"{updated}\"/>")));
        }
    }
    match sheet_data {
        SheetData::Open { close_at } => edits.push((*close_at..*close_at, rows_xml)),
        SheetData::Empty(span) => edits.push((
            span.clone(),
            format!("<{p}sheetData>{rows_xml}</{p}sheetData>"),
        )),
    }

    // 後ろから当てて前の位置をずらさない
    edits.sort_by_key(|(span, _)| span.start);
    let mut patched = xml.to_string();
    for (span, text) in edits.into_iter().rev() {
        patched.replace_range(span, &text);
    }

    Ok((patched, appended))
}

fn write_row(out: &mut String, p: &str, row_number: usize, cells: &[CellValue]) {
    out.push_str(&format!("<{p}row r=\"{row_number}\">"));
    for (col, cell) in cells.iter().enumerate() {
        let reference = format!("{}{}", column_name(col), row_number);
        match cell {
            CellValue::Empty => {}
            CellValue::Number(n) if n.is_finite() => {
                out.push_str(&format!("<{p}c r=\"{reference}\"><{p}v>{n}</{p}v></{p}c>"));
            }
            CellValue::Bool(b) => {
                let v = if *b { 1 } else { 0 };
                out.push_str(&format!(
                    "<{p}c r=\"{reference}\" t=\"b\"><{p}v>{v}</{p}v></{p}c>"
                ));
            }
            other => {
                let text = xml_text(&other.to_text());
                out.push_str(&format!(
                    "<{p}c r=\"{reference}\" t=\"inlineStr\"><{p}is><{p}t xml:space=\"preserve\">{text}</{p}t></{p}is></{p}c>"
                ));
            }
        }
    }
    out.push_str(&format!("</{p}row>"));
}

/// XML 1.0 で使えない制御文字を除いてエスケープ
fn xml_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    escape(cleaned.as_str()).into_owned()
}

fn attribute(e: &BytesStart<'_>, local: &[u8]) -> PatchResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn tag_prefix(name: &[u8]) -> String {
    match name.iter().position(|b| *b == b':') {
        Some(i) => format!("{}:", String::from_utf8_lossy(&name[..i])),
        None => String::new(),
    }
}

/// 0始まりの列番号を列名に（0 → A, 26 → AA）
fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// "B3" → (列 2, 行 3)、どちらも1始まり
fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    let col = letters
        .chars()
        .fold(0, |acc, c| acc * 26 + (c as usize - 'A' as usize + 1));
    let row = digits.parse().ok()?;
    Some((col, row))
}

/// 追記範囲（A列から `width` 列、`first_row`〜`last_row` 行）を含むように広げる
fn extend_dimension(
    reference: &str,
    width: usize,
    first_row: usize,
    last_row: usize,
) -> Option<String> {
    let (start, end) = reference.split_once(':').unwrap_or((reference, reference));
    let (_, start_row) = parse_cell_ref(start)?;
    let (end_col, end_row) = parse_cell_ref(end)?;

    let start_row = start_row.min(first_row);
    let end_col = end_col.max(width).max(1);
    let end_row = end_row.max(last_row);

    Some(format!(
        "A{}:{}{}",
        start_row,
        column_name(end_col - 1),
        end_row
    ))
}

fn zip_error(e: zip::result::ZipError) -> String {
    format!("ZIPエラー: {}", e)
}

fn xml_error(e: impl std::fmt::Display) -> String {
    format!("XML解析エラー: {}", e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn header() -> Vec<CellValue> {
        vec![text("File"), text("Sheet")]
    }

    #[test]
    fn test_append_after_last_row_with_offset() {
        let xml = r#"<worksheet><dimension ref="B3:D4"/><sheetData><row r="3"><c r="B3" t="s"><v>0</v></c></row><row r="4"><c r="D4"><f>CONCATENATE("L","R")</f><v>LR</v></c></row></sheetData></worksheet>"#;

        let (patched, rows) = append_rows_xml(xml, &header(), &[vec![text("A.xlsx"), text("2023")]]).unwrap();

        assert_eq!(rows, AppendedRows { first_row: 5, last_row: 5 });
        assert!(patched.contains(r#"<dimension ref="A3:D5"/>"#));
        assert!(patched.contains(r#"<f>CONCATENATE("L","R")</f>"#));
        assert!(patched.contains(
            r#"<row r="5"><c r="A5" t="inlineStr"><is><t xml:space="preserve">A.xlsx</t></is></c>"#
        ));
        assert!(patched.ends_with("</row></sheetData></worksheet>"));
    }

    #[test]
    fn test_empty_sheet_gets_header_first() {
        let xml = r#"<worksheet><dimension ref="A1"/><sheetData/></worksheet>"#;

        let (patched, rows) = append_rows_xml(xml, &header(), &[vec![text("A.xlsx")]]).unwrap();

        assert_eq!(rows, AppendedRows { first_row: 2, last_row: 2 });
        assert!(patched.contains(r#"<dimension ref="A1:B2"/>"#));
        assert!(patched.contains(r#"<sheetData><row r="1">"#));
        assert!(patched.contains(r#"<row r="2"><c r="A2""#));
    }

    #[test]
    fn test_rows_without_number_are_counted() {
        let xml = "<worksheet><sheetData><row><c><v>1</v></c></row><row><c><v>2</v></c></row></sheetData></worksheet>";

        let (_, rows) = append_rows_xml(xml, &header(), &[vec![CellValue::Number(3.0)]]).unwrap();
        assert_eq!(rows, AppendedRows { first_row: 3, last_row: 3 });
    }

    #[test]
    fn test_prefixed_namespace_is_reused() {
        let xml = r#"<x:worksheet xmlns:x="ns"><x:sheetData><x:row r="1"/></x:sheetData></x:worksheet>"#;

        let (patched, _) = append_rows_xml(xml, &header(), &[vec![CellValue::Bool(true)]]).unwrap();
        assert!(patched.contains(r#"<x:row r="2"><x:c r="A2" t="b"><x:v>1</x:v></x:c></x:row></x:sheetData>"#));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = "<worksheet><sheetData/></worksheet>";
        let (patched, _) =
            append_rows_xml(xml, &header(), &[vec![text("<A&B>\u{1}")]]).unwrap();
        assert!(patched.contains("&lt;A&amp;B&gt;</t>"));
    }

    #[test]
    fn test_missing_sheet_data_is_error() {
        assert!(append_rows_xml("<worksheet/>", &header(), &[]).is_err());
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(parse_cell_ref("AA10"), Some((27, 10)));
        assert_eq!(parse_cell_ref("10"), None);
    }

    #[test]
    fn test_resolve_part() {
        assert_eq!(resolve_part("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve_part("/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }

    #[test]
    fn test_not_a_package() {
        assert!(append_to_first_sheet(b"not a zip", &header(), &[]).is_err());
    }
}
