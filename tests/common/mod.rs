//! Builds small `.xlsx` packages on disk for the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(Clone, Copy, Debug)]
pub enum Cell<'a> {
    /// Not written at all.
    Empty,
    /// Written with no value, like a formatted blank.
    Blank,
    Shared(&'a str),
    Inline(&'a str),
    Number(&'a str),
    Bool(bool),
    Error(&'a str),
    /// Formula text without the `=`, and its cached result.
    Formula(&'a str, &'a str),
    /// Serial number in a cell styled with the built-in `mm-dd-yy` format.
    Date(&'a str),
}

/// Text rows: `""` becomes an absent cell, everything else a shared string.
pub fn text_rows<'a>(rows: &[&[&'a str]]) -> Vec<Vec<Cell<'a>>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|v| if v.is_empty() { Cell::Empty } else { Cell::Shared(*v) })
                .collect()
        })
        .collect()
}

pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

/// Write a workbook with the given sheets into a fresh temp dir.
pub fn workbook(sheets: &[(&str, Vec<Vec<Cell>>)]) -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("book.xlsx");
    write_xlsx(&path, sheets);
    Fixture { dir, path }
}

pub fn write_xlsx(path: &Path, sheets: &[(&str, Vec<Vec<Cell>>)]) {
    let mut shared: Vec<String> = Vec::new();
    let mut sheet_parts = Vec::new();
    for (_, rows) in sheets {
        sheet_parts.push(sheet_xml(rows, &mut shared));
    }

    let names: Vec<&str> = sheets.iter().map(|(name, _)| *name).collect();

    let file = File::create(path).expect("create xlsx");
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut put = |name: &str, content: &str| {
        zip.start_file(name, options).expect("start zip entry");
        zip.write_all(content.as_bytes()).expect("write zip entry");
    };

    put("[Content_Types].xml", &content_types_xml(names.len()));
    put("_rels/.rels", RELS_DOT_RELS);
    put("xl/workbook.xml", &workbook_xml(&names));
    put("xl/_rels/workbook.xml.rels", &workbook_rels_xml(names.len()));
    put("xl/sharedStrings.xml", &shared_strings_xml(&shared));
    put("xl/styles.xml", STYLES_XML);
    for (i, part) in sheet_parts.iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", i + 1), part);
    }

    zip.finish().expect("finish xlsx");
}

const RELS_DOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

/// Cell style 1 uses number format 14, a date.
const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="2"><xf numFmtId="0" xfId="0"/><xf numFmtId="14" xfId="0" applyNumberFormat="1"/></cellXfs>"#,
    r#"</styleSheet>"#,
);

fn workbook_xml(names: &[&str]) -> String {
    let sheets: String = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                xml_escape(name),
                i + 1,
                i + 1
            )
        })
        .collect();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets>{}</sheets>"#,
            r#"</workbook>"#,
        ),
        sheets
    )
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut rels: String = (1..=sheet_count)
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
            )
        })
        .collect();
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 1
    ));
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 2
    ));

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"{}"#,
            r#"</Relationships>"#,
        ),
        rels
    )
}

fn content_types_xml(sheet_count: usize) -> String {
    let overrides: String = (1..=sheet_count)
        .map(|i| {
            format!(
                r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            )
        })
        .collect();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            r#"{}"#,
            r#"</Types>"#,
        ),
        overrides
    )
}

fn shared_strings_xml(shared: &[String]) -> String {
    let items: String = shared
        .iter()
        .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, xml_escape(s)))
        .collect();
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
            r#"{1}</sst>"#,
        ),
        shared.len(),
        items
    )
}

fn sheet_xml(rows: &[Vec<Cell>], shared: &mut Vec<String>) -> String {
    let mut data = String::new();
    for (r, row) in rows.iter().enumerate() {
        let row_num = r + 1;
        if row.iter().all(|c| matches!(c, Cell::Empty)) {
            continue;
        }
        data.push_str(&format!(r#"<row r="{row_num}">"#));
        for (c, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{row_num}", col_to_letters(c as u32));
            match cell {
                Cell::Empty => {}
                Cell::Blank => data.push_str(&format!(r#"<c r="{cell_ref}" s="1"/>"#)),
                Cell::Shared(text) => {
                    let idx = match shared.iter().position(|s| s == text) {
                        Some(idx) => idx,
                        None => {
                            shared.push(text.to_string());
                            shared.len() - 1
                        }
                    };
                    data.push_str(&format!(r#"<c r="{cell_ref}" t="s"><v>{idx}</v></c>"#));
                }
                Cell::Inline(text) => data.push_str(&format!(
                    r#"<c r="{cell_ref}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    xml_escape(text)
                )),
                Cell::Number(n) => data.push_str(&format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#)),
                Cell::Bool(b) => data.push_str(&format!(
                    r#"<c r="{cell_ref}" t="b"><v>{}</v></c>"#,
                    u8::from(*b)
                )),
                Cell::Error(e) => data.push_str(&format!(
                    r#"<c r="{cell_ref}" t="e"><v>{}</v></c>"#,
                    xml_escape(e)
                )),
                Cell::Formula(f, cached) => data.push_str(&format!(
                    r#"<c r="{cell_ref}"><f>{}</f><v>{cached}</v></c>"#,
                    xml_escape(f)
                )),
                Cell::Date(serial) => {
                    data.push_str(&format!(r#"<c r="{cell_ref}" s="1"><v>{serial}</v></c>"#))
                }
            }
        }
        data.push_str("</row>");
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
            r#"<sheetData>{}</sheetData>"#,
            r#"</worksheet>"#,
        ),
        data
    )
}

fn col_to_letters(mut col: u32) -> String {
    let mut result = Vec::new();
    loop {
        result.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result.reverse();
    String::from_utf8(result).expect("ascii column letters")
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
