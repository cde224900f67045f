//! Streaming `.xlsx` sheet reader.
//!
//! Opening a workbook resolves sheet names to their worksheet parts and loads
//! the shared string table and date styles. [`XlsxReader::stream_rows`] then
//! reads one worksheet part into memory and decodes it row by row on demand.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::Reader as XmlReader;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, BytesText, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::Result;
use crate::error::Xlsx2TsvError;
use crate::transform::{InsertionPolicy, RowTransformer, TsvLines};

pub mod cell;
pub mod formula;
pub mod styles;

pub use cell::{CellValue, DateEpoch};
use formula::SharedFormula;
use styles::DateStyles;

/// One sheet row, padded to the sheet's full width.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based row number.
    pub number: u32,
    pub cells: Vec<Option<CellValue>>,
}

impl Row {
    fn blank(number: u32) -> Self {
        Row {
            number,
            cells: Vec::new(),
        }
    }

    /// Display strings of every cell, absent cells as `""`.
    pub fn values(&self) -> Vec<String> {
        self.cells.iter().map(cell::display_or_empty).collect()
    }

    /// Overlay the cells of a second `<row>` element with the same number.
    fn merge(&mut self, other: Row) {
        for (col, value) in other.cells.into_iter().enumerate() {
            if value.is_none() {
                continue;
            }
            if self.cells.len() <= col {
                self.cells.resize(col + 1, None);
            }
            self.cells[col] = value;
        }
    }
}

/// Extent of a sheet: rows `1..=rows`, columns `0..cols`. Both are zero for a
/// sheet without cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetShape {
    pub rows: u32,
    pub cols: u32,
    /// Row elements appear with strictly increasing numbers.
    pub ordered: bool,
}

/// Workbook-wide lookups needed to turn raw cell text into values.
#[derive(Debug, Default)]
pub(crate) struct CellContext {
    shared_strings: Vec<String>,
    styles: DateStyles,
    epoch: DateEpoch,
}

#[inline]
fn attr_val(attr: &Attribute) -> String {
    attr.unescape_value()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned())
}

#[inline]
fn text_val(e: &BytesText) -> String {
    e.unescape()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| String::from_utf8_lossy(e.as_ref()).into_owned())
}

pub struct XlsxReader {
    path: PathBuf,
    sheet_paths: HashMap<String, String>,
    sheet_order: Vec<String>,
    context: Arc<CellContext>,
}

impl XlsxReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        let workbook = parse_workbook(&mut archive)?;
        let rels = parse_workbook_rels(&mut archive)?;

        let sheet_paths: HashMap<String, String> = workbook
            .rid_to_name
            .into_iter()
            .filter_map(|(rid, name)| rels.sheets.get(&rid).map(|p| (name, p.clone())))
            .collect();

        let shared_strings = parse_shared_strings(&mut archive, &rels.shared_strings)?;
        let styles = match optional_entry(&mut archive, &rels.styles)? {
            Some(bytes) => styles::parse_styles(&rels.styles, &bytes)?,
            None => DateStyles::default(),
        };

        tracing::debug!(
            path = %path.display(),
            sheets = workbook.order.len(),
            shared_strings = shared_strings.len(),
            epoch = ?workbook.epoch,
            "opened workbook"
        );

        Ok(XlsxReader {
            path: path.to_path_buf(),
            sheet_paths,
            sheet_order: workbook.order,
            context: Arc::new(CellContext {
                shared_strings,
                styles,
                epoch: workbook.epoch,
            }),
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_order
    }

    pub fn stream_rows(&self, sheet_name: &str) -> Result<RowIter> {
        let zip_path = self
            .sheet_paths
            .get(sheet_name)
            .ok_or_else(|| Xlsx2TsvError::SheetNotFound(sheet_name.to_string()))?;

        let file = File::open(&self.path)?;
        let mut archive = ZipArchive::new(file)?;
        let xml = slurp_entry(&mut archive, zip_path)?.into_boxed_slice();

        tracing::debug!(sheet = sheet_name, part = %zip_path, bytes = xml.len(), "loaded sheet");

        RowIter::new(zip_path, xml, Arc::clone(&self.context))
    }

    /// Write `sheet_name` to `out` as TSV, one line per row, annotated per
    /// `policy`. Returns the number of lines written.
    ///
    /// Nothing is written if the sheet cannot be found or its part is
    /// malformed.
    pub fn sheet_to_tsv<W: Write>(
        &self,
        sheet_name: &str,
        policy: InsertionPolicy,
        out: &mut W,
    ) -> Result<usize> {
        let rows = self.stream_rows(sheet_name)?;
        let lines = TsvLines::new(
            rows.map(|row| row.map(|row| row.values())),
            RowTransformer::new(sheet_name, policy),
        );

        let mut count = 0;
        for line in lines {
            let line = line?;
            writeln!(out, "{line}")?;
            count += 1;
        }
        Ok(count)
    }
}

/// Rows of one sheet, top to bottom, every row `shape().cols` cells wide.
///
/// Rows missing from the sheet part are yielded as blank rows. Sheets whose
/// row elements are out of order are decoded up front and sorted.
pub struct RowIter {
    source: RowSource,
    shape: SheetShape,
    next_row: u32,
}

enum RowSource {
    Streaming {
        cursor: SheetCursor,
        pending: Option<Row>,
        exhausted: bool,
    },
    Buffered(BTreeMap<u32, Row>),
}

impl RowIter {
    pub(crate) fn new(part: &str, xml: Box<[u8]>, context: Arc<CellContext>) -> Result<Self> {
        let shape = scan_shape(part, &xml)?;
        tracing::debug!(part, rows = shape.rows, cols = shape.cols, ordered = shape.ordered, "sheet shape");

        let mut cursor = SheetCursor {
            part: part.to_string(),
            xml,
            offset: 0,
            context,
            shared_formulas: HashMap::new(),
            state: ParseState::new(),
            buf: Vec::with_capacity(256),
        };

        let source = if shape.ordered {
            RowSource::Streaming {
                cursor,
                pending: None,
                exhausted: false,
            }
        } else {
            tracing::debug!(part, "row elements out of order, sorting");
            let mut rows: BTreeMap<u32, Row> = BTreeMap::new();
            while let Some(row) = cursor.next_row() {
                let row = row?;
                match rows.get_mut(&row.number) {
                    Some(existing) => existing.merge(row),
                    None => {
                        rows.insert(row.number, row);
                    }
                }
            }
            RowSource::Buffered(rows)
        };

        Ok(RowIter {
            source,
            shape,
            next_row: 1,
        })
    }

    pub fn shape(&self) -> SheetShape {
        self.shape
    }
}

impl Iterator for RowIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_row > self.shape.rows {
            return None;
        }
        let number = self.next_row;
        self.next_row += 1;

        let found = match &mut self.source {
            RowSource::Buffered(rows) => rows.remove(&number),
            RowSource::Streaming {
                cursor,
                pending,
                exhausted,
            } => {
                if pending.is_none() && !*exhausted {
                    match cursor.next_row() {
                        Some(Ok(row)) => *pending = Some(row),
                        Some(Err(e)) => {
                            *exhausted = true;
                            self.next_row = self.shape.rows + 1;
                            return Some(Err(e));
                        }
                        None => *exhausted = true,
                    }
                }
                match pending.take() {
                    Some(row) if row.number == number => Some(row),
                    other => {
                        *pending = other;
                        None
                    }
                }
            }
        };

        let mut row = found.unwrap_or_else(|| Row::blank(number));
        row.cells.resize(self.shape.cols as usize, None);
        Some(Ok(row))
    }
}

struct SheetCursor {
    part: String,
    xml: Box<[u8]>,
    offset: usize,
    context: Arc<CellContext>,
    shared_formulas: HashMap<String, SharedFormula>,
    state: ParseState,
    buf: Vec<u8>,
}

/// `<f>` element of the cell being parsed.
struct FormulaState {
    shared_index: Option<String>,
    text: String,
}

struct ParseState {
    row: Vec<Option<CellValue>>,
    row_number: u32,
    col: u32,
    next_col: u32,
    cell_type: CellType,
    style: usize,
    in_v: bool,
    in_t: bool,
    in_f: bool,
    phonetic_depth: u32,
    has_value: bool,
    value_buf: String,
    formula: Option<FormulaState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellType {
    Number,
    SharedStr,
    Inline,
    Bool,
    Str,
    Date,
    Error,
}

impl CellType {
    fn from_attr(t: &str) -> Self {
        match t {
            "s" => CellType::SharedStr,
            "inlineStr" => CellType::Inline,
            "b" => CellType::Bool,
            "str" => CellType::Str,
            "d" => CellType::Date,
            "e" => CellType::Error,
            _ => CellType::Number,
        }
    }
}

impl ParseState {
    fn new() -> Self {
        ParseState {
            row: Vec::new(),
            row_number: 0,
            col: 0,
            next_col: 0,
            cell_type: CellType::Number,
            style: 0,
            in_v: false,
            in_t: false,
            in_f: false,
            phonetic_depth: 0,
            has_value: false,
            value_buf: String::new(),
            formula: None,
        }
    }

    fn start_row(&mut self, e: &BytesStart) {
        self.row.clear();
        self.next_col = 0;
        self.row_number = row_attr(e).unwrap_or(self.row_number + 1);
    }

    fn start_cell(&mut self, e: &BytesStart) {
        let mut col = None;
        let mut cell_type = CellType::Number;
        let mut style = 0;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => col = col_ref_to_index(&attr_val(&attr)),
                b"t" => cell_type = CellType::from_attr(&attr_val(&attr)),
                b"s" => style = attr_val(&attr).trim().parse().unwrap_or(0),
                _ => {}
            }
        }

        self.col = col.unwrap_or(self.next_col);
        self.next_col = self.col + 1;
        self.cell_type = cell_type;
        self.style = style;
        self.value_buf.clear();
        self.has_value = false;
        self.in_v = false;
        self.in_t = false;
        self.in_f = false;
        self.phonetic_depth = 0;
        self.formula = None;
    }

    fn start_formula(&mut self, e: &BytesStart) {
        let mut shared = false;
        let mut shared_index = None;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"t" => shared = attr_val(&attr) == "shared",
                b"si" => shared_index = Some(attr_val(&attr)),
                _ => {}
            }
        }
        self.formula = Some(FormulaState {
            shared_index: shared_index.filter(|_| shared),
            text: String::new(),
        });
    }

    fn finish_cell(
        &mut self,
        context: &CellContext,
        shared_formulas: &mut HashMap<String, SharedFormula>,
    ) {
        let value = if let Some(formula) = self.formula.take() {
            Some(CellValue::Formula(resolve_formula(
                formula,
                self.row_number,
                self.col,
                shared_formulas,
            )))
        } else if self.has_value {
            decode_cell(self.cell_type, &self.value_buf, self.style, context)
        } else {
            None
        };
        self.place(value);
    }

    fn place(&mut self, value: Option<CellValue>) {
        let col = self.col as usize;
        if self.row.len() <= col {
            self.row.resize(col + 1, None);
        }
        self.row[col] = value;
    }

    fn take_row(&mut self) -> Row {
        Row {
            number: self.row_number,
            cells: std::mem::take(&mut self.row),
        }
    }
}

/// Formula text for a cell, with `=` prepended. Dependent cells of a shared
/// formula get the anchor's text re-anchored to their own position.
fn resolve_formula(
    formula: FormulaState,
    row: u32,
    col: u32,
    shared_formulas: &mut HashMap<String, SharedFormula>,
) -> String {
    let text = format!("={}", formula.text);
    let Some(index) = formula.shared_index else {
        return text;
    };
    if let Some(anchor) = shared_formulas.get(&index) {
        return anchor.translate(row, col);
    }
    if text != "=" {
        shared_formulas.insert(
            index,
            SharedFormula {
                text: text.clone(),
                row,
                col,
            },
        );
    }
    text
}

fn decode_cell(
    cell_type: CellType,
    raw: &str,
    style: usize,
    context: &CellContext,
) -> Option<CellValue> {
    if raw.is_empty() && cell_type != CellType::Inline {
        return None;
    }
    let value = match cell_type {
        CellType::SharedStr => {
            let idx = raw.trim().parse::<usize>().ok();
            match idx.and_then(|i| context.shared_strings.get(i)) {
                Some(s) => CellValue::Text(s.clone()),
                None => {
                    tracing::warn!(index = raw.trim(), "shared string index out of range");
                    CellValue::Text(raw.to_string())
                }
            }
        }
        CellType::Inline | CellType::Str => CellValue::Text(raw.to_string()),
        CellType::Date => CellValue::iso_date(raw),
        CellType::Bool => CellValue::bool(raw),
        CellType::Error => CellValue::Error(raw.trim().to_string()),
        CellType::Number if raw.trim().is_empty() => return None,
        CellType::Number if context.styles.is_date(style) => CellValue::number(raw)
            .into_date(context.epoch, context.styles.is_duration(style)),
        CellType::Number => CellValue::number(raw),
    };
    Some(value)
}

impl SheetCursor {
    /// Decode the next `<row>` element, or `None` once `sheetData` ends.
    fn next_row(&mut self) -> Option<Result<Row>> {
        let slice = &self.xml[self.offset..];
        let mut xml = XmlReader::from_reader(slice);
        xml.config_mut().trim_text(false);
        // each call resumes mid-document, so closing tags of outer elements are unmatched
        xml.config_mut().check_end_names = false;
        xml.config_mut().allow_unmatched_ends = true;

        loop {
            self.buf.clear();

            match xml.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) if e.name().as_ref() == b"row" => {
                    self.state.start_row(e);
                }

                Ok(Event::Empty(ref e)) if e.name().as_ref() == b"row" => {
                    // a row with no cells is emitted as blank by the padding in RowIter
                    self.state.start_row(e);
                }

                Ok(Event::Start(ref e)) if e.name().as_ref() == b"c" => {
                    self.state.start_cell(e);
                }

                Ok(Event::Empty(ref e)) if e.name().as_ref() == b"c" => {
                    self.state.start_cell(e);
                    self.state.place(None);
                }

                Ok(Event::Empty(ref e)) if e.name().as_ref() == b"f" => {
                    self.state.start_formula(e);
                }

                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"v" => {
                        self.state.in_v = true;
                        self.state.has_value = true;
                    }
                    b"t" if self.state.phonetic_depth == 0 => {
                        self.state.in_t = true;
                        self.state.has_value = true;
                    }
                    b"f" => {
                        self.state.start_formula(e);
                        self.state.in_f = true;
                    }
                    b"rPh" => self.state.phonetic_depth += 1,
                    _ => {}
                },

                Ok(Event::Text(ref e)) => {
                    if self.state.in_v || self.state.in_t {
                        self.state.value_buf.push_str(&text_val(e));
                    } else if self.state.in_f {
                        if let Some(formula) = self.state.formula.as_mut() {
                            formula.text.push_str(&text_val(e));
                        }
                    }
                }

                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"v" => self.state.in_v = false,
                    b"t" => self.state.in_t = false,
                    b"f" => self.state.in_f = false,
                    b"rPh" => {
                        self.state.phonetic_depth = self.state.phonetic_depth.saturating_sub(1)
                    }
                    b"c" => self
                        .state
                        .finish_cell(&self.context, &mut self.shared_formulas),
                    b"row" => {
                        self.offset += xml.buffer_position() as usize;
                        return Some(Ok(self.state.take_row()));
                    }
                    b"sheetData" => return None,
                    _ => {}
                },

                Ok(Event::Eof) => return None,

                Err(e) => return Some(Err(Xlsx2TsvError::xml(&self.part, e))),

                _ => {}
            }
        }
    }
}

/// Find the used extent of a sheet part (the highest row and column holding
/// a `<c>` element) and whether its rows are in order.
fn scan_shape(part: &str, bytes: &[u8]) -> Result<SheetShape> {
    let mut xml = XmlReader::from_reader(bytes);
    xml.config_mut().trim_text(true);

    let mut shape = SheetShape {
        rows: 0,
        cols: 0,
        ordered: true,
    };
    let mut row = 0u32;
    let mut last_row = None;
    let mut next_col = 0u32;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"row" => {
                    row = row_attr(e).unwrap_or(row + 1);
                    if last_row.is_some_and(|last| row <= last) {
                        shape.ordered = false;
                    }
                    last_row = Some(row);
                    next_col = 0;
                }
                b"c" => {
                    let col = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"r")
                        .and_then(|a| col_ref_to_index(&attr_val(&a)))
                        .unwrap_or(next_col);
                    next_col = col + 1;
                    shape.rows = shape.rows.max(row);
                    shape.cols = shape.cols.max(col + 1);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"sheetData" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(Xlsx2TsvError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(shape)
}

fn row_attr(e: &BytesStart) -> Option<u32> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"r")
        .and_then(|a| attr_val(&a).trim().parse().ok())
}

struct WorkbookPart {
    order: Vec<String>,
    rid_to_name: HashMap<String, String>,
    epoch: DateEpoch,
}

fn parse_workbook(archive: &mut ZipArchive<File>) -> Result<WorkbookPart> {
    const PART: &str = "xl/workbook.xml";

    let bytes = slurp_entry(archive, PART)?;
    let mut xml = XmlReader::from_reader(bytes.as_slice());
    xml.config_mut().trim_text(true);

    let mut workbook = WorkbookPart {
        order: Vec::new(),
        rid_to_name: HashMap::new(),
        epoch: DateEpoch::default(),
    };
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"sheet" => {
                let (mut name, mut rid) = (String::new(), String::new());
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = attr_val(&attr),
                        _ if attr.key.local_name().as_ref() == b"id" => rid = attr_val(&attr),
                        _ => {}
                    }
                }
                if !name.is_empty() && !rid.is_empty() {
                    workbook.order.push(name.clone());
                    workbook.rid_to_name.insert(rid, name);
                }
            }
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"workbookPr" =>
            {
                let date1904 = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"date1904")
                    .is_some_and(|a| matches!(attr_val(&a).as_str(), "1" | "true"));
                if date1904 {
                    workbook.epoch = DateEpoch::Mac1904;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Xlsx2TsvError::xml(PART, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(workbook)
}

struct WorkbookRels {
    sheets: HashMap<String, String>,
    shared_strings: String,
    styles: String,
}

fn parse_workbook_rels(archive: &mut ZipArchive<File>) -> Result<WorkbookRels> {
    const PART: &str = "xl/_rels/workbook.xml.rels";

    let bytes = slurp_entry(archive, PART)?;
    let mut xml = XmlReader::from_reader(bytes.as_slice());
    xml.config_mut().trim_text(true);

    let mut rels = WorkbookRels {
        sheets: HashMap::new(),
        shared_strings: "xl/sharedStrings.xml".to_string(),
        styles: "xl/styles.xml".to_string(),
    };
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let (mut id, mut target, mut kind) = (String::new(), String::new(), String::new());
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr_val(&attr),
                        b"Target" => target = attr_val(&attr),
                        b"Type" => kind = attr_val(&attr),
                        _ => {}
                    }
                }
                let target = normalize_path(&target);
                if kind.ends_with("/worksheet") && !id.is_empty() {
                    rels.sheets.insert(id, target);
                } else if kind.ends_with("/sharedStrings") {
                    rels.shared_strings = target;
                } else if kind.ends_with("/styles") {
                    rels.styles = target;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Xlsx2TsvError::xml(PART, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

fn parse_shared_strings(archive: &mut ZipArchive<File>, part: &str) -> Result<Vec<String>> {
    let mut entry = match archive.by_name(part) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let buf_reader = io::BufReader::with_capacity(64 * 1024, &mut entry);
    let mut xml = XmlReader::from_reader(buf_reader);
    xml.config_mut().trim_text(false);

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    let mut phonetic_depth = 0u32;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_t = phonetic_depth == 0,
                b"rPh" => phonetic_depth += 1,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_t = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_t => current.push_str(&text_val(e)),
            Ok(Event::Eof) => break,
            Err(e) => return Err(Xlsx2TsvError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn slurp_entry(archive: &mut ZipArchive<File>, path: &str) -> Result<Vec<u8>> {
    optional_entry(archive, path)?.ok_or_else(|| Xlsx2TsvError::MissingPart(path.to_string()))
}

fn optional_entry(archive: &mut ZipArchive<File>, path: &str) -> Result<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(path) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

fn normalize_path(target: &str) -> String {
    let t = target.trim_start_matches('/');
    if t.starts_with("xl/") {
        t.to_string()
    } else {
        format!("xl/{t}")
    }
}

/// Zero-based column of a reference like `AB12`, or `None` if it has no
/// column letters.
fn col_ref_to_index(cell_ref: &str) -> Option<u32> {
    let letters = cell_ref.trim().trim_end_matches(|c: char| c.is_ascii_digit());
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let n = letters.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(26)
            .saturating_add((b.to_ascii_uppercase() - b'A') as u32 + 1)
    });
    Some(n - 1)
}
