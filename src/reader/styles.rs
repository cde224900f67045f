//! Which cell styles render numbers as dates, times or durations.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;
use regex::Regex;

use super::attr_val;
use crate::Result;
use crate::error::Xlsx2TsvError;

/// Built-in format codes that carry date or time tokens. Other built-in ids
/// (27-36, 50-58) are locale dependent and left as plain numbers.
fn builtin_format(id: u32) -> Option<&'static str> {
    let code = match id {
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        _ => return None,
    };
    Some(code)
}

/// True if the first section of `code` contains a date or time token once
/// literals and non-elapsed bracket groups are removed.
pub fn is_date_format(code: &str) -> bool {
    static STRIP_RE: OnceLock<Regex> = OnceLock::new();
    static KEEP_RE: OnceLock<Regex> = OnceLock::new();
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

    let strip = STRIP_RE.get_or_init(|| Regex::new(r#"".*?"|\[[^\]]*\]"#).expect("valid regex"));
    let keep = KEEP_RE.get_or_init(|| Regex::new(r"^\[(hh?\]|h+:|mm?\]|ss?\])").expect("valid regex"));
    let token = TOKEN_RE.get_or_init(|| Regex::new(r"(?:^|[^_\\])[dmhysDMHYS]").expect("valid regex"));

    let first = code.split(';').next().unwrap_or_default();
    let stripped = strip.replace_all(first, |caps: &regex::Captures| {
        let group = &caps[0];
        if keep.is_match(group) {
            group.to_string()
        } else {
            String::new()
        }
    });
    token.is_match(&stripped)
}

/// True for elapsed-time formats such as `[h]:mm:ss`.
pub fn is_timedelta_format(code: &str) -> bool {
    static ELAPSED_RE: OnceLock<Regex> = OnceLock::new();
    let elapsed = ELAPSED_RE.get_or_init(|| {
        Regex::new(r"(?i)\[hh?\](:mm(:ss(\.0*)?)?)?|\[mm?\](:ss(\.0*)?)?|\[ss?\](\.0*)?")
            .expect("valid regex")
    });
    elapsed.is_match(code.split(';').next().unwrap_or_default())
}

/// Date classification of `cellXfs` entries, indexed by a cell's `s` attribute.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DateStyles {
    dates: HashSet<usize>,
    durations: HashSet<usize>,
}

impl DateStyles {
    pub fn is_date(&self, style: usize) -> bool {
        self.dates.contains(&style)
    }

    pub fn is_duration(&self, style: usize) -> bool {
        self.durations.contains(&style)
    }

    fn from_formats(custom: &HashMap<u32, String>, xf_formats: &[u32]) -> Self {
        let mut styles = DateStyles::default();
        for (idx, id) in xf_formats.iter().enumerate() {
            let code = custom.get(id).map(String::as_str).or_else(|| builtin_format(*id));
            let Some(code) = code else { continue };
            if is_date_format(code) {
                styles.dates.insert(idx);
            }
            if is_timedelta_format(code) {
                styles.durations.insert(idx);
            }
        }
        styles
    }
}

/// Read `numFmts` and `cellXfs` from a styles part.
pub(crate) fn parse_styles(part: &str, bytes: &[u8]) -> Result<DateStyles> {
    let mut xml = XmlReader::from_reader(bytes);
    xml.config_mut().trim_text(true);

    let mut custom = HashMap::new();
    let mut xf_formats = Vec::new();
    let mut in_cell_xfs = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"numFmt" => {
                    let (mut id, mut code) = (None, String::new());
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"numFmtId" => id = attr_val(&attr).trim().parse::<u32>().ok(),
                            b"formatCode" => code = attr_val(&attr),
                            _ => {}
                        }
                    }
                    if let Some(id) = id {
                        custom.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let id = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"numFmtId")
                        .and_then(|a| attr_val(&a).trim().parse::<u32>().ok())
                        .unwrap_or(0);
                    xf_formats.push(id);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(Xlsx2TsvError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(DateStyles::from_formats(&custom, &xf_formats))
}
