use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

const MICROS_PER_DAY: i64 = 86_400_000_000;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Day zero of a workbook's serial date numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateEpoch {
    /// 1899-12-30, with the 1900 leap-year bug folded in for serials below 60.
    #[default]
    Windows1900,
    /// 1904-01-01, set by `<workbookPr date1904="1"/>`.
    Mac1904,
}

impl DateEpoch {
    fn base(self) -> NaiveDateTime {
        let (y, m, d) = match self {
            DateEpoch::Windows1900 => (1899, 12, 30),
            DateEpoch::Mac1904 => (1904, 1, 1),
        };
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }
}

/// Value held by a non-empty cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Shared, inline or formula-result string.
    Text(String),
    /// Number written without a fraction or exponent, e.g. `42`.
    Int(i64),
    /// Any other number, e.g. `0.5`, `1E-3`.
    Float(f64),
    Bool(bool),
    /// Error literal such as `#N/A`.
    Error(String),
    /// Formula text including the leading `=`.
    Formula(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Elapsed time, in microseconds.
    Duration(i64),
}

impl CellValue {
    /// Parse the text of a `<v>` element of a numeric cell.
    ///
    /// Text that is not a number is kept as text.
    pub fn number(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.contains(['.', 'e', 'E']) {
            if let Ok(n) = raw.parse::<i64>() {
                return CellValue::Int(n);
            }
        }
        match raw.parse::<f64>() {
            Ok(f) => CellValue::Float(f),
            Err(_) => {
                tracing::warn!(raw, "numeric cell holds non-numeric text");
                CellValue::Text(raw.to_string())
            }
        }
    }

    pub fn bool(raw: &str) -> Self {
        CellValue::Bool(matches!(raw.trim(), "1" | "true" | "TRUE"))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Reinterpret a number in a date-formatted cell as a date, time of day,
    /// or (for elapsed formats) a duration. Serials outside the representable
    /// range become `#VALUE!`.
    pub fn into_date(self, epoch: DateEpoch, elapsed: bool) -> Self {
        let Some(serial) = self.as_f64() else {
            return self;
        };
        let converted = if elapsed {
            serial_to_duration(serial)
        } else {
            serial_to_datetime(serial, epoch)
        };
        converted.unwrap_or_else(|| {
            tracing::warn!(serial, "date serial out of range");
            CellValue::Error("#VALUE!".to_string())
        })
    }

    /// Parse a `t="d"` cell: an ISO 8601 date, time, or date and time.
    pub fn iso_date(raw: &str) -> Self {
        let raw = raw.trim();
        let bare = raw.trim_end_matches('Z');
        if let Ok(dt) = NaiveDateTime::parse_from_str(bare, "%Y-%m-%dT%H:%M:%S%.f") {
            return CellValue::DateTime(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(bare, "%Y-%m-%d") {
            return CellValue::Date(d);
        }
        if let Ok(t) = NaiveTime::parse_from_str(bare, "%H:%M:%S%.f") {
            return CellValue::Time(t);
        }
        tracing::warn!(raw, "date cell is not ISO 8601");
        CellValue::Text(raw.to_string())
    }
}

fn serial_to_datetime(serial: f64, epoch: DateEpoch) -> Option<CellValue> {
    if !serial.is_finite() || serial.abs() > 1e8 {
        return None;
    }
    let mut day = serial.floor();
    let diff_ms = ((serial - day) * MILLIS_PER_DAY as f64).round_ties_even() as i64;

    if (0.0..1.0).contains(&serial) && diff_ms < MILLIS_PER_DAY {
        let secs = (diff_ms / 1000) as u32;
        let nanos = (diff_ms % 1000) as u32 * 1_000_000;
        return NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).map(CellValue::Time);
    }
    if epoch == DateEpoch::Windows1900 && 0.0 < serial && serial < 60.0 {
        day += 1.0;
    }

    let dt = epoch
        .base()
        .checked_add_signed(TimeDelta::try_days(day as i64)?)?
        .checked_add_signed(TimeDelta::try_milliseconds(diff_ms)?)?;
    (1..=9999)
        .contains(&chrono::Datelike::year(&dt))
        .then_some(CellValue::DateTime(dt))
}

fn serial_to_duration(serial: f64) -> Option<CellValue> {
    let micros = serial * MICROS_PER_DAY as f64;
    if !micros.is_finite() || micros.abs() > 9e18 {
        return None;
    }
    let micros = micros.round_ties_even() as i64;
    let secs = micros.div_euclid(1_000_000);
    let mut frac = micros.rem_euclid(1_000_000);
    if frac != 0 {
        // millisecond precision, half to even
        let (q, r) = (frac / 1000, frac % 1000);
        let q = if r > 500 || (r == 500 && q % 2 == 1) { q + 1 } else { q };
        frac = q * 1000;
    }
    Some(CellValue::Duration(secs * 1_000_000 + frac))
}

/// Shortest round-trip digits, fixed notation for exponents in `-4..16`,
/// scientific (`1e-05`, `1.5e+16`) otherwise.
fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        return f.write_str("nan");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "inf" } else { "-inf" });
    }

    let sci = format!("{n:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(m) => ("-", m),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if !(-4..16).contains(&exp) {
        let (head, tail) = digits.split_at(1);
        let tail = if tail.is_empty() { String::new() } else { format!(".{tail}") };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        return write!(f, "{sign}{head}{tail}e{exp_sign}{:02}", exp.abs());
    }

    if exp < 0 {
        let zeros = "0".repeat((-exp - 1) as usize);
        return write!(f, "{sign}0.{zeros}{digits}");
    }
    let int_len = exp as usize + 1;
    if digits.len() <= int_len {
        let zeros = "0".repeat(int_len - digits.len());
        write!(f, "{sign}{digits}{zeros}.0")
    } else {
        let (int_part, frac_part) = digits.split_at(int_len);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

fn write_micros(f: &mut fmt::Formatter<'_>, micros: u32) -> fmt::Result {
    if micros != 0 {
        write!(f, ".{micros:06}")?;
    }
    Ok(())
}

fn write_time(f: &mut fmt::Formatter<'_>, t: &NaiveTime) -> fmt::Result {
    write!(f, "{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second())?;
    write_micros(f, t.nanosecond() / 1000)
}

fn write_duration(f: &mut fmt::Formatter<'_>, micros: i64) -> fmt::Result {
    let days = micros.div_euclid(MICROS_PER_DAY);
    let rest = micros.rem_euclid(MICROS_PER_DAY);
    let secs = rest / 1_000_000;
    if days != 0 {
        let plural = if days.abs() == 1 { "" } else { "s" };
        write!(f, "{days} day{plural}, ")?;
    }
    write!(f, "{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)?;
    write_micros(f, (rest % 1_000_000) as u32)
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) | CellValue::Error(s) | CellValue::Formula(s) => f.write_str(s),
            CellValue::Int(n) => write!(f, "{n}"),
            CellValue::Float(n) => write_float(f, *n),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::DateTime(dt) => {
                write!(f, "{} ", dt.date().format("%Y-%m-%d"))?;
                write_time(f, &dt.time())
            }
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Time(t) => write_time(f, t),
            CellValue::Duration(micros) => write_duration(f, *micros),
        }
    }
}

/// Absent cells become the empty string.
pub fn display_or_empty(cell: &Option<CellValue>) -> String {
    cell.as_ref().map(ToString::to_string).unwrap_or_default()
}
