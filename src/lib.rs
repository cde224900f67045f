//! Stream one sheet of an `.xlsx` workbook as TSV, inserting a taxon
//! annotation column for the `human` and `mouse` sheets.

use std::io::Write;

pub mod config;
pub mod error;
pub mod reader;
pub mod transform;

pub use config::Config;
pub use error::{ErrorKind, Xlsx2TsvError};
pub use reader::XlsxReader;
pub use transform::{Augmentation, InsertionPolicy, RowTransformer, Taxon, TsvLines};

pub type Result<T> = std::result::Result<T, error::Xlsx2TsvError>;

/// Open `config.input` and write `config.sheet` to `out` as TSV.
///
/// Opening the workbook and locating the sheet both happen before the first
/// line is written. Returns the number of lines written.
pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<usize> {
    let reader = XlsxReader::open(&config.input)?;
    reader.sheet_to_tsv(&config.sheet, config.policy.clone(), out)
}
