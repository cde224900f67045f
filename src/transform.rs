//! Row transformation: stringified cells in, tab-joined lines out, with a
//! taxon annotation column inserted for the `human` and `mouse` sheets.

use crate::Result;

/// Header value that [`InsertionPolicy::DynamicAfterColumn`] looks for by default.
pub const PARENT_COLUMN: &str = "Parent";

/// Column used by [`InsertionPolicy::FixedIndex`] by default.
pub const FIXED_INSERT_INDEX: usize = 17;

/// Where the annotation column goes, and which annotation table applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionPolicy {
    /// Insert right after the first header cell equal to `name`, or at the end
    /// of the row when no header cell matches. The position is taken from row
    /// 1 and reused for every row.
    ///
    /// Rows 1, 2 and 3 get `In Taxon`, `C 'in taxon' some %` and `""`.
    DynamicAfterColumn { name: String },
    /// Insert at a constant position in every row, appending when the row is
    /// shorter.
    ///
    /// Rows 1 and 2 get `In Taxon` and `C %`.
    FixedIndex(usize),
}

impl InsertionPolicy {
    pub fn after_parent() -> Self {
        InsertionPolicy::DynamicAfterColumn {
            name: PARENT_COLUMN.to_string(),
        }
    }

    pub fn fixed() -> Self {
        InsertionPolicy::FixedIndex(FIXED_INSERT_INDEX)
    }

    /// Insertion index derived from the first row's values.
    ///
    /// For the dynamic policy this is the 1-based position of the matching
    /// header, i.e. one past its array index.
    pub fn insert_index(&self, header: &[String]) -> usize {
        match self {
            InsertionPolicy::DynamicAfterColumn { name } => header
                .iter()
                .position(|v| v == name)
                .map_or(header.len(), |i| i + 1),
            InsertionPolicy::FixedIndex(index) => *index,
        }
    }

    /// Annotation text for 1-based `row_number`.
    pub fn annotation(&self, taxon: Taxon, row_number: usize) -> &'static str {
        match (self, row_number) {
            (_, 1) => "In Taxon",
            (InsertionPolicy::DynamicAfterColumn { .. }, 2) => "C 'in taxon' some %",
            (InsertionPolicy::DynamicAfterColumn { .. }, 3) => "",
            (InsertionPolicy::FixedIndex(_), 2) => "C %",
            _ => taxon.name(),
        }
    }
}

impl Default for InsertionPolicy {
    fn default() -> Self {
        InsertionPolicy::after_parent()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Taxon {
    HomoSapiens,
    MusMusculus,
}

impl Taxon {
    pub fn name(self) -> &'static str {
        match self {
            Taxon::HomoSapiens => "Homo sapiens",
            Taxon::MusMusculus => "Mus musculus",
        }
    }
}

/// Whether rows of a sheet get an annotation column at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    Taxon(Taxon),
    /// Sheet name is not a recognized taxon sheet; rows pass through.
    NoAugmentation,
}

impl Augmentation {
    pub fn for_sheet(sheet: &str) -> Self {
        match sheet {
            "human" => Augmentation::Taxon(Taxon::HomoSapiens),
            "mouse" => Augmentation::Taxon(Taxon::MusMusculus),
            _ => Augmentation::NoAugmentation,
        }
    }
}

/// Stateful per-sheet transformer; feed it rows in order starting at row 1.
#[derive(Debug, Clone)]
pub struct RowTransformer {
    policy: InsertionPolicy,
    augmentation: Augmentation,
    insert_at: Option<usize>,
    row_number: usize,
}

impl RowTransformer {
    pub fn new(sheet: &str, policy: InsertionPolicy) -> Self {
        let augmentation = Augmentation::for_sheet(sheet);
        if augmentation == Augmentation::NoAugmentation {
            tracing::debug!(sheet, "sheet is not a taxon sheet, rows pass through");
        }
        RowTransformer {
            policy,
            augmentation,
            insert_at: None,
            row_number: 0,
        }
    }

    pub fn augmentation(&self) -> Augmentation {
        self.augmentation
    }

    pub fn policy(&self) -> &InsertionPolicy {
        &self.policy
    }

    /// Insertion index, known once row 1 has been seen.
    pub fn insert_index(&self) -> Option<usize> {
        self.insert_at
    }

    /// Transform the next row's values.
    pub fn transform(&mut self, mut values: Vec<String>) -> Vec<String> {
        self.row_number += 1;

        let index = match self.insert_at {
            Some(index) => index,
            None => {
                let index = self.policy.insert_index(&values);
                tracing::debug!(index, policy = ?self.policy, "insertion index fixed");
                self.insert_at = Some(index);
                index
            }
        };

        if let Augmentation::Taxon(taxon) = self.augmentation {
            let annotation = self.policy.annotation(taxon, self.row_number);
            values.insert(index.min(values.len()), annotation.to_string());
        }
        values
    }

    /// Transform the next row and join it with tabs.
    pub fn line(&mut self, values: Vec<String>) -> String {
        self.transform(values).join("\t")
    }
}

/// Lazy TSV lines over a stream of stringified rows.
pub struct TsvLines<I> {
    rows: I,
    transformer: RowTransformer,
}

impl<I> TsvLines<I>
where
    I: Iterator<Item = Result<Vec<String>>>,
{
    pub fn new(rows: I, transformer: RowTransformer) -> Self {
        TsvLines { rows, transformer }
    }
}

impl<I> Iterator for TsvLines<I>
where
    I: Iterator<Item = Result<Vec<String>>>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let values = self.rows.next()?;
        Some(values.map(|values| self.transformer.line(values)))
    }
}
