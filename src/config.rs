use std::path::PathBuf;

use crate::transform::InsertionPolicy;

/// Everything one run needs: which workbook, which sheet, which policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: PathBuf,
    pub sheet: String,
    pub policy: InsertionPolicy,
}

impl Config {
    pub fn new(input: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Config {
            input: input.into(),
            sheet: sheet.into(),
            policy: InsertionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InsertionPolicy) -> Self {
        self.policy = policy;
        self
    }
}
