use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

pub mod columns;
pub mod dataset;

pub use dataset::{Observation, load_observations};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("invalid field (line {line}, column {column}): {message}")]
    InvalidField {
        line: usize,
        column: String,
        message: String,
    },
    #[error("duplicate observation for subject {subject} at visit {visit}")]
    DuplicateObservation { subject: String, visit: String },
    #[error("empty analysis set: {0}")]
    Empty(String),
}

/// Binary genetic-marker status used to stratify subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subgroup {
    Negative,
    Positive,
}

impl Subgroup {
    pub fn label(self) -> &'static str {
        match self {
            Subgroup::Negative => "negative",
            Subgroup::Positive => "positive",
        }
    }

    pub fn both() -> [Subgroup; 2] {
        [Subgroup::Negative, Subgroup::Positive]
    }
}

impl std::fmt::Display for Subgroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path)?;
    let is_gz = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if is_gz {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
