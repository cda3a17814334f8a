//! Categorical encoding for the learned model
//!
//! Maps textual category values to the ordinal codes the regression artifact
//! was trained with. A value's code is its index in the column vocabulary.
//! Lookups never fail: a miss resolves to the column's default code.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Code returned when nothing better is known (first category)
pub const DEFAULT_CODE: u32 = 0;

/// Categorical columns of the training data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalColumn {
    Location,
    Condition,
    Garage,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 3] = [
        CategoricalColumn::Location,
        CategoricalColumn::Condition,
        CategoricalColumn::Garage,
    ];

    /// Column name as used at training time
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalColumn::Location => "Location",
            CategoricalColumn::Condition => "Condition",
            CategoricalColumn::Garage => "Garage",
        }
    }

    /// Category a miss resolves to
    fn default_category(&self) -> Option<&'static str> {
        match self {
            CategoricalColumn::Garage => Some("No"),
            _ => None,
        }
    }
}

/// Per-column vocabularies loaded from the encoder artifact
#[derive(Debug, Clone, Default)]
pub struct CategoricalEncoder {
    vocabularies: HashMap<CategoricalColumn, Vec<String>>,
}

impl CategoricalEncoder {
    /// Encoder with no vocabulary: every lookup resolves to the default code
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_vocabularies<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CategoricalColumn, Vec<S>)>,
        S: Into<String>,
    {
        let vocabularies = entries
            .into_iter()
            .map(|(column, classes)| (column, classes.into_iter().map(Into::into).collect()))
            .collect();
        Self { vocabularies }
    }

    /// Parse the JSON artifact: `{"Location": ["Downtown", ...], ...}`
    ///
    /// Unknown keys are ignored; known columns may be absent.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let raw: HashMap<String, Vec<String>> =
            serde_json::from_slice(bytes).context("Failed to parse encoder artifact")?;

        let vocabularies = CategoricalColumn::ALL
            .iter()
            .filter_map(|column| {
                raw.get(column.name())
                    .map(|classes| (*column, classes.clone()))
            })
            .collect();
        Ok(Self { vocabularies })
    }

    /// Load the artifact from disk; a missing file yields an empty encoder
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Encoder artifact not found, using default codes");
            return Ok(Self::empty());
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read encoder artifact {:?}", path))?;
        Self::from_json_slice(&bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.vocabularies.is_empty()
    }

    /// Case-insensitive exact match against the column vocabulary
    pub fn lookup(&self, column: CategoricalColumn, value: &str) -> Option<u32> {
        self.vocabularies
            .get(&column)?
            .iter()
            .position(|class| class.eq_ignore_ascii_case(value))
            .and_then(|idx| u32::try_from(idx).ok())
    }

    /// Code for `value`, or the column's default code on any miss
    pub fn encode(&self, column: CategoricalColumn, value: &str) -> u32 {
        match self.lookup(column, value) {
            Some(code) => code,
            None => {
                debug!(column = column.name(), value = %value, "Unknown category, using default code");
                self.default_code(column)
            }
        }
    }

    /// First category, or for Garage the code of "No" when it is in the vocabulary
    pub fn default_code(&self, column: CategoricalColumn) -> u32 {
        column
            .default_category()
            .and_then(|category| self.lookup(column, category))
            .unwrap_or(DEFAULT_CODE)
    }
}
