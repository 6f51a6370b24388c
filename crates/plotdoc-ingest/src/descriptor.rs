//! Column descriptors for the plain text reader.
//!
//! A descriptor lists the file's columns in order: dataset names, each
//! optionally followed by error columns `+-` (symmetric), `+` (positive) and
//! `-` (negative). Items are separated by commas or whitespace, so
//! `x,+- y,+,-` reads five columns into datasets `x` and `y`.

use std::fmt;
use std::str::FromStr;

use plotdoc_model::DatasetPart;

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorColumn {
    pub dataset: String,
    pub part: DatasetPart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    text: String,
    columns: Vec<DescriptorColumn>,
}

impl Descriptor {
    pub fn parse(text: &str) -> Result<Self> {
        let mut columns: Vec<DescriptorColumn> = Vec::new();
        for item in text
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|item| !item.is_empty())
        {
            let part = match item {
                "+-" => Some(DatasetPart::SymErr),
                "+" => Some(DatasetPart::PosErr),
                "-" => Some(DatasetPart::NegErr),
                _ => None,
            };
            match part {
                Some(part) => {
                    let Some(last) = columns.last() else {
                        return Err(IngestError::descriptor(
                            text,
                            format!("error column '{item}' before any dataset name"),
                        ));
                    };
                    let dataset = last.dataset.clone();
                    if columns
                        .iter()
                        .any(|col| col.dataset == dataset && col.part == part)
                    {
                        return Err(IngestError::descriptor(
                            text,
                            format!("dataset '{dataset}' has more than one '{item}' column"),
                        ));
                    }
                    columns.push(DescriptorColumn { dataset, part });
                }
                None => {
                    if columns.iter().any(|col| col.dataset == item) {
                        return Err(IngestError::descriptor(
                            text,
                            format!("dataset '{item}' is listed twice"),
                        ));
                    }
                    columns.push(DescriptorColumn {
                        dataset: item.to_string(),
                        part: DatasetPart::Values,
                    });
                }
            }
        }
        if columns.is_empty() {
            return Err(IngestError::descriptor(text, "no columns given"));
        }
        Ok(Self {
            text: text.to_string(),
            columns,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn columns(&self) -> &[DescriptorColumn] {
        &self.columns
    }

    /// Dataset names in the order they first appear.
    pub fn dataset_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|col| col.part == DatasetPart::Values)
            .map(|col| col.dataset.as_str())
            .collect()
    }

    /// Error parts read for `dataset`, in column order.
    pub fn parts_of(&self, dataset: &str) -> Vec<DatasetPart> {
        self.columns
            .iter()
            .filter(|col| col.dataset == dataset && col.part != DatasetPart::Values)
            .map(|col| col.part)
            .collect()
    }
}

impl FromStr for Descriptor {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Build the descriptor text for one dataset with the given error parts.
pub fn descriptor_for(name: &str, error_parts: &[DatasetPart]) -> String {
    let mut text = name.to_string();
    for part in error_parts {
        let marker = match part {
            DatasetPart::SymErr => "+-",
            DatasetPart::PosErr => "+",
            DatasetPart::NegErr => "-",
            DatasetPart::Values => continue,
        };
        text.push(',');
        text.push_str(marker);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_separators() {
        let descriptor = Descriptor::parse("x,+- y,+,-").unwrap();
        assert_eq!(descriptor.columns().len(), 5);
        assert_eq!(descriptor.dataset_names(), vec!["x", "y"]);
        assert_eq!(descriptor.parts_of("x"), vec![DatasetPart::SymErr]);
        assert_eq!(
            descriptor.parts_of("y"),
            vec![DatasetPart::PosErr, DatasetPart::NegErr]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Descriptor::parse("+-,x").is_err());
        assert!(Descriptor::parse("x,+-,+-").is_err());
        assert!(Descriptor::parse("x y x").is_err());
        assert!(Descriptor::parse("  ,, ").is_err());
    }

    #[test]
    fn test_descriptor_for_round_trips() {
        let text = descriptor_for(
            "flux",
            &[DatasetPart::SymErr, DatasetPart::PosErr, DatasetPart::NegErr],
        );
        assert_eq!(text, "flux,+-,+,-");
        let parsed = Descriptor::parse(&text).unwrap();
        assert_eq!(parsed.parts_of("flux").len(), 3);
    }
}
