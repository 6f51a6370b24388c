//! Plain text column reader.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use plotdoc_model::{Columns, DatasetPart};

use crate::descriptor::Descriptor;
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Treat blank lines as block separators; block `n` of dataset `x` is
    /// stored as `x_n`, counting from 1.
    pub use_blocks: bool,
}

impl ReaderOptions {
    pub fn with_blocks(mut self, use_blocks: bool) -> Self {
        self.use_blocks = use_blocks;
        self
    }
}

/// Datasets produced by one read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOutput {
    /// Datasets in descriptor (and block) order.
    pub datasets: Vec<(String, Columns)>,
    /// Number of values that could not be converted, per dataset. Only
    /// datasets with at least one bad value are listed.
    pub invalid: BTreeMap<String, usize>,
}

impl ReadOutput {
    pub fn names(&self) -> Vec<String> {
        self.datasets.iter().map(|(name, _)| name.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SimpleReader {
    descriptor: Descriptor,
    options: ReaderOptions,
}

#[derive(Default)]
struct Block {
    // one sequence per descriptor column
    columns: Vec<Vec<f64>>,
    rows: usize,
}

impl SimpleReader {
    pub fn new(descriptor: Descriptor, options: ReaderOptions) -> Self {
        Self {
            descriptor,
            options,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn read_file(&self, path: &Path) -> Result<ReadOutput> {
        let text = std::fs::read_to_string(path).map_err(|err| IngestError::io(path, err))?;
        let output = self.read_str(&text)?;
        debug!(
            path = %path.display(),
            datasets = output.datasets.len(),
            "read text data"
        );
        Ok(output)
    }

    /// Read whitespace or comma separated numbers, one row per line.
    ///
    /// `#` starts a comment. Missing or unparsable values become NaN and are
    /// counted in [`ReadOutput::invalid`].
    pub fn read_str(&self, text: &str) -> Result<ReadOutput> {
        let width = self.descriptor.columns().len();
        let mut blocks = vec![new_block(width)];
        let mut invalid: BTreeMap<usize, BTreeMap<String, usize>> = BTreeMap::new();

        for line in text.lines() {
            let content = line.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                let current_has_rows = blocks.last().is_some_and(|block| block.rows > 0);
                if self.options.use_blocks && current_has_rows {
                    blocks.push(new_block(width));
                }
                continue;
            }

            let block_index = blocks.len() - 1;
            let Some(block) = blocks.last_mut() else {
                continue;
            };
            let mut items = content
                .split(|ch: char| ch == ',' || ch.is_whitespace())
                .filter(|item| !item.is_empty());
            for (column, spec) in self.descriptor.columns().iter().enumerate() {
                let value = items.next().and_then(|item| item.parse::<f64>().ok());
                let value = value.unwrap_or_else(|| {
                    *invalid
                        .entry(block_index)
                        .or_default()
                        .entry(spec.dataset.clone())
                        .or_default() += 1;
                    f64::NAN
                });
                block.columns[column].push(value);
            }
            block.rows += 1;
        }

        if blocks.len() > 1 && blocks.last().is_some_and(|block| block.rows == 0) {
            blocks.pop();
        }

        let mut output = ReadOutput::default();
        for (index, block) in blocks.into_iter().enumerate() {
            let suffix = self.options.use_blocks.then(|| format!("_{}", index + 1));
            let mut block_invalid = invalid.remove(&index).unwrap_or_default();
            for (name, columns) in self.assemble(block)? {
                let count = block_invalid.remove(&name);
                let name = match &suffix {
                    Some(suffix) => format!("{name}{suffix}"),
                    None => name,
                };
                if let Some(count) = count {
                    output.invalid.insert(name.clone(), count);
                }
                output.datasets.push((name, columns));
            }
        }
        Ok(output)
    }

    fn assemble(&self, block: Block) -> Result<Vec<(String, Columns)>> {
        let mut parts: BTreeMap<&str, BTreeMap<DatasetPart, Vec<f64>>> = BTreeMap::new();
        for (spec, values) in self.descriptor.columns().iter().zip(block.columns) {
            parts
                .entry(spec.dataset.as_str())
                .or_default()
                .insert(spec.part, values);
        }
        self.descriptor
            .dataset_names()
            .into_iter()
            .map(|name| -> Result<(String, Columns)> {
                let mut dataset = parts.remove(name).unwrap_or_default();
                let columns = Columns::new(
                    dataset.remove(&DatasetPart::Values).unwrap_or_default(),
                    dataset.remove(&DatasetPart::SymErr),
                    dataset.remove(&DatasetPart::NegErr),
                    dataset.remove(&DatasetPart::PosErr),
                )?;
                Ok((name.to_string(), columns))
            })
            .collect()
    }
}

fn new_block(width: usize) -> Block {
    Block {
        columns: vec![Vec::new(); width],
        rows: 0,
    }
}

/// Read `text` with a descriptor string.
pub fn read_string(descriptor: &str, text: &str, options: ReaderOptions) -> Result<ReadOutput> {
    SimpleReader::new(Descriptor::parse(descriptor)?, options).read_str(text)
}
