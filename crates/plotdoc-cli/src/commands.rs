//! Subcommand implementations. Each returns data; printing lives in `summary`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use plotdoc_core::{DatasetSummary, Document, LoadOptions, SaveOptions, WidgetId};
use plotdoc_model::Dataset;

use crate::types::{DatasetDump, ReloadResult, TreeEntry};

/// Load a saved document, resolving its relative file names against its directory.
pub fn load(path: &Path) -> Result<Document> {
    Document::load_file(path, &LoadOptions::new())
        .with_context(|| format!("failed to load {}", path.display()))
}

pub fn datasets(path: &Path) -> Result<Vec<DatasetSummary>> {
    Ok(load(path)?.dataset_summaries())
}

/// Every widget at and below `start`, parents first.
pub fn tree(path: &Path, start: &str) -> Result<Vec<TreeEntry>> {
    let doc = load(path)?;
    let origin = doc
        .resolve(WidgetId::ROOT, start)
        .with_context(|| format!("no widget at {start}"))?;
    let tree = doc.tree();
    let mut entries = Vec::new();
    for id in tree.descendants(origin) {
        let node = tree.node(id)?;
        let mut depth = 0;
        let mut current = id;
        while current != origin {
            current = tree
                .node(current)?
                .parent
                .context("widget detached from its tree")?;
            depth += 1;
        }
        entries.push(TreeEntry {
            path: tree.path_of(id),
            name: node.name.clone(),
            kind: node.kind.type_name().to_string(),
            description: node.description(),
            depth,
        });
    }
    Ok(entries)
}

pub fn get(path: &Path, name: &str) -> Result<DatasetDump> {
    let doc = load(path)?;
    let dataset = doc
        .dataset(name)
        .with_context(|| format!("no dataset named {name}"))?;
    if let Dataset::Grid2D(grid) = dataset {
        return Ok(DatasetDump::Grid {
            xrange: grid.xrange,
            yrange: grid.yrange,
            rows: grid.grid.rows().map(<[f64]>::to_vec).collect(),
        });
    }
    let columns = doc
        .columns(name)
        .with_context(|| format!("failed to evaluate {name}"))?;
    Ok(DatasetDump::Values(columns.as_ref().clone()))
}

/// Re-read linked files and save the document to `output`, or over itself.
pub fn reload(path: &Path, output: Option<&Path>, options: &SaveOptions) -> Result<ReloadResult> {
    let mut doc = load(path)?;
    let summary = doc.reload_linked_datasets();
    let target: PathBuf = output.unwrap_or(path).to_path_buf();
    doc.save_to_file(&target, options)
        .with_context(|| format!("failed to save {}", target.display()))?;
    info!(
        read = summary.read.len(),
        failed = summary.errors.len(),
        output = %target.display(),
        "reloaded linked datasets"
    );
    Ok(ReloadResult {
        summary,
        saved_to: target,
    })
}

pub fn resave(path: &Path, output: &Path, options: &SaveOptions) -> Result<()> {
    let mut doc = load(path)?;
    doc.save_to_file(output, options)
        .with_context(|| format!("failed to save {}", output.display()))
}
