//! Painting pages and exporting them to files.
//!
//! Drawing itself happens in a [`Painter`] supplied by the caller; this module
//! only walks the widget tree, lays out bounds and picks the output route by
//! file extension. PNG files are produced by painting an EPS file next to the
//! output and handing it to a [`Rasterizer`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

use crate::document::Document;
use crate::error::Result;
use crate::options::ExportOptions;
use crate::settings::Settings;
use crate::tree::{WidgetId, WidgetNode};

const DEFAULT_PAGE_SIDE: f64 = 15.0 * POINTS_PER_CM;
const POINTS_PER_INCH: f64 = 72.0;
const POINTS_PER_CM: f64 = POINTS_PER_INCH / 2.54;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format '{extension}'")]
    UnsupportedFormat { extension: String },
    #[error("output directory {} does not exist", path.display())]
    MissingDirectory { path: PathBuf },
    #[error("converter '{command}' could not be found")]
    ConverterMissing { command: String },
    #[error("converter failed: {message}")]
    Converter { message: String },
    #[error("page {page} does not exist (document has {pages} pages)")]
    PageOutOfRange { page: usize, pages: usize },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("painting failed: {0}")]
    Backend(String),
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn from_size(size: PageSize) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
        }
    }

    /// Shrink by margins, never below zero size.
    pub fn inset(self, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - right).max(0.0),
            height: (self.height - top - bottom).max(0.0),
        }
    }
}

/// Parse a length such as `15cm`, `4.5in`, `10mm` or `12pt` into points.
/// A bare number is taken as points.
pub fn parse_length(text: &str) -> Option<f64> {
    let text = text.trim();
    let split = text
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let number: f64 = number.trim().parse().ok()?;
    let scale = match unit.trim() {
        "" | "pt" => 1.0,
        "cm" => POINTS_PER_CM,
        "mm" => POINTS_PER_CM / 10.0,
        "in" | "inch" => POINTS_PER_INCH,
        _ => return None,
    };
    Some(number * scale)
}

fn length_setting(settings: &Settings, name: &str) -> Option<f64> {
    parse_length(&settings.text(name))
}

// ============================================================================
// Backends
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Color,
    Grayscale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    Eps,
    Ps,
    Pdf,
    Svg,
}

impl fmt::Display for VectorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VectorFormat::Eps => "eps",
            VectorFormat::Ps => "ps",
            VectorFormat::Pdf => "pdf",
            VectorFormat::Svg => "svg",
        })
    }
}

/// Where a file extension sends an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Vector(VectorFormat),
    Png,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> std::result::Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "eps" => Ok(Self::Vector(VectorFormat::Eps)),
            "ps" => Ok(Self::Vector(VectorFormat::Ps)),
            "pdf" => Ok(Self::Vector(VectorFormat::Pdf)),
            "svg" => Ok(Self::Vector(VectorFormat::Svg)),
            "png" => Ok(Self::Png),
            _ => Err(ExportError::UnsupportedFormat { extension }),
        }
    }
}

/// Receives the widgets of one or more pages, parents before children.
pub trait Painter {
    fn begin(&mut self, size: PageSize) -> std::result::Result<(), ExportError>;
    fn draw(&mut self, node: &WidgetNode, bounds: Rect) -> std::result::Result<(), ExportError>;
    fn new_page(&mut self) -> std::result::Result<(), ExportError>;
    fn finish(&mut self) -> std::result::Result<(), ExportError>;
}

/// Creates painters that write vector files.
pub trait VectorBackend {
    fn painter(
        &mut self,
        path: &Path,
        format: VectorFormat,
        color: ColorMode,
    ) -> std::result::Result<Box<dyn Painter + '_>, ExportError>;
}

/// Turns an EPS file into a raster image.
pub trait Rasterizer {
    fn rasterize(&self, eps: &Path, output: &Path) -> std::result::Result<(), ExportError>;
}

/// Rasterizes through the Ghostscript command line tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ghostscript {
    pub command: String,
    pub device: String,
}

impl Ghostscript {
    pub fn new(options: &ExportOptions) -> Self {
        Self {
            command: options.ghostscript.clone(),
            device: options.raster_device.clone(),
        }
    }
}

impl Default for Ghostscript {
    fn default() -> Self {
        Self::new(&ExportOptions::default())
    }
}

impl Rasterizer for Ghostscript {
    fn rasterize(&self, eps: &Path, output: &Path) -> std::result::Result<(), ExportError> {
        debug!(command = %self.command, eps = %eps.display(), "running converter");
        let result = Command::new(&self.command)
            .arg(format!("-sDEVICE={}", self.device))
            .args(["-dEPSCrop", "-dBATCH", "-dNOPAUSE"])
            .arg(format!("-sOutputFile={}", output.display()))
            .arg(eps)
            .output()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => ExportError::ConverterMissing {
                    command: self.command.clone(),
                },
                _ => ExportError::io(eps, err),
            })?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        if !stderr.trim().is_empty() {
            return Err(ExportError::Converter {
                message: stderr.trim().to_string(),
            });
        }
        if !result.status.success() {
            return Err(ExportError::Converter {
                message: format!("{} exited with {}", self.command, result.status),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Document painting
// ============================================================================

impl Document {
    /// Size of every page, from the root's `width` and `height` settings.
    pub fn page_size(&self) -> PageSize {
        let settings = self.tree.get(WidgetId::ROOT).map(|root| &root.settings);
        let side = |name: &str| {
            settings
                .and_then(|settings| length_setting(settings, name))
                .unwrap_or(DEFAULT_PAGE_SIDE)
        };
        PageSize {
            width: side("width"),
            height: side("height"),
        }
    }

    /// Id of page number `page`, counting from zero.
    pub fn page(&self, page: usize) -> std::result::Result<WidgetId, ExportError> {
        let pages = self.tree.children(WidgetId::ROOT);
        pages
            .get(page)
            .copied()
            .ok_or(ExportError::PageOutOfRange {
                page,
                pages: pages.len(),
            })
    }

    /// Draw one page into a painter that has already begun.
    pub fn paint_to(&self, painter: &mut dyn Painter, page: usize) -> Result<()> {
        let page = self.page(page)?;
        let mut stack = vec![(page, Rect::from_size(self.page_size()))];
        while let Some((id, outer)) = stack.pop() {
            let node = self.tree.node(id)?;
            let settings = &node.settings;
            let margin = |name: &str| length_setting(settings, name).unwrap_or(0.0);
            let bounds = outer.inset(
                margin("leftMargin"),
                margin("topMargin"),
                margin("rightMargin"),
                margin("bottomMargin"),
            );
            painter.draw(node, bounds)?;
            stack.extend(node.children.iter().rev().map(|child| (*child, bounds)));
        }
        Ok(())
    }

    /// Draw several pages as one output, separated by page breaks.
    pub fn print_to(&self, painter: &mut dyn Painter, pages: &[usize]) -> Result<()> {
        painter.begin(self.page_size())?;
        for (index, page) in pages.iter().enumerate() {
            if index > 0 {
                painter.new_page()?;
            }
            self.paint_to(painter, *page)?;
        }
        painter.finish()?;
        Ok(())
    }

    /// Write page `page` to `path`, choosing the format from its extension.
    pub fn export(
        &self,
        path: &Path,
        page: usize,
        color: ColorMode,
        backend: &mut dyn VectorBackend,
        rasterizer: &dyn Rasterizer,
    ) -> Result<()> {
        let format = ExportFormat::from_path(path)?;
        self.page(page)?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        if !dir.is_dir() {
            return Err(ExportError::MissingDirectory {
                path: dir.to_path_buf(),
            }
            .into());
        }

        match format {
            ExportFormat::Vector(vector) => {
                let mut painter = backend.painter(path, vector, color)?;
                self.print_to(painter.as_mut(), &[page])?;
            }
            ExportFormat::Png => {
                let eps = tempfile::Builder::new()
                    .prefix("tmp_")
                    .suffix(".eps")
                    .tempfile_in(dir)
                    .map_err(|err| ExportError::io(dir, err))?;
                {
                    let mut painter = backend.painter(eps.path(), VectorFormat::Eps, color)?;
                    self.print_to(painter.as_mut(), &[page])?;
                }
                rasterizer.rasterize(eps.path(), path)?;
                let eps_path = eps.path().to_path_buf();
                eps.close().map_err(|err| ExportError::io(eps_path, err))?;
            }
        }
        info!(path = %path.display(), page, ?format, "exported page");
        Ok(())
    }
}
