//! Linkage metadata binding datasets to the external file they were read from.
//!
//! A linkage stores enough to regenerate the import statement verbatim, so a
//! saved document can re-read the file when it is loaded. Linkages are shared
//! between all datasets read by one import (`Rc<Linkage>`) and compared by
//! identity, never by value.

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Options controlling how a 2-D grid is read from a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid2DOptions {
    pub xrange: Option<(f64, f64)>,
    pub yrange: Option<(f64, f64)>,
    pub invert_rows: Option<bool>,
    pub invert_cols: Option<bool>,
    pub transpose: Option<bool>,
}

impl Grid2DOptions {
    pub fn with_xrange(mut self, range: (f64, f64)) -> Self {
        self.xrange = Some(range);
        self
    }

    pub fn with_yrange(mut self, range: (f64, f64)) -> Self {
        self.yrange = Some(range);
        self
    }

    pub fn with_transpose(mut self, transpose: bool) -> Self {
        self.transpose = Some(transpose);
        self
    }
}

/// A plain text file read with a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedFile {
    pub filename: PathBuf,
    pub descriptor: String,
    pub use_blocks: bool,
}

/// A text file holding one or more 2-D grids.
#[derive(Debug, Clone, PartialEq)]
pub struct Linked2DFile {
    pub filename: PathBuf,
    pub datasets: Vec<String>,
    pub options: Grid2DOptions,
}

/// Header-data unit within a FITS file, by position or extension name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HduRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for HduRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HduRef::Index(index) => write!(f, "{index}"),
            HduRef::Name(name) => f.write_str(name),
        }
    }
}

/// Table columns feeding the four parts of a 1-D dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsColumns {
    pub data: Option<String>,
    pub serr: Option<String>,
    pub perr: Option<String>,
    pub nerr: Option<String>,
}

impl FitsColumns {
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.serr.is_none() && self.perr.is_none() && self.nerr.is_none()
    }
}

/// One dataset read from a FITS table or image.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedFitsFile {
    pub dataset: String,
    pub filename: PathBuf,
    pub hdu: HduRef,
    pub columns: FitsColumns,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Linkage {
    File(LinkedFile),
    Grid2D(Linked2DFile),
    Fits(LinkedFitsFile),
}

impl Linkage {
    pub fn filename(&self) -> &PathBuf {
        match self {
            Linkage::File(link) => &link.filename,
            Linkage::Grid2D(link) => &link.filename,
            Linkage::Fits(link) => &link.filename,
        }
    }

    /// Short label for listings.
    pub fn describe(&self) -> String {
        match self {
            Linkage::File(link) => format!("{} ({})", link.filename.display(), link.descriptor),
            Linkage::Grid2D(link) => format!("{} (2D)", link.filename.display()),
            Linkage::Fits(link) => format!("{} [HDU {}]", link.filename.display(), link.hdu),
        }
    }
}

impl From<LinkedFile> for Linkage {
    fn from(link: LinkedFile) -> Self {
        Linkage::File(link)
    }
}

impl From<Linked2DFile> for Linkage {
    fn from(link: Linked2DFile) -> Self {
        Linkage::Grid2D(link)
    }
}

impl From<LinkedFitsFile> for Linkage {
    fn from(link: LinkedFitsFile) -> Self {
        Linkage::Fits(link)
    }
}

/// Identity comparison for optional shared links.
pub fn same_link(left: Option<&Rc<Linkage>>, right: &Rc<Linkage>) -> bool {
    left.is_some_and(|link| Rc::ptr_eq(link, right))
}
