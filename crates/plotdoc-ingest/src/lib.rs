//! Data import for plotdoc documents.
//!
//! - [`simple`]: whitespace/comma separated columns described by a
//!   [`Descriptor`] such as `x,+- y`.
//! - [`grid`]: 2-D grids in text blocks with optional range headers.
//! - [`fits`]: the [`FitsSource`] contract and dataset construction from HDUs.

pub mod descriptor;
pub mod error;
pub mod fits;
pub mod grid;
pub mod simple;

pub use descriptor::{Descriptor, DescriptorColumn, descriptor_for};
pub use error::{IngestError, Result};
pub use fits::{FitsSource, HduContents, build_dataset, read_fits, wcs_ranges};
pub use grid::{read_grid_file, read_grid_string, read_grids};
pub use simple::{ReadOutput, ReaderOptions, SimpleReader, read_string};
