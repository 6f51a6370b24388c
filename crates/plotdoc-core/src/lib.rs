//! The plotdoc document engine.
//!
//! A [`Document`] holds named datasets and a tree of widgets. It tracks a
//! changeset counter that every mutation bumps, evaluates expression datasets
//! lazily against it, re-reads linked files on request, and saves itself as a
//! script that rebuilds the same state when replayed.
//!
//! - [`tree`], [`settings`], [`path`]: widgets, typed settings, path lookup.
//! - [`import`], [`reload`]: reading data files and refreshing linked data.
//! - [`save`], [`script`]: writing and loading saved documents.
//! - [`command`]: the current-widget command surface used by scripts.
//! - [`export`]: page painting and file export.

pub mod command;
pub mod document;
pub mod error;
pub mod events;
pub mod export;
pub mod expression;
pub mod import;
pub mod options;
pub mod path;
pub mod propagate;
pub mod reload;
pub mod save;
pub mod script;
pub mod settings;
pub mod tree;

pub use command::{CommandInterface, WidgetListing};
pub use document::{DatasetSummary, Document};
pub use error::{DocumentError, PathError, Result};
pub use events::{DocumentEvent, ObserverId};
pub use export::{
    ColorMode, ExportError, ExportFormat, Ghostscript, PageSize, Painter, Rasterizer, Rect,
    VectorBackend, VectorFormat, parse_length,
};
pub use import::ImportSummary;
pub use options::{ExportOptions, LoadOptions, SaveOptions};
pub use reload::ReloadSummary;
pub use script::ScriptError;
pub use settings::{SettingPath, SettingValue, Settings};
pub use tree::{WidgetId, WidgetKind, WidgetNode, WidgetTree};
