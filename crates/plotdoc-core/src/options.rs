//! Options for loading, saving and exporting documents.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use plotdoc_ingest::FitsSource;

/// Options for replaying a saved document.
#[derive(Clone, Default)]
pub struct LoadOptions {
    /// Directory that relative file names in import statements resolve against.
    pub base_dir: Option<PathBuf>,
    /// Reader used for `ImportFITSFile` statements.
    pub fits_source: Option<Rc<dyn FitsSource>>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_fits_source(mut self, source: Rc<dyn FitsSource>) -> Self {
        self.fits_source = Some(source);
        self
    }

    /// Resolve a file name from a script against [`Self::base_dir`].
    pub fn resolve(&self, filename: &str) -> PathBuf {
        let path = Path::new(filename);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("base_dir", &self.base_dir)
            .field("fits_source", &self.fits_source.is_some())
            .finish()
    }
}

/// Options for the header written at the top of a saved document.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Written as `# User:`; defaults to `LOGNAME`.
    pub user: Option<String>,
    /// Write the `# Date:` line.
    pub include_date: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            user: std::env::var("LOGNAME").ok(),
            include_date: true,
        }
    }
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn with_date(mut self, include_date: bool) -> Self {
        self.include_date = include_date;
        self
    }
}

/// Settings for raster export through an external converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Ghostscript executable.
    pub ghostscript: String,
    /// Ghostscript output device for PNG files.
    pub raster_device: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            ghostscript: "gs".to_string(),
            raster_device: "pngalpha".to_string(),
        }
    }
}

impl ExportOptions {
    pub fn with_ghostscript(mut self, command: impl Into<String>) -> Self {
        self.ghostscript = command.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_names_resolve_against_base() {
        let options = LoadOptions::new().with_base_dir("/data/run1");
        assert_eq!(options.resolve("a.dat"), PathBuf::from("/data/run1/a.dat"));
        assert_eq!(options.resolve("/tmp/b.dat"), PathBuf::from("/tmp/b.dat"));
        assert_eq!(LoadOptions::new().resolve("a.dat"), PathBuf::from("a.dat"));
    }

    #[test]
    fn test_save_options_builders() {
        let options = SaveOptions::new().with_user(None).with_date(false);
        assert!(options.user.is_none());
        assert!(!options.include_date);
    }
}
