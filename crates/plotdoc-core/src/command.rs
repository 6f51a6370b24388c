//! Command interface for scripts and interactive sessions.
//!
//! Commands address widgets relative to a current widget, the way a shell
//! addresses files relative to its working directory. Every command is a
//! thin wrapper over a [`Document`] operation.

use std::cell::Cell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use serde::Serialize;
use tracing::info;

use plotdoc_model::{Columns, ExpressionParts, FitsColumns, Grid2DOptions, HduRef};

use crate::document::Document;
use crate::error::Result;
use crate::events::{DocumentEvent, ObserverId};
use crate::export::{ColorMode, Painter, Rasterizer, VectorBackend};
use crate::import::ImportSummary;
use crate::options::SaveOptions;
use crate::path;
use crate::reload::ReloadSummary;
use crate::settings::SettingValue;
use crate::tree::{WidgetId, WidgetKind};

/// One child in a [`CommandInterface::list`] result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetListing {
    pub name: String,
    pub kind: String,
    pub description: String,
}

#[derive(Debug)]
pub struct CommandInterface {
    document: Document,
    current: Rc<Cell<WidgetId>>,
    observer: ObserverId,
    verbose: bool,
}

impl CommandInterface {
    pub fn new(mut document: Document) -> Self {
        let current = Rc::new(Cell::new(WidgetId::ROOT));
        let shared = Rc::clone(&current);
        let observer = document.subscribe(move |event| {
            if *event == DocumentEvent::Wiped {
                shared.set(WidgetId::ROOT);
            }
        });
        Self {
            document,
            current,
            observer,
            verbose: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Give the document back, detached from this interface.
    pub fn into_document(self) -> Document {
        let Self {
            mut document,
            observer,
            ..
        } = self;
        document.unsubscribe(observer);
        document
    }

    pub fn current(&self) -> WidgetId {
        self.current.get()
    }

    pub fn current_path(&self) -> String {
        self.document.tree().path_of(self.current())
    }

    /// Log each command at info level.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn log(&self, command: &str, detail: impl fmt::Display) {
        if self.verbose {
            info!(command, %detail, "command");
        }
    }

    fn resolve(&self, path: &str) -> Result<WidgetId> {
        self.document.resolve(self.current(), path)
    }

    // ========================================================================
    // Widgets
    // ========================================================================

    /// Add a widget of type `kind` under the current widget and return its
    /// name.
    pub fn add(&mut self, kind: &str, name: Option<&str>, autoadd: bool) -> Result<String> {
        self.log("Add", kind);
        let kind: WidgetKind = kind.parse()?;
        let id = self
            .document
            .add_widget(self.current(), kind, name, autoadd)?;
        Ok(self.document.tree().node(id)?.name.clone())
    }

    /// Remove a widget. If the current widget is removed with it, the
    /// removed widget's parent becomes current.
    pub fn remove(&mut self, path: &str) -> Result<()> {
        self.log("Remove", path);
        let id = self.resolve(path)?;
        let parent = self.document.tree().node(id)?.parent;
        let moves_current = self.document.tree().is_ancestor(id, self.current());
        self.document.remove_widget(id)?;
        if moves_current && let Some(parent) = parent {
            self.current.set(parent);
        }
        Ok(())
    }

    /// Change the current widget.
    pub fn to(&mut self, path: &str) -> Result<()> {
        self.log("To", path);
        let id = self.resolve(path)?;
        self.current.set(id);
        Ok(())
    }

    /// Children of the widget at `path` (the current widget by default).
    pub fn list(&self, path: Option<&str>) -> Result<Vec<WidgetListing>> {
        let id = self.resolve(path.unwrap_or("."))?;
        let tree = self.document.tree();
        tree.children(id)
            .iter()
            .map(|child| {
                let node = tree.node(*child)?;
                Ok(WidgetListing {
                    name: node.name.clone(),
                    kind: node.kind.type_name().to_string(),
                    description: node.description(),
                })
            })
            .collect()
    }

    /// Names of the children of the widget at `path`.
    pub fn get_children(&self, path: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .list(path)?
            .into_iter()
            .map(|listing| listing.name)
            .collect())
    }

    /// Value of a setting addressed as `widget/path/setting`.
    pub fn get(&self, path: &str) -> Result<SettingValue> {
        let (id, setting) = path::resolve_setting(self.document.tree(), self.current(), path)?;
        Ok(self.document.setting(id, &setting)?.clone())
    }

    pub fn set(&mut self, path: &str, value: SettingValue) -> Result<()> {
        self.log("Set", format_args!("{path} = {value}"));
        let (id, setting) = path::resolve_setting(self.document.tree(), self.current(), path)?;
        self.document.set_setting(id, &setting, value)
    }

    /// Copy a setting of the current widget (or one addressed from it) to
    /// similar widgets below `root`.
    pub fn propagate(
        &mut self,
        setting: &str,
        widget_name: Option<&str>,
        root: Option<&str>,
        max_depth: Option<usize>,
    ) -> Result<usize> {
        self.log("Propagate", setting);
        let (origin, setting) =
            path::resolve_setting(self.document.tree(), self.current(), setting)?;
        let root = root.map(|root| self.resolve(root)).transpose()?;
        self.document
            .propagate_settings(origin, &setting, widget_name, root, max_depth)
    }

    // ========================================================================
    // Datasets
    // ========================================================================

    pub fn get_datasets(&self) -> Vec<String> {
        self.document.dataset_names()
    }

    pub fn set_data(
        &mut self,
        name: &str,
        data: Vec<f64>,
        serr: Option<Vec<f64>>,
        nerr: Option<Vec<f64>>,
        perr: Option<Vec<f64>>,
    ) -> Result<()> {
        self.log("SetData", name);
        self.document.set_data(name, data, serr, nerr, perr)
    }

    /// A copy of a 1-D dataset's values and errors.
    pub fn get_data(&self, name: &str) -> Result<Columns> {
        Ok(self.document.columns(name)?.as_ref().clone())
    }

    pub fn set_data_expression(&mut self, name: &str, parts: ExpressionParts) {
        self.log("SetDataExpression", name);
        self.document.set_data_expression(name, parts);
    }

    pub fn import_string(&mut self, descriptor: &str, text: &str) -> Result<ImportSummary> {
        self.log("ImportString", descriptor);
        self.document.import_string(descriptor, text)
    }

    pub fn import_string_2d(&mut self, datasets: &[String], text: &str) -> Result<()> {
        self.log("ImportString2D", datasets.join(", "));
        self.document.import_strings_2d(datasets, text)
    }

    pub fn import_file(
        &mut self,
        path: &Path,
        descriptor: &str,
        linked: bool,
        use_blocks: bool,
    ) -> Result<ImportSummary> {
        self.log("ImportFile", path.display());
        self.document
            .import_file(path, descriptor, linked, use_blocks)
    }

    pub fn import_file_2d(
        &mut self,
        path: &Path,
        datasets: &[String],
        options: &Grid2DOptions,
        linked: bool,
    ) -> Result<Vec<String>> {
        self.log("ImportFile2D", path.display());
        self.document.import_2d(path, datasets, options, linked)
    }

    pub fn import_fits(
        &mut self,
        dataset: &str,
        path: &Path,
        hdu: HduRef,
        columns: FitsColumns,
        linked: bool,
    ) -> Result<()> {
        self.log("ImportFITSFile", path.display());
        self.document
            .import_fits(dataset, path, hdu, columns, linked)
    }

    pub fn reload_links(&mut self) -> ReloadSummary {
        self.log("ReloadData", "");
        self.document.reload_linked_datasets()
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn save(&mut self, path: &Path, options: &SaveOptions) -> Result<()> {
        self.log("Save", path.display());
        self.document.save_to_file(path, options)
    }

    pub fn export(
        &self,
        path: &Path,
        page: usize,
        color: ColorMode,
        backend: &mut dyn VectorBackend,
        rasterizer: &dyn Rasterizer,
    ) -> Result<()> {
        self.log("Export", path.display());
        self.document
            .export(path, page, color, backend, rasterizer)
    }

    /// Paint every page to `painter`.
    pub fn print(&self, painter: &mut dyn Painter) -> Result<()> {
        self.log("Print", "");
        let pages: Vec<usize> = (0..self.document.tree().page_count()).collect();
        self.document.print_to(painter, &pages)
    }

    pub fn wipe(&mut self) {
        self.log("Wipe", "");
        self.document.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;

    fn interface() -> CommandInterface {
        let mut ci = CommandInterface::new(Document::new());
        ci.add("page", None, true).unwrap();
        ci.to("page1").unwrap();
        ci.add("graph", None, true).unwrap();
        ci.to("graph1").unwrap();
        ci
    }

    #[test]
    fn test_add_and_navigate() {
        let ci = interface();
        assert_eq!(ci.current_path(), "/page1/graph1");
        assert_eq!(ci.get_children(None).unwrap(), vec!["x", "y"]);
        let listing = ci.list(Some("..")).unwrap();
        assert_eq!(listing[0].kind, "graph");
        assert_eq!(listing[0].description, "Base graph");
    }

    #[test]
    fn test_get_and_set_relative_to_current() {
        let mut ci = interface();
        ci.set("x/label", "time".into()).unwrap();
        assert_eq!(ci.get("x/label").unwrap(), SettingValue::from("time"));
        assert_eq!(
            ci.get("/page1/graph1/x/label").unwrap(),
            SettingValue::from("time")
        );
        assert!(matches!(
            ci.get("x/nothing"),
            Err(DocumentError::SettingNotFound { .. })
        ));
    }

    #[test]
    fn test_removing_current_moves_to_parent() {
        let mut ci = interface();
        ci.to("x").unwrap();
        ci.remove("/page1/graph1").unwrap();
        assert_eq!(ci.current_path(), "/page1");

        ci.add("graph", Some("g"), false).unwrap();
        ci.remove("g").unwrap();
        assert_eq!(ci.current_path(), "/page1");
    }

    #[test]
    fn test_wipe_resets_current() {
        let mut ci = interface();
        ci.document_mut().wipe();
        assert_eq!(ci.current(), WidgetId::ROOT);
        let doc = ci.into_document();
        assert!(doc.is_blank());
    }

    #[test]
    fn test_get_data_is_a_copy() {
        let mut ci = interface();
        ci.set_data("a", vec![1.0, 2.0], None, None, None).unwrap();
        let mut copy = ci.get_data("a").unwrap();
        copy.data[0] = 99.0;
        assert_eq!(ci.get_data("a").unwrap().data, vec![1.0, 2.0]);
        assert_eq!(ci.get_datasets(), vec!["a"]);

        ci.set_data_expression("b", ExpressionParts::values("a * 10"));
        let mut derived = ci.get_data("b").unwrap();
        derived.data.clear();
        assert_eq!(ci.get_data("b").unwrap().data, vec![10.0, 20.0]);
    }

    #[test]
    fn test_propagate_from_current() {
        let mut ci = interface();
        ci.to("/page1").unwrap();
        ci.add("graph", None, true).unwrap();
        ci.to("graph1").unwrap();
        ci.set("x/log", true.into()).unwrap();
        let count = ci.propagate("x/log", None, Some("/"), None).unwrap();
        assert_eq!(count, 4);
        assert_eq!(ci.get("/page1/graph2/y/log").unwrap(), SettingValue::Bool(true));
    }
}
