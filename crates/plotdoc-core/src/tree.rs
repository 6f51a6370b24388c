//! The widget tree: pages, graphs, axes and plotters.
//!
//! Nodes live in an arena indexed by [`WidgetId`]. Parents own their children
//! through the child list; each node refers back to its parent by id only.
//! Ids are never reused, so an id held after its widget was removed simply
//! fails to resolve.

use std::fmt;
use std::str::FromStr;

use crate::error::{DocumentError, Result};
use crate::settings::{SettingPath, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(usize);

impl WidgetId {
    pub const ROOT: WidgetId = WidgetId(0);
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Root,
    Page,
    Grid,
    Graph,
    Axis,
    Xy,
    Function,
    Key,
    Label,
    Image,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 10] = [
        WidgetKind::Root,
        WidgetKind::Page,
        WidgetKind::Grid,
        WidgetKind::Graph,
        WidgetKind::Axis,
        WidgetKind::Xy,
        WidgetKind::Function,
        WidgetKind::Key,
        WidgetKind::Label,
        WidgetKind::Image,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            WidgetKind::Root => "root",
            WidgetKind::Page => "page",
            WidgetKind::Grid => "grid",
            WidgetKind::Graph => "graph",
            WidgetKind::Axis => "axis",
            WidgetKind::Xy => "xy",
            WidgetKind::Function => "function",
            WidgetKind::Key => "key",
            WidgetKind::Label => "label",
            WidgetKind::Image => "image",
        }
    }

    pub fn allows_child(self, child: WidgetKind) -> bool {
        use WidgetKind as K;
        match self {
            K::Root => child == K::Page,
            K::Page => matches!(child, K::Graph | K::Grid | K::Label),
            K::Grid => matches!(child, K::Graph | K::Axis),
            K::Graph => matches!(
                child,
                K::Axis | K::Xy | K::Function | K::Key | K::Label | K::Image
            ),
            K::Axis | K::Xy | K::Function | K::Key | K::Label | K::Image => false,
        }
    }

    pub fn default_settings(self) -> Settings {
        let line = || {
            Settings::new()
                .with("color", "black")
                .with("width", "0.5pt")
                .with("hide", false)
        };
        match self {
            WidgetKind::Root => Settings::new().with("width", "15cm").with("height", "15cm"),
            WidgetKind::Page => Settings::new(),
            WidgetKind::Grid => Settings::new()
                .with("rows", 2i64)
                .with("columns", 2i64)
                .with("leftMargin", "1.7cm")
                .with("bottomMargin", "1.7cm"),
            WidgetKind::Graph => Settings::new()
                .with("leftMargin", "1.7cm")
                .with("rightMargin", "0.1cm")
                .with("topMargin", "0.1cm")
                .with("bottomMargin", "1.7cm")
                .with_group(
                    "Background",
                    Settings::new().with("color", "white").with("hide", false),
                )
                .with_group("Border", line()),
            WidgetKind::Axis => Settings::new()
                .with("label", "")
                .with("min", "Auto")
                .with("max", "Auto")
                .with("log", false)
                .with("direction", "horizontal")
                .with("lowerPosition", 0.0)
                .with("upperPosition", 1.0)
                .with_group("Line", line())
                .with_group("Label", Settings::new().with("size", "14pt").with("italic", false)),
            WidgetKind::Xy => Settings::new()
                .with("xData", "x")
                .with("yData", "y")
                .with("marker", "circle")
                .with("markerSize", "3pt")
                .with("key", "")
                .with_group("PlotLine", line())
                .with_group("ErrorBarLine", line()),
            WidgetKind::Function => Settings::new()
                .with("function", "x")
                .with("variable", "x")
                .with("steps", 50i64)
                .with("key", "")
                .with_group("Line", line()),
            WidgetKind::Key => Settings::new()
                .with("horzPosn", "right")
                .with("vertPosn", "top")
                .with("hide", false),
            WidgetKind::Label => Settings::new()
                .with("label", "")
                .with("xPos", 0.5)
                .with("yPos", 0.5)
                .with("angle", 0.0)
                .with_group("Text", Settings::new().with("size", "14pt").with("color", "black")),
            WidgetKind::Image => Settings::new()
                .with("data", "")
                .with("colorMap", "grey")
                .with("min", "Auto")
                .with("max", "Auto"),
        }
    }

    /// One-line description of a widget built from its settings.
    pub fn describe(self, settings: &Settings) -> String {
        match self {
            WidgetKind::Root => "Main document".to_string(),
            WidgetKind::Page => "Blank page".to_string(),
            WidgetKind::Grid => format!(
                "{}x{} grid",
                settings.text("rows"),
                settings.text("columns")
            ),
            WidgetKind::Graph => "Base graph".to_string(),
            WidgetKind::Axis => format!(
                "{} axis, range {} to {}",
                settings.text("direction"),
                settings.text("min"),
                settings.text("max")
            ),
            WidgetKind::Xy => format!(
                "x='{}', y='{}', marker='{}'",
                settings.text("xData"),
                settings.text("yData"),
                settings.text("marker")
            ),
            WidgetKind::Function => format!(
                "{} = {}",
                if settings.text("variable") == "y" { "x" } else { "y" },
                settings.text("function")
            ),
            WidgetKind::Key => "Plot key".to_string(),
            WidgetKind::Label => format!("'{}'", settings.text("label")),
            WidgetKind::Image => format!("image of '{}'", settings.text("data")),
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for WidgetKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self> {
        WidgetKind::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| DocumentError::UnknownWidgetType(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct WidgetNode {
    pub id: WidgetId,
    pub name: String,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    pub kind: WidgetKind,
    pub settings: Settings,
}

impl WidgetNode {
    pub fn description(&self) -> String {
        self.kind.describe(&self.settings)
    }
}

#[derive(Debug, Clone)]
pub struct WidgetTree {
    nodes: Vec<Option<WidgetNode>>,
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetTree {
    pub fn new() -> Self {
        let root = WidgetNode {
            id: WidgetId::ROOT,
            name: String::new(),
            parent: None,
            children: Vec::new(),
            kind: WidgetKind::Root,
            settings: WidgetKind::Root.default_settings(),
        };
        Self {
            nodes: vec![Some(root)],
        }
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node(&self, id: WidgetId) -> Result<&WidgetNode> {
        self.get(id).ok_or(DocumentError::WidgetNotFound(id))
    }

    pub fn node_mut(&mut self, id: WidgetId) -> Result<&mut WidgetNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(DocumentError::WidgetNotFound(id))
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.get(id).is_some()
    }

    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn child_by_name(&self, id: WidgetId, name: &str) -> Option<WidgetId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|node| node.name == name))
    }

    /// Add a widget under `parent`.
    ///
    /// Without a name one is generated as `<type><n>` with the lowest free
    /// `n >= 1`. With `autoadd`, a graph gets `x` and `y` axes.
    pub fn add(
        &mut self,
        parent: WidgetId,
        kind: WidgetKind,
        name: Option<&str>,
        autoadd: bool,
    ) -> Result<WidgetId> {
        let parent_kind = self.node(parent)?.kind;
        if !parent_kind.allows_child(kind) {
            return Err(DocumentError::InvalidChild {
                parent: parent_kind.type_name(),
                child: kind.type_name(),
            });
        }
        let name = match name {
            Some(name) if !is_valid_name(name) => {
                return Err(DocumentError::InvalidWidgetName(name.to_string()));
            }
            Some(name) if self.child_by_name(parent, name).is_some() => {
                return Err(DocumentError::collision(name));
            }
            Some(name) => name.to_string(),
            None => self.auto_name(parent, kind),
        };

        let id = WidgetId(self.nodes.len());
        self.nodes.push(Some(WidgetNode {
            id,
            name,
            parent: Some(parent),
            children: Vec::new(),
            kind,
            settings: kind.default_settings(),
        }));
        self.node_mut(parent)?.children.push(id);

        if autoadd && kind == WidgetKind::Graph {
            let direction: SettingPath = "direction".parse()?;
            for (axis, value) in [("x", "horizontal"), ("y", "vertical")] {
                let axis = self.add(id, WidgetKind::Axis, Some(axis), false)?;
                self.node_mut(axis)?
                    .settings
                    .set(&direction, value.into())?;
            }
        }
        Ok(id)
    }

    fn auto_name(&self, parent: WidgetId, kind: WidgetKind) -> String {
        (1..)
            .map(|n| format!("{}{n}", kind.type_name()))
            .find(|name| self.child_by_name(parent, name).is_none())
            .unwrap_or_default()
    }

    /// Remove a widget and its whole subtree.
    pub fn remove(&mut self, id: WidgetId) -> Result<()> {
        let parent = self.node(id)?.parent.ok_or(DocumentError::RemoveRoot)?;
        self.node_mut(parent)?.children.retain(|child| *child != id);
        for node in self.descendants(id) {
            if let Some(slot) = self.nodes.get_mut(node.0) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// `id` and everything below it, parents before children.
    pub fn descendants(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !self.contains(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` is `id` or lies on its path to the root.
    pub fn is_ancestor(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.get(node).and_then(|node| node.parent);
        }
        false
    }

    /// Absolute path such as `/page1/graph1/x`; the root is `/`.
    pub fn path_of(&self, id: WidgetId) -> String {
        let mut names = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            if node.parent.is_none() {
                break;
            }
            names.push(node.name.as_str());
            current = node.parent.and_then(|parent| self.get(parent));
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Number of pages (children of the root).
    pub fn page_count(&self) -> usize {
        self.children(WidgetId::ROOT).len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(WidgetId::ROOT).is_empty()
    }
}

/// Names a path can address: not empty, not `.` or `..`, no `/`.
fn is_valid_name(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains('/')
}
