//! Unix-style widget paths (`/page1/graph1/x`, `../y`).

use crate::error::{DocumentError, PathError, Result};
use crate::settings::SettingPath;
use crate::tree::{WidgetId, WidgetTree};

/// Resolve `path` starting from `origin`, or from the root when it begins
/// with `/`.
///
/// `..` moves to the parent, `.` and empty segments stay put, and any other
/// segment must name a child of the current widget.
pub fn resolve(
    tree: &WidgetTree,
    origin: WidgetId,
    path: &str,
) -> std::result::Result<WidgetId, PathError> {
    let mut current = if path.starts_with('/') {
        WidgetId::ROOT
    } else {
        origin
    };
    for segment in path.split('/') {
        current = step(tree, current, segment)?;
    }
    Ok(current)
}

fn step(
    tree: &WidgetTree,
    current: WidgetId,
    segment: &str,
) -> std::result::Result<WidgetId, PathError> {
    match segment {
        "" | "." => Ok(current),
        ".." => tree
            .get(current)
            .and_then(|node| node.parent)
            .ok_or(PathError::NoParent),
        name => tree
            .child_by_name(current, name)
            .ok_or_else(|| PathError::ChildNotFound {
                name: name.to_string(),
            }),
    }
}

/// Split a path such as `graph1/x/Line/color` into the widget it names and
/// the setting path within that widget.
///
/// Segments are followed through the tree while they name children; the
/// remaining segments must form a setting of the widget reached.
pub fn resolve_setting(
    tree: &WidgetTree,
    origin: WidgetId,
    path: &str,
) -> Result<(WidgetId, SettingPath)> {
    let mut current = if path.starts_with('/') {
        WidgetId::ROOT
    } else {
        origin
    };
    let segments: Vec<&str> = path.split('/').collect();
    let mut rest = segments.as_slice();
    while let Some((segment, tail)) = rest.split_first() {
        let is_child = !matches!(*segment, "" | "." | "..")
            && tree.child_by_name(current, segment).is_some();
        if !is_child && !matches!(*segment, "" | "." | "..") {
            break;
        }
        current = step(tree, current, segment)?;
        rest = tail;
    }

    let setting = SettingPath::new(
        rest.iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| (*segment).to_string())
            .collect(),
    );
    let node = tree.node(current)?;
    if setting.is_empty() || !node.settings.contains(&setting) {
        return Err(DocumentError::setting_not_found(path));
    }
    Ok((current, setting))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::WidgetKind;

    fn sample() -> (WidgetTree, WidgetId, WidgetId) {
        let mut tree = WidgetTree::new();
        let page = tree.add(WidgetId::ROOT, WidgetKind::Page, None, false).unwrap();
        let graph = tree.add(page, WidgetKind::Graph, None, true).unwrap();
        (tree, page, graph)
    }

    #[test]
    fn test_absolute_and_relative() {
        let (tree, page, graph) = sample();
        assert_eq!(resolve(&tree, graph, "/page1"), Ok(page));
        assert_eq!(resolve(&tree, page, "graph1/./x/.."), Ok(graph));
        assert_eq!(resolve(&tree, graph, ""), Ok(graph));
        assert_eq!(resolve(&tree, WidgetId::ROOT, ".."), Err(PathError::NoParent));
        assert_eq!(
            resolve(&tree, page, "graph1/z"),
            Err(PathError::ChildNotFound {
                name: "z".to_string()
            })
        );
    }

    #[test]
    fn test_resolve_setting() {
        let (tree, page, graph) = sample();
        let x = tree.child_by_name(graph, "x").unwrap();
        let (widget, setting) = resolve_setting(&tree, page, "graph1/x/Line/color").unwrap();
        assert_eq!(widget, x);
        assert_eq!(setting.to_string(), "Line/color");

        let (widget, setting) = resolve_setting(&tree, x, "../leftMargin").unwrap();
        assert_eq!(widget, graph);
        assert_eq!(setting.to_string(), "leftMargin");

        assert!(matches!(
            resolve_setting(&tree, page, "graph1/x"),
            Err(DocumentError::SettingNotFound { .. })
        ));
        assert!(matches!(
            resolve_setting(&tree, page, "graph1/nothing"),
            Err(DocumentError::SettingNotFound { .. })
        ));
    }
}
