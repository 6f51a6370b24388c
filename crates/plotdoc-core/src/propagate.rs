//! Copying one widget's setting to similar widgets.

use tracing::debug;

use crate::document::Document;
use crate::error::Result;
use crate::settings::SettingPath;
use crate::tree::WidgetId;

impl Document {
    /// Copy the value of `setting` on `origin` to every widget below `root`
    /// (the tree root by default) of the same kind, optionally only those
    /// named `widget_name`, searching at most `max_depth` levels down.
    ///
    /// Widgets without that setting are skipped. Each assignment is a
    /// separate mutation. Returns the number of widgets assigned; `origin`
    /// counts too when it lies under `root`.
    pub fn propagate_settings(
        &mut self,
        origin: WidgetId,
        setting: &SettingPath,
        widget_name: Option<&str>,
        root: Option<WidgetId>,
        max_depth: Option<usize>,
    ) -> Result<usize> {
        let node = self.tree.node(origin)?;
        let kind = node.kind;
        let value = node.settings.get(setting)?.value().clone();
        let root = root.unwrap_or(WidgetId::ROOT);
        self.tree.node(root)?;

        let within = |depth: usize| max_depth.is_none_or(|max| depth <= max);
        let mut targets = Vec::new();
        let mut stack: Vec<(WidgetId, usize)> = Vec::new();
        if within(1) {
            stack.extend(self.tree.children(root).iter().rev().map(|child| (*child, 1)));
        }
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            let name_matches = widget_name.is_none_or(|name| node.name == name);
            if name_matches && node.kind == kind && node.settings.contains(setting) {
                targets.push(id);
            }
            if within(depth + 1) {
                stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }

        for target in &targets {
            self.set_setting(*target, setting, value.clone())?;
        }
        debug!(%setting, widgets = targets.len(), "propagated setting");
        Ok(targets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingValue;
    use crate::tree::WidgetKind;

    fn two_graphs() -> (Document, WidgetId, WidgetId) {
        let mut doc = Document::new();
        let page = doc
            .add_widget(WidgetId::ROOT, WidgetKind::Page, None, false)
            .unwrap();
        let g1 = doc.add_widget(page, WidgetKind::Graph, None, true).unwrap();
        let g2 = doc.add_widget(page, WidgetKind::Graph, None, true).unwrap();
        (doc, g1, g2)
    }

    fn path(text: &str) -> SettingPath {
        text.parse().unwrap()
    }

    #[test]
    fn test_copies_to_same_kind() {
        let (mut doc, g1, g2) = two_graphs();
        let x1 = doc.tree().child_by_name(g1, "x").unwrap();
        let color = path("Line/color");
        doc.set_setting(x1, &color, "red".into()).unwrap();

        let before = doc.changeset();
        let count = doc.propagate_settings(x1, &color, None, None, None).unwrap();
        // x and y axes of both graphs
        assert_eq!(count, 4);
        assert_eq!(doc.changeset(), before + 4);
        let y2 = doc.tree().child_by_name(g2, "y").unwrap();
        assert_eq!(doc.setting(y2, &color).unwrap(), &SettingValue::from("red"));
        assert_eq!(
            doc.setting(g2, &path("Border/color")).unwrap(),
            &SettingValue::from("black")
        );
    }

    #[test]
    fn test_name_filter_and_depth() {
        let (mut doc, g1, g2) = two_graphs();
        let x1 = doc.tree().child_by_name(g1, "x").unwrap();
        let label = path("label");
        doc.set_setting(x1, &label, "time".into()).unwrap();

        assert_eq!(
            doc.propagate_settings(x1, &label, Some("x"), None, Some(2))
                .unwrap(),
            0
        );
        assert_eq!(
            doc.propagate_settings(x1, &label, Some("x"), None, None)
                .unwrap(),
            2
        );
        let x2 = doc.tree().child_by_name(g2, "x").unwrap();
        let y2 = doc.tree().child_by_name(g2, "y").unwrap();
        assert_eq!(doc.setting(x2, &label).unwrap(), &SettingValue::from("time"));
        assert_eq!(doc.setting(y2, &label).unwrap(), &SettingValue::from(""));
    }

    #[test]
    fn test_root_limits_search() {
        let (mut doc, g1, g2) = two_graphs();
        let x1 = doc.tree().child_by_name(g1, "x").unwrap();
        let log = path("log");
        doc.set_setting(x1, &log, true.into()).unwrap();
        let count = doc
            .propagate_settings(x1, &log, None, Some(g2), Some(1))
            .unwrap();
        assert_eq!(count, 2);
        let y1 = doc.tree().child_by_name(g1, "y").unwrap();
        assert_eq!(doc.setting(y1, &log).unwrap(), &SettingValue::Bool(false));
    }
}
