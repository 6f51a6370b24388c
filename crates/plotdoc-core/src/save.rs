//! Saving a document as a replayable script.
//!
//! The script lists one import statement per distinct file link, then the
//! data of every unlinked dataset, then the statements that rebuild the
//! widget tree. Loading it back is a matter of running it against an empty
//! document (see [`crate::script`]).

use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::info;

use plotdoc_ingest::descriptor_for;
use plotdoc_model::{
    Columns, Dataset, DatasetPart, ExpressionParts, Grid2DDataset, HduRef, Linkage,
};

use crate::document::Document;
use crate::error::{DocumentError, Result};
use crate::options::SaveOptions;
use crate::settings::SettingValue;
use crate::tree::WidgetId;

impl Document {
    /// The saved form of the document.
    pub fn to_script(&self, options: &SaveOptions) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "# plotdoc saved document (version {})\n",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(user) = &options.user {
            out.push_str(&format!("# User: {user}\n"));
        }
        if options.include_date {
            out.push_str(&format!(
                "# Date: {}\n",
                Utc::now().format("%a, %d %b %Y %H:%M:%S +0000")
            ));
        }
        out.push('\n');

        let mut written: Vec<&Rc<Linkage>> = Vec::new();
        for dataset in self.datasets.values() {
            if let Some(link) = dataset.linked()
                && !written.iter().any(|seen| Rc::ptr_eq(seen, link))
            {
                out.push_str(&link_statement(link));
                written.push(link);
            }
        }

        for (name, dataset) in &self.datasets {
            match dataset {
                Dataset::Literal(ds) if ds.linked.is_none() => {
                    out.push_str(&literal_statement(name, ds.columns()));
                }
                Dataset::Grid2D(ds) if ds.linked.is_none() => {
                    out.push_str(&grid_statement(name, ds));
                }
                Dataset::Expression(ds) => out.push_str(&expression_statement(name, ds.parts())),
                Dataset::Literal(_) | Dataset::Grid2D(_) => {}
            }
        }

        self.write_widget(WidgetId::ROOT, &mut out);
        out
    }

    fn write_widget(&self, id: WidgetId, out: &mut String) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        for (path, value) in node.settings.changed() {
            out.push_str(&format!(
                "Set({}, {})\n",
                quote(&path.to_string()),
                setting_literal(value)
            ));
        }
        for child in &node.children {
            let Some(child_node) = self.tree.get(*child) else {
                continue;
            };
            out.push_str(&format!(
                "Add({}, name={}, autoadd=False)\n",
                quote(child_node.kind.type_name()),
                quote(&child_node.name)
            ));
            out.push_str(&format!("To({})\n", quote(&child_node.name)));
            self.write_widget(*child, out);
            out.push_str("To('..')\n");
        }
    }

    /// Write the script to `writer` and clear the modified flag.
    pub fn save_to(&mut self, writer: &mut impl Write, options: &SaveOptions) -> Result<()> {
        let script = self.to_script(options);
        writer
            .write_all(script.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(DocumentError::Write)?;
        self.set_modified(false);
        Ok(())
    }

    /// Save to `path` through a temporary file in the same directory, so a
    /// failed save leaves any previous file intact.
    pub fn save_to_file(&mut self, path: &Path, options: &SaveOptions) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file =
            NamedTempFile::new_in(dir).map_err(|err| DocumentError::io("create", dir, err))?;
        let script = self.to_script(options);
        file.write_all(script.as_bytes())
            .map_err(|err| DocumentError::io("write", file.path(), err))?;
        file.persist(path)
            .map_err(|err| DocumentError::io("save", path, err.error))?;
        self.set_modified(false);
        info!(
            path = %path.display(),
            datasets = self.datasets.len(),
            "saved document"
        );
        Ok(())
    }
}

fn link_statement(link: &Linkage) -> String {
    match link {
        Linkage::File(file) => {
            let mut args = vec![
                quote(&file.filename.to_string_lossy()),
                quote(&file.descriptor),
            ];
            if file.use_blocks {
                args.push("useblocks=True".to_string());
            }
            args.push("linked=True".to_string());
            format!("ImportFile({})\n", args.join(", "))
        }
        Linkage::Grid2D(file) => {
            let names: Vec<String> = file.datasets.iter().map(|name| quote(name)).collect();
            let mut args = vec![
                quote(&file.filename.to_string_lossy()),
                format!("[{}]", names.join(", ")),
            ];
            let options = &file.options;
            for (key, range) in [("xrange", options.xrange), ("yrange", options.yrange)] {
                if let Some((low, high)) = range {
                    args.push(format!("{key}=({}, {})", number(low), number(high)));
                }
            }
            for (key, flag) in [
                ("invertrows", options.invert_rows),
                ("invertcols", options.invert_cols),
                ("transpose", options.transpose),
            ] {
                if let Some(flag) = flag {
                    args.push(format!("{key}={}", boolean(flag)));
                }
            }
            args.push("linked=True".to_string());
            format!("ImportFile2D({})\n", args.join(", "))
        }
        Linkage::Fits(file) => {
            let hdu = match &file.hdu {
                HduRef::Index(index) => index.to_string(),
                HduRef::Name(name) => quote(name),
            };
            let mut args = vec![
                quote(&file.dataset),
                quote(&file.filename.to_string_lossy()),
                hdu,
            ];
            let columns = &file.columns;
            for (key, column) in [
                ("datacol", &columns.data),
                ("symerrcol", &columns.serr),
                ("poserrcol", &columns.perr),
                ("negerrcol", &columns.nerr),
            ] {
                if let Some(column) = column {
                    args.push(format!("{key}={}", quote(column)));
                }
            }
            args.push("linked=True".to_string());
            format!("ImportFITSFile({})\n", args.join(", "))
        }
    }
}

fn literal_statement(name: &str, columns: &Columns) -> String {
    let parts = columns.error_parts();
    if !descriptor_safe(name) {
        let mut args = vec![quote(name), number_list(&columns.data)];
        for (key, part) in [
            ("symerr", DatasetPart::SymErr),
            ("negerr", DatasetPart::NegErr),
            ("poserr", DatasetPart::PosErr),
        ] {
            if let Some(values) = columns.part(part) {
                args.push(format!("{key}={}", number_list(values)));
            }
        }
        return format!("SetData({})\n", args.join(", "));
    }

    let mut out = format!("ImportString({},'''\n", quote(&descriptor_for(name, &parts)));
    for row in 0..columns.len() {
        let mut cells = vec![number(columns.data[row])];
        for part in &parts {
            if let Some(values) = columns.part(*part) {
                cells.push(number(values[row]));
            }
        }
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out.push_str("''')\n");
    out
}

fn grid_statement(name: &str, ds: &Grid2DDataset) -> String {
    let mut out = format!("ImportString2D({}, '''\n", quote(name));
    out.push_str(&format!("xrange {} {}\n", number(ds.xrange.0), number(ds.xrange.1)));
    out.push_str(&format!("yrange {} {}\n", number(ds.yrange.0), number(ds.yrange.1)));
    // storage is highest y first; the file wants lowest y first
    for row in ds.grid.rows().rev() {
        let cells: Vec<String> = row.iter().map(|value| number(*value)).collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out.push_str("''')\n");
    out
}

fn expression_statement(name: &str, parts: &ExpressionParts) -> String {
    let mut args = vec![
        quote(name),
        parts
            .get(DatasetPart::Values)
            .map_or_else(|| "None".to_string(), quote),
    ];
    for (key, part) in [
        ("symerr", DatasetPart::SymErr),
        ("negerr", DatasetPart::NegErr),
        ("poserr", DatasetPart::PosErr),
    ] {
        if let Some(formula) = parts.get(part) {
            args.push(format!("{key}={}", quote(formula)));
        }
    }
    args.push("linked=True".to_string());
    format!("SetDataExpression({})\n", args.join(", "))
}

/// Whether `name` can appear in a descriptor as a dataset name.
fn descriptor_safe(name: &str) -> bool {
    !name.is_empty()
        && !matches!(name, "+-" | "+" | "-")
        && !name
            .chars()
            .any(|ch| ch == ',' || ch == '#' || ch.is_whitespace())
}

/// Shortest text that reads back as the same number.
pub(crate) fn number(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:?}")
    }
}

fn number_list(values: &[f64]) -> String {
    let cells: Vec<String> = values.iter().map(|value| number(*value)).collect();
    format!("[{}]", cells.join(", "))
}

fn boolean(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn setting_literal(value: &SettingValue) -> String {
    match value {
        SettingValue::Bool(value) => boolean(*value).to_string(),
        SettingValue::Int(value) => value.to_string(),
        SettingValue::Float(value) => number(*value),
        SettingValue::Text(text) => quote(text),
    }
}

/// Single-quoted string literal with backslash escapes.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch.is_control() => out.push_str(&format!("\\x{:02x}", ch as u32)),
            ch => out.push(ch),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::WidgetKind;

    fn body(doc: &Document) -> String {
        doc.to_script(&SaveOptions::new().with_user(None).with_date(false))
    }

    #[test]
    fn test_number_format() {
        assert_eq!(number(1.0), "1.0");
        assert_eq!(number(0.1), "0.1");
        assert_eq!(number(-272.15), "-272.15");
        assert_eq!(number(f64::NAN), "nan");
        assert_eq!(number(f64::NEG_INFINITY), "-inf");
        assert_eq!(number(1e-7).parse::<f64>().unwrap(), 1e-7);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("it's"), "'it\\'s'");
        assert_eq!(quote("a\\b\nc"), "'a\\\\b\\nc'");
    }

    #[test]
    fn test_header_lines() {
        let doc = Document::new();
        let text = doc.to_script(&SaveOptions::new().with_user(Some("ann".to_string())));
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("# plotdoc saved document (version "));
        assert_eq!(lines.next(), Some("# User: ann"));
        assert!(lines.next().unwrap().starts_with("# Date: "));
        assert_eq!(lines.next(), Some(""));
    }

    #[test]
    fn test_literal_and_expression_statements() {
        let mut doc = Document::new();
        doc.set_data("a", vec![1.0, 2.0], Some(vec![0.5, 0.5]), None, Some(vec![1.0, 2.0]))
            .unwrap();
        doc.set_data_expression("b", ExpressionParts::values("a * 2"));
        insta::assert_snapshot!(body(&doc), @r"
        # plotdoc saved document (version 0.1.0)

        ImportString('a,+-,+','''
        1.0 0.5 1.0
        2.0 0.5 2.0
        ''')
        SetDataExpression('b', 'a * 2', linked=True)
        ");
    }

    #[test]
    fn test_awkward_names_use_set_data() {
        let mut doc = Document::new();
        doc.set_data("my data", vec![1.5], None, Some(vec![-0.5]), None)
            .unwrap();
        assert!(body(&doc).contains("SetData('my data', [1.5], negerr=[-0.5])\n"));
    }

    #[test]
    fn test_tree_statements() {
        let mut doc = Document::new();
        let page = doc
            .add_widget(WidgetId::ROOT, WidgetKind::Page, None, false)
            .unwrap();
        let graph = doc.add_widget(page, WidgetKind::Graph, None, true).unwrap();
        let x = doc.tree().child_by_name(graph, "x").unwrap();
        doc.set_setting(x, &"label".parse().unwrap(), "time".into())
            .unwrap();
        insta::assert_snapshot!(body(&doc), @r"
        # plotdoc saved document (version 0.1.0)

        Add('page', name='page1', autoadd=False)
        To('page1')
        Add('graph', name='graph1', autoadd=False)
        To('graph1')
        Add('axis', name='x', autoadd=False)
        To('x')
        Set('label', 'time')
        To('..')
        Add('axis', name='y', autoadd=False)
        To('y')
        Set('direction', 'vertical')
        To('..')
        To('..')
        To('..')
        ");
    }

    #[test]
    fn test_save_clears_modified() {
        let mut doc = Document::new();
        doc.set_data("a", vec![1.0], None, None, None).unwrap();
        let changeset = doc.changeset();
        let mut out = Vec::new();
        doc.save_to(&mut out, &SaveOptions::new()).unwrap();
        assert!(!doc.is_modified());
        assert_eq!(doc.changeset(), changeset);
        assert!(String::from_utf8(out).unwrap().contains("ImportString('a','''"));
    }
}
