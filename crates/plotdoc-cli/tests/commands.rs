//! Subcommands run against documents written to a temporary directory.

use std::fs;
use std::path::Path;

use plotdoc_cli::commands;
use plotdoc_cli::types::DatasetDump;
use plotdoc_core::SaveOptions;
use plotdoc_model::DatasetKind;

const DOCUMENT: &str = "\
ImportFile('xy.dat', 'x y', linked=True)
SetData('err', [1, 2], symerr=[0.5, 0.5])
SetDataExpression('double', 'x * 2')
ImportString2D('img', '''
xrange 0 1
yrange 0 2
1 2
3 4
''')
Add('page', name='page1', autoadd=False)
To('page1')
Add('graph', name='graph1', autoadd=False)
To('graph1')
Add('axis', name='x', autoadd=False)
";

fn quiet() -> SaveOptions {
    SaveOptions::new().with_user(None).with_date(false)
}

fn write_document(dir: &Path) -> std::path::PathBuf {
    fs::write(dir.join("xy.dat"), "1 10\n2 20\n").expect("write data");
    let path = dir.join("doc.pds");
    fs::write(&path, DOCUMENT).expect("write document");
    path
}

#[test]
fn datasets_lists_every_dataset_by_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_document(dir.path());

    let summaries = commands::datasets(&doc).expect("datasets");
    let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["double", "err", "img", "x", "y"]);

    let double = &summaries[0];
    assert_eq!(double.kind, DatasetKind::Expression);
    assert_eq!(double.range, Some((2.0, 4.0)));
    let img = &summaries[2];
    assert_eq!(img.kind, DatasetKind::Grid2D);
    assert_eq!(img.size, Some(4));
    assert!(summaries[3].linked.as_deref().is_some_and(|file| file.ends_with("xy.dat")));
}

#[test]
fn tree_starts_at_the_requested_widget() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_document(dir.path());

    let entries = commands::tree(&doc, "/page1").expect("tree");
    let shape: Vec<(&str, &str, usize)> = entries
        .iter()
        .map(|entry| (entry.path.as_str(), entry.kind.as_str(), entry.depth))
        .collect();
    assert_eq!(
        shape,
        vec![
            ("/page1", "page", 0),
            ("/page1/graph1", "graph", 1),
            ("/page1/graph1/x", "axis", 2),
        ]
    );

    assert!(commands::tree(&doc, "/page2").is_err());
}

#[test]
fn get_returns_values_or_grids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_document(dir.path());

    let DatasetDump::Values(columns) = commands::get(&doc, "err").expect("err") else {
        panic!("err should be a value dataset");
    };
    assert_eq!(columns.data, vec![1.0, 2.0]);
    assert_eq!(columns.serr, Some(vec![0.5, 0.5]));

    let DatasetDump::Grid { rows, xrange, .. } = commands::get(&doc, "img").expect("img") else {
        panic!("img should be a grid");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(xrange, (0.0, 1.0));

    let err = commands::get(&doc, "missing").unwrap_err();
    assert!(format!("{err:#}").contains("missing"));
}

#[test]
fn reload_picks_up_changed_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_document(dir.path());
    fs::write(dir.path().join("xy.dat"), "5 50\n6 60\n7 70\n").expect("rewrite data");
    let out = dir.path().join("refreshed.pds");

    let result = commands::reload(&doc, Some(&out), &quiet()).expect("reload");
    assert_eq!(result.summary.read, vec!["x", "y"]);
    assert!(result.summary.errors.is_empty());
    assert_eq!(result.saved_to, out);

    let DatasetDump::Values(double) = commands::get(&out, "double").expect("double") else {
        panic!("double should be a value dataset");
    };
    assert_eq!(double.data, vec![10.0, 12.0, 14.0]);
}

#[test]
fn resave_output_loads_back_the_same() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_document(dir.path());
    let out = dir.path().join("copy.pds");

    commands::resave(&doc, &out, &quiet()).expect("resave");
    let text = fs::read_to_string(&out).expect("read copy");
    assert!(!text.contains("# Date:"));
    assert_eq!(
        commands::datasets(&out).expect("copy datasets"),
        commands::datasets(&doc).expect("original datasets")
    );
}

#[test]
fn load_failure_names_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.pds");
    fs::write(&path, "SetData('a', [1]\n").expect("write document");

    let err = commands::datasets(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.pds"));
}
