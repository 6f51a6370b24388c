//! Tests for plotdoc-model types.

use proptest::prelude::*;

use plotdoc_model::{Columns, DatasetKind, DatasetPart, LiteralDataset, ModelError};

fn values(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6..1.0e6f64, len)
}

fn values_with_serr() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (0usize..16).prop_flat_map(|len| (values(len), values(len)))
}

proptest! {
    #[test]
    fn change_values_keeps_lengths_consistent(
        (data, serr) in values_with_serr(),
        other in 0usize..16,
        part_index in 0usize..4,
    ) {
        let mut ds = LiteralDataset::from_parts(data, Some(serr), None, None).unwrap();
        let part = DatasetPart::ALL[part_index];
        let replacement = vec![0.5; other];

        let before = ds.columns().clone();
        let result = ds.change_values(part, Some(replacement));

        let columns = ds.columns();
        for p in DatasetPart::ALL {
            if let Some(seq) = columns.part(p) {
                prop_assert_eq!(seq.len(), columns.len());
            }
        }
        if result.is_err() {
            prop_assert_eq!(columns, &before);
        }
    }
}

#[test]
fn mismatched_errors_are_rejected_at_construction() {
    let err = Columns::new(vec![1.0, 2.0], None, Some(vec![0.1]), None).unwrap_err();
    assert_eq!(
        err,
        ModelError::LengthMismatch {
            part: DatasetPart::NegErr,
            expected: 2,
            actual: 1,
        }
    );
}

#[test]
fn error_parts_follow_descriptor_order() {
    let columns = Columns::new(
        vec![1.0],
        Some(vec![0.1]),
        Some(vec![-0.2]),
        Some(vec![0.3]),
    )
    .unwrap();
    assert_eq!(
        columns.error_parts(),
        vec![DatasetPart::SymErr, DatasetPart::PosErr, DatasetPart::NegErr]
    );
}

#[test]
fn columns_serialize_without_missing_errors() {
    let columns = Columns::from_values(vec![1.0, 2.5]);
    let json = serde_json::to_string(&columns).expect("serialize columns");
    assert_eq!(json, r#"{"data":[1.0,2.5]}"#);
    let kind = serde_json::to_string(&DatasetKind::Grid2D).expect("serialize kind");
    assert_eq!(kind, r#""grid2d""#);
}
