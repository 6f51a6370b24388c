//! Lazy evaluation of expression datasets.
//!
//! Formulas see every other 1-D dataset of the document. Inside the formula
//! for part `p`, a dataset name `n` stands for that dataset's `p` sequence, and
//! `n_data`, `n_serr`, `n_nerr` and `n_perr` name individual parts. Results are
//! cached against the changeset they were computed at, errors included.

use std::rc::Rc;

use tracing::debug;

use plotdoc_expr::{ExprError, Formula, Scope, Value};
use plotdoc_model::{Columns, Dataset, DatasetExpressionError, DatasetPart, ExpressionDataset};

use crate::document::Document;
use crate::error::{DocumentError, Result};

type Outcome = std::result::Result<Rc<Columns>, DatasetExpressionError>;

impl Document {
    /// Values and errors of a 1-D dataset.
    ///
    /// Literal data is copied; expression data is evaluated if the document
    /// changed since it was last read.
    pub fn columns(&self, name: &str) -> Result<Rc<Columns>> {
        match self.dataset(name)? {
            Dataset::Literal(ds) => Ok(Rc::new(ds.columns().clone())),
            Dataset::Expression(ds) => Ok(self.evaluate_expression(name, ds)?),
            Dataset::Grid2D(_) => Err(DocumentError::WrongKind {
                name: name.to_string(),
                expected: "a 1D dataset",
                found: plotdoc_model::DatasetKind::Grid2D,
            }),
        }
    }

    pub(crate) fn evaluate_expression(&self, name: &str, ds: &ExpressionDataset) -> Outcome {
        if let Some(outcome) = ds.cached(self.changeset()) {
            return outcome;
        }
        let Some(_guard) = ds.begin_evaluation() else {
            self.circular.borrow_mut().get_or_insert_with(|| name.to_string());
            return Err(DatasetExpressionError::circular(name));
        };

        debug!(dataset = %name, changeset = self.changeset(), "evaluating expression dataset");
        self.eval_depth.set(self.eval_depth.get() + 1);
        let mut outcome = self.compute(name, ds);
        let depth = self.eval_depth.get() - 1;
        self.eval_depth.set(depth);

        let cycle = if depth == 0 {
            self.circular.borrow_mut().take()
        } else {
            self.circular.borrow().clone()
        };
        if outcome.is_err()
            && let Some(dataset) = cycle
        {
            outcome = Err(DatasetExpressionError::circular(dataset));
        }
        ds.store(self.changeset(), outcome.clone());
        outcome
    }

    fn compute(&self, name: &str, ds: &ExpressionDataset) -> Outcome {
        if ds.parts().get(DatasetPart::Values).is_none() {
            return Err(DatasetExpressionError::evaluation(
                "",
                "no formula given for the values",
            ));
        }

        let mut results: Vec<(DatasetPart, Value)> = Vec::new();
        for part in DatasetPart::ALL {
            let Some(source) = ds.parts().get(part) else {
                continue;
            };
            let scope = DocumentScope {
                document: self,
                exclude: name,
                part,
            };
            let value = Formula::parse(source)
                .and_then(|formula| formula.evaluate(&scope))
                .map_err(|err| DatasetExpressionError::evaluation(source, err))?;
            results.push((part, value));
        }

        let lengths: Vec<(DatasetPart, usize)> = results
            .iter()
            .filter_map(|(part, value)| value.array_len().map(|len| (*part, len)))
            .collect();
        let len = lengths.first().map_or(1, |(_, len)| *len);
        if lengths.iter().any(|(_, other)| *other != len) {
            return Err(DatasetExpressionError::InconsistentLength { lengths });
        }

        let mut columns = Columns::default();
        for (part, value) in results {
            let values = value.into_vec(len);
            match part {
                DatasetPart::Values => columns.data = values,
                DatasetPart::SymErr => columns.serr = Some(values),
                DatasetPart::NegErr => columns.nerr = Some(values),
                DatasetPart::PosErr => columns.perr = Some(values),
            }
        }
        Ok(Rc::new(columns))
    }
}

/// Symbol table for one formula of one expression dataset.
struct DocumentScope<'a> {
    document: &'a Document,
    exclude: &'a str,
    part: DatasetPart,
}

impl DocumentScope<'_> {
    fn bind(&self, dataset: &str, part: DatasetPart) -> plotdoc_expr::Result<Option<Value>> {
        if dataset == self.exclude {
            return Ok(None);
        }
        let Some(found) = self.document.datasets.get(dataset) else {
            return Ok(None);
        };
        if found.dimensions() != 1 {
            return Err(ExprError::reference(dataset, "2D datasets cannot be used in expressions"));
        }
        let columns = self
            .document
            .columns(dataset)
            .map_err(|err| ExprError::reference(dataset, err))?;
        match columns.part(part) {
            Some(values) => Ok(Some(Value::Array(values.to_vec()))),
            None => Err(ExprError::reference(dataset, format!("dataset has no {part} values"))),
        }
    }
}

impl Scope for DocumentScope<'_> {
    fn lookup(&self, name: &str) -> plotdoc_expr::Result<Option<Value>> {
        if self.document.datasets.contains_key(name) {
            return self.bind(name, self.part);
        }
        if let Some((dataset, suffix)) = name.rsplit_once('_')
            && let Ok(part) = suffix.parse::<DatasetPart>()
        {
            return self.bind(dataset, part);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotdoc_model::ExpressionParts;

    fn doc_with_temp() -> Document {
        let mut doc = Document::new();
        doc.set_data(
            "temp",
            vec![1.0, 2.0, 3.0],
            Some(vec![0.1, 0.1, 0.1]),
            None,
            None,
        )
        .unwrap();
        doc
    }

    fn expression(doc: &Document, name: &str) -> u64 {
        doc.dataset(name)
            .unwrap()
            .as_expression()
            .unwrap()
            .evaluations()
    }

    #[test]
    fn test_part_suffix_bindings() {
        let mut doc = doc_with_temp();
        doc.set_data_expression(
            "scaled",
            ExpressionParts {
                data: Some("temp * 2".to_string()),
                serr: Some("temp_serr * 2".to_string()),
                ..ExpressionParts::default()
            },
        );
        let columns = doc.columns("scaled").unwrap();
        assert_eq!(columns.data, vec![2.0, 4.0, 6.0]);
        assert_eq!(columns.serr, Some(vec![0.2, 0.2, 0.2]));
        assert!(columns.nerr.is_none());
    }

    #[test]
    fn test_whole_name_binds_same_part() {
        let mut doc = doc_with_temp();
        doc.set_data_expression(
            "copy",
            ExpressionParts {
                data: Some("temp".to_string()),
                serr: Some("temp".to_string()),
                ..ExpressionParts::default()
            },
        );
        assert_eq!(doc.columns("copy").unwrap().serr, Some(vec![0.1, 0.1, 0.1]));
    }

    #[test]
    fn test_missing_part_is_reference_error() {
        let mut doc = doc_with_temp();
        doc.set_data_expression("bad", ExpressionParts::values("temp_perr + 1"));
        let err = doc.columns("bad").unwrap_err();
        let DocumentError::Expression(DatasetExpressionError::Evaluation { expression, cause }) =
            err
        else {
            panic!("expected an evaluation error, got {err:?}");
        };
        assert_eq!(expression, "temp_perr + 1");
        assert!(cause.contains("no perr values"), "{cause}");
    }

    #[test]
    fn test_scalar_results_broadcast() {
        let mut doc = doc_with_temp();
        doc.set_data_expression(
            "flat",
            ExpressionParts {
                data: Some("temp".to_string()),
                serr: Some("0.5".to_string()),
                ..ExpressionParts::default()
            },
        );
        assert_eq!(doc.columns("flat").unwrap().serr, Some(vec![0.5; 3]));

        doc.set_data_expression("single", ExpressionParts::values("2 * pi"));
        assert_eq!(doc.columns("single").unwrap().data.len(), 1);
    }

    #[test]
    fn test_inconsistent_lengths() {
        let mut doc = doc_with_temp();
        doc.set_data_expression(
            "odd",
            ExpressionParts {
                data: Some("temp".to_string()),
                perr: Some("arange(5)".to_string()),
                ..ExpressionParts::default()
            },
        );
        assert!(matches!(
            doc.columns("odd"),
            Err(DocumentError::Expression(DatasetExpressionError::InconsistentLength { .. }))
        ));
    }

    #[test]
    fn test_errors_are_cached_until_mutation() {
        let mut doc = doc_with_temp();
        doc.set_data_expression("e", ExpressionParts::values("missing + 1"));
        assert!(doc.columns("e").is_err());
        assert!(doc.columns("e").is_err());
        assert_eq!(expression(&doc, "e"), 1);

        doc.set_data("missing", vec![1.0], None, None, None).unwrap();
        assert_eq!(doc.columns("e").unwrap().data, vec![2.0]);
        assert_eq!(expression(&doc, "e"), 2);
    }

    #[test]
    fn test_chained_expressions() {
        let mut doc = doc_with_temp();
        doc.set_data_expression("a", ExpressionParts::values("temp + 1"));
        doc.set_data_expression("b", ExpressionParts::values("a * 10"));
        assert_eq!(doc.columns("b").unwrap().data, vec![20.0, 30.0, 40.0]);
        assert_eq!(expression(&doc, "a"), 1);
        doc.columns("a").unwrap();
        assert_eq!(expression(&doc, "a"), 1);
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut doc = Document::new();
        doc.set_data_expression("a", ExpressionParts::values("b + 1"));
        doc.set_data_expression("b", ExpressionParts::values("a + 1"));
        assert!(matches!(
            doc.columns("a"),
            Err(DocumentError::Expression(DatasetExpressionError::Circular { .. }))
        ));
        assert!(matches!(
            doc.columns("b"),
            Err(DocumentError::Expression(DatasetExpressionError::Circular { .. }))
        ));
        assert!(doc.circular.borrow().is_none());
    }

    #[test]
    fn test_grid_is_not_bindable() {
        let mut doc = doc_with_temp();
        doc.import_string_2d("img", "1 2\n3 4\n").unwrap();
        doc.set_data_expression("e", ExpressionParts::values("img + 1"));
        let err = doc.columns("e").unwrap_err();
        assert!(err.to_string().contains("2D datasets"), "{err}");
        assert!(matches!(
            doc.columns("img"),
            Err(DocumentError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_missing_values_formula() {
        let mut doc = doc_with_temp();
        doc.set_data_expression(
            "e",
            ExpressionParts {
                serr: Some("temp".to_string()),
                ..ExpressionParts::default()
            },
        );
        assert!(doc.columns("e").is_err());
    }
}
