use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// One of the four numeric sequences making up a 1-D dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DatasetPart {
    /// The values themselves.
    #[serde(rename = "data")]
    Values,
    /// Symmetric error bars.
    #[serde(rename = "serr")]
    SymErr,
    /// Negative error bars (stored as negative offsets).
    #[serde(rename = "nerr")]
    NegErr,
    /// Positive error bars.
    #[serde(rename = "perr")]
    PosErr,
}

impl DatasetPart {
    pub const ALL: [DatasetPart; 4] = [
        DatasetPart::Values,
        DatasetPart::SymErr,
        DatasetPart::NegErr,
        DatasetPart::PosErr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetPart::Values => "data",
            DatasetPart::SymErr => "serr",
            DatasetPart::NegErr => "nerr",
            DatasetPart::PosErr => "perr",
        }
    }
}

impl fmt::Display for DatasetPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetPart {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "data" | "vals" => Ok(DatasetPart::Values),
            "serr" => Ok(DatasetPart::SymErr),
            "nerr" => Ok(DatasetPart::NegErr),
            "perr" => Ok(DatasetPart::PosErr),
            other => Err(ModelError::UnknownPart(other.to_string())),
        }
    }
}

/// Values plus optional error sequences, all of the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Columns {
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serr: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nerr: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perr: Option<Vec<f64>>,
}

impl Columns {
    /// Build columns, rejecting error sequences whose length differs from the values.
    pub fn new(
        data: Vec<f64>,
        serr: Option<Vec<f64>>,
        nerr: Option<Vec<f64>>,
        perr: Option<Vec<f64>>,
    ) -> Result<Self> {
        let columns = Self {
            data,
            serr,
            nerr,
            perr,
        };
        columns.check_lengths()?;
        Ok(columns)
    }

    pub fn from_values(data: Vec<f64>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.serr.is_some() || self.nerr.is_some() || self.perr.is_some()
    }

    pub fn part(&self, part: DatasetPart) -> Option<&[f64]> {
        match part {
            DatasetPart::Values => Some(&self.data),
            DatasetPart::SymErr => self.serr.as_deref(),
            DatasetPart::NegErr => self.nerr.as_deref(),
            DatasetPart::PosErr => self.perr.as_deref(),
        }
    }

    /// Verify every present error sequence matches the values' length.
    pub fn check_lengths(&self) -> Result<()> {
        let expected = self.data.len();
        for part in [DatasetPart::SymErr, DatasetPart::NegErr, DatasetPart::PosErr] {
            if let Some(values) = self.part(part)
                && values.len() != expected
            {
                return Err(ModelError::LengthMismatch {
                    part,
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Replace one sequence, leaving `self` untouched if the result would be invalid.
    pub fn replace(&mut self, part: DatasetPart, values: Option<Vec<f64>>) -> Result<()> {
        let mut next = self.clone();
        match part {
            DatasetPart::Values => next.data = values.ok_or(ModelError::MissingValues)?,
            DatasetPart::SymErr => next.serr = values,
            DatasetPart::NegErr => next.nerr = values,
            DatasetPart::PosErr => next.perr = values,
        }
        next.check_lengths()?;
        *self = next;
        Ok(())
    }

    /// Per-point extent including error bars, as `(minima, maxima)`.
    ///
    /// Negative errors are stored as negative offsets and so are added to the minima.
    pub fn point_ranges(&self) -> (Vec<f64>, Vec<f64>) {
        let mut minima = self.data.clone();
        let mut maxima = self.data.clone();
        if let Some(serr) = &self.serr {
            for ((lo, hi), err) in minima.iter_mut().zip(maxima.iter_mut()).zip(serr) {
                *lo -= err;
                *hi += err;
            }
        }
        if let Some(nerr) = &self.nerr {
            for (lo, err) in minima.iter_mut().zip(nerr) {
                *lo += err;
            }
        }
        if let Some(perr) = &self.perr {
            for (hi, err) in maxima.iter_mut().zip(perr) {
                *hi += err;
            }
        }
        (minima, maxima)
    }

    /// Overall `(min, max)` extent, or `None` when there are no values.
    pub fn range(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let (minima, maxima) = self.point_ranges();
        let min = minima.into_iter().fold(f64::INFINITY, f64::min);
        let max = maxima.into_iter().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    /// Descriptor suffix markers for the present error parts, in write order.
    pub fn error_parts(&self) -> Vec<DatasetPart> {
        [DatasetPart::SymErr, DatasetPart::PosErr, DatasetPart::NegErr]
            .into_iter()
            .filter(|part| self.part(*part).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_rejects_mismatched_error() {
        let mut columns = Columns::new(vec![1.0, 2.0, 3.0], None, None, None).unwrap();
        let err = columns
            .replace(DatasetPart::SymErr, Some(vec![0.1, 0.2]))
            .unwrap_err();
        assert!(matches!(err, ModelError::LengthMismatch { actual: 2, .. }));
        assert!(columns.serr.is_none());
    }

    #[test]
    fn test_replace_values_checks_existing_errors() {
        let mut columns =
            Columns::new(vec![1.0, 2.0], Some(vec![0.5, 0.5]), None, None).unwrap();
        assert!(columns.replace(DatasetPart::Values, Some(vec![1.0])).is_err());
        assert_eq!(columns.data, vec![1.0, 2.0]);
        assert_eq!(
            columns.replace(DatasetPart::Values, None),
            Err(ModelError::MissingValues)
        );
    }

    #[test]
    fn test_range_includes_errors() {
        let columns = Columns::new(
            vec![1.0, 5.0],
            Some(vec![0.5, 0.5]),
            Some(vec![-1.0, -1.0]),
            Some(vec![2.0, 2.0]),
        )
        .unwrap();
        assert_eq!(columns.range(), Some((-0.5, 7.5)));
        assert_eq!(Columns::default().range(), None);
    }

    #[test]
    fn test_part_names() {
        assert_eq!("vals".parse::<DatasetPart>().unwrap(), DatasetPart::Values);
        assert_eq!("perr".parse::<DatasetPart>().unwrap(), DatasetPart::PosErr);
        assert!("err".parse::<DatasetPart>().is_err());
    }
}
