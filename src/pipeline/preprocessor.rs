//! Fitted column transformer
//!
//! The preprocessor artifact is a JSON description of the transform fitted
//! at training time: the columns it was fit on, an ordered list of named
//! scalers over column subsets, and what happens to the columns no scaler
//! claims. Output columns come out scaler by scaler, then the remainder in
//! input order, named `<scaler>__<column>` / `remainder__<column>`.

use serde::{Deserialize, Serialize};

use super::error::EncodingError;

/// Prefixes removed from output feature names
pub const STRIPPED_PREFIXES: [&str; 3] = ["StandardScaler__", "MinMaxScaler__", "remainder__"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Column names, in order, the transform was fit on
    pub feature_names_in: Vec<String>,
    pub transformers: Vec<NamedTransformer>,
    #[serde(default)]
    pub remainder: Remainder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedTransformer {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub scaler: Scaler,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    MinMax {
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        #[serde(default = "unit_range")]
        feature_range: [f64; 2],
    },
    Passthrough,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remainder {
    #[default]
    Passthrough,
    Drop,
}

fn unit_range() -> [f64; 2] {
    [0.0, 1.0]
}

impl Preprocessor {
    /// Decode and sanity-check a serialized preprocessor
    pub fn from_slice(bytes: &[u8]) -> Result<Self, String> {
        let preprocessor: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        preprocessor.check()?;
        Ok(preprocessor)
    }

    fn check(&self) -> Result<(), String> {
        let mut claimed: Vec<&str> = Vec::new();

        for t in &self.transformers {
            for column in &t.columns {
                if !self.feature_names_in.contains(column) {
                    return Err(format!("transformer '{}' uses unknown column '{}'", t.name, column));
                }
                if claimed.contains(&column.as_str()) {
                    return Err(format!("column '{}' is claimed by more than one transformer", column));
                }
                claimed.push(column);
            }

            let n = t.columns.len();
            match &t.scaler {
                Scaler::Standard { mean, scale } if mean.len() != n || scale.len() != n => {
                    return Err(format!("transformer '{}' has {} columns but {} means / {} scales", t.name, n, mean.len(), scale.len()));
                }
                Scaler::MinMax { data_min, data_max, .. } if data_min.len() != n || data_max.len() != n => {
                    return Err(format!("transformer '{}' has {} columns but {} minimums / {} maximums", t.name, n, data_min.len(), data_max.len()));
                }
                Scaler::MinMax { feature_range, .. } if feature_range[0] >= feature_range[1] => {
                    return Err(format!("transformer '{}' has an empty feature range", t.name));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Output feature names as produced by the fitted transform
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .transformers
            .iter()
            .flat_map(|t| t.columns.iter().map(move |c| format!("{}__{}", t.name, c)))
            .collect();

        if self.remainder == Remainder::Passthrough {
            names.extend(self.remainder_columns().map(|c| format!("remainder__{}", c)));
        }

        names
    }

    /// Output feature names with scaler prefixes removed
    pub fn output_names(&self) -> Vec<String> {
        self.feature_names_out()
            .into_iter()
            .map(|name| strip_prefixes(&name).to_string())
            .collect()
    }

    /// Apply the fitted transform to one row.
    ///
    /// `columns` must equal the fit-time column list exactly, order included.
    pub fn transform(&self, columns: &[String], values: &[f64]) -> Result<Vec<f64>, EncodingError> {
        if columns != self.feature_names_in.as_slice() || values.len() != columns.len() {
            return Err(EncodingError::ColumnMismatch {
                expected: self.feature_names_in.clone(),
                actual: columns.to_vec(),
            });
        }

        let value_of = |column: &str| -> f64 {
            let i = self
                .feature_names_in
                .iter()
                .position(|c| c == column)
                .unwrap_or_default();
            values[i]
        };

        let mut out = Vec::with_capacity(values.len());

        for t in &self.transformers {
            for (j, column) in t.columns.iter().enumerate() {
                let x = value_of(column.as_str());
                out.push(t.scaler.apply(j, x));
            }
        }

        if self.remainder == Remainder::Passthrough {
            out.extend(self.remainder_columns().map(|c| value_of(c.as_str())));
        }

        Ok(out)
    }

    fn remainder_columns(&self) -> impl Iterator<Item = &String> {
        self.feature_names_in
            .iter()
            .filter(move |c| !self.transformers.iter().any(|t| t.columns.contains(c)))
    }
}

impl Scaler {
    /// Scale the `j`-th column of this transformer
    fn apply(&self, j: usize, x: f64) -> f64 {
        match self {
            Scaler::Standard { mean, scale } => (x - mean[j]) / non_zero(scale[j]),
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range,
            } => {
                let std = (x - data_min[j]) / non_zero(data_max[j] - data_min[j]);
                std * (feature_range[1] - feature_range[0]) + feature_range[0]
            }
            Scaler::Passthrough => x,
        }
    }
}

// Constant features were fit with a unit scale.
fn non_zero(v: f64) -> f64 {
    if v == 0.0 {
        1.0
    } else {
        v
    }
}

fn strip_prefixes(name: &str) -> &str {
    STRIPPED_PREFIXES
        .iter()
        .find_map(|p| name.strip_prefix(p))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn small() -> Preprocessor {
        Preprocessor::from_slice(
            br#"{
                "feature_names_in": ["a", "b", "c", "d"],
                "transformers": [
                    {"name": "MinMaxScaler", "columns": ["c"], "kind": "min_max",
                     "data_min": [10.0], "data_max": [20.0]},
                    {"name": "StandardScaler", "columns": ["a"], "kind": "standard",
                     "mean": [5.0], "scale": [2.0]},
                    {"name": "Identity", "columns": ["d"], "kind": "passthrough"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_transform_order_and_values() {
        let p = small();
        let out = p.transform(&names(&["a", "b", "c", "d"]), &[9.0, 3.0, 15.0, 7.0]).unwrap();
        // c (min-max), a (standard), d (identity), then remainder b
        assert_eq!(out, vec![0.5, 2.0, 7.0, 3.0]);
    }

    #[test]
    fn test_names_are_stripped() {
        let p = small();
        assert_eq!(
            p.feature_names_out(),
            names(&["MinMaxScaler__c", "StandardScaler__a", "Identity__d", "remainder__b"])
        );
        assert_eq!(p.output_names(), names(&["c", "a", "Identity__d", "b"]));
    }

    #[test]
    fn test_reordered_columns_are_rejected() {
        let p = small();
        let err = p
            .transform(&names(&["b", "a", "c", "d"]), &[1.0, 2.0, 3.0, 4.0])
            .unwrap_err();
        assert!(matches!(err, EncodingError::ColumnMismatch { .. }));

        let err = p.transform(&names(&["a", "b", "c"]), &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, EncodingError::ColumnMismatch { .. }));
    }

    #[test]
    fn test_remainder_drop() {
        let mut p = small();
        p.remainder = Remainder::Drop;
        let out = p.transform(&names(&["a", "b", "c", "d"]), &[5.0, 3.0, 10.0, 1.0]).unwrap();
        assert_eq!(out, vec![0.0, 0.0, 1.0]);
        assert_eq!(p.output_names().len(), 3);
    }

    #[test]
    fn test_zero_scale_and_custom_range() {
        let p = Preprocessor::from_slice(
            br#"{
                "feature_names_in": ["x", "y"],
                "transformers": [
                    {"name": "StandardScaler", "columns": ["x"], "kind": "standard",
                     "mean": [1.0], "scale": [0.0]},
                    {"name": "MinMaxScaler", "columns": ["y"], "kind": "min_max",
                     "data_min": [0.0], "data_max": [4.0], "feature_range": [-1.0, 1.0]}
                ],
                "remainder": "drop"
            }"#,
        )
        .unwrap();

        let out = p.transform(&names(&["x", "y"]), &[3.0, 1.0]).unwrap();
        assert_eq!(out, vec![2.0, -0.5]);
    }

    #[test]
    fn test_rejects_inconsistent_artifacts() {
        let unknown = br#"{"feature_names_in": ["a"], "transformers": [
            {"name": "StandardScaler", "columns": ["z"], "kind": "standard", "mean": [0.0], "scale": [1.0]}]}"#;
        assert!(Preprocessor::from_slice(unknown).unwrap_err().contains("unknown column"));

        let short = br#"{"feature_names_in": ["a", "b"], "transformers": [
            {"name": "StandardScaler", "columns": ["a", "b"], "kind": "standard", "mean": [0.0], "scale": [1.0, 1.0]}]}"#;
        assert!(Preprocessor::from_slice(short).is_err());

        let twice = br#"{"feature_names_in": ["a"], "transformers": [
            {"name": "One", "columns": ["a"], "kind": "passthrough"},
            {"name": "Two", "columns": ["a"], "kind": "passthrough"}]}"#;
        assert!(Preprocessor::from_slice(twice).unwrap_err().contains("more than one"));

        assert!(Preprocessor::from_slice(b"not json").is_err());
    }
}
