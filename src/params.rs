//! Hyperparameters sent along with every training push.
//!
//! The set is the union of every algorithm's knobs. Only a subset is editable
//! for the active algorithm, but the whole set always goes over the wire and
//! the remote service ignores what it does not need.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    Linear,
    #[default]
    Rbf,
    Poly,
}

impl Kernel {
    pub const ALL: [Kernel; 3] = [Kernel::Linear, Kernel::Rbf, Kernel::Poly];
}

impl Display for Kernel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kernel::Linear => "Linear",
            Kernel::Rbf => "RBF",
            Kernel::Poly => "Polynomial",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Inverse regularization strength.
    #[serde(rename = "C")]
    pub c: f64,
    pub n_clusters: i64,
    pub kernel: Kernel,
    pub gamma: String,
    pub n_neighbors: i64,
    pub n_estimators: i64,
    /// `None` lets the trees grow without a depth limit.
    pub max_depth: Option<i64>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            c: 1.0,
            n_clusters: 3,
            kernel: Kernel::Rbf,
            gamma: "scale".to_string(),
            n_neighbors: 5,
            n_estimators: 100,
            max_depth: None,
        }
    }
}

/// Names of the individual fields of a [`ParameterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    C,
    NClusters,
    Kernel,
    Gamma,
    NNeighbors,
    NEstimators,
    MaxDepth,
}

/// A new value for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    C(f64),
    NClusters(i64),
    Kernel(Kernel),
    Gamma(String),
    NNeighbors(i64),
    NEstimators(i64),
    MaxDepth(Option<i64>),
}

impl ParamValue {
    pub fn field(&self) -> ParamField {
        match self {
            ParamValue::C(_) => ParamField::C,
            ParamValue::NClusters(_) => ParamField::NClusters,
            ParamValue::Kernel(_) => ParamField::Kernel,
            ParamValue::Gamma(_) => ParamField::Gamma,
            ParamValue::NNeighbors(_) => ParamField::NNeighbors,
            ParamValue::NEstimators(_) => ParamField::NEstimators,
            ParamValue::MaxDepth(_) => ParamField::MaxDepth,
        }
    }
}

/// Bounds of the editing control for a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamField {
    pub fn label(self) -> &'static str {
        match self {
            ParamField::C => "C (Regularization)",
            ParamField::NClusters => "Clusters",
            ParamField::Kernel => "Kernel",
            ParamField::Gamma => "Gamma",
            ParamField::NNeighbors => "Neighbors (K)",
            ParamField::NEstimators => "Trees (n_estimators)",
            ParamField::MaxDepth => "Max Depth",
        }
    }

    /// Slider bounds, `None` for fields edited with a selector (or not at all).
    ///
    /// For `MaxDepth` the slider value 0 stands for "no limit".
    pub fn range(self) -> Option<SliderRange> {
        let (min, max, step) = match self {
            ParamField::C => (0.1, 10.0, 0.1),
            ParamField::NClusters => (2.0, 8.0, 1.0),
            ParamField::NNeighbors => (1.0, 20.0, 1.0),
            ParamField::NEstimators => (10.0, 200.0, 10.0),
            ParamField::MaxDepth => (0.0, 20.0, 1.0),
            ParamField::Kernel | ParamField::Gamma => return None,
        };
        Some(SliderRange { min, max, step })
    }

    /// Fields the user may edit while `algorithm` is active.
    pub fn editable_for(algorithm: Algorithm) -> &'static [ParamField] {
        match algorithm {
            Algorithm::Kmeans => &[ParamField::NClusters],
            Algorithm::LogisticRegression => &[ParamField::C],
            Algorithm::Svm => &[ParamField::C, ParamField::Kernel],
            Algorithm::Knn => &[ParamField::NNeighbors],
            Algorithm::RandomForest => &[ParamField::NEstimators, ParamField::MaxDepth],
            Algorithm::LinearRegression | Algorithm::NaiveBayes => &[],
        }
    }
}

impl ParameterSet {
    /// Replaces one field. Any value is accepted.
    pub fn set(&mut self, value: ParamValue) {
        match value {
            ParamValue::C(c) => self.c = c,
            ParamValue::NClusters(n) => self.n_clusters = n,
            ParamValue::Kernel(kernel) => self.kernel = kernel,
            ParamValue::Gamma(gamma) => self.gamma = gamma,
            ParamValue::NNeighbors(n) => self.n_neighbors = n,
            ParamValue::NEstimators(n) => self.n_estimators = n,
            ParamValue::MaxDepth(depth) => self.max_depth = depth,
        }
    }

    pub fn get(&self, field: ParamField) -> ParamValue {
        match field {
            ParamField::C => ParamValue::C(self.c),
            ParamField::NClusters => ParamValue::NClusters(self.n_clusters),
            ParamField::Kernel => ParamValue::Kernel(self.kernel),
            ParamField::Gamma => ParamValue::Gamma(self.gamma.clone()),
            ParamField::NNeighbors => ParamValue::NNeighbors(self.n_neighbors),
            ParamField::NEstimators => ParamValue::NEstimators(self.n_estimators),
            ParamField::MaxDepth => ParamValue::MaxDepth(self.max_depth),
        }
    }

    /// Depth as shown on the slider, where 0 means unlimited.
    pub fn max_depth_slider(&self) -> i64 {
        self.max_depth.unwrap_or(0)
    }

    pub fn set_max_depth_slider(&mut self, value: i64) {
        self.max_depth = (value != 0).then_some(value);
    }
}
