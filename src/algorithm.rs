use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The kind of problem an algorithm solves. Decides whether points carry
/// labels and which overlays are relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Regression,
    Classification,
    Clustering,
}

/// The algorithms the remote service knows how to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    LinearRegression,
    LogisticRegression,
    NaiveBayes,
    Knn,
    Svm,
    RandomForest,
    Kmeans,
}

impl Algorithm {
    /// Registry order, as offered in the selector.
    pub const ALL: [Algorithm; 7] = [
        Algorithm::LinearRegression,
        Algorithm::LogisticRegression,
        Algorithm::NaiveBayes,
        Algorithm::Knn,
        Algorithm::Svm,
        Algorithm::RandomForest,
        Algorithm::Kmeans,
    ];

    /// Wire key, as sent in the `algorithm` field.
    pub fn key(self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "linear_regression",
            Algorithm::LogisticRegression => "logistic_regression",
            Algorithm::NaiveBayes => "naive_bayes",
            Algorithm::Knn => "knn",
            Algorithm::Svm => "svm",
            Algorithm::RandomForest => "random_forest",
            Algorithm::Kmeans => "kmeans",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "Linear Regression",
            Algorithm::LogisticRegression => "Logistic Regression",
            Algorithm::NaiveBayes => "Naive Bayes",
            Algorithm::Knn => "K-Nearest Neighbors",
            Algorithm::Svm => "Support Vector Machine",
            Algorithm::RandomForest => "Random Forest",
            Algorithm::Kmeans => "K-Means Clustering",
        }
    }

    pub fn task_type(self) -> TaskType {
        match self {
            Algorithm::LinearRegression => TaskType::Regression,
            Algorithm::Kmeans => TaskType::Clustering,
            _ => TaskType::Classification,
        }
    }

    pub fn is_classification(self) -> bool {
        self.task_type() == TaskType::Classification
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match_serde() {
        for algorithm in Algorithm::ALL {
            let json = serde_json::to_string(&algorithm).unwrap();
            assert_eq!(json, format!("\"{}\"", algorithm.key()));
            assert_eq!(serde_json::from_str::<Algorithm>(&json).unwrap(), algorithm);
        }
    }

    #[test]
    fn test_task_types() {
        assert_eq!(Algorithm::LinearRegression.task_type(), TaskType::Regression);
        assert_eq!(Algorithm::Kmeans.task_type(), TaskType::Clustering);
        let classifiers = Algorithm::ALL
            .into_iter()
            .filter(|a| a.is_classification())
            .count();
        assert_eq!(classifiers, 5);
    }

    #[test]
    fn test_unknown_key() {
        assert!(serde_json::from_str::<Algorithm>("\"perceptron\"").is_err());
    }
}
