//! Wire messages exchanged with the fitting service.
//!
//! Outbound: a [`TrainingRequest`] on the channel, a [`DataPos`] body on the
//! prediction call. Inbound: a [`ModelUpdate`] on the channel, a
//! [`PredictionValue`] from the prediction call. Any inbound object carrying
//! an `error` key is turned into [`ProtocolError::Remote`].

use std::fmt::{Display, Formatter};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::algorithm::Algorithm;
use crate::coords::DataPos;
use crate::error::ProtocolError;
use crate::params::ParameterSet;
use crate::points::{Label, Point};

/// The full training tuple pushed on every observed change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingRequest {
    pub points: Vec<Point>,
    pub algorithm: Algorithm,
    pub params: ParameterSet,
}

impl TrainingRequest {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Result of a remote fit: what to draw, plus opaque maps for display.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ModelUpdate {
    #[serde(default)]
    pub visualization: Visualization,
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
    #[serde(default)]
    pub metrics: Option<Map<String, Value>>,
}

/// Optional visual artifacts of a fitted model.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Visualization {
    #[serde(default)]
    pub decision_boundary: Option<DecisionBoundary>,
    #[serde(default)]
    pub line: Option<Vec<DataPos>>,
    #[serde(default)]
    pub centers: Option<Vec<DataPos>>,
    #[serde(default)]
    pub support_vectors: Option<Vec<[f64; 2]>>,
    /// Cluster assignment per training point, in store order at fit time.
    #[serde(default)]
    pub labels: Option<Vec<Label>>,
}

impl Visualization {
    pub fn support_vectors(&self) -> impl Iterator<Item = DataPos> + '_ {
        self.support_vectors
            .iter()
            .flatten()
            .map(|[x, y]| DataPos::new(*x, *y))
    }
}

#[derive(Deserialize)]
struct RawBoundary {
    x: Vec<Vec<f64>>,
    y: Vec<Vec<f64>>,
    z: Vec<Vec<f64>>,
}

/// A meshgrid of class predictions: `z[i, j]` is the class at `(x[i, j], y[i, j])`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawBoundary")]
pub struct DecisionBoundary {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub z: Array2<f64>,
}

impl DecisionBoundary {
    pub fn shape(&self) -> (usize, usize) {
        self.z.dim()
    }

    /// Every grid sample as `(position, class)`.
    pub fn samples(&self) -> impl Iterator<Item = (DataPos, f64)> + '_ {
        self.x
            .iter()
            .zip(self.y.iter())
            .zip(self.z.iter())
            .map(|((x, y), z)| (DataPos::new(*x, *y), *z))
    }
}

fn to_grid(name: &str, rows: Vec<Vec<f64>>) -> Result<Array2<f64>, ProtocolError> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if nrows == 0 || ncols == 0 {
        return Err(ProtocolError::RaggedGrid(format!("`{name}` is empty")));
    }
    if rows.iter().any(|row| row.len() != ncols) {
        return Err(ProtocolError::RaggedGrid(format!("`{name}` has uneven rows")));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| ProtocolError::RaggedGrid(format!("`{name}`: {e}")))
}

impl TryFrom<RawBoundary> for DecisionBoundary {
    type Error = ProtocolError;

    fn try_from(raw: RawBoundary) -> Result<Self, Self::Error> {
        let x = to_grid("x", raw.x)?;
        let y = to_grid("y", raw.y)?;
        let z = to_grid("z", raw.z)?;
        if x.dim() != z.dim() || y.dim() != z.dim() {
            return Err(ProtocolError::RaggedGrid(format!(
                "x {:?}, y {:?}, z {:?}",
                x.dim(),
                y.dim(),
                z.dim()
            )));
        }
        Ok(Self { x, y, z })
    }
}

/// `null`, `false`, `0` and `""` do not mark an error.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn reject_remote_error(value: &Value) -> Result<(), ProtocolError> {
    match value.get("error").filter(|marker| is_truthy(marker)) {
        None => Ok(()),
        Some(Value::String(message)) => Err(ProtocolError::Remote(message.clone())),
        Some(other) => Err(ProtocolError::Remote(other.to_string())),
    }
}

/// Decodes an inbound channel frame.
pub fn decode_update(text: &str) -> Result<ModelUpdate, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    reject_remote_error(&value)?;
    Ok(serde_json::from_value(value)?)
}

/// A prediction as returned by the service: a regression value or a class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictionValue {
    Number(f64),
    Text(String),
}

impl Display for PredictionValue {
    /// Fractional numbers get four decimals; integral numbers and
    /// categorical values are shown verbatim.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionValue::Number(n) if n.fract() != 0.0 => write!(f, "{n:.4}"),
            PredictionValue::Number(n) => write!(f, "{n}"),
            PredictionValue::Text(text) => f.write_str(text),
        }
    }
}

/// Decodes the body of a prediction response.
pub fn decode_prediction(value: Value) -> Result<PredictionValue, ProtocolError> {
    reject_remote_error(&value)?;
    match value {
        Value::Object(mut body) => match body.remove("prediction") {
            Some(Value::Null) | None => Err(ProtocolError::MissingPrediction),
            Some(prediction) => Ok(serde_json::from_value(prediction)?),
        },
        _ => Err(ProtocolError::MissingPrediction),
    }
}

/// Formats a fitted-parameter or metric value for the side panel.
pub fn format_value(value: &Value) -> String {
    match value.as_f64() {
        Some(n) => format!("{n:.4}"),
        None => value.to_string(),
    }
}

/// Formats a metric name for the side panel: `r_squared` → `R SQUARED`.
pub fn format_metric_key(key: &str) -> String {
    key.replacen('_', " ", 1).to_uppercase()
}
