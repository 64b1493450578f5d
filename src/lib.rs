//! Client core for sketching 2-D datasets and watching a remote model fit them.
//!
//! The crate is frontend-agnostic: [`studio::Studio`] owns all state and turns
//! gestures into training pushes and prediction calls, and [`render::render`]
//! turns that state into paint layers. The `sketchml-app` crate paints them
//! with egui.

// Include submodules
pub mod algorithm;
pub mod config;
pub mod coords;
pub mod error;
pub mod params;
pub mod points;
pub mod predict;
pub mod protocol;
pub mod render;
pub mod session;
pub mod studio;
pub mod sync;

// Re-export the types a frontend needs
pub use algorithm::{Algorithm, TaskType};
pub use config::BackendConfig;
pub use coords::{CoordinateMapper, DataPos, ScreenPos, Viewport};
pub use error::{ConfigError, PredictError, ProtocolError, SyncError};
pub use params::{Kernel, ParamField, ParamValue, ParameterSet};
pub use points::{Label, Point, PointId, PointStore};
pub use predict::{PredictionClient, PredictionLink, PredictionTicket};
pub use protocol::{ModelUpdate, PredictionValue, TrainingRequest};
pub use render::{Layer, LayerKind, Scene, Shape};
pub use session::{ConnectionId, Session};
pub use studio::{Gesture, Studio};
pub use sync::{ChannelState, SyncChannel, SyncLink};
