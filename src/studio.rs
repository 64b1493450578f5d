//! The interaction controller and the state it owns.
//!
//! Every mutation happens here, on the UI thread. Network replies reach the
//! studio only through [`Studio::tick`], which drains the channel and the
//! prediction client once per frame, so all state changes are serialized.

use tracing::{debug, info, warn};

use crate::algorithm::Algorithm;
use crate::coords::{CoordinateMapper, DataPos, ScreenPos};
use crate::params::{ParamValue, ParameterSet};
use crate::points::{Label, Point, PointId, PointStore};
use crate::predict::{PredictionLink, PredictionReply, PredictionTicket};
use crate::protocol::{ModelUpdate, PredictionValue, TrainingRequest};
use crate::render::{self, Scene, ViewState};
use crate::sync::{ChannelState, SyncLink};

/// Labels offered by the class selector.
pub const CLASS_LABELS: [Label; 2] = [0, 1];

/// A pointer gesture on the canvas, already resolved against the glyphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// A click on empty canvas. `modified` is true when shift was held.
    Canvas { at: ScreenPos, modified: bool },
    /// A click on the glyph of a stored point.
    Glyph(PointId),
}

pub struct Studio {
    mapper: CoordinateMapper,
    points: PointStore,
    algorithm: Algorithm,
    params: ParameterSet,
    current_label: Label,
    test_point: Option<DataPos>,
    prediction: Option<PredictionValue>,
    payload: Option<ModelUpdate>,
    /// Bumped on every change to points, algorithm or parameters.
    revision: u64,
    pushed_revision: Option<u64>,
    issued_predictions: u64,
    latest_ticket: Option<PredictionTicket>,
    sync: Box<dyn SyncLink>,
    predictor: Box<dyn PredictionLink>,
}

impl Studio {
    pub fn new(
        mapper: CoordinateMapper,
        sync: Box<dyn SyncLink>,
        predictor: Box<dyn PredictionLink>,
    ) -> Self {
        Self {
            mapper,
            points: PointStore::new(),
            algorithm: Algorithm::default(),
            params: ParameterSet::default(),
            current_label: CLASS_LABELS[0],
            test_point: None,
            prediction: None,
            payload: None,
            revision: 0,
            pushed_revision: None,
            issued_predictions: 0,
            latest_ticket: None,
            sync,
            predictor,
        }
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn points(&self) -> &PointStore {
        &self.points
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn current_label(&self) -> Label {
        self.current_label
    }

    pub fn test_point(&self) -> Option<DataPos> {
        self.test_point
    }

    pub fn prediction(&self) -> Option<&PredictionValue> {
        self.prediction.as_ref()
    }

    pub fn payload(&self) -> Option<&ModelUpdate> {
        self.payload.as_ref()
    }

    pub fn connection_state(&self) -> ChannelState {
        self.sync.state()
    }

    pub fn is_connected(&self) -> bool {
        self.sync.state().is_open()
    }

    pub fn view(&self) -> ViewState<'_> {
        ViewState {
            algorithm: self.algorithm,
            points: &self.points,
            test_point: self.test_point,
            payload: self.payload.as_ref(),
        }
    }

    pub fn scene(&self) -> Scene {
        render::render(&self.view(), &self.mapper)
    }

    /// Resolves a raw click: a glyph under the pointer wins over the canvas.
    pub fn click(&mut self, at: ScreenPos, modified: bool) {
        let glyphs = render::point_glyphs(&self.points, &self.mapper);
        let gesture = match render::hit_test(&glyphs, at) {
            Some(id) => Gesture::Glyph(id),
            None => Gesture::Canvas { at, modified },
        };
        self.apply(gesture);
    }

    pub fn apply(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Glyph(id) => {
                if self.points.remove(id).is_some() {
                    self.changed();
                }
            }
            Gesture::Canvas { at, modified } => {
                let Some(pos) = self.mapper.pick(at) else {
                    return;
                };
                if modified {
                    self.set_test_point(pos);
                } else {
                    self.add_point(pos);
                }
            }
        }
    }

    /// Adds a training point, labeled only for classification algorithms.
    pub fn add_point(&mut self, pos: DataPos) -> PointId {
        let point = if self.algorithm.is_classification() {
            Point::labeled(pos.x, pos.y, self.current_label)
        } else {
            Point::new(pos.x, pos.y)
        };
        let id = self.points.add(point);
        self.changed();
        id
    }

    /// Replaces the test point and issues exactly one prediction call for it.
    pub fn set_test_point(&mut self, pos: DataPos) {
        self.test_point = Some(pos);
        self.prediction = None;
        self.issued_predictions += 1;
        let ticket = PredictionTicket::new(self.issued_predictions, pos);
        self.latest_ticket = Some(ticket);
        self.predictor.submit(ticket);
    }

    pub fn clear_test_point(&mut self) {
        self.test_point = None;
        self.prediction = None;
        self.latest_ticket = None;
    }

    /// Empties points, test point, prediction and payload in one step.
    pub fn clear_all(&mut self) {
        self.points.clear();
        self.payload = None;
        self.clear_test_point();
        self.changed();
    }

    /// Switches algorithm. Point sets of different tasks are never mixed, so
    /// everything authored so far is dropped.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        if algorithm == self.algorithm {
            return;
        }
        info!("studio: switching to {}", algorithm.key());
        self.algorithm = algorithm;
        self.clear_all();
    }

    pub fn set_param(&mut self, value: ParamValue) {
        self.params.set(value);
        self.changed();
    }

    pub fn set_max_depth_slider(&mut self, value: i64) {
        self.params.set_max_depth_slider(value);
        self.changed();
    }

    /// Only affects points added from now on.
    pub fn select_label(&mut self, label: Label) {
        self.current_label = label;
    }

    /// Drains network replies and pushes any change the channel has not seen.
    pub fn tick(&mut self) {
        for update in self.sync.poll() {
            self.payload = Some(update);
        }
        for reply in self.predictor.poll() {
            self.accept_prediction(reply);
        }
        self.sync_now();
    }

    fn is_current(&self, ticket: &PredictionTicket) -> bool {
        self.latest_ticket.is_some_and(|latest| latest.seq() == ticket.seq())
            && self.test_point == Some(ticket.point())
    }

    fn accept_prediction(&mut self, reply: PredictionReply) {
        if !self.is_current(&reply.ticket) {
            debug!(seq = reply.ticket.seq(), "studio: discarding superseded prediction");
            return;
        }
        match reply.outcome {
            Ok(value) => self.prediction = Some(value),
            Err(e) => warn!("studio: prediction failed: {e}"),
        }
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.sync_now();
    }

    fn sync_now(&mut self) {
        if self.pushed_revision == Some(self.revision)
            || self.points.is_empty()
            || !self.sync.state().is_open()
        {
            return;
        }
        let request = TrainingRequest {
            points: self.points.to_vec(),
            algorithm: self.algorithm,
            params: self.params.clone(),
        };
        match self.sync.push(&request) {
            Ok(()) => {
                debug!(revision = self.revision, points = request.points.len(), "studio: pushed");
                self.pushed_revision = Some(self.revision);
            }
            Err(e) => warn!("studio: push failed: {e}"),
        }
    }
}
