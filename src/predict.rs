//! One-shot prediction calls.
//!
//! Each call is tagged with the [`PredictionTicket`] that caused it. The
//! client never decides whether a reply is still wanted; it only hands the
//! reply back with its ticket and the studio applies the discard rule.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::coords::DataPos;
use crate::error::PredictError;
use crate::protocol::{PredictionValue, decode_prediction};
use crate::session::Session;

/// Causality token of a prediction call: the call's issue order and the
/// test point it was issued for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionTicket {
    seq: u64,
    point: DataPos,
}

impl PredictionTicket {
    pub fn new(seq: u64, point: DataPos) -> Self {
        Self { seq, point }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn point(&self) -> DataPos {
        self.point
    }
}

#[derive(Debug)]
pub struct PredictionReply {
    pub ticket: PredictionTicket,
    pub outcome: Result<PredictionValue, PredictError>,
}

/// The UI-side face of the prediction endpoint.
pub trait PredictionLink {
    /// Starts a call for the ticket's point. Never blocks.
    fn submit(&mut self, ticket: PredictionTicket);

    /// Replies that arrived since the last poll, in arrival order.
    fn poll(&mut self) -> Vec<PredictionReply>;
}

pub struct PredictionClient {
    url: Url,
    agent: ureq::Agent,
    replies_tx: Sender<PredictionReply>,
    replies: Receiver<PredictionReply>,
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl PredictionClient {
    pub fn new<N>(session: &Session, notify: N) -> Self
    where
        N: Fn() + Send + Sync + 'static,
    {
        let (replies_tx, replies) = mpsc::channel();
        Self {
            url: session.predict_url().clone(),
            agent: ureq::Agent::new_with_defaults(),
            replies_tx,
            replies,
            notify: Arc::new(notify),
        }
    }
}

fn call(agent: &ureq::Agent, url: &str, point: DataPos) -> Result<PredictionValue, PredictError> {
    let body: Value = agent.post(url).send_json(point)?.body_mut().read_json()?;
    Ok(decode_prediction(body)?)
}

impl PredictionLink for PredictionClient {
    fn submit(&mut self, ticket: PredictionTicket) {
        let agent = self.agent.clone();
        let url = self.url.to_string();
        let replies = self.replies_tx.clone();
        let notify = Arc::clone(&self.notify);
        debug!(seq = ticket.seq(), "predict: requesting {:?}", ticket.point());
        let spawned = thread::Builder::new()
            .name("sketchml-predict".into())
            .spawn(move || {
                let outcome = call(&agent, &url, ticket.point());
                let _ = replies.send(PredictionReply { ticket, outcome });
                notify();
            });
        if let Err(e) = spawned {
            warn!("predict: cannot spawn request thread: {e}");
        }
    }

    fn poll(&mut self) -> Vec<PredictionReply> {
        self.replies.try_iter().collect()
    }
}
