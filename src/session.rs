//! The per-process session context.
//!
//! A session owns the connection identity, minted once at startup, and the
//! two endpoint urls derived from it. The channel and the prediction client
//! are both built from the same session so the server can pair a prediction
//! call with the model fitted on that client's channel.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use url::Url;

use crate::config::BackendConfig;
use crate::error::ConfigError;

/// Opaque token correlating a client's channel and prediction calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Mints a fresh identity: `conn_<unix millis>_<random hex>`.
    pub fn mint() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let salt: u32 = rand::rng().random();
        Self(format!("conn_{millis}_{salt:08x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: ConnectionId,
    channel_url: Url,
    predict_url: Url,
}

fn with_path(base: &Url, segments: [&str; 2]) -> Result<Url, ConfigError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ConfigError::NotABase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl Session {
    /// Starts a session with a newly minted identity.
    pub fn start(backend: &BackendConfig) -> Result<Self, ConfigError> {
        Self::with_id(backend, ConnectionId::mint())
    }

    pub fn with_id(backend: &BackendConfig, id: ConnectionId) -> Result<Self, ConfigError> {
        let channel_url = with_path(backend.ws_base(), ["ws", id.as_str()])?;
        let predict_url = with_path(backend.http_base(), ["predict", id.as_str()])?;
        Ok(Self {
            id,
            channel_url,
            predict_url,
        })
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// `<ws-scheme>://<host>/ws/<connectionId>`
    pub fn channel_url(&self) -> &Url {
        &self.channel_url
    }

    /// `<http-scheme>://<host>/predict/<connectionId>`
    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }
}
