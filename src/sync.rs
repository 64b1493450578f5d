//! The persistent training channel.
//!
//! One WebSocket per session, driven by a worker thread. The UI thread talks
//! to the worker only through two queues: outbound training frames and
//! inbound [`ChannelEvent`]s, drained once per frame by [`SyncLink::poll`].
//!
//! There is no reconnect. Once the channel is `Closed` it stays closed for
//! the rest of the session.

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};
use tungstenite::handshake::HandshakeError;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use url::Url;

use crate::error::SyncError;
use crate::protocol::{ModelUpdate, TrainingRequest, decode_update};
use crate::session::Session;

/// How long the worker blocks on a read before checking for outbound frames.
const READ_POLL: Duration = Duration::from_millis(25);
/// Upper bound on the TCP connect and on each handshake read.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

impl ChannelState {
    pub fn is_open(self) -> bool {
        self == ChannelState::Open
    }
}

/// What the worker reports back to the UI thread.
#[derive(Debug)]
pub enum ChannelEvent {
    Opened,
    Update(Box<ModelUpdate>),
    Closed,
}

/// The UI-side face of a training channel.
pub trait SyncLink {
    fn state(&self) -> ChannelState;

    /// Sends the full training tuple. Fails unless the channel is open.
    fn push(&mut self, request: &TrainingRequest) -> Result<(), SyncError>;

    /// Applies pending worker events and returns the model updates received
    /// since the last poll, oldest first.
    fn poll(&mut self) -> Vec<ModelUpdate>;
}

enum Outbound {
    Frame(String),
    Shutdown,
}

pub struct SyncChannel {
    state: ChannelState,
    outbound: Sender<Outbound>,
    events: Receiver<ChannelEvent>,
    worker: Option<JoinHandle<()>>,
}

impl SyncChannel {
    /// Opens the session's channel. `notify` is called from the worker after
    /// every event so the UI can wake up and poll.
    pub fn open<N>(session: &Session, notify: N) -> Self
    where
        N: Fn() + Send + 'static,
    {
        let (outbound, outbound_rx) = mpsc::channel();
        let (events_tx, events) = mpsc::channel();
        let url = session.channel_url().clone();
        let worker = thread::Builder::new()
            .name("sketchml-sync".into())
            .spawn(move || run_worker(&url, outbound_rx, events_tx, notify));
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("sync: cannot spawn channel worker: {e}");
                return Self::closed();
            }
        };
        Self {
            state: ChannelState::Connecting,
            outbound,
            events,
            worker,
        }
    }

    fn closed() -> Self {
        let (outbound, _) = mpsc::channel();
        let (_, events) = mpsc::channel();
        Self {
            state: ChannelState::Closed,
            outbound,
            events,
            worker: None,
        }
    }

    /// Tears the channel down. The worker sends a close frame and exits.
    pub fn close(&mut self) {
        if self.state != ChannelState::Closed {
            info!("sync: closing channel");
        }
        self.state = ChannelState::Closed;
        let _ = self.outbound.send(Outbound::Shutdown);
    }
}

impl SyncLink for SyncChannel {
    fn state(&self) -> ChannelState {
        self.state
    }

    fn push(&mut self, request: &TrainingRequest) -> Result<(), SyncError> {
        if !self.state.is_open() {
            return Err(SyncError::NotOpen);
        }
        let frame = request.to_json()?;
        if self.outbound.send(Outbound::Frame(frame)).is_err() {
            self.state = ChannelState::Closed;
            return Err(SyncError::NotOpen);
        }
        Ok(())
    }

    fn poll(&mut self) -> Vec<ModelUpdate> {
        let mut updates = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(ChannelEvent::Opened) => {
                    if self.state == ChannelState::Connecting {
                        self.state = ChannelState::Open;
                    }
                }
                Ok(ChannelEvent::Update(update)) => updates.push(*update),
                Ok(ChannelEvent::Closed) | Err(TryRecvError::Disconnected) => {
                    self.state = ChannelState::Closed;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }
        updates
    }
}

impl Drop for SyncChannel {
    /// A worker still connecting is left to finish on its own; it exits as
    /// soon as it sees the shutdown.
    fn drop(&mut self) {
        let connecting = self.state == ChannelState::Connecting;
        self.close();
        if let Some(worker) = self.worker.take() {
            if !connecting {
                let _ = worker.join();
            }
        }
    }
}

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

fn run_worker<N: Fn()>(
    url: &Url,
    outbound: Receiver<Outbound>,
    events: Sender<ChannelEvent>,
    notify: N,
) {
    let emit = |event: ChannelEvent| {
        let _ = events.send(event);
        notify();
    };
    match connect(url) {
        Ok(mut socket) => {
            info!("sync: channel open at {url}");
            emit(ChannelEvent::Opened);
            match pump(&mut socket, &outbound, &emit) {
                Ok(()) => info!("sync: channel closed"),
                Err(e) => warn!("sync: channel dropped: {e}"),
            }
        }
        Err(e) => warn!("sync: cannot open channel at {url}: {e}"),
    }
    emit(ChannelEvent::Closed);
}

fn open_tcp(addrs: &[SocketAddr]) -> io::Result<TcpStream> {
    let mut last = io::Error::new(ErrorKind::NotFound, "no address to connect to");
    for addr in addrs {
        match TcpStream::connect_timeout(addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(e) => last = e,
        }
    }
    Err(last)
}

/// Connects with bounded connect and handshake times, TLS included for `wss`.
fn connect(url: &Url) -> Result<Socket, SyncError> {
    let stream = open_tcp(&url.socket_addrs(|| None)?)?;
    stream.set_read_timeout(Some(CONNECT_TIMEOUT))?;
    stream.set_write_timeout(Some(CONNECT_TIMEOUT))?;
    let (socket, _response) =
        tungstenite::client_tls_with_config(url.as_str(), stream, None, None).map_err(
            |e| match e {
                HandshakeError::Failure(e) => SyncError::Socket(e),
                HandshakeError::Interrupted(_) => SyncError::Io(ErrorKind::TimedOut.into()),
            },
        )?;
    let tcp = match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => Some(stream),
        MaybeTlsStream::Rustls(stream) => Some(stream.get_ref()),
        _ => None,
    };
    if let Some(tcp) = tcp {
        tcp.set_read_timeout(Some(READ_POLL))?;
    }
    Ok(socket)
}

/// Moves frames both ways until either side closes.
fn pump(
    socket: &mut Socket,
    outbound: &Receiver<Outbound>,
    emit: &impl Fn(ChannelEvent),
) -> Result<(), SyncError> {
    loop {
        loop {
            match outbound.try_recv() {
                Ok(Outbound::Frame(frame)) => socket.send(Message::Text(frame))?,
                Ok(Outbound::Shutdown) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    let _ = socket.flush();
                    return Ok(());
                }
                Err(TryRecvError::Empty) => break,
            }
        }
        match socket.read() {
            Ok(Message::Text(text)) => match decode_update(&text) {
                Ok(update) => emit(ChannelEvent::Update(Box::new(update))),
                Err(e) => debug!("sync: dropping inbound payload: {e}"),
            },
            Ok(Message::Binary(_)) => debug!("sync: ignoring binary frame"),
            Ok(Message::Close(_)) => return Ok(()),
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached() -> (SyncChannel, Sender<ChannelEvent>, Receiver<Outbound>) {
        let (outbound, outbound_rx) = mpsc::channel();
        let (events_tx, events) = mpsc::channel();
        let channel = SyncChannel {
            state: ChannelState::Connecting,
            outbound,
            events,
            worker: None,
        };
        (channel, events_tx, outbound_rx)
    }

    fn request() -> TrainingRequest {
        TrainingRequest {
            points: vec![crate::points::Point::new(1.0, 2.0)],
            algorithm: crate::algorithm::Algorithm::Kmeans,
            params: Default::default(),
        }
    }

    #[test]
    fn test_push_requires_open() {
        let (mut channel, events, outbound) = detached();
        assert!(matches!(channel.push(&request()), Err(SyncError::NotOpen)));

        events.send(ChannelEvent::Opened).unwrap();
        assert!(channel.poll().is_empty());
        assert_eq!(channel.state(), ChannelState::Open);

        channel.push(&request()).unwrap();
        match outbound.try_recv() {
            Ok(Outbound::Frame(frame)) => assert!(frame.contains("\"kmeans\"")),
            _ => panic!("expected a frame"),
        }
    }

    #[test]
    fn test_updates_are_returned_in_order() {
        let (mut channel, events, _outbound) = detached();
        events.send(ChannelEvent::Opened).unwrap();
        for n in 0..3 {
            let mut update = ModelUpdate::default();
            update.visualization.labels = Some(vec![n]);
            events.send(ChannelEvent::Update(Box::new(update))).unwrap();
        }
        let labels: Vec<_> = channel
            .poll()
            .into_iter()
            .map(|u| u.visualization.labels.unwrap()[0])
            .collect();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn test_closed_is_terminal() {
        let (mut channel, events, _outbound) = detached();
        events.send(ChannelEvent::Opened).unwrap();
        events.send(ChannelEvent::Closed).unwrap();
        channel.poll();
        assert_eq!(channel.state(), ChannelState::Closed);

        events.send(ChannelEvent::Opened).unwrap();
        channel.poll();
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(channel.push(&request()).is_err());
    }

    #[test]
    fn test_worker_gone_means_closed() {
        let (mut channel, events, _outbound) = detached();
        drop(events);
        channel.poll();
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[test]
    fn test_drop_does_not_wait_for_connecting_worker() {
        let (release, blocked) = mpsc::channel::<()>();
        let (mut channel, _events, _outbound) = detached();
        channel.worker = Some(thread::spawn(move || {
            let _ = blocked.recv();
        }));
        drop(channel);
        release.send(()).unwrap();
    }

    #[test]
    fn test_secure_scheme_reaches_the_network() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let url = Url::parse(&format!("wss://127.0.0.1:{port}/ws/conn_tls")).unwrap();
        let err = connect(&url).err().unwrap();
        assert!(!matches!(
            err,
            SyncError::Socket(tungstenite::Error::Url(
                tungstenite::error::UrlError::TlsFeatureNotEnabled
            ))
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_local_close_sends_shutdown() {
        let (mut channel, _events, outbound) = detached();
        channel.close();
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(matches!(outbound.try_recv(), Ok(Outbound::Shutdown)));
    }
}
