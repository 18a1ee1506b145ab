//! Socket transport seam.
//!
//! The manager never touches a WebSocket directly. It asks a [`Connector`]
//! for a [`Socket`], which is just a pair of channels: frames going out and
//! [`SocketEvent`]s coming back. [`WsConnector`] backs that with
//! `tokio-tungstenite`; tests plug in a scripted connector instead.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lanyard_common::ConnectionError;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Socket
// ---------------------------------------------------------------------------

/// Something that happened on a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Open,
    Message(String),
    /// Always the last event a socket produces.
    Close,
    /// Always followed by `Close`.
    Error(String),
}

/// A frame for the transport to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Manager side of a socket.
#[derive(Debug)]
pub struct Socket {
    pub outbound: mpsc::UnboundedSender<Outbound>,
    pub events: mpsc::UnboundedReceiver<SocketEvent>,
}

/// Transport side of a socket.
#[derive(Debug)]
pub struct SocketPeer {
    pub events: mpsc::UnboundedSender<SocketEvent>,
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl Socket {
    /// Create the two connected halves.
    pub fn pair() -> (Socket, SocketPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Socket {
                outbound: outbound_tx,
                events: events_rx,
            },
            SocketPeer {
                events: events_tx,
                outbound: outbound_rx,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Opens sockets.
///
/// `open` must return immediately: connection progress is reported later
/// through the socket's events. An `Err` means the socket could not even be
/// constructed.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, url: &str) -> Result<Socket, ConnectionError>;
}

/// Production connector on `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
        }
    }
}

impl WsConnector {
    pub fn with_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for WsConnector {
    fn open(&self, url: &str) -> Result<Socket, ConnectionError> {
        let request = url
            .into_client_request()
            .map_err(|e| ConnectionError::Construction(format!("invalid url {url:?}: {e}")))?;
        match request.uri().scheme_str() {
            Some("ws") | Some("wss") => {}
            other => {
                return Err(ConnectionError::Construction(format!(
                    "unsupported scheme {:?} in {url:?}",
                    other.unwrap_or("")
                )))
            }
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            ConnectionError::Construction("no tokio runtime available".to_string())
        })?;

        let (socket, peer) = Socket::pair();
        runtime.spawn(run_socket(request, peer, self.connect_timeout));
        Ok(socket)
    }
}

// ---------------------------------------------------------------------------
// Socket task
// ---------------------------------------------------------------------------

/// Drive one WebSocket until it closes, translating it into socket events.
async fn run_socket(request: Request, peer: SocketPeer, connect_timeout: Duration) {
    let SocketPeer {
        events,
        mut outbound,
    } = peer;
    let host = request.uri().host().unwrap_or("").to_string();

    let connect = tokio::time::timeout(connect_timeout, tokio_tungstenite::connect_async(request));
    tokio::pin!(connect);

    let ws_stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok(Ok((ws_stream, _))) => break ws_stream,
                Ok(Err(e)) => {
                    warn!(host = %host, error = %e, "Failed to connect to Lanyard");
                    let _ = events.send(SocketEvent::Error(e.to_string()));
                    let _ = events.send(SocketEvent::Close);
                    return;
                }
                Err(_elapsed) => {
                    warn!(host = %host, "WebSocket connection timed out after {:?}", connect_timeout);
                    let _ = events.send(SocketEvent::Error("connection timed out".to_string()));
                    let _ = events.send(SocketEvent::Close);
                    return;
                }
            },
            cmd = outbound.recv() => match cmd {
                // Nothing can be written before the handshake finishes.
                Some(Outbound::Text(_)) => continue,
                Some(Outbound::Close) | None => {
                    debug!(host = %host, "Socket closed while connecting");
                    let _ = events.send(SocketEvent::Close);
                    return;
                }
            },
        }
    };

    info!(host = %host, "Connected to Lanyard");
    let _ = events.send(SocketEvent::Open);

    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            cmd = outbound.recv() => match cmd {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                        warn!(error = %e, "WebSocket write failed");
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = ws_write.send(WsMessage::Close(None)).await;
                    break;
                }
            },
            frame = ws_read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = events.send(SocketEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    info!(host = %host, "Lanyard closed connection");
                    break;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    let _ = events.send(SocketEvent::Error(e.to_string()));
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = events.send(SocketEvent::Close);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    async fn next_event(socket: &mut Socket) -> Option<SocketEvent> {
        tokio::time::timeout(Duration::from_secs(5), socket.events.recv())
            .await
            .expect("timed out waiting for a socket event")
    }

    #[test]
    fn pair_is_connected() {
        let (socket, mut peer) = Socket::pair();
        let Socket {
            outbound,
            mut events,
        } = socket;

        outbound.send(Outbound::Text("hi".into())).unwrap();
        assert_eq!(peer.outbound.try_recv().unwrap(), Outbound::Text("hi".into()));

        peer.events.send(SocketEvent::Open).unwrap();
        assert_eq!(events.try_recv().unwrap(), SocketEvent::Open);
    }

    #[test]
    fn rejects_garbage_url() {
        let err = WsConnector::default().open("not a url at all").unwrap_err();
        assert!(matches!(err, ConnectionError::Construction(_)));
    }

    #[test]
    fn rejects_http_scheme() {
        let err = WsConnector::default()
            .open("https://api.lanyard.rest/socket")
            .unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn requires_runtime() {
        let err = WsConnector::default()
            .open("wss://api.lanyard.rest/socket")
            .unwrap_err();
        assert!(err.to_string().contains("no tokio runtime"));
    }

    #[tokio::test]
    async fn unreachable_host_reports_error_then_close() {
        let connector = WsConnector::with_timeout(Duration::from_secs(5));
        // Port 9 on localhost is "discard"; nothing should speak WebSocket there.
        let mut socket = connector.open("ws://127.0.0.1:9/socket").unwrap();

        let first = socket.events.recv().await.unwrap();
        assert!(matches!(first, SocketEvent::Error(_)));
        assert_eq!(socket.events.recv().await.unwrap(), SocketEvent::Close);
    }

    #[tokio::test]
    async fn closing_before_open_reports_close() {
        let connector = WsConnector::with_timeout(Duration::from_secs(5));
        // TEST-NET-1 address: the handshake never completes.
        let mut socket = connector.open("ws://192.0.2.1:80/socket").unwrap();
        socket.outbound.send(Outbound::Close).unwrap();

        let event = socket.events.recv().await.unwrap();
        assert!(matches!(event, SocketEvent::Close | SocketEvent::Error(_)));
    }

    #[tokio::test]
    async fn live_server_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received_rx) = oneshot::channel();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(WsMessage::Text(r#"{"op":1,"d":{"heartbeat_interval":30000}}"#.into()))
                .await
                .unwrap();

            let reply = loop {
                match ws.next().await {
                    Some(Ok(WsMessage::Text(text))) => break text.as_str().to_owned(),
                    Some(Ok(_)) => continue,
                    other => panic!("expected a text frame, got {other:?}"),
                }
            };
            let _ = received_tx.send(reply);

            ws.send(WsMessage::Close(None)).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let mut socket = WsConnector::default()
            .open(&format!("ws://{addr}/socket"))
            .unwrap();

        assert_eq!(next_event(&mut socket).await, Some(SocketEvent::Open));
        assert_eq!(
            next_event(&mut socket).await,
            Some(SocketEvent::Message(
                r#"{"op":1,"d":{"heartbeat_interval":30000}}"#.into()
            ))
        );

        socket
            .outbound
            .send(Outbound::Text(r#"{"op":3}"#.into()))
            .unwrap();
        let received = tokio::time::timeout(Duration::from_secs(5), received_rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, r#"{"op":3}"#);

        assert_eq!(next_event(&mut socket).await, Some(SocketEvent::Close));
        assert_eq!(next_event(&mut socket).await, None);

        server.await.unwrap();
    }
}
