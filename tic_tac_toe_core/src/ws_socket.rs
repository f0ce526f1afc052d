use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_tungstenite::{accept_async_with_config, client_async_with_config, WebSocketStream};
use tracing::{debug, error, info};
use tungstenite::error::CapacityError;
use tungstenite::protocol::{Role, WebSocketConfig};
use tungstenite::Message;

use crate::error::{Error, Result};
use crate::game::message::{DecodeError, WireMessage, MAX_MESSAGE_LEN};
use crate::game::models::PeerRole;

/// Frames and messages above `MAX_MESSAGE_LEN` are refused while reading,
/// before they are buffered.
fn frame_limits() -> WebSocketConfig {
    WebSocketConfig::default()
        .max_message_size(Some(MAX_MESSAGE_LEN))
        .max_frame_size(Some(MAX_MESSAGE_LEN))
}

/// The single connection between the two peers. Every logical message is
/// one text frame, so a message is never split across reads.
///
/// The connection is assumed ordered and non-duplicating; there are no
/// sequence numbers or acknowledgements on top of it.
pub struct Transport<S> {
    socket: WebSocketStream<S>,
    peer: Option<SocketAddr>,
}

impl Transport<TcpStream> {
    /// Binds `addr` and waits for exactly one peer to connect.
    pub async fn listen(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Waiting for opponent on {}", listener.local_addr()?);
        Self::accept(&listener).await
    }

    pub async fn accept(listener: &TcpListener) -> Result<Self> {
        let (stream, peer) = listener.accept().await?;
        info!("🔗 Connection attempt from {}", peer);
        let socket = accept_async_with_config(stream, Some(frame_limits())).await?;
        info!("✅ Connected to opponent at {}", peer);
        Ok(Self {
            socket,
            peer: Some(peer),
        })
    }

    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        let peer = stream.peer_addr()?;
        let url = format!("ws://{}/", peer);
        let (socket, _) = client_async_with_config(url, stream, Some(frame_limits())).await?;
        info!("✅ Connected to opponent at {}", peer);
        Ok(Self {
            socket,
            peer: Some(peer),
        })
    }
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already established byte stream. The initiator takes the
    /// client side of the framing.
    pub async fn from_stream(stream: S, role: PeerRole) -> Self {
        let role = match role {
            PeerRole::Initiator => Role::Client,
            PeerRole::Listener => Role::Server,
        };
        Self {
            socket: WebSocketStream::from_raw_socket(stream, role, Some(frame_limits())).await,
            peer: None,
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub async fn send(&mut self, message: &WireMessage) -> Result<()> {
        let text = message.encode()?;
        debug!("📤 Sending: {}", text);
        self.socket.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Waits for the next payload. Blocks until one arrives or the
    /// connection goes away; dropping the future loses nothing.
    pub async fn recv(&mut self) -> Result<String> {
        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    debug!("📩 Received: {}", text.as_str());
                    return Ok(text.as_str().to_owned());
                }
                Ok(Message::Binary(data)) => {
                    debug!("📩 Received {} binary bytes", data.len());
                    return String::from_utf8(data.to_vec())
                        .map_err(|_| Error::ProtocolDecode(DecodeError::NotUtf8));
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Ok(Message::Close(reason)) => {
                    info!("❌ Opponent closed the connection: {:?}", reason);
                    return Err(Error::ConnectionClosed);
                }
                Err(tungstenite::Error::ConnectionClosed)
                | Err(tungstenite::Error::AlreadyClosed) => return Err(Error::ConnectionClosed),
                Err(tungstenite::Error::Capacity(CapacityError::MessageTooLong { size, .. })) => {
                    error!("❌ Opponent sent {} bytes in one message", size);
                    return Err(Error::ProtocolDecode(DecodeError::TooLong { len: size }));
                }
                Err(e) => {
                    error!("❌ Connection lost: {}", e);
                    return Err(e.into());
                }
            }
        }

        info!("❌ Connection ended.");
        Err(Error::ConnectionClosed)
    }

    /// Closes the connection. A peer that already hung up is not an error.
    pub async fn close(&mut self) -> Result<()> {
        match self.socket.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                debug!("Connection was already closed.");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
