//! Abstraction over the byte transport: send one application package, await
//! the link-layer ACK/NAK, and deliver received packages (§4.6 LinkChannel).
//!
//! The core never sees APDU fragmentation, DLE/STX/ETX framing, or CRCs -
//! those belong to the transport. What we do see is whole packages, already
//! assembled by [crate::logging::PacketWriter::read_packet]; a [LinkChannel]
//! implementation's only remaining job is to tell link-layer replies (`80 00`
//! Ack, `84 xx` Nack) apart from application packages and route each
//! accordingly.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use crate::decoder::{DecodedEvent, ReplyDecoder};
use crate::events::EventBus;
use crate::logging::{AsyncReadPacket, AsyncWritePacket, PacketWriter};

/// How `send` resolves relative to the link-layer handshake, not the
/// eventual application-level reply - that's [crate::session::CommandSession]'s
/// job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    AcknowledgeReceived,
    NegativeAcknowledge,
    Timeout,
    TransportError,
}

impl SendOutcome {
    /// Used to build the `Error(reason)` text for outcomes that aren't
    /// `AcknowledgeReceived` (§4.7 step 2).
    pub fn name(&self) -> &'static str {
        match self {
            SendOutcome::AcknowledgeReceived => "AcknowledgeReceived",
            SendOutcome::NegativeAcknowledge => "NegativeAcknowledge",
            SendOutcome::Timeout => "Timeout",
            SendOutcome::TransportError => "TransportError",
        }
    }
}

/// How long `send` waits for the link-layer Ack/Nak before giving up. This is
/// the handshake timer, not the (much longer, configurable) command
/// completion timer `CommandSession` applies afterwards.
const ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport-facing contract the core engine depends on.
///
/// Unlike the protocol notes' literal `on_package(package: bytes)` callback,
/// inbound application packages are delivered through an [EventBus] (§9's
/// explicit-observer-registration redesign) rather than a single fixed
/// callback slot - see [LinkChannel::events].
#[async_trait]
pub trait LinkChannel: Send + Sync {
    /// Sends one already-encoded package and waits for the link-layer
    /// handshake. `cancel` can abort the wait early; a cancelled wait still
    /// resolves with `Ok(SendOutcome::Timeout)` rather than an error, since
    /// no network abort was sent.
    async fn send(&self, package: &[u8], cancel: &CancellationToken) -> Result<SendOutcome>;

    /// Fan-out point for decoded inbound application packages (unsolicited
    /// or otherwise). Subscribing here is how [crate::session::CommandSession]
    /// and [crate::client::ZvtClient] observe `CompletionReceived`,
    /// `AbortReceived`, `StatusInformationReceived`, and friends.
    fn events(&self) -> &Arc<EventBus<DecodedEvent>>;

    /// Releases the transport. Subsequent `send` calls fail.
    async fn close(&self);
}

/// A [LinkChannel] over any `AsyncRead + AsyncWrite` byte stream, spawning a
/// single background task that owns the read half.
pub struct StreamLinkChannel {
    writer: Mutex<PacketWriter<tokio::io::WriteHalf<TcpStream>>>,
    pending_ack: Arc<Mutex<Option<oneshot::Sender<SendOutcome>>>>,
    events: Arc<EventBus<DecodedEvent>>,
    reader_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StreamLinkChannel {
    /// Splits `stream` and spawns the reader task. `decoder` is immutable for
    /// the lifetime of the channel (§3 "Reply decoder ... immutable after
    /// construction").
    pub fn new(stream: TcpStream, decoder: ReplyDecoder) -> Arc<Self> {
        let (read_half, write_half) = tokio::io::split(stream);
        let events = EventBus::new();
        let pending_ack = Arc::new(Mutex::new(None));

        let reader_events = events.clone();
        let reader_pending = pending_ack.clone();
        let handle = tokio::spawn(Self::reader_loop(
            PacketWriter { source: read_half },
            decoder,
            reader_events,
            reader_pending,
        ));

        Arc::new(Self {
            writer: Mutex::new(PacketWriter { source: write_half }),
            pending_ack,
            events,
            reader_task: Mutex::new(Some(handle)),
        })
    }

    async fn reader_loop(
        mut reader: PacketWriter<tokio::io::ReadHalf<TcpStream>>,
        decoder: ReplyDecoder,
        events: Arc<EventBus<DecodedEvent>>,
        pending_ack: Arc<Mutex<Option<oneshot::Sender<SendOutcome>>>>,
    ) {
        loop {
            let raw = match reader.read_packet().await {
                Ok(raw) => raw,
                Err(err) => {
                    log::warn!("Link read failed, closing reader loop: {err:?}");
                    if let Some(tx) = pending_ack.lock().await.take() {
                        let _ = tx.send(SendOutcome::TransportError);
                    }
                    return;
                }
            };

            match (raw.first(), raw.get(1)) {
                (Some(0x80), Some(0x00)) => {
                    if let Some(tx) = pending_ack.lock().await.take() {
                        let _ = tx.send(SendOutcome::AcknowledgeReceived);
                    } else {
                        log::warn!("Received unexpected Ack, no command in flight");
                    }
                }
                (Some(0x84), Some(_)) => {
                    if let Some(tx) = pending_ack.lock().await.take() {
                        let _ = tx.send(SendOutcome::NegativeAcknowledge);
                    } else {
                        log::warn!("Received unexpected Nack, no command in flight");
                    }
                }
                _ => match decoder.decode(&raw) {
                    Ok(Some(event)) => events.fire(&event),
                    Ok(None) => log::warn!("Dropping package with unknown control field: {raw:?}"),
                    Err(err) => log::warn!("Dropping unparseable package {raw:?}: {err:?}"),
                },
            }
        }
    }
}

#[async_trait]
impl LinkChannel for StreamLinkChannel {
    async fn send(&self, package: &[u8], cancel: &CancellationToken) -> Result<SendOutcome> {
        let (tx, rx) = oneshot::channel();
        *self.pending_ack.lock().await = Some(tx);

        log::debug!("Sending package {package:?}");
        if let Err(err) = self.writer.lock().await.write_packet(package).await {
            self.pending_ack.lock().await.take();
            return Err(err);
        }

        tokio::select! {
            result = rx => Ok(result.unwrap_or(SendOutcome::TransportError)),
            _ = tokio::time::sleep(ACK_TIMEOUT) => {
                self.pending_ack.lock().await.take();
                Ok(SendOutcome::Timeout)
            }
            _ = cancel.cancelled() => {
                self.pending_ack.lock().await.take();
                Ok(SendOutcome::Timeout)
            }
        }
    }

    fn events(&self) -> &Arc<EventBus<DecodedEvent>> {
        &self.events
    }

    async fn close(&self) {
        if let Some(handle) = self.reader_task.lock().await.take() {
            handle.abort();
        }
    }
}

/// Convenience constructor mirroring the teacher's `TcpStream::connect` usage
/// in `zvt_feig_terminal`, without the reconnect/mock machinery that crate
/// layers on top - reconnection policy belongs to the application, not the
/// core engine.
pub async fn connect_tcp(addr: impl tokio::net::ToSocketAddrs, decoder: ReplyDecoder) -> Result<Arc<StreamLinkChannel>> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|err| anyhow!("Failed to connect: {err:?}"))?;
    Ok(StreamLinkChannel::new(stream, decoder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_outcome_names_are_stable() {
        assert_eq!(SendOutcome::AcknowledgeReceived.name(), "AcknowledgeReceived");
        assert_eq!(SendOutcome::NegativeAcknowledge.name(), "NegativeAcknowledge");
        assert_eq!(SendOutcome::Timeout.name(), "Timeout");
        assert_eq!(SendOutcome::TransportError.name(), "TransportError");
    }
}
