//! Per-command state machine: wires one in-flight command to its
//! terminating event (§4.7 of the protocol notes).
//!
//! Construction subscribes to the link channel's event bus for `Completion`
//! and `Abort`; the [crate::events::Subscription] guards `subscribe` returns
//! are held only for the lifetime of [CommandSession::run] and drop (hence
//! unsubscribe) on every exit path of that function - the invariant that
//! every subscription created here is released before the command resolves
//! is therefore just "the guards go out of scope when `run` returns".
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::decoder::DecodedEvent;
use crate::link::{LinkChannel, SendOutcome};

/// The outcome a caller-visible command resolves to (§4.8 CommandResponse,
/// §7 error kinds).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    #[default]
    Unknown,
    Successful,
    Abort,
    NotSupported,
    Timeout,
    Error,
}

/// What [crate::client::ZvtClient::send_command] ultimately hands back to
/// the caller.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub state: CommandState,
    pub error_message: Option<String>,
}

impl CommandResponse {
    pub fn successful() -> Self {
        Self {
            state: CommandState::Successful,
            error_message: None,
        }
    }

    pub fn abort(message: impl Into<String>) -> Self {
        Self {
            state: CommandState::Abort,
            error_message: Some(message.into()),
        }
    }

    pub fn not_supported() -> Self {
        Self {
            state: CommandState::NotSupported,
            error_message: None,
        }
    }

    pub fn timeout() -> Self {
        Self {
            state: CommandState::Timeout,
            error_message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: CommandState::Error,
            error_message: Some(message.into()),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.state == CommandState::Successful
    }
}

/// What woke [CommandSession::wait_for_terminal] up.
enum Resolution {
    Completion,
    Abort(String),
    /// Any other inbound event - used only to reset the completion timer.
    Activity,
}

/// One object per in-flight command. [crate::client::ZvtClient] is
/// responsible for enforcing that at most one of these runs at a time (§5) -
/// this type itself has no opinion on that.
pub struct CommandSession<'a> {
    link: &'a Arc<dyn LinkChannel>,
    timeout: Duration,
}

impl<'a> CommandSession<'a> {
    pub fn new(link: &'a Arc<dyn LinkChannel>, timeout: Duration) -> Self {
        Self { link, timeout }
    }

    /// Runs the full lifecycle of one command: send, await the link-layer
    /// handshake, and - unless `end_after_ack` is set (LogOff/Abort, §4.7
    /// step 3) - await the terminating application-level reply.
    ///
    /// A negative acknowledge resolves [CommandState::NotSupported] directly
    /// (§3 describes `NotSupported` as "ACK-layer negative"); every other
    /// non-ack outcome resolves [CommandState::Error] carrying the outcome's
    /// name, per §4.7 step 2.
    pub async fn run(
        &self,
        package: &[u8],
        end_after_ack: bool,
        cancel: CancellationToken,
    ) -> CommandResponse {
        match self.link.send(package, &cancel).await {
            Ok(SendOutcome::AcknowledgeReceived) => {}
            Ok(SendOutcome::NegativeAcknowledge) => return CommandResponse::not_supported(),
            Ok(other) => {
                // `send` resolves `Timeout` both for a real ack timeout and
                // for a cancellation that fired while waiting on the ack
                // (§5: cancelled-before-ack must surface as `Cancelled`, not
                // the generic outcome name).
                if cancel.is_cancelled() {
                    return CommandResponse::error("Cancelled");
                }
                return CommandResponse::error(other.name());
            }
            Err(err) => return CommandResponse::error(err.to_string()),
        }

        if end_after_ack {
            return CommandResponse::successful();
        }

        if cancel.is_cancelled() {
            return CommandResponse::error("Cancelled");
        }

        self.wait_for_terminal(cancel).await
    }

    /// Stage (b): waits for `Completion`, `Abort`, cancellation, or the
    /// command-completion timer, whichever comes first.
    ///
    /// The timer resets on any inbound activity rather than firing strictly
    /// `self.timeout` after the ack - see DESIGN.md for why this deviates
    /// from an unconditional one-shot timer.
    async fn wait_for_terminal(&self, cancel: CancellationToken) -> CommandResponse {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Resolution>();

        let tx_completion = tx.clone();
        let _completion_sub = self.link.events().subscribe(move |event: &DecodedEvent| {
            if matches!(event, DecodedEvent::Completion(_)) {
                let _ = tx_completion.send(Resolution::Completion);
            }
        });

        let tx_abort = tx.clone();
        let _abort_sub = self.link.events().subscribe(move |event: &DecodedEvent| {
            if let DecodedEvent::Abort(message) = event {
                let _ = tx_abort.send(Resolution::Abort(message.clone()));
            }
        });

        let tx_activity = tx;
        let _activity_sub = self.link.events().subscribe(move |_event: &DecodedEvent| {
            let _ = tx_activity.send(Resolution::Activity);
        });

        let mut timer = Box::pin(tokio::time::sleep(self.timeout));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return CommandResponse::error("Cancelled"),
                _ = &mut timer => return CommandResponse::timeout(),
                received = rx.recv() => {
                    match received {
                        Some(Resolution::Completion) => return CommandResponse::successful(),
                        Some(Resolution::Abort(message)) => return CommandResponse::abort(message),
                        Some(Resolution::Activity) => {
                            timer.as_mut().reset(tokio::time::Instant::now() + self.timeout);
                        }
                        None => return CommandResponse::timeout(),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::time::Duration as StdDuration;

    struct MockLink {
        events: Arc<EventBus<DecodedEvent>>,
        outcome: SendOutcome,
    }

    #[async_trait]
    impl LinkChannel for MockLink {
        async fn send(&self, _package: &[u8], _cancel: &CancellationToken) -> Result<SendOutcome> {
            Ok(self.outcome)
        }

        fn events(&self) -> &Arc<EventBus<DecodedEvent>> {
            &self.events
        }

        async fn close(&self) {}
    }

    fn mock(outcome: SendOutcome) -> Arc<dyn LinkChannel> {
        Arc::new(MockLink {
            events: EventBus::new(),
            outcome,
        })
    }

    #[tokio::test]
    async fn fire_and_forget_resolves_on_ack_alone() {
        let link = mock(SendOutcome::AcknowledgeReceived);
        let session = CommandSession::new(&link, StdDuration::from_secs(1));
        let response = session.run(&[], true, CancellationToken::new()).await;
        assert_eq!(response, CommandResponse::successful());
    }

    #[tokio::test]
    async fn negative_ack_resolves_not_supported() {
        let link = mock(SendOutcome::NegativeAcknowledge);
        let session = CommandSession::new(&link, StdDuration::from_secs(1));
        let response = session.run(&[], false, CancellationToken::new()).await;
        assert_eq!(response, CommandResponse::not_supported());
    }

    #[tokio::test]
    async fn ack_timeout_is_an_error() {
        let link = mock(SendOutcome::Timeout);
        let session = CommandSession::new(&link, StdDuration::from_secs(1));
        let response = session.run(&[], false, CancellationToken::new()).await;
        assert_eq!(response, CommandResponse::error("Timeout"));
    }

    #[tokio::test]
    async fn cancellation_before_send_resolves_is_still_cancelled() {
        let link = mock(SendOutcome::AcknowledgeReceived);
        let session = CommandSession::new(&link, StdDuration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let response = session.run(&[], false, cancel).await;
        assert_eq!(response, CommandResponse::error("Cancelled"));
    }

    #[tokio::test]
    async fn completion_resolves_successful() {
        let link = mock(SendOutcome::AcknowledgeReceived);
        let events = link.events().clone();
        let link_clone = link.clone();
        let handle = tokio::spawn(async move {
            let session = CommandSession::new(&link_clone, StdDuration::from_secs(5));
            session.run(&[], false, CancellationToken::new()).await
        });

        tokio::time::sleep(StdDuration::from_millis(20)).await;
        events.fire(&DecodedEvent::Completion(None));

        assert_eq!(handle.await.unwrap(), CommandResponse::successful());
    }

    #[tokio::test]
    async fn abort_resolves_with_catalog_message() {
        let link = mock(SendOutcome::AcknowledgeReceived);
        let events = link.events().clone();
        let link_clone = link.clone();
        let handle = tokio::spawn(async move {
            let session = CommandSession::new(&link_clone, StdDuration::from_secs(5));
            session.run(&[], false, CancellationToken::new()).await
        });

        tokio::time::sleep(StdDuration::from_millis(20)).await;
        events.fire(&DecodedEvent::Abort("card not readable".to_string()));

        assert_eq!(handle.await.unwrap(), CommandResponse::abort("card not readable"));
    }

    #[tokio::test]
    async fn timeout_fires_when_nothing_arrives() {
        let link = mock(SendOutcome::AcknowledgeReceived);
        let session = CommandSession::new(&link, StdDuration::from_millis(20));
        let response = session.run(&[], false, CancellationToken::new()).await;
        assert_eq!(response, CommandResponse::timeout());
    }

    #[tokio::test]
    async fn activity_resets_the_timer_past_its_original_deadline() {
        let link = mock(SendOutcome::AcknowledgeReceived);
        let events = link.events().clone();
        let link_clone = link.clone();
        let handle = tokio::spawn(async move {
            let session = CommandSession::new(&link_clone, StdDuration::from_millis(50));
            session.run(&[], false, CancellationToken::new()).await
        });

        // Keep the session alive past its original 50ms deadline via
        // intermediate status activity, then let it resolve via Completion.
        tokio::time::sleep(StdDuration::from_millis(30)).await;
        events.fire(&DecodedEvent::IntermediateStatus("please wait".to_string()));
        tokio::time::sleep(StdDuration::from_millis(30)).await;
        events.fire(&DecodedEvent::Completion(None));

        assert_eq!(handle.await.unwrap(), CommandResponse::successful());
    }
}
