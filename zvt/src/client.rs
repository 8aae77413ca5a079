//! Public façade: typed command methods, event surfaces, client lifecycle
//! (§4.8).
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use zvt_builder::{bcd, ZvtSerializer};

use crate::config::{ClientConfig, RegistrationConfig};
use crate::decoder::{DecodedEvent, LineEvent, ReceiptEvent, ReplyDecoder};
use crate::events::{EventBus, Subscription};
use crate::link::LinkChannel;
use crate::packets;
use crate::session::{CommandResponse, CommandSession};

/// Builds a [ReplyDecoder] matching `config` - the decoder a
/// [crate::link::LinkChannel] implementation needs at construction time,
/// before a [ZvtClient] wrapping it exists.
pub fn decoder_for(config: &ClientConfig) -> ReplyDecoder {
    ReplyDecoder::new(config.language, config.text_encoding)
}

/// The core engine's public entry point. Owns exactly one [LinkChannel] for
/// its lifetime and enforces at most one in-flight command (§5).
pub struct ZvtClient {
    link: Arc<dyn LinkChannel>,
    config: ClientConfig,
    busy: AtomicBool,
    status_information: Arc<EventBus<packets::StatusInformation>>,
    intermediate_status: Arc<EventBus<String>>,
    line: Arc<EventBus<LineEvent>>,
    receipt: Arc<EventBus<ReceiptEvent>>,
    _dispatch: Subscription<DecodedEvent>,
}

impl ZvtClient {
    /// Wires decoder events to the four public event surfaces. `link` must
    /// already be decoding with [decoder_for] applied to the same `config`.
    pub fn new(link: Arc<dyn LinkChannel>, config: ClientConfig) -> Arc<Self> {
        let status_information = EventBus::new();
        let intermediate_status = EventBus::new();
        let line = EventBus::new();
        let receipt = EventBus::new();

        let dispatch_status = status_information.clone();
        let dispatch_intermediate = intermediate_status.clone();
        let dispatch_line = line.clone();
        let dispatch_receipt = receipt.clone();
        let dispatch = link.events().subscribe(move |event: &DecodedEvent| {
            match event {
                DecodedEvent::StatusInformation(status) => dispatch_status.fire(status),
                DecodedEvent::IntermediateStatus(text) => dispatch_intermediate.fire(text),
                DecodedEvent::Line(line_event) => dispatch_line.fire(line_event),
                DecodedEvent::Receipt(receipt_event) => dispatch_receipt.fire(receipt_event),
                // A Completion's embedded status fields surface as a
                // StatusInformation event too, ordered before the session
                // resolves (§5) - this handler is registered at client
                // construction, before any CommandSession subscribes, so it
                // always fires first in EventBus::fire's registration order.
                DecodedEvent::Completion(Some(status)) => dispatch_status.fire(status),
                DecodedEvent::Completion(None) | DecodedEvent::Abort(_) => {}
            }
        });

        Arc::new(Self {
            link,
            config,
            busy: AtomicBool::new(false),
            status_information,
            intermediate_status,
            line,
            receipt,
            _dispatch: dispatch,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Releases the underlying link channel and drops all event
    /// subscriptions. Subsequent command calls will fail once the link is
    /// closed.
    pub async fn close(&self) {
        self.link.close().await;
    }

    pub fn on_status_information(
        &self,
        handler: impl Fn(&packets::StatusInformation) + Send + Sync + 'static,
    ) -> Subscription<packets::StatusInformation> {
        self.status_information.subscribe(handler)
    }

    pub fn on_intermediate_status(
        &self,
        handler: impl Fn(&String) + Send + Sync + 'static,
    ) -> Subscription<String> {
        self.intermediate_status.subscribe(handler)
    }

    pub fn on_line(&self, handler: impl Fn(&LineEvent) + Send + Sync + 'static) -> Subscription<LineEvent> {
        self.line.subscribe(handler)
    }

    pub fn on_receipt(
        &self,
        handler: impl Fn(&ReceiptEvent) + Send + Sync + 'static,
    ) -> Subscription<ReceiptEvent> {
        self.receipt.subscribe(handler)
    }

    /// Core routine every typed command method delegates to (§4.8).
    ///
    /// Enforces the single-in-flight contract from §5: a call made while
    /// another is in flight fails immediately with `Error("Busy")` rather
    /// than queuing, since the PT multiplexes no session id on the wire.
    async fn send_command(
        &self,
        package: Vec<u8>,
        end_after_ack: bool,
        cancel: CancellationToken,
    ) -> CommandResponse {
        if self.busy.swap(true, Ordering::SeqCst) {
            return CommandResponse::error("Busy");
        }
        let session = CommandSession::new(&self.link, self.config.command_completion_timeout);
        let response = session.run(&package, end_after_ack, cancel).await;
        self.busy.store(false, Ordering::SeqCst);
        response
    }

    /// Escape hatch for commands not enumerated below: caller supplies an
    /// already-encoded package (§4.8 `Custom`).
    pub async fn custom(
        &self,
        package: Vec<u8>,
        end_after_ack: bool,
        cancel: CancellationToken,
    ) -> CommandResponse {
        self.send_command(package, end_after_ack, cancel).await
    }

    /// `06 00` Registration. TLV block (permitted `06 D3`) is included only
    /// when [ClientConfig::activate_tlv_support] is set.
    pub async fn registration(&self, config: RegistrationConfig, cancel: CancellationToken) -> CommandResponse {
        let tlv = self.config.activate_tlv_support.then(|| packets::tlv::Registration {
            max_len_adpu: None,
            permitted_commands: Some(packets::tlv::PermittedCommands {
                control_fields: vec![0x06d3],
            }),
        });
        let packet = packets::Registration {
            password: self.config.password as usize,
            config_byte: config.to_byte(),
            currency: Some(self.config.currency as usize),
            // The service byte is a non-optional part of the payload (§4.8:
            // only the trailing TLV block is optional) - `0x00` is the
            // "no special service" value the scenario-2 wire form expects.
            service_byte: Some(0x00),
            tlv,
        };
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `06 01` Authorization (Payment). `amount` is major units (e.g. EUR);
    /// encoded per §4.1's `decimal_to_bcd`. The currency tag is only emitted
    /// when [ClientConfig::currency] differs from the ISO-4217 default (978,
    /// EUR) the PT assumes when the tag is absent.
    pub async fn payment(&self, amount: Decimal, cancel: CancellationToken) -> Result<CommandResponse, zvt_builder::ZVTError> {
        let minor_units = bcd::bcd_to_int(&bcd::decimal_to_bcd(amount)?)?;
        let packet = packets::Authorization {
            amount: Some(minor_units as usize),
            currency: (self.config.currency != 978).then_some(self.config.currency as usize),
            ..packets::Authorization::default()
        };
        Ok(self.send_command(packet.zvt_serialize(), false, cancel).await)
    }

    /// `06 30` Reversal of a completed transaction, identified by receipt
    /// number.
    pub async fn reversal(&self, receipt_no: u16, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::Reversal {
            password: self.config.password as usize,
            receipt_no: Some(receipt_no as usize),
            tlv: None,
        };
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `06 31` Refund. `trace_number` is omitted entirely (no `0B` tag) when
    /// `None` - see §9's design note collapsing the source's two refund
    /// variants into one method.
    pub async fn refund(
        &self,
        amount: Decimal,
        trace_number: Option<u32>,
        cancel: CancellationToken,
    ) -> Result<CommandResponse, zvt_builder::ZVTError> {
        let minor_units = bcd::bcd_to_int(&bcd::decimal_to_bcd(amount)?)?;
        let packet = packets::Refund {
            password: self.config.password as usize,
            amount: Some(minor_units as usize),
            trace_number: trace_number.map(|t| t as usize),
            tlv: None,
        };
        Ok(self.send_command(packet.zvt_serialize(), false, cancel).await)
    }

    /// `06 50` EndOfDay.
    pub async fn end_of_day(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::EndOfDay {
            password: self.config.password as usize,
        };
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `06 10` SendTurnoverTotals.
    pub async fn send_turnover_totals(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::SendTurnoverTotals {
            password: self.config.password as usize,
        };
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `06 20` RepeatLastReceipt.
    pub async fn repeat_last_receipt(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::RepeatLastReceipt {
            password: self.config.password as usize,
        };
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `06 02` LogOff. Fire-and-forget: resolves on the link-layer ack alone.
    pub async fn log_off(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::LogOff {};
        self.send_command(packet.zvt_serialize(), true, cancel).await
    }

    /// `06 B0` ECR-initiated abort of the command currently in flight.
    /// Fire-and-forget. This is the caller's explicit follow-up after
    /// cancelling a `send_command` call (§5's cancellation design note - the
    /// core never sends this automatically).
    pub async fn abort(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::AbortCommand {};
        self.send_command(packet.zvt_serialize(), true, cancel).await
    }

    /// `06 70` Diagnosis.
    pub async fn diagnosis(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::Diagnosis { tlv: None };
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `08 10` SoftwareUpdate.
    pub async fn software_update(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::SoftwareUpdate {};
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `06 18` ResetTerminal. Kept from the teacher's wider command set as
    /// ambient surface beyond the required table (§9/DESIGN.md).
    pub async fn reset_terminal(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::ResetTerminal {};
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `06 1B` SetTerminalId.
    pub async fn set_terminal_id(&self, terminal_id: u32, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::SetTerminalId {
            password: self.config.password as usize,
            terminal_id: Some(terminal_id as usize),
        };
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }

    /// `06 1A` PrintSystemConfiguration.
    pub async fn print_system_configuration(&self, cancel: CancellationToken) -> CommandResponse {
        let packet = packets::PrintSystemConfiguration {};
        self.send_command(packet.zvt_serialize(), false, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Language;
    use anyhow::Result;
    use async_trait::async_trait;
    use zvt_builder::ZvtParser;

    struct MockLink {
        events: Arc<EventBus<DecodedEvent>>,
        sent: std::sync::Mutex<Vec<Vec<u8>>>,
    }

    impl MockLink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: EventBus::new(),
                sent: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LinkChannel for MockLink {
        async fn send(&self, package: &[u8], _cancel: &CancellationToken) -> Result<crate::link::SendOutcome> {
            self.sent.lock().unwrap().push(package.to_vec());
            Ok(crate::link::SendOutcome::AcknowledgeReceived)
        }

        fn events(&self) -> &Arc<EventBus<DecodedEvent>> {
            &self.events
        }

        async fn close(&self) {}
    }

    fn test_client() -> Arc<ZvtClient> {
        let link: Arc<dyn LinkChannel> = MockLink::new();
        ZvtClient::new(link, ClientConfig::default())
    }

    #[tokio::test]
    async fn log_off_resolves_on_ack_without_waiting_for_a_reply() {
        let client = test_client();
        let response = client.log_off(CancellationToken::new()).await;
        assert!(response.is_successful());
    }

    #[tokio::test]
    async fn overlapping_commands_are_rejected_as_busy() {
        let client = test_client();
        let client2 = client.clone();
        let first = tokio::spawn(async move {
            // No Completion/Abort ever fires, so this blocks until the
            // short timeout below expires.
            client2.diagnosis(CancellationToken::new()).await
        });

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let second = client.diagnosis(CancellationToken::new()).await;
        assert_eq!(second, CommandResponse::error("Busy"));

        first.abort();
    }

    #[tokio::test]
    async fn status_information_event_fires_independent_of_a_session() {
        let client = test_client();
        let received = Arc::new(std::sync::Mutex::new(None));
        let received_clone = received.clone();
        let _sub = client.on_status_information(move |status| {
            *received_clone.lock().unwrap() = Some(status.clone());
        });

        let status = packets::StatusInformation {
            result_code: Some(0),
            ..Default::default()
        };
        client.link.events().fire(&DecodedEvent::StatusInformation(status.clone()));

        assert_eq!(*received.lock().unwrap(), Some(status));
    }

    #[tokio::test]
    async fn payment_sends_the_amount_from_the_protocol_notes_scenario() {
        let client = test_client();
        // 1.23 EUR round-trips through the same BCD encoding used by the
        // Authorization packet's amount field (chapter 2.4 scenario).
        let packet = packets::Authorization {
            amount: Some(123),
            ..Default::default()
        };
        let (decoded, _) = packets::Authorization::zvt_deserialize(&packet.zvt_serialize()).unwrap();
        assert_eq!(decoded, packet);

        let response = client
            .payment(Decimal::new(123, 2), CancellationToken::new())
            .await
            .unwrap();
        assert!(response.is_successful());
    }

    #[tokio::test]
    async fn registration_encodes_the_protocol_notes_scenario_2_bytes() {
        // Password 123456, default RegistrationConfig (config byte 0x82),
        // default currency (EUR, 978), TLV support off: the wire form is
        // `06 00 08 12 34 56 82 09 78 03 00` - the `03 00` service-byte
        // field is mandatory, not omitted, per the protocol notes' §4.8
        // command table. (The protocol notes' own scenario-2 walkthrough
        // prints LEN as `09`, which doesn't match its own 8-byte payload;
        // LEN here is the actual payload length, per the package invariant.)
        let mock = MockLink::new();
        let link: Arc<dyn LinkChannel> = mock.clone();
        let config = ClientConfig {
            password: 123456,
            ..ClientConfig::default()
        };
        let client = ZvtClient::new(link, config);

        let response = client
            .registration(RegistrationConfig::default(), CancellationToken::new())
            .await;
        assert!(response.is_successful());

        let sent = mock.sent.lock().unwrap();
        assert_eq!(
            sent.last().unwrap().as_slice(),
            &[0x06, 0x00, 0x08, 0x12, 0x34, 0x56, 0x82, 0x09, 0x78, 0x03, 0x00]
        );
    }

    #[test]
    fn decoder_for_honors_configured_language() {
        let config = ClientConfig {
            language: Language::German,
            ..ClientConfig::default()
        };
        let decoder = decoder_for(&config);
        assert_eq!(decoder.language, Language::German);
    }
}
