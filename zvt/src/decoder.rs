//! Classifies one inbound package by control field and decodes it into a
//! typed event (§4.5 ReplyDecoder).
//!
//! Dispatch is keyed off [crate::frame::parse]'s control field; the actual
//! payload decoding is delegated straight back to the `#[derive(Zvt)]`
//! implementations in [crate::packets] - `StatusInformation`,
//! `IntermediateStatusInformation`, `PrintLine`, `PrintTextBlock`,
//! `CompletionData`, `Abort` already know their own BMP/TLV layout, which is
//! exactly the "dispatch table with specific parsers per control field" the
//! protocol notes describe. There is no separate hand-rolled BMP walker here.
use zvt_builder::{ZVTResult, ZvtSerializer};

use crate::config::TextEncoding;
use crate::constants::{ErrorCatalog, Language, StatusCatalog};
use crate::frame;
use crate::packets;

/// One decoded line of a `06 D1` PrintLine message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    pub attribute: u8,
    pub text: String,
    /// Bit 7 of `attribute`: this is the last line of the receipt.
    pub is_last_line: bool,
}

/// A `06 D3` PrintTextBlock message, flattened to the fields clients care
/// about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceiptEvent {
    pub receipt_type: Option<u8>,
    pub lines: Vec<String>,
}

/// One fully decoded inbound package.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// `04 0F`, or a `06 0F` Completion carrying status fields (see below).
    StatusInformation(packets::StatusInformation),
    /// `04 FF`, already localized via [StatusCatalog].
    IntermediateStatus(String),
    Line(LineEvent),
    Receipt(ReceiptEvent),
    /// `06 0F`. Carries the completion's own status fields, if any were
    /// present, so the caller can fire [DecodedEvent::StatusInformation]
    /// *before* resolving the session - see §5's ordering guarantee.
    Completion(Option<packets::StatusInformation>),
    /// `06 1E`, already localized via [ErrorCatalog].
    Abort(String),
}

/// Immutable once built - constructed once at [crate::client::ZvtClient]
/// construction time from [crate::config::ClientConfig].
#[derive(Debug, Clone)]
pub struct ReplyDecoder {
    pub language: Language,
    pub text_encoding: TextEncoding,
}

impl ReplyDecoder {
    pub fn new(language: Language, text_encoding: TextEncoding) -> Self {
        Self {
            language,
            text_encoding,
        }
    }

    /// Decodes one whole application package, as delivered by a
    /// [crate::link::LinkChannel].
    ///
    /// Unknown control fields return `Ok(None)`: per §7 these are logged and
    /// dropped by the caller rather than treated as a hard error.
    pub fn decode(&self, raw: &[u8]) -> ZVTResult<Option<DecodedEvent>> {
        let frame = frame::parse(raw)?;

        let event = match frame.control_field {
            [0x04, 0x0f] => {
                let (status, _) = packets::StatusInformation::zvt_deserialize(raw)?;
                DecodedEvent::StatusInformation(self.reencode_status_text(status))
            }
            [0x04, 0xff] => {
                let (info, _) = packets::IntermediateStatusInformation::zvt_deserialize(raw)?;
                DecodedEvent::IntermediateStatus(StatusCatalog::lookup(info.status, self.language))
            }
            [0x06, 0xd1] => {
                let (line, _) = packets::PrintLine::zvt_deserialize(raw)?;
                DecodedEvent::Line(LineEvent {
                    attribute: line.attribute,
                    is_last_line: line.attribute & 0x80 != 0,
                    text: self.text_encoding.reencode(&line.text),
                })
            }
            [0x06, 0xd3] => {
                let (block, _) = packets::PrintTextBlock::zvt_deserialize(raw)?;
                let receipt_type = block.tlv.as_ref().and_then(|tlv| tlv.receipt_type);
                let lines = block
                    .tlv
                    .and_then(|tlv| tlv.lines)
                    .map(|lines| {
                        lines
                            .lines
                            .iter()
                            .map(|line| self.text_encoding.reencode(line))
                            .collect()
                    })
                    .unwrap_or_default();
                DecodedEvent::Receipt(ReceiptEvent {
                    receipt_type,
                    lines,
                })
            }
            [0x06, 0x0f] => {
                let (completion, _) = packets::CompletionData::zvt_deserialize(raw)?;
                DecodedEvent::Completion(Self::completion_status(&completion))
            }
            [0x06, 0x1e] => {
                let (abort, _) = packets::Abort::zvt_deserialize(raw)?;
                DecodedEvent::Abort(ErrorCatalog::lookup(abort.error))
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Re-encodes the text BMPs of a decoded `StatusInformation` (additional
    /// text, VU number, card name) through [crate::config::ClientConfig::text_encoding] -
    /// these are CP437-native on the wire just like `PrintLine`/
    /// `PrintTextBlock`, so the same re-decode applies here (§4.5, §5).
    fn reencode_status_text(&self, mut status: packets::StatusInformation) -> packets::StatusInformation {
        status.additional_text = status.additional_text.as_deref().map(|text| self.text_encoding.reencode(text));
        status.vu_number = status.vu_number.as_deref().map(|text| self.text_encoding.reencode(text));
        status.card_name = status.card_name.as_deref().map(|text| self.text_encoding.reencode(text));
        status
    }

    /// A `06 0F` Completion carries a subset of the BMPs that also appear in
    /// a full `04 0F` StatusInformation (result code, terminal id, currency,
    /// status byte on the same tag as `StatusInformation::card_type`). We
    /// surface that subset as a `StatusInformation` event so subscribers
    /// don't need to special-case Completion - §5's ordering guarantee
    /// requires this to be fired before the session resolves.
    fn completion_status(completion: &packets::CompletionData) -> Option<packets::StatusInformation> {
        if completion.result_code.is_none()
            && completion.status_byte.is_none()
            && completion.terminal_id.is_none()
            && completion.currency.is_none()
        {
            return None;
        }
        Some(packets::StatusInformation {
            result_code: completion.result_code,
            card_type: completion.status_byte,
            terminal_id: completion.terminal_id,
            currency: completion.currency,
            ..Default::default()
        })
    }
}
