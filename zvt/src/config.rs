//! Client-construction-time configuration: §6 of the protocol notes.
//!
//! Everything here is immutable once a [crate::client::ZvtClient] is built -
//! the encoding in particular must not change mid-session since in-flight
//! text (print lines, receipt blocks) is decoded against whatever is
//! configured at the moment the frame arrives.
use std::time::Duration;

use crate::constants::Language;

/// Maps text bytes coming off the wire (always CP437-native, see
/// [zvt_builder::encoding::Default]'s `String` impl) into the encoding the
/// application wants to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    Utf8,
    Iso8859_1,
    Iso8859_2,
    Iso8859_15,
    #[default]
    CodePage437,
}

impl TextEncoding {
    /// Re-decodes text that [zvt_builder] already decoded once as CP437.
    ///
    /// We round-trip through the original bytes rather than teaching
    /// [zvt_builder::encoding] a configurable codec: the wire format is
    /// always CP437, and only client-observable text should honor
    /// [crate::config::ClientConfig::text_encoding].
    pub fn reencode(&self, cp437_text: &str) -> String {
        let bytes = yore::code_pages::CP437.encode(cp437_text).unwrap_or_default();
        self.decode(&bytes)
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Iso8859_1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Iso8859_2 => {
                let (text, _, _) = encoding_rs::ISO_8859_2.decode(bytes);
                text.into_owned()
            }
            TextEncoding::Iso8859_15 => {
                let (text, _, _) = encoding_rs::ISO_8859_15.decode(bytes);
                text.into_owned()
            }
            TextEncoding::CodePage437 => yore::code_pages::CP437.decode(bytes),
        }
    }
}

/// Configuration surface a [crate::client::ZvtClient] is constructed with.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Six-digit decimal password, 0-999999. See [zvt_builder::bcd].
    pub password: u32,
    /// Bounds stage (b) of [crate::session::CommandSession]: the wait
    /// between link-layer ACK and a terminating reply. Default 5 minutes
    /// (a legacy default of 90s is also seen in the field).
    pub command_completion_timeout: Duration,
    /// Applied to text handed to event subscribers; never affects the wire
    /// encoding, which is always CP437.
    pub text_encoding: TextEncoding,
    /// Selects [crate::constants::StatusCatalog]'s language. Does not affect
    /// [crate::constants::ErrorCatalog], which is English-only.
    pub language: Language,
    /// If true, [crate::client::ZvtClient::registration] embeds a TLV block
    /// permitting the PT to send `06 D3` (PrintTextBlock).
    pub activate_tlv_support: bool,
    /// ISO-4217 numeric currency code. Default 978 (EUR).
    pub currency: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            password: 0,
            command_completion_timeout: Duration::from_secs(5 * 60),
            text_encoding: TextEncoding::CodePage437,
            language: Language::English,
            activate_tlv_support: false,
            currency: 978,
        }
    }
}

/// Bit-set/clear helper for the Registration config byte (§3/§4.2 BitFlags).
///
/// Bit 0 is the LSB. Every field below is named after the *positive*
/// meaning from the protocol table, so `to_byte` can just OR in the bit when
/// the field is true - no double negatives to get backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationConfig {
    /// Bit 1. Suppresses the PT's own receipt printout for a payment.
    pub suppress_receipt_for_payment: bool,
    /// Bit 2. Suppresses the PT's own receipt printout for an admin command.
    pub suppress_receipt_for_admin: bool,
    /// Bit 3. Requests `04 FF` IntermediateStatusInformation notifications.
    pub send_intermediate_status: bool,
    /// Bit 4. Forbids the customer from starting a payment at the PT itself.
    pub disallow_start_payment_via_pt: bool,
    /// Bit 5. Forbids administration commands from being issued at the PT.
    pub disallow_administration_via_pt: bool,
}

/// All defaults reproduce the `0x82` config byte from the registration
/// scenario in the protocol notes: bit 7 (always set) plus bit 1
/// (receipt-for-payment suppressed by default).
impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            suppress_receipt_for_payment: true,
            suppress_receipt_for_admin: false,
            send_intermediate_status: false,
            disallow_start_payment_via_pt: false,
            disallow_administration_via_pt: false,
        }
    }
}

impl RegistrationConfig {
    /// Bit 7, ECR print-type, is always set regardless of configuration.
    const ECR_PRINT_TYPE: u8 = 1 << 7;

    pub fn to_byte(self) -> u8 {
        let mut byte = Self::ECR_PRINT_TYPE;
        if self.suppress_receipt_for_payment {
            byte |= 1 << 1;
        }
        if self.suppress_receipt_for_admin {
            byte |= 1 << 2;
        }
        if self.send_intermediate_status {
            byte |= 1 << 3;
        }
        if self.disallow_start_payment_via_pt {
            byte |= 1 << 4;
        }
        if self.disallow_administration_via_pt {
            byte |= 1 << 5;
        }
        byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_byte_matches_registration_scenario() {
        assert_eq!(RegistrationConfig::default().to_byte(), 0x82);
    }

    #[test]
    fn bit_7_is_always_set() {
        let all_false = RegistrationConfig {
            suppress_receipt_for_payment: false,
            suppress_receipt_for_admin: false,
            send_intermediate_status: false,
            disallow_start_payment_via_pt: false,
            disallow_administration_via_pt: false,
        };
        assert_eq!(all_false.to_byte() & 0x80, 0x80);
    }

    #[test]
    fn every_bit_is_independently_addressable() {
        let cfg = RegistrationConfig {
            suppress_receipt_for_payment: false,
            suppress_receipt_for_admin: true,
            send_intermediate_status: true,
            disallow_start_payment_via_pt: true,
            disallow_administration_via_pt: true,
        };
        // bit7 | bit2 | bit3 | bit4 | bit5
        assert_eq!(cfg.to_byte(), 0b1011_1100);
    }

    #[test]
    fn text_encoding_round_trips_through_cp437() {
        let text = "H\u{e9}llo"; // matches a CP437 accented character.
        let reencoded = TextEncoding::Utf8.reencode(text);
        assert_eq!(reencoded, text);
    }
}
