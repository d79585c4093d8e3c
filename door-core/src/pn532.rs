//! Payloads the PN532 answers with, once the frame around them has been
//! checked by the driver.
//!
//! PN532 User Manual: https://www.nxp.com/docs/en/user-guide/141520.pdf

use core::fmt;

use heapless::{String, Vec};

/// IC byte reported by GetFirmwareVersion on a PN532
pub const PN532_IC: u8 = 0x32;

/// Maximum number of tries of InListPassiveTarget before giving up.
/// 0xFF would make the chip wait forever.
pub const PASSIVE_ACTIVATION_RETRIES: u8 = 0x10;

/// RFConfiguration item 5: MxRtyATR, MxRtyPSL, MxRtyPassiveActivation
pub fn max_retries_params(passive_activation: u8) -> [u8; 4] {
    [0x05, 0xFF, 0x01, passive_activation]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub ic: u8,
    pub version: u8,
    pub revision: u8,
    pub support: u8,
}

pub fn parse_firmware_version(data: &[u8]) -> Option<FirmwareVersion> {
    match *data {
        [ic, version, revision, support, ..] => Some(FirmwareVersion {
            ic,
            version,
            revision,
            support,
        }),
        _ => None,
    }
}

/// UID of an ISO14443A card: single (4), double (7) or triple (10) size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUid(Vec<u8, 10>);

impl TagUid {
    pub fn new(bytes: &[u8]) -> Option<Self> {
        if !matches!(bytes.len(), 4 | 7 | 10) {
            return None;
        }
        Vec::from_slice(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Upper-case hex without separators, the form the server stores tags in
    pub fn to_hex(&self) -> String<20> {
        use core::fmt::Write;
        let mut hex = String::new();
        // 10 bytes always fit 20 chars
        write!(hex, "{self}").ok();
        hex
    }
}

impl fmt::Display for TagUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Extract the UID of the first target from an InListPassiveTarget response.
/// `None` when no card is in the field or the response is malformed.
///
/// Layout for 106 kbps type A: `NbTg Tg SENS_RES(2) SEL_RES NFCIDLength NFCID1..`
pub fn parse_passive_target(data: &[u8]) -> Option<TagUid> {
    let targets = *data.first()?;
    if targets == 0 {
        return None;
    }
    let uid_len = *data.get(5)? as usize;
    let uid = data.get(6..6 + uid_len)?;
    let tag = TagUid::new(uid);
    if tag.is_none() {
        log::warn!("Ignoring target with {uid_len} byte UID");
    }
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_item() {
        assert_eq!(
            max_retries_params(PASSIVE_ACTIVATION_RETRIES),
            [0x05, 0xFF, 0x01, 0x10]
        );
    }

    #[test]
    fn firmware_version() {
        let version = parse_firmware_version(&[0x32, 0x01, 0x06, 0x07]).unwrap();
        assert_eq!(version.ic, PN532_IC);
        assert_eq!((version.version, version.revision), (1, 6));
        assert_eq!(version.support, 0x07);
    }

    #[test]
    fn short_firmware_version() {
        assert_eq!(parse_firmware_version(&[]), None);
        assert_eq!(parse_firmware_version(&[0x32, 0x01, 0x06]), None);
    }

    #[test]
    fn passive_target_uid() {
        // one target, 4 byte UID DE AD BE EF
        let data = [0x01, 0x01, 0x00, 0x04, 0x08, 0x04, 0xDE, 0xAD, 0xBE, 0xEF];
        let uid = parse_passive_target(&data).unwrap();
        assert_eq!(uid.as_bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(uid.to_hex().as_str(), "DEADBEEF");
    }

    #[test]
    fn seven_byte_uid() {
        let data = [
            0x01, 0x01, 0x00, 0x44, 0x00, 0x07, 0x04, 0xA2, 0x3B, 0x1A, 0x5C, 0x52, 0x80,
        ];
        let uid = parse_passive_target(&data).unwrap();
        assert_eq!(uid.to_hex().as_str(), "04A23B1A5C5280");
    }

    #[test]
    fn ten_byte_uid() {
        let mut data = [0u8; 16];
        data[..6].copy_from_slice(&[0x01, 0x01, 0x00, 0x44, 0x00, 0x0A]);
        data[6..].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let uid = parse_passive_target(&data).unwrap();
        assert_eq!(uid.to_hex().as_str(), "0102030405060708090A");
    }

    #[test]
    fn no_target_or_bad_uid() {
        assert_eq!(parse_passive_target(&[0x00]), None);
        assert_eq!(parse_passive_target(&[]), None);
        // 5 byte UID is not an ISO14443A size
        assert_eq!(
            parse_passive_target(&[0x01, 0x01, 0x00, 0x04, 0x08, 0x05, 1, 2, 3, 4, 5]),
            None
        );
        // length byte beyond the data
        assert_eq!(
            parse_passive_target(&[0x01, 0x01, 0x00, 0x04, 0x08, 0x04, 1, 2]),
            None
        );
    }

    #[test]
    fn truncated_target_payloads() {
        // a target counted but nothing after it, up to a missing length byte
        for len in 1..6 {
            let data = [0x01, 0x01, 0x00, 0x04, 0x08];
            assert_eq!(parse_passive_target(&data[..len]), None);
        }
        // empty frame body as a bus glitch would give it
        assert_eq!(parse_passive_target(&[0x00, 0x00, 0x00, 0x00]), None);
        // length byte of 255
        assert_eq!(
            parse_passive_target(&[0x01, 0x01, 0x00, 0x04, 0x08, 0xFF, 1, 2, 3, 4]),
            None
        );
    }
}
