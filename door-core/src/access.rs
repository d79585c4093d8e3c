use core::fmt;

use serde::{Deserialize, Serialize};

/// Asks the server whether a tag may open the door registered as `clientId`
pub const VALIDATE_PATH: &str = "/tags/validate";
/// Reports a tamper event for the door registered as `clientId`
pub const TAMPER_PATH: &str = "/alarm/tamper";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    Encode,
    Decode,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "request body does not fit the buffer"),
            Self::Decode => write!(f, "response body is not the expected JSON"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest<'a> {
    pub tag_id: &'a str,
    pub client_id: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub allowed: bool,
    /// Absent when the server does not know this client id
    #[serde(default)]
    pub door_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TamperKind {
    /// Door contact opened while the lock was engaged
    DoorForced,
}

impl TamperKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DoorForced => "door_forced",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TamperReport<'a> {
    pub client_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TamperAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub log_id: Option<u32>,
}

pub fn encode_validate(tag_id: &str, client_id: &str, out: &mut [u8]) -> Result<usize, AccessError> {
    serde_json_core::to_slice(&ValidateRequest { tag_id, client_id }, out)
        .map_err(|_| AccessError::Encode)
}

pub fn decode_validate(body: &[u8]) -> Result<ValidateResponse, AccessError> {
    serde_json_core::from_slice::<ValidateResponse>(body)
        .map(|(response, _)| response)
        .map_err(|e| {
            log::debug!("validate response rejected: {:?}", e);
            AccessError::Decode
        })
}

pub fn encode_tamper(kind: TamperKind, client_id: &str, out: &mut [u8]) -> Result<usize, AccessError> {
    let report = TamperReport {
        client_id,
        kind: kind.as_str(),
    };
    serde_json_core::to_slice(&report, out).map_err(|_| AccessError::Encode)
}

pub fn decode_tamper_ack(body: &[u8]) -> Result<TamperAck, AccessError> {
    serde_json_core::from_slice::<TamperAck>(body)
        .map(|(ack, _)| ack)
        .map_err(|_| AccessError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_request_body() {
        let mut buf = [0u8; 128];
        let n = encode_validate("04A23B1A5C5280", "door-001", &mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            br#"{"tagId":"04A23B1A5C5280","clientId":"door-001"}"#
        );
    }

    #[test]
    fn validate_request_overflow() {
        let mut buf = [0u8; 16];
        assert_eq!(
            encode_validate("04A23B1A5C5280", "door-001", &mut buf),
            Err(AccessError::Encode)
        );
    }

    #[test]
    fn granted_and_denied_replies() {
        assert_eq!(
            decode_validate(br#"{"allowed":true,"doorId":1}"#),
            Ok(ValidateResponse {
                allowed: true,
                door_id: Some(1)
            })
        );
        // unknown client: no door id
        assert_eq!(
            decode_validate(br#"{"allowed":false}"#),
            Ok(ValidateResponse {
                allowed: false,
                door_id: None
            })
        );
    }

    #[test]
    fn garbage_reply_is_an_error() {
        assert_eq!(decode_validate(b"<html>502</html>"), Err(AccessError::Decode));
        assert_eq!(decode_validate(br#"{"doorId":1}"#), Err(AccessError::Decode));
    }

    #[test]
    fn tamper_report_body() {
        let mut buf = [0u8; 128];
        let n = encode_tamper(TamperKind::DoorForced, "door-001", &mut buf).unwrap();
        assert_eq!(
            &buf[..n],
            br#"{"clientId":"door-001","type":"door_forced"}"#
        );
    }

    #[test]
    fn tamper_ack_ignores_message() {
        let ack = decode_tamper_ack(
            br#"{"success":true,"message":"Tamper attempt logged successfully","logId":7}"#,
        )
        .unwrap();
        assert!(ack.success);
        assert_eq!(ack.log_id, Some(7));
    }
}
