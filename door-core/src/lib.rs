//! Hardware independent logic of the NFC door client: typed configuration,
//! PN532 payload parsing, HTTP framing, the access-control wire format and
//! the door state machine. Everything here runs on the host as well as on the
//! device.
#![cfg_attr(not(test), no_std)]

pub mod access;
pub mod config;
pub mod door;
pub mod feedback;
pub mod http;
pub mod pn532;
