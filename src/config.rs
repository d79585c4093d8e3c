#[allow(unused_imports)]
use core::net::Ipv4Addr;

pub use door_core::config::{
    Config, DebugConfig, EthernetPins, EthernetSettings, Network, Pins, ServerEndpoint, Timings,
    WifiCredentials,
};

// config values and the pin selection macros are generated at compile time
// from cfg.toml, which build.rs has already validated
include!(concat!(env!("OUT_DIR"), "/config.rs"));
