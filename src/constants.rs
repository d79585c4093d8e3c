/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent sent with every request to the access-control server
pub const USER_AGENT: &str = concat!("nfc-door-client/", env!("CARGO_PKG_VERSION"));

/// Size of the heap in DRAM (internal memory)
pub const HEAP_SIZE: usize = 72 * 1024;

/// Size of the TCP socket receive buffer
pub const RX_BUFFER_SIZE: usize = 2048;
/// Size of the TCP socket transmit buffer
pub const TX_BUFFER_SIZE: usize = 1024;

/// Buffer for a complete HTTP response (head and body)
pub const HTTP_RESPONSE_BUFFER_SIZE: usize = 1024;
/// Buffer for an HTTP request head
pub const HTTP_HEAD_BUFFER_SIZE: usize = 256;
/// Buffer for a JSON request body
pub const REQUEST_BODY_BUFFER_SIZE: usize = 192;

/// Connection attempts per HTTP exchange
pub const HTTP_CONNECT_ATTEMPTS: usize = 2;
/// Pause between two connection attempts
pub const HTTP_RETRY_DELAY_MS: u64 = 250;

/// I2C bus frequency towards the PN532
pub const NFC_I2C_FREQUENCY_KHZ: u32 = 100;
/// Bound on one PN532 command/response round trip
pub const NFC_COMMAND_TIMEOUT_MS: u64 = 1000;
/// Bound on one InListPassiveTarget poll
pub const NFC_POLL_TIMEOUT_MS: u64 = 250;
/// Failed polls in a row after which the reader is brought up again
pub const NFC_MAX_CONSECUTIVE_ERRORS: u8 = 3;
/// Wait before retrying to bring up an unresponsive reader
pub const NFC_INIT_RETRY_DELAY_MS: u64 = 2000;

/// SPI clock towards the W5500
#[cfg(feature = "ethernet")]
pub const ETHERNET_SPI_FREQUENCY_MHZ: u32 = 20;

/// Cadence of the door loop (relock check, contact sampling, card poll)
pub const DOOR_LOOP_INTERVAL_MS: u64 = 50;

/// Indicator commands queued between the door task and the indicator task
pub const INDICATOR_QUEUE_DEPTH: usize = 4;
/// Requests queued between the door task and the server task
pub const SERVER_QUEUE_DEPTH: usize = 4;

/// Delay before the WiFi supervisor reconnects after a drop or a failure
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5000;
/// Interval between two network readiness checks
pub const NETWORK_POLL_INTERVAL_MS: u64 = 500;
