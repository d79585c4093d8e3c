use core::fmt;
use core::net::Ipv4Addr;
use core::str::FromStr;

use heapless::Vec;

/// Longest client identifier accepted by the server side door registry
pub const MAX_CLIENT_ID_LEN: usize = 64;
/// Longest WiFi SSID (802.11)
pub const MAX_SSID_LEN: usize = 32;
/// Longest WPA2 passphrase
pub const MAX_WIFI_PASSWORD_LEN: usize = 64;
/// Port used when a server URL does not carry one
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Serial rates the ESP32 console is commonly monitored at
pub const STANDARD_BAUD_RATES: [u32; 9] = [
    9600, 19200, 38400, 57600, 74880, 115200, 230400, 460800, 921600,
];

/// Highest GPIO number on the ESP32
const MAX_GPIO: u8 = 39;
/// GPIO numbers not bonded out on the ESP32
const MISSING_GPIOS: [u8; 6] = [20, 24, 28, 29, 30, 31];
/// GPIO 6 to 11 are wired to the SPI flash
const FLASH_GPIOS: core::ops::RangeInclusive<u8> = 6..=11;
/// GPIO 34 to 39 have no output driver
const INPUT_ONLY_GPIOS: core::ops::RangeInclusive<u8> = 34..=39;
/// UART0 TX/RX, used by the serial console
const CONSOLE_GPIOS: [u8; 2] = [1, 3];

/// Total number of pin roles (7 door roles + 6 Ethernet SPI roles)
const MAX_ASSIGNED_PINS: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    MissingNetworkSection(&'static str),
    InvalidSsid,
    InvalidWifiPassword,
    InvalidMac,
    InvalidStaticIp,
    MissingServer,
    AmbiguousServer,
    InvalidHost,
    InvalidPort(i64),
    InvalidUrl,
    TlsUnsupported,
    EmptyClientId,
    InvalidClientId,
    InvalidPin { role: PinRole, pin: u8 },
    ReservedPin { role: PinRole, pin: u8 },
    InputOnlyPin { role: PinRole, pin: u8 },
    PinConflict { pin: u8, first: PinRole, second: PinRole },
    MissingEthernetPins,
    ZeroTiming(&'static str),
    UnsupportedBaud(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNetworkSection(section) => {
                write!(f, "selected network `{section}` has no [{section}] section")
            }
            Self::InvalidSsid => write!(f, "wifi ssid must be 1 to {MAX_SSID_LEN} bytes"),
            Self::InvalidWifiPassword => {
                write!(f, "wifi password must be at most {MAX_WIFI_PASSWORD_LEN} bytes")
            }
            Self::InvalidMac => write!(f, "ethernet mac must be six hex octets, unicast, non-zero"),
            Self::InvalidStaticIp => write!(f, "ethernet static_ip is not a usable IPv4 address"),
            Self::MissingServer => write!(f, "server needs either host + port or url"),
            Self::AmbiguousServer => write!(f, "server has both host/port and url, pick one"),
            Self::InvalidHost => write!(f, "server host is neither an IPv4 address nor a host name"),
            Self::InvalidPort(port) => write!(f, "server port {port} is outside 1..=65535"),
            Self::InvalidUrl => write!(f, "server url must look like http://host[:port][/path]"),
            Self::TlsUnsupported => write!(f, "only plain http:// server urls are supported"),
            Self::EmptyClientId => write!(f, "client_id must not be empty"),
            Self::InvalidClientId => write!(
                f,
                "client_id must be printable ASCII without spaces, at most {MAX_CLIENT_ID_LEN} bytes"
            ),
            Self::InvalidPin { role, pin } => write!(f, "{role} pin {pin} is not an ESP32 GPIO"),
            Self::ReservedPin { role, pin } => {
                write!(f, "{role} pin {pin} is reserved (flash or serial console)")
            }
            Self::InputOnlyPin { role, pin } => {
                write!(f, "{role} pin {pin} is input-only but the role drives it")
            }
            Self::PinConflict { pin, first, second } => {
                write!(f, "pin {pin} is assigned to both {first} and {second}")
            }
            Self::MissingEthernetPins => write!(f, "ethernet selected but [pins.ethernet] missing"),
            Self::ZeroTiming(name) => write!(f, "timing {name} must be greater than zero"),
            Self::UnsupportedBaud(baud) => write!(f, "serial baud {baud} is not a standard rate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WifiCredentials<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetSettings {
    pub mac: [u8; 6],
    /// `None` means DHCP
    pub static_ip: Option<Ipv4Addr>,
}

impl EthernetSettings {
    /// Gateway and DNS server assumed for a static address: the `.1` host of
    /// the address' /24.
    pub fn static_gateway(&self) -> Option<Ipv4Addr> {
        self.static_ip.map(|ip| {
            let [a, b, c, _] = ip.octets();
            Ipv4Addr::new(a, b, c, 1)
        })
    }
}

/// Network transport of the door node. Exactly one is active per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network<'a> {
    Wifi(WifiCredentials<'a>),
    Ethernet(EthernetSettings),
}

impl<'a> Network<'a> {
    pub fn wifi(&self) -> Option<&WifiCredentials<'a>> {
        match self {
            Self::Wifi(credentials) => Some(credentials),
            Self::Ethernet(_) => None,
        }
    }

    pub fn ethernet(&self) -> Option<&EthernetSettings> {
        match self {
            Self::Ethernet(settings) => Some(settings),
            Self::Wifi(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Wifi(_) => "wifi",
            Self::Ethernet(_) => "ethernet",
        }
    }
}

/// Pick the active network branch from the single build toggle. The inactive
/// section may be present and is ignored.
pub fn select_network<'a>(
    use_ethernet: bool,
    wifi: Option<WifiCredentials<'a>>,
    ethernet: Option<EthernetSettings>,
) -> Result<Network<'a>, ConfigError> {
    if use_ethernet {
        ethernet
            .map(Network::Ethernet)
            .ok_or(ConfigError::MissingNetworkSection("ethernet"))
    } else {
        wifi.map(Network::Wifi)
            .ok_or(ConfigError::MissingNetworkSection("wifi"))
    }
}

/// Parse `DE:AD:BE:EF:FE:ED` (`-` separators accepted too).
pub fn parse_mac(s: &str) -> Result<[u8; 6], ConfigError> {
    let mut mac = [0u8; 6];
    let mut octets = s.trim().split(|c: char| c == ':' || c == '-');
    for byte in mac.iter_mut() {
        let octet = octets.next().ok_or(ConfigError::InvalidMac)?;
        if octet.len() != 2 {
            return Err(ConfigError::InvalidMac);
        }
        *byte = u8::from_str_radix(octet, 16).map_err(|_| ConfigError::InvalidMac)?;
    }
    if octets.next().is_some() {
        return Err(ConfigError::InvalidMac);
    }
    Ok(mac)
}

/// Location of the access-control server, normalised from either the
/// host + port pair or a combined `http://` URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerEndpoint<'a> {
    pub host: &'a str,
    pub port: u16,
    /// Path prefix prepended to every endpoint, empty or starting with `/`,
    /// never ending with `/`
    pub base_path: &'a str,
}

impl<'a> ServerEndpoint<'a> {
    pub fn from_host_port(host: &'a str, port: i64) -> Result<Self, ConfigError> {
        let host = host.trim();
        if !is_valid_host(host) {
            return Err(ConfigError::InvalidHost);
        }
        let port = match u16::try_from(port) {
            Ok(port) if port != 0 => port,
            _ => return Err(ConfigError::InvalidPort(port)),
        };
        Ok(Self {
            host,
            port,
            base_path: "",
        })
    }

    pub fn from_url(url: &'a str) -> Result<Self, ConfigError> {
        let url = url.trim();
        let rest = match url.split_once("://") {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("http") => rest,
            Some((scheme, _)) if scheme.eq_ignore_ascii_case("https") => {
                return Err(ConfigError::TlsUnsupported)
            }
            _ => return Err(ConfigError::InvalidUrl),
        };

        let (authority, path) = match rest.find('/') {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, ""),
        };
        if path.contains(['?', '#']) {
            return Err(ConfigError::InvalidUrl);
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<i64>().map_err(|_| ConfigError::InvalidUrl)?;
                (host, port)
            }
            None => (authority, DEFAULT_HTTP_PORT as i64),
        };

        let mut endpoint = Self::from_host_port(host, port)?;
        endpoint.base_path = path.trim_end_matches('/');
        Ok(endpoint)
    }

    /// Accept exactly one of the two schemas.
    pub fn resolve(
        host: Option<&'a str>,
        port: Option<i64>,
        url: Option<&'a str>,
    ) -> Result<Self, ConfigError> {
        match (host, port, url) {
            (Some(host), Some(port), None) => Self::from_host_port(host, port),
            (None, None, Some(url)) => Self::from_url(url),
            (None, None, None) => Err(ConfigError::MissingServer),
            (_, _, Some(_)) => Err(ConfigError::AmbiguousServer),
            _ => Err(ConfigError::MissingServer),
        }
    }

    /// The host as an IPv4 literal, `None` when it needs a DNS lookup
    pub fn ip(&self) -> Option<Ipv4Addr> {
        Ipv4Addr::from_str(self.host).ok()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_host(self.host) {
            return Err(ConfigError::InvalidHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(0));
        }
        if !(self.base_path.is_empty()
            || (self.base_path.starts_with('/') && !self.base_path.ends_with('/')))
        {
            return Err(ConfigError::InvalidUrl);
        }
        Ok(())
    }
}

/// IPv4 literal or RFC 1123 host name
pub fn is_valid_host(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    if host.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Ipv4Addr::from_str(host).is_ok();
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRole {
    Relay,
    LedGreen,
    LedRed,
    Buzzer,
    Contact,
    Sda,
    Scl,
    EthSck,
    EthMiso,
    EthMosi,
    EthCs,
    EthInt,
    EthReset,
}

impl PinRole {
    pub fn name(self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::LedGreen => "led_green",
            Self::LedRed => "led_red",
            Self::Buzzer => "buzzer",
            Self::Contact => "contact",
            Self::Sda => "sda",
            Self::Scl => "scl",
            Self::EthSck => "ethernet.sck",
            Self::EthMiso => "ethernet.miso",
            Self::EthMosi => "ethernet.mosi",
            Self::EthCs => "ethernet.cs",
            Self::EthInt => "ethernet.int",
            Self::EthReset => "ethernet.reset",
        }
    }

    /// Roles whose pin must be able to drive a level
    pub fn drives(self) -> bool {
        !matches!(self, Self::Contact | Self::EthMiso | Self::EthInt)
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SPI wiring of a W5500 Ethernet module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetPins {
    pub sck: u8,
    pub miso: u8,
    pub mosi: u8,
    pub cs: u8,
    pub int: u8,
    pub reset: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pins {
    pub relay: u8,
    pub led_green: u8,
    pub led_red: u8,
    pub buzzer: u8,
    pub contact: u8,
    /// I2C to the PN532
    pub sda: u8,
    pub scl: u8,
    pub ethernet: Option<EthernetPins>,
}

impl Pins {
    /// Every bound `(role, gpio)` pair, Ethernet pins included when wired
    pub fn assigned(&self) -> Vec<(PinRole, u8), MAX_ASSIGNED_PINS> {
        let mut pins = Vec::new();
        let door = [
            (PinRole::Relay, self.relay),
            (PinRole::LedGreen, self.led_green),
            (PinRole::LedRed, self.led_red),
            (PinRole::Buzzer, self.buzzer),
            (PinRole::Contact, self.contact),
            (PinRole::Sda, self.sda),
            (PinRole::Scl, self.scl),
        ];
        // capacity covers all roles
        pins.extend_from_slice(&door).ok();
        if let Some(eth) = self.ethernet {
            pins.extend_from_slice(&[
                (PinRole::EthSck, eth.sck),
                (PinRole::EthMiso, eth.miso),
                (PinRole::EthMosi, eth.mosi),
                (PinRole::EthCs, eth.cs),
                (PinRole::EthInt, eth.int),
                (PinRole::EthReset, eth.reset),
            ])
            .ok();
        }
        pins
    }

    fn validate(&self, console_enabled: bool) -> Result<(), ConfigError> {
        let assigned = self.assigned();
        for (i, &(role, pin)) in assigned.iter().enumerate() {
            if pin > MAX_GPIO || MISSING_GPIOS.contains(&pin) {
                return Err(ConfigError::InvalidPin { role, pin });
            }
            if FLASH_GPIOS.contains(&pin) || (console_enabled && CONSOLE_GPIOS.contains(&pin)) {
                return Err(ConfigError::ReservedPin { role, pin });
            }
            if role.drives() && INPUT_ONLY_GPIOS.contains(&pin) {
                return Err(ConfigError::InputOnlyPin { role, pin });
            }
            if let Some(&(first, _)) = assigned[..i].iter().find(|(_, other)| *other == pin) {
                return Err(ConfigError::PinConflict {
                    pin,
                    first,
                    second: role,
                });
            }
        }
        Ok(())
    }
}

/// Durations in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// How long the relay keeps the lock open after a granted read
    pub door_unlock_ms: u32,
    /// Minimum gap between two card reads
    pub card_read_delay_ms: u32,
    /// Bound on joining the network
    pub network_timeout_ms: u32,
    /// Bound on one HTTP exchange with the server
    pub http_timeout_ms: u32,
}

impl Timings {
    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("door_unlock_ms", self.door_unlock_ms),
            ("card_read_delay_ms", self.card_read_delay_ms),
            ("network_timeout_ms", self.network_timeout_ms),
            ("http_timeout_ms", self.http_timeout_ms),
        ];
        match named.iter().find(|(_, value)| *value == 0) {
            Some(&(name, _)) => Err(ConfigError::ZeroTiming(name)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugConfig {
    pub serial: bool,
    pub serial_baud: u32,
}

/// Identity and behaviour envelope of one door node, fixed at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config<'a> {
    pub network: Network<'a>,
    pub server: ServerEndpoint<'a>,
    /// Sent with every request so the server knows which door is asking
    pub client_id: &'a str,
    pub pins: Pins,
    pub timing: Timings,
    pub debug: DebugConfig,
}

impl Config<'_> {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.network {
            Network::Wifi(wifi) => {
                if wifi.ssid.is_empty() || wifi.ssid.len() > MAX_SSID_LEN {
                    return Err(ConfigError::InvalidSsid);
                }
                if wifi.password.len() > MAX_WIFI_PASSWORD_LEN {
                    return Err(ConfigError::InvalidWifiPassword);
                }
            }
            Network::Ethernet(eth) => {
                // multicast bit set or all zero
                if eth.mac[0] & 0x01 != 0 || eth.mac == [0; 6] {
                    return Err(ConfigError::InvalidMac);
                }
                if let Some(ip) = eth.static_ip {
                    if ip.is_unspecified() || ip.is_broadcast() || ip.is_multicast() {
                        return Err(ConfigError::InvalidStaticIp);
                    }
                }
                if self.pins.ethernet.is_none() {
                    return Err(ConfigError::MissingEthernetPins);
                }
            }
        }

        self.server.validate()?;

        if self.client_id.is_empty() {
            return Err(ConfigError::EmptyClientId);
        }
        // also the DHCP host name, so no whitespace
        if self.client_id.len() > MAX_CLIENT_ID_LEN
            || !self.client_id.bytes().all(|b| b.is_ascii_graphic())
        {
            return Err(ConfigError::InvalidClientId);
        }

        self.pins.validate(self.debug.serial)?;
        self.timing.validate()?;

        if !STANDARD_BAUD_RATES.contains(&self.debug.serial_baud) {
            return Err(ConfigError::UnsupportedBaud(self.debug.serial_baud));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door_config() -> Config<'static> {
        Config {
            network: Network::Wifi(WifiCredentials {
                ssid: "SSID",
                password: "PASSWORD",
            }),
            server: ServerEndpoint::from_host_port("192.168.178.27", 3005).unwrap(),
            client_id: "door-001",
            pins: Pins {
                relay: 2,
                led_green: 12,
                led_red: 13,
                buzzer: 14,
                contact: 15,
                sda: 21,
                scl: 22,
                ethernet: None,
            },
            timing: Timings {
                door_unlock_ms: 3000,
                card_read_delay_ms: 1000,
                network_timeout_ms: 10000,
                http_timeout_ms: 5000,
            },
            debug: DebugConfig {
                serial: true,
                serial_baud: 115200,
            },
        }
    }

    fn ethernet_pins() -> EthernetPins {
        EthernetPins {
            sck: 18,
            miso: 19,
            mosi: 23,
            cs: 5,
            int: 4,
            reset: 26,
        }
    }

    #[test]
    fn reference_door_is_valid() {
        let config = door_config();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.server.ip(), Some(Ipv4Addr::new(192, 168, 178, 27)));
        assert_eq!(config.server.port, 3005);
    }

    #[test]
    fn zero_timing_is_rejected() {
        let mut config = door_config();
        config.timing.http_timeout_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroTiming("http_timeout_ms"))
        );

        let mut config = door_config();
        config.timing.door_unlock_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroTiming("door_unlock_ms"))
        );
    }

    #[test]
    fn shared_pin_is_rejected() {
        let mut config = door_config();
        config.pins.buzzer = config.pins.led_red;
        assert_eq!(
            config.validate(),
            Err(ConfigError::PinConflict {
                pin: 13,
                first: PinRole::LedRed,
                second: PinRole::Buzzer,
            })
        );
    }

    #[test]
    fn ethernet_pins_take_part_in_uniqueness() {
        let mut config = door_config();
        config.network = Network::Ethernet(EthernetSettings {
            mac: [0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED],
            static_ip: Some(Ipv4Addr::new(192, 168, 178, 100)),
        });
        config.pins.ethernet = Some(EthernetPins {
            int: 15,
            ..ethernet_pins()
        });
        assert_eq!(
            config.validate(),
            Err(ConfigError::PinConflict {
                pin: 15,
                first: PinRole::Contact,
                second: PinRole::EthInt,
            })
        );

        config.pins.ethernet = Some(ethernet_pins());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn ethernet_without_spi_pins_is_rejected() {
        let mut config = door_config();
        config.network = Network::Ethernet(EthernetSettings {
            mac: [0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED],
            static_ip: None,
        });
        assert_eq!(config.validate(), Err(ConfigError::MissingEthernetPins));
    }

    #[test]
    fn unusable_gpios_are_rejected() {
        let mut config = door_config();
        config.pins.relay = 40;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPin { .. })));

        let mut config = door_config();
        config.pins.relay = 24;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPin { .. })));

        let mut config = door_config();
        config.pins.led_green = 7;
        assert!(matches!(config.validate(), Err(ConfigError::ReservedPin { .. })));

        let mut config = door_config();
        config.pins.buzzer = 35;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InputOnlyPin {
                role: PinRole::Buzzer,
                pin: 35
            })
        );

        // an input-only pin is fine for the contact sensor
        let mut config = door_config();
        config.pins.contact = 35;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn console_pins_are_free_without_serial() {
        let mut config = door_config();
        config.pins.contact = 3;
        assert!(matches!(config.validate(), Err(ConfigError::ReservedPin { .. })));

        config.debug.serial = false;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn network_branch_follows_toggle() {
        let wifi = WifiCredentials {
            ssid: "SSID",
            password: "PASSWORD",
        };
        let eth = EthernetSettings {
            mac: [0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED],
            static_ip: None,
        };

        assert_eq!(
            select_network(false, Some(wifi), Some(eth)),
            Ok(Network::Wifi(wifi))
        );
        assert_eq!(
            select_network(true, Some(wifi), Some(eth)),
            Ok(Network::Ethernet(eth))
        );
        assert_eq!(
            select_network(true, Some(wifi), None),
            Err(ConfigError::MissingNetworkSection("ethernet"))
        );
        assert_eq!(
            select_network(false, None, Some(eth)),
            Err(ConfigError::MissingNetworkSection("wifi"))
        );
    }

    #[test]
    fn host_and_port_are_checked() {
        assert!(ServerEndpoint::from_host_port("door-server.local", 80).is_ok());
        assert_eq!(
            ServerEndpoint::from_host_port("192.168.178.27", 0),
            Err(ConfigError::InvalidPort(0))
        );
        assert_eq!(
            ServerEndpoint::from_host_port("192.168.178.27", 65536),
            Err(ConfigError::InvalidPort(65536))
        );
        assert_eq!(
            ServerEndpoint::from_host_port("192.168.178.256", 3005),
            Err(ConfigError::InvalidHost)
        );
        assert_eq!(
            ServerEndpoint::from_host_port("bad_host", 3005),
            Err(ConfigError::InvalidHost)
        );
        assert_eq!(
            ServerEndpoint::from_host_port("", 3005),
            Err(ConfigError::InvalidHost)
        );
    }

    #[test]
    fn url_schema_is_normalised() {
        let endpoint = ServerEndpoint::from_url("http://192.168.178.27:3005/api/").unwrap();
        assert_eq!(endpoint.host, "192.168.178.27");
        assert_eq!(endpoint.port, 3005);
        assert_eq!(endpoint.base_path, "/api");

        let endpoint = ServerEndpoint::from_url("http://doors.example.org").unwrap();
        assert_eq!(endpoint.port, DEFAULT_HTTP_PORT);
        assert_eq!(endpoint.base_path, "");
        assert_eq!(endpoint.ip(), None);

        assert_eq!(
            ServerEndpoint::from_url("https://doors.example.org"),
            Err(ConfigError::TlsUnsupported)
        );
        assert_eq!(
            ServerEndpoint::from_url("doors.example.org:3005"),
            Err(ConfigError::InvalidUrl)
        );
        assert_eq!(
            ServerEndpoint::from_url("http://doors.example.org:port"),
            Err(ConfigError::InvalidUrl)
        );
    }

    #[test]
    fn exactly_one_server_schema() {
        assert!(ServerEndpoint::resolve(Some("10.0.0.2"), Some(3005), None).is_ok());
        assert!(ServerEndpoint::resolve(None, None, Some("http://10.0.0.2:3005")).is_ok());
        assert_eq!(
            ServerEndpoint::resolve(Some("10.0.0.2"), Some(3005), Some("http://10.0.0.2")),
            Err(ConfigError::AmbiguousServer)
        );
        assert_eq!(
            ServerEndpoint::resolve(Some("10.0.0.2"), None, None),
            Err(ConfigError::MissingServer)
        );
        assert_eq!(
            ServerEndpoint::resolve(None, None, None),
            Err(ConfigError::MissingServer)
        );
    }

    #[test]
    fn client_id_must_be_present() {
        let mut config = door_config();
        config.client_id = "";
        assert_eq!(config.validate(), Err(ConfigError::EmptyClientId));

        config.client_id = "door 001";
        assert_eq!(config.validate(), Err(ConfigError::InvalidClientId));
        config.client_id = "door\t001";
        assert_eq!(config.validate(), Err(ConfigError::InvalidClientId));
        config.client_id = "porte-entrée";
        assert_eq!(config.validate(), Err(ConfigError::InvalidClientId));

        config.client_id = "door_001.lab~B";
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn mac_parsing() {
        assert_eq!(
            parse_mac("DE:AD:BE:EF:FE:ED"),
            Ok([0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED])
        );
        assert_eq!(
            parse_mac("02-00-00-00-00-01"),
            Ok([0x02, 0, 0, 0, 0, 0x01])
        );
        assert_eq!(parse_mac("DE:AD:BE:EF:FE"), Err(ConfigError::InvalidMac));
        assert_eq!(parse_mac("DE:AD:BE:EF:FE:ED:00"), Err(ConfigError::InvalidMac));
        assert_eq!(parse_mac("DE:AD:BE:EF:FE:GG"), Err(ConfigError::InvalidMac));
    }

    #[test]
    fn static_ip_implies_gateway() {
        let eth = EthernetSettings {
            mac: [0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED],
            static_ip: Some(Ipv4Addr::new(192, 168, 178, 100)),
        };
        assert_eq!(eth.static_gateway(), Some(Ipv4Addr::new(192, 168, 178, 1)));
    }

    #[test]
    fn odd_baud_is_rejected() {
        let mut config = door_config();
        config.debug.serial_baud = 12345;
        assert_eq!(config.validate(), Err(ConfigError::UnsupportedBaud(12345)));
    }
}
