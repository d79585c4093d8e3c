use std::{env, error::Error, fmt::Write as _, fs, net::Ipv4Addr, path::Path};

use door_core::config::{
    parse_mac, select_network, Config, DebugConfig, EthernetPins, EthernetSettings, Network,
    Pins, ServerEndpoint, Timings, WifiCredentials,
};
use serde::Deserialize;

/// Baud rate the ESP32 ROM leaves UART0 at
const ROM_CONSOLE_BAUD: u32 = 115200;

#[derive(Deserialize)]
struct RawConfig {
    client_id: String,
    wifi: Option<RawWifi>,
    ethernet: Option<RawEthernet>,
    server: RawServer,
    pins: RawPins,
    timing: RawTiming,
    debug: RawDebug,
}

#[derive(Deserialize)]
struct RawWifi {
    ssid: String,
    password: String,
}

#[derive(Deserialize)]
struct RawEthernet {
    mac: String,
    static_ip: Option<String>,
}

#[derive(Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<i64>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct RawPins {
    relay: u8,
    led_green: u8,
    led_red: u8,
    buzzer: u8,
    contact: u8,
    sda: u8,
    scl: u8,
    ethernet: Option<RawEthernetPins>,
}

#[derive(Deserialize)]
struct RawEthernetPins {
    sck: u8,
    miso: u8,
    mosi: u8,
    cs: u8,
    int: u8,
    reset: u8,
}

#[derive(Deserialize)]
struct RawTiming {
    door_unlock_ms: u32,
    card_read_delay_ms: u32,
    network_timeout_ms: u32,
    http_timeout_ms: u32,
}

#[derive(Deserialize)]
struct RawDebug {
    serial: bool,
    serial_baud: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if toml changes
    println!("cargo:rerun-if-changed=cfg.toml");
    println!("cargo:rustc-check-cfg=cfg(console_baud)");

    let toml_str = fs::read_to_string("cfg.toml")
        .map_err(|e| format!("cannot read cfg.toml at the crate root: {e}"))?;
    let raw: RawConfig = toml::from_str(&toml_str)?;

    let use_ethernet = env::var_os("CARGO_FEATURE_ETHERNET").is_some();
    let config = build_config(&raw, use_ethernet)?;
    config
        .validate()
        .map_err(|e| format!("invalid cfg.toml: {e}"))?;

    if config.debug.serial && config.debug.serial_baud != ROM_CONSOLE_BAUD {
        println!("cargo:rustc-cfg=console_baud");
    }

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    fs::write(dest_path, render(&config)?)?;

    println!(
        "cargo:warning=door `{}` using {} towards {}:{}",
        config.client_id,
        config.network.kind(),
        config.server.host,
        config.server.port
    );
    Ok(())
}

fn build_config(raw: &RawConfig, use_ethernet: bool) -> Result<Config<'_>, Box<dyn Error>> {
    let wifi = raw.wifi.as_ref().map(|w| WifiCredentials {
        ssid: &w.ssid,
        password: &w.password,
    });

    let ethernet = match &raw.ethernet {
        Some(eth) => Some(EthernetSettings {
            mac: parse_mac(&eth.mac).map_err(|e| e.to_string())?,
            static_ip: eth
                .static_ip
                .as_deref()
                .map(|ip| ip.parse::<Ipv4Addr>())
                .transpose()
                .map_err(|e| format!("ethernet.static_ip: {e}"))?,
        }),
        None => None,
    };

    let network = select_network(use_ethernet, wifi, ethernet).map_err(|e| e.to_string())?;

    let server = ServerEndpoint::resolve(
        raw.server.host.as_deref(),
        raw.server.port,
        raw.server.url.as_deref(),
    )
    .map_err(|e| e.to_string())?;

    // SPI wiring only matters when the W5500 is in use
    let ethernet_pins = match (&network, &raw.pins.ethernet) {
        (Network::Ethernet(_), Some(p)) => Some(EthernetPins {
            sck: p.sck,
            miso: p.miso,
            mosi: p.mosi,
            cs: p.cs,
            int: p.int,
            reset: p.reset,
        }),
        _ => None,
    };

    Ok(Config {
        network,
        server,
        client_id: raw.client_id.trim(),
        pins: Pins {
            relay: raw.pins.relay,
            led_green: raw.pins.led_green,
            led_red: raw.pins.led_red,
            buzzer: raw.pins.buzzer,
            contact: raw.pins.contact,
            sda: raw.pins.sda,
            scl: raw.pins.scl,
            ethernet: ethernet_pins,
        },
        timing: Timings {
            door_unlock_ms: raw.timing.door_unlock_ms,
            card_read_delay_ms: raw.timing.card_read_delay_ms,
            network_timeout_ms: raw.timing.network_timeout_ms,
            http_timeout_ms: raw.timing.http_timeout_ms,
        },
        debug: DebugConfig {
            serial: raw.debug.serial,
            serial_baud: raw.debug.serial_baud,
        },
    })
}

// Generate Rust code: the CONFIG constant plus one macro per pin role that
// picks the matching peripheral, e.g. `relay_pin!(peripherals)`.
fn render(config: &Config<'_>) -> Result<String, std::fmt::Error> {
    let mut code = String::new();

    let network = match config.network {
        Network::Wifi(wifi) => format!(
            "Network::Wifi(WifiCredentials {{ ssid: {:?}, password: {:?} }})",
            wifi.ssid, wifi.password
        ),
        Network::Ethernet(eth) => {
            let static_ip = match eth.static_ip {
                Some(ip) => {
                    let [a, b, c, d] = ip.octets();
                    format!("Some(Ipv4Addr::new({a}, {b}, {c}, {d}))")
                }
                None => "None".to_string(),
            };
            format!(
                "Network::Ethernet(EthernetSettings {{ mac: {:?}, static_ip: {static_ip} }})",
                eth.mac
            )
        }
    };

    let ethernet_pins = match config.pins.ethernet {
        Some(p) => format!(
            "Some(EthernetPins {{ sck: {}, miso: {}, mosi: {}, cs: {}, int: {}, reset: {} }})",
            p.sck, p.miso, p.mosi, p.cs, p.int, p.reset
        ),
        None => "None".to_string(),
    };

    write!(
        code,
        r#"
        pub const CONFIG: Config<'static> = Config {{
            network: {network},
            server: ServerEndpoint {{
                host: {host:?},
                port: {port},
                base_path: {base_path:?},
            }},
            client_id: {client_id:?},
            pins: Pins {{
                relay: {relay},
                led_green: {led_green},
                led_red: {led_red},
                buzzer: {buzzer},
                contact: {contact},
                sda: {sda},
                scl: {scl},
                ethernet: {ethernet_pins},
            }},
            timing: Timings {{
                door_unlock_ms: {unlock},
                card_read_delay_ms: {read_delay},
                network_timeout_ms: {net_timeout},
                http_timeout_ms: {http_timeout},
            }},
            debug: DebugConfig {{
                serial: {serial},
                serial_baud: {baud},
            }},
        }};
    "#,
        host = config.server.host,
        port = config.server.port,
        base_path = config.server.base_path,
        client_id = config.client_id,
        relay = config.pins.relay,
        led_green = config.pins.led_green,
        led_red = config.pins.led_red,
        buzzer = config.pins.buzzer,
        contact = config.pins.contact,
        sda = config.pins.sda,
        scl = config.pins.scl,
        unlock = config.timing.door_unlock_ms,
        read_delay = config.timing.card_read_delay_ms,
        net_timeout = config.timing.network_timeout_ms,
        http_timeout = config.timing.http_timeout_ms,
        serial = config.debug.serial,
        baud = config.debug.serial_baud,
    )?;

    for (role, pin) in config.pins.assigned() {
        let name = role.name().replace('.', "_");
        let name = name.replace("ethernet_", "eth_");
        writeln!(
            code,
            "macro_rules! {name}_pin {{ ($p:expr) => {{ $p.GPIO{pin} }}; }}"
        )?;
    }

    Ok(code)
}
