#![no_std]
#![no_main]

use static_cell::StaticCell;

use embassy_executor::Spawner;
use embassy_net::Stack;
use embassy_time::{Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_println::logger::init_logger;

use hal::{
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    i2c::master::{BusTimeout, I2c},
    rng::Rng,
    time::Rate,
    timer::timg::TimerGroup,
};

#[macro_use]
mod config;
mod constants;
mod door;
#[cfg(feature = "ethernet")]
mod ethernet;
mod http;
mod indicator;
mod network;
mod nfc;
mod server;
mod transport;
#[cfg(not(feature = "ethernet"))]
mod wifi;

use config::CONFIG;
use constants::*;
use door::Door;
use http::HttpClient;
use indicator::{Indicator, IndicatorChannel};
use server::{DecisionChannel, RequestChannel, Server};

esp_bootloader_esp_idf::esp_app_desc!();

static INDICATOR: StaticCell<IndicatorChannel> = StaticCell::new();
static REQUESTS: StaticCell<RequestChannel> = StaticCell::new();
static DECISIONS: StaticCell<DecisionChannel> = StaticCell::new();

static RX_BUF: StaticCell<[u8; RX_BUFFER_SIZE]> = StaticCell::new();
static TX_BUF: StaticCell<[u8; TX_BUFFER_SIZE]> = StaticCell::new();

#[cfg(console_baud)]
static CONSOLE: StaticCell<hal::uart::Uart<'static, hal::Blocking>> = StaticCell::new();

#[cfg(not(feature = "ethernet"))]
static WIFI_INIT: StaticCell<esp_wifi::EspWifiController<'static>> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    let level = if CONFIG.debug.serial {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    init_logger(level);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // move the console off the ROM default rate
    #[cfg(console_baud)]
    {
        let uart_config =
            hal::uart::Config::default().with_baudrate(CONFIG.debug.serial_baud);
        let console = hal::uart::Uart::new(peripherals.UART0, uart_config)
            .expect("Invalid console UART configuration")
            .with_tx(peripherals.GPIO1)
            .with_rx(peripherals.GPIO3);
        CONSOLE.init(console);
    }

    log::info!(
        "NFC door client v{} starting as {}",
        VERSION,
        CONFIG.client_id
    );

    let mut rng = Rng::new(peripherals.RNG);
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);

    esp_hal_embassy::init(timg0.timer0);

    // outputs start low: relay released, LEDs and buzzer off
    let relay = Output::new(relay_pin!(peripherals), Level::Low, OutputConfig::default());
    let green = Output::new(
        led_green_pin!(peripherals),
        Level::Low,
        OutputConfig::default(),
    );
    let red = Output::new(led_red_pin!(peripherals), Level::Low, OutputConfig::default());
    let buzzer = Output::new(buzzer_pin!(peripherals), Level::Low, OutputConfig::default());
    let contact = Input::new(
        contact_pin!(peripherals),
        InputConfig::default().with_pull(Pull::Up),
    );

    let indicator_channel: &'static IndicatorChannel = INDICATOR.init(IndicatorChannel::new());
    spawner
        .spawn(indicator::indicator_task(
            indicator_channel,
            Indicator::new(green, red, buzzer),
        ))
        .expect("Failed to spawn indicator task");

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    let i2c_config = hal::i2c::master::Config::default()
        .with_frequency(Rate::from_khz(NFC_I2C_FREQUENCY_KHZ))
        .with_timeout(BusTimeout::BusCycles(24));

    let i2c = I2c::new(peripherals.I2C0, i2c_config)
        .expect("Invalid I2C configuration")
        .with_sda(sda_pin!(peripherals))
        .with_scl(scl_pin!(peripherals))
        .into_async();

    let reader = nfc::Reader::new(pn532::i2c::I2CInterface { i2c });

    #[cfg(not(feature = "ethernet"))]
    let stack: Stack<'static> = {
        let timg1 = TimerGroup::new(peripherals.TIMG1);
        let init = WIFI_INIT.init(
            esp_wifi::init(timg1.timer0, rng, peripherals.RADIO_CLK)
                .expect("Failed to initialise the radio"),
        );
        let wifi = wifi::Wifi::new(init, peripherals.WIFI, seed, spawner)
            .await
            .expect("Failed to set up WiFi");
        wifi.stack
    };

    #[cfg(feature = "ethernet")]
    let stack: Stack<'static> = {
        use hal::spi::{
            master::{Config as SpiConfig, Spi},
            Mode,
        };

        let spi_config = SpiConfig::default()
            .with_frequency(Rate::from_mhz(ETHERNET_SPI_FREQUENCY_MHZ))
            .with_mode(Mode::_0);
        let spi = Spi::new(peripherals.SPI2, spi_config)
            .expect("Invalid SPI configuration")
            .with_sck(eth_sck_pin!(peripherals))
            .with_miso(eth_miso_pin!(peripherals))
            .with_mosi(eth_mosi_pin!(peripherals))
            .into_async();
        let cs = Output::new(eth_cs_pin!(peripherals), Level::High, OutputConfig::default());
        let int = Input::new(
            eth_int_pin!(peripherals),
            InputConfig::default().with_pull(Pull::Up),
        );
        let reset = Output::new(
            eth_reset_pin!(peripherals),
            Level::High,
            OutputConfig::default(),
        );

        let ethernet = ethernet::Ethernet::new(spi, cs, int, reset, seed, spawner)
            .await
            .expect("Failed to set up Ethernet");
        ethernet.stack
    };

    let client = HttpClient::new(
        stack,
        RX_BUF.init([0; RX_BUFFER_SIZE]),
        TX_BUF.init([0; TX_BUFFER_SIZE]),
        CONFIG.server,
        CONFIG.timing.http_timeout_ms,
    );

    let requests: &'static RequestChannel = REQUESTS.init(RequestChannel::new());
    let decisions: &'static DecisionChannel = DECISIONS.init(DecisionChannel::new());
    spawner
        .spawn(server::server_task(Server::new(client), requests, decisions))
        .expect("Failed to spawn server task");

    let door = Door::new(
        reader,
        relay,
        contact,
        indicator_channel,
        requests,
        decisions,
    );
    spawner
        .spawn(door::door_task(door))
        .expect("Failed to spawn door task");

    // the door runs offline too, cards are refused until the network is up
    if let Err(e) = network::wait_until_up(stack).await {
        log::warn!("Network not up yet ({:?}), continuing", e);
    }
}
