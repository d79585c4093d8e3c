use embassy_executor::Spawner;
use embassy_net::{Ipv4Cidr, Runner, Stack, StackResources, StaticConfigV4};
use embassy_net_wiznet::{chip::W5500, Device, State};
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;

use esp_hal::{
    gpio::{Input, Output},
    spi::master::Spi,
    Async,
};

use heapless::Vec;
use log::info;
use static_cell::StaticCell;

use crate::config::CONFIG;
use crate::network;

type W5500Spi = ExclusiveDevice<Spi<'static, Async>, Output<'static>, Delay>;
type W5500Runner = embassy_net_wiznet::Runner<'static, W5500, W5500Spi, Input<'static>, Output<'static>>;

static STATE: StaticCell<State<8, 8>> = StaticCell::new();
static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

/// Netmask assumed for a static address
const STATIC_PREFIX_LEN: u8 = 24;

pub struct Ethernet {
    pub stack: Stack<'static>,
}

#[derive(Debug)]
pub enum Error {
    NotConfigured,
    ChipInitFailed,
    SpawnFailed,
}

impl Ethernet {
    pub async fn new(
        spi: Spi<'static, Async>,
        cs: Output<'static>,
        int: Input<'static>,
        reset: Output<'static>,
        seed: u64,
        spawner: Spawner,
    ) -> Result<Self, Error> {
        let settings = CONFIG.network.ethernet().ok_or(Error::NotConfigured)?;

        let spi_dev = ExclusiveDevice::new(spi, cs, Delay).map_err(|_| Error::ChipInitFailed)?;
        let state = STATE.init(State::new());
        let (device, runner) =
            embassy_net_wiznet::new(settings.mac, state, spi_dev, int, reset)
                .await
                .map_err(|e| {
                    log::error!("W5500 init failed: {:?}", e);
                    Error::ChipInitFailed
                })?;
        spawner
            .spawn(ethernet_task(runner))
            .map_err(|_| Error::SpawnFailed)?;

        let config = match settings.static_ip {
            Some(address) => {
                let gateway = settings.static_gateway();
                let mut dns_servers = Vec::new();
                if let Some(gateway) = gateway {
                    dns_servers.push(gateway).ok();
                }
                info!("Using static address {}/{}", address, STATIC_PREFIX_LEN);
                embassy_net::Config::ipv4_static(StaticConfigV4 {
                    address: Ipv4Cidr::new(address, STATIC_PREFIX_LEN),
                    gateway,
                    dns_servers,
                })
            }
            None => embassy_net::Config::dhcpv4(network::dhcp_config()),
        };

        let resources = RESOURCES.init(StackResources::new());
        let (stack, runner) = embassy_net::new(device, config, resources, seed);

        spawner
            .spawn(net_task(runner))
            .map_err(|_| Error::SpawnFailed)?;

        Ok(Self { stack })
    }
}

#[embassy_executor::task]
async fn ethernet_task(runner: W5500Runner) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, Device<'static>>) -> ! {
    runner.run().await
}
