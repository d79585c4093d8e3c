use core::str::FromStr;

use embassy_net::{DhcpConfig, Stack};
use embassy_time::{with_timeout, Duration, Timer};
use heapless::String;
use log::info;

use crate::config::CONFIG;
use crate::constants::NETWORK_POLL_INTERVAL_MS;

#[derive(Debug)]
pub enum Error {
    Timeout,
}

/// DHCP client announcing the door's client id as host name
pub fn dhcp_config() -> DhcpConfig {
    let mut dhcp_config = DhcpConfig::default();
    dhcp_config.hostname = String::<32>::from_str(CONFIG.client_id).ok();
    if dhcp_config.hostname.is_none() {
        log::warn!("client_id too long for a DHCP host name, sending none");
    }
    dhcp_config
}

/// Wait for link and an IPv4 address, bounded by the configured network timeout
pub async fn wait_until_up(stack: Stack<'static>) -> Result<(), Error> {
    let timeout = Duration::from_millis(CONFIG.timing.network_timeout_ms.into());
    with_timeout(timeout, wait_for_address(stack))
        .await
        .map_err(|_| Error::Timeout)
}

async fn wait_for_address(stack: Stack<'static>) {
    info!("Waiting for network stack to be ready...");
    loop {
        if stack.is_link_up() && stack.is_config_up() {
            break;
        }
        Timer::after(Duration::from_millis(NETWORK_POLL_INTERVAL_MS)).await;
    }

    info!("Waiting to get IP address...");
    loop {
        if let Some(config) = stack.config_v4() {
            info!("Got IP: {}", config.address);
            break;
        }
        Timer::after(Duration::from_millis(NETWORK_POLL_INTERVAL_MS)).await;
    }
}

/// A request can only succeed with link and address up
pub fn is_up(stack: Stack<'static>) -> bool {
    stack.is_link_up() && stack.is_config_up()
}
