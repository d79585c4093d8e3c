use core::future::Future;

use log::info;

use embassy_time::{with_deadline, Duration, Instant, TimeoutError};
use pn532::{
    requests::{Command, SAMMode},
    Interface, Request,
};

use door_core::pn532::{
    max_retries_params, parse_firmware_version, parse_passive_target, TagUid,
    PASSIVE_ACTIVATION_RETRIES, PN532_IC,
};

use crate::constants::{NFC_COMMAND_TIMEOUT_MS, NFC_POLL_TIMEOUT_MS};

/// Frame buffer of the driver
const BUFFER_LEN: usize = 64;
/// Firmware version answer: IC, Ver, Rev, Support
const FIRMWARE_RESPONSE_LEN: usize = 4;
/// InListPassiveTarget answer with room for a triple size UID
const INLIST_RESPONSE_LEN: usize = 20;

#[derive(Debug)]
#[allow(dead_code)]
pub enum Error<E: core::fmt::Debug> {
    Pn532(pn532::Error<E>),
    MalformedFirmwareVersion,
    UnexpectedFirmware(u8),
}

impl<E: core::fmt::Debug> From<pn532::Error<E>> for Error<E> {
    fn from(e: pn532::Error<E>) -> Self {
        Error::Pn532(e)
    }
}

/// Deadline timer the driver waits for ACKs and responses with
#[derive(Default)]
pub struct EmbassyTimer {
    deadline: Option<Instant>,
}

impl pn532::CountDown for EmbassyTimer {
    type Time = Duration;

    fn start<D: Into<Self::Time>>(&mut self, count: D) {
        let now = Instant::now();
        self.deadline = Some(now.checked_add(count.into()).unwrap_or(now));
    }

    async fn until_timeout<F: Future>(&self, fut: F) -> Result<F::Output, TimeoutError> {
        with_deadline(self.deadline.unwrap_or_else(Instant::now), fut).await
    }
}

/// PN532 reading ISO14443A cards
pub struct Reader<I: Interface> {
    pn532: pn532::Pn532<I, EmbassyTimer, BUFFER_LEN>,
}

impl<I> Reader<I>
where
    I: Interface,
    I::Error: core::fmt::Debug,
{
    pub fn new(interface: I) -> Self {
        Self {
            pn532: pn532::Pn532::new(interface, EmbassyTimer::default()),
        }
    }

    /// Check the chip answers as a PN532, then configure it for reading
    /// ISO14443A cards
    pub async fn init(&mut self) -> Result<(), Error<I::Error>> {
        info!("Initialising PN532...");
        let command_timeout = Duration::from_millis(NFC_COMMAND_TIMEOUT_MS);

        let data = self
            .pn532
            .process(
                &Request::GET_FIRMWARE_VERSION,
                FIRMWARE_RESPONSE_LEN,
                command_timeout,
            )
            .await?;
        let firmware = parse_firmware_version(data).ok_or(Error::MalformedFirmwareVersion)?;
        if firmware.ic != PN532_IC {
            return Err(Error::UnexpectedFirmware(firmware.ic));
        }
        info!(
            "Found PN5{:02x} with firmware {}.{}",
            firmware.ic, firmware.version, firmware.revision
        );

        // no IRQ line is wired, the driver polls the status byte
        self.pn532
            .process(
                &Request::sam_configuration(SAMMode::Normal, false),
                0,
                command_timeout,
            )
            .await?;

        // bound the chip's own retries so one poll stays short
        self.pn532
            .process(
                &Request::new(
                    Command::RFConfiguration,
                    max_retries_params(PASSIVE_ACTIVATION_RETRIES),
                ),
                0,
                command_timeout,
            )
            .await?;

        info!("Initialised PN532");
        Ok(())
    }

    /// Look for one card in the field. `Ok(None)` when there is none.
    pub async fn read_passive_target(&mut self) -> Result<Option<TagUid>, Error<I::Error>> {
        match self
            .pn532
            .process(
                &Request::INLIST_ONE_ISO_A_TARGET,
                INLIST_RESPONSE_LEN,
                Duration::from_millis(NFC_POLL_TIMEOUT_MS),
            )
            .await
        {
            Ok(data) => Ok(parse_passive_target(data)),
            // still searching when the poll window closed
            Err(pn532::Error::TimeoutResponse) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
