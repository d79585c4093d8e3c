use log::{error, info, warn};

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Timer};
use esp_hal::{
    gpio::{Input, Output},
    i2c::master::I2c,
    Async,
};
use pn532::i2c::I2CInterface;

use door_core::door::{Action, Actions, Decision, DoorController};

use crate::config::CONFIG;
use crate::constants::{
    DOOR_LOOP_INTERVAL_MS, NFC_INIT_RETRY_DELAY_MS, NFC_MAX_CONSECUTIVE_ERRORS,
};
use crate::indicator::{self, IndicatorChannel, IndicatorCommand};
use crate::nfc;
use crate::server::{self, DecisionChannel, RequestChannel, ServerRequest};

pub type Reader = nfc::Reader<I2CInterface<I2c<'static, Async>>>;

/// Everything the door loop drives: reader, relay, contact sensor, and the
/// queues towards the indicator and the server tasks
pub struct Door {
    reader: Reader,
    relay: Output<'static>,
    contact: Input<'static>,
    indicator: &'static IndicatorChannel,
    requests: &'static RequestChannel,
    decisions: &'static DecisionChannel,
    controller: DoorController,
    reader_ready: bool,
    reader_errors: u8,
    next_reader_init: u64,
}

impl Door {
    pub fn new(
        reader: Reader,
        relay: Output<'static>,
        contact: Input<'static>,
        indicator: &'static IndicatorChannel,
        requests: &'static RequestChannel,
        decisions: &'static DecisionChannel,
    ) -> Self {
        // contact is pulled up, the magnet pulls it low while the door is shut
        let controller = DoorController::new(&CONFIG.timing, contact.is_high());
        Self {
            reader,
            relay,
            contact,
            indicator,
            requests,
            decisions,
            controller,
            reader_ready: false,
            reader_errors: 0,
            next_reader_init: 0,
        }
    }

    async fn step(&mut self) {
        let actions = self.controller.poll(now_ms());
        self.apply(actions);

        let open = self.contact.is_high();
        let actions = self.controller.contact_changed(open, now_ms());
        self.apply(actions);

        if !self.reader_ready {
            self.init_reader().await;
            return;
        }

        match self.reader.read_passive_target().await {
            Ok(Some(uid)) => {
                self.reader_errors = 0;
                if self.controller.card_presented(&uid, now_ms()) {
                    info!("Card {} presented", uid);
                    if !server::send(self.requests, ServerRequest::Validate(uid)) {
                        self.decided(Decision::Unavailable);
                    }
                }
            }
            Ok(None) => {
                self.reader_errors = 0;
                self.controller.field_empty();
            }
            Err(e) => {
                warn!("Reading NFC tag failed: {:?}", e);
                self.controller.field_empty();
                self.reader_errors += 1;
                if self.reader_errors >= NFC_MAX_CONSECUTIVE_ERRORS {
                    self.reader_ready = false;
                }
            }
        }
    }

    /// (Re)configure the reader, at most once per retry delay so the relock
    /// and contact checks keep running without it
    async fn init_reader(&mut self) {
        let now = now_ms();
        if now < self.next_reader_init {
            return;
        }
        match self.reader.init().await {
            Ok(()) => {
                self.reader_ready = true;
                self.reader_errors = 0;
            }
            Err(e) => {
                error!(
                    "PN532 not responding: {:?}. Retrying in {} ms...",
                    e, NFC_INIT_RETRY_DELAY_MS
                );
                self.next_reader_init = now_ms() + NFC_INIT_RETRY_DELAY_MS;
            }
        }
    }

    fn decided(&mut self, decision: Decision) {
        let actions = self.controller.access_decided(decision, now_ms());
        self.apply(actions);
    }

    fn apply(&mut self, actions: Actions) {
        for action in actions {
            match action {
                Action::Unlock => {
                    info!("Unlocking door");
                    self.relay.set_high();
                    indicator::send(self.indicator, IndicatorCommand::Unlocked(true));
                }
                Action::Lock => {
                    info!("Locking door");
                    self.relay.set_low();
                    indicator::send(self.indicator, IndicatorCommand::Unlocked(false));
                }
                Action::Signal(cue) => indicator::send(self.indicator, IndicatorCommand::Play(cue)),
                Action::ReportTamper(kind) => {
                    warn!("Door opened without authorisation");
                    server::send(self.requests, ServerRequest::ReportTamper(kind));
                }
            }
        }
    }
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

#[embassy_executor::task]
pub async fn door_task(mut door: Door) {
    let actions = door.controller.startup();
    door.apply(actions);

    loop {
        door.step().await;
        // a decision cuts the pause short
        let tick = Timer::after(Duration::from_millis(DOOR_LOOP_INTERVAL_MS));
        if let Either::Second(decision) = select(tick, door.decisions.receive()).await {
            door.decided(decision);
        }
    }
}
