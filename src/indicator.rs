use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use embassy_time::{Duration, Timer};
use esp_hal::gpio::Output;

use door_core::feedback::{Cue, Led};

use crate::constants::INDICATOR_QUEUE_DEPTH;

#[derive(Debug, Clone, Copy)]
pub enum IndicatorCommand {
    Play(Cue),
    /// Steady green LED while the door is unlocked
    Unlocked(bool),
}

pub type IndicatorChannel = Channel<NoopRawMutex, IndicatorCommand, INDICATOR_QUEUE_DEPTH>;

/// Queue a command without waiting; a full queue drops it
pub fn send(channel: &IndicatorChannel, command: IndicatorCommand) {
    if channel.try_send(command).is_err() {
        log::warn!("Indicator queue full, dropping {:?}", command);
    }
}

/// LEDs and buzzer
pub struct Indicator {
    green: Output<'static>,
    red: Output<'static>,
    buzzer: Output<'static>,
    unlocked: bool,
}

impl Indicator {
    pub fn new(green: Output<'static>, red: Output<'static>, buzzer: Output<'static>) -> Self {
        let mut indicator = Self {
            green,
            red,
            buzzer,
            unlocked: false,
        };
        indicator.idle();
        indicator
    }

    fn idle(&mut self) {
        self.buzzer.set_low();
        self.red.set_low();
        if self.unlocked {
            self.green.set_high();
        } else {
            self.green.set_low();
        }
    }

    async fn play(&mut self, cue: Cue) {
        log::debug!("Playing {:?}", cue);
        for step in cue.pattern() {
            self.led(cue.led()).set_high();
            self.buzzer.set_high();
            Timer::after(Duration::from_millis(step.on_ms.into())).await;

            self.led(cue.led()).set_low();
            self.buzzer.set_low();
            if step.off_ms > 0 {
                Timer::after(Duration::from_millis(step.off_ms.into())).await;
            }
        }
        self.idle();
    }

    fn led(&mut self, led: Led) -> &mut Output<'static> {
        match led {
            Led::Green => &mut self.green,
            Led::Red => &mut self.red,
        }
    }
}

#[embassy_executor::task]
pub async fn indicator_task(channel: &'static IndicatorChannel, mut indicator: Indicator) {
    loop {
        match channel.receive().await {
            IndicatorCommand::Play(cue) => indicator.play(cue).await,
            IndicatorCommand::Unlocked(unlocked) => {
                indicator.unlocked = unlocked;
                indicator.idle();
            }
        }
    }
}
