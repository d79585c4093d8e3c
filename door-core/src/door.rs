//! Door state machine.
//!
//! The controller owns no hardware and no clock: the firmware feeds it card
//! reads, server decisions, contact sensor edges and the current time in
//! milliseconds, and applies the [`Action`]s it returns. The lock fails
//! secure: only an explicit grant from the server opens it.

use heapless::Vec;

use crate::access::TamperKind;
use crate::config::Timings;
use crate::feedback::Cue;
use crate::pn532::TagUid;

/// Opening the door this soon after the relay released is still counted as
/// the authorised opening (latch and contact do not switch at the same time)
pub const RELOCK_GRACE_MS: u64 = 500;

/// Server verdict for a presented card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied,
    /// No usable answer (network down, timeout, bad reply)
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Energise the relay and light the green LED
    Unlock,
    /// Release the relay
    Lock,
    Signal(Cue),
    ReportTamper(TamperKind),
}

pub type Actions = Vec<Action, 4>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockState {
    Locked,
    Unlocked { until: u64 },
}

#[derive(Debug)]
pub struct DoorController {
    unlock_ms: u64,
    read_delay_ms: u64,
    lock: LockState,
    last_read: Option<u64>,
    /// Card still in the field since its last read
    present: Option<TagUid>,
    pending: bool,
    door_open: bool,
    relocked_at: Option<u64>,
    tamper_raised: bool,
}

impl DoorController {
    pub fn new(timing: &Timings, door_open: bool) -> Self {
        Self {
            unlock_ms: timing.door_unlock_ms.into(),
            read_delay_ms: timing.card_read_delay_ms.into(),
            lock: LockState::Locked,
            last_read: None,
            present: None,
            pending: false,
            door_open,
            relocked_at: None,
            tamper_raised: false,
        }
    }

    /// Actions that put the outputs in a known state at boot
    pub fn startup(&self) -> Actions {
        actions(&[Action::Lock, Action::Signal(Cue::Startup)])
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.lock, LockState::Unlocked { .. })
    }

    pub fn door_open(&self) -> bool {
        self.door_open
    }

    /// A card was seen. Returns true when it has to be validated with the
    /// server; the caller must then report the outcome with
    /// [`access_decided`](Self::access_decided).
    pub fn card_presented(&mut self, uid: &TagUid, now: u64) -> bool {
        if self.pending || self.present.as_ref() == Some(uid) {
            return false;
        }
        if let Some(last) = self.last_read {
            if now.saturating_sub(last) < self.read_delay_ms {
                return false;
            }
        }
        self.last_read = Some(now);
        self.present = Some(uid.clone());
        self.pending = true;
        true
    }

    /// The reader found no card, the next card (even the same one) is new
    pub fn field_empty(&mut self) {
        self.present = None;
    }

    pub fn access_decided(&mut self, decision: Decision, now: u64) -> Actions {
        self.pending = false;
        match decision {
            Decision::Granted => {
                let was_locked = !self.is_unlocked();
                self.lock = LockState::Unlocked {
                    until: now + self.unlock_ms,
                };
                if was_locked {
                    actions(&[Action::Unlock, Action::Signal(Cue::Granted)])
                } else {
                    actions(&[Action::Signal(Cue::Granted)])
                }
            }
            Decision::Denied => actions(&[Action::Signal(Cue::Denied)]),
            Decision::Unavailable => actions(&[Action::Signal(Cue::Error)]),
        }
    }

    /// Relock once the unlock window has elapsed
    pub fn poll(&mut self, now: u64) -> Actions {
        match self.lock {
            LockState::Unlocked { until } if now >= until => {
                self.lock = LockState::Locked;
                self.relocked_at = Some(now);
                actions(&[Action::Lock])
            }
            _ => Actions::new(),
        }
    }

    /// Feed the contact sensor level; only edges do anything
    pub fn contact_changed(&mut self, open: bool, now: u64) -> Actions {
        if open == self.door_open {
            return Actions::new();
        }
        self.door_open = open;

        if !open {
            self.tamper_raised = false;
            return Actions::new();
        }

        let in_grace = self
            .relocked_at
            .is_some_and(|at| now.saturating_sub(at) < RELOCK_GRACE_MS);
        if self.is_unlocked() || in_grace || self.tamper_raised {
            return Actions::new();
        }

        self.tamper_raised = true;
        actions(&[
            Action::ReportTamper(TamperKind::DoorForced),
            Action::Signal(Cue::Tamper),
        ])
    }
}

fn actions(list: &[Action]) -> Actions {
    // callers never pass more than the capacity
    Vec::from_slice(list).unwrap_or_default()
}
