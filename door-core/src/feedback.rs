/// One buzzer/LED pulse: on for `on_ms`, then off for `off_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub on_ms: u16,
    pub off_ms: u16,
}

const fn step(on_ms: u16, off_ms: u16) -> Step {
    Step { on_ms, off_ms }
}

const STARTUP: [Step; 2] = [step(50, 50), step(50, 0)];
const GRANTED: [Step; 1] = [step(200, 0)];
const DENIED: [Step; 3] = [step(100, 100), step(100, 100), step(100, 0)];
const ERROR: [Step; 2] = [step(500, 200), step(500, 0)];
const TAMPER: [Step; 3] = [step(1000, 250), step(1000, 250), step(1000, 0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Green,
    Red,
}

/// Outcome signalled to the person at the door
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Startup,
    Granted,
    Denied,
    /// Server unreachable or answered garbage
    Error,
    Tamper,
}

impl Cue {
    pub fn pattern(self) -> &'static [Step] {
        match self {
            Self::Startup => &STARTUP,
            Self::Granted => &GRANTED,
            Self::Denied => &DENIED,
            Self::Error => &ERROR,
            Self::Tamper => &TAMPER,
        }
    }

    /// LED flashed together with the buzzer
    pub fn led(self) -> Led {
        match self {
            Self::Startup | Self::Granted => Led::Green,
            Self::Denied | Self::Error | Self::Tamper => Led::Red,
        }
    }

    pub fn duration_ms(self) -> u32 {
        self.pattern()
            .iter()
            .map(|s| u32::from(s.on_ms) + u32::from(s.off_ms))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_end_silent_and_stay_short() {
        for cue in [Cue::Startup, Cue::Granted, Cue::Denied, Cue::Error, Cue::Tamper] {
            let pattern = cue.pattern();
            assert!(!pattern.is_empty());
            assert_eq!(pattern.last().map(|s| s.off_ms), Some(0));
            assert!(cue.duration_ms() <= 4000, "{cue:?} too long");
        }
    }

    #[test]
    fn denial_is_distinct_from_grant() {
        assert_eq!(Cue::Granted.led(), Led::Green);
        assert_eq!(Cue::Denied.led(), Led::Red);
        assert_eq!(Cue::Denied.pattern().len(), 3);
        assert_eq!(Cue::Granted.duration_ms(), 200);
        assert_eq!(Cue::Tamper.duration_ms(), 3500);
    }
}
