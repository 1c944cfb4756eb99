/*
 * All timing of the traffic light lives here: the dwell time of each state,
 * the pedestrian beep rhythm and how often the controller gets polled.
 *
 * Time is a free-running millisecond counter that is allowed to wrap. All
 * comparisons go through `Millis::elapsed_since`, never through tick counts,
 * so the controller behaves the same whatever the poll cadence is.
 */

use derive_more::Display;

use super::TrafficState;
use crate::error::ConfigError;

/// Milliseconds since an arbitrary epoch fixed at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[display("{_0} ms")]
pub struct Millis(pub u32);

impl Millis {
    /// Time passed since `earlier`, correct across a wrap of the counter.
    pub const fn elapsed_since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

/// Dwell time for each state, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateDurations {
    pub red: u32,
    pub red_to_green: u32,
    pub green: u32,
    pub green_to_red: u32,
}

impl StateDurations {
    pub const fn of(&self, state: TrafficState) -> u32 {
        match state {
            TrafficState::Red => self.red,
            TrafficState::RedToGreen => self.red_to_green,
            TrafficState::Green => self.green,
            TrafficState::GreenToRed => self.green_to_red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    dwell: StateDurations,
    beep_interval: u32,
    beep_duration: u32,
    poll_interval: u32,
}

impl Timing {
    /*
     * Validation happens here and only here, so a `Timing` value that exists
     * is always safe to run with. Being a `const fn`, it also lets the
     * built-in timing below be checked by the compiler.
     */
    pub const fn new(
        dwell: StateDurations,
        beep_interval: u32,
        beep_duration: u32,
        poll_interval: u32,
    ) -> Result<Self, ConfigError> {
        let states = [
            TrafficState::Red,
            TrafficState::RedToGreen,
            TrafficState::Green,
            TrafficState::GreenToRed,
        ];
        let mut i = 0;
        while i < states.len() {
            if dwell.of(states[i]) == 0 {
                return Err(ConfigError::ZeroDwell(states[i]));
            }
            i += 1;
        }

        if beep_duration == 0 {
            return Err(ConfigError::ZeroBeepDuration);
        }
        if beep_duration >= beep_interval {
            return Err(ConfigError::BeepNotShorterThanInterval {
                duration: beep_duration,
                interval: beep_interval,
            });
        }
        if poll_interval == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if poll_interval > beep_duration {
            return Err(ConfigError::PollSlowerThanBeep {
                poll: poll_interval,
                beep: beep_duration,
            });
        }

        Ok(Timing {
            dwell,
            beep_interval,
            beep_duration,
            poll_interval,
        })
    }

    pub const fn dwell(&self, state: TrafficState) -> u32 {
        self.dwell.of(state)
    }

    pub const fn beep_interval(&self) -> u32 {
        self.beep_interval
    }

    pub const fn beep_duration(&self) -> u32 {
        self.beep_duration
    }

    pub const fn poll_interval(&self) -> u32 {
        self.poll_interval
    }
}

/// Pitch of the pedestrian cue.
pub const TONE_FREQUENCY_HZ: u32 = 800;

pub const TIMING: Timing = match Timing::new(
    StateDurations {
        red: 5000,
        red_to_green: 2000,
        green: 5000,
        green_to_red: 2000,
    },
    1000,
    200,
    10,
) {
    Ok(timing) => timing,
    Err(_) => panic!("built-in traffic light timing is invalid"),
};
