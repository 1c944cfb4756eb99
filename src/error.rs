use derive_more::{Display, Error};

use crate::trafficlight::TrafficState;

/// A timing configuration that the controller refuses to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[display("dwell time of {_0} must be longer than zero")]
    ZeroDwell(#[error(not(source))] TrafficState),

    #[display("beep duration must be longer than zero")]
    ZeroBeepDuration,

    #[display("beep duration {duration} ms must be shorter than the beep interval {interval} ms")]
    BeepNotShorterThanInterval { duration: u32, interval: u32 },

    #[display("poll interval must be longer than zero")]
    ZeroPollInterval,

    #[display("poll interval {poll} ms is longer than the beep duration {beep} ms")]
    PollSlowerThanBeep { poll: u32, beep: u32 },
}

/// The output driver that rejected a request. There is no degraded mode for
/// a traffic signal, so any fault latches the controller into fail-safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverFault {
    #[display("light outputs rejected a request")]
    Lights,

    #[display("tone generator rejected a request")]
    Tone,
}
