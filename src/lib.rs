//! Traffic light controller for the DESPI-M02 board, with an audible cue for
//! pedestrians while the light is green.
//!
//! - `io`: the light, tone and clock capabilities, plus drivers for them on
//!   top of `embedded-hal`
//! - `trafficlight`: the polled state machine and its timing
//!
//! Nothing here touches the device directly; the firmware binary binds the
//! capabilities to the board's pins.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod error;
pub mod io;
pub mod trafficlight;

pub use error::{ConfigError, DriverFault};
pub use trafficlight::{Context, Controller, Event, TrafficState};
