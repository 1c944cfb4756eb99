/*
 * The I/O module for the traffic light.
 *
 * The controller only ever talks to three capabilities: a set of indicator
 * lights of which exactly one is lit, a tone generator for the pedestrian
 * cue, and a monotonic millisecond clock. This module defines those
 * capabilities as traits and provides implementations on top of the
 * `embedded-hal` traits, so the state machine never sees a pin number and
 * can be tested without the device.
 */

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;
use enum_ordinalize::Ordinalize;

use crate::trafficlight::timing::Millis;

#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Light {
    Red,
    Yellow,
    Green,
}

pub trait Lights {
    type Error;

    /// Light `light` and switch off the other two, in a single call.
    fn set_light(&mut self, light: Light) -> Result<(), Self::Error>;
}

/// A fixed-frequency tone. Switching it on while sounding, or off while
/// silent, does nothing.
pub trait Tone {
    type Error;

    fn tone_on(&mut self) -> Result<(), Self::Error>;
    fn tone_off(&mut self) -> Result<(), Self::Error>;
}

pub trait Clock {
    fn now(&self) -> Millis;
}

/// Red, amber and green outputs, indexed by `Light`.
pub struct RagOutputs<P> {
    outputs: [P; Light::VARIANT_COUNT],
    active_lows: [bool; Light::VARIANT_COUNT],
}

impl<P: OutputPin> RagOutputs<P> {
    pub fn new(red: P, yellow: P, green: P) -> Self {
        Self::with_active_lows([red, yellow, green], [false; Light::VARIANT_COUNT])
    }

    // Some boards sink LED current, so a lit LED needs a low pin.
    pub fn with_active_lows(
        outputs: [P; Light::VARIANT_COUNT],
        active_lows: [bool; Light::VARIANT_COUNT],
    ) -> Self {
        RagOutputs {
            outputs,
            active_lows,
        }
    }

    fn levels(&self, light: Light) -> [PinState; Light::VARIANT_COUNT] {
        let mut levels = [PinState::Low; Light::VARIANT_COUNT];
        for (i, (level, active_low)) in levels.iter_mut().zip(self.active_lows).enumerate() {
            let on = i == light.ordinal();
            *level = PinState::from(on != active_low);
        }
        levels
    }
}

impl<P: OutputPin> Lights for RagOutputs<P> {
    type Error = P::Error;

    fn set_light(&mut self, light: Light) -> Result<(), Self::Error> {
        let levels = self.levels(light);

        // Everything else goes dark before the new light comes on, so two
        // lights are never lit together.
        for (i, (output, level)) in self.outputs.iter_mut().zip(levels).enumerate() {
            if i != light.ordinal() {
                output.set_state(level)?;
            }
        }
        for (i, (output, level)) in self.outputs.iter_mut().zip(levels).enumerate() {
            if i == light.ordinal() {
                output.set_state(level)?;
            }
        }
        Ok(())
    }
}

pub const TONE_DUTY_PERCENT: u8 = 50;

/// A buzzer on a PWM channel whose frequency was fixed when the timer was
/// set up. The tone sounds at 50% duty and is silenced by a fully-off duty.
pub struct PwmTone<C> {
    channel: C,
    sounding: bool,
}

impl<C: SetDutyCycle> PwmTone<C> {
    pub fn new(mut channel: C) -> Result<Self, C::Error> {
        channel.set_duty_cycle_fully_off()?;
        Ok(PwmTone {
            channel,
            sounding: false,
        })
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }
}

impl<C: SetDutyCycle> Tone for PwmTone<C> {
    type Error = C::Error;

    fn tone_on(&mut self) -> Result<(), Self::Error> {
        if !self.sounding {
            self.channel.set_duty_cycle_percent(TONE_DUTY_PERCENT)?;
            self.sounding = true;
        }
        Ok(())
    }

    fn tone_off(&mut self) -> Result<(), Self::Error> {
        if self.sounding {
            self.channel.set_duty_cycle_fully_off()?;
            self.sounding = false;
        }
        Ok(())
    }
}
