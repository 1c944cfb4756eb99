/*
 * The pedestrian cue: while the light is green, the buzzer beeps briefly at a
 * fixed interval so that people who cannot see the light know it is safe to
 * cross. The beep keeps its own time reference, independent of how long the
 * light has been green.
 */

use super::timing::{Millis, Timing};
use super::{Event, Events, record};
use crate::error::DriverFault;
use crate::io::Tone;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Beeper {
    last_beep_at: Option<Millis>,
    active: bool,
}

impl Beeper {
    pub fn last_beep_at(&self) -> Option<Millis> {
        self.last_beep_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /*
     * Called on every poll while green. Starting and stopping a beep are
     * keyed off the same timestamp and can never both fire in one call,
     * because a beep that starts now has not lasted `beep_duration` yet.
     */
    pub(crate) fn run<T: Tone>(
        &mut self,
        tone: &mut T,
        timing: &Timing,
        now: Millis,
        events: &mut Events,
    ) -> Result<(), DriverFault> {
        let due = match self.last_beep_at {
            None => true,
            Some(started) => now.elapsed_since(started) >= timing.beep_interval(),
        };
        if due {
            tone.tone_on().map_err(|_| DriverFault::Tone)?;
            self.last_beep_at = Some(now);
            self.active = true;
            record(events, Event::BeepStarted { at: now });
        }

        match self.last_beep_at {
            Some(started)
                if self.active && now.elapsed_since(started) >= timing.beep_duration() =>
            {
                tone.tone_off().map_err(|_| DriverFault::Tone)?;
                self.active = false;
                record(events, Event::BeepStopped { at: now });
            }
            _ => {}
        }

        Ok(())
    }

    /// Stop any beep in progress.
    pub(crate) fn silence<T: Tone>(&mut self, tone: &mut T) -> Result<(), DriverFault> {
        self.active = false;
        tone.tone_off().map_err(|_| DriverFault::Tone)
    }

    /// Forget the last beep, so the next green phase beeps straight away.
    pub(crate) fn reset(&mut self) {
        self.last_beep_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trafficlight::timing::TIMING;

    #[derive(Default)]
    struct FakeTone {
        sounding: bool,
        fail: bool,
    }

    impl Tone for FakeTone {
        type Error = ();

        fn tone_on(&mut self) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.sounding = true;
            Ok(())
        }

        fn tone_off(&mut self) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.sounding = false;
            Ok(())
        }
    }

    fn run_at(beeper: &mut Beeper, tone: &mut FakeTone, now: u32) -> Events {
        let mut events = Events::new();
        beeper.run(tone, &TIMING, Millis(now), &mut events).unwrap();
        events
    }

    #[test]
    fn test_first_beep_starts_immediately_even_at_time_zero() {
        let mut beeper = Beeper::default();
        let mut tone = FakeTone::default();

        let events = run_at(&mut beeper, &mut tone, 0);
        assert_eq!(events.as_slice(), &[Event::BeepStarted { at: Millis(0) }]);
        assert!(tone.sounding);
        assert!(beeper.is_active());
        assert_eq!(beeper.last_beep_at(), Some(Millis(0)));

        // A beep that started at zero must not be mistaken for "never beeped".
        let events = run_at(&mut beeper, &mut tone, 10);
        assert!(events.is_empty());
        assert_eq!(beeper.last_beep_at(), Some(Millis(0)));
    }

    #[test]
    fn test_beep_stops_after_its_duration() {
        let mut beeper = Beeper::default();
        let mut tone = FakeTone::default();

        run_at(&mut beeper, &mut tone, 100);
        assert!(run_at(&mut beeper, &mut tone, 290).is_empty());
        assert!(tone.sounding);

        let events = run_at(&mut beeper, &mut tone, 300);
        assert_eq!(events.as_slice(), &[Event::BeepStopped { at: Millis(300) }]);
        assert!(!tone.sounding);
        assert!(!beeper.is_active());
    }

    #[test]
    fn test_next_beep_after_interval() {
        let mut beeper = Beeper::default();
        let mut tone = FakeTone::default();

        run_at(&mut beeper, &mut tone, 100);
        run_at(&mut beeper, &mut tone, 300);
        assert!(run_at(&mut beeper, &mut tone, 1090).is_empty());

        let events = run_at(&mut beeper, &mut tone, 1100);
        assert_eq!(events.as_slice(), &[Event::BeepStarted { at: Millis(1100) }]);
        assert!(tone.sounding);
    }

    #[test]
    fn test_late_poll_restarts_beep() {
        let mut beeper = Beeper::default();
        let mut tone = FakeTone::default();

        run_at(&mut beeper, &mut tone, 0);
        // Poll stalled past both the beep duration and the interval.
        let events = run_at(&mut beeper, &mut tone, 1500);
        assert_eq!(events.as_slice(), &[Event::BeepStarted { at: Millis(1500) }]);
        assert!(tone.sounding);
    }

    #[test]
    fn test_silence_and_reset() {
        let mut beeper = Beeper::default();
        let mut tone = FakeTone::default();

        run_at(&mut beeper, &mut tone, 50);
        beeper.silence(&mut tone).unwrap();
        beeper.reset();
        assert!(!tone.sounding);
        assert_eq!(beeper, Beeper::default());
    }

    #[test]
    fn test_tone_failure_is_a_driver_fault() {
        let mut beeper = Beeper::default();
        let mut tone = FakeTone {
            fail: true,
            ..FakeTone::default()
        };
        let mut events = Events::new();

        assert_eq!(
            beeper.run(&mut tone, &TIMING, Millis(0), &mut events),
            Err(DriverFault::Tone)
        );
        assert!(!beeper.is_active());
    }
}
