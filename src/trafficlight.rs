pub mod beeper;
pub mod timing;

use derive_more::Display;
use enum_ordinalize::Ordinalize;

use crate::error::DriverFault;
use crate::io::{Clock, Light, Lights, Tone};
use beeper::Beeper;
use timing::{Millis, Timing};

#[derive(Ordinalize, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TrafficState {
    #[display("RED (STOP)")]
    Red,
    #[display("YELLOW (READY)")]
    RedToGreen,
    #[display("GREEN (GO - Safe to Cross)")]
    Green,
    #[display("YELLOW (CAUTION)")]
    GreenToRed,
}

impl TrafficState {
    /// The state that follows this one; the cycle never branches.
    pub const fn next(self) -> Self {
        match self {
            TrafficState::Red => TrafficState::RedToGreen,
            TrafficState::RedToGreen => TrafficState::Green,
            TrafficState::Green => TrafficState::GreenToRed,
            TrafficState::GreenToRed => TrafficState::Red,
        }
    }

    pub const fn light(self) -> Light {
        match self {
            TrafficState::Red => Light::Red,
            TrafficState::RedToGreen | TrafficState::GreenToRed => Light::Yellow,
            TrafficState::Green => Light::Green,
        }
    }
}

/// Something worth reporting on the diagnostic channel. The controller works
/// the same whether or not anybody reads these.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    #[display("[{at}] State Transition: {from} -> {to}")]
    Transition {
        from: TrafficState,
        to: TrafficState,
        at: Millis,
    },
    #[display("[{at}] Beep: Safe to cross")]
    BeepStarted { at: Millis },
    #[display("[{at}] Beep off")]
    BeepStopped { at: Millis },
    #[display("[{at}] Unknown state: {raw}, resetting to RED")]
    AnomalyReset { raw: u8, at: Millis },
}

// A poll produces at most a beep event followed by a transition.
pub const MAX_EVENTS_PER_POLL: usize = 4;
pub type Events = heapless::Vec<Event, MAX_EVENTS_PER_POLL>;

fn record(events: &mut Events, event: Event) {
    // Capacity covers every poll; a dropped diagnostic is harmless anyway.
    let _ = events.push(event);
}

/*
 * Everything the controller remembers between polls. The state is kept as its
 * raw ordinal, so a value that does not decode to a `TrafficState` is caught
 * and handled by `poll()` rather than being assumed impossible.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Context {
    state: u8,
    state_entered_at: Millis,
    beeper: Beeper,
    fault: Option<DriverFault>,
}

impl Context {
    fn new(now: Millis) -> Self {
        Context {
            state: TrafficState::Red.ordinal(),
            state_entered_at: now,
            beeper: Beeper::default(),
            fault: None,
        }
    }

    pub fn current_state(&self) -> Option<TrafficState> {
        TrafficState::from_ordinal(self.state)
    }

    pub fn state_entered_at(&self) -> Millis {
        self.state_entered_at
    }

    pub fn last_beep_at(&self) -> Option<Millis> {
        self.beeper.last_beep_at()
    }

    pub fn beep_active(&self) -> bool {
        self.beeper.is_active()
    }

    /// The fault that latched the controller into fail-safe, if any.
    pub fn fault(&self) -> Option<DriverFault> {
        self.fault
    }
}

pub struct Controller<L, T> {
    timing: Timing,
    lights: L,
    tone: T,
}

impl<L: Lights, T: Tone> Controller<L, T> {
    pub fn new(timing: Timing, lights: L, tone: T) -> Self {
        Controller {
            timing,
            lights,
            tone,
        }
    }

    pub fn lights(&self) -> &L {
        &self.lights
    }

    pub fn tone(&self) -> &T {
        &self.tone
    }

    /// Show red with the buzzer silent, and start timing the first red phase.
    pub fn start(&mut self, clock: &impl Clock) -> Result<Context, DriverFault> {
        let now = clock.now();
        self.tone.tone_off().map_err(|_| DriverFault::Tone)?;
        self.lights
            .set_light(TrafficState::Red.light())
            .map_err(|_| DriverFault::Lights)?;
        Ok(Context::new(now))
    }

    /*
     * Advance the state machine. Call this repeatedly; the cadence does not
     * matter for correctness because every decision is based on elapsed time.
     * The clock is read exactly once per call.
     *
     * A driver fault latches the controller: outputs are forced to solid red
     * with the buzzer off, and every later call returns the same fault
     * without touching anything.
     */
    pub fn poll(&mut self, ctx: &mut Context, clock: &impl Clock) -> Result<Events, DriverFault> {
        if let Some(fault) = ctx.fault {
            return Err(fault);
        }

        let now = clock.now();
        let mut events = Events::new();
        match self.step(ctx, now, &mut events) {
            Ok(()) => Ok(events),
            Err(fault) => {
                self.fail_safe(ctx, fault);
                Err(fault)
            }
        }
    }

    fn step(
        &mut self,
        ctx: &mut Context,
        now: Millis,
        events: &mut Events,
    ) -> Result<(), DriverFault> {
        let Some(state) = ctx.current_state() else {
            record(
                events,
                Event::AnomalyReset {
                    raw: ctx.state,
                    at: now,
                },
            );
            return self.transition_to(ctx, TrafficState::Red, now);
        };

        let next = match state {
            TrafficState::Red => self.handle_red(ctx, now),
            TrafficState::RedToGreen => self.handle_red_to_green(ctx, now),
            TrafficState::Green => self.handle_green(ctx, now, events)?,
            TrafficState::GreenToRed => self.handle_green_to_red(ctx, now),
        };

        if let Some(next) = next {
            self.transition_to(ctx, next, now)?;
            record(
                events,
                Event::Transition {
                    from: state,
                    to: next,
                    at: now,
                },
            );
        }
        Ok(())
    }

    fn dwell_over(&self, ctx: &Context, state: TrafficState, now: Millis) -> bool {
        now.elapsed_since(ctx.state_entered_at) >= self.timing.dwell(state)
    }

    fn handle_red(&self, ctx: &Context, now: Millis) -> Option<TrafficState> {
        self.dwell_over(ctx, TrafficState::Red, now)
            .then_some(TrafficState::Red.next())
    }

    fn handle_red_to_green(&self, ctx: &Context, now: Millis) -> Option<TrafficState> {
        self.dwell_over(ctx, TrafficState::RedToGreen, now)
            .then_some(TrafficState::RedToGreen.next())
    }

    // An expired green goes straight to the transition, which silences the
    // buzzer; no new beep is started on the way out.
    fn handle_green(
        &mut self,
        ctx: &mut Context,
        now: Millis,
        events: &mut Events,
    ) -> Result<Option<TrafficState>, DriverFault> {
        if self.dwell_over(ctx, TrafficState::Green, now) {
            return Ok(Some(TrafficState::Green.next()));
        }
        ctx.beeper.run(&mut self.tone, &self.timing, now, events)?;
        Ok(None)
    }

    fn handle_green_to_red(&self, ctx: &Context, now: Millis) -> Option<TrafficState> {
        self.dwell_over(ctx, TrafficState::GreenToRed, now)
            .then_some(TrafficState::GreenToRed.next())
    }

    /*
     * The only place the state changes. The order matters: the buzzer is
     * silenced before anything else, and the lights are set last so that by
     * the time this returns the outputs show the new state.
     */
    fn transition_to(
        &mut self,
        ctx: &mut Context,
        next: TrafficState,
        now: Millis,
    ) -> Result<(), DriverFault> {
        ctx.beeper.silence(&mut self.tone)?;
        ctx.state = next.ordinal();
        ctx.state_entered_at = now;
        ctx.beeper.reset();
        self.lights
            .set_light(next.light())
            .map_err(|_| DriverFault::Lights)
    }

    // Best effort only: the driver that just failed may well fail again.
    fn fail_safe(&mut self, ctx: &mut Context, fault: DriverFault) {
        let _ = ctx.beeper.silence(&mut self.tone);
        ctx.beeper.reset();
        let _ = self.lights.set_light(Light::Red);
        ctx.fault = Some(fault);
    }
}
