use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Sender, TrySendError};

use crate::{ClockConfig, ClockOutputs, EngineEvent, Result, RhythmError};

/// Position requested from the auxiliary cue actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Fired half way through a tick period.
    Extend,
    /// Fired on the tick boundary.
    Retract,
}

/// Interrupt-driven heartbeat. Counts interrupts and reports a tick every
/// `period` of them; it knows nothing about gameplay.
#[derive(Debug, Clone)]
pub struct GameClock {
    period: u16,
    cue_threshold: u16,
    ticks: u16,
    pattern: u16,
    port: u16,
}

impl GameClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            period: config.period,
            cue_threshold: config.cue_threshold,
            ticks: 0,
            pattern: 1,
            port: 0,
        }
    }

    /// Handles one interrupt. Returns `true` on a tick boundary.
    pub fn on_interrupt(&mut self, outputs: &mut dyn ClockOutputs) -> bool {
        self.ticks += 1;
        if self.ticks == self.cue_threshold {
            outputs.cue(Cue::Extend);
        }
        if self.ticks < self.period {
            return false;
        }

        self.pattern = self.pattern * 2 % 257;
        self.port ^= self.pattern;
        outputs.indicator(self.port);
        outputs.cue(Cue::Retract);
        self.ticks = 0;
        true
    }

    /// Interrupts seen since the last tick boundary.
    pub fn ticks(&self) -> u16 {
        self.ticks
    }

    pub fn pattern(&self) -> u16 {
        self.pattern
    }
}

/// Flags shared between the clock task and the engine loop.
#[derive(Debug, Default)]
pub struct ClockControl {
    running: AtomicBool,
    gameplay: AtomicBool,
}

impl ClockControl {
    /// Whether tick boundaries are forwarded to the engine.
    pub fn set_gameplay(&self, enabled: bool) {
        self.gameplay.store(enabled, Ordering::Release);
    }

    pub fn gameplay(&self) -> bool {
        self.gameplay.load(Ordering::Acquire)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Background thread standing in for the periodic timer interrupt.
#[derive(Debug)]
pub struct ClockTask {
    control: Arc<ClockControl>,
    handle: Option<JoinHandle<()>>,
}

impl ClockTask {
    pub fn spawn(
        config: &ClockConfig,
        control: Arc<ClockControl>,
        events: Sender<EngineEvent>,
        mut outputs: Box<dyn ClockOutputs>,
    ) -> Result<Self> {
        let interval = Duration::from_millis(config.interrupt_interval_ms);
        let mut clock = GameClock::new(config);
        control.running.store(true, Ordering::Release);
        let shared = control.clone();

        let handle = thread::Builder::new()
            .name("game-clock".into())
            .spawn(move || {
                let mut seq: u64 = 0;
                while shared.is_running() {
                    thread::sleep(interval);
                    if !clock.on_interrupt(outputs.as_mut()) || !shared.gameplay() {
                        continue;
                    }
                    seq += 1;
                    match events.try_send(EngineEvent::Tick(seq)) {
                        Ok(()) => {}
                        // The engine notices the gap in sequence numbers.
                        Err(TrySendError::Full(_)) => tracing::trace!(seq, "event queue full"),
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
                tracing::debug!("game clock stopped");
            })?;

        Ok(Self {
            control,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) -> Result<()> {
        self.control.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| RhythmError::msg("game clock thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for ClockTask {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
