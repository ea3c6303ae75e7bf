use std::{sync::Arc, time::Duration};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::{
    AppConfig, ClockControl, ClockOutputs, ClockTask, Drivers, Phase, Result, RhythmError,
    Session, Song,
};

/// Messages from the clock and input producers to the engine loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Tick boundary, numbered from 1 by the clock.
    Tick(u64),
    Key(char),
    Quit,
}

/// Producer side of the event channel, handed to input sources.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    events: Sender<EngineEvent>,
}

impl EngineHandle {
    /// Posts an event without blocking. Returns `false` if the queue is full.
    pub fn send(&self, event: EngineEvent) -> Result<bool> {
        match self.events.try_send(event) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "event queue full, dropping event");
                Ok(false)
            }
            Err(TrySendError::Disconnected(_)) => Err(RhythmError::Disconnected),
        }
    }

    pub fn press(&self, key: char) -> Result<bool> {
        self.send(EngineEvent::Key(key))
    }

    pub fn quit(&self) -> Result<bool> {
        self.send(EngineEvent::Quit)
    }
}

/// Cooperative main loop: drains the event channel and applies it to the
/// session, keypresses ahead of ticks.
#[derive(Debug)]
pub struct Engine {
    session: Session,
    events: Receiver<EngineEvent>,
    sender: Sender<EngineEvent>,
    control: Arc<ClockControl>,
    clock: Option<ClockTask>,
    config: AppConfig,
    batch: Vec<EngineEvent>,
}

impl Engine {
    pub fn new(config: AppConfig, drivers: Drivers) -> Result<Self> {
        config.validate()?;
        let (sender, events) = crossbeam_channel::bounded(config.clock.queue_capacity);
        Ok(Self {
            session: Session::new(config.session.clone(), drivers)?,
            events,
            sender,
            control: Arc::new(ClockControl::default()),
            clock: None,
            batch: Vec::with_capacity(config.clock.queue_capacity),
            config,
        })
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            events: self.sender.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn clock_control(&self) -> &ClockControl {
        &self.control
    }

    /// Starts the background clock. Ticks only flow while a song is running.
    pub fn start_clock(&mut self, outputs: Box<dyn ClockOutputs>) -> Result<()> {
        if self.clock.is_some() {
            return Ok(());
        }
        let task = ClockTask::spawn(
            &self.config.clock,
            self.control.clone(),
            self.sender.clone(),
            outputs,
        )?;
        self.clock = Some(task);
        Ok(())
    }

    pub fn stop_clock(&mut self) -> Result<()> {
        match self.clock.take() {
            Some(mut task) => task.stop(),
            None => Ok(()),
        }
    }

    pub fn start(&mut self, song: Arc<Song>) -> Result<()> {
        self.session.start(song)?;
        self.sync_clock();
        Ok(())
    }

    /// Ends the session and returns to the menu.
    pub fn reset(&mut self) {
        self.session.reset();
        self.sync_clock();
    }

    /// Applies every event already queued. Never blocks.
    pub fn poll(&mut self) -> Phase {
        self.batch.extend(self.events.try_iter());
        self.apply_batch()
    }

    /// Waits up to `timeout` for at least one event, then applies everything
    /// that is queued.
    pub fn wait(&mut self, timeout: Duration) -> Result<Phase> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => self.batch.push(event),
            Err(RecvTimeoutError::Timeout) => return Ok(self.phase()),
            Err(RecvTimeoutError::Disconnected) => return Err(RhythmError::Disconnected),
        }
        Ok(self.poll())
    }

    /// Runs the loop until the session leaves play: cleared, lost or quit.
    pub fn run_until_finished(&mut self, timeout: Duration) -> Result<Phase> {
        while self.phase().wants_ticks() {
            self.wait(timeout)?;
        }
        Ok(self.phase())
    }

    fn apply_batch(&mut self) -> Phase {
        let mut batch = std::mem::take(&mut self.batch);
        // Keys that landed behind the newest tick raced its boundary; they are
        // judged against the beat that tick would replace.
        if let Some(last_tick) = batch
            .iter()
            .rposition(|event| matches!(event, EngineEvent::Tick(_)))
        {
            let racing = batch[last_tick + 1..]
                .iter()
                .take_while(|event| matches!(event, EngineEvent::Key(_)))
                .count();
            batch[last_tick..=last_tick + racing].rotate_left(1);
        }

        for event in batch.drain(..) {
            match event {
                EngineEvent::Key(key) => {
                    self.session.on_key(key);
                }
                EngineEvent::Tick(seq) => {
                    self.session.on_tick(seq);
                }
                EngineEvent::Quit => {
                    tracing::info!("quit requested");
                    self.session.reset();
                }
            }
        }
        self.batch = batch;
        self.sync_clock();
        self.phase()
    }

    fn sync_clock(&self) {
        let wanted = self.phase().wants_ticks();
        if self.control.gameplay() != wanted {
            tracing::debug!(enabled = wanted, "clock gameplay gate");
            self.control.set_gameplay(wanted);
        }
    }
}
