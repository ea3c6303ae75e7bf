//! Narrow interfaces to the collaborators around the engine: display,
//! tone generator, score panel, status text and the clock's auxiliary
//! outputs. Implementations are fire-and-forget; none of them report errors
//! back into the gameplay loop.

use std::fmt;

use crate::{Cue, DisplayWindow, Judgment, Pitch};

/// Redraws the scrolling beat window.
pub trait DisplayDriver {
    fn redraw(&mut self, window: &DisplayWindow);
}

/// Tone generator.
pub trait AudioDriver {
    fn start_tone(&mut self, pitch: Pitch);
    fn stop_tone(&mut self);
}

/// Score and lives panel, plus the hit/miss feedback lights.
pub trait ScoreDisplay {
    /// `lives` is already clamped at zero.
    fn show(&mut self, score: u32, lives: u32);

    fn judged(&mut self, _judgment: Judgment) {}
}

/// Line-oriented text channel for phase announcements.
pub trait StatusChannel {
    fn notify(&mut self, status: Status);
}

/// Outputs driven directly by the game clock. They carry no gameplay meaning.
pub trait ClockOutputs: Send {
    fn cue(&mut self, cue: Cue);
    fn indicator(&mut self, pattern: u16);
}

/// Text notifications emitted at phase transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    SongSelected(String),
    Countdown(u32),
    Start,
    SongCleared,
    GameOver,
    ReturningToMenu,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::SongSelected(title) => write!(f, "Now playing: {title}"),
            Status::Countdown(n) => write!(f, "{n}..."),
            Status::Start => f.write_str("START!"),
            Status::SongCleared => f.write_str("Song Cleared!"),
            Status::GameOver => f.write_str("Game Over!"),
            Status::ReturningToMenu => f.write_str("Returning to start menu..."),
        }
    }
}

/// The set of collaborators a session talks to.
pub struct Drivers {
    pub display: Box<dyn DisplayDriver>,
    pub audio: Box<dyn AudioDriver>,
    pub scoreboard: Box<dyn ScoreDisplay>,
    pub status: Box<dyn StatusChannel>,
}

impl Drivers {
    /// Drivers that discard everything, for headless runs.
    pub fn silent() -> Self {
        Self {
            display: Box::new(Silent),
            audio: Box::new(Silent),
            scoreboard: Box::new(Silent),
            status: Box::new(Silent),
        }
    }
}

impl fmt::Debug for Drivers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drivers").finish()
    }
}

/// Driver that ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl DisplayDriver for Silent {
    fn redraw(&mut self, _window: &DisplayWindow) {}
}

impl AudioDriver for Silent {
    fn start_tone(&mut self, _pitch: Pitch) {}
    fn stop_tone(&mut self) {}
}

impl ScoreDisplay for Silent {
    fn show(&mut self, _score: u32, _lives: u32) {}
}

impl StatusChannel for Silent {
    fn notify(&mut self, _status: Status) {}
}

impl ClockOutputs for Silent {
    fn cue(&mut self, _cue: Cue) {}
    fn indicator(&mut self, _pattern: u16) {}
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Everything the drivers were asked to do, in order.
    #[derive(Debug, Default)]
    pub struct Log {
        pub frames: Vec<String>,
        pub tones: Vec<Option<Pitch>>,
        pub panels: Vec<(u32, u32)>,
        pub judgments: Vec<Judgment>,
        pub statuses: Vec<Status>,
    }

    /// Test double that records into a shared [`Log`].
    #[derive(Debug, Clone, Default)]
    pub struct Recorder(pub Arc<Mutex<Log>>);

    impl Recorder {
        pub fn drivers(&self) -> Drivers {
            Drivers {
                display: Box::new(self.clone()),
                audio: Box::new(self.clone()),
                scoreboard: Box::new(self.clone()),
                status: Box::new(self.clone()),
            }
        }

        pub fn log(&self) -> std::sync::MutexGuard<'_, Log> {
            self.0.lock().unwrap()
        }
    }

    impl DisplayDriver for Recorder {
        fn redraw(&mut self, window: &DisplayWindow) {
            self.log().frames.push(window.to_string());
        }
    }

    impl AudioDriver for Recorder {
        fn start_tone(&mut self, pitch: Pitch) {
            self.log().tones.push(Some(pitch));
        }

        fn stop_tone(&mut self) {
            self.log().tones.push(None);
        }
    }

    impl ScoreDisplay for Recorder {
        fn show(&mut self, score: u32, lives: u32) {
            self.log().panels.push((score, lives));
        }

        fn judged(&mut self, judgment: Judgment) {
            self.log().judgments.push(judgment);
        }
    }

    impl StatusChannel for Recorder {
        fn notify(&mut self, status: Status) {
            self.log().statuses.push(status);
        }
    }
}
