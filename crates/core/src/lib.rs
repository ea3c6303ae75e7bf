//! Core library for the rhythm game engine.
//!
//! A session scrolls a song's beatmap through a fixed-width display window,
//! one symbol per clock tick, while a note player walks the melody on its own
//! countdown. Keypresses are judged against the symbol at the judgment point.
//! The clock and the input source run on their own threads and talk to the
//! single-threaded [`Engine`] loop through a bounded channel; all gameplay
//! state is owned by the [`Session`] the loop drives.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod judge;
pub mod player;
pub mod sequencer;
pub mod session;
pub mod song;

pub use catalog::SongCatalog;
pub use clock::{ClockControl, ClockTask, Cue, GameClock};
pub use config::{AppConfig, ClockConfig, SessionConfig};
pub use drivers::{
    AudioDriver, ClockOutputs, DisplayDriver, Drivers, ScoreDisplay, Silent, Status,
    StatusChannel,
};
pub use engine::{Engine, EngineEvent, EngineHandle};
pub use error::{Result, RhythmError};
pub use judge::{InputJudge, Judgment};
pub use player::{NotePlayer, NoteStep};
pub use sequencer::{BeatmapSequencer, DisplayWindow, Scroll};
pub use session::{Phase, Session, SessionState};
pub use song::{Pitch, Song, Symbol};
