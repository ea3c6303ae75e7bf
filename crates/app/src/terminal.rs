//! Console stand-ins for the game's display, speaker, score panel and lights.

use std::io::{self, BufRead};

use rhythm_core::{
    AudioDriver, ClockOutputs, Cue, DisplayDriver, DisplayWindow, Drivers, EngineHandle,
    Judgment, Pitch, ScoreDisplay, Status, StatusChannel,
};

/// Prints the beat line and status text to stdout.
#[derive(Debug, Default)]
pub struct Terminal {
    last_panel: Option<(u32, u32)>,
}

impl Terminal {
    pub fn drivers() -> Drivers {
        Drivers {
            display: Box::new(Terminal::default()),
            audio: Box::new(Speaker),
            scoreboard: Box::new(Terminal::default()),
            status: Box::new(Terminal::default()),
        }
    }
}

impl DisplayDriver for Terminal {
    fn redraw(&mut self, window: &DisplayWindow) {
        println!("{window}");
    }
}

impl ScoreDisplay for Terminal {
    fn show(&mut self, score: u32, lives: u32) {
        if self.last_panel.replace((score, lives)) != Some((score, lives)) {
            println!("Score: {score:<6} Lives: {lives}");
        }
    }

    fn judged(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Hit => tracing::debug!("green"),
            Judgment::Wrong | Judgment::Miss => tracing::debug!(?judgment, "red"),
            Judgment::Ignored => {}
        }
    }
}

impl StatusChannel for Terminal {
    fn notify(&mut self, status: Status) {
        println!("{status}");
    }
}

/// Logs tone requests instead of driving a speaker.
#[derive(Debug, Default, Clone, Copy)]
pub struct Speaker;

impl AudioDriver for Speaker {
    fn start_tone(&mut self, pitch: Pitch) {
        tracing::info!(hz = pitch.hz(), period = pitch.0, "tone on");
    }

    fn stop_tone(&mut self) {
        tracing::info!("tone off");
    }
}

/// Indicator lights and cue actuator, traced at the finest level.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lights;

impl ClockOutputs for Lights {
    fn cue(&mut self, cue: Cue) {
        tracing::trace!(?cue, "cue");
    }

    fn indicator(&mut self, pattern: u16) {
        tracing::trace!(pattern = %format!("{pattern:#011b}"), "indicator");
    }
}

/// Forwards stdin to the engine: every non-space character is a keypress,
/// a line reading `q` quits the song.
pub fn spawn_keyboard(handle: EngineHandle) -> rhythm_core::Result<()> {
    std::thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let sent = if line.trim() == "q" {
                    handle.quit()
                } else {
                    line.chars()
                        .filter(|c| !c.is_whitespace())
                        .try_fold(true, |all, key| -> rhythm_core::Result<bool> {
                            Ok(handle.press(key)? && all)
                        })
                };
                if sent.is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}
