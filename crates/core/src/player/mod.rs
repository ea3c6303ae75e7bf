use crate::{Pitch, Song};

/// What the note player asked of the tone generator on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStep {
    /// The current note is still sounding.
    Sustain,
    Play(Pitch),
    /// The final note's duration ran out.
    Finished,
}

/// Countdown that walks the song's pitches, holding each for its duration.
///
/// Cursors are 1-based positions of the next note; the song is cleared once
/// they reach `len + 2`, i.e. one full duration after the last note started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePlayer {
    note_cursor: usize,
    duration_cursor: usize,
    sound_countdown: u16,
}

impl Default for NotePlayer {
    fn default() -> Self {
        Self {
            note_cursor: 1,
            duration_cursor: 1,
            sound_countdown: 1,
        }
    }
}

impl NotePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances one main-phase tick.
    pub fn tick(&mut self, song: &Song) -> NoteStep {
        if self.is_complete(song) {
            return NoteStep::Finished;
        }
        self.sound_countdown = self.sound_countdown.saturating_sub(1);
        if self.sound_countdown > 0 {
            return NoteStep::Sustain;
        }

        let step = match (
            song.pitches().get(self.note_cursor - 1),
            song.durations().get(self.duration_cursor - 1),
        ) {
            (Some(&pitch), Some(&duration)) => {
                self.sound_countdown = duration;
                NoteStep::Play(pitch)
            }
            _ => NoteStep::Finished,
        };
        self.note_cursor += 1;
        self.duration_cursor += 1;
        step
    }

    pub fn is_complete(&self, song: &Song) -> bool {
        self.note_cursor >= song.len() + 2
    }

    pub fn note_cursor(&self) -> usize {
        self.note_cursor
    }

    pub fn duration_cursor(&self) -> usize {
        self.duration_cursor
    }

    pub fn sound_countdown(&self) -> u16 {
        self.sound_countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;

    #[test]
    fn holds_each_note_for_its_duration() {
        let song = Song::new(
            "two",
            vec![Pitch::C5, Pitch::E5],
            vec![2, 3],
            vec![Symbol::BLANK; 4],
        )
        .unwrap();
        let mut player = NotePlayer::new();

        let steps: Vec<NoteStep> = (0..6).map(|_| player.tick(&song)).collect();
        assert_eq!(
            steps,
            vec![
                NoteStep::Play(Pitch::C5),
                NoteStep::Sustain,
                NoteStep::Play(Pitch::E5),
                NoteStep::Sustain,
                NoteStep::Sustain,
                NoteStep::Finished,
            ]
        );
        assert_eq!(player.note_cursor(), 4);
        assert!(player.is_complete(&song));
        assert_eq!(player.tick(&song), NoteStep::Finished);
        assert_eq!(player.note_cursor(), 4);
    }
}
