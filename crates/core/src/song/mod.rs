use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, RhythmError};

/// Tone generator input clock; a pitch is stored as a period in these counts.
const TONE_CLOCK_HZ: f32 = 750_000.0;

/// Glyphs drawn for each symbol index. Index 0 is the blank rest.
const GLYPHS: [char; 5] = ['_', 'f', 'j', 'v', 'n'];

/// Marks the end of the beatmap in a flat song buffer.
const SENTINEL: i32 = -1;

/// A tone, stored as the period the tone generator counts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pitch(pub u16);

impl Pitch {
    pub const C4: Pitch = Pitch(2867);
    pub const D4: Pitch = Pitch(2554);
    pub const E4: Pitch = Pitch(2276);
    pub const F4: Pitch = Pitch(2148);
    pub const G4: Pitch = Pitch(1914);
    pub const A4: Pitch = Pitch(1705);
    pub const B4: Pitch = Pitch(1519);
    pub const C5: Pitch = Pitch(1434);
    pub const D5: Pitch = Pitch(1277);
    pub const E5: Pitch = Pitch(1138);
    pub const F5: Pitch = Pitch(1074);
    pub const G5: Pitch = Pitch(957);
    pub const A5: Pitch = Pitch(853);
    pub const B5: Pitch = Pitch(760);
    pub const C6: Pitch = Pitch(717);
    pub const D6: Pitch = Pitch(639);

    /// Approximate frequency of the tone in hertz.
    pub fn hz(self) -> f32 {
        if self.0 == 0 {
            0.0
        } else {
            TONE_CLOCK_HZ / self.0 as f32
        }
    }
}

/// One beat of a beatmap: either the blank rest or a key the player must hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Symbol(u8);

impl Symbol {
    pub const BLANK: Symbol = Symbol(0);

    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < GLYPHS.len()).then_some(Self(index))
    }

    /// Maps a pressed key back to its symbol.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        GLYPHS
            .iter()
            .position(|&g| g == glyph.to_ascii_lowercase())
            .map(|index| Self(index as u8))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn glyph(self) -> char {
        GLYPHS[usize::from(self.0)]
    }

    pub fn is_blank(self) -> bool {
        self == Self::BLANK
    }

    /// Every symbol that requires a keypress.
    pub fn playable() -> impl Iterator<Item = Symbol> {
        (1..GLYPHS.len() as u8).map(Symbol)
    }
}

impl TryFrom<u8> for Symbol {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Symbol::new(value).ok_or_else(|| format!("unknown symbol index {value}"))
    }
}

impl From<Symbol> for u8 {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// Static description of one playable track.
///
/// Pitches and durations run in lockstep; the beatmap scrolls independently,
/// one symbol per tick, and must be long enough to give every note a filler
/// beat and an action beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSong")]
pub struct Song {
    title: String,
    pitches: Vec<Pitch>,
    durations: Vec<u16>,
    beatmap: Vec<Symbol>,
}

#[derive(Deserialize)]
struct RawSong {
    title: String,
    pitches: Vec<Pitch>,
    durations: Vec<u16>,
    beatmap: Vec<Symbol>,
}

impl TryFrom<RawSong> for Song {
    type Error = RhythmError;

    fn try_from(raw: RawSong) -> Result<Self> {
        Song::new(raw.title, raw.pitches, raw.durations, raw.beatmap)
    }
}

impl Song {
    pub fn new(
        title: impl Into<String>,
        pitches: Vec<Pitch>,
        durations: Vec<u16>,
        beatmap: Vec<Symbol>,
    ) -> Result<Self> {
        let song = Self {
            title: title.into(),
            pitches,
            durations,
            beatmap,
        };
        song.validate()?;
        Ok(song)
    }

    /// Decodes the firmware layout `[length, pitches.., durations.., beatmap.., -1]`.
    pub fn from_flat(title: &str, data: &[i32]) -> Result<Self> {
        let (&length, rest) = data
            .split_first()
            .ok_or_else(|| RhythmError::malformed(title, "empty buffer"))?;
        let length = usize::try_from(length)
            .map_err(|_| RhythmError::malformed(title, format!("negative length {length}")))?;
        if rest.len() < 2 * length {
            return Err(RhythmError::malformed(
                title,
                format!("buffer too short for {length} notes"),
            ));
        }
        let (pitches, rest) = rest.split_at(length);
        let (durations, rest) = rest.split_at(length);

        let end = rest
            .iter()
            .position(|&v| v == SENTINEL)
            .ok_or_else(|| RhythmError::malformed(title, "beatmap has no end marker"))?;
        if end + 1 != rest.len() {
            return Err(RhythmError::malformed(title, "data after the beatmap end marker"));
        }

        let pitches = pitches
            .iter()
            .map(|&p| {
                u16::try_from(p)
                    .map(Pitch)
                    .map_err(|_| RhythmError::malformed(title, format!("pitch {p} out of range")))
            })
            .collect::<Result<Vec<_>>>()?;
        let durations = durations
            .iter()
            .map(|&d| {
                u16::try_from(d)
                    .map_err(|_| RhythmError::malformed(title, format!("duration {d} out of range")))
            })
            .collect::<Result<Vec<_>>>()?;
        let beatmap = rest[..end]
            .iter()
            .map(|&s| {
                u8::try_from(s)
                    .ok()
                    .and_then(Symbol::new)
                    .ok_or_else(|| RhythmError::malformed(title, format!("unknown symbol {s}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(title, pitches, durations, beatmap)
    }

    fn validate(&self) -> Result<()> {
        let title = self.title.as_str();
        if self.pitches.is_empty() {
            return Err(RhythmError::malformed(title, "song has no notes"));
        }
        if self.pitches.len() != self.durations.len() {
            return Err(RhythmError::malformed(
                title,
                format!(
                    "{} pitches but {} durations",
                    self.pitches.len(),
                    self.durations.len()
                ),
            ));
        }
        if let Some(index) = self.durations.iter().position(|&d| d == 0) {
            return Err(RhythmError::malformed(
                title,
                format!("note {index} has zero duration"),
            ));
        }
        if self.beatmap.len() < 2 * self.len() {
            return Err(RhythmError::malformed(
                title,
                format!(
                    "beatmap has {} beats, {} notes need at least {}",
                    self.beatmap.len(),
                    self.len(),
                    2 * self.len()
                ),
            ));
        }
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of notes.
    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }

    pub fn durations(&self) -> &[u16] {
        &self.durations
    }

    pub fn beatmap(&self) -> &[Symbol] {
        &self.beatmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_flat_buffer() {
        let song = Song::from_flat("tiny", &[1, 1434, 4, 0, 2, -1]).unwrap();
        assert_eq!(song.len(), 1);
        assert_eq!(song.pitches(), &[Pitch::C5]);
        assert_eq!(song.durations(), &[4]);
        assert_eq!(song.beatmap(), &[Symbol::BLANK, Symbol::from_glyph('j').unwrap()]);
    }

    #[test]
    fn flat_buffer_without_sentinel_is_malformed() {
        let err = Song::from_flat("open", &[1, 1434, 4, 0, 2]).unwrap_err();
        assert!(format!("{err}").contains("end marker"));
    }

    #[test]
    fn short_beatmap_is_malformed() {
        let err = Song::new("short", vec![Pitch::C5, Pitch::D5], vec![1, 1], vec![Symbol::BLANK; 3])
            .unwrap_err();
        assert!(matches!(err, RhythmError::MalformedSong { .. }));
    }

    #[test]
    fn json_songs_are_validated() {
        let ok = r#"{"title":"t","pitches":[1434],"durations":[2],"beatmap":[0,1]}"#;
        assert!(serde_json::from_str::<Song>(ok).is_ok());

        let bad_symbol = r#"{"title":"t","pitches":[1434],"durations":[2],"beatmap":[0,9]}"#;
        assert!(serde_json::from_str::<Song>(bad_symbol).is_err());

        let zero = r#"{"title":"t","pitches":[1434],"durations":[0],"beatmap":[0,1]}"#;
        assert!(serde_json::from_str::<Song>(zero).is_err());
    }

    #[test]
    fn glyphs_round_through_symbols() {
        assert_eq!(Symbol::from_glyph('F'), Symbol::new(1));
        assert_eq!(Symbol::from_glyph('x'), None);
        assert!(Symbol::BLANK.is_blank());
        assert_eq!(Symbol::playable().count(), 4);
    }

    #[test]
    fn pitch_period_converts_to_hertz() {
        assert!((Pitch::A4.hz() - 439.9).abs() < 0.5);
    }
}
