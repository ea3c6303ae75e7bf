use std::{path::Path, sync::Arc};

use crate::{Result, RhythmError, Song};

const AOZORA: &[i32] = &[
    36,
    // pitches
    717, 760, 853, 957, 1138, 1074, 957, 957, 853, 760,
    717, 957, 717, 760, 717, 1277, 1138, 1074, 957, 1138,
    1074, 957, 853, 760, 639, 717, 1138, 1074, 957, 639,
    1138, 1074, 957, 853, 717, 639,
    // durations
    3, 3, 2, 4, 2, 1, 2, 2, 2, 2,
    8, 2, 2, 1, 2, 1, 9, 3, 3, 2,
    4, 1, 1, 2, 2, 4, 2, 3, 3, 1,
    1, 2, 2, 1, 1, 7,
    // beatmap
    1, 0, 0, 2, 0, 0, 3, 0, 4, 0,
    0, 0, 4, 0, 1, 3, 0, 2, 0, 1,
    0, 2, 0, 3, 4, 3, 4, 3, 4, 3,
    4, 1, 0, 1, 0, 2, 4, 0, 2, 1,
    0, 0, 0, 0, 0, 0, 0, 0, 3, 0,
    0, 4, 0, 0, 1, 0, 3, 0, 2, 0,
    0, 0, 1, 1, 3, 0, 3, 0, 4, 0,
    0, 0, 1, 0, 3, 1, 3, 4, 2, 4,
    1, 2, 3, 0, 4, 0, 3, 4, 1, 0,
    0, 0, 0, 0, 0, -1,
];

const ODE_TO_JOY: &[i32] = &[
    30,
    // pitches
    1138, 1138, 1074, 957, 957, 1074, 1138, 1277, 1434, 1434,
    1277, 1138, 1138, 1277, 1277, 1138, 1138, 1074, 957, 957,
    1074, 1138, 1277, 1434, 1434, 1277, 1138, 1277, 1434, 1434,
    // durations
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    2, 2, 3, 1, 4, 2, 2, 2, 2, 2,
    2, 2, 2, 2, 2, 2, 2, 3, 1, 4,
    // beatmap
    1, 0, 3, 0, 2, 0, 4, 0, 1, 0,
    2, 0, 3, 0, 4, 0, 3, 0, 4, 0,
    1, 0, 1, 0, 2, 0, 0, 4, 4, 0,
    0, 0, 1, 0, 2, 0, 3, 0, 4, 0,
    4, 0, 3, 0, 2, 0, 1, 0, 3, 0,
    4, 0, 3, 0, 1, 0, 1, 0, 0, 2,
    3, 0, 0, 0, -1,
];

/// Read-only list of playable songs, addressed by selection index.
#[derive(Debug, Default, Clone)]
pub struct SongCatalog {
    songs: Vec<Arc<Song>>,
}

impl SongCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two songs shipped with the game.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        catalog.register(Song::from_flat("Aozora", AOZORA)?);
        catalog.register(Song::from_flat("Ode to Joy", ODE_TO_JOY)?);
        Ok(catalog)
    }

    /// Loads a JSON array of songs. Every entry is validated on the way in.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let songs: Vec<Song> = serde_json::from_str(&text)?;
        let mut catalog = Self::new();
        for song in songs {
            catalog.register(song);
        }
        Ok(catalog)
    }

    pub fn register(&mut self, song: Song) {
        tracing::debug!(title = song.title(), notes = song.len(), "registered song");
        self.songs.push(Arc::new(song));
    }

    pub fn get(&self, index: usize) -> Result<Arc<Song>> {
        self.songs
            .get(index)
            .cloned()
            .ok_or(RhythmError::UnknownSong(index))
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.songs.iter().map(|song| song.title())
    }
}
