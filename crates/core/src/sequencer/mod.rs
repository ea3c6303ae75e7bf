use std::{collections::VecDeque, fmt};

use crate::{Song, Symbol};

/// Fixed-width run of upcoming beats. Index 0 is the judgment point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayWindow {
    slots: VecDeque<Symbol>,
}

impl DisplayWindow {
    pub fn new(width: usize) -> Self {
        Self {
            slots: std::iter::repeat(Symbol::BLANK).take(width).collect(),
        }
    }

    /// Drops the beat at the judgment point and appends `incoming` at the tail.
    pub fn scroll(&mut self, incoming: Symbol) {
        self.slots.pop_front();
        self.slots.push_back(incoming);
    }

    /// Refills every slot with blanks.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Symbol::BLANK);
    }

    pub fn active(&self) -> Symbol {
        self.slots.front().copied().unwrap_or(Symbol::BLANK)
    }

    pub fn width(&self) -> usize {
        self.slots.len()
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.slots.iter().copied()
    }
}

impl fmt::Display for DisplayWindow {
    /// Renders as `|a|b c d ...`, the judgment point boxed on the left.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut symbols = self.symbols();
        let head = symbols.next().unwrap_or(Symbol::BLANK);
        write!(f, "|{head}|")?;
        for (i, symbol) in symbols.enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

/// Outcome of one sequencer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// Lead-in scroll; nothing is judged.
    Preroll(Symbol),
    /// Scoring scroll with the new active symbol.
    Beat(Symbol),
}

impl Scroll {
    pub fn active(self) -> Symbol {
        match self {
            Scroll::Preroll(symbol) | Scroll::Beat(symbol) => symbol,
        }
    }

    /// Whether the player now owes a keypress for the active symbol.
    pub fn arms_miss(self) -> bool {
        matches!(self, Scroll::Beat(symbol) if !symbol.is_blank())
    }
}

/// Feeds the beatmap into the display window, one symbol per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatmapSequencer {
    cursor: usize,
    preroll_remaining: u32,
}

impl BeatmapSequencer {
    pub fn new(preroll_ticks: u32) -> Self {
        Self {
            cursor: 0,
            preroll_remaining: preroll_ticks,
        }
    }

    pub fn in_preroll(&self) -> bool {
        self.preroll_remaining > 0
    }

    /// Index of the next beatmap symbol to consume.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn exhausted(&self, song: &Song) -> bool {
        self.cursor >= song.beatmap().len()
    }

    /// Scrolls the window by one beat. Once the beatmap runs out, blanks are
    /// pushed and the cursor stays put.
    pub fn advance(&mut self, song: &Song, window: &mut DisplayWindow) -> Scroll {
        let incoming = match song.beatmap().get(self.cursor) {
            Some(&symbol) => {
                self.cursor += 1;
                symbol
            }
            None => Symbol::BLANK,
        };
        window.scroll(incoming);

        if self.preroll_remaining > 0 {
            self.preroll_remaining -= 1;
            Scroll::Preroll(window.active())
        } else {
            Scroll::Beat(window.active())
        }
    }
}
