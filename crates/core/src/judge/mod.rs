use crate::Symbol;

/// Result of judging a keypress, or of a beat that aged out unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Hit,
    Wrong,
    Miss,
    /// Nothing was owed for the active beat; the press has no effect.
    Ignored,
}

/// Judges keypresses against the active symbol.
///
/// Only the first press while a beat is armed counts; afterwards the beat is
/// settled until the sequencer arms a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputJudge {
    active: Symbol,
    armed: bool,
}

impl InputJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the symbol now at the judgment point.
    pub fn set_active(&mut self, symbol: Symbol, armed: bool) {
        self.active = symbol;
        self.armed = armed;
    }

    pub fn judge(&mut self, key: char) -> Judgment {
        if !self.armed {
            return Judgment::Ignored;
        }
        self.armed = false;
        if Symbol::from_glyph(key) == Some(self.active) {
            Judgment::Hit
        } else {
            Judgment::Wrong
        }
    }

    /// Settles an unanswered beat. Returns `Miss` at most once per beat.
    pub fn expire(&mut self) -> Judgment {
        if std::mem::take(&mut self.armed) {
            Judgment::Miss
        } else {
            Judgment::Ignored
        }
    }

    pub fn active(&self) -> Symbol {
        self.active
    }

    /// Whether a miss will be charged if no key arrives before the next tick.
    pub fn miss_pending(&self) -> bool {
        self.armed
    }
}
