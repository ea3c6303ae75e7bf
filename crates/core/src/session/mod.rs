use std::{fmt, sync::Arc};

use crate::{
    BeatmapSequencer, DisplayWindow, Drivers, InputJudge, Judgment, NotePlayer, NoteStep, Result,
    RhythmError, Scroll, SessionConfig, Song, Status, Symbol,
};

/// Phases of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Countdown,
    Playing,
    SongCleared,
    GameOver,
    Reset,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Menu => "in the menu",
            Phase::Countdown => "counting down",
            Phase::Playing => "playing",
            Phase::SongCleared => "the song is cleared",
            Phase::GameOver => "the game is over",
            Phase::Reset => "resetting",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::SongCleared | Phase::GameOver)
    }

    /// Whether clock ticks drive anything in this phase.
    pub fn wants_ticks(self) -> bool {
        matches!(self, Phase::Countdown | Phase::Playing)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-session gameplay state. Rebuilt from scratch at every session start
/// and on reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    lives: i32,
    score: u32,
    sequencer: BeatmapSequencer,
    player: NotePlayer,
    judge: InputJudge,
}

impl SessionState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            lives: config.max_lives,
            score: 0,
            sequencer: BeatmapSequencer::new(config.preroll_ticks),
            player: NotePlayer::new(),
            judge: InputJudge::new(),
        }
    }

    /// Raw lives counter; may dip below zero for the tick that ends the game.
    pub fn lives(&self) -> i32 {
        self.lives
    }

    /// Lives as shown to the player, never negative.
    pub fn displayed_lives(&self) -> u32 {
        self.lives.max(0).unsigned_abs()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn active_symbol(&self) -> Symbol {
        self.judge.active()
    }

    pub fn miss_pending(&self) -> bool {
        self.judge.miss_pending()
    }

    pub fn beatmap_cursor(&self) -> usize {
        self.sequencer.cursor()
    }

    pub fn note_cursor(&self) -> usize {
        self.player.note_cursor()
    }

    pub fn duration_cursor(&self) -> usize {
        self.player.duration_cursor()
    }

    pub fn sound_countdown(&self) -> u16 {
        self.player.sound_countdown()
    }

    pub fn in_preroll(&self) -> bool {
        self.sequencer.in_preroll()
    }
}

/// Exactly-once bookkeeping for clock ticks.
#[derive(Debug, Default, Clone, Copy)]
struct TickLedger {
    last: u64,
    dropped: u64,
}

impl TickLedger {
    /// Returns `false` for a tick that was already processed.
    fn observe(&mut self, seq: u64) -> bool {
        if seq <= self.last {
            return false;
        }
        let gap = seq - self.last - 1;
        if gap > 0 {
            self.dropped += gap;
            tracing::warn!(seq, gap, total = self.dropped, "missed clock ticks");
        }
        self.last = seq;
        true
    }
}

/// The gameplay state machine. Owns all mutable game state; clock ticks and
/// keypresses are applied to it from a single thread.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    drivers: Drivers,
    phase: Phase,
    song: Option<Arc<Song>>,
    state: SessionState,
    window: DisplayWindow,
    countdown: u32,
    ticks: TickLedger,
}

impl Session {
    pub fn new(config: SessionConfig, drivers: Drivers) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: SessionState::new(&config),
            window: DisplayWindow::new(config.window_width),
            config,
            drivers,
            phase: Phase::Menu,
            song: None,
            countdown: 0,
            ticks: TickLedger::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn window(&self) -> &DisplayWindow {
        &self.window
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Clock ticks that never reached the session.
    pub fn dropped_ticks(&self) -> u64 {
        self.ticks.dropped
    }

    /// Confirms a song selection and begins the countdown.
    pub fn start(&mut self, song: Arc<Song>) -> Result<()> {
        if self.phase != Phase::Menu {
            return Err(RhythmError::InvalidTransition {
                action: "start a song",
                phase: self.phase.name(),
            });
        }
        tracing::info!(title = song.title(), notes = song.len(), "song selected");

        self.state = SessionState::new(&self.config);
        self.window = DisplayWindow::new(self.config.window_width);
        self.countdown = self.config.countdown_ticks;
        self.drivers
            .status
            .notify(Status::SongSelected(song.title().to_string()));
        self.song = Some(song);
        self.show_panel();

        self.phase = Phase::Countdown;
        if self.countdown == 0 {
            self.begin_play();
        }
        Ok(())
    }

    /// Applies one clock tick. Repeated sequence numbers are ignored.
    pub fn on_tick(&mut self, seq: u64) -> Phase {
        if !self.ticks.observe(seq) {
            tracing::debug!(seq, "duplicate tick ignored");
            return self.phase;
        }
        match self.phase {
            Phase::Countdown => self.countdown_tick(),
            Phase::Playing => self.play_tick(),
            _ => {}
        }
        self.phase
    }

    /// Judges a keypress against the beat at the judgment point.
    pub fn on_key(&mut self, key: char) -> Judgment {
        if self.phase != Phase::Playing {
            return Judgment::Ignored;
        }
        let judgment = self.state.judge.judge(key);
        match judgment {
            Judgment::Hit => self.state.score += self.config.hit_score,
            Judgment::Wrong => self.state.lives -= 1,
            Judgment::Miss | Judgment::Ignored => return judgment,
        }
        tracing::debug!(?judgment, key = %key, score = self.state.score, lives = self.state.lives, "key judged");
        self.drivers.scoreboard.judged(judgment);
        if self.state.lives <= 0 {
            self.game_over();
        }
        judgment
    }

    /// Ends the current session, whatever its phase, and returns to the menu.
    pub fn reset(&mut self) {
        if self.phase == Phase::Menu {
            return;
        }
        tracing::info!(from = %self.phase, "resetting session");
        self.phase = Phase::Reset;
        self.drivers.audio.stop_tone();
        self.window.clear();
        self.state = SessionState::new(&self.config);
        self.song = None;
        self.countdown = 0;
        self.drivers.status.notify(Status::ReturningToMenu);
        self.phase = Phase::Menu;
    }

    fn countdown_tick(&mut self) {
        if self.countdown > 0 {
            self.drivers.status.notify(Status::Countdown(self.countdown));
            self.countdown -= 1;
        } else {
            self.begin_play();
        }
    }

    fn begin_play(&mut self) {
        self.drivers.status.notify(Status::Start);
        self.drivers.display.redraw(&self.window);
        self.phase = Phase::Playing;
        tracing::info!("playing");
    }

    fn play_tick(&mut self) {
        let Some(song) = self.song.clone() else {
            return;
        };

        if self.state.judge.expire() == Judgment::Miss {
            self.state.lives -= 1;
            self.drivers.scoreboard.judged(Judgment::Miss);
            tracing::debug!(lives = self.state.lives, "missed beat");
        }
        if self.state.lives <= 0 {
            self.game_over();
            return;
        }

        let scroll = self.state.sequencer.advance(&song, &mut self.window);
        self.drivers.display.redraw(&self.window);
        self.state.judge.set_active(scroll.active(), scroll.arms_miss());

        if let Scroll::Beat(_) = scroll {
            match self.state.player.tick(&song) {
                NoteStep::Play(pitch) => self.drivers.audio.start_tone(pitch),
                NoteStep::Finished => self.drivers.audio.stop_tone(),
                NoteStep::Sustain => {}
            }
        }
        self.show_panel();

        if self.state.player.is_complete(&song) {
            self.song_cleared();
        }
    }

    fn game_over(&mut self) {
        tracing::info!(score = self.state.score, "game over");
        self.drivers.audio.stop_tone();
        self.show_panel();
        self.drivers.status.notify(Status::GameOver);
        self.phase = Phase::GameOver;
    }

    fn song_cleared(&mut self) {
        tracing::info!(
            score = self.state.score,
            lives = self.state.lives,
            "song cleared"
        );
        self.drivers.audio.stop_tone();
        self.drivers.status.notify(Status::SongCleared);
        self.phase = Phase::SongCleared;
    }

    fn show_panel(&mut self) {
        self.drivers
            .scoreboard
            .show(self.state.score, self.state.displayed_lives());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::recording::Recorder;
    use crate::Pitch;

    fn sym(glyph: char) -> Symbol {
        Symbol::from_glyph(glyph).unwrap()
    }

    fn song(beats: &str, durations: Vec<u16>) -> Arc<Song> {
        let pitches = vec![Pitch::C5; durations.len()];
        let beatmap = beats.chars().map(sym).collect();
        Arc::new(Song::new("test", pitches, durations, beatmap).unwrap())
    }

    fn config(lives: i32, window: usize, preroll: u32) -> SessionConfig {
        SessionConfig {
            max_lives: lives,
            preroll_ticks: preroll,
            window_width: window,
            hit_score: 10,
            countdown_ticks: 0,
        }
    }

    struct Harness {
        session: Session,
        recorder: Recorder,
        seq: u64,
    }

    impl Harness {
        fn new(config: SessionConfig, song: Arc<Song>) -> Self {
            let recorder = Recorder::default();
            let mut session = Session::new(config, recorder.drivers()).unwrap();
            session.start(song).unwrap();
            Self {
                session,
                recorder,
                seq: 0,
            }
        }

        fn tick(&mut self) -> Phase {
            self.seq += 1;
            self.session.on_tick(self.seq)
        }
    }

    /// One note, `[blank, f]`, window of two with a one-tick lead-in.
    fn single_note() -> Harness {
        Harness::new(config(10, 2, 1), song("_f", vec![4]))
    }

    #[test]
    fn correct_press_scores_and_song_clears() {
        let mut h = single_note();
        assert_eq!(h.session.phase(), Phase::Playing);

        h.tick();
        h.tick();
        assert!(!h.session.state().miss_pending());
        h.tick();
        assert_eq!(h.session.state().active_symbol(), sym('f'));
        assert!(h.session.state().miss_pending());

        assert_eq!(h.session.on_key('f'), Judgment::Hit);
        assert_eq!(h.session.state().score(), 10);

        let phases: Vec<Phase> = (0..3).map(|_| h.tick()).collect();
        assert_eq!(phases, [Phase::Playing, Phase::Playing, Phase::SongCleared]);
        assert_eq!(h.session.state().lives(), 10);
        assert_eq!(h.session.state().note_cursor(), 3);

        let log = h.recorder.log();
        assert_eq!(log.tones, vec![Some(Pitch::C5), None, None]);
        assert_eq!(log.statuses.last(), Some(&Status::SongCleared));
    }

    #[test]
    fn unanswered_beat_costs_one_life_and_song_still_clears() {
        let mut h = single_note();
        for _ in 0..3 {
            h.tick();
        }
        h.tick();
        assert_eq!(h.session.state().lives(), 9);

        h.tick();
        assert_eq!(h.tick(), Phase::SongCleared);
        assert_eq!(h.session.state().lives(), 9);
        assert_eq!(h.recorder.log().judgments, vec![Judgment::Miss]);
    }

    #[test]
    fn last_life_lost_ends_before_the_next_beat() {
        let mut h = Harness::new(config(1, 1, 0), song("ff", vec![1]));
        h.tick();
        assert!(h.session.state().miss_pending());

        assert_eq!(h.tick(), Phase::GameOver);
        assert_eq!(h.session.state().lives(), 0);
        assert_eq!(h.session.state().beatmap_cursor(), 1);

        h.tick();
        assert_eq!(h.session.state().beatmap_cursor(), 1);
        assert_eq!(h.session.phase(), Phase::GameOver);
    }

    #[test]
    fn wrong_key_on_last_life_is_immediate_game_over() {
        let mut h = Harness::new(config(1, 1, 0), song("ff", vec![3]));
        h.tick();
        assert_eq!(h.session.on_key('n'), Judgment::Wrong);
        assert_eq!(h.session.phase(), Phase::GameOver);
        assert_eq!(h.session.state().displayed_lives(), 0);
        assert_eq!(h.session.on_key('f'), Judgment::Ignored);
    }

    #[test]
    fn game_over_wins_over_song_cleared_on_the_same_tick() {
        // The only note ends on tick 2, the same tick the miss is charged.
        let mut h = Harness::new(config(1, 1, 0), song("ff", vec![1]));
        h.tick();
        assert_eq!(h.tick(), Phase::GameOver);

        let log = h.recorder.log();
        assert!(log.statuses.contains(&Status::GameOver));
        assert!(!log.statuses.contains(&Status::SongCleared));
    }

    #[test]
    fn blank_beats_never_change_lives() {
        let mut h = Harness::new(config(3, 1, 0), song("____", vec![2, 2]));
        for _ in 0..4 {
            h.tick();
            for key in ['_', 'f', 'x'] {
                assert_eq!(h.session.on_key(key), Judgment::Ignored);
            }
        }
        assert_eq!(h.session.state().lives(), 3);
        assert_eq!(h.session.state().score(), 0);
    }

    #[test]
    fn score_only_rises_in_hit_sized_steps() {
        let mut h = Harness::new(config(10, 1, 0), song("fjvn_f", vec![6]));
        let mut last = 0;
        for key in ['f', 'f', 'v', 'x', 'j', 'f'] {
            h.tick();
            h.session.on_key(key);
            let score = h.session.state().score();
            assert!(score == last || score == last + 10);
            last = score;
        }
        assert_eq!(last, 30);
        assert_eq!(h.session.state().lives(), 8);
    }

    #[test]
    fn repeated_tick_is_applied_once() {
        let mut h = Harness::new(config(5, 2, 0), song("fjvn", vec![1, 1]));
        h.session.on_tick(1);
        h.session.on_tick(1);
        assert_eq!(h.session.state().beatmap_cursor(), 1);
        assert_eq!(h.session.dropped_ticks(), 0);

        h.session.on_tick(4);
        assert_eq!(h.session.state().beatmap_cursor(), 2);
        assert_eq!(h.session.dropped_ticks(), 2);
    }

    #[test]
    fn countdown_announces_before_play() {
        let config = SessionConfig {
            countdown_ticks: 3,
            ..config(10, 2, 1)
        };
        let mut h = Harness::new(config, song("_f", vec![4]));
        assert_eq!(h.session.phase(), Phase::Countdown);

        for _ in 0..3 {
            assert_eq!(h.tick(), Phase::Countdown);
        }
        assert_eq!(h.tick(), Phase::Playing);
        assert_eq!(h.session.state().beatmap_cursor(), 0);

        let log = h.recorder.log();
        assert_eq!(
            log.statuses,
            vec![
                Status::SongSelected("test".into()),
                Status::Countdown(3),
                Status::Countdown(2),
                Status::Countdown(1),
                Status::Start,
            ]
        );
    }

    #[test]
    fn reset_restores_session_start_values() {
        // Ten lives clear the song, one life runs out on the first miss.
        for (lives, outcome) in [(10, Phase::SongCleared), (1, Phase::GameOver)] {
            let config = config(lives, 3, 1);
            let mut h = Harness::new(config.clone(), song("_ff_", vec![5]));
            while !h.session.phase().is_terminal() {
                h.tick();
            }
            assert_eq!(h.session.phase(), outcome);

            h.session.reset();
            assert_eq!(h.session.phase(), Phase::Menu);
            assert_eq!(h.session.state(), &SessionState::new(&config));
            assert_eq!(h.session.window(), &DisplayWindow::new(3));
            assert_eq!(h.recorder.log().tones.last(), Some(&None));
            assert_eq!(
                h.recorder.log().statuses.last(),
                Some(&Status::ReturningToMenu)
            );

            h.session.start(song("_f", vec![1])).unwrap();
            assert_eq!(h.session.phase(), Phase::Playing);
        }
    }

    #[test]
    fn zero_width_window_is_rejected() {
        let err = Session::new(config(3, 0, 0), Drivers::silent()).unwrap_err();
        assert!(matches!(err, RhythmError::Config(_)));
    }

    #[test]
    fn cannot_start_twice() {
        let mut h = single_note();
        let err = h.session.start(song("_f", vec![1])).unwrap_err();
        assert!(matches!(err, RhythmError::InvalidTransition { .. }));
    }
}
