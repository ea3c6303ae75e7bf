mod terminal;

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use rhythm_core::{AppConfig, Engine, EngineEvent, Phase, SongCatalog};
use tracing_subscriber::EnvFilter;

use crate::terminal::{Lights, Terminal};

fn main() -> rhythm_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    let catalog = match &cli.songs {
        Some(path) => SongCatalog::from_path(path)?,
        None => SongCatalog::builtin()?,
    };

    match cli.command {
        Commands::List => {
            for (index, title) in catalog.titles().enumerate() {
                println!("{index}: {title}");
            }
            Ok(())
        }
        Commands::Play { song } => run_play(config, &catalog, song),
        Commands::Autoplay { song, miss_every } => run_autoplay(config, &catalog, song, miss_every),
    }
}

fn run_play(config: AppConfig, catalog: &SongCatalog, index: usize) -> rhythm_core::Result<()> {
    let song = catalog.get(index)?;
    tracing::info!(title = song.title(), "starting live play");

    let wait = Duration::from_millis(config.clock.interrupt_interval_ms * 4);
    let mut engine = Engine::new(config, Terminal::drivers())?;
    terminal::spawn_keyboard(engine.handle())?;
    engine.start_clock(Box::new(Lights))?;
    engine.start(song)?;

    let outcome = engine.run_until_finished(wait)?;
    finish(&mut engine, outcome)?;
    engine.stop_clock()
}

/// Plays a song without a clock thread or keyboard, pressing the right key on
/// every armed beat except each `miss_every`-th one.
fn run_autoplay(
    config: AppConfig,
    catalog: &SongCatalog,
    index: usize,
    miss_every: Option<usize>,
) -> rhythm_core::Result<()> {
    let song = catalog.get(index)?;
    tracing::info!(title = song.title(), ?miss_every, "starting autoplay");

    let mut engine = Engine::new(config, Terminal::drivers())?;
    let handle = engine.handle();
    engine.start(song)?;

    let mut seq = 0;
    let mut beats = 0;
    while engine.phase().wants_ticks() {
        seq += 1;
        handle.send(EngineEvent::Tick(seq))?;
        engine.poll();

        let state = engine.session().state();
        if !state.miss_pending() {
            continue;
        }
        let key = state.active_symbol().glyph();
        beats += 1;
        if miss_every.is_some_and(|n| n > 0 && beats % n == 0) {
            continue;
        }
        handle.press(key)?;
        engine.poll();
    }

    let outcome = engine.phase();
    finish(&mut engine, outcome)
}

fn finish(engine: &mut Engine, outcome: Phase) -> rhythm_core::Result<()> {
    let state = engine.session().state();
    tracing::info!(
        ?outcome,
        score = state.score(),
        lives = state.displayed_lives(),
        dropped_ticks = engine.session().dropped_ticks(),
        "session finished"
    );
    println!("Final score: {}", state.score());
    engine.reset();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Keypress rhythm game", long_about = None)]
struct Cli {
    /// JSON engine configuration; defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// JSON song list replacing the built-in catalog.
    #[arg(short, long, global = true)]
    songs: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the song catalog.
    List,
    /// Play a song, reading keypresses from stdin.
    Play {
        /// Catalog index of the song.
        song: usize,
    },
    /// Play a song headlessly with a perfect (or deliberately sloppy) player.
    Autoplay {
        /// Catalog index of the song.
        song: usize,
        /// Skip every n-th beat that needs a keypress.
        #[arg(long)]
        miss_every: Option<usize>,
    },
}
