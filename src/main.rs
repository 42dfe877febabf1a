//! Morris-Rust: a Nine Men's Morris engine.
//!
//! ## Usage
//!
//! - `morris-rust` - Play against the engine on the terminal
//! - `morris-rust play --human-first` - Same, moving first
//! - `morris-rust protocol` - Start the text protocol server
//! - `morris-rust selfplay --games 10` - Engine against itself

use std::io;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use morris_rust::agent::{Agent, Engine, Human, play_match};
use morris_rust::constants::{DEFAULT_DEPTH, DEFAULT_FLYING_BONUS};
use morris_rust::game::{Game, GameStatus};
use morris_rust::position::Player;
use morris_rust::protocol::ProtocolServer;
use morris_rust::search::{SearchConfig, Searcher};

/// Morris-Rust: a Nine Men's Morris alpha-beta engine
#[derive(Parser)]
#[command(name = "morris-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: LevelFilter,

    /// Search depth in plies, the engine's own move included
    #[arg(short, long, default_value_t = DEFAULT_DEPTH, global = true)]
    depth: u32,

    /// Extra plies searched while the engine is flying
    #[arg(long, default_value_t = DEFAULT_FLYING_BONUS, global = true)]
    flying_bonus: u32,

    /// Seed for the engine's tie-break between equally scored moves
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the engine on the terminal
    Play {
        /// Take player one and move first
        #[arg(long)]
        human_first: bool,
    },
    /// Start the text protocol server on stdin/stdout
    Protocol,
    /// Let the engine play against itself
    Selfplay {
        /// Number of games to play
        #[arg(short, long, default_value_t = 1)]
        games: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialize_logging(cli.log_level);

    let config = SearchConfig::new(cli.depth, cli.flying_bonus)?;
    let searcher = |offset: u64| match cli.seed {
        Some(seed) => Searcher::with_seed(seed.wrapping_add(offset)),
        None => Searcher::new(),
    };

    match cli.command {
        Some(Commands::Protocol) => {
            let mut server = ProtocolServer::with_parts(Game::default(), searcher(0), config);
            server.run_stdio().context("protocol I/O failed")?;
        }
        Some(Commands::Selfplay { games }) => {
            run_selfplay(games, config, searcher)?;
        }
        Some(Commands::Play { human_first }) => {
            run_play(human_first, config, searcher(0))?;
        }
        None => {
            run_play(false, config, searcher(0))?;
        }
    }
    Ok(())
}

fn run_play(human_first: bool, config: SearchConfig, searcher: Searcher) -> anyhow::Result<()> {
    println!("Morris-Rust: Nine Men's Morris\n");
    println!("Moves: d6 (place), a1-a4 (slide or fly), d6xg7 (with capture), ? lists moves\n");

    let mut game = Game::default();
    let mut human = Human::new("You", io::stdin().lock(), io::stdout());
    let mut engine = Engine::new("Engine", searcher, config);
    println!("{}", game.position());

    let agents: [&mut dyn Agent; 2] = if human_first {
        [&mut human, &mut engine]
    } else {
        [&mut engine, &mut human]
    };
    let status = play_match(&mut game, agents, |game, mv| {
        println!("{} played {mv}\n", mv.player);
        println!("{}", game.position());
    })?;

    match status {
        GameStatus::Won(player) => println!("{player} wins after {} plies", game.ply()),
        GameStatus::Draw => println!("Draw after {} plies", game.ply()),
        GameStatus::InProgress => {}
    }
    Ok(())
}

fn run_selfplay(
    games: u32,
    config: SearchConfig,
    searcher: impl Fn(u64) -> Searcher,
) -> anyhow::Result<()> {
    let mut wins = [0u32; 2];
    let mut draws = 0u32;

    for index in 0..games {
        let base = u64::from(index) * 2;
        let mut one = Engine::new("one", searcher(base), config);
        let mut two = Engine::new("two", searcher(base + 1), config);
        let mut game = Game::default();

        let status = play_match(&mut game, [&mut one, &mut two], |_, _| {})
            .with_context(|| format!("self-play game {} failed", index + 1))?;
        let result = match status {
            GameStatus::Won(player) => {
                wins[usize::from(player == Player::Two)] += 1;
                format!("{player} wins")
            }
            GameStatus::Draw | GameStatus::InProgress => {
                draws += 1;
                "draw".to_string()
            }
        };
        info!(game = index + 1, plies = game.ply(), %result, "self-play game finished");
        println!("Game {}: {result} after {} plies", index + 1, game.ply());
    }

    println!(
        "\nPlayer 1: {} wins, Player 2: {} wins, {} draws",
        wins[0], wins[1], draws
    );
    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(io::stderr),
        )
        .with(filter)
        .init();
}
