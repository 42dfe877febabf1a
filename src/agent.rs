//! Players that can take a turn: humans typing notation, or the search engine.
//!
//! The match loop in [`play_match`] only sees the [`Agent`] trait; the one place
//! it cares which kind it has is when reporting engine statistics.

use std::io::{BufRead, Write};

use anyhow::{Context, bail};
use tracing::{debug, info};

use crate::game::{Game, GameStatus};
use crate::position::{Move, Player};
use crate::search::{SearchConfig, Searcher};

/// Something that picks moves for one side of a [`Game`].
pub trait Agent {
    fn name(&self) -> &str;

    /// True for agents that run the search.
    fn is_engine(&self) -> bool {
        false
    }

    /// Choose a legal move for the side to move.
    fn choose_move(&mut self, game: &Game) -> anyhow::Result<Move>;
}

/// A person entering moves in notation (`d6`, `a1-a4`, `d6xg7`).
pub struct Human<R, W> {
    name: String,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Human<R, W> {
    pub fn new(name: &str, input: R, output: W) -> Self {
        Self {
            name: name.to_string(),
            input,
            output,
        }
    }
}

impl<R: BufRead, W: Write> Agent for Human<R, W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, game: &Game) -> anyhow::Result<Move> {
        let player = game.to_move();
        loop {
            write!(
                self.output,
                "{} ({}, {})> ",
                self.name,
                player.symbol(),
                game.phase_of(player)
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                bail!("input closed while waiting for {}'s move", self.name);
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if text == "?" {
                let moves: Vec<String> = game
                    .legal_moves(player)
                    .iter()
                    .map(|m| m.to_string())
                    .collect();
                writeln!(self.output, "{}", moves.join(" "))?;
                continue;
            }

            let checked = game
                .parse_move(text)
                .map_err(anyhow::Error::from)
                .and_then(|mv| game.validate(&mv).map(|()| mv).map_err(Into::into));
            match checked {
                Ok(mv) => return Ok(mv),
                Err(e) => writeln!(self.output, "illegal: {e} (type ? for legal moves)")?,
            }
        }
    }
}

/// The alpha-beta engine.
pub struct Engine {
    name: String,
    searcher: Searcher,
    config: SearchConfig,
}

impl Engine {
    pub fn new(name: &str, searcher: Searcher, config: SearchConfig) -> Self {
        Self {
            name: name.to_string(),
            searcher,
            config,
        }
    }
}

impl Agent for Engine {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_engine(&self) -> bool {
        true
    }

    fn choose_move(&mut self, game: &Game) -> anyhow::Result<Move> {
        let player = game.to_move();
        let depth = self.config.depth_for(game.phase_of(player));
        let result = self
            .searcher
            .best_move(game.position(), player, depth)
            .with_context(|| format!("{} failed to find a move", self.name))?;
        debug!(
            engine = %self.name,
            score = result.score,
            nodes = result.nodes,
            "engine move"
        );
        Ok(result.best)
    }
}

/// Alternate turns between `agents[0]` (player one) and `agents[1]` until the game ends.
///
/// `on_move` is called after each applied move, e.g. to redraw the board.
pub fn play_match(
    game: &mut Game,
    agents: [&mut dyn Agent; 2],
    mut on_move: impl FnMut(&Game, &Move),
) -> anyhow::Result<GameStatus> {
    let [first, second] = agents;
    loop {
        let status = game.status();
        if status != GameStatus::InProgress {
            info!(?status, plies = game.ply(), "match finished");
            return Ok(status);
        }
        let agent = if game.to_move() == Player::One {
            &mut *first
        } else {
            &mut *second
        };
        let mv = agent.choose_move(game)?;
        game.apply_move(&mv)
            .with_context(|| format!("{} produced an illegal move {mv}", agent.name()))?;
        if agent.is_engine() {
            debug!(agent = agent.name(), %mv, "engine played");
        }
        on_move(game, &mv);
    }
}
