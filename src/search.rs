//! Depth-limited minimax search with alpha-beta pruning.
//!
//! This module implements:
//! - [`alpha_beta`], the pruned recursive driver
//! - [`minimax`], the same recursion without pruning (reference for tests)
//! - [`Searcher`], the root driver: every root move is scored with a full
//!   window, and a move is picked uniformly at random among those tied for
//!   the maximum score
//!
//! Scores are always from the root player's point of view. The search walks a
//! private copy of the position with do/undo; a child subtree is fully explored
//! and undone before the next sibling starts.

use std::fmt;

use tracing::{debug, trace};

use crate::constants::{DEFAULT_DEPTH, DEFAULT_FLYING_BONUS, INFINITY, LOSS_SCORE, WIN_SCORE};
use crate::eval::evaluate;
use crate::movegen::generate_moves;
use crate::position::{Move, Phase, Player, Position};

// =============================================================================
// Configuration and errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Depth must be at least one ply.
    InvalidDepth(u32),
    /// The given player has already lost; there is nothing to search.
    GameOver(Player),
    /// The side to move has no legal move although it has not lost.
    NoLegalMoves(Player),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::InvalidDepth(d) => write!(f, "invalid search depth {d}, must be >= 1"),
            SearchError::GameOver(p) => write!(f, "game is over, {p} has lost"),
            SearchError::NoLegalMoves(p) => {
                write!(f, "invariant violated: {p} has no legal moves at the root")
            }
        }
    }
}

impl std::error::Error for SearchError {}

/// Search depth settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies searched, the root move included.
    pub depth: u32,
    /// Extra plies while the side to move is flying.
    pub flying_bonus: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            flying_bonus: DEFAULT_FLYING_BONUS,
        }
    }
}

impl SearchConfig {
    pub fn new(depth: u32, flying_bonus: u32) -> Result<Self, SearchError> {
        if depth == 0 {
            return Err(SearchError::InvalidDepth(depth));
        }
        Ok(Self {
            depth,
            flying_bonus,
        })
    }

    /// Depth to search for a side in `phase`.
    pub fn depth_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Flying => self.depth + self.flying_bonus,
            Phase::Placing | Phase::Moving => self.depth,
        }
    }
}

// =============================================================================
// Recursion
// =============================================================================

#[inline]
fn outcome(winner: Player, root: Player) -> i32 {
    if winner == root { WIN_SCORE } else { LOSS_SCORE }
}

/// Score of a node whose result is already decided, checked opponent first.
#[inline]
fn decided(pos: &Position, mover: Player, root: Player) -> Option<i32> {
    if pos.is_game_over(mover.opponent()) {
        Some(outcome(mover, root))
    } else if pos.is_game_over(mover) {
        Some(outcome(mover.opponent(), root))
    } else {
        None
    }
}

/// Alpha-beta value of `pos` with `mover` to play, `depth` plies left.
///
/// Nodes where `mover == root` maximize; the others minimize. Siblings are
/// cut off as soon as `beta <= alpha`. `nodes` counts visited nodes.
pub fn alpha_beta(
    pos: &mut Position,
    mover: Player,
    root: Player,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
    nodes: &mut u64,
) -> i32 {
    *nodes += 1;
    if depth == 0 {
        return evaluate(pos, root);
    }
    if let Some(score) = decided(pos, mover, root) {
        return score;
    }

    let mut moves = Vec::new();
    generate_moves(pos, mover, &mut moves);
    if moves.is_empty() {
        // Blocked: the side to move loses.
        return outcome(mover.opponent(), root);
    }

    let maximizing = mover == root;
    let mut best = if maximizing { -INFINITY } else { INFINITY };
    for mv in &moves {
        pos.do_move(mv);
        let score = alpha_beta(pos, mover.opponent(), root, depth - 1, alpha, beta, nodes);
        pos.undo_move(mv);

        if maximizing {
            best = best.max(score);
            alpha = alpha.max(score);
        } else {
            best = best.min(score);
            beta = beta.min(score);
        }
        if beta <= alpha {
            break;
        }
    }
    best
}

/// Plain minimax value, same terminal rules as [`alpha_beta`] but no pruning.
pub fn minimax(pos: &mut Position, mover: Player, root: Player, depth: u32) -> i32 {
    if depth == 0 {
        return evaluate(pos, root);
    }
    if let Some(score) = decided(pos, mover, root) {
        return score;
    }

    let mut moves = Vec::new();
    generate_moves(pos, mover, &mut moves);
    if moves.is_empty() {
        return outcome(mover.opponent(), root);
    }

    let scores = moves.iter().map(|mv| {
        pos.do_move(mv);
        let score = minimax(pos, mover.opponent(), root, depth - 1);
        pos.undo_move(mv);
        score
    });
    let best = if mover == root {
        scores.max()
    } else {
        scores.min()
    };
    best.unwrap_or(outcome(mover.opponent(), root))
}

// =============================================================================
// Root driver
// =============================================================================

/// Outcome of a root search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best: Move,
    pub score: i32,
    /// Nodes visited below the root.
    pub nodes: u64,
    /// Root moves sharing the best score.
    pub tied: usize,
    /// Root moves considered.
    pub candidates: usize,
}

/// Root move selection with a random tie-break.
pub struct Searcher {
    rng: fastrand::Rng,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Searcher {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Searcher whose tie-break is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Score every legal root move of `player` at `depth` plies.
    pub fn root_scores(
        &self,
        pos: &Position,
        player: Player,
        depth: u32,
        nodes: &mut u64,
    ) -> Result<Vec<(Move, i32)>, SearchError> {
        if depth == 0 {
            return Err(SearchError::InvalidDepth(depth));
        }
        for p in [player, player.opponent()] {
            if pos.is_game_over(p) {
                return Err(SearchError::GameOver(p));
            }
        }

        let mut sim = *pos;
        let mut moves = Vec::new();
        generate_moves(&mut sim, player, &mut moves);
        if moves.is_empty() {
            return Err(SearchError::NoLegalMoves(player));
        }

        let scored = moves
            .into_iter()
            .map(|mv| {
                sim.do_move(&mv);
                let score = alpha_beta(
                    &mut sim,
                    player.opponent(),
                    player,
                    depth - 1,
                    -INFINITY,
                    INFINITY,
                    nodes,
                );
                sim.undo_move(&mv);
                trace!(%mv, score, "root move");
                (mv, score)
            })
            .collect();
        Ok(scored)
    }

    /// Best move for `player`, chosen uniformly among the top-scoring root moves.
    pub fn best_move(
        &mut self,
        pos: &Position,
        player: Player,
        depth: u32,
    ) -> Result<SearchResult, SearchError> {
        let mut nodes = 0;
        let scored = self.root_scores(pos, player, depth, &mut nodes)?;
        let candidates = scored.len();

        let top = scored
            .iter()
            .map(|&(_, s)| s)
            .max()
            .ok_or(SearchError::NoLegalMoves(player))?;
        let tied: Vec<Move> = scored
            .into_iter()
            .filter(|&(_, s)| s == top)
            .map(|(mv, _)| mv)
            .collect();
        let best = tied[self.rng.usize(..tied.len())];

        debug!(
            player = player.id(),
            depth,
            nodes,
            score = top,
            tied = tied.len(),
            candidates,
            %best,
            "search finished"
        );
        Ok(SearchResult {
            best,
            score: top,
            nodes,
            tied: tied.len(),
            candidates,
        })
    }
}
