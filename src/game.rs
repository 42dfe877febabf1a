//! Match controller: the live game, its referee and turn sequencing.
//!
//! [`Game`] owns the live [`Position`] (never shared with a search), checks every
//! incoming move against the rules before applying it, and decides when the game
//! is won or drawn. Illegal moves are reported as [`IllegalMove`] and leave the
//! game untouched.

use std::fmt;

use tracing::info;

use crate::board::{NotationError, Point, Topology, point_name};
use crate::constants::{DEFAULT_QUIET_PLY_LIMIT, NUM_POINTS};
use crate::movegen::{capture_targets, forms_mill, has_legal_move, legal_moves};
use crate::position::{Move, Phase, Player, Position};

/// Why a move was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IllegalMove {
    /// A point index outside the board.
    UnknownPoint(Point),
    GameFinished,
    NotYourTurn { expected: Player },
    NoPiecesInHand,
    WrongPhase { expected: Phase, got: Phase },
    /// A placement carries a source, or a slide/fly lacks one.
    Malformed,
    NotOwnPiece(Point),
    Occupied(Point),
    NotAdjacent { from: Point, to: Point },
    CaptureRequired,
    NoMillFormed,
    NotOpponentPiece(Point),
    Protected(Point),
}

impl fmt::Display for IllegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMove::UnknownPoint(pt) => write!(f, "point index {pt} is outside the board"),
            IllegalMove::GameFinished => write!(f, "game is already finished"),
            IllegalMove::NotYourTurn { expected } => write!(f, "it is {expected}'s turn"),
            IllegalMove::NoPiecesInHand => write!(f, "no pieces left in hand"),
            IllegalMove::WrongPhase { expected, got } => {
                write!(f, "player is {expected}, move is {got}")
            }
            IllegalMove::Malformed => write!(f, "source point does not match the phase"),
            IllegalMove::NotOwnPiece(pt) => write!(f, "no own piece on {}", point_name(*pt)),
            IllegalMove::Occupied(pt) => write!(f, "{} is occupied", point_name(*pt)),
            IllegalMove::NotAdjacent { from, to } => write!(
                f,
                "{} is not adjacent to {}",
                point_name(*to),
                point_name(*from)
            ),
            IllegalMove::CaptureRequired => write!(f, "move closes a mill, a capture is required"),
            IllegalMove::NoMillFormed => write!(f, "capture given but no mill was formed"),
            IllegalMove::NotOpponentPiece(pt) => {
                write!(f, "no opponent piece on {}", point_name(*pt))
            }
            IllegalMove::Protected(pt) => write!(
                f,
                "{} is in a mill and unprotected pieces remain",
                point_name(*pt)
            ),
        }
    }
}

impl std::error::Error for IllegalMove {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(Player),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Plies without a capture, once both sides have left placing, before a draw.
    /// Zero disables the rule.
    pub quiet_ply_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            quiet_ply_limit: DEFAULT_QUIET_PLY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Record {
    mv: Move,
    quiet_before: u32,
}

/// A live game between two players. Player one moves first.
#[derive(Debug, Clone)]
pub struct Game<'t> {
    pos: Position<'t>,
    to_move: Player,
    quiet_plies: u32,
    history: Vec<Record>,
    config: GameConfig,
}

impl Default for Game<'static> {
    fn default() -> Self {
        Self::new(Topology::standard())
    }
}

impl<'t> Game<'t> {
    pub fn new(topo: &'t Topology) -> Self {
        Self::with_config(topo, GameConfig::default())
    }

    pub fn with_config(topo: &'t Topology, config: GameConfig) -> Self {
        Self::from_position(Position::new(topo), Player::One, config)
    }

    /// Resume from an arbitrary position.
    pub fn from_position(pos: Position<'t>, to_move: Player, config: GameConfig) -> Self {
        Self {
            pos,
            to_move,
            quiet_plies: 0,
            history: Vec::new(),
            config,
        }
    }

    /// Back to the empty board, keeping the configuration.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.pos.topology(), self.config);
    }

    pub fn position(&self) -> &Position<'t> {
        &self.pos
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// Number of plies played.
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    pub fn moves_played(&self) -> impl Iterator<Item = &Move> + '_ {
        self.history.iter().map(|r| &r.mv)
    }

    pub fn phase_of(&self, player: Player) -> Phase {
        self.pos.phase_of(player)
    }

    /// Legal moves of `player` in the current position. No side effects.
    pub fn legal_moves(&self, player: Player) -> Vec<Move> {
        legal_moves(&self.pos, player)
    }

    /// True once `player` is out of pieces to place and below three on the board.
    pub fn is_game_over(&self, player: Player) -> bool {
        self.pos.is_game_over(player)
    }

    pub fn status(&self) -> GameStatus {
        for player in Player::BOTH {
            if self.pos.is_game_over(player) {
                return GameStatus::Won(player.opponent());
            }
        }
        if !has_legal_move(&self.pos, self.to_move) {
            return GameStatus::Won(self.to_move.opponent());
        }
        let limit = self.config.quiet_ply_limit;
        if limit > 0 && self.quiet_plies >= limit {
            return GameStatus::Draw;
        }
        GameStatus::InProgress
    }

    pub fn winner(&self) -> Option<Player> {
        match self.status() {
            GameStatus::Won(player) => Some(player),
            GameStatus::InProgress | GameStatus::Draw => None,
        }
    }

    /// Resolve move notation for the side to move.
    pub fn parse_move(&self, text: &str) -> Result<Move, NotationError> {
        Move::parse(text, self.to_move, self.pos.phase_of(self.to_move))
    }

    /// Check `mv` against the rules without applying it.
    pub fn validate(&self, mv: &Move) -> Result<(), IllegalMove> {
        for pt in [mv.from, Some(mv.to), mv.remove].into_iter().flatten() {
            if pt >= NUM_POINTS {
                return Err(IllegalMove::UnknownPoint(pt));
            }
        }
        if self.status() != GameStatus::InProgress {
            return Err(IllegalMove::GameFinished);
        }
        let player = mv.player;
        if player != self.to_move {
            return Err(IllegalMove::NotYourTurn {
                expected: self.to_move,
            });
        }
        if mv.phase == Phase::Placing && self.pos.in_hand(player) == 0 {
            return Err(IllegalMove::NoPiecesInHand);
        }
        let expected = self.pos.phase_of(player);
        if mv.phase != expected {
            return Err(IllegalMove::WrongPhase {
                expected,
                got: mv.phase,
            });
        }
        if mv.from.is_some() == (mv.phase == Phase::Placing) {
            return Err(IllegalMove::Malformed);
        }
        if let Some(from) = mv.from {
            if self.pos.owner(from) != Some(player) {
                return Err(IllegalMove::NotOwnPiece(from));
            }
        }
        if self.pos.is_occupied(mv.to) {
            return Err(IllegalMove::Occupied(mv.to));
        }
        if let (Phase::Moving, Some(from)) = (mv.phase, mv.from) {
            if !self.pos.topology().are_adjacent(from, mv.to) {
                return Err(IllegalMove::NotAdjacent { from, to: mv.to });
            }
        }

        let mut scratch = self.pos;
        let mill = forms_mill(&mut scratch, mv);
        let bare = Move { remove: None, ..*mv };
        scratch.do_move(&bare);
        let targets = capture_targets(&scratch, player);
        match (mill, mv.remove) {
            (true, None) if !targets.is_empty() => Err(IllegalMove::CaptureRequired),
            (true, None) => Ok(()),
            (false, Some(_)) => Err(IllegalMove::NoMillFormed),
            (false, None) => Ok(()),
            (true, Some(target)) => {
                if scratch.owner(target) != Some(player.opponent()) {
                    Err(IllegalMove::NotOpponentPiece(target))
                } else if !targets.contains(target) {
                    Err(IllegalMove::Protected(target))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Apply `mv` if legal; on error the game is unchanged.
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), IllegalMove> {
        self.validate(mv)?;

        self.pos.do_move(mv);
        self.history.push(Record {
            mv: *mv,
            quiet_before: self.quiet_plies,
        });
        let placing = mv.phase == Phase::Placing
            || Player::BOTH
                .iter()
                .any(|&p| self.pos.phase_of(p) == Phase::Placing);
        self.quiet_plies = if mv.remove.is_some() || placing {
            0
        } else {
            self.quiet_plies + 1
        };
        self.to_move = mv.player.opponent();

        info!(ply = self.ply(), player = mv.player.id(), %mv, "move applied");
        if let Some(target) = mv.remove {
            info!(
                captured = point_name(target),
                remaining = self.pos.on_board(mv.player.opponent()),
                "piece captured"
            );
        }
        match self.status() {
            GameStatus::Won(winner) => info!(winner = winner.id(), "game over"),
            GameStatus::Draw => info!(plies = self.quiet_plies, "game drawn"),
            GameStatus::InProgress => {}
        }
        Ok(())
    }

    /// Take back the last move, returning it.
    pub fn undo_last(&mut self) -> Option<Move> {
        let record = self.history.pop()?;
        self.pos.undo_move(&record.mv);
        self.quiet_plies = record.quiet_before;
        self.to_move = record.mv.player;
        Some(record.mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_point;

    fn pt(name: &str) -> Point {
        parse_point(name).unwrap()
    }

    fn play(game: &mut Game, text: &str) {
        let mv = game.parse_move(text).unwrap();
        game.apply_move(&mv).unwrap_or_else(|e| panic!("{text}: {e}"));
    }

    #[test]
    fn test_turns_alternate() {
        let mut game = Game::default();
        assert_eq!(game.to_move(), Player::One);
        play(&mut game, "d6");
        assert_eq!(game.to_move(), Player::Two);
        let err = game.apply_move(&Move::place(Player::One, pt("d2"))).unwrap_err();
        assert_eq!(err, IllegalMove::NotYourTurn { expected: Player::Two });
    }

    #[test]
    fn test_occupied_rejected_and_state_unchanged() {
        let mut game = Game::default();
        play(&mut game, "d6");
        let before = *game.position();
        let err = game.apply_move(&Move::place(Player::Two, pt("d6"))).unwrap_err();
        assert_eq!(err, IllegalMove::Occupied(pt("d6")));
        assert_eq!(*game.position(), before);
        assert_eq!(game.to_move(), Player::Two);
    }

    #[test]
    fn test_out_of_range_points_rejected() {
        let mut game = Game::default();
        let before = *game.position();
        assert_eq!(
            game.apply_move(&Move::place(Player::One, NUM_POINTS)),
            Err(IllegalMove::UnknownPoint(NUM_POINTS))
        );
        assert_eq!(
            game.apply_move(&Move::place(Player::One, pt("d6")).with_remove(99)),
            Err(IllegalMove::UnknownPoint(99))
        );
        assert_eq!(*game.position(), before);
        assert_eq!(game.ply(), 0);

        let mv = Move::shift(Player::One, Phase::Moving, 30, pt("b6"));
        assert_eq!(game.apply_move(&mv), Err(IllegalMove::UnknownPoint(30)));
        assert_eq!(game.to_move(), Player::One);
    }

    #[test]
    fn test_capture_required_on_mill() {
        let mut game = Game::default();
        for mv in ["a7", "a1", "d7", "d1"] {
            play(&mut game, mv);
        }
        let err = game.apply_move(&Move::place(Player::One, pt("g7"))).unwrap_err();
        assert_eq!(err, IllegalMove::CaptureRequired);
        let err = game
            .apply_move(&Move::place(Player::One, pt("g4")).with_remove(pt("a1")))
            .unwrap_err();
        assert_eq!(err, IllegalMove::NoMillFormed);
        play(&mut game, "g7xa1");
        assert_eq!(game.position().on_board(Player::Two), 1);
        assert_eq!(game.position().captured(Player::Two), 1);
    }

    #[test]
    fn test_protected_piece_rejected() {
        let mut game = Game::default();
        // Two builds a1-d1-g1 plus a loose b6, then One closes a7-d7-g7.
        for mv in ["a7", "a1", "d7", "d1", "f4", "g1xf4", "b4", "b6"] {
            play(&mut game, mv);
        }
        let mv = game.parse_move("g7xd1").unwrap();
        assert_eq!(game.apply_move(&mv), Err(IllegalMove::Protected(pt("d1"))));
        let mv = game.parse_move("g7xb4").unwrap();
        assert_eq!(game.apply_move(&mv), Err(IllegalMove::NotOpponentPiece(pt("b4"))));
        play(&mut game, "g7xb6");
    }

    #[test]
    fn test_undo_restores_game() {
        let mut game = Game::default();
        play(&mut game, "d6");
        let before = game.clone();
        play(&mut game, "d2");
        assert_eq!(game.undo_last(), Some(Move::place(Player::Two, pt("d2"))));
        assert_eq!(*game.position(), *before.position());
        assert_eq!(game.to_move(), before.to_move());
        assert_eq!(game.ply(), 1);
    }

    #[test]
    fn test_reduced_to_two_loses() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(
            topo,
            &[pt("a7"), pt("d7")],
            &[pt("a1"), pt("d1"), pt("g1")],
            [0, 0],
        )
        .unwrap();
        let game = Game::from_position(pos, Player::One, GameConfig::default());
        assert!(game.is_game_over(Player::One));
        assert_eq!(game.winner(), Some(Player::Two));
        assert_eq!(
            game.validate(&Move::shift(Player::One, Phase::Flying, pt("a7"), pt("g7"))),
            Err(IllegalMove::GameFinished)
        );
    }

    #[test]
    fn test_quiet_plies_draw() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(
            topo,
            &[pt("a7"), pt("d6"), pt("f4"), pt("b2")],
            &[pt("g1"), pt("c3"), pt("e5"), pt("b4")],
            [0, 0],
        )
        .unwrap();
        let mut game = Game::from_position(pos, Player::One, GameConfig { quiet_ply_limit: 4 });
        for mv in ["a7-d7", "g1-d1", "d7-a7", "d1-g1"] {
            play(&mut game, mv);
        }
        assert_eq!(game.status(), GameStatus::Draw);
        assert_eq!(game.winner(), None);
    }
}
