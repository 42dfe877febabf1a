//! Game state shared by the live game and the search.
//!
//! This module provides:
//! - [`Player`] and the derived [`Phase`] of each player
//! - [`Move`], a single ply with an optional capture
//! - [`Position`], occupancy plus per-player piece counts, mutated only through
//!   [`Position::do_move`] and [`Position::undo_move`]
//!
//! A `Position` is `Copy`: the search takes its own snapshot of the live state and
//! walks the tree with do/undo, never allocating per node.

use std::fmt;

use crate::board::{NotationError, Point, PointSet, Topology, parse_point, point_name};
use crate::constants::{FLYING_THRESHOLD, MIN_PIECES, NUM_POINTS, PIECES_PER_PLAYER};

// =============================================================================
// Players and phases
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    /// Small integer id (1 or 2).
    pub fn id(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Player> {
        match id {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::One => "Player 1",
            Player::Two => "Player 2",
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Board symbol used by `Display`.
    pub fn symbol(self) -> char {
        match self {
            Player::One => 'X',
            Player::Two => 'O',
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rule phase of a player, derived from piece counts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Placing,
    Moving,
    Flying,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Placing => "placing",
            Phase::Moving => "moving",
            Phase::Flying => "flying",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Moves
// =============================================================================

/// One ply: a placement or a slide/fly, plus an optional capture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub player: Player,
    pub phase: Phase,
    /// Present iff `phase != Placing`.
    pub from: Option<Point>,
    pub to: Point,
    pub remove: Option<Point>,
}

impl Move {
    pub fn place(player: Player, to: Point) -> Self {
        Move {
            player,
            phase: Phase::Placing,
            from: None,
            to,
            remove: None,
        }
    }

    /// A slide (`Phase::Moving`) or fly (`Phase::Flying`) from `from` to `to`.
    pub fn shift(player: Player, phase: Phase, from: Point, to: Point) -> Self {
        Move {
            player,
            phase,
            from: Some(from),
            to,
            remove: None,
        }
    }

    /// Copy of this move capturing `target`.
    pub fn with_remove(self, target: Point) -> Self {
        Move {
            remove: Some(target),
            ..self
        }
    }

    /// Parse move notation (`d6`, `a1-a4`, `d6xg7`, `a1-a4xg7`) for `player` in `phase`.
    ///
    /// Only the shape is checked here; legality is up to the referee.
    pub fn parse(text: &str, player: Player, phase: Phase) -> Result<Move, NotationError> {
        let lower = text.trim().to_ascii_lowercase();
        let (body, remove) = match lower.split_once('x') {
            Some((body, target)) => (body, Some(parse_point(target)?)),
            None => (lower.as_str(), None),
        };
        let (from, to) = match body.split_once('-') {
            Some((from, to)) => (Some(parse_point(from)?), parse_point(to)?),
            None => (None, parse_point(body)?),
        };
        if from.is_some() == (phase == Phase::Placing) {
            return Err(NotationError::Malformed(text.to_string()));
        }
        Ok(Move {
            player,
            phase,
            from,
            to,
            remove,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(from) = self.from {
            write!(f, "{}-", point_name(from))?;
        }
        write!(f, "{}", point_name(self.to))?;
        if let Some(target) = self.remove {
            write!(f, "x{}", point_name(target))?;
        }
        Ok(())
    }
}

// =============================================================================
// Invariants
// =============================================================================

/// Internal state is corrupt; nothing further can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// in_hand + on_board exceeds the nine pieces a player owns.
    PieceCount {
        player: Player,
        in_hand: u8,
        on_board: u8,
    },
    /// The on-board counter disagrees with the occupancy map.
    BoardMismatch {
        player: Player,
        counted: u8,
        occupied: usize,
    },
    /// A piece counter would drop below zero.
    CounterUnderflow {
        player: Player,
        counter: &'static str,
    },
    /// A point outside the board arena.
    PointOutOfRange(Point),
    /// Both players claim the same point.
    SharedPoint(Point),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::PieceCount {
                player,
                in_hand,
                on_board,
            } => write!(
                f,
                "{player}: {in_hand} in hand + {on_board} on board exceeds {PIECES_PER_PLAYER}"
            ),
            InvariantViolation::BoardMismatch {
                player,
                counted,
                occupied,
            } => write!(
                f,
                "{player}: on-board count {counted} but {occupied} points occupied"
            ),
            InvariantViolation::CounterUnderflow { player, counter } => {
                write!(f, "{player}: {counter} count would drop below zero")
            }
            InvariantViolation::PointOutOfRange(pt) => {
                write!(f, "point index {pt} is outside the board")
            }
            InvariantViolation::SharedPoint(pt) => {
                write!(f, "{} is claimed by both players", point_name(*pt))
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

// =============================================================================
// Position
// =============================================================================

/// Occupancy of every point plus per-player piece counts.
#[derive(Copy, Clone)]
pub struct Position<'t> {
    topo: &'t Topology,
    cells: [Option<Player>; NUM_POINTS],
    in_hand: [u8; 2],
    on_board: [u8; 2],
}

impl PartialEq for Position<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.topo, other.topo)
            && self.cells == other.cells
            && self.in_hand == other.in_hand
            && self.on_board == other.on_board
    }
}

impl Eq for Position<'_> {}

impl fmt::Debug for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("one", &self.pieces_of(Player::One))
            .field("two", &self.pieces_of(Player::Two))
            .field("in_hand", &self.in_hand)
            .field("on_board", &self.on_board)
            .finish()
    }
}

impl Default for Position<'static> {
    fn default() -> Self {
        Self::new(Topology::standard())
    }
}

impl<'t> Position<'t> {
    /// Empty board, nine pieces in each hand.
    pub fn new(topo: &'t Topology) -> Self {
        Position {
            topo,
            cells: [None; NUM_POINTS],
            in_hand: [PIECES_PER_PLAYER; 2],
            on_board: [0; 2],
        }
    }

    /// Build a position from explicit piece lists and in-hand counts.
    ///
    /// Captured counts are whatever remains of the nine; used to set up
    /// mid-game positions without replaying a game.
    pub fn with_pieces(
        topo: &'t Topology,
        one: &[Point],
        two: &[Point],
        in_hand: [u8; 2],
    ) -> Result<Self, InvariantViolation> {
        let mut pos = Position::new(topo);
        pos.in_hand = in_hand;
        for (player, points) in [(Player::One, one), (Player::Two, two)] {
            for &pt in points {
                let cell = pos
                    .cells
                    .get_mut(pt)
                    .ok_or(InvariantViolation::PointOutOfRange(pt))?;
                match *cell {
                    Some(owner) if owner != player => {
                        return Err(InvariantViolation::SharedPoint(pt));
                    }
                    _ => *cell = Some(player),
                }
            }
        }
        for player in Player::BOTH {
            pos.on_board[player.index()] = pos.pieces_of(player).len() as u8;
        }
        pos.check_invariants()?;
        Ok(pos)
    }

    pub fn topology(&self) -> &'t Topology {
        self.topo
    }

    #[inline]
    pub fn owner(&self, pt: Point) -> Option<Player> {
        self.cells[pt]
    }

    #[inline]
    pub fn is_empty(&self, pt: Point) -> bool {
        self.cells[pt].is_none()
    }

    #[inline]
    pub fn is_occupied(&self, pt: Point) -> bool {
        self.cells[pt].is_some()
    }

    #[inline]
    pub fn in_hand(&self, player: Player) -> u8 {
        self.in_hand[player.index()]
    }

    #[inline]
    pub fn on_board(&self, player: Player) -> u8 {
        self.on_board[player.index()]
    }

    /// Pieces lost to captures.
    pub fn captured(&self, player: Player) -> u8 {
        PIECES_PER_PLAYER
            .saturating_sub(self.in_hand(player))
            .saturating_sub(self.on_board(player))
    }

    /// PLACING while pieces remain in hand, FLYING at three or fewer on the
    /// board, MOVING otherwise.
    pub fn phase_of(&self, player: Player) -> Phase {
        if self.in_hand(player) > 0 {
            Phase::Placing
        } else if self.on_board(player) <= FLYING_THRESHOLD {
            Phase::Flying
        } else {
            Phase::Moving
        }
    }

    /// A player out of pieces to place with fewer than three on the board has lost.
    pub fn is_game_over(&self, player: Player) -> bool {
        self.in_hand(player) == 0 && self.on_board(player) < MIN_PIECES
    }

    pub fn empty_points(&self) -> PointSet {
        (0..NUM_POINTS).filter(|&pt| self.is_empty(pt)).collect()
    }

    pub fn pieces_of(&self, player: Player) -> PointSet {
        (0..NUM_POINTS)
            .filter(|&pt| self.cells[pt] == Some(player))
            .collect()
    }

    /// Apply a move in place. The move must be legal for this position.
    ///
    /// `Position` trusts its callers; [`crate::game::Game`] referees moves before
    /// they get here.
    ///
    /// # Panics
    /// Panics if a piece counter would drop below zero, which only an illegal
    /// move can cause.
    pub fn do_move(&mut self, mv: &Move) {
        let me = mv.player.index();
        let opp = mv.player.opponent();
        match mv.from {
            Some(from) => self.cells[from] = None,
            None => {
                decrement(&mut self.in_hand[me], mv.player, "in-hand");
                self.on_board[me] += 1;
            }
        }
        self.cells[mv.to] = Some(mv.player);
        if let Some(target) = mv.remove {
            self.cells[target] = None;
            decrement(&mut self.on_board[opp.index()], opp, "on-board");
        }
        debug_assert!(self.check_invariants().is_ok());
    }

    /// Exact inverse of [`Position::do_move`] for the same move.
    pub fn undo_move(&mut self, mv: &Move) {
        let me = mv.player.index();
        if let Some(target) = mv.remove {
            self.cells[target] = Some(mv.player.opponent());
            self.on_board[mv.player.opponent().index()] += 1;
        }
        self.cells[mv.to] = None;
        match mv.from {
            Some(from) => self.cells[from] = Some(mv.player),
            None => {
                self.in_hand[me] += 1;
                decrement(&mut self.on_board[me], mv.player, "on-board");
            }
        }
        debug_assert!(self.check_invariants().is_ok());
    }

    /// True if every point of some line through `pt` is owned by `pt`'s owner.
    pub fn in_mill(&self, pt: Point) -> bool {
        match self.cells[pt] {
            None => false,
            Some(player) => self
                .topo
                .lines_through(pt)
                .any(|line| line.iter().all(|&p| self.cells[p] == Some(player))),
        }
    }

    /// Points belonging to at least one line fully owned by `player`.
    pub fn mills_for(&self, player: Player) -> PointSet {
        let mut set = PointSet::empty();
        for line in self.topo.mill_lines() {
            if line.iter().all(|&p| self.cells[p] == Some(player)) {
                set |= line.iter().copied().collect();
            }
        }
        set
    }

    /// Mill members of both players, indexed by `Player::One`, `Player::Two`.
    pub fn all_mills(&self) -> [PointSet; 2] {
        [self.mills_for(Player::One), self.mills_for(Player::Two)]
    }

    /// Verify the piece-count arithmetic against the occupancy map.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for player in Player::BOTH {
            let in_hand = self.in_hand(player);
            let on_board = self.on_board(player);
            if in_hand as u32 + on_board as u32 > PIECES_PER_PLAYER as u32 {
                return Err(InvariantViolation::PieceCount {
                    player,
                    in_hand,
                    on_board,
                });
            }
            let occupied = self.pieces_of(player).len();
            if occupied != on_board as usize {
                return Err(InvariantViolation::BoardMismatch {
                    player,
                    counted: on_board,
                    occupied,
                });
            }
        }
        Ok(())
    }
}

/// Decrement a piece counter. Running below zero means the state is corrupt.
fn decrement(count: &mut u8, player: Player, counter: &'static str) {
    match count.checked_sub(1) {
        Some(n) => *count = n,
        None => panic!("{}", InvariantViolation::CounterUnderflow { player, counter }),
    }
}

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const ROWS: [&str; 13] = [
            "7  # ------------ # ------------ #",
            "   |              |              |",
            "6  |    # ------- # ------- #    |",
            "   |    |         |         |    |",
            "5  |    |    # -- # -- #    |    |",
            "   |    |    |         |    |    |",
            "4  # -- # -- #         # -- # -- #",
            "   |    |    |         |    |    |",
            "3  |    |    # -- # -- #    |    |",
            "   |    |         |         |    |",
            "2  |    # ------- # ------- #    |",
            "   |              |              |",
            "1  # ------------ # ------------ #",
        ];
        const FILES: &str = "   a    b    c    d    e    f    g";
        // Placeholders appear in arena order, so a running index suffices.
        let mut pt = 0;
        for row in ROWS {
            for ch in row.chars() {
                if ch == '#' {
                    let c = self.cells[pt].map_or('.', Player::symbol);
                    write!(f, "{c}")?;
                    pt += 1;
                } else {
                    write!(f, "{ch}")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "{FILES}")?;
        for player in Player::BOTH {
            writeln!(
                f,
                "{} ({}): {} in hand, {} on board, {}",
                player,
                player.symbol(),
                self.in_hand(player),
                self.on_board(player),
                self.phase_of(player)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(name: &str) -> Point {
        parse_point(name).unwrap()
    }

    fn pts(names: &[&str]) -> Vec<Point> {
        names.iter().map(|n| pt(n)).collect()
    }

    #[test]
    fn test_new_position() {
        let pos = Position::default();
        assert_eq!(pos.empty_points().len(), NUM_POINTS);
        for player in Player::BOTH {
            assert_eq!(pos.in_hand(player), 9);
            assert_eq!(pos.on_board(player), 0);
            assert_eq!(pos.captured(player), 0);
            assert_eq!(pos.phase_of(player), Phase::Placing);
            assert!(!pos.is_game_over(player));
        }
    }

    #[test]
    fn test_phase_derivation() {
        let topo = Topology::standard();
        let four = pts(&["a7", "d7", "g7", "b6"]);
        let pos = Position::with_pieces(topo, &four, &pts(&["a1", "d1", "g1"]), [0, 0]).unwrap();
        assert_eq!(pos.phase_of(Player::One), Phase::Moving);
        assert_eq!(pos.phase_of(Player::Two), Phase::Flying);

        let pos = Position::with_pieces(topo, &four, &[], [1, 2]).unwrap();
        assert_eq!(pos.phase_of(Player::One), Phase::Placing);
        assert!(!pos.is_game_over(Player::Two));
    }

    #[test]
    fn test_game_over_below_three() {
        let topo = Topology::standard();
        let pos =
            Position::with_pieces(topo, &pts(&["a7", "d7"]), &pts(&["a1", "d1", "g1"]), [0, 0])
                .unwrap();
        assert!(pos.is_game_over(Player::One));
        assert!(!pos.is_game_over(Player::Two));
    }

    #[test]
    fn test_place_and_undo() {
        let mut pos = Position::default();
        let before = pos;
        let mv = Move::place(Player::One, pt("d6"));
        pos.do_move(&mv);
        assert_eq!(pos.owner(pt("d6")), Some(Player::One));
        assert_eq!(pos.in_hand(Player::One), 8);
        assert_eq!(pos.on_board(Player::One), 1);
        pos.undo_move(&mv);
        assert_eq!(pos, before);
    }

    #[test]
    fn test_capture_and_undo() {
        let topo = Topology::standard();
        let mut pos = Position::with_pieces(
            topo,
            &pts(&["a7", "d7", "g4", "b4", "c4"]),
            &pts(&["g1", "d1", "f2", "b2"]),
            [0, 0],
        )
        .unwrap();
        let before = pos;
        let mv = Move::shift(Player::One, Phase::Moving, pt("g4"), pt("g7"))
            .with_remove(pt("b2"));
        pos.do_move(&mv);
        assert_eq!(pos.owner(pt("b2")), None);
        assert_eq!(pos.on_board(Player::Two), 3);
        assert_eq!(pos.captured(Player::Two), 6);
        pos.undo_move(&mv);
        assert_eq!(pos, before);
    }

    #[test]
    fn test_mills_for() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(
            topo,
            &pts(&["a7", "d7", "g7", "g4", "g1"]),
            &pts(&["b6", "d6"]),
            [4, 7],
        )
        .unwrap();
        let mills = pos.mills_for(Player::One);
        let expected: PointSet = pts(&["a7", "d7", "g7", "g4", "g1"]).into_iter().collect();
        assert_eq!(mills, expected);
        assert!(pos.in_mill(pt("g7")));
        assert!(!pos.in_mill(pt("b6")));
        assert!(pos.mills_for(Player::Two).is_empty());
    }

    #[test]
    fn test_invariant_violation_detected() {
        let topo = Topology::standard();
        let err = Position::with_pieces(topo, &pts(&["a7", "d7"]), &[], [8, 9]).unwrap_err();
        assert!(matches!(err, InvariantViolation::PieceCount { player: Player::One, .. }));
    }

    #[test]
    fn test_with_pieces_rejects_shared_point() {
        let topo = Topology::standard();
        let err = Position::with_pieces(topo, &pts(&["d6"]), &pts(&["d6"]), [8, 8]).unwrap_err();
        assert_eq!(err, InvariantViolation::SharedPoint(pt("d6")));
    }

    #[test]
    fn test_with_pieces_rejects_out_of_range_point() {
        let topo = Topology::standard();
        let err = Position::with_pieces(topo, &[NUM_POINTS], &[], [8, 9]).unwrap_err();
        assert_eq!(err, InvariantViolation::PointOutOfRange(NUM_POINTS));
        let err = Position::with_pieces(topo, &[], &[99], [9, 8]).unwrap_err();
        assert_eq!(err, InvariantViolation::PointOutOfRange(99));
    }

    #[test]
    #[should_panic(expected = "in-hand count would drop below zero")]
    fn test_placing_with_empty_hand_is_fatal() {
        let topo = Topology::standard();
        let mut pos = Position::with_pieces(topo, &pts(&["a7", "d7", "g7"]), &pts(&["a1"]), [0, 8])
            .unwrap();
        pos.do_move(&Move::place(Player::One, pt("d6")));
    }

    #[test]
    #[should_panic(expected = "on-board count would drop below zero")]
    fn test_capture_from_empty_board_is_fatal() {
        let mut pos = Position::default();
        pos.do_move(&Move::place(Player::One, pt("d6")).with_remove(pt("a1")));
    }

    #[test]
    fn test_move_notation() {
        let mv = Move::parse("d6xg7", Player::One, Phase::Placing).unwrap();
        assert_eq!(mv, Move::place(Player::One, pt("d6")).with_remove(pt("g7")));
        assert_eq!(mv.to_string(), "d6xg7");

        let mv = Move::parse("A1-A4", Player::Two, Phase::Moving).unwrap();
        assert_eq!(mv.from, Some(pt("a1")));
        assert_eq!(mv.to_string(), "a1-a4");

        assert!(Move::parse("a1-a4", Player::One, Phase::Placing).is_err());
        assert!(Move::parse("a4", Player::One, Phase::Flying).is_err());
        assert!(Move::parse("z9", Player::One, Phase::Placing).is_err());
    }

    #[test]
    fn test_display_lists_counts() {
        let mut pos = Position::default();
        pos.do_move(&Move::place(Player::Two, pt("g1")));
        let text = pos.to_string();
        assert!(text.contains("Player 2 (O): 8 in hand, 1 on board, placing"));
        assert!(text.lines().last().unwrap().contains("placing"));
    }
}
