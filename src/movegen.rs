//! Legal move generation for the three phases.
//!
//! Every candidate placement, slide or fly is tentatively applied; if its
//! destination closes a mill it is expanded into one move per legal capture
//! target, otherwise it stands alone. The tentative application is always
//! undone, so generation leaves the caller's position untouched.

use crate::board::{Point, PointSet};
use crate::position::{Move, Phase, Player, Position};

/// Opponent pieces `player` may capture.
///
/// Pieces outside the opponent's mills are eligible; only if every opponent
/// piece sits in a mill do mill members become eligible.
pub fn capture_targets(pos: &Position, player: Player) -> PointSet {
    let opp = player.opponent();
    let pieces = pos.pieces_of(opp);
    let unprotected = pieces - pos.mills_for(opp);
    if unprotected.is_empty() {
        pieces
    } else {
        unprotected
    }
}

/// Append every legal move for `player` to `out`, using `pos` as scratch space.
///
/// `pos` is restored before returning.
pub fn generate_moves(pos: &mut Position, player: Player, out: &mut Vec<Move>) {
    let phase = pos.phase_of(player);
    let empty = pos.empty_points();
    match phase {
        Phase::Placing => {
            for to in empty.iter() {
                push_expanded(pos, Move::place(player, to), out);
            }
        }
        Phase::Moving => {
            let topo = pos.topology();
            for from in pos.pieces_of(player).iter() {
                for to in (topo.neighbors(from) & empty).iter() {
                    push_expanded(pos, Move::shift(player, phase, from, to), out);
                }
            }
        }
        Phase::Flying => {
            for from in pos.pieces_of(player).iter() {
                for to in empty.iter() {
                    push_expanded(pos, Move::shift(player, phase, from, to), out);
                }
            }
        }
    }
}

/// All legal moves for `player` in `pos`.
pub fn legal_moves(pos: &Position, player: Player) -> Vec<Move> {
    let mut scratch = *pos;
    let mut moves = Vec::new();
    generate_moves(&mut scratch, player, &mut moves);
    moves
}

/// True if `player` has at least one legal move.
///
/// Cheaper than generating: a mill never removes the underlying placement or shift.
pub fn has_legal_move(pos: &Position, player: Player) -> bool {
    let empty = pos.empty_points();
    match pos.phase_of(player) {
        Phase::Placing => !empty.is_empty(),
        Phase::Moving => {
            let topo = pos.topology();
            pos.pieces_of(player)
                .iter()
                .any(|from| !(topo.neighbors(from) & empty).is_empty())
        }
        Phase::Flying => !pos.pieces_of(player).is_empty() && !empty.is_empty(),
    }
}

/// True if applying `mv` (without its capture) closes a mill at its destination.
pub fn forms_mill(pos: &mut Position, mv: &Move) -> bool {
    let bare = Move { remove: None, ..*mv };
    pos.do_move(&bare);
    let mill = pos.in_mill(bare.to);
    pos.undo_move(&bare);
    mill
}

fn push_expanded(pos: &mut Position, mv: Move, out: &mut Vec<Move>) {
    pos.do_move(&mv);
    let targets = if pos.in_mill(mv.to) {
        capture_targets(pos, mv.player)
    } else {
        PointSet::empty()
    };
    pos.undo_move(&mv);

    if targets.is_empty() {
        // No mill, or a mill with nothing left to capture.
        out.push(mv);
    } else {
        out.extend(targets.iter().map(|t: Point| mv.with_remove(t)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Topology, parse_point};
    use crate::constants::NUM_POINTS;

    fn pt(name: &str) -> Point {
        parse_point(name).unwrap()
    }

    fn pts(names: &[&str]) -> Vec<Point> {
        names.iter().map(|n| pt(n)).collect()
    }

    #[test]
    fn test_placing_on_empty_board() {
        let pos = Position::default();
        let moves = legal_moves(&pos, Player::One);
        assert_eq!(moves.len(), NUM_POINTS);
        assert!(moves.iter().all(|m| m.from.is_none() && m.remove.is_none()));
    }

    #[test]
    fn test_moving_only_to_empty_neighbors() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(
            topo,
            &pts(&["a7", "d6", "g1", "b2"]),
            &pts(&["d7", "a4", "f4", "d1", "c3"]),
            [0, 0],
        )
        .unwrap();
        let moves = legal_moves(&pos, Player::One);
        let mut names: Vec<String> = moves.iter().map(|m| m.to_string()).collect();
        names.sort();
        // a7 is boxed in by d7 and a4.
        assert_eq!(
            names,
            vec!["b2-b4", "b2-d2", "d6-b6", "d6-d5", "d6-f6", "g1-g4"]
        );
    }

    #[test]
    fn test_flying_reaches_every_empty_point() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(
            topo,
            &pts(&["a7", "g1", "d5"]),
            &pts(&["d6", "b4", "f4", "d2"]),
            [0, 0],
        )
        .unwrap();
        assert_eq!(pos.phase_of(Player::One), Phase::Flying);
        let moves = legal_moves(&pos, Player::One);
        // Three pieces times 17 empty points; no two share a line, so no mill.
        assert_eq!(moves.len(), 3 * 17);
        assert!(moves.iter().all(|m| m.phase == Phase::Flying));
    }

    #[test]
    fn test_mill_expands_into_captures() {
        let topo = Topology::standard();
        // Two is all in a mill except b6.
        let pos = Position::with_pieces(
            topo,
            &pts(&["a7", "d7"]),
            &pts(&["a1", "d1", "g1", "b6"]),
            [7, 5],
        )
        .unwrap();
        let to_g7: Vec<Move> = legal_moves(&pos, Player::One)
            .into_iter()
            .filter(|m| m.to == pt("g7"))
            .collect();
        assert_eq!(to_g7, vec![Move::place(Player::One, pt("g7")).with_remove(pt("b6"))]);
    }

    #[test]
    fn test_all_protected_makes_every_piece_eligible() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(
            topo,
            &pts(&["a7", "d7"]),
            &pts(&["a1", "d1", "g1"]),
            [7, 6],
        )
        .unwrap();
        assert_eq!(
            capture_targets(&pos, Player::One),
            pts(&["a1", "d1", "g1"]).into_iter().collect::<PointSet>()
        );
    }

    #[test]
    fn test_mill_with_no_opponent_pieces_stands_alone() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(topo, &pts(&["a7", "d7"]), &[], [7, 0]).unwrap();
        let moves = legal_moves(&pos, Player::One);
        let to_g7: Vec<&Move> = moves.iter().filter(|m| m.to == pt("g7")).collect();
        assert_eq!(to_g7.len(), 1);
        assert_eq!(to_g7[0].remove, None);
    }

    #[test]
    fn test_generation_leaves_position_untouched() {
        let topo = Topology::standard();
        let mut pos = Position::with_pieces(
            topo,
            &pts(&["a7", "d7", "b4"]),
            &pts(&["a1", "d1", "g1", "f6"]),
            [6, 5],
        )
        .unwrap();
        let before = pos;
        let mut moves = Vec::new();
        generate_moves(&mut pos, Player::One, &mut moves);
        assert_eq!(pos, before);
        assert!(!moves.is_empty());
    }

    #[test]
    fn test_blocked_player_has_no_moves() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(
            topo,
            &pts(&["a7", "g7", "a1", "g1"]),
            &pts(&["d7", "a4", "g4", "d1", "b6"]),
            [0, 0],
        )
        .unwrap();
        assert!(legal_moves(&pos, Player::One).is_empty());
        assert!(!has_legal_move(&pos, Player::One));
        assert!(has_legal_move(&pos, Player::Two));
    }

    #[test]
    fn test_forms_mill() {
        let topo = Topology::standard();
        let mut pos = Position::with_pieces(topo, &pts(&["a7", "d7"]), &[], [7, 9]).unwrap();
        assert!(forms_mill(&mut pos, &Move::place(Player::One, pt("g7"))));
        assert!(!forms_mill(&mut pos, &Move::place(Player::One, pt("g4"))));
    }
}
