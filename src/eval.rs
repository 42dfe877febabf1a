//! Static position evaluation, used only at the search frontier.
//!
//! Two terms, both from the point of view of the evaluated player:
//! - line pressure: each mill line scores by how many of its points each side owns
//! - positional weight: crosses, junctions and corners weigh 2, 1 and 0

use crate::constants::{SCORE_LINE_ONE, SCORE_LINE_THREE, SCORE_LINE_TWO};
use crate::position::{Player, Position};

/// Score of one line given own pieces and empty points on it.
#[inline]
fn line_value(own: u32, empty: u32) -> i32 {
    match (own, empty) {
        (3, _) => SCORE_LINE_THREE,
        (2, 1) => SCORE_LINE_TWO,
        (1, 2) => SCORE_LINE_ONE,
        _ => 0,
    }
}

/// Line-pressure term summed over all mill lines.
pub fn line_pressure(pos: &Position, player: Player) -> i32 {
    pos.topology()
        .mill_lines()
        .iter()
        .map(|line| {
            let (mut mine, mut theirs, mut empty) = (0, 0, 0);
            for &pt in line {
                match pos.owner(pt) {
                    Some(p) if p == player => mine += 1,
                    Some(_) => theirs += 1,
                    None => empty += 1,
                }
            }
            line_value(mine, empty) - line_value(theirs, empty)
        })
        .sum()
}

/// Positional term: sum of point weights, positive for own pieces.
pub fn positional(pos: &Position, player: Player) -> i32 {
    let topo = pos.topology();
    let mine: i32 = pos.pieces_of(player).iter().map(|pt| topo.weight(pt)).sum();
    let theirs: i32 = pos
        .pieces_of(player.opponent())
        .iter()
        .map(|pt| topo.weight(pt))
        .sum();
    mine - theirs
}

/// Static score of `pos` for `player`.
pub fn evaluate(pos: &Position, player: Player) -> i32 {
    line_pressure(pos, player) + positional(pos, player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Point, Topology, parse_point};

    fn pts(names: &[&str]) -> Vec<Point> {
        names.iter().map(|n| parse_point(n).unwrap()).collect()
    }

    #[test]
    fn test_empty_board_is_zero() {
        let pos = Position::default();
        assert_eq!(evaluate(&pos, Player::One), 0);
        assert_eq!(evaluate(&pos, Player::Two), 0);
    }

    #[test]
    fn test_single_corner_piece() {
        let topo = Topology::standard();
        // a7 is a corner on two lines, each with two empty points.
        let pos = Position::with_pieces(topo, &pts(&["a7"]), &[], [8, 9]).unwrap();
        assert_eq!(line_pressure(&pos, Player::One), 2);
        assert_eq!(positional(&pos, Player::One), 0);
        assert_eq!(evaluate(&pos, Player::Two), -2);
    }

    #[test]
    fn test_cross_point_weight() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(topo, &pts(&["d6"]), &pts(&["d7"]), [8, 8]).unwrap();
        // d6 cross (+2) vs d7 junction (-1).
        assert_eq!(positional(&pos, Player::One), 1);
        // Shared line d7-d6-d5 scores nothing; b6-d6-f6 is +1; a7-d7-g7 is -1.
        assert_eq!(line_pressure(&pos, Player::One), 0);
    }

    #[test]
    fn test_mill_and_two_in_line() {
        let topo = Topology::standard();
        let pos = Position::with_pieces(
            topo,
            &pts(&["a7", "d7", "g7"]),
            &pts(&["a1", "d1"]),
            [6, 7],
        )
        .unwrap();
        // Lines: mill +100, d7 and g7 columns +1 each, a1-d1-g1 -10, d1 column -1.
        // Points: d7 +1 against d1 -1.
        assert_eq!(line_pressure(&pos, Player::One), 91);
        assert_eq!(positional(&pos, Player::One), 0);
        assert_eq!(evaluate(&pos, Player::Two), -91);
    }
}
