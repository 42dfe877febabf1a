//! Board graph: the 24 points, their orthogonal adjacency and the mill lines.
//!
//! Points live in an arena indexed by [`Point`] (0..24, top row first). Adjacency
//! is stored as index arrays rather than references, so the topology is a plain
//! immutable value shared by every position and search.
//!
//! ```text
//! 7  a7 ----------- d7 ----------- g7
//!    |              |              |
//! 6  |    b6 ------ d6 ------ f6   |
//!    |    |         |         |    |
//! 5  |    |    c5 - d5 - e5   |    |
//!    |    |    |         |    |    |
//! 4  a4 - b4 - c4        e4 - f4 - g4
//!    |    |    |         |    |    |
//! 3  |    |    c3 - d3 - e3   |    |
//!    |    |         |         |    |
//! 2  |    b2 ------ d2 ------ f2   |
//!    |              |              |
//! 1  a1 ----------- d1 ----------- g1
//!    a    b    c    d    e    f    g
//! ```

use std::fmt;
use std::sync::OnceLock;

use crate::constants::{
    MAX_NEIGHBORS, NUM_MILL_LINES, NUM_POINTS, WEIGHT_CORNER, WEIGHT_CROSS, WEIGHT_JUNCTION,
};

/// A point on the board, an index into the point arena.
pub type Point = usize;

/// A mill line: three colinear, adjacent points (outer, middle, outer).
pub type MillLine = [Point; 3];

/// Canonical point names in arena order.
pub const POINT_NAMES: [&str; NUM_POINTS] = [
    "a7", "d7", "g7", "b6", "d6", "f6", "c5", "d5", "e5", "a4", "b4", "c4", "e4", "f4", "g4",
    "c3", "d3", "e3", "b2", "d2", "f2", "a1", "d1", "g1",
];

/// Authoritative neighbor table, one row per point: north, east, south, west.
const ADJACENCY: [(&str, [Option<&str>; MAX_NEIGHBORS]); NUM_POINTS] = [
    ("a7", [None, Some("d7"), Some("a4"), None]),
    ("d7", [None, Some("g7"), Some("d6"), Some("a7")]),
    ("g7", [None, None, Some("g4"), Some("d7")]),
    ("b6", [None, Some("d6"), Some("b4"), None]),
    ("d6", [Some("d7"), Some("f6"), Some("d5"), Some("b6")]),
    ("f6", [None, None, Some("f4"), Some("d6")]),
    ("c5", [None, Some("d5"), Some("c4"), None]),
    ("d5", [Some("d6"), Some("e5"), None, Some("c5")]),
    ("e5", [None, None, Some("e4"), Some("d5")]),
    ("a4", [Some("a7"), Some("b4"), Some("a1"), None]),
    ("b4", [Some("b6"), Some("c4"), Some("b2"), Some("a4")]),
    ("c4", [Some("c5"), None, Some("c3"), Some("b4")]),
    ("e4", [Some("e5"), Some("f4"), Some("e3"), None]),
    ("f4", [Some("f6"), Some("g4"), Some("f2"), Some("e4")]),
    ("g4", [Some("g7"), None, Some("g1"), Some("f4")]),
    ("c3", [Some("c4"), Some("d3"), None, None]),
    ("d3", [None, Some("e3"), Some("d2"), Some("c3")]),
    ("e3", [Some("e4"), None, None, Some("d3")]),
    ("b2", [Some("b4"), Some("d2"), None, None]),
    ("d2", [Some("d3"), Some("f2"), Some("d1"), Some("b2")]),
    ("f2", [Some("f4"), None, None, Some("d2")]),
    ("a1", [Some("a4"), Some("d1"), None, None]),
    ("d1", [Some("d2"), Some("g1"), None, Some("a1")]),
    ("g1", [Some("g4"), None, None, Some("d1")]),
];

// =============================================================================
// Directions
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; MAX_NEIGHBORS] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// Point names
// =============================================================================

/// Failure to parse a point or move from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    UnknownPoint(String),
    Malformed(String),
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::UnknownPoint(s) => write!(f, "unknown point '{s}'"),
            NotationError::Malformed(s) => write!(f, "malformed move '{s}'"),
        }
    }
}

impl std::error::Error for NotationError {}

/// Parse a point name such as "a7" or "D3" (case-insensitive).
pub fn parse_point(s: &str) -> Result<Point, NotationError> {
    let lower = s.trim().to_ascii_lowercase();
    POINT_NAMES
        .iter()
        .position(|&name| name == lower)
        .ok_or_else(|| NotationError::UnknownPoint(s.to_string()))
}

/// Canonical name of a point.
///
/// # Panics
/// Panics if `pt` is not a valid arena index.
pub fn point_name(pt: Point) -> &'static str {
    POINT_NAMES[pt]
}

// =============================================================================
// Point sets
// =============================================================================

/// A set of points stored as a 24-bit mask.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PointSet {
    bits: u32,
}

impl PointSet {
    const MASK: u32 = (1 << NUM_POINTS) - 1;

    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn all() -> Self {
        Self { bits: Self::MASK }
    }

    #[inline]
    pub fn contains(self, pt: Point) -> bool {
        self.bits & (1 << pt) != 0
    }

    #[inline]
    pub fn insert(&mut self, pt: Point) {
        self.bits |= 1 << pt;
    }

    #[inline]
    pub fn remove(&mut self, pt: Point) {
        self.bits &= !(1 << pt);
    }

    #[inline]
    pub fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Point> {
        let mut bits = self.bits;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let pt = bits.trailing_zeros() as Point;
            bits &= bits - 1;
            Some(pt)
        })
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut set = PointSet::empty();
        for pt in iter {
            set.insert(pt);
        }
        set
    }
}

impl std::ops::BitOr for PointSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl std::ops::BitAnd for PointSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self {
            bits: self.bits & rhs.bits,
        }
    }
}

impl std::ops::Sub for PointSet {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            bits: self.bits & !rhs.bits,
        }
    }
}

impl std::ops::BitOrAssign for PointSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl fmt::Debug for PointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(point_name)).finish()
    }
}

// =============================================================================
// Topology
// =============================================================================

/// Reason an adjacency table was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    UnknownPoint(String),
    /// Row `index` of the table names a different point than the arena expects.
    MisplacedRow { index: usize, name: String },
    /// `from` lists `to` in `dir`, but `to` does not list `from` in the opposite direction.
    Asymmetric {
        from: &'static str,
        to: &'static str,
        dir: Direction,
    },
    /// A point is connected to fewer than two neighbors.
    Degree { point: &'static str, degree: usize },
    WrongLineCount(usize),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::UnknownPoint(s) => write!(f, "adjacency names unknown point '{s}'"),
            TopologyError::MisplacedRow { index, name } => {
                write!(f, "adjacency row {index} is '{name}', expected '{}'", POINT_NAMES[*index])
            }
            TopologyError::Asymmetric { from, to, dir } => write!(
                f,
                "asymmetric adjacency: {from} has {to} to the {dir:?}, but not the reverse"
            ),
            TopologyError::Degree { point, degree } => {
                write!(f, "point {point} has {degree} neighbors, expected 2 to 4")
            }
            TopologyError::WrongLineCount(n) => {
                write!(f, "found {n} mill lines, expected {NUM_MILL_LINES}")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// Immutable board topology: neighbor arena, mill lines and per-point indexes.
#[derive(Debug, Clone)]
pub struct Topology {
    neighbors: [[Option<Point>; MAX_NEIGHBORS]; NUM_POINTS],
    neighbor_sets: [PointSet; NUM_POINTS],
    lines: Vec<MillLine>,
    /// Indices into `lines` of every line passing through a point.
    lines_through: [Vec<usize>; NUM_POINTS],
    weights: [i32; NUM_POINTS],
}

type AdjacencyRow<'a> = (&'a str, [Option<&'a str>; MAX_NEIGHBORS]);

impl Topology {
    /// The canonical 24-point board, built on first use and shared for the
    /// life of the process.
    pub fn standard() -> &'static Topology {
        static STANDARD: OnceLock<Topology> = OnceLock::new();
        STANDARD.get_or_init(|| {
            Topology::from_table(&ADJACENCY)
                .unwrap_or_else(|e| panic!("compiled-in board topology is corrupt: {e}"))
        })
    }

    /// Build a topology from a name-based neighbor table (north, east, south, west
    /// per row, rows in arena order), validating symmetry.
    pub fn from_table(table: &[AdjacencyRow<'_>; NUM_POINTS]) -> Result<Self, TopologyError> {
        let mut neighbors = [[None; MAX_NEIGHBORS]; NUM_POINTS];
        for (index, (name, row)) in table.iter().enumerate() {
            if *name != POINT_NAMES[index] {
                return Err(TopologyError::MisplacedRow {
                    index,
                    name: name.to_string(),
                });
            }
            for (slot, entry) in row.iter().enumerate() {
                if let Some(other) = entry {
                    let pt = parse_point(other)
                        .map_err(|_| TopologyError::UnknownPoint(other.to_string()))?;
                    neighbors[index][slot] = Some(pt);
                }
            }
        }

        // Fail fast on any one-way edge.
        for from in 0..NUM_POINTS {
            for dir in Direction::ALL {
                if let Some(to) = neighbors[from][dir.index()] {
                    if neighbors[to][dir.opposite().index()] != Some(from) {
                        return Err(TopologyError::Asymmetric {
                            from: POINT_NAMES[from],
                            to: POINT_NAMES[to],
                            dir,
                        });
                    }
                }
            }
        }

        let mut neighbor_sets = [PointSet::empty(); NUM_POINTS];
        let mut weights = [0; NUM_POINTS];
        for pt in 0..NUM_POINTS {
            neighbor_sets[pt] = neighbors[pt].iter().flatten().copied().collect();
            weights[pt] = match neighbor_sets[pt].len() {
                4 => WEIGHT_CROSS,
                3 => WEIGHT_JUNCTION,
                2 => WEIGHT_CORNER,
                degree => {
                    return Err(TopologyError::Degree {
                        point: POINT_NAMES[pt],
                        degree,
                    });
                }
            };
        }

        // A line is centred on any point with neighbors on both opposite sides.
        let mut lines = Vec::with_capacity(NUM_MILL_LINES);
        for (a, b) in [
            (Direction::West, Direction::East),
            (Direction::North, Direction::South),
        ] {
            for mid in 0..NUM_POINTS {
                if let (Some(x), Some(y)) = (neighbors[mid][a.index()], neighbors[mid][b.index()]) {
                    lines.push([x, mid, y]);
                }
            }
        }
        if lines.len() != NUM_MILL_LINES {
            return Err(TopologyError::WrongLineCount(lines.len()));
        }

        let mut lines_through: [Vec<usize>; NUM_POINTS] = std::array::from_fn(|_| Vec::new());
        for (i, line) in lines.iter().enumerate() {
            for &pt in line {
                lines_through[pt].push(i);
            }
        }

        Ok(Topology {
            neighbors,
            neighbor_sets,
            lines,
            lines_through,
            weights,
        })
    }

    /// Neighbors of a point (0 to 4 of them).
    #[inline]
    pub fn neighbors(&self, pt: Point) -> PointSet {
        self.neighbor_sets[pt]
    }

    /// Neighbor in a given direction, if any.
    #[inline]
    pub fn neighbor(&self, pt: Point, dir: Direction) -> Option<Point> {
        self.neighbors[pt][dir.index()]
    }

    #[inline]
    pub fn are_adjacent(&self, a: Point, b: Point) -> bool {
        self.neighbor_sets[a].contains(b)
    }

    /// All mill lines, horizontal lines first, in a fixed order.
    pub fn mill_lines(&self) -> &[MillLine] {
        &self.lines
    }

    /// Mill lines passing through `pt` (two on the standard board).
    pub fn lines_through(&self, pt: Point) -> impl Iterator<Item = &MillLine> + '_ {
        self.lines_through[pt].iter().map(|&i| &self.lines[i])
    }

    /// Positional weight of a point: crosses 2, junctions 1, corners 0.
    #[inline]
    pub fn weight(&self, pt: Point) -> i32 {
        self.weights[pt]
    }
}
