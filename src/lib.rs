//! Morris-Rust: a Nine Men's Morris engine.
//!
//! This crate provides the board topology, rules and a depth-limited
//! alpha-beta search for Nine Men's Morris, plus a match controller and a
//! line-oriented text protocol for driving it.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, evaluation weights and search defaults
//! - [`board`] - Points, adjacency and mill lines of the standard board
//! - [`position`] - Players, phases, moves and the do/undo board state
//! - [`movegen`] - Legal move generation, mills and capture targets
//! - [`eval`] - Static evaluation at the search frontier
//! - [`search`] - Alpha-beta search with a random tie-break at the root
//! - [`game`] - Live game: move validation, turns, win and draw detection
//! - [`agent`] - Human and engine players, and the match loop
//! - [`protocol`] - Text protocol server
//!
//! ## Example
//!
//! ```
//! use morris_rust::game::Game;
//! use morris_rust::search::Searcher;
//!
//! // Create a new game
//! let mut game = Game::default();
//!
//! // Play a move
//! let mv = game.parse_move("d6").unwrap();
//! game.apply_move(&mv).unwrap();
//!
//! // Search for the best response
//! let result = Searcher::with_seed(1)
//!     .best_move(game.position(), game.to_move(), 2)
//!     .unwrap();
//! println!("Best move: {}", result.best);
//! ```

pub mod agent;
pub mod board;
pub mod constants;
pub mod eval;
pub mod game;
pub mod movegen;
pub mod position;
pub mod protocol;
pub mod search;
