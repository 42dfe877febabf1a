//! Line-oriented text protocol for driving the engine from a UI or script.
//!
//! Framing follows GTP: each request is an optional numeric id, a command and
//! its arguments; each reply is `=id payload` on success or `?id message` on
//! failure, followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version` - Engine identification
//! - `list_commands`, `known_command <cmd>` - Command discovery
//! - `quit` - Exit the loop
//! - `clear_board` - Start a new game
//! - `showboard` - ASCII diagram of the position
//! - `play <move>` - Apply a move for the side to move (`d6`, `a1-a4`, `d6xg7`)
//! - `genmove [depth]` - Search, play and print a move for the side to move
//! - `legal_moves` - Legal moves of the side to move
//! - `phase <1|2>` - Phase of a player
//! - `is_game_over <1|2>` - Whether a player has lost on material
//! - `winner` - `1`, `2`, `draw` or `none`
//! - `depth <n>` - Set the default search depth
//! - `undo` - Take back the last move
//!
//! ## Example
//!
//! ```
//! use morris_rust::protocol::ProtocolServer;
//!
//! let mut server = ProtocolServer::with_seed(7);
//! let mut out = Vec::new();
//! server.run(&b"1 play d6\n2 legal_moves\nquit\n"[..], &mut out).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("=1 \n\n=2 "));
//! ```

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::game::{Game, GameStatus};
use crate::position::Player;
use crate::search::{SearchConfig, SearchError, Searcher};

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "clear_board",
    "depth",
    "genmove",
    "is_game_over",
    "known_command",
    "legal_moves",
    "list_commands",
    "name",
    "phase",
    "play",
    "protocol_version",
    "quit",
    "showboard",
    "undo",
    "version",
    "winner",
];

/// Protocol session state.
pub struct ProtocolServer {
    game: Game<'static>,
    searcher: Searcher,
    config: SearchConfig,
}

impl Default for ProtocolServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolServer {
    pub fn new() -> Self {
        Self::with_parts(Game::default(), Searcher::new(), SearchConfig::default())
    }

    /// Server whose engine tie-break is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_parts(Game::default(), Searcher::with_seed(seed), SearchConfig::default())
    }

    pub fn with_parts(game: Game<'static>, searcher: Searcher, config: SearchConfig) -> Self {
        Self {
            game,
            searcher,
            config,
        }
    }

    pub fn game(&self) -> &Game<'static> {
        &self.game
    }

    /// Serve requests from stdin until `quit` or end of input.
    pub fn run_stdio(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }

    /// Serve requests from `input`, writing replies to `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            debug!(%command, ?args, "request");
            let (success, message) = self.execute(&command, args);
            if !success {
                warn!(%command, %message, "request failed");
            }

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            write!(output, "{prefix}{id_str} {message}\n\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    fn parse_player(args: &[&str]) -> Result<Player, String> {
        let arg = args.first().ok_or("missing argument")?;
        arg.parse::<u8>()
            .ok()
            .and_then(Player::from_id)
            .ok_or_else(|| format!("invalid player '{arg}', expected 1 or 2"))
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match self.dispatch(command, args) {
            Ok(message) => (true, message),
            Err(message) => (false, message),
        }
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<String, String> {
        match command {
            "name" => Ok(env!("CARGO_PKG_NAME").to_string()),

            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => Ok("1".to_string()),

            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let cmd = args.first().ok_or("missing argument")?;
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                Ok(known.to_string())
            }

            "quit" => Ok(String::new()),

            "clear_board" => {
                self.game.reset();
                Ok(String::new())
            }

            "showboard" => Ok(format!("\n{}", self.game.position())),

            "play" => {
                let text = args.first().ok_or("missing argument")?;
                let mv = self.game.parse_move(text).map_err(|e| e.to_string())?;
                self.game.apply_move(&mv).map_err(|e| format!("illegal move: {e}"))?;
                Ok(String::new())
            }

            "genmove" => {
                let player = self.game.to_move();
                let depth = match args.first() {
                    Some(arg) => arg
                        .parse::<u32>()
                        .map_err(|_| format!("invalid depth '{arg}'"))?,
                    None => self.config.depth_for(self.game.phase_of(player)),
                };
                if self.game.status() != GameStatus::InProgress {
                    return Err("game is over".to_string());
                }
                let result = self
                    .searcher
                    .best_move(self.game.position(), player, depth)
                    .map_err(|e| match e {
                        SearchError::NoLegalMoves(_) => format!("internal error: {e}"),
                        _ => e.to_string(),
                    })?;
                self.game
                    .apply_move(&result.best)
                    .map_err(|e| format!("internal error: engine move rejected: {e}"))?;
                Ok(result.best.to_string())
            }

            "legal_moves" => {
                let moves: Vec<String> = self
                    .game
                    .legal_moves(self.game.to_move())
                    .iter()
                    .map(|m| m.to_string())
                    .collect();
                Ok(moves.join(" "))
            }

            "phase" => {
                let player = Self::parse_player(args)?;
                Ok(self.game.phase_of(player).to_string())
            }

            "is_game_over" => {
                let player = Self::parse_player(args)?;
                Ok(self.game.is_game_over(player).to_string())
            }

            "winner" => Ok(match self.game.status() {
                GameStatus::Won(player) => player.id().to_string(),
                GameStatus::Draw => "draw".to_string(),
                GameStatus::InProgress => "none".to_string(),
            }),

            "depth" => {
                let arg = args.first().ok_or("missing argument")?;
                let depth = arg
                    .parse::<u32>()
                    .map_err(|_| format!("invalid depth '{arg}'"))?;
                self.config =
                    SearchConfig::new(depth, self.config.flying_bonus).map_err(|e| e.to_string())?;
                Ok(String::new())
            }

            "undo" => self
                .game
                .undo_last()
                .map(|mv| mv.to_string())
                .ok_or_else(|| "nothing to undo".to_string()),

            _ => Err(format!("unknown command: {command}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = ProtocolServer::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = ProtocolServer::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut server = ProtocolServer::new();
        let (success, response) = server.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "morris-rust");
    }

    #[test]
    fn test_known_command() {
        let mut server = ProtocolServer::new();

        let (success, response) = server.execute("known_command", &["genmove"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = server.execute("known_command", &["boardsize"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_play_and_clear() {
        let mut server = ProtocolServer::new();

        let (success, _) = server.execute("play", &["d6"]);
        assert!(success);
        assert_eq!(server.game().ply(), 1);

        let (success, response) = server.execute("play", &["d6"]);
        assert!(!success);
        assert!(response.contains("occupied"), "{response}");

        let (success, _) = server.execute("clear_board", &[]);
        assert!(success);
        assert_eq!(server.game().ply(), 0);
    }

    #[test]
    fn test_genmove_plays_for_side_to_move() {
        let mut server = ProtocolServer::with_seed(11);
        server.execute("play", &["d6"]);
        let (success, response) = server.execute("genmove", &["1"]);
        assert!(success, "{response}");
        assert_eq!(server.game().ply(), 2);
        assert_eq!(server.game().to_move(), Player::One);
    }

    #[test]
    fn test_depth_zero_rejected() {
        let mut server = ProtocolServer::new();
        let (success, _) = server.execute("depth", &["0"]);
        assert!(!success);
        let (success, _) = server.execute("genmove", &["0"]);
        assert!(!success);
        assert_eq!(server.game().ply(), 0);
    }

    #[test]
    fn test_phase_and_winner() {
        let mut server = ProtocolServer::new();
        assert_eq!(server.execute("phase", &["2"]), (true, "placing".to_string()));
        assert!(!server.execute("phase", &["3"]).0);
        assert_eq!(server.execute("winner", &[]), (true, "none".to_string()));
        assert_eq!(server.execute("is_game_over", &["1"]), (true, "false".to_string()));
    }

    #[test]
    fn test_undo() {
        let mut server = ProtocolServer::new();
        assert!(!server.execute("undo", &[]).0);
        server.execute("play", &["a7"]);
        assert_eq!(server.execute("undo", &[]), (true, "a7".to_string()));
    }

    #[test]
    fn test_run_frames_replies() {
        let mut server = ProtocolServer::new();
        let mut out = Vec::new();
        server
            .run(&b"# comment\n5 play a7\nbogus\nquit\nplay d7\n"[..], &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "=5 \n\n? unknown command: bogus\n\n= \n\n");
        assert_eq!(server.game().ply(), 1);
    }
}
