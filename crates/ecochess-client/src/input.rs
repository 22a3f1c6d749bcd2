//! Line-oriented command input.
//!
//! Each stdin line is one command: a square (`e2`, or `click e2`), a shop
//! choice (`buy n`, `shop knight`), `help`, or `quit`.

use std::io::BufRead;
use std::thread;

use ecochess_model::{PieceKind, Square};
use ecochess_sync::UserCommand;
use tokio::sync::mpsc;

pub const HELP: &str = "\
Commands:
  e2 | click e2        select a piece, a target square, or a drop square
  buy n | shop knight  choose a piece to buy (p n b r q)
  help                 show this text
  quit                 leave the client";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(UserCommand),
    Help,
    Empty,
}

/// Why a line could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("unknown square `{0}`")]
    Square(String),
    #[error("unknown piece `{0}`, expected one of p n b r q")]
    Piece(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(String),
    #[error("unknown command `{0}`, type `help`")]
    Unknown(String),
}

pub fn parse_line(line: &str) -> Result<Input, InputError> {
    let lowered = line.trim().to_ascii_lowercase();
    let mut words = lowered.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Input::Empty);
    };
    let arg = words.next();

    let command = match head {
        "quit" | "exit" | "q" => UserCommand::Quit,
        "help" | "?" => return Ok(Input::Help),
        "click" | "c" => {
            let arg = arg.ok_or_else(|| InputError::MissingArgument(head.to_string()))?;
            UserCommand::Click(parse_square(arg)?)
        }
        "buy" | "shop" | "b" => {
            let arg = arg.ok_or_else(|| InputError::MissingArgument(head.to_string()))?;
            UserCommand::Shop(parse_kind(arg)?)
        }
        other => match other.parse::<Square>() {
            Ok(square) => UserCommand::Click(square),
            Err(_) => return Err(InputError::Unknown(other.to_string())),
        },
    };
    Ok(Input::Command(command))
}

fn parse_square(text: &str) -> Result<Square, InputError> {
    text.parse()
        .map_err(|_| InputError::Square(text.to_string()))
}

fn parse_kind(text: &str) -> Result<PieceKind, InputError> {
    let mut chars = text.chars();
    let by_letter = match (chars.next(), chars.next()) {
        (Some(letter), None) => PieceKind::from_letter(letter),
        _ => None,
    };
    by_letter
        .or_else(|| {
            PieceKind::ALL
                .into_iter()
                .find(|kind| kind.to_string() == text)
        })
        .ok_or_else(|| InputError::Piece(text.to_string()))
}

/// Read stdin on a dedicated thread and forward commands to the session.
///
/// Blocking reads stay off the runtime so shutdown never waits on the
/// terminal. The thread ends on EOF, on `quit`, or when the session is gone;
/// dropping the sender then ends the session loop.
pub fn spawn_stdin_reader(commands: mpsc::Sender<UserCommand>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("stdin read failed: {e}");
                        break;
                    }
                };
                match parse_line(&line) {
                    Ok(Input::Command(command)) => {
                        let quit = command == UserCommand::Quit;
                        if commands.blocking_send(command).is_err() || quit {
                            break;
                        }
                    }
                    Ok(Input::Help) => println!("{HELP}"),
                    Ok(Input::Empty) => {}
                    Err(e) => eprintln!("{e}"),
                }
            }
            tracing::debug!("stdin reader finished");
        })?;
    Ok(())
}
