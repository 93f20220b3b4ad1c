//! Line protocol spoken over the control socket.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const SOCKET_PATH: &str = "/tmp/vitrine.sock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Next,
    Previous,
    ResetZoom,
    Goto(usize),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("goto needs a card index, got '{0}'")]
    BadIndex(String),
}

impl FromStr for RemoteCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let head = words.next().ok_or(ParseCommandError::Empty)?;

        match head.to_ascii_lowercase().as_str() {
            "next" => Ok(Self::Next),
            "prev" | "previous" => Ok(Self::Previous),
            "reset" => Ok(Self::ResetZoom),
            "goto" => {
                let arg = words.next().unwrap_or_default();
                arg.parse()
                    .map(Self::Goto)
                    .map_err(|_| ParseCommandError::BadIndex(arg.to_string()))
            }
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => write!(f, "next"),
            Self::Previous => write!(f, "prev"),
            Self::ResetZoom => write!(f, "reset"),
            Self::Goto(i) => write!(f, "goto {}", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cases = vec![
            ("next", RemoteCommand::Next),
            (" PREV ", RemoteCommand::Previous),
            ("previous", RemoteCommand::Previous),
            ("reset", RemoteCommand::ResetZoom),
            ("goto 3", RemoteCommand::Goto(3)),
        ];

        for (line, expected) in cases {
            assert_eq!(line.parse::<RemoteCommand>().unwrap(), expected);
            assert_eq!(expected.to_string().parse::<RemoteCommand>().unwrap(), expected);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<RemoteCommand>(), Err(ParseCommandError::Empty));
        assert_eq!(
            "goto x".parse::<RemoteCommand>(),
            Err(ParseCommandError::BadIndex("x".into()))
        );
        assert_eq!(
            "goto".parse::<RemoteCommand>(),
            Err(ParseCommandError::BadIndex("".into()))
        );
        assert_eq!(
            "show".parse::<RemoteCommand>(),
            Err(ParseCommandError::Unknown("show".into()))
        );
    }
}
