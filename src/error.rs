use std::io;

use thiserror::Error;

use crate::engine::StackId;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("a position can hold only one talon")]
    DuplicateTalon,
    #[error("stack {0} does not exist in this position")]
    UnknownStack(StackId),
}

/// Setup-time failures of the solver board integration.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("solver supports at most {max} {what}, layout has {actual}")]
    TooManyStacks {
        what: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("black hole solver needs exactly one foundation, layout has {0}")]
    FoundationCount(usize),
    #[error("line {line}: bad card token `{token}`")]
    BadCard { line: usize, token: String },
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("card {0} is not available in the deck")]
    MissingCard(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("hint references stack {0} which is not in the position")]
    UnknownStack(StackId),
    #[error("stack {stack} holds {held} cards, hint moves {wanted}")]
    NotEnoughCards {
        stack: StackId,
        held: usize,
        wanted: usize,
    },
    #[error("move hint has no destination")]
    MissingTarget,
    #[error("talon cannot deal")]
    CannotDeal,
    #[error("top card of stack {0} is already face up")]
    NothingToFlip(StackId),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("line {line}: malformed move `{text}`")]
    BadMove { line: usize, text: String },
    #[error("line {line}: malformed board echo `{text}`")]
    BadEcho { line: usize, text: String },
    #[error("reading solver output: {0}")]
    Io(#[from] io::Error),
}

/// Reasons a single solver run produced no transcript.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("failed to run `{command}`: {source}")]
    Spawn { command: String, source: io::Error },
    #[error("solver pipe: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
