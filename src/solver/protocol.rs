//! Line grammar of the solver transcripts.
//!
//! Every output line maps to one `SolverLine`; unknown text becomes a
//! `Diagnostic` rather than being skipped. A `Move` line that does not
//! follow the grammar, or a garbled board echo, is an error: replaying a
//! solution with a hole in it would leave the position out of sync.

use std::io::BufRead;

use crate::engine::{Rank, Suit};
use crate::error::ProtocolError;

use super::board::RANKS0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverOutcome {
    Solved,
    Unsolved,
    Intractable,
}

/// A stack as the solver names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Stack(usize),
    Freecell(usize),
    Foundations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverMove {
    pub ncards: usize,
    pub from: Place,
    pub to: Place,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    StatesChecked(u64),
    StatesGenerated(u64),
    Iteration(u64),
    Depth(u64),
    StoredStates(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverLine {
    Blank,
    Separator,
    Status(SolverOutcome),
    Stat(Stat),
    /// `Foundations: H-0 C-3 ...` as (suit, height) pairs.
    Foundations(Vec<(Suit, usize)>),
    /// `Freecells: 8H - -`, tokens normalised to `<rank letter><suit>`.
    Freecells(Vec<Option<String>>),
    Row(Vec<String>),
    Move(SolverMove),
    Diagnostic(String),
}

/// Board state printed by the solver between moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardEcho {
    pub foundations: Vec<(Suit, usize)>,
    pub freecells: Vec<Option<String>>,
    pub rows: Vec<Vec<String>>,
}

/// A move plus the board echo printed before it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMove {
    pub mv: SolverMove,
    pub board: Option<BoardEcho>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    /// `None` when the output ended without a verdict.
    pub outcome: Option<SolverOutcome>,
    pub moves: Vec<RecordedMove>,
    pub states_checked: Option<u64>,
    pub diagnostics: Vec<String>,
}

fn number_after(text: &str, prefix: &str, suffix: &str) -> Option<u64> {
    text.strip_prefix(prefix)?
        .strip_suffix(suffix)?
        .trim()
        .parse()
        .ok()
}

fn colon_stat(text: &str, key: &str) -> Option<u64> {
    text.strip_prefix(key)?.strip_prefix(':')?.trim().parse().ok()
}

fn status(text: &str) -> Option<SolverOutcome> {
    if text.starts_with("This game is solveable") || text.starts_with("Solved!") {
        Some(SolverOutcome::Solved)
    } else if text.starts_with("I could not solve this game") || text.starts_with("Unsolved!") {
        Some(SolverOutcome::Unsolved)
    } else if text.starts_with("Iterations count exceeded") || text.starts_with("Intractable!") {
        Some(SolverOutcome::Intractable)
    } else {
        None
    }
}

fn stat(text: &str) -> Option<Stat> {
    if let Some(n) = number_after(text, "Total number of states checked is", ".") {
        return Some(Stat::StatesChecked(n));
    }
    if let Some(n) = number_after(text, "This scan generated", "states.") {
        return Some(Stat::StatesGenerated(n));
    }
    colon_stat(text, "Iteration")
        .map(Stat::Iteration)
        .or_else(|| colon_stat(text, "Depth").map(Stat::Depth))
        .or_else(|| colon_stat(text, "Stored-States").map(Stat::StoredStates))
}

/// `8H`, `10H` or `TH` to the canonical `8H` / `TH` form.
fn echo_card(token: &str) -> Option<String> {
    let mut chars = token.chars();
    let suit = chars.next_back().and_then(Suit::from_letter)?;
    let rank = Rank::parse(chars.as_str())?;
    Some(format!("{}{}", rank.letter(), suit.letter()))
}

fn echo_foundation(token: &str) -> Option<(Suit, usize)> {
    let (suit, rank) = token.split_once('-')?;
    let mut suit_chars = suit.chars();
    let suit = suit_chars.next().and_then(Suit::from_letter)?;
    if suit_chars.next().is_some() {
        return None;
    }
    let height = if rank == "10" {
        10
    } else if rank.len() == 1 {
        RANKS0.find(&rank.to_ascii_uppercase())?
    } else {
        return None;
    };
    Some((suit, height))
}

fn place(kind: &str, index: &str) -> Option<Place> {
    let index = index.parse().ok()?;
    match kind {
        "stack" | "Stack" => Some(Place::Stack(index)),
        "freecell" => Some(Place::Freecell(index)),
        _ => None,
    }
}

/// Body of a `Move ...` line, without the leading `Move `.
fn move_body(body: &str) -> Option<SolverMove> {
    if let Some(rest) = body.strip_prefix("the sequence on top of Stack ") {
        let (index, tail) = rest.split_once(' ')?;
        if !tail.starts_with("to the foundations") {
            return None;
        }
        return Some(SolverMove {
            ncards: 13,
            from: Place::Stack(index.parse().ok()?),
            to: Place::Foundations,
        });
    }

    let words: Vec<&str> = body.split_whitespace().collect();
    let (ncards, rest) = match words.as_slice() {
        ["a", "card", rest @ ..] => (1, rest),
        [n, "cards", rest @ ..] => (n.parse::<usize>().ok()?, rest),
        _ => return None,
    };
    let (from, rest) = match rest {
        ["from", kind, index, rest @ ..] => (place(kind, index)?, rest),
        _ => return None,
    };
    let to = match rest {
        ["to", "the", "foundations", ..] => Place::Foundations,
        ["to", kind, index, ..] => place(kind, index)?,
        _ => return None,
    };
    Some(SolverMove { ncards, from, to })
}

/// Classify one output line; `line_no` is 1-based and only used for errors.
pub fn parse_line(line_no: usize, raw: &str) -> Result<SolverLine, ProtocolError> {
    let text = raw.trim_end();
    if text.trim().is_empty() {
        return Ok(SolverLine::Blank);
    }
    if text.starts_with("-=-=") || text.starts_with("====") {
        return Ok(SolverLine::Separator);
    }
    if let Some(outcome) = status(text) {
        return Ok(SolverLine::Status(outcome));
    }
    if let Some(s) = stat(text) {
        return Ok(SolverLine::Stat(s));
    }

    let bad_echo = || ProtocolError::BadEcho {
        line: line_no,
        text: text.to_string(),
    };
    if let Some(body) = text.strip_prefix("Move ") {
        return move_body(body)
            .map(SolverLine::Move)
            .ok_or_else(|| ProtocolError::BadMove {
                line: line_no,
                text: text.to_string(),
            });
    }
    if let Some(rest) = text.strip_prefix("Foundations:") {
        // black-hole-solve prints a single card here
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if tokens.iter().all(|t| !t.contains('-') || t.len() == 1) {
            return Ok(SolverLine::Diagnostic(text.to_string()));
        }
        return tokens
            .iter()
            .map(|t| echo_foundation(t))
            .collect::<Option<Vec<_>>>()
            .map(SolverLine::Foundations)
            .ok_or_else(bad_echo);
    }
    if let Some(rest) = text.strip_prefix("Freecells:") {
        return rest
            .split_whitespace()
            .map(|t| if t == "-" { Some(None) } else { echo_card(t).map(Some) })
            .collect::<Option<Vec<_>>>()
            .map(SolverLine::Freecells)
            .ok_or_else(bad_echo);
    }
    if let Some(rest) = text.strip_prefix(':') {
        return rest
            .split_whitespace()
            .map(echo_card)
            .collect::<Option<Vec<_>>>()
            .map(SolverLine::Row)
            .ok_or_else(bad_echo);
    }
    Ok(SolverLine::Diagnostic(text.to_string()))
}

/// Read a whole transcript. The first verdict line wins.
pub fn read_transcript<R: BufRead>(reader: R) -> Result<Transcript, ProtocolError> {
    let mut transcript = Transcript::default();
    let mut echo: Option<BoardEcho> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(idx + 1, &line)? {
            SolverLine::Blank | SolverLine::Separator => {}
            SolverLine::Status(outcome) => {
                transcript.outcome.get_or_insert(outcome);
            }
            SolverLine::Stat(Stat::StatesChecked(n)) => transcript.states_checked = Some(n),
            SolverLine::Stat(_) => {}
            SolverLine::Foundations(f) => {
                echo = Some(BoardEcho {
                    foundations: f,
                    ..BoardEcho::default()
                });
            }
            SolverLine::Freecells(cells) => echo.get_or_insert_with(BoardEcho::default).freecells = cells,
            SolverLine::Row(cards) => echo.get_or_insert_with(BoardEcho::default).rows.push(cards),
            SolverLine::Move(mv) => transcript.moves.push(RecordedMove {
                mv,
                board: echo.take(),
            }),
            SolverLine::Diagnostic(text) => transcript.diagnostics.push(text),
        }
    }
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_move_lines() {
        let parse = |s: &str| parse_line(1, s).unwrap();
        assert_eq!(
            parse("Move a card from stack 3 to the foundations"),
            SolverLine::Move(SolverMove {
                ncards: 1,
                from: Place::Stack(3),
                to: Place::Foundations
            })
        );
        assert_eq!(
            parse("Move 4 cards from stack 0 to stack 7"),
            SolverLine::Move(SolverMove {
                ncards: 4,
                from: Place::Stack(0),
                to: Place::Stack(7)
            })
        );
        assert_eq!(
            parse("Move a card from freecell 2 to stack 1 "),
            SolverLine::Move(SolverMove {
                ncards: 1,
                from: Place::Freecell(2),
                to: Place::Stack(1)
            })
        );
        assert_eq!(
            parse("Move the sequence on top of Stack 5 to the foundations"),
            SolverLine::Move(SolverMove {
                ncards: 13,
                from: Place::Stack(5),
                to: Place::Foundations
            })
        );
        assert!(matches!(
            parse_line(9, "Move a card from the moon to stack 1"),
            Err(ProtocolError::BadMove { line: 9, .. })
        ));
    }

    #[test]
    fn test_status_stats_and_echo() {
        let parse = |s: &str| parse_line(1, s).unwrap();
        assert_eq!(parse("This game is solveable."), SolverLine::Status(SolverOutcome::Solved));
        assert_eq!(parse("Intractable!"), SolverLine::Status(SolverOutcome::Intractable));
        assert_eq!(
            parse("I could not solve this game."),
            SolverLine::Status(SolverOutcome::Unsolved)
        );
        assert_eq!(
            parse("Total number of states checked is 1234."),
            SolverLine::Stat(Stat::StatesChecked(1234))
        );
        assert_eq!(parse("Iteration: 7"), SolverLine::Stat(Stat::Iteration(7)));
        assert_eq!(
            parse("Foundations: H-0 C-A D-10 S-K"),
            SolverLine::Foundations(vec![
                (Suit::Hearts, 0),
                (Suit::Clubs, 1),
                (Suit::Diamonds, 10),
                (Suit::Spades, 13)
            ])
        );
        assert_eq!(
            parse("Freecells:  10H  -  JC"),
            SolverLine::Freecells(vec![Some("TH".into()), None, Some("JC".into())])
        );
        assert_eq!(
            parse(": 4C 2C 9C"),
            SolverLine::Row(vec!["4C".into(), "2C".into(), "9C".into()])
        );
        assert_eq!(
            parse("Foundations: 8S"),
            SolverLine::Diagnostic("Foundations: 8S".into())
        );
        assert_eq!(parse("-=-=-=-=-=-=-"), SolverLine::Separator);
        assert_eq!(parse("fc-solve: some note"), SolverLine::Diagnostic("fc-solve: some note".into()));
    }

    #[test]
    fn test_transcript_attaches_echo_to_next_move() {
        let text = "\
-=-=-=-=-=-=-=-=-=-=-=-

Foundations: H-0 C-0 D-0 S-0
Freecells:  8H  -
: 4C
: 2D

====================

Move a card from freecell 0 to stack 1
Move a card from stack 0 to the foundations

This game is solveable.
Total number of states checked is 42.
This scan generated 57 states.
";
        let t = read_transcript(text.as_bytes()).unwrap();
        assert_eq!(t.outcome, Some(SolverOutcome::Solved));
        assert_eq!(t.states_checked, Some(42));
        assert_eq!(t.moves.len(), 2);
        let echo = t.moves[0].board.as_ref().unwrap();
        assert_eq!(echo.freecells, vec![Some("8H".to_string()), None]);
        assert_eq!(echo.rows.len(), 2);
        assert!(t.moves[1].board.is_none());
    }

    #[test]
    fn test_truncated_transcript_has_no_outcome() {
        let t = read_transcript("Move a card from stack 0 to stack 1\n".as_bytes()).unwrap();
        assert_eq!(t.outcome, None);
        assert_eq!(t.moves.len(), 1);
    }
}
