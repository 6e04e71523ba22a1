//! Solver board text: writing a position for fc-solve / black-hole-solve and
//! reading such a board back into an empty layout.
//!
//! ```text
//! Founds: H-3 C-A
//! FC: 8H - -
//! 4C 2C 9C <KS> QS
//! ...
//! ```

use std::collections::HashMap;

use crate::engine::{Card, Position, Rank, StackId, Suit, RANKS};
use crate::error::BoardError;

pub const MAX_ROWS: usize = 10;
/// Black Hole deals seventeen piles.
pub const MAX_BLACK_HOLE_ROWS: usize = 17;
pub const MAX_RESERVES: usize = 8;
pub const MAX_DECKS: u8 = 2;

/// Foundation token ranks: `0` is an empty foundation.
pub(crate) const RANKS0: &str = "0A23456789TJQK";

fn offset_rank(rank: Rank, base: Rank) -> Rank {
    let idx = (i32::from(rank.index()) - i32::from(base.index())).rem_euclid(13);
    Rank::from_index(idx).unwrap_or(rank)
}

fn unoffset_rank(rank: Rank, base: Rank) -> Rank {
    let idx = (i32::from(rank.index()) + i32::from(base.index())).rem_euclid(13);
    Rank::from_index(idx).unwrap_or(rank)
}

/// `<rank><suit>`, ranks counted from `base`.
pub fn card_token(card: &Card, base: Rank) -> String {
    format!("{}{}", offset_rank(card.rank, base).letter(), card.suit.letter())
}

/// `<suit>-<rank>` for the top card of a foundation.
pub fn foundation_token(card: &Card, base: Rank) -> String {
    format!("{}-{}", card.suit.letter(), offset_rank(card.rank, base).letter())
}

fn row_line(cards: &[Card], base: Rank) -> String {
    cards
        .iter()
        .map(|c| {
            let token = card_token(c, base);
            if c.face_up {
                token
            } else {
                format!("<{token}>")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fails when the layout exceeds what the solver integration handles.
pub fn check_limits(table: &Position, max_rows: usize) -> Result<(), BoardError> {
    let rows = table.rows().len();
    if rows > max_rows {
        return Err(BoardError::TooManyStacks {
            what: "rows",
            max: max_rows,
            actual: rows,
        });
    }
    let reserves = table.reserves().len();
    if reserves > MAX_RESERVES {
        return Err(BoardError::TooManyStacks {
            what: "free cells",
            max: MAX_RESERVES,
            actual: reserves,
        });
    }
    if table.decks > MAX_DECKS {
        return Err(BoardError::TooManyStacks {
            what: "decks",
            max: usize::from(MAX_DECKS),
            actual: usize::from(table.decks),
        });
    }
    Ok(())
}

/// fc-solve board. `bottom_foundation_card` reports the first foundation
/// card instead of the top one (Simple Simon presets).
pub fn freecell_board(table: &Position, base: Rank, bottom_foundation_card: bool) -> String {
    let mut board = String::new();

    let founds: Vec<String> = table
        .foundations()
        .iter()
        .filter_map(|&f| {
            let cards = table.view(f).cards;
            let card = if bottom_foundation_card {
                cards.first()
            } else {
                cards.last()
            };
            card.map(|c| foundation_token(c, base))
        })
        .collect();
    if !founds.is_empty() {
        board.push_str("Founds: ");
        board.push_str(&founds.join(" "));
        board.push('\n');
    }

    if !table.reserves().is_empty() {
        let cells: Vec<String> = table
            .reserves()
            .iter()
            .map(|&r| {
                table
                    .view(r)
                    .top()
                    .map_or_else(|| "-".to_string(), |c| card_token(&c, base))
            })
            .collect();
        board.push_str("FC: ");
        board.push_str(&cells.join(" "));
        board.push('\n');
    }

    for &row in table.rows() {
        board.push_str(&row_line(table.view(row).cards, base));
        board.push('\n');
    }
    board
}

/// black-hole-solve board: the single foundation card, then the rows.
pub fn black_hole_board(table: &Position, base: Rank) -> String {
    let top = table
        .foundations()
        .first()
        .and_then(|&f| table.view(f).top())
        .map_or_else(|| "-".to_string(), |c| card_token(&c, base));
    let mut board = format!("Foundations: {top}\n");
    for &row in table.rows() {
        board.push_str(&row_line(table.view(row).cards, base));
        board.push('\n');
    }
    board
}

fn parse_card_token(token: &str, line: usize, base: Rank) -> Result<Card, BoardError> {
    let bad = || BoardError::BadCard {
        line,
        token: token.to_string(),
    };
    let (inner, face_up) = match token.strip_prefix('<') {
        Some(rest) => (rest.strip_suffix('>').ok_or_else(bad)?, false),
        None => (token, true),
    };
    let mut chars = inner.chars();
    let suit = chars.next_back().and_then(Suit::from_letter).ok_or_else(bad)?;
    let rank = Rank::parse(chars.as_str()).ok_or_else(bad)?;
    let mut card = Card::new(suit, unoffset_rank(rank, base));
    card.face_up = face_up;
    Ok(card)
}

/// Deals out duplicates-checked cards while importing.
struct CardPool {
    decks: u8,
    used: HashMap<(Suit, Rank), u8>,
}

impl CardPool {
    fn take(&mut self, mut card: Card) -> Result<Card, BoardError> {
        let count = self.used.entry((card.suit, card.rank)).or_insert(0);
        if *count >= self.decks {
            return Err(BoardError::MissingCard(card.to_string()));
        }
        card.deck = *count;
        *count += 1;
        Ok(card)
    }
}

fn strip_any<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| line.strip_prefix(p))
}

fn import_foundation(
    table: &mut Position,
    pool: &mut CardPool,
    token: &str,
    line: usize,
    base: Rank,
) -> Result<(), BoardError> {
    let bad = || BoardError::BadCard {
        line,
        token: token.to_string(),
    };
    let cards: Vec<Card> = match token.split_once('-') {
        Some((suit, rank)) => {
            let mut suit_chars = suit.chars();
            let suit = suit_chars.next().and_then(Suit::from_letter).ok_or_else(bad)?;
            if suit_chars.next().is_some() {
                return Err(bad());
            }
            let height = RANKS0
                .find(&rank.to_ascii_uppercase())
                .filter(|_| rank.len() == 1)
                .ok_or_else(bad)?;
            RANKS[..height]
                .iter()
                .map(|&r| Card::up(suit, unoffset_rank(r, base)))
                .collect()
        }
        None => vec![parse_card_token(token, line, base)?],
    };
    let Some(&first) = cards.first() else {
        return Ok(());
    };
    let target = table
        .foundations()
        .iter()
        .copied()
        .find(|&f| {
            let view = table.view(f);
            view.is_empty() && view.cap.suit.map_or(true, |s| s == first.suit)
        })
        .ok_or_else(|| BoardError::Malformed {
            line,
            message: format!("no free foundation for `{token}`"),
        })?;
    let taken = cards
        .into_iter()
        .map(|c| pool.take(c))
        .collect::<Result<Vec<_>, _>>()?;
    table.stack_mut(target)?.cards = taken;
    Ok(())
}

/// Fill the empty layout `table` from board text. Every card is checked
/// against `table.decks` copies of a standard deck.
pub fn import_board(table: &mut Position, text: &str, base: Rank) -> Result<(), BoardError> {
    let mut pool = CardPool {
        decks: table.decks.max(1),
        used: HashMap::new(),
    };
    let rows: Vec<StackId> = table.rows().to_vec();
    let reserves: Vec<StackId> = table.reserves().to_vec();
    let mut next_row = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim_end_matches('\r');

        if let Some(rest) = strip_any(raw, &["Foundations:", "Founds:", "Found:"]) {
            for token in rest.split_whitespace() {
                import_foundation(table, &mut pool, token, line, base)?;
            }
            continue;
        }

        if let Some(rest) = strip_any(raw, &["FC:", "Freecells:"]) {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            if tokens.len() > reserves.len() {
                return Err(BoardError::Malformed {
                    line,
                    message: format!("{} free cells listed, layout has {}", tokens.len(), reserves.len()),
                });
            }
            for (&cell, token) in reserves.iter().zip(tokens) {
                if token == "-" {
                    continue;
                }
                let card = pool.take(parse_card_token(token, line, base)?)?;
                table.stack_mut(cell)?.cards = vec![card];
            }
            continue;
        }

        let body = raw.trim_start().strip_prefix(':').unwrap_or(raw);
        let Some(&row) = rows.get(next_row) else {
            if body.trim().is_empty() {
                continue;
            }
            return Err(BoardError::Malformed {
                line,
                message: format!("more row lines than the {} rows of the layout", rows.len()),
            });
        };
        let cards = body
            .split_whitespace()
            .map(|t| parse_card_token(t, line, base).and_then(|c| pool.take(c)))
            .collect::<Result<Vec<_>, _>>()?;
        table.stack_mut(row)?.cards = cards;
        next_row += 1;
    }
    Ok(())
}
