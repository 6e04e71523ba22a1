//! Card and stack model consumed by the hint engine.
//! Stacks carry a capability record plus pluggable rules; the engine only reads them.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::LayoutError;

pub const SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
pub const RANKS: [Rank; 13] = [
    Rank::Ace,
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
];

const RANK_LETTERS: &[u8; 13] = b"A23456789TJQK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardColor {
    Red,
    Black,
}

impl Suit {
    pub const fn color(self) -> CardColor {
        match self {
            Suit::Hearts | Suit::Diamonds => CardColor::Red,
            Suit::Spades | Suit::Clubs => CardColor::Black,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Spades => 'S',
            Suit::Hearts => 'H',
            Suit::Diamonds => 'D',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'C' => Some(Suit::Clubs),
            'S' => Some(Suit::Spades),
            'H' => Some(Suit::Hearts),
            'D' => Some(Suit::Diamonds),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Ace = 1,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    /// Zero-based rank (Ace = 0, King = 12).
    #[inline]
    pub const fn index(self) -> u8 {
        (self as u8) - 1
    }

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| RANKS.get(i).copied())
    }

    pub fn letter(self) -> char {
        RANK_LETTERS[self.index() as usize] as char
    }

    /// Accepts `A23456789TJQK` letters and the two-digit `10`.
    pub fn parse(token: &str) -> Option<Self> {
        if token == "10" {
            return Some(Rank::Ten);
        }
        let mut chars = token.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() {
            return None;
        }
        RANK_LETTERS
            .iter()
            .position(|&b| b as char == letter)
            .and_then(|i| RANKS.get(i).copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
    pub deck: u8,
    pub face_up: bool,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self {
            suit,
            rank,
            deck: 0,
            face_up: false,
        }
    }

    pub fn up(suit: Suit, rank: Rank) -> Self {
        Self {
            face_up: true,
            ..Self::new(suit, rank)
        }
    }

    #[inline]
    pub const fn color(&self) -> CardColor {
        self.suit.color()
    }

    /// Same rank and suit, ignoring deck and orientation.
    pub fn same_face(&self, other: &Card) -> bool {
        self.suit == other.suit && self.rank == other.rank
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.letter(), self.suit.letter())
    }
}

/// Index of a stack inside its `Position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackId(pub usize);

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackRole {
    Talon,
    Waste,
    Foundation,
    Row,
    Reserve,
}

/// Static capability record of a stack. `None` means "any".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub suit: Option<Suit>,
    pub color: Option<CardColor>,
    pub rank: Option<Rank>,
    pub base_suit: Option<Suit>,
    pub base_color: Option<CardColor>,
    pub base_rank: Option<Rank>,
    pub dir: i32,
    pub modulus: i32,
    pub max_move: usize,
    pub max_accept: usize,
    pub max_cards: usize,
    pub min_move: usize,
    pub min_accept: usize,
    pub min_cards: usize,
}

impl Default for Capability {
    fn default() -> Self {
        Self {
            suit: None,
            color: None,
            rank: None,
            base_suit: None,
            base_color: None,
            base_rank: None,
            dir: 0,
            modulus: 8192,
            max_move: 0,
            max_accept: 0,
            max_cards: 999_999,
            min_move: 1,
            min_accept: 1,
            min_cards: 0,
        }
    }
}

impl Capability {
    /// True when `next` follows `prev` in this stack's build direction.
    #[inline]
    pub fn follows(&self, prev: Rank, next: Rank) -> bool {
        (i32::from(prev.index()) + self.dir).rem_euclid(self.modulus) == i32::from(next.index())
    }

    /// Signed distance of `rank` from the base rank, folded into `(-mod/2, mod/2]`.
    pub fn base_distance(&self, rank: Rank) -> Option<i32> {
        let base = self.base_rank?;
        let mut d = (i32::from(rank.index()) - i32::from(base.index())).rem_euclid(self.modulus);
        if d > self.modulus / 2 {
            d -= self.modulus;
        }
        Some(d)
    }

    /// Limits, orientation and base-card checks shared by every accepting stack.
    pub fn basic_accepts(&self, stack: StackRef<'_>, from: StackRef<'_>, cards: &[Card]) -> bool {
        if from.id == stack.id {
            return false;
        }
        let n = cards.len();
        if n < self.min_accept || n > self.max_accept {
            return false;
        }
        if n + stack.cards.len() > self.max_cards {
            return false;
        }
        for c in cards {
            if !c.face_up {
                return false;
            }
            if self.suit.is_some_and(|s| s != c.suit) {
                return false;
            }
            if self.color.is_some_and(|col| col != c.color()) {
                return false;
            }
            if self.rank.is_some_and(|r| r != c.rank) {
                return false;
            }
        }
        match (stack.cards.last(), cards.first()) {
            (Some(top), _) => top.face_up,
            (None, Some(first)) => {
                self.base_suit.map_or(true, |s| s == first.suit)
                    && self.base_color.map_or(true, |col| col == first.color())
                    && self.base_rank.map_or(true, |r| r == first.rank)
            }
            (None, None) => false,
        }
    }

    pub fn basic_can_move(&self, stack: StackRef<'_>, cards: &[Card]) -> bool {
        let n = cards.len();
        if n < self.min_move || n > self.max_move {
            return false;
        }
        if stack.cards.len() < n || stack.cards.len() - n < self.min_cards {
            return false;
        }
        !cards.is_empty() && cards.iter().all(|c| c.face_up)
    }
}

/// Per-game rule set. Implementations live outside the engine (see `rules`).
///
/// Every method receives the live `Position` as context plus a `StackRef`
/// describing the stack being asked, which may be a `ClonedStack` view.
pub trait StackRules: fmt::Debug + Send + Sync {
    fn accepts_cards(
        &self,
        _table: &Position,
        stack: StackRef<'_>,
        from: StackRef<'_>,
        cards: &[Card],
    ) -> bool {
        stack.cap.basic_accepts(stack, from, cards)
    }

    fn can_move_cards(&self, _table: &Position, stack: StackRef<'_>, cards: &[Card]) -> bool {
        stack.cap.basic_can_move(stack, cards)
    }

    fn can_flip_card(&self, stack: StackRef<'_>) -> bool {
        stack.cards.last().is_some_and(|c| !c.face_up)
    }

    /// Foundation that would take the top card(s), and how many cards.
    fn can_drop_cards(
        &self,
        table: &Position,
        stack: StackRef<'_>,
        foundations: &[StackId],
    ) -> Option<(StackId, usize)> {
        drop_top_card(table, stack, foundations)
    }

    fn can_deal_cards(&self, _table: &Position, _stack: StackRef<'_>) -> bool {
        false
    }
}

/// Open-stack drop: the single top card onto the first accepting foundation.
pub fn drop_top_card(
    table: &Position,
    stack: StackRef<'_>,
    foundations: &[StackId],
) -> Option<(StackId, usize)> {
    let top = stack.cards.len().checked_sub(1)?;
    let cards = &stack.cards[top..];
    if !stack.can_move_cards(table, cards) {
        return None;
    }
    foundations
        .iter()
        .copied()
        .filter(|&f| f != stack.id)
        .find(|&f| table.view(f).accepts_cards(table, stack, cards))
        .map(|f| (f, 1))
}

/// Borrowed, read-only view of a stack (real or cloned).
#[derive(Debug, Clone, Copy)]
pub struct StackRef<'a> {
    pub id: StackId,
    pub role: StackRole,
    pub cap: &'a Capability,
    pub rules: &'a dyn StackRules,
    pub cards: &'a [Card],
}

impl<'a> StackRef<'a> {
    #[inline]
    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn accepts_cards(&self, table: &Position, from: StackRef<'_>, cards: &[Card]) -> bool {
        self.rules.accepts_cards(table, *self, from, cards)
    }

    pub fn can_move_cards(&self, table: &Position, cards: &[Card]) -> bool {
        self.rules.can_move_cards(table, *self, cards)
    }

    pub fn can_flip_card(&self) -> bool {
        self.rules.can_flip_card(*self)
    }

    pub fn can_drop_cards(
        &self,
        table: &Position,
        foundations: &[StackId],
    ) -> Option<(StackId, usize)> {
        self.rules.can_drop_cards(table, *self, foundations)
    }

    pub fn can_deal_cards(&self, table: &Position) -> bool {
        self.rules.can_deal_cards(table, *self)
    }

    /// Largest movable pile on top of the stack.
    pub fn get_pile(&self, table: &Position) -> Option<&'a [Card]> {
        if self.cap.max_move == 0 {
            return None;
        }
        let start = self.cards.len().saturating_sub(self.cap.max_move);
        let mut pile = &self.cards[start..];
        while !pile.is_empty() && pile.len() >= self.cap.min_move {
            if self.can_move_cards(table, pile) {
                return Some(pile);
            }
            pile = &pile[1..];
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct Stack {
    pub id: StackId,
    pub role: StackRole,
    pub cap: Arc<Capability>,
    pub rules: Arc<dyn StackRules>,
    pub cards: Vec<Card>,
}

impl Stack {
    pub fn view(&self) -> StackRef<'_> {
        StackRef {
            id: self.id,
            role: self.role,
            cap: &self.cap,
            rules: self.rules.as_ref(),
            cards: &self.cards,
        }
    }
}

/// A game position: every stack plus the role groups the hint steps iterate.
#[derive(Debug, Clone, Default)]
pub struct Position {
    stacks: Vec<Stack>,
    talon: Option<StackId>,
    waste: Vec<StackId>,
    foundations: Vec<StackId>,
    rows: Vec<StackId>,
    reserves: Vec<StackId>,
    pub decks: u8,
    /// Cards moved from talon to waste per deal.
    pub deal_count: usize,
    /// Remaining talon redeals; `None` is unlimited.
    pub redeals_left: Option<u32>,
}

impl Position {
    pub fn new(decks: u8) -> Self {
        Self {
            decks,
            deal_count: 1,
            ..Self::default()
        }
    }

    pub fn add_stack(
        &mut self,
        role: StackRole,
        cap: Capability,
        rules: Arc<dyn StackRules>,
    ) -> Result<StackId, LayoutError> {
        let id = StackId(self.stacks.len());
        match role {
            StackRole::Talon => {
                if self.talon.is_some() {
                    return Err(LayoutError::DuplicateTalon);
                }
                self.talon = Some(id);
            }
            StackRole::Waste => self.waste.push(id),
            StackRole::Foundation => self.foundations.push(id),
            StackRole::Row => self.rows.push(id),
            StackRole::Reserve => self.reserves.push(id),
        }
        self.stacks.push(Stack {
            id,
            role,
            cap: Arc::new(cap),
            rules,
            cards: Vec::new(),
        });
        Ok(id)
    }

    /// View of a stack owned by this position. Ids from other positions panic.
    pub fn view(&self, id: StackId) -> StackRef<'_> {
        self.stacks[id.0].view()
    }

    pub fn get(&self, id: StackId) -> Option<&Stack> {
        self.stacks.get(id.0)
    }

    pub fn stack_mut(&mut self, id: StackId) -> Result<&mut Stack, LayoutError> {
        self.stacks.get_mut(id.0).ok_or(LayoutError::UnknownStack(id))
    }

    pub fn all_stacks(&self) -> impl Iterator<Item = StackRef<'_>> {
        self.stacks.iter().map(Stack::view)
    }

    pub fn talon(&self) -> Option<StackId> {
        self.talon
    }

    pub fn waste(&self) -> &[StackId] {
        &self.waste
    }

    pub fn foundations(&self) -> &[StackId] {
        &self.foundations
    }

    pub fn rows(&self) -> &[StackId] {
        &self.rows
    }

    pub fn reserves(&self) -> &[StackId] {
        &self.reserves
    }

    /// Talon followed by waste stacks.
    pub fn talon_stacks(&self) -> Vec<StackId> {
        self.talon.iter().chain(self.waste.iter()).copied().collect()
    }

    /// Stacks whose top cards may be played: rows, reserves, then waste.
    pub fn drop_stacks(&self) -> Vec<StackId> {
        self.rows
            .iter()
            .chain(self.reserves.iter())
            .chain(self.waste.iter())
            .copied()
            .collect()
    }

    pub fn reserve_stacks(&self) -> &[StackId] {
        &self.reserves
    }

    pub fn can_deal_cards(&self) -> bool {
        self.talon
            .map(|t| self.view(t).can_deal_cards(self))
            .unwrap_or(false)
    }

    pub fn is_won(&self) -> bool {
        self.stacks
            .iter()
            .filter(|s| s.role != StackRole::Foundation)
            .all(|s| s.cards.is_empty())
    }

    pub fn free_reserves(&self) -> usize {
        self.reserves
            .iter()
            .filter(|&&r| self.view(r).is_empty())
            .count()
    }

    /// Card contents of every stack, in stack order.
    pub fn snapshot(&self) -> Vec<Vec<Card>> {
        self.stacks.iter().map(|s| s.cards.clone()).collect()
    }

    pub fn fingerprint(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for stack in &self.stacks {
            stack.cards.hash(&mut hasher);
            0xA3u8.hash(&mut hasher);
        }
        self.redeals_left.hash(&mut hasher);
        hasher.finish()
    }
}
