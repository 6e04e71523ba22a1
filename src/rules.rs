//! Reference rule sets for the common stack classes.
//! Game variants plug their own `StackRules` in; these cover Klondike,
//! FreeCell, Baker's Game, Yukon and Spider style tableaus.

use crate::engine::{
    drop_top_card, Capability, Card, Position, Rank, StackId, StackRef, StackRules, Suit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    AlternateColor,
    SameColor,
    SameSuit,
    Rank,
    AnySuitButOwn,
}

impl SequenceKind {
    #[inline]
    fn links(self, upper: &Card, lower: &Card) -> bool {
        match self {
            SequenceKind::AlternateColor => upper.color() != lower.color(),
            SequenceKind::SameColor => upper.color() == lower.color(),
            SequenceKind::SameSuit => upper.suit == lower.suit,
            SequenceKind::Rank => true,
            SequenceKind::AnySuitButOwn => upper.suit != lower.suit,
        }
    }

    /// Face-up cards building in `cap.dir` with this kind's suit/colour link.
    pub fn is_sequence(self, cards: &[Card], cap: &Capability) -> bool {
        cards_face_up(cards)
            && cards
                .windows(2)
                .all(|w| cap.follows(w[0].rank, w[1].rank) && self.links(&w[0], &w[1]))
    }
}

/// Empty slices are not face up.
pub fn cards_face_up(cards: &[Card]) -> bool {
    !cards.is_empty() && cards.iter().all(|c| c.face_up)
}

pub fn row_cap(base_rank: Option<Rank>) -> Capability {
    Capability {
        base_rank,
        dir: -1,
        max_move: 999_999,
        max_accept: 999_999,
        ..Capability::default()
    }
}

pub fn foundation_cap(suit: Option<Suit>, allow_return: bool) -> Capability {
    Capability {
        suit,
        base_suit: suit,
        base_rank: Some(Rank::Ace),
        dir: 1,
        max_accept: 1,
        max_cards: 13,
        max_move: usize::from(allow_return),
        ..Capability::default()
    }
}

pub fn spider_foundation_cap() -> Capability {
    Capability {
        base_rank: Some(Rank::King),
        dir: -1,
        min_accept: 13,
        max_accept: 13,
        max_cards: 13,
        max_move: 0,
        ..Capability::default()
    }
}

pub fn reserve_cap() -> Capability {
    Capability {
        max_move: 1,
        max_accept: 1,
        max_cards: 1,
        ..Capability::default()
    }
}

pub fn waste_cap() -> Capability {
    Capability {
        max_move: 1,
        ..Capability::default()
    }
}

pub fn talon_cap() -> Capability {
    Capability::default()
}

/// Tableau row building by `kind`.
#[derive(Debug, Clone)]
pub struct RowRules {
    pub kind: SequenceKind,
    /// Pile moves are limited to free reserves + 1 (FreeCell).
    pub free_cell_moves: bool,
    /// Only complete 13-card runs drop to the foundations (Spider).
    pub drops_runs: bool,
}

impl RowRules {
    pub fn new(kind: SequenceKind) -> Self {
        Self {
            kind,
            free_cell_moves: false,
            drops_runs: false,
        }
    }

    pub fn free_cell(kind: SequenceKind) -> Self {
        Self {
            free_cell_moves: true,
            ..Self::new(kind)
        }
    }

    pub fn spider(kind: SequenceKind) -> Self {
        Self {
            drops_runs: true,
            ..Self::new(kind)
        }
    }
}

impl StackRules for RowRules {
    fn accepts_cards(
        &self,
        _table: &Position,
        stack: StackRef<'_>,
        from: StackRef<'_>,
        cards: &[Card],
    ) -> bool {
        if !stack.cap.basic_accepts(stack, from, cards) {
            return false;
        }
        if !self.kind.is_sequence(cards, stack.cap) {
            return false;
        }
        match (stack.top(), cards.first()) {
            (Some(top), Some(&first)) => self.kind.is_sequence(&[top, first], stack.cap),
            _ => true,
        }
    }

    fn can_move_cards(&self, table: &Position, stack: StackRef<'_>, cards: &[Card]) -> bool {
        if !stack.cap.basic_can_move(stack, cards) || !self.kind.is_sequence(cards, stack.cap) {
            return false;
        }
        !self.free_cell_moves || cards.len() <= table.free_reserves() + 1
    }

    fn can_drop_cards(
        &self,
        table: &Position,
        stack: StackRef<'_>,
        foundations: &[StackId],
    ) -> Option<(StackId, usize)> {
        if !self.drops_runs {
            return drop_top_card(table, stack, foundations);
        }
        let start = stack.cards.len().checked_sub(13)?;
        let cards = &stack.cards[start..];
        foundations
            .iter()
            .copied()
            .filter(|&f| f != stack.id)
            .find(|&f| table.view(f).accepts_cards(table, stack, cards))
            .map(|f| (f, 13))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoundationKind {
    SameSuit,
    Rank,
    AlternateColor,
    SameColor,
    /// Accepts whole runs at once.
    Run(SequenceKind),
}

#[derive(Debug, Clone)]
pub struct FoundationRules {
    pub kind: FoundationKind,
}

impl FoundationRules {
    pub fn same_suit() -> Self {
        Self {
            kind: FoundationKind::SameSuit,
        }
    }

    pub fn rank() -> Self {
        Self {
            kind: FoundationKind::Rank,
        }
    }

    pub fn spider() -> Self {
        Self {
            kind: FoundationKind::Run(SequenceKind::SameSuit),
        }
    }
}

impl StackRules for FoundationRules {
    fn accepts_cards(
        &self,
        _table: &Position,
        stack: StackRef<'_>,
        from: StackRef<'_>,
        cards: &[Card],
    ) -> bool {
        if !stack.cap.basic_accepts(stack, from, cards) {
            return false;
        }
        let Some(first) = cards.first() else {
            return false;
        };
        let builds = |top: &Card| stack.cap.follows(top.rank, first.rank);
        match self.kind {
            FoundationKind::SameSuit | FoundationKind::Rank => {
                stack.cards.last().map_or(true, builds)
            }
            FoundationKind::AlternateColor => stack
                .cards
                .last()
                .map_or(true, |top| builds(top) && top.color() != first.color()),
            FoundationKind::SameColor => stack
                .cards
                .last()
                .map_or(true, |top| builds(top) && top.color() == first.color()),
            FoundationKind::Run(kind) => kind.is_sequence(cards, stack.cap),
        }
    }

    fn can_drop_cards(
        &self,
        _table: &Position,
        _stack: StackRef<'_>,
        _foundations: &[StackId],
    ) -> Option<(StackId, usize)> {
        None
    }
}

/// Reserve and waste stacks: everything follows the capability record.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRules;

impl StackRules for OpenRules {}

/// Talon that deals onto the waste and may turn the waste over again.
#[derive(Debug, Clone, Copy, Default)]
pub struct TalonRules;

impl StackRules for TalonRules {
    fn can_flip_card(&self, _stack: StackRef<'_>) -> bool {
        false
    }

    fn can_drop_cards(
        &self,
        _table: &Position,
        _stack: StackRef<'_>,
        _foundations: &[StackId],
    ) -> Option<(StackId, usize)> {
        None
    }

    fn can_deal_cards(&self, table: &Position, stack: StackRef<'_>) -> bool {
        if !stack.is_empty() {
            return true;
        }
        table.redeals_left != Some(0) && table.waste().iter().any(|&w| !table.view(w).is_empty())
    }
}
