//! Deck construction, seeded shuffling, and concrete layouts for the
//! game families the hint engine ships presets for.

use std::sync::Arc;

use crate::engine::{
    Card, Position, Rank, StackId, StackRef, StackRole, StackRules, RANKS, SUITS,
};
use crate::error::LayoutError;
use crate::rules::{
    foundation_cap, reserve_cap, row_cap, talon_cap, waste_cap, FoundationRules, OpenRules,
    RowRules, SequenceKind, TalonRules,
};
use crate::solver::SolverGame;
use crate::strategy::DefaultHint;

const DECK_SIZE: usize = 52;
const KLONDIKE_ROWS: usize = 7;
const FREECELL_ROWS: usize = 8;
const FREECELL_CELLS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    DrawOne,
    DrawThree,
}

impl DrawMode {
    pub const fn count(self) -> usize {
        match self {
            DrawMode::DrawOne => 1,
            DrawMode::DrawThree => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameFamily {
    Klondike(DrawMode),
    FreeCell,
    BakersGame,
    Yukon,
}

impl GameFamily {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "klondike" | "klondike1" => Some(GameFamily::Klondike(DrawMode::DrawOne)),
            "klondike3" => Some(GameFamily::Klondike(DrawMode::DrawThree)),
            "freecell" => Some(GameFamily::FreeCell),
            "bakers" | "bakersgame" | "bakers-game" => Some(GameFamily::BakersGame),
            "yukon" => Some(GameFamily::Yukon),
            _ => None,
        }
    }

    /// Heuristic strategy preset used for this family.
    pub fn strategy(self) -> DefaultHint {
        match self {
            GameFamily::Klondike(_) => DefaultHint::klondike(),
            GameFamily::FreeCell | GameFamily::BakersGame => DefaultHint::freecell_type(),
            GameFamily::Yukon => DefaultHint::yukon(),
        }
    }

    /// External solver game description, if the family has one.
    pub fn solver_game(self) -> Option<SolverGame> {
        match self {
            GameFamily::FreeCell => Some(SolverGame::freecell()),
            GameFamily::BakersGame => Some(SolverGame {
                sequences_built_by: Some("suit".into()),
                ..SolverGame::freecell()
            }),
            GameFamily::Klondike(_) | GameFamily::Yukon => None,
        }
    }

    /// Empty layout with every stack in place.
    pub fn layout(self) -> Result<Position, LayoutError> {
        match self {
            GameFamily::Klondike(draw) => klondike_layout(draw),
            GameFamily::FreeCell => freecell_layout(SequenceKind::AlternateColor),
            GameFamily::BakersGame => freecell_layout(SequenceKind::SameSuit),
            GameFamily::Yukon => yukon_layout(),
        }
    }

    pub fn deal(self, seed: u64) -> Result<Position, LayoutError> {
        let mut table = self.layout()?;
        let mut deck = create_standard_deck();
        shuffle_deck(&mut deck, seed);
        match self {
            GameFamily::Klondike(_) => deal_klondike(&mut table, deck)?,
            GameFamily::FreeCell | GameFamily::BakersGame => deal_round_robin(&mut table, deck)?,
            GameFamily::Yukon => deal_yukon(&mut table, deck)?,
        }
        Ok(table)
    }
}

fn add_foundations(table: &mut Position, allow_return: bool) -> Result<(), LayoutError> {
    let rules: Arc<dyn StackRules> = Arc::new(FoundationRules::same_suit());
    for suit in SUITS {
        table.add_stack(
            StackRole::Foundation,
            foundation_cap(Some(suit), allow_return),
            rules.clone(),
        )?;
    }
    Ok(())
}

fn add_rows(
    table: &mut Position,
    count: usize,
    base_rank: Option<Rank>,
    rules: Arc<dyn StackRules>,
) -> Result<(), LayoutError> {
    for _ in 0..count {
        table.add_stack(StackRole::Row, row_cap(base_rank), rules.clone())?;
    }
    Ok(())
}

fn klondike_layout(draw: DrawMode) -> Result<Position, LayoutError> {
    let mut table = Position::new(1);
    table.deal_count = draw.count();
    table.add_stack(StackRole::Talon, talon_cap(), Arc::new(TalonRules))?;
    table.add_stack(StackRole::Waste, waste_cap(), Arc::new(OpenRules))?;
    add_foundations(&mut table, true)?;
    add_rows(
        &mut table,
        KLONDIKE_ROWS,
        Some(Rank::King),
        Arc::new(RowRules::new(SequenceKind::AlternateColor)),
    )?;
    Ok(table)
}

fn freecell_layout(kind: SequenceKind) -> Result<Position, LayoutError> {
    let mut table = Position::new(1);
    for _ in 0..FREECELL_CELLS {
        table.add_stack(StackRole::Reserve, reserve_cap(), Arc::new(OpenRules))?;
    }
    add_foundations(&mut table, false)?;
    add_rows(
        &mut table,
        FREECELL_ROWS,
        None,
        Arc::new(RowRules::free_cell(kind)),
    )?;
    Ok(table)
}

fn yukon_layout() -> Result<Position, LayoutError> {
    let mut table = Position::new(1);
    add_foundations(&mut table, true)?;
    // Yukon rows check only the receiving top card and move any face-up group.
    let rules: Arc<dyn StackRules> = Arc::new(YukonRowRules);
    add_rows(&mut table, KLONDIKE_ROWS, Some(Rank::King), rules)?;
    Ok(table)
}

/// Builds down by alternate colour but moves any face-up group.
#[derive(Debug, Clone, Copy)]
struct YukonRowRules;

impl StackRules for YukonRowRules {
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
        match (stack.top(), cards.first()) {
            (Some(top), Some(&first)) => {
                SequenceKind::AlternateColor.is_sequence(&[top, first], stack.cap)
            }
            _ => true,
        }
    }
}

fn deal_klondike(table: &mut Position, mut deck: Vec<Card>) -> Result<(), LayoutError> {
    // Column i receives i+1 cards, last card face up.
    let rows: Vec<StackId> = table.rows().to_vec();
    for (column, &row) in rows.iter().enumerate() {
        let count = column + 1;
        let mut cards = Vec::with_capacity(count);
        for idx in 0..count {
            let Some(mut card) = deck.pop() else {
                break;
            };
            card.face_up = idx == count - 1;
            cards.push(card);
        }
        table.stack_mut(row)?.cards = cards;
    }
    // Remaining cards become the talon (all face down).
    for card in &mut deck {
        card.face_up = false;
    }
    if let Some(talon) = table.talon() {
        table.stack_mut(talon)?.cards = deck;
    }
    Ok(())
}

fn deal_round_robin(table: &mut Position, deck: Vec<Card>) -> Result<(), LayoutError> {
    let rows: Vec<StackId> = table.rows().to_vec();
    if rows.is_empty() {
        return Ok(());
    }
    for (i, mut card) in deck.into_iter().enumerate() {
        card.face_up = true;
        table.stack_mut(rows[i % rows.len()])?.cards.push(card);
    }
    Ok(())
}

fn deal_yukon(table: &mut Position, mut deck: Vec<Card>) -> Result<(), LayoutError> {
    // Column 0 gets one card; column i gets i face-down cards under five face-up ones.
    let rows: Vec<StackId> = table.rows().to_vec();
    for (column, &row) in rows.iter().enumerate() {
        let (down, up) = if column == 0 { (0, 1) } else { (column, 5) };
        let mut cards = Vec::with_capacity(down + up);
        for idx in 0..down + up {
            let Some(mut card) = deck.pop() else {
                break;
            };
            card.face_up = idx >= down;
            cards.push(card);
        }
        table.stack_mut(row)?.cards = cards;
    }
    Ok(())
}

pub fn create_standard_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in SUITS {
        for rank in RANKS {
            deck.push(Card::new(suit, rank));
        }
    }
    deck
}

pub fn shuffle_deck(deck: &mut [Card], seed: u64) {
    let mut rng = ShuffleRng::new(seed);
    for i in (1..deck.len()).rev() {
        let j = (rng.next_u32() as usize) % (i + 1);
        deck.swap(i, j);
    }
}

struct ShuffleRng(u64);

impl ShuffleRng {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x4D44_5EED } else { seed };
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // xorshift64* variant, deterministic per seed.
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        ((x.wrapping_mul(0x2545_F491_4F6C_DD1D)) >> 32) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_cards(table: &Position) -> usize {
        table.all_stacks().map(|s| s.len()).sum()
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let mut a = create_standard_deck();
        let mut b = create_standard_deck();
        shuffle_deck(&mut a, 42);
        shuffle_deck(&mut b, 42);
        assert_eq!(a, b);
        assert_ne!(a, create_standard_deck());
    }

    #[test]
    fn test_klondike_deal_shape() {
        let table = GameFamily::Klondike(DrawMode::DrawThree).deal(7).unwrap();
        assert_eq!(total_cards(&table), 52);
        assert_eq!(table.deal_count, 3);
        for (i, &row) in table.rows().iter().enumerate() {
            let view = table.view(row);
            assert_eq!(view.len(), i + 1);
            assert!(view.top().unwrap().face_up);
        }
        let talon = table.view(table.talon().unwrap());
        assert_eq!(talon.len(), 24);
        assert!(talon.cards.iter().all(|c| !c.face_up));
    }

    #[test]
    fn test_freecell_deal_shape() {
        let table = GameFamily::FreeCell.deal(1).unwrap();
        assert_eq!(total_cards(&table), 52);
        assert_eq!(table.view(table.rows()[0]).len(), 7);
        assert_eq!(table.view(table.rows()[7]).len(), 6);
        assert_eq!(table.reserves().len(), 4);
    }

    #[test]
    fn test_yukon_deal_shape() {
        let table = GameFamily::Yukon.deal(3).unwrap();
        assert_eq!(total_cards(&table), 52);
        let last = table.view(table.rows()[6]);
        assert_eq!(last.len(), 11);
        assert_eq!(last.cards.iter().filter(|c| c.face_up).count(), 5);
    }

    #[test]
    fn test_family_names() {
        assert_eq!(GameFamily::parse("FreeCell"), Some(GameFamily::FreeCell));
        assert_eq!(
            GameFamily::parse("klondike3"),
            Some(GameFamily::Klondike(DrawMode::DrawThree))
        );
        assert!(GameFamily::parse("spider").is_none());
        assert!(GameFamily::Yukon.solver_game().is_none());
    }
}
