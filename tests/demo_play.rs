use pretty_assertions::assert_eq;
use solitaire_hint::demo::run_demo;
use solitaire_hint::games::{DrawMode, GameFamily};
use solitaire_hint::{Card, HintEngine, Position, Rank, Suit};

fn card_count(table: &Position) -> usize {
    table.snapshot().iter().map(Vec::len).sum()
}

#[test]
fn demo_clears_a_single_suit_column() {
    let mut table = GameFamily::FreeCell.layout().unwrap();
    let row = table.rows()[0];
    // King at the bottom, Ace on top
    table.stack_mut(row).unwrap().cards = (0..13)
        .rev()
        .map(|i| Card::up(Suit::Spades, Rank::from_index(i).unwrap()))
        .collect();

    let engine = HintEngine::new(Box::new(GameFamily::FreeCell.strategy()));
    let outcome = run_demo(&engine, &mut table, 100).unwrap();
    assert!(outcome.won, "{outcome:?}");
    assert!(!outcome.stalled);
    assert!(table.is_won());
    assert_eq!(card_count(&table), 13);
}

#[test]
fn demo_play_stops_within_its_step_cap() {
    for family in [
        GameFamily::Klondike(DrawMode::DrawOne),
        GameFamily::Klondike(DrawMode::DrawThree),
        GameFamily::FreeCell,
        GameFamily::Yukon,
    ] {
        for seed in 1..=4 {
            let mut table = family.deal(seed).unwrap();
            let engine = HintEngine::new(Box::new(family.strategy()));
            let outcome = run_demo(&engine, &mut table, 400).unwrap();
            assert!(outcome.steps <= 400);
            assert_eq!(card_count(&table), 52, "{family:?} seed {seed}");
            assert_eq!(outcome.won, table.is_won());
        }
    }
}
