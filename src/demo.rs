//! Automated demo play: take the best hint at `HintLevel::Demo`, apply it,
//! repeat until the game is won, stuck, or going in circles.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::engine::{Position, Stack, StackId};
use crate::error::PlayError;
use crate::hint::{AtomicHint, HintKind, HintLevel};
use crate::hint_engine::HintEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoOutcome {
    pub steps: usize,
    pub won: bool,
    /// No hint left, or the position repeated outside a forced chain.
    pub stalled: bool,
}

fn stack(table: &mut Position, id: StackId) -> Result<&mut Stack, PlayError> {
    table.stack_mut(id).map_err(|_| PlayError::UnknownStack(id))
}

fn deal(table: &mut Position) -> Result<(), PlayError> {
    let talon = table.talon().ok_or(PlayError::CannotDeal)?;
    let waste = table.waste().first().copied().ok_or(PlayError::CannotDeal)?;
    let held = table.get(talon).map_or(0, |s| s.cards.len());

    if held > 0 {
        let n = table.deal_count.clamp(1, held);
        let mut cards = stack(table, talon)?.cards.split_off(held - n);
        cards.reverse();
        for card in &mut cards {
            card.face_up = true;
        }
        stack(table, waste)?.cards.extend(cards);
        return Ok(());
    }

    let waste_empty = table.get(waste).map_or(true, |s| s.cards.is_empty());
    if table.redeals_left == Some(0) || waste_empty {
        return Err(PlayError::CannotDeal);
    }
    let mut cards = std::mem::take(&mut stack(table, waste)?.cards);
    cards.reverse();
    for card in &mut cards {
        card.face_up = false;
    }
    stack(table, talon)?.cards = cards;
    if let Some(left) = table.redeals_left.as_mut() {
        *left -= 1;
    }
    Ok(())
}

/// Perform `hint` on `table`. Only the hint itself is applied; its forced
/// successor comes back from the next `get_hints` call.
pub fn apply_hint(table: &mut Position, hint: &AtomicHint) -> Result<(), PlayError> {
    match hint.kind() {
        HintKind::Deal => deal(table),
        HintKind::Flip => {
            let id = hint.from;
            let top = stack(table, id)?
                .cards
                .last_mut()
                .filter(|c| !c.face_up)
                .ok_or(PlayError::NothingToFlip(id))?;
            top.face_up = true;
            Ok(())
        }
        HintKind::Move => {
            let to = hint.to.ok_or(PlayError::MissingTarget)?;
            if table.get(to).is_none() {
                return Err(PlayError::UnknownStack(to));
            }
            let source = stack(table, hint.from)?;
            let held = source.cards.len();
            if hint.ncards > held {
                return Err(PlayError::NotEnoughCards {
                    stack: hint.from,
                    held,
                    wanted: hint.ncards,
                });
            }
            let cards = source.cards.split_off(held - hint.ncards);
            stack(table, to)?.cards.extend(cards);
            Ok(())
        }
    }
}

pub fn run_demo(
    engine: &HintEngine,
    table: &mut Position,
    max_steps: usize,
) -> Result<DemoOutcome, PlayError> {
    let mut seen = HashSet::from([table.fingerprint()]);
    let mut taken: Option<AtomicHint> = None;
    let mut steps = 0;

    while steps < max_steps {
        if table.is_won() {
            break;
        }
        let hints = engine.get_hints(table, HintLevel::Demo, taken.as_ref());
        let Some(hint) = hints.into_iter().next() else {
            info!(steps, "demo stalled: no hints");
            return Ok(DemoOutcome {
                steps,
                won: false,
                stalled: true,
            });
        };
        debug!(step = steps, %hint, "demo move");
        apply_hint(table, &hint)?;
        steps += 1;

        let fresh = seen.insert(table.fingerprint());
        if !fresh && hint.forced_next().is_none() {
            info!(steps, "demo stalled: position repeated");
            return Ok(DemoOutcome {
                steps,
                won: false,
                stalled: true,
            });
        }
        taken = Some(hint);
    }

    let won = table.is_won();
    info!(steps, won, "demo finished");
    Ok(DemoOutcome {
        steps,
        won,
        stalled: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Card, Rank, Suit};
    use crate::games::{DrawMode, GameFamily};

    fn klondike() -> Position {
        GameFamily::Klondike(DrawMode::DrawThree).layout().unwrap()
    }

    #[test]
    fn test_deal_and_redeal() {
        let mut table = klondike();
        let talon = table.talon().unwrap();
        let waste = table.waste()[0];
        table.stack_mut(talon).unwrap().cards = vec![
            Card::new(Suit::Clubs, Rank::Two),
            Card::new(Suit::Clubs, Rank::Three),
            Card::new(Suit::Clubs, Rank::Four),
            Card::new(Suit::Clubs, Rank::Five),
        ];
        table.redeals_left = Some(1);
        let deal_hint = AtomicHint::new(0, 0, talon, None);

        apply_hint(&mut table, &deal_hint).unwrap();
        let dealt = table.view(waste).cards.to_vec();
        assert_eq!(dealt.len(), 3);
        assert!(dealt.iter().all(|c| c.face_up));
        assert_eq!(dealt[0].rank, Rank::Five);

        apply_hint(&mut table, &deal_hint).unwrap();
        assert!(table.view(talon).is_empty());
        apply_hint(&mut table, &deal_hint).unwrap();
        assert_eq!(table.view(talon).len(), 4);
        assert!(table.view(waste).is_empty());
        assert_eq!(table.redeals_left, Some(0));
        assert_eq!(table.view(talon).top().map(|c| c.rank), Some(Rank::Five));

        table.stack_mut(talon).unwrap().cards.clear();
        assert!(matches!(
            apply_hint(&mut table, &deal_hint),
            Err(PlayError::CannotDeal)
        ));
    }

    #[test]
    fn test_flip_and_move() {
        let mut table = klondike();
        let rows = table.rows().to_vec();
        table.stack_mut(rows[0]).unwrap().cards = vec![
            Card::new(Suit::Clubs, Rank::Nine),
            Card::up(Suit::Hearts, Rank::Eight),
        ];
        let mv = AtomicHint::new(80_000, 1, rows[0], Some(rows[1]));
        apply_hint(&mut table, &mv).unwrap();
        assert_eq!(table.view(rows[1]).len(), 1);
        apply_hint(&mut table, &AtomicHint::forced_flip(rows[0])).unwrap();
        assert!(table.view(rows[0]).cards[0].face_up);
        assert!(matches!(
            apply_hint(&mut table, &AtomicHint::forced_flip(rows[0])),
            Err(PlayError::NothingToFlip(_))
        ));
        let too_many = AtomicHint::new(1, 5, rows[1], Some(rows[2]));
        assert!(matches!(
            apply_hint(&mut table, &too_many),
            Err(PlayError::NotEnoughCards { held: 1, wanted: 5, .. })
        ));
    }
}
