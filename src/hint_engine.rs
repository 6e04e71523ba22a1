//! Hint request orchestration.
//!
//! A request goes: forced continuation, cheap flips (demo only), the active
//! strategy, a deal fallback (demo only), then ranking. The position is
//! only ever read.

use tracing::debug;

use crate::config::HintSettings;
use crate::engine::{Position, StackRole};
use crate::hint::{AtomicHint, HintColor, HintLevel};
use crate::strategy::{HintContext, HintStrategy};

pub struct HintEngine {
    strategy: Box<dyn HintStrategy>,
    settings: HintSettings,
}

impl HintEngine {
    pub fn new(strategy: Box<dyn HintStrategy>) -> Self {
        Self::with_settings(strategy, HintSettings::default())
    }

    pub fn with_settings(strategy: Box<dyn HintStrategy>, settings: HintSettings) -> Self {
        Self { strategy, settings }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn settings(&self) -> &HintSettings {
        &self.settings
    }

    /// Ranked hints for `table`, best first. `taken` is the hint acted on last;
    /// its forced successor, if any, is returned alone.
    pub fn get_hints(
        &self,
        table: &Position,
        level: HintLevel,
        taken: Option<&AtomicHint>,
    ) -> Vec<AtomicHint> {
        if let Some(next) = taken.and_then(AtomicHint::forced_next) {
            debug!(hint = %next, "continuing forced chain");
            return vec![next.clone()];
        }

        let mut ctx = HintContext::new(table, level, self.settings.flatten_bucket);
        if level >= HintLevel::Demo {
            self.add_flip_hints(&mut ctx);
            if ctx.hints.max_score() >= self.settings.high_score {
                let hints = ctx.hints.into_sorted();
                debug!(count = hints.len(), "flip shortcut");
                return hints;
            }
        }

        self.strategy.compute_hints(&mut ctx);

        if level >= HintLevel::Demo
            && ctx.hints.max_score() < self.settings.high_score
            && table.can_deal_cards()
        {
            if let Some(talon) = table.talon() {
                ctx.hints
                    .add(self.settings.score_deal, 0, talon, None, HintColor::Black, None);
            }
        }

        let hints = ctx.hints.into_sorted();
        debug!(
            strategy = self.strategy.name(),
            ?level,
            count = hints.len(),
            best = hints.first().map(|h| h.score),
            "hints computed"
        );
        hints
    }

    fn add_flip_hints(&self, ctx: &mut HintContext<'_>) {
        let table = ctx.table;
        for stack in table.all_stacks() {
            if matches!(stack.role, StackRole::Foundation | StackRole::Talon) {
                continue;
            }
            if stack.can_flip_card() {
                ctx.hints.add(
                    self.settings.score_flip,
                    1,
                    stack.id,
                    Some(stack.id),
                    HintColor::Black,
                    None,
                );
                // one flip already wins the shortcut
                if self.settings.score_flip >= self.settings.high_score {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Card, Rank, StackId, Suit};
    use crate::games::{DrawMode, GameFamily};
    use crate::hint::HintKind;
    use crate::strategy::DefaultHint;

    fn engine() -> HintEngine {
        HintEngine::new(Box::new(DefaultHint::klondike()))
    }

    #[test]
    fn test_forced_successor_has_priority() {
        let table = GameFamily::Klondike(DrawMode::DrawOne).deal(5).unwrap();
        let taken = AtomicHint::new(10, 1, StackId(2), Some(StackId(3)))
            .then(AtomicHint::forced_flip(StackId(2)));
        let hints = engine().get_hints(&table, HintLevel::Show, Some(&taken));
        assert_eq!(hints, vec![AtomicHint::forced_flip(StackId(2))]);
    }

    #[test]
    fn test_demo_flips_first() {
        let mut table = GameFamily::Klondike(DrawMode::DrawOne).layout().unwrap();
        let row = table.rows()[3];
        table.stack_mut(row).unwrap().cards = vec![Card::new(Suit::Clubs, Rank::Nine)];
        let hints = engine().get_hints(&table, HintLevel::Demo, None);
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].kind(), HintKind::Flip);
        assert_eq!(hints[0].from, row);
        // players turn cards over themselves
        assert!(engine().get_hints(&table, HintLevel::Show, None).is_empty());
    }

    #[test]
    fn test_demo_deals_when_nothing_better() {
        let mut table = GameFamily::Klondike(DrawMode::DrawOne).layout().unwrap();
        let talon = table.talon().unwrap();
        table.stack_mut(talon).unwrap().cards = vec![Card::new(Suit::Clubs, Rank::Nine)];
        let hints = engine().get_hints(&table, HintLevel::Demo, None);
        assert_eq!(hints.last().map(AtomicHint::kind), Some(HintKind::Deal));
        assert!(engine().get_hints(&table, HintLevel::Score, None).is_empty());
    }

    #[test]
    fn test_no_deal_when_high_score_found() {
        let mut table = GameFamily::Klondike(DrawMode::DrawOne).layout().unwrap();
        let talon = table.talon().unwrap();
        let row = table.rows()[0];
        table.stack_mut(talon).unwrap().cards = vec![Card::new(Suit::Clubs, Rank::Nine)];
        table.stack_mut(row).unwrap().cards = vec![Card::up(Suit::Hearts, Rank::Ace)];
        let hints = engine().get_hints(&table, HintLevel::Demo, None);
        assert!(hints.iter().all(|h| h.kind() != HintKind::Deal));
        assert_eq!(hints[0].from, row);
    }

    #[test]
    fn test_demo_offers_a_single_flip() {
        let mut table = GameFamily::Klondike(DrawMode::DrawOne).layout().unwrap();
        let rows = table.rows().to_vec();
        table.stack_mut(rows[1]).unwrap().cards = vec![Card::new(Suit::Clubs, Rank::Nine)];
        table.stack_mut(rows[4]).unwrap().cards = vec![Card::new(Suit::Hearts, Rank::Four)];
        let hints = engine().get_hints(&table, HintLevel::Demo, None);
        assert_eq!(hints.len(), 1);
        assert_eq!((hints[0].kind(), hints[0].from), (HintKind::Flip, rows[1]));

        let low_flips = HintSettings {
            score_flip: 1_000,
            ..HintSettings::default()
        };
        let engine = HintEngine::with_settings(Box::new(DefaultHint::klondike()), low_flips);
        let flips = engine
            .get_hints(&table, HintLevel::Demo, None)
            .into_iter()
            .filter(|h| h.kind() == HintKind::Flip)
            .count();
        assert_eq!(flips, 2);
    }
}
