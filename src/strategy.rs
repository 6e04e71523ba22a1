//! Heuristic scoring strategies.
//!
//! `DefaultHint` runs a fixed pipeline of steps, cheapest and likeliest
//! first; a later step only runs while every earlier one came up empty.
//! Hypothetical positions are evaluated on `ClonedStack`s, the live
//! position is never written.

use tracing::trace;

use crate::clone::ClonedStack;
use crate::constants::*;
use crate::engine::{Card, Position, StackId, StackRef};
use crate::hint::{AtomicHint, HintColor, HintLevel, HintList};

/// A policy that appends candidate hints for the current position.
pub trait HintStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Never fails; finding nothing leaves `ctx.hints` untouched.
    fn compute_hints(&self, ctx: &mut HintContext<'_>);
}

/// State shared by the engine and a strategy during one hint request.
#[derive(Debug)]
pub struct HintContext<'a> {
    pub table: &'a Position,
    pub level: HintLevel,
    pub hints: HintList,
}

impl<'a> HintContext<'a> {
    pub fn new(table: &'a Position, level: HintLevel, flatten_bucket: u32) -> Self {
        Self {
            table,
            level,
            hints: HintList::new(level, flatten_bucket),
        }
    }
}

/// Which moves the destination predicate alone may approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePolicy {
    /// Accept whatever the destination accepts.
    Default,
    /// Also reject moves whose remainder would take the pile straight back.
    Cautious,
    /// Cautious, but only during demo play.
    CautiousDemo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PileChoice {
    /// Only the largest movable pile.
    Longest,
    /// The largest movable pile and every shorter suffix of it.
    EverySuffix,
}

/// Bonus weights added on top of a step's base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bonuses {
    pub drop_card: u32,
    pub same_suit_move: u32,
    pub normal_move: u32,
    pub flip_card: u32,
    pub create_empty_row: u32,
    pub can_drop_all_cards: u32,
    pub can_create_empty_row: u32,
}

impl Default for Bonuses {
    fn default() -> Self {
        Self {
            drop_card: 300,
            same_suit_move: 200,
            normal_move: 100,
            flip_card: 1500,
            create_empty_row: 9000,
            can_drop_all_cards: 4000,
            can_create_empty_row: 2000,
        }
    }
}

/// Scoring strategy tuned for Klondike-type games; the presets cover the
/// other families.
#[derive(Debug, Clone)]
pub struct DefaultHint {
    pub policy: MovePolicy,
    /// Bias card bonuses towards moving high ranks.
    pub prefer_high_rank_moves: bool,
    pub piles: PileChoice,
    pub bonuses: Bonuses,
    /// Cut the bonus when the moved pile holds a card the target pile needs.
    pub guard_needed_cards: bool,
    name: &'static str,
}

impl Default for DefaultHint {
    fn default() -> Self {
        Self::klondike()
    }
}

impl DefaultHint {
    pub fn klondike() -> Self {
        Self {
            policy: MovePolicy::Default,
            prefer_high_rank_moves: false,
            piles: PileChoice::Longest,
            bonuses: Bonuses::default(),
            guard_needed_cards: false,
            name: "klondike",
        }
    }

    pub fn cautious() -> Self {
        Self {
            policy: MovePolicy::Cautious,
            prefer_high_rank_moves: true,
            name: "cautious",
            ..Self::klondike()
        }
    }

    pub fn cautious_demo() -> Self {
        Self {
            policy: MovePolicy::CautiousDemo,
            name: "cautious-demo",
            ..Self::cautious()
        }
    }

    pub fn freecell_type() -> Self {
        Self {
            name: "freecell",
            ..Self::cautious()
        }
    }

    pub fn yukon_type() -> Self {
        Self {
            piles: PileChoice::EverySuffix,
            name: "yukon-type",
            ..Self::cautious()
        }
    }

    pub fn yukon() -> Self {
        Self {
            bonuses: Bonuses {
                flip_card: 9000,
                create_empty_row: 100,
                ..Bonuses::default()
            },
            guard_needed_cards: true,
            name: "yukon",
            ..Self::yukon_type()
        }
    }

    fn piles<'a>(&self, table: &Position, stack: StackRef<'a>) -> Vec<&'a [Card]> {
        let Some(pile) = stack.get_pile(table) else {
            return Vec::new();
        };
        match self.piles {
            PileChoice::Longest => vec![pile],
            PileChoice::EverySuffix => (0..pile.len()).map(|i| &pile[i..]).collect(),
        }
    }

    /// Move-acceptance predicate selected by `policy`.
    pub fn shall_move_pile(
        &self,
        level: HintLevel,
        table: &Position,
        from: StackRef<'_>,
        to: StackRef<'_>,
        pile: &[Card],
        remainder: &[Card],
    ) -> bool {
        if from.id == to.id || !to.accepts_cards(table, from, pile) {
            return false;
        }
        let check_loops = match self.policy {
            MovePolicy::Default => false,
            MovePolicy::Cautious => true,
            MovePolicy::CautiousDemo => level >= HintLevel::Demo,
        };
        if !check_loops || remainder.is_empty() {
            return true;
        }
        // The pile could be moved straight back: that is how endless loops start.
        let rest = ClonedStack::of(from, remainder);
        !rest.view().accepts_cards(table, to, pile)
    }

    /// True when every card of `cards`, top first, could go to a foundation.
    /// `pre_dropped` is a card already on its way to that foundation.
    pub fn can_drop_all_cards(
        &self,
        table: &Position,
        from: StackRef<'_>,
        cards: &[Card],
        pre_dropped: Option<(StackId, Card)>,
    ) -> bool {
        if cards.is_empty() {
            return false;
        }
        let mut foundations: Vec<ClonedStack<'_>> = table
            .foundations()
            .iter()
            .map(|&f| {
                let view = table.view(f);
                ClonedStack::of(view, view.cards)
            })
            .collect();
        if let Some((id, card)) = pre_dropped {
            if let Some(f) = foundations.iter_mut().find(|f| f.id() == id) {
                f.push(card);
            }
        }
        let mut rest = ClonedStack::of(from, cards);
        while let Some(card) = rest.top() {
            let single = [card];
            if !rest.view().can_move_cards(table, &single) {
                return false;
            }
            let Some(slot) = foundations
                .iter()
                .position(|f| f.view().accepts_cards(table, rest.view(), &single))
            else {
                return false;
            };
            foundations[slot].push(card);
            rest.pop();
        }
        true
    }

    fn move_card_bonus(
        &self,
        table: &Position,
        from: StackRef<'_>,
        to: StackRef<'_>,
        pile: &[Card],
        remainder: &[Card],
    ) -> u32 {
        let Some(first) = pile.first() else {
            return 0;
        };
        let mut bonus = 0;
        if !remainder.is_empty() {
            let rest = ClonedStack::of(from, remainder);
            if rest
                .view()
                .can_drop_cards(table, table.foundations())
                .is_some()
            {
                // the card below the pile can be dropped
                bonus = self.bonuses.drop_card;
            }
        }
        let high = 1 + u32::from(first.rank.index());
        let below = remainder.last().filter(|c| c.face_up);
        if to.top().is_some_and(|c| c.suit == first.suit) {
            bonus += self.bonuses.same_suit_move + high;
        } else if self.prefer_high_rank_moves {
            bonus += self.bonuses.normal_move + high;
        } else if let Some(low) = below {
            // prefer low-rank cards in the remainder
            bonus += self.bonuses.normal_move + (K - u32::from(low.rank.index()));
        } else {
            bonus += self.bonuses.normal_move + high;
        }
        bonus
    }

    fn move_special_bonus(
        &self,
        table: &Position,
        from: StackRef<'_>,
        to: StackRef<'_>,
        remainder: &[Card],
    ) -> (u32, HintColor) {
        let Some(below) = remainder.last() else {
            return (self.bonuses.create_empty_row, HintColor::Black);
        };
        if !below.face_up {
            // prefer a short remainder
            let len = u32::try_from(remainder.len()).unwrap_or(u32::MAX);
            return (self.bonuses.flip_card.saturating_sub(len), HintColor::Black);
        }
        if self.can_drop_all_cards(table, from, remainder, None) {
            return (
                self.bonuses.can_drop_all_cards + self.bonuses.can_create_empty_row,
                HintColor::Red,
            );
        }
        if from.can_move_cards(table, remainder) {
            // `from` itself may take the remainder: the pile has left it by then
            for &x in table.rows() {
                let row = table.view(x);
                if x == to.id || row.is_empty() {
                    continue;
                }
                if row.accepts_cards(table, from, remainder) {
                    return (self.bonuses.can_create_empty_row, HintColor::Blue);
                }
            }
        }
        (0, HintColor::Black)
    }

    fn pile_move_score(
        &self,
        table: &Position,
        base: u32,
        from: StackRef<'_>,
        to: StackRef<'_>,
        pile: &[Card],
        remainder: &[Card],
    ) -> (u32, HintColor) {
        let (special, color) = self.move_special_bonus(table, from, to, remainder);
        let mut bonus = special + self.move_card_bonus(table, from, to, pile, remainder);
        if self.guard_needed_cards {
            bonus = self.needed_card_guard(table, from, to, pile, bonus);
        }
        (base + bonus, color)
    }

    fn needed_card_guard(
        &self,
        table: &Position,
        from: StackRef<'_>,
        to: StackRef<'_>,
        pile: &[Card],
        mut bonus: u32,
    ) -> u32 {
        let Some(target_pile) = to.get_pile(table) else {
            return bonus;
        };
        for &card in pile {
            let single = ClonedStack::of(from, &[card]);
            let blocks = target_pile
                .iter()
                .any(|&ct| single.view().accepts_cards(table, to, &[ct]));
            if blocks {
                bonus = (bonus / 1000) * 1000 + bonus % 100;
            }
        }
        bonus
    }

    fn drop_card_score(
        &self,
        table: &Position,
        from: StackRef<'_>,
        to: StackRef<'_>,
        ncards: usize,
        talon_stacks: &[StackId],
    ) -> (u32, HintColor) {
        if ncards > 1 {
            return (SCORE_DROP_RUN, HintColor::Black);
        }
        let Some(card) = from.top() else {
            return (0, HintColor::Black);
        };
        let distance = to
            .cap
            .base_distance(card.rank)
            .unwrap_or_else(|| i32::try_from(to.len()).unwrap_or(i32::MAX));
        let (score, color) = if distance.abs() <= 1 {
            (SCORE_DROP_NEAR_BASE, HintColor::Black)
        } else if talon_stacks.contains(&from.id) {
            (SCORE_DROP_FROM_TALON, HintColor::Black)
        } else if from.len() == 1 {
            (SCORE_DROP_LAST_CARD, HintColor::Black)
        } else if self.can_drop_all_cards(
            table,
            from,
            &from.cards[..from.len() - 1],
            Some((to.id, card)),
        ) {
            (SCORE_DROP_CLEARS_STACK, HintColor::Red)
        } else {
            // don't drop too eagerly, the card may be needed for pile moves
            (SCORE_DROP_OTHER, HintColor::Black)
        };
        (score + K - u32::from(card.rank.index()), color)
    }

    /// Step 1: drops to the foundations, then pile moves onto rows.
    fn drop_and_move_piles(&self, ctx: &mut HintContext<'_>) {
        let table = ctx.table;
        let talon_stacks = table.talon_stacks();
        for r in table.drop_stacks() {
            let from = table.view(r);
            if let Some((t, ncards)) = from.can_drop_cards(table, table.foundations()) {
                let (score, color) =
                    self.drop_card_score(table, from, table.view(t), ncards, &talon_stacks);
                ctx.hints.add(score, ncards, r, Some(t), color, None);
                if score >= SCORE_HIGH && ctx.level >= HintLevel::Score {
                    break;
                }
            }
            for pile in self.piles(table, from) {
                self.move_pile(ctx, from, pile, &talon_stacks);
            }
        }
    }

    fn move_pile(
        &self,
        ctx: &mut HintContext<'_>,
        from: StackRef<'_>,
        pile: &[Card],
        talon_stacks: &[StackId],
    ) {
        let table = ctx.table;
        let remainder = &from.cards[..from.len() - pile.len()];
        let from_waste = talon_stacks.contains(&from.id);
        let mut empty_row_seen = false;
        for &t in table.rows() {
            let to = table.view(t);
            if !self.shall_move_pile(ctx.level, table, from, to, pile, remainder) {
                continue;
            }
            let (score, color) = if from_waste {
                let base = if to.is_empty() {
                    SCORE_WASTE_TO_EMPTY
                } else {
                    SCORE_WASTE_TO_PILE
                };
                (
                    base + self.move_card_bonus(table, from, to, pile, remainder),
                    HintColor::Black,
                )
            } else {
                let base = if to.is_empty() {
                    // never move a whole stack onto an empty row, and
                    // suggest only one of several empty rows
                    if remainder.is_empty() || empty_row_seen {
                        continue;
                    }
                    empty_row_seen = true;
                    SCORE_MOVE_TO_EMPTY
                } else {
                    SCORE_MOVE_TO_PILE
                };
                self.pile_move_score(table, base, from, to, pile, remainder)
            };
            ctx.hints.add(score, pile.len(), from.id, Some(t), color, None);
        }
    }

    /// Step 2: move the cards above a droppable card away, then force the drop.
    fn free_droppable_card(&self, ctx: &mut HintContext<'_>) {
        let table = ctx.table;
        let foundations = table.foundations();
        for &r in table.rows() {
            let from = table.view(r);
            // longest pile only: shorter suffixes expose the same cards
            if let Some(pile) = from.get_pile(table).filter(|p| p.len() >= 2) {
                let drops: Vec<(usize, StackId, usize)> = pile
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &card)| {
                        let single = ClonedStack::of(from, &[card]);
                        single
                            .view()
                            .can_drop_cards(table, foundations)
                            .filter(|&(f, _)| f != r)
                            .map(|(f, n)| (i, f, n))
                    })
                    .collect();
                for (i, foundation, ncards) in drops {
                    let above = &pile[i + 1..];
                    if !from.can_move_cards(table, above) {
                        continue;
                    }
                    for &t in table.rows() {
                        if t == r || !table.view(t).accepts_cards(table, from, above) {
                            continue;
                        }
                        let top_rank = from.top().map_or(0, |c| u32::from(c.rank.index()));
                        let score = SCORE_ENABLE_DROP + 1000 + (K - top_rank);
                        let forced =
                            AtomicHint::forced_move(ncards, r, foundation, HintColor::Blue);
                        ctx.hints
                            .add(score, above.len(), r, Some(t), HintColor::Red, Some(forced));
                    }
                }
            }
        }
    }

    /// Step 3: bring a foundation card back when a pile can then follow it.
    fn foundation_to_row(&self, ctx: &mut HintContext<'_>) {
        let table = ctx.table;
        let drop_stacks = table.drop_stacks();
        for &s in table.foundations() {
            let source = table.view(s);
            let Some(card) = source.top() else {
                continue;
            };
            let single = [card];
            if !source.can_move_cards(table, &single) {
                continue;
            }
            for &t in table.rows() {
                let to = table.view(t);
                if t == s || !to.accepts_cards(table, source, &single) {
                    continue;
                }
                let grown = ClonedStack::with_appended(to, &single);
                for &r in &drop_stacks {
                    if r == t {
                        continue;
                    }
                    let from = table.view(r);
                    let Some(pile) = from.get_pile(table) else {
                        continue;
                    };
                    if !grown.view().accepts_cards(table, from, pile) {
                        continue;
                    }
                    let rest = ClonedStack::of(from, &from.cards[..from.len() - pile.len()]);
                    if rest.view().accepts_cards(table, to, pile) {
                        // the pile could come straight back from t to r
                        continue;
                    }
                    let score = SCORE_FOUNDATION_TO_ROW + u32::from(card.rank.index());
                    let forced = AtomicHint::forced_move(pile.len(), r, t, HintColor::Blue);
                    ctx.hints
                        .add(score, 1, s, Some(t), HintColor::Blue, Some(forced));
                }
            }
        }
    }

    /// Step 4: park a blocking row card on a reserve.
    fn row_to_reserve(&self, ctx: &mut HintContext<'_>) {
        let table = ctx.table;
        if table.reserve_stacks().is_empty() {
            return;
        }
        for &r in table.rows() {
            let from = table.view(r);
            let Some(card) = from.top() else {
                continue;
            };
            let single = [card];
            if !from.can_move_cards(table, &single) {
                continue;
            }
            let remainder = &from.cards[..from.len() - 1];
            let rest = ClonedStack::of(from, remainder);
            for &t in table.reserve_stacks() {
                let to = table.view(t);
                if t == r || !to.accepts_cards(table, from, &single) {
                    continue;
                }
                if rest.view().accepts_cards(table, to, &single) {
                    continue;
                }
                let (score, color) =
                    self.pile_move_score(table, SCORE_ROW_TO_RESERVE, from, to, &single, remainder);
                ctx.hints.add(score, 1, r, Some(t), color, None);
                break;
            }
        }
    }

    /// Step 5: bring a reserve card back onto a non-empty row.
    fn reserve_to_row(&self, ctx: &mut HintContext<'_>) {
        let table = ctx.table;
        for &r in table.reserve_stacks() {
            let from = table.view(r);
            let Some(card) = from.top() else {
                continue;
            };
            let single = [card];
            if !from.can_move_cards(table, &single) {
                continue;
            }
            let remainder = &from.cards[..from.len() - 1];
            for &t in table.rows() {
                let to = table.view(t);
                if to.is_empty()
                    || !self.shall_move_pile(ctx.level, table, from, to, &single, remainder)
                {
                    continue;
                }
                let score =
                    SCORE_RESERVE_TO_ROW + self.move_card_bonus(table, from, to, &single, remainder);
                ctx.hints.add(score, 1, r, Some(t), HintColor::Black, None);
            }
        }
    }
}

impl HintStrategy for DefaultHint {
    fn name(&self) -> &'static str {
        self.name
    }

    fn compute_hints(&self, ctx: &mut HintContext<'_>) {
        self.drop_and_move_piles(ctx);
        trace!(step = "drop-and-move", hints = ctx.hints.len());
        if ctx.hints.is_empty() && ctx.level >= HintLevel::Score {
            self.free_droppable_card(ctx);
            trace!(step = "free-droppable", hints = ctx.hints.len());
        }
        if ctx.hints.is_empty() && ctx.level >= HintLevel::Score {
            self.foundation_to_row(ctx);
            trace!(step = "foundation-to-row", hints = ctx.hints.len());
        }
        if ctx.hints.is_empty() {
            self.row_to_reserve(ctx);
            trace!(step = "row-to-reserve", hints = ctx.hints.len());
        }
        if ctx.hints.is_empty() {
            self.reserve_to_row(ctx);
            trace!(step = "reserve-to-row", hints = ctx.hints.len());
        }
    }
}
