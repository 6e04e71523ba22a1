//! Disposable stack copies for evaluating hypothetical moves.

use crate::engine::{Capability, Card, StackId, StackRef, StackRole, StackRules};

/// A stack that shares the capability record and rules of a real stack but
/// owns its own card sequence.
///
/// The borrow ties every clone to the position it was taken from, so clones
/// cannot outlive the hint computation that created them and are never part
/// of the position itself.
#[derive(Debug, Clone)]
pub struct ClonedStack<'a> {
    id: StackId,
    role: StackRole,
    cap: &'a Capability,
    rules: &'a dyn StackRules,
    cards: Vec<Card>,
}

impl<'a> ClonedStack<'a> {
    /// Clone `stack` with `cards` as its contents.
    pub fn of(stack: StackRef<'a>, cards: &[Card]) -> Self {
        Self {
            id: stack.id,
            role: stack.role,
            cap: stack.cap,
            rules: stack.rules,
            cards: cards.to_vec(),
        }
    }

    /// Clone `stack` with its current cards followed by `extra`.
    pub fn with_appended(stack: StackRef<'a>, extra: &[Card]) -> Self {
        let mut clone = Self::of(stack, stack.cards);
        clone.cards.extend_from_slice(extra);
        clone
    }

    pub fn view(&self) -> StackRef<'_> {
        StackRef {
            id: self.id,
            role: self.role,
            cap: self.cap,
            rules: self.rules,
            cards: &self.cards,
        }
    }

    #[inline]
    pub fn id(&self) -> StackId {
        self.id
    }

    #[inline]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[inline]
    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn pop(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Remove the top `n` cards; `None` if the clone holds fewer.
    pub fn take_top(&mut self, n: usize) -> Option<Vec<Card>> {
        let start = self.cards.len().checked_sub(n)?;
        Some(self.cards.split_off(start))
    }

    pub fn extend(&mut self, cards: Vec<Card>) {
        self.cards.extend(cards);
    }

    /// Turn the top card face up; true if it was face down.
    pub fn flip_top(&mut self) -> bool {
        match self.cards.last_mut() {
            Some(card) if !card.face_up => {
                card.face_up = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Position, Rank, Suit};
    use crate::rules::{row_cap, RowRules, SequenceKind};
    use std::sync::Arc;

    #[test]
    fn test_clone_answers_like_original_without_touching_it() {
        let mut table = Position::new(1);
        let row = table
            .add_stack(
                StackRole::Row,
                row_cap(None),
                Arc::new(RowRules::new(SequenceKind::AlternateColor)),
            )
            .unwrap();
        let other = table
            .add_stack(
                StackRole::Row,
                row_cap(None),
                Arc::new(RowRules::new(SequenceKind::AlternateColor)),
            )
            .unwrap();
        table.stack_mut(row).unwrap().cards = vec![
            Card::up(Suit::Spades, Rank::Nine),
            Card::up(Suit::Hearts, Rank::Eight),
        ];
        let before = table.snapshot();

        let mut clone = ClonedStack::of(table.view(row), &table.view(row).cards[..1]);
        assert_eq!(clone.id(), row);
        let eight = [Card::up(Suit::Diamonds, Rank::Eight)];
        assert!(clone.view().accepts_cards(&table, table.view(other), &eight));
        clone.push(eight[0]);
        assert!(!clone.view().accepts_cards(&table, table.view(other), &eight));
        assert_eq!(clone.take_top(3), None);
        assert_eq!(clone.take_top(1), Some(eight.to_vec()));

        let grown = ClonedStack::with_appended(table.view(other), &eight);
        assert_eq!(grown.cards().len(), 1);
        assert_eq!(table.snapshot(), before);
    }

    #[test]
    fn test_flip_top_only_flips_face_down() {
        let mut table = Position::new(1);
        let row = table
            .add_stack(
                StackRole::Row,
                row_cap(None),
                Arc::new(RowRules::new(SequenceKind::Rank)),
            )
            .unwrap();
        let mut clone = ClonedStack::of(table.view(row), &[Card::new(Suit::Clubs, Rank::Two)]);
        assert!(clone.flip_top());
        assert!(!clone.flip_top());
        assert!(table.view(row).is_empty());
    }
}
