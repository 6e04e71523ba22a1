//! Atomic hints and the accumulator that ranks them.

use std::fmt;

use crate::constants::SCORE_FORCED;
use crate::engine::StackId;

/// How the hints are going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HintLevel {
    /// Player hint: scores are flattened into coarse buckets.
    Show = 0,
    /// Player hint with exact scores, for inspection.
    Score = 1,
    /// Automated demo play: flips and deals are suggested too.
    Demo = 2,
}

impl HintLevel {
    pub fn from_number(level: u8) -> Self {
        match level {
            0 => HintLevel::Show,
            1 => HintLevel::Score,
            _ => HintLevel::Demo,
        }
    }
}

/// Display colour of the score, only meaningful for debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HintColor {
    #[default]
    Black,
    Red,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Deal,
    Flip,
    Move,
}

/// One suggested action, plus the move that must follow it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicHint {
    pub score: u32,
    /// Insertion order; earlier hints win ties.
    pub tiebreak: usize,
    pub ncards: usize,
    pub from: StackId,
    pub to: Option<StackId>,
    pub color: HintColor,
    pub forced: Option<Box<AtomicHint>>,
}

impl AtomicHint {
    pub fn new(score: u32, ncards: usize, from: StackId, to: Option<StackId>) -> Self {
        Self {
            score,
            tiebreak: 0,
            ncards,
            from,
            to,
            color: HintColor::Black,
            forced: None,
        }
    }

    /// A committed follow-up move: top score, no tiebreak.
    pub fn forced_move(ncards: usize, from: StackId, to: StackId, color: HintColor) -> Self {
        Self {
            color,
            ..Self::new(SCORE_FORCED, ncards, from, Some(to))
        }
    }

    pub fn forced_flip(stack: StackId) -> Self {
        Self::new(SCORE_FORCED, 1, stack, Some(stack))
    }

    pub fn with_color(mut self, color: HintColor) -> Self {
        self.color = color;
        self
    }

    pub fn then(mut self, next: AtomicHint) -> Self {
        self.forced = Some(Box::new(next));
        self
    }

    pub fn kind(&self) -> HintKind {
        if self.ncards == 0 {
            HintKind::Deal
        } else if self.to == Some(self.from) {
            HintKind::Flip
        } else {
            HintKind::Move
        }
    }

    pub fn forced_next(&self) -> Option<&AtomicHint> {
        self.forced.as_deref()
    }

    /// This hint followed by its forced successors.
    pub fn chain(&self) -> impl Iterator<Item = &AtomicHint> {
        std::iter::successors(Some(self), |h| h.forced_next())
    }

    pub fn chain_len(&self) -> usize {
        self.chain().count()
    }
}

/// Thread `hints` into one forced chain, first hint at the head.
pub fn thread_chain(hints: Vec<AtomicHint>) -> Option<AtomicHint> {
    hints.into_iter().rev().fold(None, |next, mut hint| {
        hint.forced = next.map(Box::new);
        Some(hint)
    })
}

impl fmt::Display for AtomicHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            HintKind::Deal => write!(f, "{:>7}  deal from {}", self.score, self.from)?,
            HintKind::Flip => write!(f, "{:>7}  flip {}", self.score, self.from)?,
            HintKind::Move => {
                let to = self.to.map_or_else(|| "?".to_string(), |t| t.to_string());
                write!(
                    f,
                    "{:>7}  move {} card(s) {} -> {}",
                    self.score, self.ncards, self.from, to
                )?;
            }
        }
        let follow = self.chain_len() - 1;
        if follow > 0 {
            write!(f, "  (+{follow} forced)")?;
        }
        Ok(())
    }
}

/// Hints collected during one `get_hints` call.
#[derive(Debug, Clone, Default)]
pub struct HintList {
    hints: Vec<AtomicHint>,
    flatten: u32,
    max_score: u32,
}

impl HintList {
    /// Scores are flattened to multiples of `bucket` at `HintLevel::Show`.
    pub fn new(level: HintLevel, bucket: u32) -> Self {
        let flatten = if level == HintLevel::Show { bucket } else { 0 };
        Self {
            hints: Vec::new(),
            flatten,
            max_score: 0,
        }
    }

    pub fn add(
        &mut self,
        score: u32,
        ncards: usize,
        from: StackId,
        to: Option<StackId>,
        color: HintColor,
        forced: Option<AtomicHint>,
    ) {
        let mut hint = AtomicHint::new(score, ncards, from, to).with_color(color);
        hint.forced = forced.map(Box::new);
        self.push(hint);
    }

    /// Add a prepared hint; its score is flattened and its tiebreak assigned here.
    pub fn push(&mut self, mut hint: AtomicHint) {
        self.max_score = self.max_score.max(hint.score);
        if self.flatten > 0 {
            hint.score = (hint.score / self.flatten) * self.flatten;
        }
        hint.tiebreak = self.hints.len();
        self.hints.push(hint);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    /// Highest score added so far, before flattening.
    #[inline]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtomicHint> {
        self.hints.iter()
    }

    /// Best first; equal scores keep insertion order.
    pub fn into_sorted(mut self) -> Vec<AtomicHint> {
        self.hints
            .sort_by(|a, b| b.score.cmp(&a.score).then(a.tiebreak.cmp(&b.tiebreak)));
        self.hints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_keeps_insertion_order_within_bucket() {
        let mut list = HintList::new(HintLevel::Show, 10_000);
        list.add(90_010, 1, StackId(0), Some(StackId(1)), HintColor::Black, None);
        list.add(90_090, 1, StackId(2), Some(StackId(3)), HintColor::Black, None);
        let hints = list.into_sorted();
        assert_eq!(hints[0].score, hints[1].score);
        assert_eq!(hints[0].score, 90_000);
        assert_eq!(hints[0].from, StackId(0));
        assert_eq!(hints[1].from, StackId(2));
    }

    #[test]
    fn test_exact_scores_at_inspect_level() {
        let mut list = HintList::new(HintLevel::Score, 10_000);
        list.add(90_010, 1, StackId(0), Some(StackId(1)), HintColor::Black, None);
        list.add(90_090, 1, StackId(2), Some(StackId(3)), HintColor::Red, None);
        assert_eq!(list.max_score(), 90_090);
        let hints = list.into_sorted();
        assert_eq!(hints[0].score, 90_090);
        assert_eq!(hints[0].color, HintColor::Red);
        assert_eq!(hints[1].tiebreak, 0);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(AtomicHint::new(0, 0, StackId(0), None).kind(), HintKind::Deal);
        assert_eq!(AtomicHint::forced_flip(StackId(4)).kind(), HintKind::Flip);
        assert_eq!(
            AtomicHint::new(1, 2, StackId(0), Some(StackId(1))).kind(),
            HintKind::Move
        );
    }

    #[test]
    fn test_thread_chain_links_in_order() {
        let hints = (0..4)
            .map(|i| AtomicHint::forced_move(1, StackId(i), StackId(i + 10), HintColor::Black))
            .collect();
        let head = thread_chain(hints).unwrap();
        assert_eq!(head.chain_len(), 4);
        let froms: Vec<_> = head.chain().map(|h| h.from).collect();
        assert_eq!(froms, vec![StackId(0), StackId(1), StackId(2), StackId(3)]);
        assert!(thread_chain(Vec::new()).is_none());
    }
}
