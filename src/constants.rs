// Shared score constants for the hint engine.
// Each pipeline step scores inside its own band so bands never overlap.

pub const PRODUCT_NAME: &str = "Solitaire Hints";

// Score value so that the scores look nicer (King + 1).
pub const K: u32 = 13;

// Flip and deal defaults.
pub const SCORE_FLIP: u32 = 100_000;
pub const SCORE_DEAL: u32 = 0;
pub const SCORE_HIGH: u32 = 90_000;
pub const SCORE_FORCED: u32 = 999_999;
pub const FLATTEN_BUCKET: u32 = 10_000;

// Drop to foundation (step 1a).
pub const SCORE_DROP_RUN: u32 = 93_000;
pub const SCORE_DROP_NEAR_BASE: u32 = 92_000;
pub const SCORE_DROP_LAST_CARD: u32 = 91_000;
pub const SCORE_DROP_CLEARS_STACK: u32 = 90_000;
pub const SCORE_DROP_OTHER: u32 = 50_000;
pub const SCORE_DROP_FROM_TALON: u32 = 25_000;

// Pile moves onto rows (step 1b).
pub const SCORE_MOVE_TO_PILE: u32 = 80_000;
pub const SCORE_MOVE_TO_EMPTY: u32 = 60_000;
pub const SCORE_WASTE_TO_EMPTY: u32 = 30_000;
pub const SCORE_WASTE_TO_PILE: u32 = 31_000;

// Later pipeline steps.
pub const SCORE_ENABLE_DROP: u32 = 40_000;
pub const SCORE_FOUNDATION_TO_ROW: u32 = 20_000;
pub const SCORE_ROW_TO_RESERVE: u32 = 10_000;
pub const SCORE_RESERVE_TO_ROW: u32 = 5_000;

// Iteration cap handed to the external solver.
pub const SOLVER_MAX_ITERS: u32 = 200_000;
