//! Move-hint and solver-advisory engine for solitaire card games.

pub mod clone;
pub mod config;
pub mod constants;
pub mod demo;
pub mod engine;
pub mod error;
pub mod games;
pub mod hint;
pub mod hint_engine;
pub mod rules;
pub mod solver;
pub mod strategy;

pub use engine::{Card, Position, Rank, StackId, StackRole, Suit};
pub use hint::{AtomicHint, HintColor, HintKind, HintLevel};
pub use hint_engine::HintEngine;
pub use strategy::{DefaultHint, HintStrategy};
