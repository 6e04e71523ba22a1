//! External solver integration (fc-solve and black-hole-solve).
//!
//! The adapter writes the position as board text, runs the solver with an
//! iteration cap, and replays the move list on cloned stacks to turn the
//! solver's stack numbers into our stack ids. The result is one forced
//! chain: acting on its head and asking again walks the whole solution.

pub mod board;
pub mod process;
pub mod protocol;

use tracing::{debug, warn};

use crate::clone::ClonedStack;
use crate::config::SolverSettings;
use crate::engine::{Card, Position, Rank, StackId};
use crate::error::{BoardError, SolverError};
use crate::hint::{thread_chain, AtomicHint, HintColor};
use crate::strategy::{DefaultHint, HintContext, HintStrategy};

use self::board::{
    black_hole_board, card_token, check_limits, freecell_board, MAX_BLACK_HOLE_ROWS, MAX_ROWS,
};
use self::process::{probe, SolverCommand, SolverProcess};
use self::protocol::{read_transcript, Place, RecordedMove, SolverOutcome, Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    FreeCell,
    BlackHole,
}

impl SolverKind {
    /// Does the first line of `--help` come from this solver?
    pub fn recognizes_banner(self, line: &str) -> bool {
        match self {
            SolverKind::FreeCell => line.starts_with("fc-solve"),
            SolverKind::BlackHole => line.to_ascii_lowercase().contains("black-hole"),
        }
    }

    pub fn max_rows(self) -> usize {
        match self {
            SolverKind::FreeCell => MAX_ROWS,
            SolverKind::BlackHole => MAX_BLACK_HOLE_ROWS,
        }
    }
}

/// Per-game solver options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverGame {
    pub kind: SolverKind,
    /// `--preset` for fc-solve, `--game` for black-hole-solve.
    pub preset: Option<String>,
    pub sequences_built_by: Option<String>,
    pub sequence_move: Option<String>,
    pub empty_stacks_filled_by: Option<String>,
    /// Rank written as `A`; defaults to the first foundation's base rank.
    pub base_rank: Option<Rank>,
}

impl SolverGame {
    pub fn freecell() -> Self {
        Self {
            kind: SolverKind::FreeCell,
            preset: None,
            sequences_built_by: None,
            sequence_move: None,
            empty_stacks_filled_by: None,
            base_rank: None,
        }
    }

    pub fn black_hole(game: &str) -> Self {
        Self {
            kind: SolverKind::BlackHole,
            preset: Some(game.to_string()),
            ..Self::freecell()
        }
    }
}

#[derive(Debug)]
pub struct SolverAdapter {
    game: SolverGame,
    command: SolverCommand,
    max_iters: u32,
    load_config: Option<String>,
    base_rank: Rank,
}

impl SolverAdapter {
    /// Layouts the solver cannot describe are rejected here, once.
    pub fn for_position(
        table: &Position,
        game: SolverGame,
        settings: &SolverSettings,
    ) -> Result<Self, BoardError> {
        check_limits(table, game.kind.max_rows())?;
        if game.kind == SolverKind::BlackHole && table.foundations().len() != 1 {
            return Err(BoardError::FoundationCount(table.foundations().len()));
        }
        let base_rank = game
            .base_rank
            .or_else(|| {
                table
                    .foundations()
                    .first()
                    .and_then(|&f| table.view(f).cap.base_rank)
            })
            .unwrap_or(Rank::Ace);
        let line = match game.kind {
            SolverKind::FreeCell => &settings.fc_solve_command,
            SolverKind::BlackHole => &settings.black_hole_command,
        };
        let command = SolverCommand::parse(line).ok_or_else(|| BoardError::Malformed {
            line: 0,
            message: "empty solver command".into(),
        })?;
        Ok(Self {
            game,
            command,
            max_iters: settings.max_iters,
            load_config: settings.preset.clone().filter(|p| p != "none"),
            base_rank,
        })
    }

    pub fn with_command(mut self, command: SolverCommand) -> Self {
        self.command = command;
        self
    }

    pub fn command(&self) -> &SolverCommand {
        &self.command
    }

    pub fn is_available(&self) -> bool {
        let kind = self.game.kind;
        probe(&self.command, &|line| kind.recognizes_banner(line))
    }

    pub fn board(&self, table: &Position) -> String {
        match self.game.kind {
            SolverKind::FreeCell => {
                let simple_simon = self.game.preset.as_deref() == Some("simple_simon");
                freecell_board(table, self.base_rank, simple_simon)
            }
            SolverKind::BlackHole => black_hole_board(table, self.base_rank),
        }
    }

    pub fn args(&self, table: &Position) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self.game.kind {
            SolverKind::FreeCell => {
                args.extend(["-m", "-p", "-opt", "-sel"].map(String::from));
                if let Some(preset) = &self.load_config {
                    push_flag(&mut args, "--load-config", preset);
                }
                push_flag(&mut args, "--max-iters", self.max_iters);
                push_flag(&mut args, "--decks-num", table.decks);
                push_flag(&mut args, "--stacks-num", table.rows().len());
                push_flag(&mut args, "--freecells-num", table.reserves().len());
                let game = &self.game;
                for (flag, value) in [
                    ("--preset", &game.preset),
                    ("--sequences-are-built-by", &game.sequences_built_by),
                    ("--sequence-move", &game.sequence_move),
                    ("--empty-stacks-filled-by", &game.empty_stacks_filled_by),
                ] {
                    if let Some(value) = value {
                        push_flag(&mut args, flag, value);
                    }
                }
            }
            SolverKind::BlackHole => {
                let game = self.game.preset.as_deref().unwrap_or("black_hole");
                push_flag(&mut args, "--game", game);
                args.push("--rank-reach-prune".to_string());
                push_flag(&mut args, "--max-iters", self.max_iters);
            }
        }
        args
    }

    fn run(&self, table: &Position) -> Result<Transcript, SolverError> {
        let board = self.board(table);
        let args = self.args(table);
        debug!(command = %self.command, ?args, "running solver");
        let mut process = SolverProcess::spawn(&self.command, &args)?;
        process.feed(&board)?;
        let transcript = read_transcript(process.output()?)?;
        let status = process.finish()?;
        if !status.success() {
            debug!(%status, "solver exited with failure status");
        }
        Ok(transcript)
    }

    /// The solution as one forced chain, or nothing. Never fails.
    pub fn solve(&self, table: &Position) -> Vec<AtomicHint> {
        let transcript = match self.run(table) {
            Ok(t) => t,
            Err(err) => {
                warn!(%err, "solver run failed");
                return Vec::new();
            }
        };
        if transcript.outcome != Some(SolverOutcome::Solved) {
            debug!(outcome = ?transcript.outcome, "no solution");
            return Vec::new();
        }
        if transcript.moves.is_empty() {
            return Vec::new();
        }
        match self.replay(table, &transcript) {
            Some(hints) => {
                debug!(moves = transcript.moves.len(), chain = hints.len(), "solution replayed");
                thread_chain(hints).into_iter().collect()
            }
            None => Vec::new(),
        }
    }

    /// Translate solver moves into hints by playing them on clones.
    /// `None` when a move does not fit the simulated position.
    pub fn replay(&self, table: &Position, transcript: &Transcript) -> Option<Vec<AtomicHint>> {
        let mut sim: Vec<ClonedStack<'_>> = table
            .all_stacks()
            .map(|s| ClonedStack::of(s, s.cards))
            .collect();
        let mut hints = Vec::with_capacity(transcript.moves.len());

        for (step, rec) in transcript.moves.iter().enumerate() {
            let Some(from) = self.source(table, &sim, rec) else {
                warn!(step, mv = ?rec.mv, "solver move names an unknown source");
                return None;
            };
            let n = rec.mv.ncards;
            let held = sim[from.0].cards().len();
            if n == 0 || n > held {
                warn!(step, held, wanted = n, "solver move takes more cards than the stack holds");
                return None;
            }
            let moving: Vec<Card> = sim[from.0].cards()[held - n..].to_vec();
            let to = match rec.mv.to {
                Place::Stack(i) => table.rows().get(i).copied(),
                Place::Freecell(i) => free_cell(table, &sim, i),
                Place::Foundations => table.foundations().iter().copied().find(|&f| {
                    sim[f.0]
                        .view()
                        .accepts_cards(table, sim[from.0].view(), &moving)
                }),
            };
            let Some(to) = to else {
                warn!(step, mv = ?rec.mv, "solver move has no matching destination");
                return None;
            };
            let cards = sim[from.0].take_top(n)?;
            sim[to.0].extend(cards);
            hints.push(AtomicHint::forced_move(n, from, to, HintColor::Black));
            if sim[from.0].flip_top() {
                hints.push(AtomicHint::forced_flip(from));
            }
        }
        Some(hints)
    }

    fn source(&self, table: &Position, sim: &[ClonedStack<'_>], rec: &RecordedMove) -> Option<StackId> {
        match rec.mv.from {
            Place::Stack(i) => table.rows().get(i).copied(),
            Place::Freecell(i) => {
                let echoed = rec
                    .board
                    .as_ref()
                    .and_then(|b| b.freecells.get(i).cloned().flatten());
                match echoed {
                    // the echo names the card; find the cell that holds it
                    Some(token) => table.reserves().iter().copied().find(|&r| {
                        sim[r.0]
                            .top()
                            .is_some_and(|c| card_token(&c, self.base_rank) == token)
                    }),
                    None => table.reserves().get(i).copied(),
                }
            }
            Place::Foundations => None,
        }
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: impl ToString) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

/// Reserve `i` if it is empty, else the first empty reserve.
fn free_cell(table: &Position, sim: &[ClonedStack<'_>], i: usize) -> Option<StackId> {
    let reserves = table.reserves();
    reserves
        .get(i)
        .copied()
        .filter(|&r| sim[r.0].cards().is_empty())
        .or_else(|| reserves.iter().copied().find(|&r| sim[r.0].cards().is_empty()))
}

/// Solver-backed strategy; the heuristic takes over when no solver is installed.
#[derive(Debug)]
pub struct SolverHint {
    adapter: SolverAdapter,
    fallback: DefaultHint,
}

impl SolverHint {
    pub fn new(adapter: SolverAdapter, fallback: DefaultHint) -> Self {
        Self { adapter, fallback }
    }

    pub fn adapter(&self) -> &SolverAdapter {
        &self.adapter
    }
}

impl HintStrategy for SolverHint {
    fn name(&self) -> &'static str {
        "solver"
    }

    fn compute_hints(&self, ctx: &mut HintContext<'_>) {
        if !self.adapter.is_available() {
            debug!(fallback = self.fallback.name(), "solver unavailable");
            self.fallback.compute_hints(ctx);
            return;
        }
        for hint in self.adapter.solve(ctx.table) {
            ctx.hints.push(hint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Suit;
    use crate::games::GameFamily;
    use crate::hint::HintKind;
    use crate::solver::protocol::{BoardEcho, SolverMove};
    use pretty_assertions::assert_eq;

    fn adapter(table: &Position, game: SolverGame) -> SolverAdapter {
        SolverAdapter::for_position(table, game, &SolverSettings::default()).unwrap()
    }

    fn solved(moves: Vec<RecordedMove>) -> Transcript {
        Transcript {
            outcome: Some(SolverOutcome::Solved),
            moves,
            ..Transcript::default()
        }
    }

    fn rec(ncards: usize, from: Place, to: Place) -> RecordedMove {
        RecordedMove {
            mv: SolverMove { ncards, from, to },
            board: None,
        }
    }

    #[test]
    fn test_freecell_args() {
        let table = GameFamily::BakersGame.layout().unwrap();
        let game = GameFamily::BakersGame.solver_game().unwrap();
        let args = adapter(&table, game).args(&table);
        assert_eq!(
            args.join(" "),
            "-m -p -opt -sel --max-iters 200000 --decks-num 1 --stacks-num 8 \
             --freecells-num 4 --sequences-are-built-by suit"
        );
    }

    #[test]
    fn test_black_hole_needs_one_foundation() {
        let table = GameFamily::FreeCell.layout().unwrap();
        let err = SolverAdapter::for_position(
            &table,
            SolverGame::black_hole("black_hole"),
            &SolverSettings::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, BoardError::FoundationCount(4)));
    }

    #[test]
    fn test_row_limit_follows_solver_kind() {
        use crate::engine::StackRole;
        use crate::rules::{foundation_cap, row_cap, FoundationRules, RowRules, SequenceKind};
        use std::sync::Arc;

        let mut table = Position::new(1);
        table
            .add_stack(
                StackRole::Foundation,
                foundation_cap(None, false),
                Arc::new(FoundationRules::rank()),
            )
            .unwrap();
        let rules = Arc::new(RowRules::new(SequenceKind::Rank));
        for _ in 0..MAX_BLACK_HOLE_ROWS {
            table
                .add_stack(StackRole::Row, row_cap(None), rules.clone())
                .unwrap();
        }

        let settings = SolverSettings::default();
        assert!(
            SolverAdapter::for_position(&table, SolverGame::black_hole("black_hole"), &settings)
                .is_ok()
        );
        let err = SolverAdapter::for_position(&table, SolverGame::freecell(), &settings)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            BoardError::TooManyStacks { what: "rows", max: 10, actual: 17 }
        ));
    }

    #[test]
    fn test_replay_resolves_cells_and_foundations() {
        let mut table = GameFamily::FreeCell.layout().unwrap();
        let rows = table.rows().to_vec();
        let cells = table.reserves().to_vec();
        table.stack_mut(rows[0]).unwrap().cards = vec![
            Card::up(Suit::Hearts, Rank::Two),
            Card::up(Suit::Hearts, Rank::Ace),
        ];
        table.stack_mut(cells[2]).unwrap().cards = vec![Card::up(Suit::Spades, Rank::Ace)];
        let adapter = adapter(&table, SolverGame::freecell());

        let mut from_cell = rec(1, Place::Freecell(0), Place::Foundations);
        from_cell.board = Some(BoardEcho {
            freecells: vec![Some("AS".into()), None, None, None],
            ..BoardEcho::default()
        });
        let transcript = solved(vec![
            rec(1, Place::Stack(0), Place::Foundations),
            rec(1, Place::Stack(0), Place::Freecell(2)),
            from_cell,
        ]);
        let hints = adapter.replay(&table, &transcript).unwrap();
        let hearts = table
            .foundations()
            .iter()
            .copied()
            .find(|&f| table.view(f).cap.suit == Some(Suit::Hearts))
            .unwrap();
        let spades = table
            .foundations()
            .iter()
            .copied()
            .find(|&f| table.view(f).cap.suit == Some(Suit::Spades))
            .unwrap();
        assert_eq!(hints[0].to, Some(hearts));
        // cell 2 is taken, the card goes to the first empty one
        assert_eq!(hints[1].to, Some(cells[0]));
        assert_eq!((hints[2].from, hints[2].to), (cells[2], Some(spades)));
        // the live position is untouched
        assert_eq!(table.view(rows[0]).len(), 2);
    }

    #[test]
    fn test_replay_threads_flips_and_rejects_desync() {
        let mut table = GameFamily::FreeCell.layout().unwrap();
        let rows = table.rows().to_vec();
        table.stack_mut(rows[0]).unwrap().cards = vec![
            Card::new(Suit::Clubs, Rank::King),
            Card::up(Suit::Hearts, Rank::Ace),
        ];
        let adapter = adapter(&table, SolverGame::freecell());
        let hints = adapter
            .replay(&table, &solved(vec![rec(1, Place::Stack(0), Place::Foundations)]))
            .unwrap();
        assert_eq!(hints.len(), 2);
        assert_eq!(hints[1].kind(), HintKind::Flip);
        assert_eq!(hints[1].from, rows[0]);

        let bad = solved(vec![rec(3, Place::Stack(0), Place::Stack(1))]);
        assert!(adapter.replay(&table, &bad).is_none());
        let nowhere = solved(vec![rec(1, Place::Stack(1), Place::Foundations)]);
        assert!(adapter.replay(&table, &nowhere).is_none());
    }
}
