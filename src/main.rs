use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use solitaire_hint::config::{self, Config};
use solitaire_hint::constants::PRODUCT_NAME;
use solitaire_hint::demo::run_demo;
use solitaire_hint::games::GameFamily;
use solitaire_hint::solver::board::import_board;
use solitaire_hint::solver::process::{probe, SolverCommand};
use solitaire_hint::solver::{SolverAdapter, SolverHint, SolverKind};
use solitaire_hint::{HintEngine, HintLevel, HintStrategy, Position, Rank};

#[derive(Parser)]
#[command(name = "mdhint", version, about = PRODUCT_NAME)]
struct Cli {
    /// Config file to use instead of the per-user hints.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
#[command(rename_all = "kebab-case")]
enum Cmd {
    /// Print the ranked hints for a position
    Hint {
        /// klondike, klondike3, freecell, bakers, yukon
        #[arg(long, default_value = "klondike")]
        game: String,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Solver board text to load instead of dealing
        #[arg(long)]
        board: Option<PathBuf>,
        /// 0 = player hint, 1 = exact scores, 2 = demo
        #[arg(long, default_value_t = 0)]
        level: u8,
        /// Use the external solver where the game has one
        #[arg(long)]
        solver: bool,
    },
    /// Play a position automatically
    Demo {
        #[arg(long, default_value = "klondike")]
        game: String,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long)]
        board: Option<PathBuf>,
        /// Give up after this many moves
        #[arg(long, default_value_t = 500)]
        steps: usize,
        #[arg(long)]
        solver: bool,
    },
    /// Check which external solvers are installed
    Probe,
}

fn init_logging() {
    let env = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut cfg = match path {
        Some(p) => {
            if !p.exists() {
                warn!(path = %p.display(), "config file not found, using defaults");
            }
            Config::load_from(p)
        }
        None => match config::load_or_default() {
            Ok((cfg, _paths)) => return Ok(cfg),
            Err(err) => {
                warn!(%err, "no config directory, using defaults");
                Config::default()
            }
        },
    };
    cfg.apply_env();
    Ok(cfg)
}

fn family(name: &str) -> Result<GameFamily> {
    GameFamily::parse(name).with_context(|| format!("unknown game `{name}`"))
}

fn position(family: GameFamily, seed: u64, board: Option<&Path>) -> Result<Position> {
    let Some(path) = board else {
        return family.deal(seed).context("deal");
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("read board {}", path.display()))?;
    let mut table = family.layout().context("build layout")?;
    import_board(&mut table, &text, Rank::Ace)
        .with_context(|| format!("import board {}", path.display()))?;
    Ok(table)
}

fn engine(family: GameFamily, table: &Position, cfg: &Config, solver: bool) -> Result<HintEngine> {
    let game = family.solver_game().filter(|_| solver && cfg.solver.enabled);
    if solver && game.is_none() {
        warn!(?family, "no external solver for this game, using heuristics");
    }
    let strategy: Box<dyn HintStrategy> = match game {
        Some(game) => {
            let adapter = SolverAdapter::for_position(table, game, &cfg.solver)
                .context("set up solver")?;
            Box::new(SolverHint::new(adapter, family.strategy()))
        }
        None => Box::new(family.strategy()),
    };
    Ok(HintEngine::with_settings(strategy, cfg.hints))
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::Hint {
            game,
            seed,
            board,
            level,
            solver,
        } => {
            let family = family(&game)?;
            let table = position(family, seed, board.as_deref())?;
            let engine = engine(family, &table, &cfg, solver)?;
            let hints = engine.get_hints(&table, HintLevel::from_number(level), None);
            println!("{} hint(s) from {}", hints.len(), engine.strategy_name());
            for hint in &hints {
                println!("{hint}");
            }
        }
        Cmd::Demo {
            game,
            seed,
            board,
            steps,
            solver,
        } => {
            let family = family(&game)?;
            let mut table = position(family, seed, board.as_deref())?;
            let engine = engine(family, &table, &cfg, solver)?;
            let outcome = run_demo(&engine, &mut table, steps).context("demo play")?;
            println!(
                "{} move(s), {}",
                outcome.steps,
                if outcome.won {
                    "won"
                } else if outcome.stalled {
                    "stuck"
                } else {
                    "step limit reached"
                }
            );
        }
        Cmd::Probe => {
            for (kind, line) in [
                (SolverKind::FreeCell, &cfg.solver.fc_solve_command),
                (SolverKind::BlackHole, &cfg.solver.black_hole_command),
            ] {
                let available = SolverCommand::parse(line)
                    .is_some_and(|cmd| probe(&cmd, &|l| kind.recognizes_banner(l)));
                println!(
                    "{kind:?}: {line} ({})",
                    if available { "available" } else { "not found" }
                );
            }
        }
    }
    Ok(())
}
