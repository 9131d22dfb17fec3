use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use song_schema::{format_pattern, DifficultyKey, SongCatalog};
use tiles_core::rules::{PerformancePreset, Rules};
use tiles_core::store::{HighScoreStore, JsonFileHighScores, MemoryHighScores};
use tiles_runner::{InputPlan, SimulationConfig};

mod simulate;

#[derive(Debug, Parser)]
#[command(name = "tiles")]
#[command(about = "Rhythm tile engine CLI", long_about = None)]
struct Cli {
    /// Song catalog JSON (defaults to the built-in songs)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the songs in the catalog
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// Play a song headlessly and print the result
    Simulate {
        song: String,
        #[arg(short, long, default_value_t = DifficultyKey::Normal)]
        difficulty: DifficultyKey,
        #[command(flatten)]
        rules: RulesArgs,
        /// Input script JSON instead of autoplay
        #[arg(long, conflicts_with = "idle")]
        script: Option<PathBuf>,
        /// Play no input at all
        #[arg(long)]
        idle: bool,
        /// Track length in milliseconds
        #[arg(long, default_value_t = 30_000.0)]
        length: f64,
        /// High score file; results are kept in memory when omitted
        #[arg(long)]
        scores: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Print the first beat-slots a run would spawn
    Timeline {
        song: String,
        #[arg(short, long, default_value_t = DifficultyKey::Normal)]
        difficulty: DifficultyKey,
        #[command(flatten)]
        rules: RulesArgs,
        #[arg(long, default_value_t = 16)]
        slots: usize,
    },
}

#[derive(Debug, clap::Args)]
struct RulesArgs {
    /// Rules JSON; missing fields keep their defaults
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Spawn caps preset: standard or constrained
    #[arg(long)]
    preset: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
}

impl RulesArgs {
    fn resolve(&self) -> anyhow::Result<Rules> {
        let mut rules = match &self.rules {
            Some(path) => tiles_runner::load_rules_from_path(path)?,
            None => Rules::default(),
        };
        if let Some(name) = &self.preset {
            let preset: PerformancePreset = name.parse()?;
            rules.caps = preset.caps();
        }
        if let Some(seed) = self.seed {
            rules.seed = seed;
        }
        rules.validate().context("invalid rules")?;
        Ok(rules)
    }
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<SongCatalog> {
    match path {
        Some(path) => tiles_runner::load_catalog_from_path(path),
        None => Ok(SongCatalog::builtin()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let catalog = load_catalog(cli.catalog.as_ref())?;

    match cli.command {
        Command::Catalog { json } => {
            if json {
                let out = serde_json::to_string_pretty(&catalog).context("failed to serialize catalog")?;
                println!("{out}");
            } else {
                for song in &catalog.songs {
                    let difficulties: Vec<&str> = song.difficulties.keys().map(|k| k.as_str()).collect();
                    let pattern = song.pattern.as_deref().map(format_pattern).unwrap_or_else(|| "-".to_string());
                    println!(
                        "{} - {} | {:.0} bpm | {} | {}",
                        song.title,
                        song.artist,
                        song.bpm,
                        difficulties.join("/"),
                        pattern
                    );
                }
            }
        }
        Command::Simulate {
            song,
            difficulty,
            rules,
            script,
            idle,
            length,
            scores,
            json,
        } => {
            let song = catalog
                .find(&song)
                .with_context(|| format!("unknown song: {song}"))?;
            let rules = rules.resolve()?;
            let input = match script {
                Some(path) => InputPlan::Scripted(tiles_runner::load_script_from_path(&path)?),
                None if idle => InputPlan::Idle,
                None => InputPlan::Autoplay,
            };
            let config = SimulationConfig {
                track_length_ms: length,
                input,
                ..SimulationConfig::default()
            };
            let store: Box<dyn HighScoreStore> = match scores {
                Some(path) => Box::new(JsonFileHighScores::new(path)),
                None => Box::new(MemoryHighScores::new()),
            };

            let report = tiles_runner::simulate(song, difficulty, rules, &config, store.as_ref())?;
            if json {
                let out = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
                println!("{out}");
            } else {
                simulate::print_report(&report);
            }
        }
        Command::Timeline {
            song,
            difficulty,
            rules,
            slots,
        } => {
            let song = catalog
                .find(&song)
                .with_context(|| format!("unknown song: {song}"))?;
            let rules = rules.resolve()?;
            let rows = tiles_runner::spawn_timeline(song, difficulty, &rules, slots)
                .with_context(|| format!("cannot schedule {} [{difficulty}]", song.title))?;
            simulate::print_timeline(song, difficulty, &rows);
        }
    }

    Ok(())
}
