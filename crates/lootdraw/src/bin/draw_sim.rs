//! # Draw Simulator
//!
//! Runs every pool in a draw configuration through a Monte-Carlo simulation
//! and prints the empirical rarity distribution next to the configured rates.
//!
//! ```text
//! draw_sim data/draws.toml --draws 1000000 --pool standard --seed 42
//! ```
//!
//! Set `RUST_LOG=lootdraw=debug` for per-pool simulation logs.

use lootdraw::rng::ChaChaSource;
use lootdraw::stats::{self, DrawStatistics};
use lootdraw::{EngineConfig, Pool, Rarity};
use tracing_subscriber::EnvFilter;

const DEFAULT_DRAWS: u64 = 100_000;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lootdraw=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         LOOTDRAW SIMULATOR                                       ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        println!("Usage: draw_sim <config.toml>");
        println!();
        println!("Options:");
        println!("  --draws <n>    Draws per pool (default {DEFAULT_DRAWS})");
        println!("  --pool <id>    Only simulate this pool");
        println!("  --seed <n>     Override the configured seed");
        std::process::exit(2);
    }

    let option = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
    };
    let draws: u64 = option("--draws").and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_DRAWS);
    let pool_filter = option("--pool");
    let seed_override: Option<u64> = option("--seed").and_then(|s| s.parse().ok());

    let config = match EngineConfig::load(&args[1]) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let seed = seed_override.or(config.settings.seed);

    let pools: Vec<&Pool> = config
        .pools
        .iter()
        .filter(|pool| pool_filter.map_or(true, |id| &pool.id == id))
        .collect();
    if pools.is_empty() {
        eprintln!("Error: no matching pools in {}", args[1]);
        std::process::exit(1);
    }

    for pool in pools {
        let mut rng = ChaChaSource::for_pool(seed, &pool.id);
        match stats::simulate(pool, &config.settings, draws, &mut rng) {
            Ok(result) => print_report(pool, &config, &result),
            Err(e) => eprintln!("Error: pool {}: {e}", pool.id),
        }
    }
}

fn print_report(pool: &Pool, config: &EngineConfig, result: &DrawStatistics) {
    let table = pool.rates.as_ref().unwrap_or(&config.settings.rates);
    let total = table.total();

    println!("┌─ {} ({:?}) ", pool.id, pool.kind);
    println!("│ Draws:              {}", result.total_draws);
    println!("│ Top rarity hits:    {}", result.top_rarity_hits);
    println!("│ Featured hits:      {}", result.featured_hits);
    println!("│ Longest pity:       {}", result.longest_pity);
    if let Some(mean) = result.mean_draws_per_top() {
        println!("│ Draws per top:      {mean:.2}");
    }
    println!("│");
    println!("│ {:<12} {:>10} {:>10}", "rarity", "base %", "observed %");
    for rarity in Rarity::ALL.into_iter().rev() {
        let base = if total > 0.0 { table.weight(rarity) / total * 100.0 } else { 0.0 };
        println!(
            "│ {:<12} {:>10.3} {:>10.3}",
            rarity.as_str(),
            base,
            result.rarity_percent(rarity)
        );
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
}
