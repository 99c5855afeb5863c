//! cachetable CLI
//!
//! Walk-throughs of table callbacks, data loaders, and expiry, plus a
//! multi-threaded load generator.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cachetable_core::CacheError;
use cachetable_engine::{Item, Logger, Table, TableConfig};
use cachetable_registry::Registry;

/// cachetable - concurrent in-process cache with per-item expiration
#[derive(Parser)]
#[command(name = "cachetable")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit log events as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Table configuration file (JSON)
    #[arg(long, global = true, env = "CACHETABLE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk an item through its callbacks
    Callbacks {
        /// Life span of the demo item in milliseconds
        #[arg(long, default_value = "500")]
        ttl_ms: u64,
    },

    /// Fill a table through a data loader
    Loader {
        /// Number of keys to look up
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Show keep-alive and expiry timing
    Expire {
        /// Life span of the item in milliseconds
        #[arg(long, default_value = "200")]
        ttl_ms: u64,
        /// Idle time before the final lookup in milliseconds
        #[arg(long, default_value = "300")]
        idle_ms: u64,
    },

    /// Run a concurrent add/value/delete load
    Bench {
        /// Worker threads
        #[arg(short, long, default_value = "4")]
        threads: usize,
        /// Operations per thread
        #[arg(short, long, default_value = "100000")]
        ops: u64,
        /// Life span of added items in milliseconds (0 = never expire)
        #[arg(long, default_value = "50")]
        ttl_ms: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "cachetable=debug,info"
    } else {
        "cachetable=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(cli.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Callbacks { ttl_ms } => cmd_callbacks(config, Duration::from_millis(ttl_ms)),
        Commands::Loader { count } => cmd_loader(config, count),
        Commands::Expire { ttl_ms, idle_ms } => cmd_expire(
            config,
            Duration::from_millis(ttl_ms),
            Duration::from_millis(idle_ms),
        ),
        Commands::Bench { threads, ops, ttl_ms } => {
            cmd_bench(config, threads, ops, Duration::from_millis(ttl_ms))
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TableConfig> {
    let Some(path) = path else {
        return Ok(TableConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = TableConfig::from_json(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    info!(?config, "Loaded table configuration");
    Ok(config)
}

fn registry(config: TableConfig) -> Result<Registry<String, String>> {
    let registry = Registry::with_config(config)?;
    registry.set_logger(Logger::current());
    Ok(registry)
}

/// Walk an item through its callbacks
fn cmd_callbacks(config: TableConfig, ttl: Duration) -> Result<()> {
    println!("{}", "🔔 Callback walk-through".cyan().bold());

    let registry = registry(config)?;
    let table = registry.table("callbacks")?;

    table.set_added_item_callback(|item: &Item<String, String>| {
        println!("   {} {} = {}", "added".green(), item.key(), *item.data());
    });
    table.set_about_to_delete_item_callback(|item: &Item<String, String>| {
        println!(
            "   {} {} after {} hits",
            "deleting".yellow(),
            item.key(),
            item.access_count()
        );
    });

    table.add("someKey".into(), Duration::ZERO, "This is a test!".into());
    let item = table.value(&"someKey".to_string())?;
    println!("   found: {}", *item.data());
    table.delete(&"someKey".to_string())?;

    println!("\n{}", format!("Adding an item that expires after {ttl:?}...").dimmed());
    let item = table.add("anotherKey".into(), ttl, "This is another test".into());
    item.set_about_to_expire_callback(|key: &String| {
        println!("   {} {}", "expiring".red(), key);
    });

    thread::sleep(ttl + Duration::from_millis(100));
    match table.value(&"anotherKey".to_string()) {
        Err(CacheError::KeyNotFound) => println!("   {} item is gone", "✓".green()),
        Ok(_) => println!("   {} item is still cached", "✗".red()),
        Err(err) => return Err(err.into()),
    }

    registry.shutdown();
    Ok(())
}

/// Fill a table through a data loader
fn cmd_loader(config: TableConfig, count: usize) -> Result<()> {
    println!("{} {} keys", "📥 Loading".cyan().bold(), count);

    let registry = registry(config)?;
    let table = registry.table("loader")?;
    table.set_data_loader(|key: &String, _: &[&dyn Any]| {
        Some(Item::new(
            key.clone(),
            Duration::ZERO,
            format!("This is a test with key {key}"),
        ))
    });

    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let mut loaded = Vec::with_capacity(count);
    for i in 0..count {
        let item = table.value(&format!("someKey_{i}"))?;
        loaded.push(item.data().clone());
        pb.inc(1);
    }
    pb.finish_and_clear();

    for value in &loaded {
        println!("   {value}");
    }
    println!("   {} {} items cached", "✓".green(), table.count());

    registry.shutdown();
    Ok(())
}

/// Show keep-alive and expiry timing
fn cmd_expire(config: TableConfig, ttl: Duration, idle: Duration) -> Result<()> {
    println!(
        "{} life span {:?}, idle {:?}",
        "⏱  Expiry".cyan().bold(),
        ttl,
        idle
    );

    let registry = registry(config)?;
    let table = registry.table("expire")?;
    let key = "x".to_string();
    table.add(key.clone(), ttl, "v".into());

    let half = ttl / 2;
    for round in 1..=3 {
        thread::sleep(half);
        let item = table.value(&key)?;
        println!(
            "   {} after {:?}: hit #{} resets the window",
            format!("round {round}").dimmed(),
            half,
            item.access_count()
        );
    }

    thread::sleep(idle);
    let status = match table.value(&key) {
        Ok(_) => "still cached".yellow(),
        Err(err) if err.is_not_found() => "expired".green(),
        Err(err) => return Err(err.into()),
    };
    println!("   after {:?} idle: {}", idle, status);

    registry.shutdown();
    Ok(())
}

/// Run a concurrent add/value/delete load
fn cmd_bench(config: TableConfig, threads: usize, ops: u64, ttl: Duration) -> Result<()> {
    println!(
        "{} {} threads × {} ops",
        "📊 Benchmarking with".cyan().bold(),
        threads,
        ops
    );

    let table: Table<u64, u64> = Table::with_config("bench", config)?;
    table.set_logger(Logger::current());

    let keyspace = ops.max(1);
    let hits = AtomicU64::new(0);
    let misses = AtomicU64::new(0);

    let pb = ProgressBar::new(threads as u64 * ops);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len} ops")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    thread::scope(|scope| {
        for t in 0..threads as u64 {
            let (table, pb, hits, misses) = (&table, &pb, &hits, &misses);
            scope.spawn(move || {
                for i in 0..ops {
                    let key = (t.wrapping_mul(7_919) + i.wrapping_mul(31)) % keyspace;
                    match i % 10 {
                        0..=6 => match table.value(&key) {
                            Ok(_) => {
                                hits.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(_) => {
                                misses.fetch_add(1, Ordering::Relaxed);
                                table.not_found_add(key, ttl, i);
                            }
                        },
                        7 | 8 => {
                            table.add(key, ttl, i);
                        }
                        _ => {
                            let _ = table.delete(&key);
                        }
                    }
                    if i % 1_000 == 999 {
                        pb.inc(1_000);
                    }
                }
                pb.inc(ops % 1_000);
            });
        }
    });
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    let total = threads as u64 * ops;
    let rate = total as f64 / elapsed.as_secs_f64();
    let hits = hits.load(Ordering::Relaxed);
    let misses = misses.load(Ordering::Relaxed);

    println!("\n{}", "📈 Results:".green().bold());
    println!("   Elapsed: {:?}", elapsed);
    println!("   Throughput: {:.0} ops/sec", rate);
    println!(
        "   Lookups: {} hits, {} misses ({:.1}% hit rate)",
        hits,
        misses,
        100.0 * hits as f64 / (hits + misses).max(1) as f64
    );
    println!("   Items cached: {}", table.count());

    println!("\n{}", "🏆 Most accessed:".green().bold());
    for item in table.most_accessed(5) {
        println!("   key {:>8}  {} hits", item.key(), item.access_count());
    }

    table.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bench() {
        let cli = Cli::parse_from(["cachetable", "bench", "--threads", "2", "--ops", "10", "-v"]);
        assert!(cli.verbose);
        assert!(!cli.log_json);
        match cli.command {
            Commands::Bench { threads, ops, ttl_ms } => {
                assert_eq!((threads, ops, ttl_ms), (2, 10, 50));
            }
            _ => panic!("expected bench"),
        }
    }

    #[test]
    fn test_parse_log_json() {
        let cli = Cli::parse_from(["cachetable", "loader", "--log-json", "-c", "3"]);
        assert!(cli.log_json);
        assert!(matches!(cli.command, Commands::Loader { count: 3 }));
    }

    #[test]
    fn test_load_config_default() {
        assert_eq!(load_config(None).unwrap(), TableConfig::default());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/cachetable.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
