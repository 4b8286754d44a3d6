//! AirSea Simulator CLI
//!
//! Run deterministic fleet scenarios against the tracking engine.

use airsea_core::TrackingConfig;
use airsea_sim::{ScenarioId, ScenarioResult, ScenarioRunner, SimExport};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// AirSea Deterministic Simulation CLI
#[derive(Parser, Debug)]
#[command(name = "airsea-sim")]
#[command(about = "Run deterministic fleet scenarios against the AirSea tracker", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,
    
    /// Number of simulated nodes
    #[arg(short, long, default_value = "8")]
    nodes: usize,
    
    /// Scenario to run (stationary_jitter, commute, gps_dropout, long_haul, garbage, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,
    
    /// Poll cycles per scenario (scenario default if omitted)
    #[arg(short, long)]
    cycles: Option<u64>,
    
    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,
    
    /// Movement threshold in meters for appending track points
    #[arg(long, default_value = "10.0")]
    threshold_m: f64,
    
    /// Maximum points kept per track
    #[arg(long, default_value = "200")]
    max_track_points: usize,
    
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
    
    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
    
    /// Export the final fleet state of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn main() {
    let args = Args::parse();
    
    // RUST_LOG wins over --verbose when set
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error: failed to set tracing subscriber: {}", e);
    }
    
    if !args.json {
        info!("AirSea Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
    
    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios: stationary_jitter, commute, gps_dropout, long_haul, garbage, all");
            std::process::exit(1);
        })]
    };
    
    if args.export.is_some() && (scenarios.len() > 1 || args.seeds > 1) {
        eprintln!("Error: --export only supports a single scenario and seed");
        std::process::exit(1);
    }
    
    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };
    
    let config = TrackingConfig {
        movement_threshold_m: args.threshold_m,
        max_track_points: args.max_track_points,
        ..TrackingConfig::default()
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    
    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut tally = RunTally::default();
    
    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        
        let mut runner = ScenarioRunner::new(seed, args.nodes).with_config(config);
        if let Some(cycles) = args.cycles {
            runner = runner.with_cycles(cycles);
        }
        
        for scenario in &scenarios {
            let result = runner.run(*scenario);
            
            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED | nodes={} tracks={} points={}",
                        scenario.name(),
                        seed,
                        result.final_node_count,
                        result.final_track_count,
                        result.metrics.track_points
                    );
                } else {
                    error!("✗ {} (seed={}) FAILED: {}", 
                        scenario.name(), 
                        seed, 
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
            
            if let Some(path) = &args.export {
                match SimExport::from_result(&result).write_to_file(path) {
                    Ok(()) => info!("Exported final state to {}", path),
                    Err(e) => {
                        error!("Failed to write export to {}: {}", path, e);
                        tally.export_failures += 1;
                    }
                }
            }
            
            tally.record(&result);
            all_results.push(result);
        }
    }
    
    if args.json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "total": tally.total,
            "passed": tally.total - tally.failed,
            "failed": tally.failed,
            "export_failures": tally.export_failures,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "cycles": r.cycles,
                    "nodes": r.final_node_count,
                    "tracks": r.final_track_count,
                    "metrics": r.metrics,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        
        if tally.failed == 0 {
            info!("{}", tally.headline());
        } else {
            error!("{}", tally.headline());
            
            // List failed seeds
            for result in all_results.iter().filter(|r| !r.passed) {
                error!("  - {} seed={}: {}", 
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }
    
    if let Some(line) = tally.export_line() {
        error!("{}", line);
    }
    
    // Exit with proper code for CI
    if !tally.is_success() {
        std::process::exit(1);
    }
}

/// Scenario outcomes and export errors, counted separately.
#[derive(Debug, Default)]
struct RunTally {
    total: usize,
    failed: usize,
    export_failures: usize,
}

impl RunTally {
    fn record(&mut self, result: &ScenarioResult) {
        self.total += 1;
        if !result.passed {
            self.failed += 1;
        }
    }
    
    fn headline(&self) -> String {
        if self.failed == 0 {
            format!("✅ All {} scenario runs passed!", self.total)
        } else {
            format!("❌ {}/{} scenario runs failed!", self.failed, self.total)
        }
    }
    
    fn export_line(&self) -> Option<String> {
        (self.export_failures > 0).then(|| format!("❌ {} export(s) could not be written", self.export_failures))
    }
    
    fn is_success(&self) -> bool {
        self.failed == 0 && self.export_failures == 0
    }
}
