//! floodgrid CLI - depression filling and static inundation mapping

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use floodgrid_algorithms::hydrology::{depression_depth, priority_flood, PriorityFloodParams};
use floodgrid_algorithms::inundation::{
    water_levels, AnalysisParams, AnalysisReport, ConnectedFillParams, InundationMethod,
    MultiLevelAnalyzer, SeedPolicy, Surface,
};
use floodgrid_core::io::{acquire, write_geotiff, GeoTiffSink, GeoTiffSource, RasterSink};
use floodgrid_core::{Connectivity, Grid};
use floodgrid_parallel::ProcessingMode;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "floodgrid")]
#[command(author, version, about = "Depression filling and static inundation mapping", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a DEM
    Info {
        /// Input DEM file
        input: PathBuf,
        /// Treat this value as missing data
        #[arg(long, allow_hyphen_values = true)]
        nodata: Option<f64>,
    },
    /// Fill depressions with Priority-Flood
    Fill {
        /// Input DEM file
        input: PathBuf,
        /// Output filled DEM
        output: PathBuf,
        /// Minimum gradient imposed across filled depressions
        #[arg(short, long, default_value = "0.0")]
        epsilon: f64,
        /// Treat this value as missing data
        #[arg(long, allow_hyphen_values = true)]
        nodata: Option<f64>,
        /// Also write the per-cell fill depth here
        #[arg(long)]
        depth_output: Option<PathBuf>,
    },
    /// Map inundation over one or more water levels
    Inundate {
        /// Input DEM file
        input: PathBuf,
        /// Comma-separated water levels, e.g. "1.0,1.5,2.0"
        #[arg(short, long, allow_hyphen_values = true)]
        levels: Option<String>,
        /// Inclusive level range "start:stop:step"
        #[arg(short, long, allow_hyphen_values = true, conflicts_with = "levels")]
        range: Option<String>,
        /// JSON file with analysis parameters; level flags override its levels
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Method: simple, filled, connected
        #[arg(short, long, default_value = "simple", conflicts_with = "config")]
        method: String,
        /// Seed cells for connected fill: "row,col;row,col"
        #[arg(short, long, conflicts_with = "config")]
        seeds: Option<String>,
        /// Neighbor connectivity for connected fill: 4 or 8
        #[arg(long, default_value = "4", conflicts_with = "config")]
        connectivity: u8,
        /// Surface for connected fill: raw or filled
        #[arg(long, default_value = "raw", conflicts_with = "config")]
        surface: String,
        /// Skip seeds above the water level instead of failing the level
        #[arg(long, conflicts_with = "config")]
        skip_invalid_seeds: bool,
        /// Worker threads (0 = all cores, 1 = sequential)
        #[arg(short, long)]
        threads: Option<usize>,
        /// Write mask and depth rasters per level into this directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Write the per-level summary as JSON
        #[arg(long)]
        report: Option<PathBuf>,
        /// Treat this value as missing data
        #[arg(long, allow_hyphen_values = true)]
        nodata: Option<f64>,
        /// Gradient used when the filled surface is computed
        #[arg(short, long, default_value = "0.0")]
        epsilon: f64,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_dem(path: &Path, nodata: Option<f64>) -> Result<Grid> {
    let pb = spinner("Reading DEM...");
    let source = GeoTiffSource::new(path).with_nodata(nodata);
    let grid = acquire(&source, None).context("Failed to read DEM")?;
    pb.finish_and_clear();
    info!("Input: {} x {}", grid.cols(), grid.rows());
    Ok(grid)
}

fn write_grid(grid: &Grid, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(&grid.to_buffer(), path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn level_progress(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = "{bar:40.cyan/blue} {pos}/{len} levels {msg}";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style);
    }
    pb
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_levels(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid water level: {}", v))
        })
        .collect()
}

fn parse_range(s: &str) -> Result<Vec<f64>> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        anyhow::bail!("Range must be 'start:stop:step', got: {}", s);
    }
    let start: f64 = parts[0].trim().parse().context("Invalid range start")?;
    let stop: f64 = parts[1].trim().parse().context("Invalid range stop")?;
    let step: f64 = parts[2].trim().parse().context("Invalid range step")?;
    water_levels(start, stop, step).context("Invalid level range")
}

fn parse_seeds(s: &str) -> Result<Vec<(usize, usize)>> {
    s.split(';')
        .map(|pair| {
            let parts: Vec<&str> = pair.trim().split(',').collect();
            if parts.len() != 2 {
                anyhow::bail!("Seed must be 'row,col', got: {}", pair);
            }
            let row: usize = parts[0].trim().parse().context("Invalid row")?;
            let col: usize = parts[1].trim().parse().context("Invalid col")?;
            Ok((row, col))
        })
        .collect()
}

fn parse_surface(s: &str) -> Result<Surface> {
    match s.to_lowercase().as_str() {
        "raw" | "r" => Ok(Surface::Raw),
        "filled" | "f" => Ok(Surface::Filled),
        _ => anyhow::bail!("Unknown surface: {}. Use raw or filled.", s),
    }
}

struct MethodArgs<'a> {
    method: &'a str,
    seeds: Option<&'a str>,
    connectivity: u8,
    surface: &'a str,
    skip_invalid_seeds: bool,
}

fn parse_method(args: MethodArgs<'_>) -> Result<InundationMethod> {
    match args.method.to_lowercase().as_str() {
        "simple" | "threshold" => Ok(InundationMethod::SimpleThreshold),
        "filled" | "filled-threshold" => Ok(InundationMethod::FilledThreshold),
        "connected" | "flood-fill" => {
            let seeds = args
                .seeds
                .context("Connected fill needs --seeds \"row,col;row,col\"")?;
            let connectivity = Connectivity::from_degree(args.connectivity).with_context(|| {
                format!("Connectivity must be 4 or 8, got: {}", args.connectivity)
            })?;
            let mut params = ConnectedFillParams::new(parse_seeds(seeds)?, connectivity);
            params.surface = parse_surface(args.surface)?;
            if args.skip_invalid_seeds {
                params.seed_policy = SeedPolicy::Skip;
            }
            Ok(InundationMethod::ConnectedFill(params))
        }
        _ => anyhow::bail!(
            "Unknown method: {}. Use simple, filled, or connected.",
            args.method
        ),
    }
}

fn load_config(path: &Path) -> Result<AnalysisParams> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open config {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

/// File-name-safe tag for a water level, e.g. -1.5 -> "m1p5"
fn level_tag(level: f64) -> String {
    level.to_string().replace('-', "m").replace('.', "p")
}

fn write_level_rasters(report: &AnalysisReport, dir: &Path) -> Result<()> {
    let pb = spinner("Writing level rasters...");
    let mut sink = GeoTiffSink::new(dir);
    for result in &report.results {
        let tag = level_tag(result.level);
        sink.write_raster(&format!("mask_{}", tag), &result.mask.to_buffer().map(f64::from))
            .with_context(|| format!("Failed to write mask for level {}", result.level))?;
        sink.write_raster(&format!("depth_{}", tag), &result.depth.to_buffer())
            .with_context(|| format!("Failed to write depth for level {}", result.level))?;
    }
    pb.finish_and_clear();
    Ok(())
}

fn write_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report.summary())
        .context("Failed to write report")?;
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    println!(
        "{:>12} {:>10} {:>16} {:>16} {:>10}",
        "level", "cells", "area", "volume", "max depth"
    );
    for row in report.summary() {
        match (row.metrics, row.error) {
            (Some(m), _) => println!(
                "{:>12.3} {:>10} {:>16.3} {:>16.3} {:>10.3}",
                row.level, m.flooded_cells, m.area, m.volume, m.max_depth
            ),
            (None, Some(err)) => println!("{:>12.3}  failed: {}", row.level, err),
            (None, None) => {}
        }
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input, nodata } => {
            let grid = read_dem(&input, nodata)?;
            let (rows, cols) = grid.shape();
            let gt = grid.transform();
            let bounds = grid.bounds();
            let stats = grid.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, grid.len());
            println!(
                "Cell size: {} x {} (area {})",
                gt.cell_width.abs(),
                gt.cell_height.abs(),
                grid.cell_area()
            );
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
            );
            println!("\nStatistics:");
            println!("  Min: {:.4}", stats.min);
            println!("  Max: {:.4}", stats.max);
            println!("  Mean: {:.4}", stats.mean);
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / grid.len() as f64
            );
        }

        // ── Fill ─────────────────────────────────────────────────────
        Commands::Fill {
            input,
            output,
            epsilon,
            nodata,
            depth_output,
        } => {
            let grid = read_dem(&input, nodata)?;
            let start = Instant::now();
            let filled = priority_flood(&grid, PriorityFloodParams { epsilon })
                .context("Failed to fill depressions")?;
            let elapsed = start.elapsed();
            info!("Raised {} cells", filled.raised_cells());

            let depth = match &depth_output {
                Some(_) => {
                    let depth = depression_depth(&grid, &filled)
                        .context("Failed to compute fill depth")?;
                    Some(grid.with_elevation(depth).context("Failed to build depth grid")?)
                }
                None => None,
            };

            write_grid(&filled.into_grid(), &output)?;
            done("Filled DEM", &output, elapsed);

            if let (Some(path), Some(depth_grid)) = (&depth_output, &depth) {
                write_grid(depth_grid, path)?;
                println!("Fill depth saved to: {}", path.display());
            }
        }

        // ── Inundate ─────────────────────────────────────────────────
        Commands::Inundate {
            input,
            levels,
            range,
            config,
            method,
            seeds,
            connectivity,
            surface,
            skip_invalid_seeds,
            threads,
            out_dir,
            report,
            nodata,
            epsilon,
        } => {
            let mut params = match &config {
                Some(path) => load_config(path)?,
                None => AnalysisParams {
                    method: parse_method(MethodArgs {
                        method: &method,
                        seeds: seeds.as_deref(),
                        connectivity,
                        surface: &surface,
                        skip_invalid_seeds,
                    })?,
                    ..AnalysisParams::default()
                },
            };
            if let Some(levels) = &levels {
                params.levels = parse_levels(levels)?;
            } else if let Some(range) = &range {
                params.levels = parse_range(range)?;
            }
            if threads.is_some() || config.is_none() {
                params.mode = ProcessingMode::from_threads(threads);
            }

            let grid = read_dem(&input, nodata)?;
            let pb = level_progress(params.levels.len());
            pb.set_message(params.method.name());
            let progress = pb.clone();
            let analyzer = MultiLevelAnalyzer::new(&grid)
                .with_fill_params(PriorityFloodParams { epsilon })
                .on_level_complete(move |_| progress.inc(1));

            let start = Instant::now();
            let outcome = analyzer.run(&params);
            pb.finish_and_clear();
            let analysis = outcome.context("Inundation analysis failed")?;
            let elapsed = start.elapsed();

            print_summary(&analysis);
            if !analysis.is_complete() {
                warn!(
                    "{} of {} levels failed",
                    analysis.failures.len(),
                    analysis.failures.len() + analysis.results.len()
                );
            }

            if let Some(dir) = &out_dir {
                write_level_rasters(&analysis, dir)?;
                done("Level rasters", dir, elapsed);
            } else {
                println!("  Processing time: {:.2?}", elapsed);
            }
            if let Some(path) = &report {
                write_report(&analysis, path)?;
                println!("Report saved to: {}", path.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!(parse_levels("1.0, 2.5,-3").unwrap(), vec![1.0, 2.5, -3.0]);
        assert!(parse_levels("1.0,abc").is_err());
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0:1:0.5").unwrap(), vec![0.0, 0.5, 1.0]);
        assert!(parse_range("0:1").is_err());
        assert!(parse_range("1:0:0.5").is_err());
    }

    #[test]
    fn test_parse_seeds() {
        assert_eq!(parse_seeds("2,2; 0,4").unwrap(), vec![(2, 2), (0, 4)]);
        assert!(parse_seeds("2").is_err());
        assert!(parse_seeds("a,1").is_err());
    }

    #[test]
    fn test_parse_method() {
        let method = parse_method(MethodArgs {
            method: "connected",
            seeds: Some("1,1"),
            connectivity: 8,
            surface: "filled",
            skip_invalid_seeds: true,
        })
        .unwrap();
        match method {
            InundationMethod::ConnectedFill(p) => {
                assert_eq!(p.seeds, vec![(1, 1)]);
                assert_eq!(p.connectivity, Connectivity::Eight);
                assert_eq!(p.surface, Surface::Filled);
                assert_eq!(p.seed_policy, SeedPolicy::Skip);
            }
            other => panic!("unexpected method {:?}", other),
        }

        let missing_seeds = parse_method(MethodArgs {
            method: "connected",
            seeds: None,
            connectivity: 4,
            surface: "raw",
            skip_invalid_seeds: false,
        });
        assert!(missing_seeds.is_err());

        let bad_connectivity = parse_method(MethodArgs {
            method: "connected",
            seeds: Some("0,0"),
            connectivity: 6,
            surface: "raw",
            skip_invalid_seeds: false,
        });
        assert!(bad_connectivity.is_err());
    }

    #[test]
    fn test_config_conflicts_with_method_flags() {
        let parsed = Cli::try_parse_from([
            "floodgrid", "inundate", "dem.tif", "--config", "run.json", "--method", "connected",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "floodgrid", "inundate", "dem.tif", "--config", "run.json", "--skip-invalid-seeds",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "floodgrid", "inundate", "dem.tif", "--config", "run.json", "--levels", "1,2",
            "--threads", "2",
        ]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_level_tag() {
        assert_eq!(level_tag(1.5), "1p5");
        assert_eq!(level_tag(-2.0), "m2");
    }
}
