//! Inundation across a set of water levels
//!
//! Levels are independent: each one reads the shared grid (and filled
//! surface), allocates its own mask and depth, and reports either a full
//! [`AnalysisResult`] or a [`LevelFailure`]. Levels run through a
//! [`ProcessingMode`], so the same analysis can be sequential or spread
//! over a worker pool with identical output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use floodgrid_core::{Algorithm, DepthRaster, Error, FloodMask, Grid, Result};
use floodgrid_parallel::{ParallelStrategy, ProcessingMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    check_level, flood_metrics, validate_seeds, FloodMetrics, InundationEngine, InundationMethod,
};
use crate::hydrology::{priority_flood, FilledGrid, PriorityFloodParams};

/// Upper bound on the number of levels produced by [`water_levels`]
const MAX_GENERATED_LEVELS: usize = 100_000;

/// Parameters for a multi-level analysis
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Water levels in the grid's elevation units; any order
    pub levels: Vec<f64>,
    pub method: InundationMethod,
    /// How levels are distributed over threads
    pub mode: ProcessingMode,
}

/// Complete outputs for one water level
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub level: f64,
    pub method: &'static str,
    pub mask: FloodMask,
    pub depth: DepthRaster,
    pub metrics: FloodMetrics,
}

/// A level that produced no result
#[derive(Debug)]
pub struct LevelFailure {
    pub level: f64,
    pub error: Error,
}

/// Serialisable one-line view of a level's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: f64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FloodMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a multi-level run, ordered by ascending level
#[derive(Debug)]
pub struct AnalysisReport {
    pub method: &'static str,
    pub results: Vec<AnalysisResult>,
    pub failures: Vec<LevelFailure>,
}

impl AnalysisReport {
    /// Every level produced a result
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Result for exactly `level`, if it succeeded
    pub fn result_for(&self, level: f64) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.level == level)
    }

    /// Results and failures merged in level order
    pub fn summary(&self) -> Vec<LevelSummary> {
        let mut rows: Vec<LevelSummary> = self
            .results
            .iter()
            .map(|r| LevelSummary {
                level: r.level,
                method: r.method.to_string(),
                metrics: Some(r.metrics),
                error: None,
            })
            .chain(self.failures.iter().map(|f| LevelSummary {
                level: f.level,
                method: self.method.to_string(),
                metrics: None,
                error: Some(f.error.to_string()),
            }))
            .collect();
        rows.sort_by(|a, b| a.level.total_cmp(&b.level));
        rows
    }
}

/// Cloneable flag for stopping a run between levels.
///
/// Levels that have already started finish normally; the rest are
/// reported as [`Error::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Called with the level after each level finishes, successfully or not
type LevelCallback<'a> = Box<dyn Fn(f64) + Send + Sync + 'a>;

/// Runs one inundation method over many water levels
pub struct MultiLevelAnalyzer<'a> {
    grid: &'a Grid,
    filled: OnceLock<FilledGrid>,
    fill_params: PriorityFloodParams,
    cancellation: CancellationToken,
    on_level: Option<LevelCallback<'a>>,
}

impl std::fmt::Debug for MultiLevelAnalyzer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiLevelAnalyzer")
            .field("shape", &self.grid.shape())
            .field("filled", &self.filled.get().is_some())
            .field("fill_params", &self.fill_params)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<'a> MultiLevelAnalyzer<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self {
            grid,
            filled: OnceLock::new(),
            fill_params: PriorityFloodParams::default(),
            cancellation: CancellationToken::new(),
            on_level: None,
        }
    }

    /// Parameters used if the filled surface has to be computed
    pub fn with_fill_params(mut self, params: PriorityFloodParams) -> Self {
        self.fill_params = params;
        self
    }

    /// Supply a precomputed filled surface
    pub fn with_filled(mut self, filled: FilledGrid) -> Result<Self> {
        if filled.grid().shape() != self.grid.shape() {
            let (ar, ac) = filled.grid().shape();
            return Err(Error::SizeMismatch {
                er: self.grid.rows(),
                ec: self.grid.cols(),
                ar,
                ac,
            });
        }
        self.filled = OnceLock::from(filled);
        Ok(self)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Register a callback run after every level that was started.
    ///
    /// Under a parallel mode it is invoked from worker threads in
    /// completion order.
    pub fn on_level_complete(mut self, callback: impl Fn(f64) + Send + Sync + 'a) -> Self {
        self.on_level = Some(Box::new(callback));
        self
    }

    /// The filled surface, computed on first use
    pub fn filled(&self) -> Result<&FilledGrid> {
        if let Some(filled) = self.filled.get() {
            return Ok(filled);
        }
        let filled = priority_flood(self.grid, self.fill_params)?;
        Ok(self.filled.get_or_init(|| filled))
    }

    /// Evaluate `params.method` at every level.
    ///
    /// # Errors
    /// Whole-run failures only:
    /// - [`Error::EmptyLevelSet`] when no levels are given
    /// - [`Error::InvalidParameter`] for non-finite or duplicate levels
    /// - [`Error::InvalidSeed`] for a seed out of bounds or on missing data
    /// - filling errors when the method needs the filled surface
    ///
    /// Anything that goes wrong at a single level is recorded in
    /// [`AnalysisReport::failures`] instead.
    pub fn run(&self, params: &AnalysisParams) -> Result<AnalysisReport> {
        let levels = normalize_levels(&params.levels)?;
        if let InundationMethod::ConnectedFill(fill) = &params.method {
            validate_seeds(self.grid, &fill.seeds)?;
        }

        let mut engine = InundationEngine::new(self.grid);
        if params.method.needs_filled() {
            engine = engine.with_filled(self.filled()?)?;
        }

        debug!(
            method = params.method.name(),
            levels = levels.len(),
            workers = params.mode.workers(),
            "starting multi-level analysis"
        );

        let cell_area = self.grid.cell_area();
        let cancellation = &self.cancellation;
        let on_level = &self.on_level;
        let outcomes = params.mode.par_map(0..levels.len(), |i| {
            let level = levels[i];
            if cancellation.is_cancelled() {
                return Err(Error::Cancelled { level });
            }
            let outcome = analyze_level(&engine, level, &params.method, cell_area);
            if let Some(callback) = on_level {
                callback(level);
            }
            outcome
        });

        let mut results = Vec::with_capacity(levels.len());
        let mut failures = Vec::new();
        for (level, outcome) in levels.iter().copied().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(error) => {
                    warn!(level, error = %error, "level failed");
                    failures.push(LevelFailure { level, error });
                }
            }
        }

        info!(
            method = params.method.name(),
            completed = results.len(),
            failed = failures.len(),
            "multi-level analysis finished"
        );

        Ok(AnalysisReport {
            method: params.method.name(),
            results,
            failures,
        })
    }
}

fn analyze_level(
    engine: &InundationEngine<'_>,
    level: f64,
    method: &InundationMethod,
    cell_area: f64,
) -> Result<AnalysisResult> {
    let flood = engine.inundate(level, method)?;
    let metrics = flood_metrics(&flood.mask, &flood.depth, cell_area)?;
    Ok(AnalysisResult {
        level,
        method: method.name(),
        mask: flood.mask,
        depth: flood.depth,
        metrics,
    })
}

/// Sort ascending, rejecting empty, non-finite and repeated levels
fn normalize_levels(levels: &[f64]) -> Result<Vec<f64>> {
    if levels.is_empty() {
        return Err(Error::EmptyLevelSet);
    }
    for &level in levels {
        check_level(level)?;
    }
    let mut sorted = levels.to_vec();
    sorted.sort_by(f64::total_cmp);
    if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(Error::invalid_parameter(
            "levels",
            pair[0],
            "duplicate water level",
        ));
    }
    Ok(sorted)
}

/// Inclusive ascending sequence `start, start + step, ...` up to `stop`.
///
/// Each level is computed as `start + i * step` so rounding does not
/// accumulate.
pub fn water_levels(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    check_level(start)?;
    check_level(stop)?;
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::invalid_parameter("step", step, "must be finite and positive"));
    }
    if stop < start {
        return Err(Error::invalid_parameter(
            "stop",
            stop,
            format!("must not be below start {}", start),
        ));
    }

    let span = (stop - start) / step;
    // Tolerate representation error so 0.0:1.0:0.1 includes 1.0
    let steps = (span + 1e-9).floor();
    if steps >= MAX_GENERATED_LEVELS as f64 {
        return Err(Error::invalid_parameter(
            "step",
            step,
            format!("produces more than {} levels", MAX_GENERATED_LEVELS),
        ));
    }
    let count = steps as usize + 1;
    let levels: Vec<f64> = (0..count).map(|i| (start + i as f64 * step).min(stop)).collect();
    if let Some(pair) = levels.windows(2).find(|w| w[1] <= w[0]) {
        return Err(Error::invalid_parameter(
            "step",
            step,
            format!("below the float resolution at level {}", pair[0]),
        ));
    }
    Ok(levels)
}

/// Multi-level inundation analysis
#[derive(Debug, Clone, Default)]
pub struct MultiLevel;

impl Algorithm for MultiLevel {
    type Input = Grid;
    type Output = AnalysisReport;
    type Params = AnalysisParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "MultiLevel"
    }

    fn description(&self) -> &'static str {
        "Flood masks, depths and metrics over a set of water levels"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        MultiLevelAnalyzer::new(&input).run(&params)
    }
}
