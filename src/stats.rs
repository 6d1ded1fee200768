//! Append-only CSV table of run statistics for comparing configurations offline.
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use grid_util::Point;
use serde::{Deserialize, Serialize};

use crate::config::{Algorithm, SearchConfig};
use crate::error::Result;
use crate::heuristic::HeuristicKind;
use crate::runner::SearchReport;

/// One row of the table. Map id, start and goal form the scenario key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub map_id: String,
    pub start_x: i32,
    pub start_y: i32,
    pub goal_x: i32,
    pub goal_y: i32,
    pub algorithm: Algorithm,
    pub heuristic: HeuristicKind,
    pub path_found: bool,
    pub elapsed_ms: f64,
    pub path_length: Option<f64>,
    pub path_nodes: usize,
    pub nodes_analyzed: usize,
    pub nodes_allocated: usize,
    pub memory_bytes: usize,
    pub goal_bounding_strength: f64,
    pub cost_overwrite: bool,
    pub error_margin: f64,
    pub chunk_size: usize,
}

impl RunRecord {
    pub fn new(
        map_id: &str,
        start: Point,
        goal: Point,
        config: &SearchConfig,
        report: &SearchReport,
    ) -> RunRecord {
        let stats = &report.stats;
        RunRecord {
            map_id: map_id.to_owned(),
            start_x: start.x,
            start_y: start.y,
            goal_x: goal.x,
            goal_y: goal.y,
            algorithm: report.algorithm,
            heuristic: config.heuristic,
            path_found: report.is_found(),
            elapsed_ms: stats.elapsed.as_secs_f64() * 1000.0,
            path_length: stats.path_length,
            path_nodes: stats.path_nodes,
            nodes_analyzed: stats.nodes_analyzed,
            nodes_allocated: stats.nodes_allocated,
            memory_bytes: stats.memory_estimate_bytes,
            goal_bounding_strength: config.goal_bounding_strength,
            cost_overwrite: config.cost_overwrite,
            error_margin: config.error_margin,
            chunk_size: config.chunk_size,
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    pub fn goal(&self) -> Point {
        Point::new(self.goal_x, self.goal_y)
    }
}

/// A CSV file that rows are only ever appended to.
#[derive(Clone, Debug)]
pub struct StatsTable {
    path: PathBuf,
}

impl StatsTable {
    pub fn new(path: impl Into<PathBuf>) -> StatsTable {
        StatsTable { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &RunRecord) -> Result<()> {
        self.append_all(std::slice::from_ref(record))
    }

    /// Appends rows, writing the header first if the file is new or empty.
    pub fn append_all(&self, records: &[RunRecord]) -> Result<()> {
        let needs_header = fs::metadata(&self.path).map_or(true, |meta| meta.len() == 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Every stored row; a missing file is an empty table.
    pub fn records(&self) -> Result<Vec<RunRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<RunRecord>, csv::Error>>()?;
        Ok(records)
    }

    /// Rows of one scenario.
    pub fn records_for(&self, map_id: &str, start: Point, goal: Point) -> Result<Vec<RunRecord>> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|record| {
                record.map_id == map_id && record.start() == start && record.goal() == goal
            })
            .collect())
    }
}
