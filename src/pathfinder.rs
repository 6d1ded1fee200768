//! Entry point tying a grid and a configuration to the search strategies.
use std::cell::OnceCell;
use std::fs::File;
use std::io::{BufWriter, Write};

use grid_util::Point;
use log::debug;

use crate::chunks::ChunkPartition;
use crate::config::{Algorithm, SearchConfig};
use crate::error::Result;
use crate::grid::{Components, Grid};
use crate::heuristic::Heuristic;
use crate::jump_map::JumpPointMap;
use crate::runner::{SearchReport, SearchRun};
use crate::solver::astar::AstarSearch;
use crate::solver::hpa::HpaSearch;
use crate::solver::jps_plus::JpsPlusSearch;
use crate::solver::{NotFoundReason, PathSearch, SearchOutcome};

/// Owns a grid and the derived structures the strategies need. The jump point map, the
/// chunk partition and the connected components are built on first use and reused by every
/// later run on the same grid.
#[derive(Debug)]
pub struct Pathfinder {
    grid: Grid,
    config: SearchConfig,
    heuristic: Heuristic,
    jump_map: OnceCell<JumpPointMap>,
    chunks: OnceCell<ChunkPartition>,
    components: OnceCell<Components>,
}

impl Pathfinder {
    pub fn new(grid: Grid, config: SearchConfig) -> Result<Pathfinder> {
        config.validate()?;
        Ok(Pathfinder {
            heuristic: Heuristic::new(config.heuristic),
            grid,
            config,
            jump_map: OnceCell::new(),
            chunks: OnceCell::new(),
            components: OnceCell::new(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Replaces the configuration; cached structures that depend on it are rebuilt lazily.
    pub fn set_config(&mut self, config: SearchConfig) -> Result<()> {
        config.validate()?;
        if config.heuristic != self.config.heuristic {
            self.heuristic = Heuristic::new(config.heuristic);
        }
        if config.chunk_size != self.config.chunk_size {
            self.chunks = OnceCell::new();
        }
        self.config = config;
        Ok(())
    }

    pub fn jump_map(&self) -> &JumpPointMap {
        self.jump_map.get_or_init(|| JumpPointMap::new(&self.grid))
    }

    pub fn chunk_partition(&self) -> Result<&ChunkPartition> {
        if let Some(partition) = self.chunks.get() {
            return Ok(partition);
        }
        let partition = ChunkPartition::new(&self.grid, self.config.chunk_size)?;
        Ok(self.chunks.get_or_init(|| partition))
    }

    pub fn components(&self) -> &Components {
        self.components.get_or_init(|| self.grid.components())
    }

    pub fn reachable(&self, start: Point, goal: Point) -> bool {
        self.components().reachable(&start, &goal)
    }

    /// Validates the scenario and prepares a run with the current configuration. Nothing is
    /// searched until the run is stepped.
    pub fn start(&self, start: Point, goal: Point) -> Result<SearchRun<'_>> {
        self.grid.ensure_free(start, "start")?;
        self.grid.ensure_free(goal, "goal")?;
        let config = &self.config;
        debug!(
            "Starting {} search from {start} to {goal} ({}, bounding {}, overwrite {} x{})",
            config.algorithm,
            config.heuristic.name(),
            config.goal_bounding_strength,
            config.cost_overwrite,
            config.error_margin
        );
        if config.skip_unreachable && !self.reachable(start, goal) {
            return Ok(SearchRun::finished(
                config.algorithm,
                SearchOutcome::PathNotFound(NotFoundReason::NoPathExists),
            ));
        }
        let strength = config.goal_bounding_strength;
        let policy = config.policy();
        let search: Box<dyn PathSearch + '_> = match config.algorithm {
            Algorithm::AStar => Box::new(AstarSearch::new(
                &self.grid,
                &self.heuristic,
                strength,
                policy,
                start,
                goal,
            )),
            Algorithm::Hpa => Box::new(HpaSearch::new(
                &self.grid,
                self.chunk_partition()?,
                &self.heuristic,
                strength,
                policy,
                start,
                goal,
            )),
            Algorithm::JpsPlus => Box::new(JpsPlusSearch::new(
                &self.grid,
                self.jump_map(),
                &self.heuristic,
                strength,
                policy,
                start,
                goal,
            )),
        };
        Ok(SearchRun::new(config.algorithm, search))
    }

    /// Runs a search to completion.
    pub fn find_path(&self, start: Point, goal: Point) -> Result<SearchReport> {
        Ok(self.start(start, goal)?.run_to_end())
    }

    /// Writes the grid, the chunk partition and the jump point map as text.
    pub fn write_debug_dump(&self, path: &std::path::Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.dump(&mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn dump<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Grid ({}x{}):", self.grid.width(), self.grid.height())?;
        write!(out, "{}", self.grid)?;
        let partition = self.chunk_partition()?;
        partition.compute_all(&self.grid);
        writeln!(out)?;
        write!(out, "{partition}")?;
        writeln!(out)?;
        writeln!(out, "Jump point distances:")?;
        write!(out, "{}", self.jump_map())?;
        Ok(())
    }
}
