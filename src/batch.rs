//! Sequential sweeps over configurations and scenarios.
use grid_util::Point;
use log::info;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::pathfinder::Pathfinder;
use crate::stats::{RunRecord, StatsTable};

/// Runs every configuration against every scenario, one search at a time, and optionally
/// appends each row to a [StatsTable] as soon as the run is done.
#[derive(Clone, Debug, Default)]
pub struct BatchRunner {
    table: Option<StatsTable>,
}

impl BatchRunner {
    pub fn new() -> BatchRunner {
        BatchRunner::default()
    }

    pub fn with_table(table: StatsTable) -> BatchRunner {
        BatchRunner { table: Some(table) }
    }

    /// The pathfinder keeps the last configuration of the sweep afterwards. Invalid
    /// scenarios or configurations abort the sweep with an error.
    pub fn run(
        &self,
        pathfinder: &mut Pathfinder,
        map_id: &str,
        scenarios: &[(Point, Point)],
        configs: &[SearchConfig],
    ) -> Result<Vec<RunRecord>> {
        let mut records = Vec::with_capacity(scenarios.len() * configs.len());
        for config in configs {
            pathfinder.set_config(config.clone())?;
            for &(start, goal) in scenarios {
                let report = pathfinder.find_path(start, goal)?;
                let record = RunRecord::new(map_id, start, goal, config, &report);
                if let Some(table) = &self.table {
                    table.append(&record)?;
                }
                records.push(record);
            }
        }
        info!(
            "Batch on {map_id} finished: {} runs, {} paths found",
            records.len(),
            records.iter().filter(|record| record.path_found).count()
        );
        Ok(records)
    }
}
