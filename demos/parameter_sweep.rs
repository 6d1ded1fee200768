use grid_pathing::batch::BatchRunner;
use grid_pathing::point::cell_rect;
use grid_pathing::stats::StatsTable;
use grid_pathing::{Algorithm, Cell, Grid, HeuristicKind, Pathfinder, Point, SearchConfig};
use itertools::iproduct;

// Sweeps strategies and heuristic settings over a few scenarios and appends every run to a
// CSV table, given as the first argument (defaults to `sweep.csv`).
fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "sweep.csv".to_owned());
    const N: i32 = 40;
    let mut grid = Grid::filled(N as usize, N as usize, Cell::Free).unwrap();
    grid.set_rect(cell_rect(8, 8, 8, 8), Cell::Obstacle);
    grid.set_rect(cell_rect(0, 20, 30, 2), Cell::Obstacle);
    grid.set_rect(cell_rect(24, 0, 2, 16), Cell::Obstacle);

    let scenarios = [
        (Point::new(0, 0), Point::new(N - 1, N - 1)),
        (Point::new(30, 2), Point::new(2, 30)),
        (Point::new(20, 12), Point::new(5, 39)),
    ];
    let configs: Vec<SearchConfig> = iproduct!(
        Algorithm::ALL,
        [HeuristicKind::Euclidean, HeuristicKind::Manhattan],
        [0.0, 0.5]
    )
    .map(|(algorithm, heuristic, goal_bounding_strength)| SearchConfig {
        heuristic,
        goal_bounding_strength,
        ..SearchConfig::with_algorithm(algorithm)
    })
    .collect();

    let mut pathfinder = Pathfinder::new(grid, SearchConfig::default()).unwrap();
    let runner = BatchRunner::with_table(StatsTable::new(&path));
    let records = runner
        .run(&mut pathfinder, "sweep", &scenarios, &configs)
        .unwrap();
    for record in &records {
        println!(
            "{:>8} {:>9} bound {:.1}: length {:?}, {} nodes analyzed",
            record.algorithm.name(),
            record.heuristic.name(),
            record.goal_bounding_strength,
            record.path_length,
            record.nodes_analyzed
        );
    }
    println!("Appended {} rows to {path}", records.len());
}
