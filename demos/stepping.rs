use grid_pathing::point::cell_rect;
use grid_pathing::{Algorithm, Cell, Grid, Pathfinder, Point, SearchConfig, SearchEvent};

// Drives an HPA* search one step at a time, printing what every step touched. The run is
// paused halfway and resumed, which a host would do between frames.
fn main() {
    const N: i32 = 24;
    let mut grid = Grid::filled(N as usize, N as usize, Cell::Free).unwrap();
    grid.set_rect(cell_rect(6, 0, 2, 18), Cell::Obstacle);
    grid.set_rect(cell_rect(14, 6, 2, 18), Cell::Obstacle);
    let config = SearchConfig {
        chunk_size: 6,
        ..SearchConfig::with_algorithm(Algorithm::Hpa)
    };
    let pathfinder = Pathfinder::new(grid, config).unwrap();
    println!("{}", pathfinder.grid());

    let mut run = pathfinder
        .start(Point::new(0, 0), Point::new(N - 1, 0))
        .unwrap();
    while let Some(events) = run.step() {
        for event in events {
            match event {
                SearchEvent::ChunkVisited(chunk) => println!("step {}: chunk {chunk}", run.steps()),
                SearchEvent::NodeVisited(p) => println!("step {}: cell {p}", run.steps()),
                SearchEvent::ChunkAddedToFrontier(_) | SearchEvent::NodeAddedToFrontier(_) => {}
            }
        }
        if run.steps() == 10 {
            run.pause();
            println!("paused after {} steps ({:?})", run.steps(), run.elapsed());
            run.resume();
        }
    }
    let report = run.into_report();
    println!("{}", report.outcome);
    println!("{:?}", report.stats);
}
