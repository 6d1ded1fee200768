use grid_pathing::{Algorithm, Grid, Pathfinder, Point, SearchConfig};

// In this example a path is found with every strategy on a grid with shape
// #####
// #S  #
// # # #
// #  G#
// #####
// S marks the start
// G marks the goal
fn main() {
    let grid = Grid::from_ascii(
        "
        #####
        #S..#
        #.#.#
        #..G#
        #####
        ",
    )
    .unwrap();
    let start = Point::new(1, 1);
    let goal = Point::new(3, 3);
    for algorithm in Algorithm::ALL {
        let config = SearchConfig {
            chunk_size: 2,
            ..SearchConfig::with_algorithm(algorithm)
        };
        let pathfinder = Pathfinder::new(grid.clone(), config).unwrap();
        let report = pathfinder.find_path(start, goal).unwrap();
        println!("{algorithm}: {}", report.outcome);
        if let Some(path) = report.outcome.path() {
            println!("  waypoints: {:?}", path.waypoints);
            for p in &path.nodes {
                println!("  {p}");
            }
        }
    }
}
