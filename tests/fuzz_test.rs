/// Fuzzes the search strategies by checking on many random grids that a path is found exactly
/// when the goal shares a connected component with the start, and that the optimal
/// strategies agree on the path length.
use grid_pathing::*;
use itertools::Itertools;
use rand::prelude::*;

fn random_grid(w: usize, h: usize, rng: &mut StdRng, density: f64) -> Grid {
    Grid::from_fn(w, h, |_| {
        if rng.gen_bool(density) {
            Cell::Obstacle
        } else {
            Cell::Free
        }
    })
    .unwrap()
}

fn visualize_grid(grid: &Grid, start: &Point, end: &Point) {
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let p = Point::new(x, y);
            if *start == p {
                print!("S");
            } else if *end == p {
                print!("G");
            } else if grid.cell(p) == Cell::Obstacle {
                print!("#");
            } else {
                print!(".");
            }
        }
        println!();
    }
}

/// Random grid with a free start in the top-left and a free goal in the bottom-right corner.
fn random_scenario(n: usize, rng: &mut StdRng) -> (Grid, Point, Point) {
    let mut grid = random_grid(n, n, rng, 0.4);
    let start = Point::new(0, 0);
    let end = Point::new(n as i32 - 1, n as i32 - 1);
    grid.set(start, Cell::Free);
    grid.set(end, Cell::Free);
    (grid, start, end)
}

fn is_connected_chain(grid: &Grid, nodes: &[Point]) -> bool {
    nodes
        .iter()
        .tuple_windows()
        .all(|(a, b)| a.move_distance(b) == 1 && grid.can_move_to(*b, *a))
}

#[test]
fn fuzz_existence() {
    const N: usize = 8;
    const N_GRIDS: usize = 2000;
    let mut rng = StdRng::seed_from_u64(0);
    let configs = [
        SearchConfig::with_algorithm(Algorithm::AStar),
        SearchConfig::with_algorithm(Algorithm::JpsPlus),
        SearchConfig {
            chunk_size: 2,
            ..SearchConfig::with_algorithm(Algorithm::Hpa)
        },
        SearchConfig {
            chunk_size: 3,
            ..SearchConfig::with_algorithm(Algorithm::Hpa)
        },
        SearchConfig {
            chunk_size: 8,
            ..SearchConfig::with_algorithm(Algorithm::Hpa)
        },
    ];
    for _ in 0..N_GRIDS {
        let (grid, start, end) = random_scenario(N, &mut rng);
        let reachable = grid.components().reachable(&start, &end);
        let mut finder = Pathfinder::new(grid, SearchConfig::default()).unwrap();
        for config in &configs {
            finder.set_config(config.clone()).unwrap();
            let report = finder.find_path(start, end).unwrap();
            // Show the grid if the strategy disagrees with the components
            if report.is_found() != reachable {
                println!("{} (chunk size {})", config.algorithm, config.chunk_size);
                visualize_grid(finder.grid(), &start, &end);
            }
            assert_eq!(report.is_found(), reachable);
            if let Some(path) = report.outcome.path() {
                assert_eq!(path.start(), Some(start));
                assert_eq!(path.goal(), Some(end));
                assert!(is_connected_chain(finder.grid(), &path.nodes));
            } else {
                assert_eq!(
                    report.outcome.reason(),
                    Some(NotFoundReason::NoPathExists)
                );
            }
        }
    }
}

#[test]
fn fuzz_distance() {
    const N: usize = 10;
    const N_GRIDS: usize = 2000;
    let mut rng = StdRng::seed_from_u64(1);

    for _ in 0..N_GRIDS {
        let (grid, start, end) = random_scenario(N, &mut rng);
        if !grid.components().reachable(&start, &end) {
            continue;
        }
        let mut finder =
            Pathfinder::new(grid, SearchConfig::with_algorithm(Algorithm::AStar)).unwrap();
        let astar = finder.find_path(start, end).unwrap();
        finder
            .set_config(SearchConfig::with_algorithm(Algorithm::JpsPlus))
            .unwrap();
        let jps = finder.find_path(start, end).unwrap();

        let astar_cost = astar.stats.path_length.unwrap();
        let jps_cost = jps.stats.path_length.unwrap();
        if (jps_cost - astar_cost).abs() >= 1e-6 {
            println!("Astar distance: {astar_cost}; JPS+ distance: {jps_cost}");
            println!(
                "Astar path: {:?}\n JPS+ path: {:?}\n",
                astar.outcome.path().map(|p| &p.nodes),
                jps.outcome.path().map(|p| &p.waypoints)
            );
            visualize_grid(finder.grid(), &start, &end);
        }
        assert!((jps_cost - astar_cost).abs() < 1e-6);
    }
}

#[test]
fn fuzz_relaxed_overwrite_still_finds_paths() {
    const N: usize = 12;
    const N_GRIDS: usize = 500;
    let mut rng = StdRng::seed_from_u64(2);
    let mut relaxed = vec![
        SearchConfig {
            error_margin: 1.5,
            ..SearchConfig::default()
        },
        SearchConfig {
            cost_overwrite: false,
            ..SearchConfig::default()
        },
        SearchConfig {
            heuristic: HeuristicKind::Manhattan,
            ..SearchConfig::with_algorithm(Algorithm::JpsPlus)
        },
    ];
    // Goal bounding biases the search but must never lose a reachable goal.
    for (algorithm, strength) in Algorithm::ALL.into_iter().cartesian_product([0.5, 3.0]) {
        relaxed.push(SearchConfig {
            goal_bounding_strength: strength,
            chunk_size: 3,
            ..SearchConfig::with_algorithm(algorithm)
        });
    }
    for _ in 0..N_GRIDS {
        let (grid, start, end) = random_scenario(N, &mut rng);
        let reachable = grid.components().reachable(&start, &end);
        let mut finder = Pathfinder::new(grid, SearchConfig::default()).unwrap();
        let optimal = finder.find_path(start, end).unwrap();
        for config in &relaxed {
            finder.set_config(config.clone()).unwrap();
            let report = finder.find_path(start, end).unwrap();
            if report.is_found() != reachable {
                println!(
                    "{} (bounding {}, chunk size {})",
                    config.algorithm, config.goal_bounding_strength, config.chunk_size
                );
                visualize_grid(finder.grid(), &start, &end);
            }
            assert_eq!(report.is_found(), reachable);
            if let Some(path) = report.outcome.path() {
                assert_eq!(path.start(), Some(start));
                assert_eq!(path.goal(), Some(end));
                assert!(is_connected_chain(finder.grid(), &path.nodes));
            }
            if let (Some(length), Some(best)) =
                (report.stats.path_length, optimal.stats.path_length)
            {
                assert!(length >= best - 1e-9);
                if config.cost_overwrite
                    && config.heuristic == HeuristicKind::Euclidean
                    && config.goal_bounding_strength == 0.0
                    && config.algorithm != Algorithm::Hpa
                {
                    assert!(length <= config.error_margin * best + 1e-9);
                }
            }
        }
    }
}
