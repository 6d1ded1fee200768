//! Partition of a grid into fixed-size square chunks for hierarchical search.
//!
//! Besides the eight cached border passability flags of every chunk, each chunk is split into
//! regions: groups of its free cells that are connected without leaving the chunk. Regions of
//! neighbouring chunks are linked whenever a legal move crosses between them, which is what
//! the chunk-level search walks over.
use core::fmt;
use std::cell::OnceCell;

use grid_util::{Direction, Point, Rect};
use itertools::iproduct;
use log::info;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;

use crate::error::{PathfindingError, Result};
use crate::grid::{Grid, FORWARD_OFFSETS};
use crate::point::{cell_rect, directions};

/// Position of a chunk in chunk units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> ChunkCoord {
        ChunkCoord { x, y }
    }

    pub fn as_point(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn neighbor(self, dir: Direction) -> ChunkCoord {
        let step = Point::from(dir);
        ChunkCoord::new(self.x + step.x, self.y + step.y)
    }

    /// Direction of `other` as seen from this chunk, [Direction::NONE] for the chunk itself.
    pub fn dir_obj(self, other: ChunkCoord) -> Direction {
        self.as_point().dir_obj(&other.as_point())
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

pub type RegionId = usize;

/// Free cells of one chunk that are connected inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub chunk: ChunkCoord,
    pub cells: usize,
    links: SmallVec<[(Direction, RegionId); 8]>,
}

impl Region {
    /// Regions of neighbouring chunks reachable with a single move, with the chunk direction.
    pub fn links(&self) -> &[(Direction, RegionId)] {
        &self.links
    }
}

#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    /// Cells covered by the chunk; chunks on the far edges of the grid may be cut short.
    pub bounds: Rect,
    passability: [OnceCell<bool>; 8],
    regions: SmallVec<[RegionId; 4]>,
}

impl Chunk {
    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(&point)
    }

    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    /// Number of cells, both corners of [Chunk::bounds] included.
    pub fn area(&self) -> usize {
        ((self.bounds.width() + 1) * (self.bounds.height() + 1)) as usize
    }

    /// Cell closest to the middle of the chunk.
    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    /// Cached flag, [None] until it was first queried.
    pub fn cached_passability(&self, dir: Direction) -> Option<bool> {
        self.passability[dir.num() as usize].get().copied()
    }

    /// Cells along the side or corner of the chunk facing `dir`.
    fn border(&self, dir: Direction) -> SmallVec<[Point; 16]> {
        let side = |delta: i32, low: i32, high: i32| match delta.signum() {
            1 => high..=high,
            -1 => low..=low,
            _ => low..=high,
        };
        let step = Point::from(dir);
        let xs = side(step.x, self.bounds.x1, self.bounds.x2);
        let ys = side(step.y, self.bounds.y1, self.bounds.y2);
        iproduct!(ys, xs).map(|(y, x)| Point::new(x, y)).collect()
    }
}

#[derive(Clone, Debug)]
pub struct ChunkPartition {
    chunk_size: usize,
    width: usize,
    height: usize,
    chunks_x: usize,
    chunks_y: usize,
    chunks: Vec<Chunk>,
    regions: Vec<Region>,
    cell_region: Vec<Option<RegionId>>,
}

impl ChunkPartition {
    pub fn new(grid: &Grid, chunk_size: usize) -> Result<ChunkPartition> {
        if chunk_size == 0 {
            return Err(PathfindingError::InvalidChunkSize(chunk_size));
        }
        let chunks_x = grid.width().div_ceil(chunk_size);
        let chunks_y = grid.height().div_ceil(chunk_size);
        let size = chunk_size as i32;
        let mut chunks: Vec<Chunk> = iproduct!(0..chunks_y as i32, 0..chunks_x as i32)
            .map(|(cy, cx)| {
                let (x, y) = (cx * size, cy * size);
                Chunk {
                    coord: ChunkCoord::new(cx, cy),
                    bounds: cell_rect(
                        x,
                        y,
                        size.min(grid.width() as i32 - x),
                        size.min(grid.height() as i32 - y),
                    ),
                    passability: Default::default(),
                    regions: SmallVec::new(),
                }
            })
            .collect();

        let mut partition = ChunkPartition {
            chunk_size,
            width: grid.width(),
            height: grid.height(),
            chunks_x,
            chunks_y,
            chunks: Vec::new(),
            regions: Vec::new(),
            cell_region: vec![None; grid.len()],
        };

        // Union cells connected by moves that stay inside their chunk.
        let mut components = UnionFind::new(grid.len());
        for point in grid.free_cells() {
            let chunk = partition.chunk_of(point);
            for (dx, dy) in FORWARD_OFFSETS {
                let next = Point::new(point.x + dx, point.y + dy);
                if grid.can_move_to(next, point) && partition.chunk_of(next) == chunk {
                    components.union(grid.get_ix_point(&point), grid.get_ix_point(&next));
                }
            }
        }

        // Number the regions chunk by chunk so ids are deterministic.
        let mut root_region: Vec<Option<RegionId>> = vec![None; grid.len()];
        for chunk in chunks.iter_mut() {
            let bounds = chunk.bounds;
            for (y, x) in iproduct!(bounds.y1..=bounds.y2, bounds.x1..=bounds.x2) {
                let point = Point::new(x, y);
                if !grid.can_move_to_simple(point) {
                    continue;
                }
                let ix = grid.get_ix_point(&point);
                let root = components.find(ix);
                let region = *root_region[root].get_or_insert_with(|| {
                    partition.regions.push(Region {
                        chunk: chunk.coord,
                        cells: 0,
                        links: SmallVec::new(),
                    });
                    chunk.regions.push(partition.regions.len() - 1);
                    partition.regions.len() - 1
                });
                partition.regions[region].cells += 1;
                partition.cell_region[ix] = Some(region);
            }
        }
        partition.chunks = chunks;

        // Link regions across chunk borders.
        for point in grid.free_cells() {
            let Some(region) = partition.region_of(point) else {
                continue;
            };
            let chunk = partition.chunk_of(point);
            for (next, _) in grid.legal_moves(point) {
                let next_chunk = partition.chunk_of(next);
                if next_chunk == chunk {
                    continue;
                }
                let Some(next_region) = partition.region_of(next) else {
                    continue;
                };
                let dir = chunk.dir_obj(next_chunk);
                let links = &mut partition.regions[region].links;
                if !links.contains(&(dir, next_region)) {
                    links.push((dir, next_region));
                }
            }
        }

        info!(
            "Built chunk partition: {}x{} chunks of size {}, {} regions",
            chunks_x,
            chunks_y,
            chunk_size,
            partition.regions.len()
        );
        Ok(partition)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks along x and y.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.chunks_x, self.chunks_y)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk_of(&self, point: Point) -> ChunkCoord {
        let size = self.chunk_size as i32;
        ChunkCoord::new(point.x.div_euclid(size), point.y.div_euclid(size))
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        (coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.chunks_x
            && (coord.y as usize) < self.chunks_y)
            .then(|| &self.chunks[coord.y as usize * self.chunks_x + coord.x as usize])
    }

    pub fn region_of(&self, point: Point) -> Option<RegionId> {
        if point.x < 0
            || point.y < 0
            || point.x as usize >= self.width
            || point.y as usize >= self.height
        {
            return None;
        }
        self.cell_region[point.y as usize * self.width + point.x as usize]
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id]
    }

    /// Chunk holding a region, [None] for an unknown id.
    pub fn region_chunk(&self, id: RegionId) -> Option<&Chunk> {
        self.regions.get(id).and_then(|region| self.chunk(region.chunk))
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Whether at least one pair of free cells crosses the chunk's border (or corner, for
    /// diagonals) towards `dir`. Computed on first use and cached in the chunk.
    pub fn passable(&self, grid: &Grid, coord: ChunkCoord, dir: Direction) -> bool {
        debug_assert_eq!((grid.width(), grid.height()), (self.width, self.height));
        let Some(chunk) = self.chunk(coord) else {
            return false;
        };
        *chunk.passability[dir.num() as usize].get_or_init(|| {
            self.chunk(coord.neighbor(dir)).is_some()
                && chunk.border(dir).into_iter().any(|cell| {
                    grid.can_move_to_simple(cell)
                        && if dir.diagonal() {
                            grid.can_step(cell, dir)
                        } else {
                            grid.can_move_to_simple(cell + dir)
                        }
                })
        })
    }

    /// All eight flags of a chunk, indexed by [Direction::num].
    pub fn passability(&self, grid: &Grid, coord: ChunkCoord) -> [bool; 8] {
        let mut flags = [false; 8];
        for dir in directions() {
            flags[dir.num() as usize] = self.passable(grid, coord, dir);
        }
        flags
    }

    /// Forces every lazily computed flag, e.g. before dumping the partition.
    pub fn compute_all(&self, grid: &Grid) -> Vec<[bool; 8]> {
        self.chunks
            .iter()
            .map(|chunk| self.passability(grid, chunk.coord))
            .collect()
    }
}

impl fmt::Display for ChunkPartition {
    /// Draws every chunk as a 3x3 block: the centre holds the region count (`#` for a chunk
    /// without free cells), the ring shows the flag towards each direction as `+` (passable),
    /// `.` (blocked) or `?` (not computed yet).
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = |chunk: &Chunk, dir: Direction| match chunk.cached_passability(dir) {
            Some(true) => '+',
            Some(false) => '.',
            None => '?',
        };
        writeln!(
            f,
            "Chunks ({}x{}, size {}):",
            self.chunks_x, self.chunks_y, self.chunk_size
        )?;
        for row in self.chunks.chunks(self.chunks_x) {
            for dy in -1..=1 {
                let band: Vec<String> = row
                    .iter()
                    .map(|chunk| {
                        (-1..=1)
                            .map(|dx| match Point::new(dx, dy).abs_dir() {
                                Direction::NONE => match chunk.regions.len() {
                                    0 => '#',
                                    n => char::from_digit(n.min(9) as u32, 10).unwrap_or('9'),
                                },
                                dir => symbol(chunk, dir),
                            })
                            .collect()
                    })
                    .collect();
                writeln!(f, "{}", band.join(" "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    #[test]
    fn rejects_zero_chunk_size() {
        let grid = Grid::filled(4, 4, Cell::Free).unwrap();
        assert!(matches!(
            ChunkPartition::new(&grid, 0),
            Err(PathfindingError::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn partial_chunks_at_the_edges() {
        let grid = Grid::filled(10, 7, Cell::Free).unwrap();
        let partition = ChunkPartition::new(&grid, 4).unwrap();
        assert_eq!(partition.dimensions(), (3, 2));
        let corner = partition.chunk(ChunkCoord::new(2, 1)).unwrap();
        assert_eq!(corner.bounds, cell_rect(8, 4, 2, 3));
        assert_eq!(corner.area(), 6);
        assert!(corner.contains(Point::new(9, 6)));
        assert!(!corner.contains(Point::new(7, 6)));
        assert_eq!(partition.chunk_of(Point::new(9, 6)), ChunkCoord::new(2, 1));
        assert!(partition.chunk(ChunkCoord::new(3, 0)).is_none());
        assert_eq!(partition.region_count(), 6);
    }

    #[test]
    fn passability_flags() {
        // Chunks of size 2; the wall at x = 2 closes the east side of chunk [0, 0] while
        // chunk [0, 1] below it can still cross east.
        let grid = Grid::from_ascii(
            "
            ..#.
            ..#.
            ....
            ....
            ",
        )
        .unwrap();
        let partition = ChunkPartition::new(&grid, 2).unwrap();
        let origin = ChunkCoord::new(0, 0);
        assert_eq!(partition.chunk(origin).unwrap().cached_passability(Direction::EAST), None);
        assert!(!partition.passable(&grid, origin, Direction::EAST));
        assert_eq!(
            partition.chunk(origin).unwrap().cached_passability(Direction::EAST),
            Some(false)
        );
        assert!(partition.passable(&grid, origin, Direction::NORTH));
        // Corner (1, 1) -> (2, 2) needs (2, 1) free, which it is not.
        assert!(!partition.passable(&grid, origin, Direction::NORTHEAST));
        assert!(partition.passable(&grid, ChunkCoord::new(0, 1), Direction::EAST));
        // Corner (1, 2) -> (2, 1) lands on the wall.
        assert!(!partition.passable(&grid, ChunkCoord::new(0, 1), Direction::SOUTHEAST));
        // Off the map
        assert!(!partition.passable(&grid, origin, Direction::SOUTH));
    }

    #[test]
    fn chunk_with_two_regions() {
        // The diagonal wall splits chunk [0, 0] into two regions.
        let grid = Grid::from_ascii(
            "
            .#..
            #...
            ....
            ",
        )
        .unwrap();
        let partition = ChunkPartition::new(&grid, 4).unwrap();
        assert_eq!(partition.region_count(), 2);
        assert_ne!(
            partition.region_of(Point::new(0, 0)),
            partition.region_of(Point::new(3, 2))
        );
        assert_eq!(partition.region_of(Point::new(1, 0)), None);
    }

    #[test]
    fn links_follow_legal_moves() {
        let grid = Grid::from_ascii(
            "
            ....
            ....
            ",
        )
        .unwrap();
        let partition = ChunkPartition::new(&grid, 2).unwrap();
        let left = partition.region_of(Point::new(0, 0)).unwrap();
        let right = partition.region_of(Point::new(3, 0)).unwrap();
        assert_eq!(partition.region(left).links(), &[(Direction::EAST, right)]);
        assert_eq!(partition.region(right).links(), &[(Direction::WEST, left)]);
    }

    #[test]
    fn building_twice_is_identical() {
        let grid = Grid::from_ascii(
            "
            ..#.....
            ..#..#..
            .....#..
            ###..#..
            ........
            ",
        )
        .unwrap();
        let a = ChunkPartition::new(&grid, 3).unwrap();
        let b = ChunkPartition::new(&grid, 3).unwrap();
        assert_eq!(a.compute_all(&grid), b.compute_all(&grid));
        assert_eq!(a.regions(), b.regions());
        assert_eq!(a.to_string(), b.to_string());
        assert!(!a.to_string().contains('?'));
    }
}
