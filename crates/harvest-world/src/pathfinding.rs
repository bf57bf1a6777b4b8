//! A* shortest paths over the field grid.
//!
//! Edges connect orthogonal neighbors with uniform cost 1. Cells for which
//! the caller's `is_blocked` predicate returns `true` are impassable, which
//! is how occupied cells are avoided. The start cell is never treated as
//! blocked.
//!
//! The open set is a min-heap keyed on `(f, discovery sequence)`, so among
//! entries with equal f-score the one discovered first is expanded first.
//! Combined with the fixed up/down/left/right neighbor order this makes
//! every search deterministic.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};

use harvest_types::{GridPos, manhattan_distance};

use crate::field_grid::FieldGrid;

/// Admissible distance estimate used to order the A* frontier.
pub trait Heuristic: std::fmt::Debug {
    /// Estimated remaining cost from `from` to `goal`.
    fn estimate(&self, from: GridPos, goal: GridPos) -> u32;
}

impl<H: Heuristic + ?Sized> Heuristic for Box<H> {
    fn estimate(&self, from: GridPos, goal: GridPos) -> u32 {
        (**self).estimate(from, goal)
    }
}

/// Manhattan distance, exact on an obstacle-free 4-connected grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Manhattan;

impl Heuristic for Manhattan {
    fn estimate(&self, from: GridPos, goal: GridPos) -> u32 {
        manhattan_distance(from, goal)
    }
}

/// Stateless A* search. Every call runs from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathFinder<H = Manhattan> {
    heuristic: H,
}

impl PathFinder<Manhattan> {
    /// A path finder using the Manhattan heuristic.
    pub const fn manhattan() -> Self {
        Self {
            heuristic: Manhattan,
        }
    }
}

impl<H: Heuristic> PathFinder<H> {
    /// A path finder using a custom heuristic.
    pub const fn with_heuristic(heuristic: H) -> Self {
        Self { heuristic }
    }

    /// Find a shortest path from `start` to `goal`, both inclusive.
    ///
    /// Returns `[start]` when `start == goal`, when either endpoint is off
    /// the field, or when no route exists (including a blocked goal).
    pub fn find_path(
        &self,
        grid: &FieldGrid,
        start: GridPos,
        goal: GridPos,
        is_blocked: impl Fn(GridPos) -> bool,
    ) -> Vec<GridPos> {
        if start == goal || !grid.contains(start) || !grid.contains(goal) || is_blocked(goal) {
            return vec![start];
        }

        let mut open: BinaryHeap<Reverse<(u32, u64, GridPos)>> = BinaryHeap::new();
        let mut g_score: BTreeMap<GridPos, u32> = BTreeMap::new();
        let mut came_from: BTreeMap<GridPos, GridPos> = BTreeMap::new();
        let mut closed: BTreeSet<GridPos> = BTreeSet::new();
        let mut sequence: u64 = 0;

        g_score.insert(start, 0);
        open.push(Reverse((self.heuristic.estimate(start, goal), sequence, start)));

        while let Some(Reverse((_, _, current))) = open.pop() {
            if current == goal {
                return reconstruct(&came_from, start, goal);
            }
            if !closed.insert(current) {
                continue;
            }
            let Some(current_g) = g_score.get(&current).copied() else {
                continue;
            };
            let Some(tentative) = current_g.checked_add(1) else {
                continue;
            };

            for neighbor in grid.neighbors4(current) {
                if closed.contains(&neighbor) || is_blocked(neighbor) {
                    continue;
                }
                let is_better = g_score
                    .get(&neighbor)
                    .is_none_or(|&existing| tentative < existing);
                if !is_better {
                    continue;
                }
                g_score.insert(neighbor, tentative);
                came_from.insert(neighbor, current);
                let f = tentative.saturating_add(self.heuristic.estimate(neighbor, goal));
                sequence = sequence.saturating_add(1);
                open.push(Reverse((f, sequence, neighbor)));
            }
        }

        vec![start]
    }
}

fn reconstruct(came_from: &BTreeMap<GridPos, GridPos>, start: GridPos, goal: GridPos) -> Vec<GridPos> {
    let mut path = VecDeque::new();
    let mut current = goal;
    path.push_front(current);
    while current != start {
        let Some(&previous) = came_from.get(&current) else {
            return vec![start];
        };
        path.push_front(previous);
        current = previous;
    }
    path.into_iter().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use harvest_types::UnitId;

    use super::*;

    fn open_field(width: u32, height: u32) -> FieldGrid {
        FieldGrid::new(
            width,
            height,
            GridPos::new(0, 0),
            GridPos::new(width - 1, height - 1),
        )
        .unwrap()
    }

    fn assert_connected(path: &[GridPos]) {
        for pair in path.windows(2) {
            assert_eq!(manhattan_distance(pair[0], pair[1]), 1, "path {path:?}");
        }
    }

    #[test]
    fn same_cell_is_singleton() {
        let grid = open_field(5, 5);
        let p = GridPos::new(2, 2);
        assert_eq!(PathFinder::manhattan().find_path(&grid, p, p, |_| false), vec![p]);
    }

    #[test]
    fn optimal_on_obstacle_free_grid() {
        let grid = open_field(8, 6);
        let finder = PathFinder::manhattan();
        let pairs = [
            (GridPos::new(0, 0), GridPos::new(7, 5)),
            (GridPos::new(3, 4), GridPos::new(1, 0)),
            (GridPos::new(6, 1), GridPos::new(6, 5)),
            (GridPos::new(2, 2), GridPos::new(3, 2)),
        ];
        for (start, goal) in pairs {
            let path = finder.find_path(&grid, start, goal, |_| false);
            let expected = usize::try_from(manhattan_distance(start, goal)).unwrap() + 1;
            assert_eq!(path.len(), expected);
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&goal));
            assert_connected(&path);
        }
    }

    #[test]
    fn routes_around_blocked_cells() {
        let mut grid = open_field(5, 5);
        // Wall across column 2 except the bottom row.
        for y in 0..4 {
            grid.place_unit(UnitId::new(y), GridPos::new(2, y)).unwrap();
        }
        let start = GridPos::new(0, 1);
        let goal = GridPos::new(4, 1);
        let path = PathFinder::manhattan().find_path(&grid, start, goal, |p| {
            grid.occupant_at(p).is_some()
        });
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert!(path.contains(&GridPos::new(2, 4)));
        assert_eq!(path.len(), 11);
        assert_connected(&path);
    }

    #[test]
    fn no_route_returns_start() {
        let mut grid = open_field(5, 5);
        for y in 0..5 {
            grid.place_unit(UnitId::new(y), GridPos::new(2, y)).unwrap();
        }
        let start = GridPos::new(0, 0);
        let path = PathFinder::manhattan().find_path(&grid, start, GridPos::new(4, 4), |p| {
            grid.occupant_at(p).is_some()
        });
        assert_eq!(path, vec![start]);
    }

    #[test]
    fn blocked_goal_has_no_path() {
        let grid = open_field(5, 5);
        let goal = GridPos::new(1, 0);
        let path =
            PathFinder::manhattan().find_path(&grid, GridPos::new(0, 0), goal, |p| p == goal);
        assert_eq!(path, vec![GridPos::new(0, 0)]);
    }

    #[test]
    fn deterministic_tie_breaking() {
        let grid = open_field(6, 6);
        let finder = PathFinder::manhattan();
        let a = finder.find_path(&grid, GridPos::new(0, 0), GridPos::new(5, 5), |_| false);
        let b = finder.find_path(&grid, GridPos::new(0, 0), GridPos::new(5, 5), |_| false);
        assert_eq!(a, b);
    }

    #[test]
    fn custom_heuristic_still_finds_shortest() {
        #[derive(Debug)]
        struct Zero;
        impl Heuristic for Zero {
            fn estimate(&self, _from: GridPos, _goal: GridPos) -> u32 {
                0
            }
        }
        let grid = open_field(5, 5);
        let path = PathFinder::with_heuristic(Zero).find_path(
            &grid,
            GridPos::new(0, 4),
            GridPos::new(4, 0),
            |_| false,
        );
        assert_eq!(path.len(), 9);

        let boxed: PathFinder<Box<dyn Heuristic>> = PathFinder::with_heuristic(Box::new(Zero));
        let again = boxed.find_path(&grid, GridPos::new(0, 4), GridPos::new(4, 0), |_| false);
        assert_eq!(again.len(), 9);
    }
}
