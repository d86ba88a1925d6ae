//! A* pathfinding over the playfield blocking grid
//!
//! Frontier management goes through [`ScoreHeap`], using its rescoring
//! support to update open-set entries in place when a cheaper route to a
//! cell is found. Queries carry an iteration budget so a burst of re-pathing
//! units cannot stall a simulation tick.

use ahash::AHashMap;

use crate::pathing::heap::ScoreHeap;

/// Cell coordinate on the navigation grid
pub type NavCell = (i32, i32);

/// Boolean blocking map over the playfield, one flag per map grid cell
#[derive(Debug, Clone)]
pub struct NavGrid {
    width: i32,
    height: i32,
    blocked: Vec<bool>,
}

impl NavGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            blocked: vec![false; (width * height) as usize],
        }
    }

    pub fn set_blocked(&mut self, cell: NavCell, value: bool) {
        if self.in_bounds(cell) {
            self.blocked[(cell.1 * self.width + cell.0) as usize] = value;
        }
    }

    pub fn is_blocked(&self, cell: NavCell) -> bool {
        !self.in_bounds(cell) || self.blocked[(cell.1 * self.width + cell.0) as usize]
    }

    fn in_bounds(&self, cell: NavCell) -> bool {
        cell.0 >= 0 && cell.0 < self.width && cell.1 >= 0 && cell.1 < self.height
    }
}

fn heuristic(a: NavCell, b: NavCell) -> f32 {
    ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as f32
}

const NEIGHBORS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Find a path from `start` to `goal`, 4-connected.
///
/// Returns `None` if no path exists or the iteration budget runs out.
pub fn find_path(
    grid: &NavGrid,
    start: NavCell,
    goal: NavCell,
    iter_limit: usize,
) -> Option<Vec<NavCell>> {
    if grid.is_blocked(start) || grid.is_blocked(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let mut open: ScoreHeap<NavCell> = ScoreHeap::new();
    let mut came_from: AHashMap<NavCell, NavCell> = AHashMap::new();
    let mut g_scores: AHashMap<NavCell, f32> = AHashMap::new();

    g_scores.insert(start, 0.0);
    open.push(start, heuristic(start, goal)).expect("fresh heap");

    let mut iterations = 0;
    while let Some(current) = open.pop() {
        iterations += 1;
        if iterations > iter_limit {
            return None;
        }
        if current == goal {
            return Some(reconstruct_path(&came_from, current));
        }

        let current_g = g_scores[&current];
        for (dx, dy) in NEIGHBORS {
            let neighbor = (current.0 + dx, current.1 + dy);
            if grid.is_blocked(neighbor) {
                continue;
            }
            let tentative_g = current_g + 1.0;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);
            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current);
                g_scores.insert(neighbor, tentative_g);
                let f_cost = tentative_g + heuristic(neighbor, goal);
                if open.contains(&neighbor) {
                    open.rescore(&neighbor, f_cost).expect("present in open set");
                } else {
                    open.push(neighbor, f_cost).expect("absent from open set");
                }
            }
        }
    }

    None
}

fn reconstruct_path(came_from: &AHashMap<NavCell, NavCell>, mut current: NavCell) -> Vec<NavCell> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
