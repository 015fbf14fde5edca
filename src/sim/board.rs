//! Match-3 board engine
//!
//! Free swap (any two cells) followed by cascading resolution: find runs,
//! report them, clear, drop, refill, repeat until the board is at rest.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_BOARD_COLORS;

/// A board cell: a gem value in `0..colors`, or `None` for a hole
pub type Cell = Option<u8>;

/// One contiguous run found in a resolution pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub gem: u8,
    pub count: usize,
}

/// Result of a match scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchInfo {
    /// Unified cleared indices, in first-seen order
    pub cleared: Vec<usize>,
    /// Cell indices per run (horizontal runs first, then vertical)
    pub groups: Vec<Vec<usize>>,
    /// One event per run
    pub events: Vec<MatchEvent>,
}

/// Recorded step of a swap resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveStep {
    Swap { a: usize, b: usize },
    Clear { cleared: Vec<usize> },
    Gravity,
    Refill,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub steps: Vec<ResolveStep>,
    pub total_cleared: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub w: usize,
    pub h: usize,
    pub colors: u8,
    /// Row-major cells, length `w * h`
    pub cells: Vec<Cell>,
}

impl Board {
    /// Create a board with no pre-existing run of three. Fewer than
    /// [`MIN_BOARD_COLORS`] colors are raised to it, otherwise refills could
    /// recreate runs forever.
    pub fn new<R: Rng + ?Sized>(w: usize, h: usize, colors: u8, rng: &mut R) -> Self {
        let colors = colors.max(MIN_BOARD_COLORS);
        let mut board = Self {
            w,
            h,
            colors,
            cells: vec![None; w * h],
        };
        for y in 0..h {
            for x in 0..w {
                let v = loop {
                    let v = rng.random_range(0..colors);
                    if !board.completes_run(x, y, v) {
                        break v;
                    }
                };
                let i = board.index(x, y);
                board.cells[i] = Some(v);
            }
        }
        board
    }

    /// Build a board from explicit cells (row-major)
    pub fn from_cells(w: usize, h: usize, colors: u8, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), w * h);
        Self {
            w,
            h,
            colors: colors.max(MIN_BOARD_COLORS),
            cells,
        }
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.w && y >= 0 && (y as usize) < self.h
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.cells[self.index(x, y)]
    }

    /// Would placing `v` at (x, y) complete a run with the two cells to the
    /// left or the two cells above?
    fn completes_run(&self, x: usize, y: usize, v: u8) -> bool {
        let left = x >= 2 && self.get(x - 1, y) == Some(v) && self.get(x - 2, y) == Some(v);
        let up = y >= 2 && self.get(x, y - 1) == Some(v) && self.get(x, y - 2) == Some(v);
        left || up
    }

    /// Swap two cells unconditionally
    pub fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        let i = self.index(a.0, a.1);
        let j = self.index(b.0, b.1);
        self.cells.swap(i, j);
    }

    /// Find every horizontal and vertical run of three or more
    pub fn find_matches(&self) -> MatchInfo {
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for y in 0..self.h {
            let mut x = 0;
            while x < self.w {
                let start = x;
                let val = self.get(x, y);
                x += 1;
                while x < self.w && self.get(x, y) == val {
                    x += 1;
                }
                if val.is_some() && x - start >= 3 {
                    groups.push((start..x).map(|k| self.index(k, y)).collect());
                }
            }
        }

        for x in 0..self.w {
            let mut y = 0;
            while y < self.h {
                let start = y;
                let val = self.get(x, y);
                y += 1;
                while y < self.h && self.get(x, y) == val {
                    y += 1;
                }
                if val.is_some() && y - start >= 3 {
                    groups.push((start..y).map(|k| self.index(x, k)).collect());
                }
            }
        }

        let mut seen = vec![false; self.cells.len()];
        let mut cleared = Vec::new();
        for &i in groups.iter().flatten() {
            if !seen[i] {
                seen[i] = true;
                cleared.push(i);
            }
        }

        let events = groups
            .iter()
            .filter_map(|g| {
                let gem = self.cells[*g.first()?]?;
                Some(MatchEvent {
                    gem,
                    count: g.len(),
                })
            })
            .collect();

        MatchInfo {
            cleared,
            groups,
            events,
        }
    }

    /// Turn the given cells into holes
    pub fn clear_matches(&mut self, cleared: &[usize]) {
        for &i in cleared {
            self.cells[i] = None;
        }
    }

    /// Compact every column toward the bottom, preserving order
    pub fn apply_gravity(&mut self) {
        for x in 0..self.w {
            let mut write = self.h;
            for y in (0..self.h).rev() {
                let i = self.index(x, y);
                if let Some(v) = self.cells[i] {
                    write -= 1;
                    let wi = self.index(x, write);
                    self.cells[wi] = Some(v);
                    if wi != i {
                        self.cells[i] = None;
                    }
                }
            }
        }
    }

    /// Fill every hole with a random gem (no run avoidance)
    pub fn refill<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let colors = self.colors;
        for cell in self.cells.iter_mut().filter(|c| c.is_none()) {
            *cell = Some(rng.random_range(0..colors));
        }
    }

    pub fn has_run(&self) -> bool {
        !self.find_matches().cleared.is_empty()
    }
}

/// Swap two cells, then resolve cascades until the board is at rest.
///
/// `on_matches` receives each pass's run events before that pass is cleared.
pub fn swap_and_resolve_free<R, F>(
    board: &mut Board,
    a: (usize, usize),
    b: (usize, usize),
    rng: &mut R,
    mut on_matches: F,
) -> ResolveResult
where
    R: Rng + ?Sized,
    F: FnMut(&[MatchEvent]),
{
    let mut steps = Vec::new();
    board.swap(a, b);
    steps.push(ResolveStep::Swap {
        a: board.index(a.0, a.1),
        b: board.index(b.0, b.1),
    });

    let mut total_cleared = 0;
    loop {
        let MatchInfo {
            cleared, events, ..
        } = board.find_matches();
        if cleared.is_empty() {
            break;
        }

        if !events.is_empty() {
            on_matches(&events);
        }

        total_cleared += cleared.len();
        board.clear_matches(&cleared);
        steps.push(ResolveStep::Clear { cleared });

        board.apply_gravity();
        steps.push(ResolveStep::Gravity);

        board.refill(rng);
        steps.push(ResolveStep::Refill);
    }

    ResolveResult {
        steps,
        total_cleared,
    }
}
