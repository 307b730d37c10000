//! Minimal Go board used to replay game records.
//!
//! Only what replay needs: placing stones, removing captured groups and
//! refusing suicide. Ko is not tracked; the record is assumed to be legal in
//! that respect and the engine checks the full rules itself.

use crate::models::{Color, Point};

/// Why a stone could not be played
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    #[error("point is off the board")]
    OffBoard,
    #[error("point is already occupied")]
    Occupied,
    #[error("move would be suicide")]
    Suicide,
}

#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, point: Point) -> usize {
        point.row * self.size + point.col
    }

    pub fn get(&self, point: Point) -> Option<Color> {
        if !point.in_bounds(self.size) {
            return None;
        }
        self.cells[self.idx(point)]
    }

    fn neighbors(&self, point: Point) -> impl Iterator<Item = Point> {
        let s = self.size;
        let mut v = Vec::with_capacity(4);
        if point.row > 0 {
            v.push(Point::new(point.row - 1, point.col));
        }
        if point.row + 1 < s {
            v.push(Point::new(point.row + 1, point.col));
        }
        if point.col > 0 {
            v.push(Point::new(point.row, point.col - 1));
        }
        if point.col + 1 < s {
            v.push(Point::new(point.row, point.col + 1));
        }
        v.into_iter()
    }

    /// Play a stone, removing opponent groups left without liberties.
    ///
    /// Returns the number of stones captured. The board is unchanged when the
    /// move is illegal.
    pub fn play(&mut self, point: Point, color: Color) -> Result<usize, IllegalMove> {
        if !point.in_bounds(self.size) {
            return Err(IllegalMove::OffBoard);
        }
        if self.get(point).is_some() {
            return Err(IllegalMove::Occupied);
        }
        let idx = self.idx(point);
        self.cells[idx] = Some(color);

        let opp = color.opponent();
        let mut to_remove: Vec<Point> = Vec::new();
        for n in self.neighbors(point) {
            if self.get(n) == Some(opp) && !to_remove.contains(&n) {
                let group = self.collect_group(n);
                if !self.has_liberty(&group) {
                    to_remove.extend(group);
                }
            }
        }

        if to_remove.is_empty() {
            let own = self.collect_group(point);
            if !self.has_liberty(&own) {
                self.cells[idx] = None;
                return Err(IllegalMove::Suicide);
            }
        }

        for p in &to_remove {
            let i = self.idx(*p);
            self.cells[i] = None;
        }
        Ok(to_remove.len())
    }

    /// Put a setup stone on the board without capture checks
    pub fn place(&mut self, point: Point, color: Color) {
        if point.in_bounds(self.size) {
            let i = self.idx(point);
            self.cells[i] = Some(color);
        }
    }

    pub fn clear(&mut self, point: Point) {
        if point.in_bounds(self.size) {
            let i = self.idx(point);
            self.cells[i] = None;
        }
    }

    /// All stones connected to the stone at `start`
    fn collect_group(&self, start: Point) -> Vec<Point> {
        let Some(color) = self.get(start) else {
            return Vec::new();
        };
        let mut stack = vec![start];
        let mut visited = vec![false; self.size * self.size];
        let mut group = Vec::new();
        while let Some(p) = stack.pop() {
            let i = self.idx(p);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            group.push(p);
            for n in self.neighbors(p) {
                if !visited[self.idx(n)] && self.get(n) == Some(color) {
                    stack.push(n);
                }
            }
        }
        group
    }

    fn has_liberty(&self, group: &[Point]) -> bool {
        group
            .iter()
            .any(|p| self.neighbors(*p).any(|n| self.get(n).is_none()))
    }

    /// Board contents as rows, row 0 at the top
    pub fn into_grid(self) -> Vec<Vec<Option<Color>>> {
        self.cells
            .chunks(self.size.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: usize, col: usize) -> Point {
        Point::new(row, col)
    }

    #[test]
    fn test_single_stone_capture() {
        let mut board = Board::new(5);
        board.play(p(1, 1), Color::White).unwrap();
        board.play(p(0, 1), Color::Black).unwrap();
        board.play(p(1, 0), Color::Black).unwrap();
        board.play(p(2, 1), Color::Black).unwrap();
        let captured = board.play(p(1, 2), Color::Black).unwrap();
        assert_eq!(captured, 1);
        assert_eq!(board.get(p(1, 1)), None);
    }

    #[test]
    fn test_group_capture_in_corner() {
        let mut board = Board::new(5);
        board.play(p(0, 0), Color::White).unwrap();
        board.play(p(0, 1), Color::White).unwrap();
        board.play(p(1, 0), Color::Black).unwrap();
        board.play(p(1, 1), Color::Black).unwrap();
        let captured = board.play(p(0, 2), Color::Black).unwrap();
        assert_eq!(captured, 2);
        assert_eq!(board.get(p(0, 0)), None);
        assert_eq!(board.get(p(0, 1)), None);
    }

    #[test]
    fn test_suicide_rejected() {
        let mut board = Board::new(5);
        board.play(p(0, 1), Color::Black).unwrap();
        board.play(p(1, 0), Color::Black).unwrap();
        assert_eq!(board.play(p(0, 0), Color::White), Err(IllegalMove::Suicide));
        assert_eq!(board.get(p(0, 0)), None);
    }

    #[test]
    fn test_capture_beats_suicide() {
        // The corner point has no liberties but playing it captures both stones
        let mut board = Board::new(5);
        board.play(p(0, 1), Color::Black).unwrap();
        board.play(p(0, 2), Color::White).unwrap();
        board.play(p(1, 1), Color::White).unwrap();
        board.play(p(1, 0), Color::Black).unwrap();
        board.play(p(2, 0), Color::White).unwrap();
        let captured = board.play(p(0, 0), Color::White).unwrap();
        assert_eq!(captured, 2);
        assert_eq!(board.get(p(0, 1)), None);
        assert_eq!(board.get(p(1, 0)), None);
        assert_eq!(board.get(p(0, 0)), Some(Color::White));
    }

    #[test]
    fn test_occupied_and_off_board() {
        let mut board = Board::new(3);
        board.play(p(1, 1), Color::Black).unwrap();
        assert_eq!(board.play(p(1, 1), Color::White), Err(IllegalMove::Occupied));
        assert_eq!(board.play(p(3, 0), Color::White), Err(IllegalMove::OffBoard));
    }

    #[test]
    fn test_setup_and_grid() {
        let mut board = Board::new(3);
        board.place(p(0, 2), Color::White);
        board.place(p(2, 0), Color::Black);
        board.clear(p(0, 2));
        let grid = board.into_grid();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[2][0], Some(Color::Black));
        assert_eq!(grid[0][2], None);
    }
}
