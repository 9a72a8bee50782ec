/// A dense 2D grid, row-major. Maps here are bounded rectangles: there is no
/// wrapping on either axis, and out-of-bounds access is a caller bug.
#[derive(Clone)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Fill the entire grid with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Signed-coordinate bounds check, for tile coordinates coming out of the
    /// inverse transform (which can be negative off the map edge).
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % self.width;
            let y = idx / self.width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip() {
        let mut grid = Grid::new_with(4, 3, 0u8);
        grid.set(3, 2, 7);
        assert_eq!(*grid.get(3, 2), 7);
        assert_eq!(*grid.get(0, 0), 0);
    }

    #[test]
    fn test_in_bounds_signed() {
        let grid = Grid::new_with(4, 3, 0u8);
        assert!(grid.in_bounds(0, 0));
        assert!(grid.in_bounds(3, 2));
        assert!(!grid.in_bounds(-1, 0));
        assert!(!grid.in_bounds(4, 0));
        assert!(!grid.in_bounds(0, 3));
    }

    #[test]
    fn test_iter_coordinates() {
        let grid = Grid::new_with(3, 2, 1u8);
        let cells: Vec<_> = grid.iter().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (0, 0));
        assert_eq!(cells[5], (2, 1));
    }
}
