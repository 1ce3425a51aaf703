//! Grid coordinates and the fixed tank the scene lives in.

/// A grid cell. Rows grow downward, columns grow rightward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// Extent of a glyph block in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

impl Size {
    pub const ZERO: Size = Size { rows: 0, cols: 0 };

    pub const fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }

    pub fn is_empty(self) -> bool {
        self.rows <= 0 || self.cols <= 0
    }
}

/// Direction of travel, one step per axis: `v` vertical, `h` horizontal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Heading {
    pub v: i32,
    pub h: i32,
}

impl Heading {
    pub const fn new(v: i32, h: i32) -> Self {
        Self { v, h }
    }

    pub fn is_unit(self) -> bool {
        self.v.abs() <= 1 && self.h.abs() <= 1
    }
}

/// Dimensions of the aquarium and the two horizontal surfaces that bound
/// swimmers (water line) and crawlers (sand line).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tank {
    pub width: i32,
    pub height: i32,
    pub water_row: i32,
    pub sand_row: i32,
    pub water_margin: i32,
    pub sand_margin: i32,
}

impl Tank {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            water_row: 0,
            sand_row: height * 2 / 3,
            water_margin: 50,
            sand_margin: 5,
        }
    }

    pub fn volume(&self) -> i32 {
        self.width * self.height
    }

    /// How many "units" of scenery fit across; never zero.
    pub fn scale(&self) -> i32 {
        (self.width / 40).max(1)
    }

    /// Cells strictly inside the one-cell border.
    #[inline]
    pub fn in_interior(&self, row: i32, col: i32) -> bool {
        row >= 1 && row <= self.height - 2 && col >= 1 && col <= self.width - 2
    }

    #[inline]
    pub fn in_grid(&self, row: i32, col: i32) -> bool {
        row >= 0 && row < self.height && col >= 0 && col < self.width
    }
}
