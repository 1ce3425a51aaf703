//! The character grid every agent paints into, and the frozen backdrop used
//! to wipe an agent back to whatever scenery sat beneath it.

use crate::facing::Facing;
use crate::geometry::{Position, Size, Tank};
use crate::sprite::Sprite;
use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
}

impl Cell {
    pub const fn new(ch: char, fg: Color) -> Self {
        Self { ch, fg }
    }

    pub const fn blank() -> Self {
        Self {
            ch: ' ',
            fg: Color::Reset,
        }
    }
}

/// Anything with a position and a glyph block.
pub trait Drawable: Facing {
    fn sprite(&self) -> Sprite<'_>;
    fn color(&self) -> Color;

    /// Glyph that is skipped when painting.
    fn transparent(&self) -> char {
        ' '
    }

    /// Rectangle restored by [`Surface::erase`].
    fn footprint(&self) -> Size {
        self.sprite().size()
    }
}

pub struct Surface {
    tank: Tank,
    cells: Vec<Cell>,
    backdrop: Option<Vec<Cell>>,
}

impl Surface {
    /// Blank grid with the aquarium border drawn in `border`.
    pub fn new(tank: Tank, border: Color) -> Self {
        let n = (tank.width.max(0) as usize) * (tank.height.max(0) as usize);
        let mut surface = Self {
            tank,
            cells: vec![Cell::blank(); n],
            backdrop: None,
        };
        for row in 0..tank.height {
            surface.put(row, 0, Cell::new('|', border));
            surface.put(row, tank.width - 1, Cell::new('|', border));
        }
        for col in 0..tank.width {
            surface.put(0, col, Cell::new('=', border));
            surface.put(tank.height - 1, col, Cell::new('=', border));
        }
        surface
    }

    pub fn tank(&self) -> &Tank {
        &self.tank
    }

    pub fn width(&self) -> i32 {
        self.tank.width
    }

    pub fn height(&self) -> i32 {
        self.tank.height
    }

    #[inline]
    fn idx(&self, row: i32, col: i32) -> Option<usize> {
        if !self.tank.in_grid(row, col) {
            return None;
        }
        Some((row as usize) * (self.tank.width as usize) + (col as usize))
    }

    pub fn cell(&self, row: i32, col: i32) -> Option<Cell> {
        self.idx(row, col).map(|i| self.cells[i])
    }

    pub fn backdrop_cell(&self, row: i32, col: i32) -> Option<Cell> {
        let i = self.idx(row, col)?;
        Some(match &self.backdrop {
            Some(backdrop) => backdrop[i],
            None => Cell::blank(),
        })
    }

    /// One row of the current frame, for the renderer.
    pub fn row(&self, row: i32) -> &[Cell] {
        match self.idx(row, 0) {
            Some(start) => &self.cells[start..start + self.tank.width as usize],
            None => &[],
        }
    }

    /// Raw write anywhere on the grid, border included.
    pub fn put(&mut self, row: i32, col: i32, cell: Cell) {
        if let Some(i) = self.idx(row, col) {
            self.cells[i] = cell;
        }
    }

    /// Paint `sprite` at `anchor`, skipping `transparent` glyphs and anything
    /// outside the interior.
    pub fn paint(&mut self, anchor: Position, sprite: &Sprite<'_>, fg: Color, transparent: char) {
        for (dy, line) in sprite.rows().into_iter().enumerate() {
            let row = anchor.row + dy as i32;
            for (dx, ch) in line.chars().enumerate() {
                let col = anchor.col + dx as i32;
                if ch == transparent || !self.tank.in_interior(row, col) {
                    continue;
                }
                if let Some(i) = self.idx(row, col) {
                    self.cells[i] = Cell::new(ch, fg);
                }
            }
        }
    }

    /// Copy the backdrop over a whole rectangle, blank glyphs included.
    pub fn restore(&mut self, anchor: Position, size: Size) {
        for dy in 0..size.rows.max(0) {
            for dx in 0..size.cols.max(0) {
                let (row, col) = (anchor.row + dy, anchor.col + dx);
                if !self.tank.in_interior(row, col) {
                    continue;
                }
                if let (Some(i), Some(under)) = (self.idx(row, col), self.backdrop_cell(row, col)) {
                    self.cells[i] = under;
                }
            }
        }
    }

    pub fn draw<D: Drawable + ?Sized>(&mut self, item: &D) {
        let sprite = item.sprite();
        self.paint(item.anchor(), &sprite, item.color(), item.transparent());
    }

    pub fn erase<D: Drawable + ?Sized>(&mut self, item: &D) {
        self.restore(item.anchor(), item.footprint());
    }

    /// Capture the current grid as the backdrop. Only the first call has an
    /// effect.
    pub fn freeze_backdrop(&mut self) -> bool {
        if self.backdrop.is_some() {
            return false;
        }
        self.backdrop = Some(self.cells.clone());
        true
    }

    pub fn has_backdrop(&self) -> bool {
        self.backdrop.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    struct Stamp {
        at: Position,
        art: &'static [&'static str],
    }

    impl Facing for Stamp {
        fn anchor(&self) -> Position {
            self.at
        }
        fn extent(&self) -> Size {
            self.sprite().size()
        }
    }

    impl Drawable for Stamp {
        fn sprite(&self) -> Sprite<'_> {
            Sprite::Block(self.art)
        }
        fn color(&self) -> Color {
            Color::Red
        }
    }

    fn surface() -> Surface {
        Surface::new(Tank::new(12, 8), Color::Blue)
    }

    #[test]
    fn border_is_drawn() {
        let s = surface();
        assert_eq!(s.cell(0, 0).map(|c| c.ch), Some('='));
        assert_eq!(s.cell(7, 11).map(|c| c.ch), Some('='));
        assert_eq!(s.cell(3, 0).map(|c| c.ch), Some('|'));
        assert_eq!(s.cell(3, 11).map(|c| c.ch), Some('|'));
        assert_eq!(s.cell(3, 3).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn draw_skips_blank_glyphs_and_border() {
        let mut s = surface();
        s.put(2, 2, Cell::new('#', Color::Green));
        s.draw(&Stamp {
            at: Position::new(2, 1),
            art: &["x x"],
        });
        assert_eq!(s.cell(2, 1).map(|c| c.ch), Some('x'));
        assert_eq!(s.cell(2, 2).map(|c| c.ch), Some('#'));
        assert_eq!(s.cell(2, 3).map(|c| c.ch), Some('x'));

        s.draw(&Stamp {
            at: Position::new(0, -1),
            art: &["abc", "def"],
        });
        assert_eq!(s.cell(0, 0).map(|c| c.ch), Some('='));
        assert_eq!(s.cell(1, 1).map(|c| c.ch), Some('f'));
    }

    #[test]
    fn erase_restores_whole_rectangle_from_backdrop() {
        let mut s = surface();
        s.put(3, 4, Cell::new('~', Color::Cyan));
        assert!(s.freeze_backdrop());
        s.paint(Position::new(3, 3), &Sprite::Line(Cow::Borrowed("a b")), Color::Red, ' ');
        s.put(3, 4, Cell::new('!', Color::Red));
        s.erase(&Stamp {
            at: Position::new(3, 3),
            art: &["   "],
        });
        assert_eq!(s.cell(3, 3), Some(Cell::blank()));
        assert_eq!(s.cell(3, 4), Some(Cell::new('~', Color::Cyan)));
        assert_eq!(s.cell(3, 5), Some(Cell::blank()));
    }

    #[test]
    fn backdrop_is_frozen_once() {
        let mut s = surface();
        assert!(s.freeze_backdrop());
        s.put(2, 2, Cell::new('z', Color::Red));
        assert!(!s.freeze_backdrop());
        assert_eq!(s.backdrop_cell(2, 2), Some(Cell::blank()));
    }
}
