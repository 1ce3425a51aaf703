//! Terminal output: a double-buffered cell grid that only emits the cells
//! that changed since the last frame.

use crate::surface::{Cell, Surface};
use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, DisableLineWrap, EnableLineWrap, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

pub struct Renderer {
    w: u16,
    h: u16,
    front: Vec<Cell>,
    back: Vec<Cell>,
    full_redraw: bool,
    last_fg: Color,
}

impl Renderer {
    pub fn new(w: u16, h: u16) -> Self {
        let n = (w as usize) * (h as usize);
        Self {
            w,
            h,
            front: vec![Cell::blank(); n],
            back: vec![Cell::blank(); n],
            full_redraw: true,
            last_fg: Color::Reset,
        }
    }

    pub fn resize(&mut self, w: u16, h: u16) {
        *self = Self::new(w, h);
    }

    pub fn request_full_redraw(&mut self) {
        self.full_redraw = true;
    }

    #[inline]
    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    fn put(&mut self, x: u16, y: u16, cell: Cell) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        self.back[i] = cell;
    }

    /// Copy the tank into the back buffer. Cells outside the tank are blank.
    pub fn compose(&mut self, surface: &Surface) {
        for c in &mut self.back {
            *c = Cell::blank();
        }
        for y in 0..surface.height().min(i32::from(self.h)) {
            for (x, &cell) in surface.row(y).iter().take(self.w as usize).enumerate() {
                self.put(x as u16, y as u16, cell);
            }
        }
    }

    /// Write `lines` over the top-left of the back buffer, inside the border.
    pub fn overlay(&mut self, lines: &[String], fg: Color) {
        for (row, line) in lines.iter().enumerate() {
            let y = row as u16 + 1;
            for (col, ch) in line.chars().enumerate() {
                self.put(col as u16 + 1, y, Cell::new(ch, fg));
            }
        }
    }

    /// Emit changed cells inside one synchronized update. Returns how many
    /// cells were written.
    pub fn flush<W: Write>(&mut self, out: &mut W) -> io::Result<usize> {
        queue!(out, BeginSynchronizedUpdate)?;

        let w = self.w as usize;
        let h = self.h as usize;
        let mut written = 0;

        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                let b = self.back[i];
                let f = self.front[i];

                if !self.full_redraw && b == f {
                    continue;
                }

                if b.fg != self.last_fg {
                    queue!(out, SetForegroundColor(b.fg))?;
                    self.last_fg = b.fg;
                }

                queue!(out, cursor::MoveTo(x as u16, y as u16), Print(b.ch))?;
                self.front[i] = b;
                written += 1;
            }
        }

        self.full_redraw = false;

        queue!(out, ResetColor, EndSynchronizedUpdate)?;
        self.last_fg = Color::Reset;
        out.flush()?;
        Ok(written)
    }
}

/// Raw mode and the alternate screen for as long as it lives.
pub struct CleanupGuard;

impl CleanupGuard {
    pub fn enter<W: Write>(out: &mut W) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        queue!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )?;
        out.flush()?;
        Ok(Self)
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = queue!(
            out,
            EndSynchronizedUpdate,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = out.flush();
        let _ = terminal::disable_raw_mode();
    }
}
