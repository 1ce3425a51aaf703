//! Static scenery: dunes, coral and kelp in three depth layers, plus the
//! sand and water fills painted under everything.

use crate::dice::span;
use crate::facing::{Facing, Target};
use crate::geometry::{Position, Size, Tank};
use crate::species::{ALL_COLORS, SAND_COLORS, WATER_COLORS, WINDOW_COLORS};
use crate::sprite::{self, Block, Sprite, DUNE_CLEAR};
use crate::surface::{Cell, Drawable, Surface};
use crossterm::style::Color;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Art {
    SmallDune,
    BigDune,
    HugeDune,
    SlopedDune,
    SlantedDune,
    TreeCoral(usize),
    BrainCoral,
    Kelp,
    LongKelp,
}

const DUNES: [Art; 5] = [Art::SmallDune, Art::BigDune, Art::HugeDune, Art::SlopedDune, Art::SlantedDune];
const FRONT_DUNES: [Art; 3] = [Art::HugeDune, Art::SlopedDune, Art::SlantedDune];

impl Art {
    pub fn block(self) -> Block {
        match self {
            Art::SmallDune => sprite::SMALL_DUNE,
            Art::BigDune => sprite::BIG_DUNE,
            Art::HugeDune => sprite::HUGE_DUNE,
            Art::SlopedDune => sprite::SLOPED_DUNE,
            Art::SlantedDune => sprite::SLANTED_DUNE,
            Art::TreeCoral(variant) => sprite::TREE_CORAL[variant % sprite::TREE_CORAL.len()],
            Art::BrainCoral => sprite::BRAIN_CORAL,
            Art::Kelp => sprite::KELP,
            Art::LongKelp => sprite::LONG_KELP,
        }
    }

    pub fn is_dune(self) -> bool {
        DUNES.contains(&self)
    }

    /// Tree coral comes in two shapes; pick one.
    fn settle<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        match self {
            Art::TreeCoral(_) => Art::TreeCoral(rng.gen_range(0..sprite::TREE_CORAL.len())),
            art => art,
        }
    }

    fn size(self) -> Size {
        Sprite::Block(self.block()).size()
    }
}

/// One placed piece of scenery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scenery {
    pub art: Art,
    pub position: Position,
    pub color: Color,
}

impl Scenery {
    fn bottom(&self) -> i32 {
        self.position.row + self.art.size().rows
    }

    /// Entirely left of or right of the visible tank.
    fn off_screen(&self, width: i32) -> bool {
        let cols = self.art.size().cols;
        self.position.col + cols < 1 || self.position.col - cols > width - 1
    }
}

impl Facing for Scenery {
    fn anchor(&self) -> Position {
        self.position
    }

    fn extent(&self) -> Size {
        self.art.size()
    }
}

impl Drawable for Scenery {
    fn sprite(&self) -> Sprite<'_> {
        Sprite::Block(self.art.block())
    }

    fn color(&self) -> Color {
        self.color
    }

    /// Dunes paint their blanks so they hide what is behind them.
    fn transparent(&self) -> char {
        if self.art.is_dune() {
            DUNE_CLEAR
        } else {
            ' '
        }
    }
}

/// The tank's static layers and colours.
#[derive(Clone, Debug)]
pub struct Scene {
    pub window: Color,
    pub water: Color,
    pub sand: Color,
    pub kelp: Color,
    /// Painted once, into the backdrop.
    pub background: Vec<Scenery>,
    /// Repainted every tick.
    pub midground: Vec<Scenery>,
    /// Midground tree coral and kelp, repainted after the bottom feeders.
    pub cover: Vec<Scenery>,
    pub foreground_kelp: Vec<Scenery>,
    pub foreground_dunes: Vec<Scenery>,
}

struct Scatter<'a> {
    arts: &'a [Art],
    count: i32,
    rows: (i32, i32),
    cols: (i32, i32),
    palette: &'a [Color],
}

impl Scatter<'_> {
    /// `count` pieces of each art, each at a random spot whose left edge
    /// leaves room for its width.
    fn place<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut Vec<Scenery>) {
        for &art in self.arts {
            for _ in 0..self.count.max(0) {
                let art = art.settle(rng);
                let width = art.size().cols;
                let row = span(rng, self.rows.0, self.rows.1);
                let col = span(rng, self.cols.0, self.cols.1 - width);
                let color = self.palette.choose(rng).copied().unwrap_or(Color::White);
                out.push(Scenery {
                    art,
                    position: Position::new(row, col),
                    color,
                });
            }
        }
    }
}

fn by_bottom(layer: &mut [Scenery]) {
    layer.sort_by_key(Scenery::bottom);
}

impl Scene {
    /// No scenery at all.
    pub fn bare() -> Self {
        Self {
            window: Color::Blue,
            water: Color::Cyan,
            sand: Color::Yellow,
            kelp: Color::Green,
            background: Vec::new(),
            midground: Vec::new(),
            cover: Vec::new(),
            foreground_kelp: Vec::new(),
            foreground_dunes: Vec::new(),
        }
    }

    /// Lay out every layer for `tank`. Pieces that would sit entirely off
    /// screen are dropped.
    pub fn generate<R: Rng + ?Sized>(tank: &Tank, hill: bool, rng: &mut R) -> Self {
        let (w, h) = (tank.width, tank.height);
        let scale = tank.scale();
        let sand = *SAND_COLORS.choose(rng).unwrap_or(&Color::Yellow);
        let kelp_colors: Vec<Color> = ALL_COLORS.iter().copied().filter(|&c| c != sand).collect();
        let kelp = *kelp_colors.choose(rng).unwrap_or(&Color::Green);
        let window = *WINDOW_COLORS.choose(rng).unwrap_or(&Color::Blue);
        let water = *WATER_COLORS.choose(rng).unwrap_or(&Color::Cyan);

        let (left, right) = (-7, w + 7);
        let (top, bottom) = (tank.sand_row + 1, h + 1);
        let sand_only = [sand];
        let kelp_only = [kelp];

        // background
        let mut background = Vec::new();
        Scatter {
            arts: &DUNES,
            count: span(rng, 0, 3 * scale),
            rows: (h * 2 / 3, h - 1),
            cols: (left, right),
            palette: &sand_only,
        }
        .place(rng, &mut background);
        Scatter {
            arts: &[Art::Kelp],
            count: span(rng, 0, 3 * scale),
            rows: (top - 12, bottom - 10),
            cols: (2, w - 2),
            palette: &kelp_only,
        }
        .place(rng, &mut background);
        if hill {
            let center = span(rng, left, right);
            let spread = span(rng, w / 4, w / 3);
            let hill_cols = (center - spread, center + spread);
            let crest = span(rng, h / 3, tank.sand_row);
            let hill_rows = (crest, tank.sand_row);
            let mounds = ((hill_rows.1 - hill_rows.0) * spread) / 500;
            Scatter {
                arts: &DUNES,
                count: span(rng, 0, 3 * mounds),
                rows: hill_rows,
                cols: hill_cols,
                palette: &sand_only,
            }
            .place(rng, &mut background);
            Scatter {
                arts: &[Art::Kelp],
                count: span(rng, 0, 2 * scale),
                rows: (hill_rows.0 - 12, hill_rows.1 - 12),
                cols: hill_cols,
                palette: &kelp_only,
            }
            .place(rng, &mut background);
            Scatter {
                arts: &[Art::TreeCoral(0)],
                count: span(rng, 0, 3 * scale),
                rows: hill_rows,
                cols: hill_cols,
                palette: ALL_COLORS,
            }
            .place(rng, &mut background);
        }

        // midground
        let mut midground = Vec::new();
        Scatter {
            arts: &DUNES,
            count: span(rng, 0, scale),
            rows: (tank.sand_row - 3, h - 1),
            cols: (left, right),
            palette: &sand_only,
        }
        .place(rng, &mut midground);
        let mut tree_coral = Vec::new();
        Scatter {
            arts: &[Art::TreeCoral(0)],
            count: span(rng, 0, 8 * scale),
            rows: (top, bottom),
            cols: (left, right),
            palette: ALL_COLORS,
        }
        .place(rng, &mut tree_coral);
        Scatter {
            arts: &[Art::BrainCoral],
            count: span(rng, 0, 2 * scale),
            rows: (top, bottom),
            cols: (left, right),
            palette: ALL_COLORS,
        }
        .place(rng, &mut midground);
        let mut mid_kelp = Vec::new();
        Scatter {
            arts: &[Art::Kelp],
            count: span(rng, 0, 2 * scale),
            rows: (top - 12, bottom - 10),
            cols: (2, w - 2),
            palette: &kelp_only,
        }
        .place(rng, &mut mid_kelp);
        let cover: Vec<Scenery> = tree_coral.into_iter().chain(mid_kelp).collect();
        midground.extend(cover.iter().copied());

        // foreground
        let mut foreground_kelp = Vec::new();
        Scatter {
            arts: &[Art::LongKelp],
            count: span(rng, 0, 3 * scale),
            rows: (tank.water_row + 1, h * 2 / 3),
            cols: (2, w - 2),
            palette: &kelp_only,
        }
        .place(rng, &mut foreground_kelp);
        let mut foreground_dunes = Vec::new();
        Scatter {
            arts: &FRONT_DUNES,
            count: span(rng, 0, 2 * scale),
            rows: (h - 6, h - 2),
            cols: (left, right),
            palette: &sand_only,
        }
        .place(rng, &mut foreground_dunes);

        let mut scene = Self {
            window,
            water,
            sand,
            kelp,
            background,
            midground,
            cover,
            foreground_kelp,
            foreground_dunes,
        };
        scene.remove_peripherals(w);
        by_bottom(&mut scene.background);
        by_bottom(&mut scene.midground);
        by_bottom(&mut scene.foreground_dunes);
        scene
    }

    /// Drop pieces that would never be seen.
    pub fn remove_peripherals(&mut self, width: i32) {
        for layer in [
            &mut self.background,
            &mut self.midground,
            &mut self.cover,
            &mut self.foreground_kelp,
            &mut self.foreground_dunes,
        ] {
            layer.retain(|item| !item.off_screen(width));
        }
    }

    /// Every coral and kelp, as something a school can gather around.
    pub fn corals(&self) -> Vec<Target> {
        self.background
            .iter()
            .chain(&self.midground)
            .chain(&self.foreground_kelp)
            .filter(|item| !item.art.is_dune())
            .map(Target::of)
            .collect()
    }

    /// Water line and hatching, sand fill, then all three layers. Everything
    /// here ends up in the backdrop.
    pub fn paint_static<R: Rng + ?Sized>(&self, surface: &mut Surface, water: bool, sand: bool, rng: &mut R) {
        if water {
            paint_water(surface, self.water);
        }
        if sand {
            paint_sand(surface, self.sand, rng);
        }
        draw_all(surface, &self.background);
        self.draw_midground(surface);
        self.draw_foreground(surface);
    }

    pub fn draw_midground(&self, surface: &mut Surface) {
        draw_all(surface, &self.midground);
    }

    pub fn draw_cover(&self, surface: &mut Surface) {
        draw_all(surface, &self.cover);
    }

    /// Long kelp is split around the front dunes so some of it stands in
    /// front of them.
    pub fn draw_foreground(&self, surface: &mut Surface) {
        let scale = surface.tank().scale().max(0) as usize;
        let split = scale.min(self.foreground_kelp.len());
        let (behind, front) = self.foreground_kelp.split_at(split);
        draw_all(surface, behind);
        draw_all(surface, &self.foreground_dunes);
        draw_all(surface, front);
    }
}

fn draw_all(surface: &mut Surface, layer: &[Scenery]) {
    for item in layer {
        surface.draw(item);
    }
}

/// `~` along the water line, sparse `-` hatching above it.
pub fn paint_water(surface: &mut Surface, color: Color) {
    let tank = *surface.tank();
    for col in 1..tank.width - 1 {
        surface.put(tank.water_row, col, Cell::new('~', color));
    }
    let mut col = 1;
    for row in 1..tank.water_row {
        while col < tank.width - 1 {
            surface.put(row, col, Cell::new('-', color));
            col += 6;
        }
        col = 3 * (row % 2) + 1;
    }
}

/// `,` below the sand line, packed tighter the deeper it goes.
pub fn paint_sand<R: Rng + ?Sized>(surface: &mut Surface, color: Color, rng: &mut R) {
    let tank = *surface.tank();
    let line = tank.sand_row;
    let mut col = 1;
    for row in line + 1..tank.height - 1 {
        while col < tank.width - 2 {
            surface.put(row, col, Cell::new(',', color));
            col += (tank.height - line) / (row - line) + 1;
        }
        col = span(rng, 1, 3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn layers_are_sorted_by_bottom_row() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut tank = Tank::new(160, 48);
        tank.sand_row = 34;
        let scene = Scene::generate(&tank, true, &mut rng);
        for layer in [&scene.background, &scene.midground, &scene.foreground_dunes] {
            assert!(layer.windows(2).all(|w| w[0].bottom() <= w[1].bottom()));
        }
    }

    #[test]
    fn nothing_left_entirely_off_screen() {
        let mut rng = StdRng::seed_from_u64(5);
        let tank = Tank::new(120, 40);
        for _ in 0..10 {
            let scene = Scene::generate(&tank, true, &mut rng);
            for item in scene.background.iter().chain(&scene.midground).chain(&scene.foreground_dunes) {
                assert!(!item.off_screen(tank.width), "{item:?}");
            }
            assert_ne!(scene.kelp, scene.sand);
        }
    }

    #[test]
    fn corals_exclude_dunes() {
        let mut scene = Scene::bare();
        scene.background.push(Scenery {
            art: Art::BigDune,
            position: Position::new(20, 4),
            color: Color::Yellow,
        });
        scene.midground.push(Scenery {
            art: Art::BrainCoral,
            position: Position::new(22, 10),
            color: Color::Red,
        });
        let corals = scene.corals();
        assert_eq!(corals.len(), 1);
        assert_eq!(corals[0].anchor, Position::new(22, 10));
        assert_eq!(corals[0].extent, Size::new(3, 11));
    }

    #[test]
    fn dunes_paint_their_blanks() {
        let mut surface = Surface::new(Tank::new(30, 12), Color::Blue);
        for col in 1..29 {
            surface.put(5, col, Cell::new('x', Color::Red));
        }
        surface.draw(&Scenery {
            art: Art::SmallDune,
            position: Position::new(5, 2),
            color: Color::Yellow,
        });
        // "RRR.~""~.RRR": the R columns keep what was there, the rest is dune
        assert_eq!(surface.cell(5, 2).map(|c| c.ch), Some('x'));
        assert_eq!(surface.cell(5, 5).map(|c| c.ch), Some('.'));
    }

    #[test]
    fn water_and_sand_fill() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tank = Tank::new(40, 21);
        tank.water_row = 3;
        tank.sand_row = 15;
        let mut surface = Surface::new(tank, Color::Blue);
        paint_water(&mut surface, Color::Cyan);
        paint_sand(&mut surface, Color::Yellow, &mut rng);
        assert!(surface.row(3)[1..39].iter().all(|c| c.ch == '~'));
        assert_eq!(surface.cell(1, 1).map(|c| c.ch), Some('-'));
        assert_eq!(surface.cell(1, 7).map(|c| c.ch), Some('-'));
        assert_eq!(surface.cell(16, 1).map(|c| c.ch), Some(','));
        assert!(surface.row(10).iter().all(|c| c.ch != ','));
    }
}
