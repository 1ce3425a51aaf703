//! Kinematic agents and their movement primitives.
//!
//! Every primitive clamps speed into `[0, max_speed]` on entry and leaves
//! the heading inside `{-1, 0, 1}` on both axes. Moving always goes
//! erase, advance, draw so the old footprint is wiped before the new one is
//! painted.

use crate::dice::{one_in, sign, span};
use crate::facing::{Facing, Separation, Target};
use crate::geometry::{Heading, Position, Size, Tank};
use crate::species::{Habitat, Look, Species};
use crate::sprite::{self, Sprite};
use crate::surface::{Drawable, Surface};
use crossterm::style::Color;
use rand::Rng;
use slotmap::new_key_type;
use std::borrow::Cow;

new_key_type! {
    /// Stable handle to an agent owned by the ecosystem.
    pub struct AgentId;
}

/// Tunables for the calmed walk; each is a `1/n` chance per tick and `0`
/// turns that behaviour off.
///
/// `resume` is rolled whenever the horizontal heading is zero, whether or
/// not `stop` put it there, so a jellyfish (`stop` 0) that lost its sideways
/// heading some other way still picks a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calm {
    /// Perturb the vertical heading.
    pub jitter: u32,
    /// Stop horizontal movement and hover.
    pub stop: u32,
    /// Pick a new horizontal heading while hovering.
    pub resume: u32,
    /// Turn around.
    pub reversal: u32,
}

impl Calm {
    pub const DEFAULT: Calm = Calm {
        jitter: 4,
        stop: 50,
        resume: 8,
        reversal: 500,
    };

    pub const JELLYFISH: Calm = Calm {
        jitter: 20,
        stop: 0,
        resume: 8,
        reversal: 0,
    };

    /// No perturbation at all: the agent keeps its heading.
    pub const STEADY: Calm = Calm {
        jitter: 0,
        stop: 0,
        resume: 0,
        reversal: 0,
    };
}

impl Default for Calm {
    fn default() -> Self {
        Calm::DEFAULT
    }
}

/// A wandering rule used by leaders, and after seeking by followers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walk {
    Random,
    Calm(Calm),
}

impl Walk {
    pub fn label(&self) -> &'static str {
        match self {
            Walk::Random => "random",
            Walk::Calm(_) => "calm",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub species: Species,
    pub position: Position,
    pub heading: Heading,
    pub speed: i32,
    pub max_speed: i32,
    pub color: Color,
    habitat: Habitat,
    look: Look,
    facing_left: bool,
    drawn: Size,
}

impl Agent {
    pub fn new(species: Species, position: Position, heading: Heading, color: Color, look: Look) -> Self {
        Self {
            species,
            position,
            heading,
            speed: 1,
            max_speed: species.max_speed(),
            color,
            habitat: species.habitat(),
            facing_left: heading.h < 0,
            look,
            drawn: Size::ZERO,
        }
    }

    /// A fresh agent heading left or right at random, in a colour from its
    /// species palette.
    pub fn spawn<R: Rng + ?Sized>(species: Species, position: Position, rng: &mut R) -> Self {
        let color = species.pick_color(rng);
        Self::spawn_colored(species, position, color, rng)
    }

    pub fn spawn_colored<R: Rng + ?Sized>(species: Species, position: Position, color: Color, rng: &mut R) -> Self {
        let look = Look::for_species(species, rng, None);
        Self::new(species, position, Heading::new(0, sign(rng)), color, look)
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_look(mut self, look: Look) -> Self {
        self.look = look;
        self
    }

    pub fn habitat(&self) -> Habitat {
        self.habitat
    }

    pub fn look(&self) -> &Look {
        &self.look
    }

    pub fn facing_left(&self) -> bool {
        self.facing_left
    }

    /// Footprint of the last paint; what the next erase restores.
    pub fn drawn(&self) -> Size {
        self.drawn
    }

    fn clamp_speed(&mut self) {
        self.speed = self.speed.clamp(0, self.max_speed.max(0));
    }

    fn orient(&mut self) {
        if self.heading.h < 0 {
            self.facing_left = true;
        } else if self.heading.h > 0 {
            self.facing_left = false;
        }
    }

    pub fn draw(&mut self, surface: &mut Surface) {
        self.orient();
        let size = {
            let sprite = self.sprite();
            surface.paint(self.position, &sprite, self.color, ' ');
            sprite.size()
        };
        self.drawn = size;
    }

    pub fn erase(&self, surface: &mut Surface) {
        surface.erase(self);
    }

    /// Turn around near the walls of the agent's habitat. Open-water debris
    /// is never reflected.
    pub fn reflect(&mut self, tank: &Tank) {
        let (margin, surface_row) = match self.habitat {
            Habitat::Water => (tank.water_margin, tank.water_row),
            Habitat::Sand => (tank.sand_margin, tank.sand_row),
            Habitat::Open => return,
        };
        let left = 1 - margin;
        let right = tank.width + margin;
        let top = surface_row + 1;
        let bottom = tank.height - 1;
        let size = self.extent();

        if self.position.col < self.speed + left {
            self.heading.h = 1;
        }
        if self.position.col > right - (self.heading.h * self.speed + size.cols + 1) {
            self.heading.h = -1;
        }
        if self.position.row < self.speed + top {
            self.heading.v = 1;
        }
        if self.position.row > bottom - (self.heading.v * self.speed + size.rows + 1) {
            self.heading.v = -1;
        }
    }

    /// Erase, advance by `heading * speed`, draw. Debris that has risen to
    /// the water line is erased again so it pops.
    pub fn step(&mut self, surface: &mut Surface) {
        self.erase(surface);
        self.position.row += self.heading.v * self.speed;
        self.position.col += self.heading.h * self.speed;
        self.draw(surface);
        if self.habitat == Habitat::Open && self.position.row <= surface.tank().water_row {
            self.erase(surface);
        }
    }

    /// One move in this species' own manner: jellyfish pulse their bell,
    /// everything else reflects off its walls then steps.
    pub fn advance<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R) {
        if matches!(self.look, Look::Bell(_)) {
            self.pulse(surface, rng);
        } else {
            self.reflect(surface.tank());
            self.step(surface);
        }
    }

    pub fn random_walk<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R) {
        self.clamp_speed();
        if one_in(rng, 6) {
            self.heading.v += span(rng, -1, 1);
            self.heading.h += span(rng, -2, 2);
            self.speed += span(rng, -1, 1);
        }
        if self.heading.v.abs() > 1 {
            self.heading.v = 0;
        }
        if self.heading.h.abs() > 1 {
            self.heading.h = self.heading.h.signum();
        }
        self.clamp_speed();
        self.advance(surface, rng);
    }

    pub fn calm_walk<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R, calm: Calm) {
        self.clamp_speed();
        if one_in(rng, calm.jitter) {
            self.heading.v += span(rng, -1, 1);
        }
        if self.heading.v.abs() > 1 {
            self.heading.v = 0;
        }
        if one_in(rng, calm.reversal) {
            self.heading.h = -self.heading.h;
        }
        if one_in(rng, calm.stop) {
            self.heading.h = 0;
        }
        if self.heading.h == 0 && one_in(rng, calm.resume) {
            self.heading.h = span(rng, -1, 1);
        }
        self.advance(surface, rng);
    }

    pub fn walk<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R, walk: Walk) {
        match walk {
            Walk::Random => self.random_walk(surface, rng),
            Walk::Calm(calm) => self.calm_walk(surface, rng, calm),
        }
    }

    /// Steer toward `target`'s tail when it is `distance` or further away,
    /// speeding up by one. Does not move.
    pub fn follow(&mut self, target: &Target, distance: i32) {
        self.clamp_speed();
        if target.is_faraway() {
            return;
        }
        let sep = Separation::between(self.position, target);
        if sep.tail_sq >= distance * distance {
            if sep.dy != 0 {
                self.heading.v = sep.dy.signum();
            }
            if sep.dx_tail != 0 {
                self.heading.h = sep.dx_tail.signum();
            }
            self.speed = (self.speed + 1).min(self.max_speed);
        }
    }

    /// Bolt away from `threat`'s mouth when it is within `distance`: turn
    /// away and move three times. Returns whether the agent fled.
    pub fn flee<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R, threat: &Target, distance: i32) -> bool {
        self.clamp_speed();
        if threat.is_faraway() {
            return false;
        }
        let sep = Separation::between(self.position, threat);
        if sep.front_sq > distance * distance {
            return false;
        }
        if sep.dy != 0 {
            self.heading.v = -sep.dy.signum();
        }
        if sep.dx_front != 0 {
            self.heading.h = -sep.dx_front.signum();
        }
        for _ in 0..3 {
            self.advance(surface, rng);
        }
        true
    }

    /// Seek, then wander with `walk`.
    pub fn follow_then<R: Rng + ?Sized>(
        &mut self,
        surface: &mut Surface,
        rng: &mut R,
        target: &Target,
        distance: i32,
        walk: Walk,
    ) {
        self.follow(target, distance);
        self.walk(surface, rng, walk);
    }

    pub fn random_follow<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R, target: &Target, distance: i32) {
        self.follow_then(surface, rng, target, distance, Walk::Random);
    }

    pub fn calm_follow<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R, target: &Target, distance: i32) {
        self.follow_then(surface, rng, target, distance, Walk::Calm(Calm::DEFAULT));
    }

    /// Debris wobble: nudge the horizontal heading, settle back to straight
    /// up when it overshoots, then move.
    pub fn drift<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R) {
        self.clamp_speed();
        self.heading.h += span(rng, -1, 1);
        if self.heading.h.abs() >= 2 {
            self.heading.h = 0;
        }
        self.advance(surface, rng);
    }

    /// Jellyfish stroke. Moves only on the first beat of the bell cycle,
    /// sometimes rising or sinking; on every other beat it repaints in
    /// place so the bell shape changes.
    fn pulse<R: Rng + ?Sized>(&mut self, surface: &mut Surface, rng: &mut R) {
        self.reflect(surface.tank());
        let stroke = matches!(&self.look, Look::Bell(bell) if bell.on_stroke());
        if stroke {
            if one_in(rng, 10) {
                let tank = surface.tank();
                self.heading.v = sign(rng);
                if self.position.row < tank.water_row + self.speed + 1 {
                    self.heading.v = 1;
                }
                if self.position.row > tank.height - 1 - (self.heading.v * self.speed + self.extent().rows + 1) {
                    self.heading.v = -1;
                }
            } else {
                self.heading.v = 0;
            }
            self.step(surface);
        } else {
            self.heading.v = 0;
            self.erase(surface);
            self.draw(surface);
        }
        if let Look::Bell(bell) = &mut self.look {
            bell.advance();
        }
    }

    /// Reroll a lobster's claw pose.
    pub fn twitch<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.look.twitch(rng);
    }

    pub fn target(&self) -> Target {
        Target::of(self)
    }
}

impl Facing for Agent {
    fn anchor(&self) -> Position {
        self.position
    }

    fn extent(&self) -> Size {
        if self.drawn.is_empty() {
            self.sprite().size()
        } else {
            self.drawn
        }
    }

    fn heading_x(&self) -> i32 {
        self.heading.h
    }
}

impl Drawable for Agent {
    fn sprite(&self) -> Sprite<'_> {
        let left = self.facing_left;
        match &self.look {
            Look::Mirrored { left: l, right: r } => Sprite::Block(if left { *l } else { *r }),
            Look::Pitched => Sprite::Block(match (left, self.heading.h, self.heading.v.signum()) {
                (true, _, -1) => sprite::SEA_MONKEY_RISE_LEFT,
                (true, _, 1) => sprite::SEA_MONKEY_DIVE_LEFT,
                (false, 0, 0) => sprite::SEA_MONKEY_LEVEL,
                (false, 0, _) => sprite::SEA_MONKEY_BOB,
                (false, _, -1) => sprite::SEA_MONKEY_RISE_RIGHT,
                (false, _, 1) => sprite::SEA_MONKEY_DIVE_RIGHT,
                _ => sprite::SEA_MONKEY_LEVEL,
            }),
            Look::Claws { twitch } => {
                let poses = if left {
                    &sprite::LOBSTER_LEFT
                } else {
                    &sprite::LOBSTER_RIGHT
                };
                Sprite::Block(poses[(*twitch).min(poses.len() - 1)])
            }
            Look::Bell(bell) => {
                let phases = if left {
                    &sprite::JELLYFISH_LEFT
                } else {
                    &sprite::JELLYFISH_RIGHT
                };
                Sprite::Block(phases[bell.phase().min(phases.len() - 1)])
            }
            Look::Clock => Sprite::Line(Cow::Owned(chrono::Local::now().format("%-I:%M %P").to_string())),
            Look::Word(word) => Sprite::Line(Cow::Borrowed(word.as_str())),
        }
    }

    fn color(&self) -> Color {
        self.color
    }

    fn footprint(&self) -> Size {
        self.drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Bell;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tank() -> Surface {
        Surface::new(Tank::new(80, 40), Color::Blue)
    }

    fn tuna(row: i32, col: i32, h: i32) -> Agent {
        Agent::new(
            Species::Tuna,
            Position::new(row, col),
            Heading::new(0, h),
            Color::Yellow,
            Look::for_species(Species::Tuna, &mut StdRng::seed_from_u64(0), None),
        )
    }

    fn in_bounds(agent: &Agent) -> bool {
        (0..=agent.max_speed).contains(&agent.speed) && agent.heading.is_unit()
    }

    #[test]
    fn step_leaves_no_residue() {
        let mut surface = tank();
        surface.freeze_backdrop();
        let mut fish = tuna(10, 20, 1);
        fish.draw(&mut surface);
        fish.step(&mut surface);
        assert_eq!(fish.position, Position::new(10, 21));
        assert_eq!(surface.cell(10, 20).map(|c| c.ch), Some(' '));
        assert_eq!(surface.cell(10, 21).map(|c| c.ch), Some(')'));
        assert_eq!(surface.cell(10, 23).map(|c| c.ch), Some('>'));

        fish.heading.h = -1;
        fish.step(&mut surface);
        assert_eq!(surface.cell(10, 23).map(|c| c.ch), Some(' '));
        assert_eq!(surface.cell(10, 20).map(|c| c.ch), Some('<'));
    }

    #[test]
    fn hovering_keeps_last_facing() {
        let mut surface = tank();
        let mut fish = tuna(10, 20, -1);
        fish.draw(&mut surface);
        fish.heading.h = 0;
        fish.step(&mut surface);
        assert!(fish.facing_left());
        assert_eq!(surface.cell(10, 20).map(|c| c.ch), Some('<'));
    }

    #[test]
    fn follow_aims_at_tail_and_accelerates() {
        let mut fish = tuna(10, 10, -1).with_speed(0);
        let leader = Target::new(Position::new(14, 30), Size::new(1, 3), 1);
        fish.follow(&leader, 2);
        assert_eq!(fish.heading, Heading::new(1, 1));
        assert_eq!(fish.speed, 1);
        assert_eq!(fish.position, Position::new(10, 10));
    }

    #[test]
    fn follow_within_distance_changes_nothing() {
        let mut fish = tuna(10, 10, -1);
        let leader = Target::new(Position::new(10, 11), Size::new(1, 3), 1);
        fish.follow(&leader, 2);
        assert_eq!(fish.heading, Heading::new(0, -1));
        assert_eq!(fish.speed, 1);
    }

    #[test]
    fn follow_and_flee_ignore_faraway() {
        let mut surface = tank();
        let mut rng = StdRng::seed_from_u64(1);
        let mut fish = tuna(10, 10, -1);
        fish.follow(&Target::FARAWAY, 2000);
        assert_eq!(fish.heading, Heading::new(0, -1));
        assert!(!fish.flee(&mut surface, &mut rng, &Target::FARAWAY, 5000));
        assert_eq!(fish.heading, Heading::new(0, -1));
        assert_eq!(fish.position, Position::new(10, 10));
    }

    #[test]
    fn flee_measures_to_the_mouth() {
        let mut surface = tank();
        let mut rng = StdRng::seed_from_u64(1);
        // facing left with mouth at col 12: tail is at col 19
        let shark = Target::new(Position::new(10, 12), Size::new(1, 7), -1);
        let mut fish = tuna(10, 10, 1);
        assert!(fish.flee(&mut surface, &mut rng, &shark, 3));
        assert_eq!(fish.heading.h, -1);
        assert_eq!(fish.position, Position::new(10, 7));

        // the same fish behind the shark's tail is not threatened
        let mut behind = tuna(10, 21, -1);
        assert!(!behind.flee(&mut surface, &mut rng, &shark, 3));
        assert_eq!(behind.position, Position::new(10, 21));
    }

    #[test]
    fn reflect_turns_back_from_walls() {
        let t = Tank::new(80, 40);
        let mut fish = tuna(20, -49, -1);
        fish.reflect(&t);
        assert_eq!(fish.heading.h, 1);

        let mut fish = tuna(1, 30, 1);
        fish.heading.v = -1;
        fish.reflect(&t);
        assert_eq!(fish.heading.v, 1);

        let mut fish = tuna(37, 30, 1);
        fish.heading.v = 1;
        fish.reflect(&t);
        assert_eq!(fish.heading.v, -1);

        let mut t = t;
        t.sand_row = 26;
        let mut snail = Agent::spawn(Species::Snail, Position::new(26, -4), &mut StdRng::seed_from_u64(2));
        snail.heading = Heading::new(-1, -1);
        snail.reflect(&t);
        assert_eq!(snail.heading, Heading::new(1, 1));
    }

    #[test]
    fn steady_calm_walk_keeps_heading() {
        let mut surface = tank();
        let mut rng = StdRng::seed_from_u64(9);
        let mut fish = tuna(10, 20, 1);
        for _ in 0..5 {
            fish.calm_walk(&mut surface, &mut rng, Calm::STEADY);
        }
        assert_eq!(fish.heading, Heading::new(0, 1));
        assert_eq!(fish.position, Position::new(10, 25));
    }

    #[test]
    fn hovering_resumes_even_without_stops() {
        let mut surface = tank();
        let mut rng = StdRng::seed_from_u64(4);
        let mut fish = tuna(10, 40, 0);
        let calm = Calm {
            jitter: 0,
            stop: 0,
            resume: 1,
            reversal: 0,
        };
        for _ in 0..30 {
            fish.calm_walk(&mut surface, &mut rng, calm);
        }
        assert_ne!(fish.heading.h, 0);
    }

    #[test]
    fn bubbles_pop_at_the_water_line() {
        let mut t = Tank::new(40, 20);
        t.water_row = 3;
        let mut surface = Surface::new(t, Color::Blue);
        surface.freeze_backdrop();
        let mut rng = StdRng::seed_from_u64(4);
        let mut bubble = Agent::spawn(Species::Bubble, Position::new(4, 10), &mut rng).with_look(Look::Word("hi".into()));
        bubble.heading = Heading::new(-1, 0);
        bubble.draw(&mut surface);
        bubble.step(&mut surface);
        assert_eq!(bubble.position.row, 3);
        assert_eq!(surface.cell(3, 10).map(|c| c.ch), Some(' '));
        assert_eq!(surface.cell(4, 10).map(|c| c.ch), Some(' '));
    }

    #[test]
    fn jellyfish_only_moves_on_the_stroke() {
        let mut surface = tank();
        let mut rng = StdRng::seed_from_u64(5);
        let mut jelly = Agent::new(
            Species::Jellyfish,
            Position::new(15, 30),
            Heading::new(0, 1),
            Color::White,
            Look::Bell(Bell::with_marks([2, 3, 4, 5], 1)),
        );
        jelly.advance(&mut surface, &mut rng);
        assert_eq!(jelly.position, Position::new(15, 30));
        for _ in 0..3 {
            jelly.advance(&mut surface, &mut rng);
        }
        assert_eq!(jelly.position, Position::new(15, 30));
        jelly.advance(&mut surface, &mut rng);
        assert_eq!(jelly.position.col, 31);
    }

    proptest! {
        #[test]
        fn primitives_keep_heading_and_speed_bounded(
            seed in any::<u64>(),
            speed in -5i32..8,
            v in -1i32..=1,
            h in -1i32..=1,
            row in 2i32..36,
            col in -40i32..110,
            ops in proptest::collection::vec(0u8..6, 1..30),
        ) {
            let mut surface = tank();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut fish = Agent::new(
                Species::Minnow,
                Position::new(row, col),
                Heading::new(v, h),
                Color::Red,
                Look::for_species(Species::Minnow, &mut rng, None),
            )
            .with_speed(speed);
            let other = Target::new(Position::new(20, 40), Size::new(1, 3), 1);
            for op in ops {
                match op {
                    0 => fish.random_walk(&mut surface, &mut rng),
                    1 => fish.calm_walk(&mut surface, &mut rng, Calm::DEFAULT),
                    2 => fish.follow(&other, 3),
                    3 => {
                        fish.flee(&mut surface, &mut rng, &other, 6);
                    }
                    4 => fish.random_follow(&mut surface, &mut rng, &other, 2),
                    _ => fish.calm_follow(&mut surface, &mut rng, &other, 2),
                }
                prop_assert!(in_bounds(&fish), "speed {} heading {:?}", fish.speed, fish.heading);
            }
        }
    }
}
