//! Species table: max speeds, habitats, palettes and the per-species look
//! that picks a glyph block from an agent's heading.

use crate::dice::span;
use crate::sprite::{self, Block, BUBBLES};
use crossterm::style::Color;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Species {
    SeaMonkey,
    Minnow,
    AngelFish,
    Tuna,
    Barracuda,
    Clock,
    Whale,
    BabyWhale,
    Jellyfish,
    Snail,
    SeaUrchin,
    Lobster,
    Bubble,
}

/// Which walls reflect an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Habitat {
    /// Bounded by the water line above and the tank floor below.
    Water,
    /// Bounded by the sand line above and the tank floor below.
    Sand,
    /// Never reflected; pops once it reaches the water line.
    Open,
}

pub(crate) const ALL_COLORS: &[Color] = &[
    Color::Red,
    Color::Green,
    Color::Blue,
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::White,
];
pub(crate) const WINDOW_COLORS: &[Color] = &[Color::Blue, Color::Cyan];
pub(crate) const WATER_COLORS: &[Color] = &[Color::Cyan];
pub(crate) const SAND_COLORS: &[Color] = &[
    Color::Yellow,
    Color::White,
    Color::Red,
    Color::Magenta,
    Color::Green,
];
const BUBBLE_COLORS: &[Color] = &[Color::Cyan];
const LOBSTER_COLORS: &[Color] = &[Color::Red, Color::Magenta];
const WHALE_COLORS: &[Color] = &[Color::Blue, Color::White, Color::Cyan];
const JELLYFISH_COLORS: &[Color] = &[Color::White, Color::Cyan];

impl Species {
    pub const fn max_speed(self) -> i32 {
        match self {
            Species::SeaMonkey
            | Species::Minnow
            | Species::Tuna
            | Species::Barracuda
            | Species::Clock => 2,
            _ => 1,
        }
    }

    pub const fn habitat(self) -> Habitat {
        match self {
            Species::Snail | Species::SeaUrchin | Species::Lobster => Habitat::Sand,
            Species::Bubble => Habitat::Open,
            _ => Habitat::Water,
        }
    }

    pub fn palette(self) -> &'static [Color] {
        match self {
            Species::Whale | Species::BabyWhale => WHALE_COLORS,
            Species::Jellyfish => JELLYFISH_COLORS,
            Species::Lobster => LOBSTER_COLORS,
            Species::Bubble => BUBBLE_COLORS,
            _ => ALL_COLORS,
        }
    }

    pub fn pick_color<R: Rng + ?Sized>(self, rng: &mut R) -> Color {
        self.palette().choose(rng).copied().unwrap_or(Color::White)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Species::SeaMonkey => "sea monkey",
            Species::Minnow => "minnow",
            Species::AngelFish => "angelfish",
            Species::Tuna => "tuna",
            Species::Barracuda => "barracuda",
            Species::Clock => "clock",
            Species::Whale => "whale",
            Species::BabyWhale => "baby whale",
            Species::Jellyfish => "jellyfish",
            Species::Snail => "snail",
            Species::SeaUrchin => "sea urchin",
            Species::Lobster => "lobster",
            Species::Bubble => "bubble",
        }
    }
}

/// Jellyfish bell cycle. `marks` are the beat counts at which the bell moves
/// to its next phase; the cycle length is the last mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bell {
    marks: [i32; 4],
    beat: i32,
}

impl Bell {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let b0 = span(rng, 6, 10);
        let b1 = b0 + span(rng, 1, 3);
        let b2 = b1 + span(rng, 1, 3);
        let b3 = b2 + span(rng, 1, 3);
        let beat = rng.gen_range(0..b3);
        Self {
            marks: [b0, b1, b2, b3],
            beat,
        }
    }

    pub fn with_marks(marks: [i32; 4], beat: i32) -> Self {
        let len = marks[3].max(1);
        Self {
            marks,
            beat: beat.rem_euclid(len),
        }
    }

    /// The stroke tick, the only one on which the jellyfish moves.
    pub fn on_stroke(&self) -> bool {
        self.beat == 0
    }

    pub fn phase(&self) -> usize {
        self.marks
            .iter()
            .position(|&mark| self.beat < mark)
            .unwrap_or(3)
    }

    pub fn advance(&mut self) {
        self.beat = (self.beat + 1) % self.marks[3].max(1);
    }
}

/// How an agent turns its heading into glyphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Look {
    Mirrored { left: Block, right: Block },
    /// Single glyph tilted by vertical heading.
    Pitched,
    /// Lobster; `twitch` indexes the claw pose.
    Claws { twitch: usize },
    Bell(Bell),
    /// Current local time, e.g. `3:07 pm`.
    Clock,
    Word(String),
}

impl Look {
    pub fn for_species<R: Rng + ?Sized>(species: Species, rng: &mut R, word: Option<&str>) -> Self {
        match species {
            Species::SeaMonkey => Look::Pitched,
            Species::Minnow => Look::Mirrored {
                left: sprite::MINNOW_LEFT,
                right: sprite::MINNOW_RIGHT,
            },
            Species::AngelFish => Look::Mirrored {
                left: sprite::ANGELFISH_LEFT,
                right: sprite::ANGELFISH_RIGHT,
            },
            Species::Tuna => Look::Mirrored {
                left: sprite::TUNA_LEFT,
                right: sprite::TUNA_RIGHT,
            },
            Species::Barracuda => Look::Mirrored {
                left: sprite::BARRACUDA_LEFT,
                right: sprite::BARRACUDA_RIGHT,
            },
            Species::Clock => Look::Clock,
            Species::Whale => Look::Mirrored {
                left: sprite::WHALE_LEFT,
                right: sprite::WHALE_RIGHT,
            },
            Species::BabyWhale => Look::Mirrored {
                left: sprite::BABY_WHALE_LEFT,
                right: sprite::BABY_WHALE_RIGHT,
            },
            Species::Jellyfish => Look::Bell(Bell::new(rng)),
            Species::Snail => Look::Mirrored {
                left: sprite::SNAIL,
                right: sprite::SNAIL,
            },
            Species::SeaUrchin => Look::Mirrored {
                left: sprite::SEA_URCHIN_LEFT,
                right: sprite::SEA_URCHIN_RIGHT,
            },
            Species::Lobster => Look::Claws { twitch: 0 },
            Species::Bubble => {
                let choices = BUBBLES.len() + usize::from(word.is_some());
                let pick = rng.gen_range(0..choices);
                match (BUBBLES.get(pick), word) {
                    (Some(&(left, right)), _) => Look::Mirrored { left, right },
                    (None, Some(word)) => Look::Word(word.to_string()),
                    (None, None) => Look::Mirrored {
                        left: BUBBLES[0].0,
                        right: BUBBLES[0].1,
                    },
                }
            }
        }
    }

    /// Reroll the lobster claw pose: mostly at rest, occasionally open or
    /// raised.
    pub fn twitch<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Look::Claws { twitch } = self {
            *twitch = if rng.gen_range(0..21) == 1 {
                1
            } else if rng.gen_range(0..21) == 2 {
                2
            } else {
                0
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn bell_phases_follow_marks() {
        let mut bell = Bell::with_marks([6, 8, 9, 12], 0);
        let phases: Vec<usize> = (0..12)
            .map(|_| {
                let p = bell.phase();
                bell.advance();
                p
            })
            .collect();
        assert_eq!(phases, vec![0, 0, 0, 0, 0, 0, 1, 1, 2, 3, 3, 3]);
        assert!(bell.on_stroke());
    }

    #[test]
    fn random_bells_stay_in_cycle() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut bell = Bell::new(&mut rng);
            for _ in 0..40 {
                assert!(bell.phase() < 4);
                bell.advance();
                assert!((0..bell.marks[3]).contains(&bell.beat));
            }
        }
    }

    #[test]
    fn bubble_words_only_when_offered() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let look = Look::for_species(Species::Bubble, &mut rng, None);
            assert!(matches!(look, Look::Mirrored { .. }));
        }
        let words = (0..200)
            .filter(|_| {
                matches!(
                    Look::for_species(Species::Bubble, &mut rng, Some("kelp")),
                    Look::Word(_)
                )
            })
            .count();
        assert!(words > 0);
    }

    #[test]
    fn crawlers_live_on_sand() {
        assert_eq!(Species::Lobster.habitat(), Habitat::Sand);
        assert_eq!(Species::Bubble.habitat(), Habitat::Open);
        assert_eq!(Species::Tuna.habitat(), Habitat::Water);
        assert_eq!(Species::Barracuda.max_speed(), 2);
        assert_eq!(Species::Whale.max_speed(), 1);
    }
}
