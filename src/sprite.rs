//! Glyph blocks: the `Sprite` view type plus the ASCII art tables for every
//! species and every piece of scenery.

use crate::geometry::Size;
use std::borrow::Cow;

/// A rectangular block of glyphs. Width is taken from the first row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sprite<'a> {
    Block(&'static [&'static str]),
    Line(Cow<'a, str>),
    Empty,
}

impl<'a> Sprite<'a> {
    pub fn size(&self) -> Size {
        match self {
            Sprite::Block(rows) => match rows.first() {
                Some(first) => Size::new(rows.len() as i32, first.chars().count() as i32),
                None => Size::ZERO,
            },
            Sprite::Line(text) if !text.is_empty() => Size::new(1, text.chars().count() as i32),
            _ => Size::ZERO,
        }
    }

    pub fn rows(&self) -> Vec<&str> {
        match self {
            Sprite::Block(rows) => rows.to_vec(),
            Sprite::Line(text) => vec![text.as_ref()],
            Sprite::Empty => Vec::new(),
        }
    }
}

pub(crate) type Block = &'static [&'static str];

/* -----------------------------
   Swimmers
------------------------------ */

pub(crate) const MINNOW_LEFT: Block = &["<"];
pub(crate) const MINNOW_RIGHT: Block = &[">"];

pub(crate) const ANGELFISH_LEFT: Block = &["<("];
pub(crate) const ANGELFISH_RIGHT: Block = &[")>"];

pub(crate) const TUNA_LEFT: Block = &["<=("];
pub(crate) const TUNA_RIGHT: Block = &[")=>"];

pub(crate) const BARRACUDA_LEFT: Block = &["<==^=-<"];
pub(crate) const BARRACUDA_RIGHT: Block = &[">-=^==>"];

pub(crate) const WHALE_LEFT: Block = &[
    r" _--.-^---_____/",
    r"(__`______===== ",
    r"    V          \",
];
pub(crate) const WHALE_RIGHT: Block = &[
    r"\_____---^-.--_ ",
    r" =====______`__)",
    r"/          V    ",
];

pub(crate) const BABY_WHALE_LEFT: Block = &[r" ________/", r"(__`u_===\"];
pub(crate) const BABY_WHALE_RIGHT: Block = &[r"\________ ", r"/===_u`__)"];

/// Sea monkeys are a single glyph that tilts with their pitch.
pub(crate) const SEA_MONKEY_LEVEL: Block = &["-"];
pub(crate) const SEA_MONKEY_RISE_LEFT: Block = &["`"];
pub(crate) const SEA_MONKEY_DIVE_LEFT: Block = &[","];
pub(crate) const SEA_MONKEY_RISE_RIGHT: Block = &[","];
pub(crate) const SEA_MONKEY_DIVE_RIGHT: Block = &["`"];
pub(crate) const SEA_MONKEY_BOB: Block = &["'"];

/// Bell phases, contracted to relaxed.
pub(crate) const JELLYFISH_LEFT: [Block; 4] = [&["(="], &["{="], &["[="], &["|="]];
pub(crate) const JELLYFISH_RIGHT: [Block; 4] = [&["=)"], &["=}"], &["=]"], &["=|"]];

/* -----------------------------
   Bottom feeders
------------------------------ */

pub(crate) const SNAIL: Block = &["@"];

pub(crate) const SEA_URCHIN_LEFT: Block = &["  .w.  ", r"_\ | /_", "> ,*, <"];
pub(crate) const SEA_URCHIN_RIGHT: Block = &["  .v.  ", r"_\ | /_", "> ,*, <"];

pub(crate) const LOBSTER_LEFT: [Block; 3] = [
    &[r"\|.  ", ">M=={", "     "],
    &[r"\./  ", ">M=={", "     "],
    &["_|.  ", ">M=={", "     "],
];
pub(crate) const LOBSTER_RIGHT: [Block; 3] = [
    &["  .|/", "}==M<", "     "],
    &[r"  \./", "}==M<", "     "],
    &["  .|_", "}==M<", "     "],
];

/* -----------------------------
   Debris
------------------------------ */

pub(crate) const BUBBLES: [(Block, Block); 3] = [
    (&["o O", " : "], &["o .", ".° "]),
    (&["o. ", "   ", " .°"], &[" o.", ".  ", "  ."]),
    (&["° :", " . "], &[" °:", ".  "]),
];

/* -----------------------------
   Scenery
------------------------------ */

/// Glyph treated as see-through inside dune art.
pub(crate) const DUNE_CLEAR: char = 'R';

pub(crate) const SMALL_DUNE: Block = &[
    r#"RRR.~""~.RRR"#,
    r#"RR/; . . \RR"#,
    r#"~`; . . . `~"#,
];
pub(crate) const BIG_DUNE: Block = &[
    r#"RRRRRRR,.~"""""~. ,RRRRRR"#,
    r#"RRRR/; . . . . . . .\RRRR"#,
    r#"RR/;. . . . . . . . . \RR"#,
    r#"~`; . . . . . . . . . .`~"#,
];
pub(crate) const HUGE_DUNE: Block = &[
    r#"RRRRRR,.~"""""""~. ,RRRRRR"#,
    r#"RRRR/; . . . . . . .\RRRRR"#,
    r#"RR/;. . . . . . . . . \RRR"#,
    r#"R/;. . . . . . . . . . \RR"#,
    r#"/;. . . . . . . . . . . \R"#,
    r#"~` . . . . . . . . . . `~R"#,
];
pub(crate) const SLOPED_DUNE: Block = &[
    r#"RRRRRRRR,.~"""""""~.,RRRRRRRRRRRRRRRRRRRRRRRRR"#,
    r#"RRRRRR/; . . . . . . .\RRRRRRRRRRRRRRRRRRRRRRR"#,
    r#"RRRR/;. . . . . . . . . \RRRRRRRRRRRRRRRRRRRRR"#,
    r#"RRR/;. . . . . . . . . . . \RRRRRRRRRRRRRRRRRR"#,
    r#"RR/;. . . . . . . . . . . . ,-----____RRRRRRRR"#,
    r#"R/;. . . . . . . . . . . ,;/;. . . . . .\RRRRR"#,
    r#"/;. . . . . . . . . . .,/;. . . . . . . . \RRR"#,
    r#"~` . . . . . . . . . .,;;. . . . . . . . . .`~"#,
];
pub(crate) const SLANTED_DUNE: Block = &[
    r#"RRRRRRRRRRRRRR,.~"""""""~.,RRRRRRRRRRRRRRRRRR"#,
    r#"RRRRRRRRRRR/;. . . . . . . \RRRRRRRRRRRRRRRRR"#,
    r#"RRRRRRRR/;. . . . . . . . . \RRRRRRRRRRRRRRRR"#,
    r#"RRRRRR/; . . . . . . . . . . \RRRRRRRRRRRRRRR"#,
    r#"RRRR/;. . . . . . . . . . . ,-----.___RRRRRRR"#,
    r#"RR/; . . . . . . . . . . ,;/; . . . . . \RRRR"#,
    r#"/;. . . . . . . . . . .,/;. . . . . . . .\RRR"#,
    r#"~` . . . . . . . . . .,; . . . . . . . . . `~"#,
];

pub(crate) const TREE_CORAL: [Block; 2] = [
    &[r"-_   \/", r" \/ -/-", r"  \ /  ", "   |-  "],
    &[r"_|/ |/ ", r"  \|/  ", "   |   "],
];

pub(crate) const BRAIN_CORAL: Block = &["    ,#&.   ", " *#*@*@@&*.", "*@@*&*@**%&"];

pub(crate) const KELP: Block = &[
    " V ", " | ", " |/", " | ", r"\| ", " | ", " |/", " | ", r"\|/", " |/", " | ", r"\| ",
    " | ",
];

pub(crate) const LONG_KELP: Block = &[
    " V ", " | ", r"\| ", " | ", r"\|/", " | ", r"\|/", " |/", r"\| ", " | ", " |/", " | ",
    r"\|/", r"\| ", " | ", " |/", " | ", r"\|/", " | ", " | ", " | ", " | ", " |/", " | ",
    r"\|/", r"\| ", " |/", " | ", r"\| ", " | ", " |/", " | ", r"\| ", " | ", " |/", " | ",
    r"\|/", " | ", r"\|/", " |/", r"\|/", " | ", " | ", r"\|/", " |/", " | ", r"\| ", " | ",
    " | ", " |/", " | ", r"\|/", r"\| ", " |/", " | ", r"\| ", " | ", " |/", " | ", r"\| ",
    " | ", " |/", " | ", r"\|/", " | ", r"\|/", " |/", r"\|/", r"\|/", " |/", " | ", r"\| ",
    " | ", " | ", " |/", " | ", r"\|/", r"\| ", " |/", " | ", r"\| ", " | ", " |/", " | ",
    r"\| ", " | ", " |/", " | ",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangular(block: Block) -> bool {
        let width = block[0].chars().count();
        block.iter().all(|row| row.chars().count() == width)
    }

    #[test]
    fn art_blocks_are_rectangular() {
        let blocks: Vec<Block> = vec![
            WHALE_LEFT,
            WHALE_RIGHT,
            BABY_WHALE_LEFT,
            BABY_WHALE_RIGHT,
            SEA_URCHIN_LEFT,
            SEA_URCHIN_RIGHT,
            SMALL_DUNE,
            BIG_DUNE,
            HUGE_DUNE,
            SLOPED_DUNE,
            SLANTED_DUNE,
            BRAIN_CORAL,
            KELP,
            LONG_KELP,
        ];
        for block in blocks.into_iter().chain(TREE_CORAL).chain(LOBSTER_LEFT).chain(LOBSTER_RIGHT) {
            assert!(rectangular(block), "ragged block starting {:?}", block[0]);
        }
    }

    #[test]
    fn size_counts_chars_not_bytes() {
        let (_, right) = BUBBLES[0];
        assert_eq!(Sprite::Block(right).size(), Size::new(2, 3));
        assert_eq!(Sprite::Line(Cow::Borrowed("")).size(), Size::ZERO);
        assert_eq!(Sprite::Empty.size(), Size::ZERO);
    }
}
