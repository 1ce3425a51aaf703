//! Edge-aware distances between things in the tank, and the nearest-neighbour
//! query the flocking rules are built on.

use crate::geometry::{Position, Size};

/// Anything that can be chased or fled from. The default heading is
/// "facing right, stationary", which is what static scenery reports.
pub trait Facing {
    fn anchor(&self) -> Position;
    fn extent(&self) -> Size;

    fn heading_x(&self) -> i32 {
        0
    }

    /// Column of the tail: the anchor when facing right, the far edge when
    /// facing left.
    fn trailing_col(&self) -> i32 {
        let anchor = self.anchor();
        if self.heading_x() < 0 {
            anchor.col + self.extent().cols
        } else {
            anchor.col
        }
    }

    /// Column of the mouth.
    fn leading_col(&self) -> i32 {
        let anchor = self.anchor();
        if self.heading_x() < 0 {
            anchor.col
        } else {
            anchor.col + self.extent().cols
        }
    }
}

/// A frozen copy of something's position, size and heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub anchor: Position,
    pub extent: Size,
    pub heading_x: i32,
    faraway: bool,
}

impl Target {
    /// Stand-in for "nothing to chase". Following or fleeing it does nothing.
    pub const FARAWAY: Target = Target {
        anchor: Position::new(-1000, -1000),
        extent: Size::ZERO,
        heading_x: 0,
        faraway: true,
    };

    pub fn new(anchor: Position, extent: Size, heading_x: i32) -> Self {
        Self {
            anchor,
            extent,
            heading_x,
            faraway: false,
        }
    }

    pub fn of<F: Facing + ?Sized>(thing: &F) -> Self {
        Self::new(thing.anchor(), thing.extent(), thing.heading_x())
    }

    pub fn is_faraway(&self) -> bool {
        self.faraway
    }
}

impl Facing for Target {
    fn anchor(&self) -> Position {
        self.anchor
    }

    fn extent(&self) -> Size {
        self.extent
    }

    fn heading_x(&self) -> i32 {
        self.heading_x
    }
}

/// Offsets from an observer to a target's two edges. Rows count half, so
/// `dy` is floor-halved before squaring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Separation {
    pub dy: i32,
    pub dx_tail: i32,
    pub dx_front: i32,
    pub tail_sq: i32,
    pub front_sq: i32,
}

impl Separation {
    pub fn between<F: Facing + ?Sized>(from: Position, target: &F) -> Self {
        let dy = target.anchor().row - from.row;
        let dx_tail = target.trailing_col() - from.col;
        let dx_front = target.leading_col() - from.col;
        let half = dy.div_euclid(2);
        Self {
            dy,
            dx_tail,
            dx_front,
            tail_sq: dx_tail * dx_tail + half * half,
            front_sq: dx_front * dx_front + half * half,
        }
    }

    pub fn squared(&self, edge: Edge) -> i32 {
        match edge {
            Edge::Tail => self.tail_sq,
            Edge::Front => self.front_sq,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Edge {
    #[default]
    Tail,
    Front,
}

/// Squared distance beyond which nothing is considered near.
pub const SEARCH_HORIZON: i32 = 500;

/// Closest candidate to `from` measured to `edge`. The candidate keyed
/// `skip` is ignored, but others sharing `from`'s cell are found; ties keep
/// the first candidate seen. Returns [`Target::FARAWAY`] when nothing is within
/// [`SEARCH_HORIZON`].
pub fn find_nearest<'a, K, T, I>(from: Position, skip: Option<K>, candidates: I, edge: Edge) -> Target
where
    K: PartialEq,
    T: Facing + 'a,
    I: IntoIterator<Item = (K, &'a T)>,
{
    let mut best = SEARCH_HORIZON;
    let mut nearest = Target::FARAWAY;
    for (key, candidate) in candidates {
        if skip.as_ref() == Some(&key) {
            continue;
        }
        let dist = Separation::between(from, candidate).squared(edge);
        if dist < best {
            best = dist;
            nearest = Target::of(candidate);
        }
    }
    nearest
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rock(Position, Size);

    impl Facing for Rock {
        fn anchor(&self) -> Position {
            self.0
        }
        fn extent(&self) -> Size {
            self.1
        }
    }

    #[test]
    fn edges_swap_with_heading() {
        let right = Target::new(Position::new(5, 10), Size::new(1, 4), 1);
        let left = Target::new(Position::new(5, 10), Size::new(1, 4), -1);
        assert_eq!((right.trailing_col(), right.leading_col()), (10, 14));
        assert_eq!((left.trailing_col(), left.leading_col()), (14, 10));
    }

    #[test]
    fn scenery_faces_right() {
        let rock = Rock(Position::new(3, 3), Size::new(2, 6));
        assert_eq!(rock.trailing_col(), 3);
        assert_eq!(rock.leading_col(), 9);
    }

    #[test]
    fn rows_count_half() {
        let target = Target::new(Position::new(7, 4), Size::new(1, 2), 1);
        let sep = Separation::between(Position::new(2, 1), &target);
        assert_eq!(sep.dy, 5);
        assert_eq!(sep.dx_tail, 3);
        assert_eq!(sep.dx_front, 5);
        assert_eq!(sep.tail_sq, 9 + 4);
        assert_eq!(sep.front_sq, 25 + 4);

        let above = Separation::between(Position::new(7, 4), &Target::new(Position::new(4, 4), Size::new(1, 1), 1));
        assert_eq!(above.dy, -3);
        assert_eq!(above.tail_sq, 4);
    }

    #[test]
    fn nearest_of_nothing_is_faraway() {
        let none: Vec<(usize, &Target)> = Vec::new();
        assert!(find_nearest(Position::new(1, 1), None, none, Edge::Tail).is_faraway());
    }

    #[test]
    fn nearest_skips_self_and_distant() {
        let me = Target::new(Position::new(10, 10), Size::new(1, 1), 1);
        let far = Target::new(Position::new(10, 60), Size::new(1, 1), 1);
        let pool = [(0usize, &me), (1, &far)];
        let found = find_nearest(me.anchor, Some(0), pool, Edge::Tail);
        assert!(found.is_faraway());
    }

    #[test]
    fn nearest_keeps_first_of_ties() {
        // tails at columns 13, 8 and 12: squared distances 9, 4 and 4
        let a = Target::new(Position::new(10, 13), Size::new(1, 1), 1);
        let b = Target::new(Position::new(10, 7), Size::new(1, 1), -1);
        let c = Target::new(Position::new(10, 12), Size::new(1, 1), 1);
        let found = find_nearest(Position::new(10, 10), None, [(0, &a), (1, &b), (2, &c)], Edge::Tail);
        assert_eq!(found.anchor, b.anchor);

        let found = find_nearest(Position::new(10, 10), None, [(2, &c), (1, &b), (0, &a)], Edge::Tail);
        assert_eq!(found.anchor, c.anchor);
    }

    #[test]
    fn mate_on_the_same_cell_is_found() {
        let me = Target::new(Position::new(10, 10), Size::new(1, 1), 1);
        let mate = Target::new(Position::new(10, 10), Size::new(1, 1), 1);
        let pool = [(0usize, &me), (1, &mate)];
        let found = find_nearest(me.anchor, Some(0), pool, Edge::Tail);
        assert!(!found.is_faraway());
        assert_eq!(found.anchor, mate.anchor);
    }
}
