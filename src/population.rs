//! Load shedding: watch how long each frame takes and cull schooling fish
//! until frames fit the budget again.

use crate::ecosystem::Ecosystem;
use crate::species::Species;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};

/// What happens once the controller has settled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Rearm {
    /// Stop evaluating for good.
    #[default]
    Never,
    /// Start over when a frame takes more than this multiple of the budget.
    Above(f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Over budget: remove this many agents.
    Shed(usize),
    /// Within budget.
    Calm,
    /// Enough calm frames; no longer evaluating.
    Settled,
}

#[derive(Clone, Debug)]
pub struct PopulationController {
    budget: Duration,
    max_population: usize,
    settle_frames: i32,
    rearm: Rearm,
    ideal_ratio: usize,
    min_school_size: usize,
    /// Calm frames minus overrun frames.
    clock: i32,
}

impl PopulationController {
    pub fn new(budget: Duration, max_population: usize) -> Self {
        Self {
            budget,
            max_population,
            settle_frames: 20,
            rearm: Rearm::Never,
            ideal_ratio: 5,
            min_school_size: 5,
            clock: 0,
        }
    }

    pub fn with_settle_frames(mut self, frames: i32) -> Self {
        self.settle_frames = frames;
        self
    }

    pub fn with_rearm(mut self, rearm: Rearm) -> Self {
        self.rearm = rearm;
        self
    }

    /// Sea monkeys per minnow the cull steers toward.
    pub fn with_ideal_ratio(mut self, ratio: usize) -> Self {
        self.ideal_ratio = ratio;
        self
    }

    pub fn with_min_school_size(mut self, size: usize) -> Self {
        self.min_school_size = size;
        self
    }

    pub fn clock(&self) -> i32 {
        self.clock
    }

    pub fn is_settled(&self) -> bool {
        self.clock >= self.settle_frames
    }

    /// Judge one frame's render time.
    pub fn assess(&mut self, elapsed: Duration) -> Verdict {
        let ratio = elapsed.as_secs_f64() / self.budget.as_secs_f64().max(1e-9);
        if self.is_settled() {
            match self.rearm {
                Rearm::Above(limit) if ratio > f64::from(limit) => {
                    debug!(ratio, "population control re-armed");
                    self.clock = 0;
                }
                _ => return Verdict::Settled,
            }
        }
        let batch = if ratio > 1.25 {
            self.max_population / 10
        } else if ratio > 1.125 {
            self.max_population / 20
        } else if ratio > 1.1 {
            1
        } else {
            self.clock += 1;
            return Verdict::Calm;
        };
        self.clock -= 1;
        Verdict::Shed(batch.max(1))
    }

    /// Assess the frame and cull whatever it calls for. Returns the verdict.
    pub fn regulate<R: Rng + ?Sized>(&mut self, elapsed: Duration, eco: &mut Ecosystem, rng: &mut R) -> Verdict {
        let verdict = self.assess(elapsed);
        if let Verdict::Shed(count) = verdict {
            let removed = self.cull(eco, count, rng);
            info!(
                frame_ms = elapsed.as_millis() as u64,
                requested = count,
                removed,
                population = eco.population(),
                "frame over budget, shedding fish"
            );
        }
        verdict
    }

    /// Remove up to `count` schooling fish, keeping sea monkeys and minnows
    /// near the ideal ratio. Schools never shrink to `min_school_size` or
    /// below by culling; a school left empty is dropped. Returns how many
    /// agents were removed.
    pub fn cull<R: Rng + ?Sized>(&self, eco: &mut Ecosystem, count: usize, rng: &mut R) -> usize {
        let mut removed = 0;
        for _ in 0..count.max(1) {
            if eco.schools().is_empty() || eco.population() == 0 {
                break;
            }
            let Some(victim) = self.pick_school(eco, rng) else {
                break;
            };
            if eco.schools()[victim].len() > self.min_school_size {
                // removing the agent also drops the school if that emptied it
                if let Some(id) = eco.pop_school_member(victim) {
                    eco.remove_agent(id);
                    removed += 1;
                }
            }
        }
        removed
    }

    fn pick_school<R: Rng + ?Sized>(&self, eco: &Ecosystem, rng: &mut R) -> Option<usize> {
        let schools = eco.schools();
        let of = |species: Species| -> Vec<usize> {
            schools
                .iter()
                .enumerate()
                .filter(|(_, s)| s.species == species)
                .map(|(i, _)| i)
                .collect()
        };
        let sea_monkeys = of(Species::SeaMonkey);
        let minnows = of(Species::Minnow);
        let everyone: Vec<usize> = (0..schools.len()).collect();

        let total = |group: &[usize]| -> usize { group.iter().map(|&i| schools[i].len()).sum() };
        let minnow_total = total(&minnows);
        let ratio = match minnow_total {
            0 => self.ideal_ratio + 1,
            n => total(&sea_monkeys) / n,
        };
        let group = match ratio.cmp(&self.ideal_ratio) {
            std::cmp::Ordering::Greater => &sea_monkeys,
            std::cmp::Ordering::Less => &minnows,
            std::cmp::Ordering::Equal => &everyone,
        };
        let group = if group.is_empty() { &everyone } else { group };

        let mut pick = None;
        for _ in 0..10 {
            pick = group.choose(rng).copied();
            if pick.is_some_and(|i| !schools[i].is_empty()) {
                break;
            }
        }
        pick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET: Duration = Duration::from_millis(80);

    fn frame(pct: u64) -> Duration {
        BUDGET * pct as u32 / 100
    }

    #[test]
    fn heavier_overruns_shed_more() {
        let mut pc = PopulationController::new(BUDGET, 100);
        let heavy = pc.assess(frame(130));
        let mild = pc.assess(frame(111));
        let medium = pc.assess(frame(120));
        assert_eq!(heavy, Verdict::Shed(10));
        assert_eq!(medium, Verdict::Shed(5));
        assert_eq!(mild, Verdict::Shed(1));
        assert_eq!(pc.clock(), -3);
    }

    #[test]
    fn empty_batches_become_one() {
        let mut pc = PopulationController::new(BUDGET, 9);
        assert_eq!(pc.assess(frame(200)), Verdict::Shed(1));
        assert_eq!(pc.assess(frame(115)), Verdict::Shed(1));
    }

    #[test]
    fn settles_after_enough_calm_frames() {
        let mut pc = PopulationController::new(BUDGET, 100).with_settle_frames(3);
        assert_eq!(pc.assess(frame(130)), Verdict::Shed(10));
        for _ in 0..4 {
            assert_eq!(pc.assess(frame(90)), Verdict::Calm);
        }
        assert!(pc.is_settled());
        assert_eq!(pc.assess(frame(300)), Verdict::Settled);
    }

    #[test]
    fn rearm_starts_over_on_a_bad_frame() {
        let mut pc = PopulationController::new(BUDGET, 100)
            .with_settle_frames(1)
            .with_rearm(Rearm::Above(1.4));
        assert_eq!(pc.assess(frame(50)), Verdict::Calm);
        assert_eq!(pc.assess(frame(130)), Verdict::Settled);
        assert_eq!(pc.assess(frame(150)), Verdict::Shed(10));
        assert_eq!(pc.clock(), -1);
    }
}
