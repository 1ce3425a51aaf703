use aquarium::agent::{Calm, Walk};
use aquarium::config::Settings;
use aquarium::ecosystem::{Ecosystem, SchoolPlan};
use aquarium::geometry::{Position, Tank};
use aquarium::population::{PopulationController, Verdict};
use aquarium::school::Topology;
use aquarium::species::Species;
use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

const BUDGET: Duration = Duration::from_millis(80);

fn plan(species: Species, size: usize, row: i32, col: i32) -> SchoolPlan {
    SchoolPlan {
        species,
        topology: Topology::Line,
        size,
        center: Position::new(row, col),
        lead: Walk::Calm(Calm::DEFAULT),
        follow: Walk::Calm(Calm::DEFAULT),
        follow_distance: 2,
        color: Color::Yellow,
    }
}

/// Three sea monkey schools and one minnow school, 30 fish each.
fn crowded_tank(rng: &mut StdRng) -> Ecosystem {
    let mut eco = Ecosystem::empty(Tank::new(120, 40), &Settings::default());
    eco.add_school(plan(Species::SeaMonkey, 30, 10, 20), rng);
    eco.add_school(plan(Species::SeaMonkey, 30, 15, 50), rng);
    eco.add_school(plan(Species::SeaMonkey, 30, 20, 80), rng);
    eco.add_school(plan(Species::Minnow, 30, 25, 60), rng);
    eco
}

fn school_sizes(eco: &Ecosystem) -> Vec<usize> {
    eco.schools().iter().map(|s| s.len()).collect()
}

#[test]
fn bigger_overrun_sheds_more() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut heavy = crowded_tank(&mut rng);
    let mut mild = crowded_tank(&mut rng);

    let mut pc = PopulationController::new(BUDGET, 100);
    let v = pc.regulate(BUDGET * 130 / 100, &mut heavy, &mut rng);
    assert_eq!(v, Verdict::Shed(10));

    let mut pc = PopulationController::new(BUDGET, 100);
    let v = pc.regulate(BUDGET * 111 / 100, &mut mild, &mut rng);
    assert_eq!(v, Verdict::Shed(1));

    assert_eq!(heavy.population(), 110);
    assert_eq!(mild.population(), 119);
    assert!(heavy.population() < mild.population());
}

#[test]
fn calm_frames_leave_everyone_alone() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut eco = crowded_tank(&mut rng);
    let mut pc = PopulationController::new(BUDGET, 100);
    for _ in 0..30 {
        pc.regulate(BUDGET, &mut eco, &mut rng);
    }
    assert!(pc.is_settled());
    assert_eq!(eco.population(), 120);
}

#[test]
fn few_minnows_protect_the_minnow_school() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut eco = Ecosystem::empty(Tank::new(120, 40), &Settings::default());
    eco.add_school(plan(Species::SeaMonkey, 30, 10, 20), &mut rng);
    eco.add_school(plan(Species::SeaMonkey, 30, 15, 50), &mut rng);
    eco.add_school(plan(Species::Minnow, 8, 25, 60), &mut rng);

    let pc = PopulationController::new(BUDGET, 100);
    let removed = pc.cull(&mut eco, 10, &mut rng);

    assert_eq!(removed, 10);
    assert_eq!(eco.schools()[2].len(), 8);
    assert_eq!(eco.schools()[0].len() + eco.schools()[1].len(), 50);
}

#[test]
fn culling_stops_at_the_minimum_school_size() {
    // 7 sea monkeys to 6 minnows is under the ideal ratio, so only the
    // minnows are thinned, and only down to the minimum.
    let mut rng = StdRng::seed_from_u64(9);
    let mut eco = Ecosystem::empty(Tank::new(120, 40), &Settings::default());
    eco.add_school(plan(Species::SeaMonkey, 7, 10, 20), &mut rng);
    eco.add_school(plan(Species::Minnow, 6, 25, 60), &mut rng);

    let pc = PopulationController::new(BUDGET, 100);
    for _ in 0..20 {
        pc.cull(&mut eco, 10, &mut rng);
    }

    assert_eq!(school_sizes(&eco), vec![7, 5]);
    assert_eq!(eco.population(), 12);
}

#[test]
fn emptied_school_is_dropped() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut eco = Ecosystem::empty(Tank::new(120, 40), &Settings::default());
    eco.add_school(plan(Species::Minnow, 2, 25, 60), &mut rng);

    let pc = PopulationController::new(BUDGET, 100).with_min_school_size(0);
    let removed = pc.cull(&mut eco, 5, &mut rng);

    assert_eq!(removed, 2);
    assert!(eco.schools().is_empty());
    assert_eq!(eco.population(), 0);
}
