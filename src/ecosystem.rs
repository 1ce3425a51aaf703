//! The whole tank: scenery, every agent, every school, and the per-tick
//! behaviour that ties them together.

use crate::agent::{Agent, AgentId, Calm, Walk};
use crate::config::Settings;
use crate::dice::{one_in, sign, span};
use crate::facing::{find_nearest, Edge, Facing, Target};
use crate::geometry::{Heading, Position, Tank};
use crate::scene::Scene;
use crate::school::{School, Topology};
use crate::species::{Look, Species, ALL_COLORS};
use crate::surface::Surface;
use crossterm::style::Color;
use rand::seq::SliceRandom;
use rand::Rng;
use slotmap::SlotMap;
use tracing::{debug, info};

/// Which roster an agent belongs to; decides how it behaves each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Independent fish: wander, flee predators and whales.
    Fish,
    /// Barracuda (and the clock fish): cruise, flee whales, hunt fish.
    Predator,
    Whale,
    /// Baby whale that trails the first whale.
    Calf,
    Jellyfish,
    BottomFeeder,
    Bubble,
}

/// A recipe for one school.
#[derive(Clone, Copy, Debug)]
pub struct SchoolPlan {
    pub species: Species,
    pub topology: Topology,
    pub size: usize,
    pub center: Position,
    pub lead: Walk,
    pub follow: Walk,
    pub follow_distance: i32,
    pub color: Color,
}

/// A sideways ocean current that builds up, then fades.
#[derive(Clone, Copy, Debug, Default)]
struct Current {
    /// Ticks left; the sign is the direction.
    count: i32,
    strength: i32,
}

/// Options the tick loop consults.
#[derive(Clone, Debug)]
struct Features {
    bubbles: bool,
    ocean_drift: bool,
    explorer_school: bool,
    bubble_frequency: u32,
}

impl From<&Settings> for Features {
    fn from(s: &Settings) -> Self {
        Self {
            bubbles: s.bubbles,
            ocean_drift: s.ocean_drift,
            explorer_school: s.explorer_school,
            bubble_frequency: s.bubble_frequency.max(1),
        }
    }
}

const GROUPING_WRAP: u32 = 10_000;
const EXPLORE_PERIOD: u32 = 1133;
const EXPLORE_SPAN: u32 = 777;

pub struct Ecosystem {
    surface: Surface,
    scene: Scene,
    agents: SlotMap<AgentId, Agent>,
    fishies: Vec<AgentId>,
    predators: Vec<AgentId>,
    whales: Vec<AgentId>,
    calf: Option<AgentId>,
    jellyfish: Vec<AgentId>,
    bottom_feeders: Vec<AgentId>,
    bubbles: Vec<AgentId>,
    /// Everything that swims, school members included.
    swimmers: Vec<AgentId>,
    schools: Vec<School>,
    corals: Vec<Target>,
    words: Vec<String>,
    features: Features,
    max_fish: usize,
    coral_search_time: u32,
    coral_clock: u32,
    bubble_clock: u32,
    current: Current,
}

impl Ecosystem {
    /// An empty tank with its border and a blank backdrop.
    pub fn empty(tank: Tank, settings: &Settings) -> Self {
        let scene = Scene::bare();
        let mut surface = Surface::new(tank, scene.window);
        surface.freeze_backdrop();
        Self {
            surface,
            scene,
            agents: SlotMap::with_key(),
            fishies: Vec::new(),
            predators: Vec::new(),
            whales: Vec::new(),
            calf: None,
            jellyfish: Vec::new(),
            bottom_feeders: Vec::new(),
            bubbles: Vec::new(),
            swimmers: Vec::new(),
            schools: Vec::new(),
            corals: Vec::new(),
            words: Vec::new(),
            features: Features::from(settings),
            max_fish: (tank.volume() / 200).max(0) as usize,
            coral_search_time: ((tank.width + tank.height) / 2).max(0) as u32,
            coral_clock: 0,
            bubble_clock: 1,
            current: Current::default(),
        }
    }

    /// Lay out scenery, freeze it as the backdrop, then populate the tank.
    pub fn generate<R: Rng + ?Sized>(width: i32, height: i32, settings: &Settings, words: Vec<String>, rng: &mut R) -> Self {
        let mut tank = Tank::new(width, height);
        tank.water_margin = settings.water_margin;
        tank.sand_margin = settings.sand_margin;
        if settings.water {
            tank.water_row = height / 7;
        }
        tank.sand_row = span(rng, height * 2 / 3, height * 6 / 7);

        let scene = Scene::generate(&tank, settings.hill, rng);
        let mut eco = Self::empty(tank, settings);
        eco.surface = Surface::new(tank, scene.window);
        scene.paint_static(&mut eco.surface, settings.water, settings.sand, rng);
        eco.surface.freeze_backdrop();
        eco.corals = scene.corals();
        eco.scene = scene;
        if settings.word_bubbles {
            eco.words = words;
        }

        eco.populate(settings, rng);
        eco.generate_schools(settings, rng);
        info!(
            width,
            height,
            water_row = tank.water_row,
            sand_row = tank.sand_row,
            max_fish = eco.max_fish,
            swimmers = eco.swimmers.len(),
            schools = eco.schools.len(),
            bottom_feeders = eco.bottom_feeders.len(),
            "tank generated"
        );
        eco
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn tank(&self) -> &Tank {
        self.surface.tank()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn agents(&self) -> &SlotMap<AgentId, Agent> {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    pub fn swimmers(&self) -> &[AgentId] {
        &self.swimmers
    }

    pub fn bubbles(&self) -> &[AgentId] {
        &self.bubbles
    }

    pub fn whales(&self) -> &[AgentId] {
        &self.whales
    }

    pub fn calf(&self) -> Option<AgentId> {
        self.calf
    }

    /// Number of swimmers; the quantity load shedding works on.
    pub fn population(&self) -> usize {
        self.swimmers.len()
    }

    pub fn max_fish(&self) -> usize {
        self.max_fish
    }

    /// Take ownership of `agent` and file it under `role`.
    pub fn add_agent(&mut self, agent: Agent, role: Role) -> AgentId {
        let id = self.agents.insert(agent);
        match role {
            Role::Fish => self.fishies.push(id),
            Role::Predator => self.predators.push(id),
            Role::Whale => self.whales.push(id),
            Role::Calf => self.calf = Some(id),
            Role::Jellyfish => self.jellyfish.push(id),
            Role::BottomFeeder => self.bottom_feeders.push(id),
            Role::Bubble => self.bubbles.push(id),
        }
        if !matches!(role, Role::BottomFeeder | Role::Bubble) {
            self.swimmers.push(id);
        }
        id
    }

    /// Spawn and draw the members of a new school around its centre.
    /// Returns the school's index.
    pub fn add_school<R: Rng + ?Sized>(&mut self, plan: SchoolPlan, rng: &mut R) -> usize {
        let mut members = Vec::with_capacity(plan.size);
        for i in 0..plan.size as i32 {
            let flip = if i % 2 == 0 { 1 } else { -1 };
            let at = Position::new(plan.center.row + (i % 2) * flip, plan.center.col + (i % 3) * flip);
            let mut agent = Agent::spawn_colored(plan.species, at, plan.color, rng);
            agent.draw(&mut self.surface);
            let id = self.agents.insert(agent);
            self.swimmers.push(id);
            members.push(id);
        }
        debug!(
            species = plan.species.label(),
            topology = plan.topology.label(),
            size = plan.size,
            lead = plan.lead.label(),
            follow = plan.follow.label(),
            "school spawned"
        );
        self.schools.push(School::new(
            plan.topology,
            plan.species,
            plan.color,
            members,
            plan.lead,
            plan.follow,
            plan.follow_distance,
        ));
        self.schools.len() - 1
    }

    /// Remove an agent from the tank: wipe it off the surface, out of every
    /// roster and out of its school. Schools left empty are dropped.
    pub fn remove_agent(&mut self, id: AgentId) -> bool {
        let Some(agent) = self.agents.remove(id) else {
            return false;
        };
        agent.erase(&mut self.surface);
        for roster in [
            &mut self.fishies,
            &mut self.predators,
            &mut self.whales,
            &mut self.jellyfish,
            &mut self.bottom_feeders,
            &mut self.bubbles,
            &mut self.swimmers,
        ] {
            roster.retain(|&other| other != id);
        }
        if self.calf == Some(id) {
            self.calf = None;
        }
        for school in &mut self.schools {
            school.remove_member(id);
        }
        let before = self.schools.len();
        self.schools.retain(|school| !school.is_empty());
        if self.schools.len() != before {
            debug!(remaining = self.schools.len(), "empty school dropped");
        }
        true
    }

    /// Detach the last member of school `index` without removing it from
    /// the tank.
    pub fn pop_school_member(&mut self, index: usize) -> Option<AgentId> {
        self.schools.get_mut(index)?.pop_member()
    }

    fn targets(&self, ids: &[AgentId]) -> Vec<Target> {
        ids.iter().filter_map(|&id| self.agents.get(id)).map(Agent::target).collect()
    }

    fn place<R: Rng + ?Sized>(&self, species: Species, rows: (i32, i32), cols: (i32, i32), rng: &mut R) -> Agent {
        let mut agent = Agent::spawn(species, Position::default(), rng);
        let width = agent.extent().cols;
        agent.position = Position::new(span(rng, rows.0, rows.1), span(rng, cols.0, cols.1 - width));
        agent
    }

    fn spawn_many<R: Rng + ?Sized>(
        &mut self,
        species: Species,
        count: i32,
        rows: (i32, i32),
        cols: (i32, i32),
        role: Role,
        rng: &mut R,
    ) -> Vec<AgentId> {
        (0..count.max(0))
            .map(|_| {
                let agent = self.place(species, rows, cols, rng);
                self.add_agent(agent, role)
            })
            .collect()
    }

    fn populate<R: Rng + ?Sized>(&mut self, settings: &Settings, rng: &mut R) {
        let tank = *self.surface.tank();
        let (w, h, volume, scale) = (tank.width, tank.height, tank.volume(), tank.scale());
        let rows = (tank.water_row + 1, h - 1);
        let cols = (1, w - 1);
        let floor = (tank.sand_row + 1, h - 1);
        let wide = (-7, w + 7);

        for (species, lo, hi) in [
            (Species::Tuna, 2, 4),
            (Species::AngelFish, 2, 4),
            (Species::Minnow, 0, 4),
            (Species::SeaMonkey, 0, 4),
        ] {
            let n = span(rng, lo, hi);
            self.spawn_many(species, n, rows, cols, Role::Fish, rng);
        }

        if w > 30 && volume > 800 {
            let n = span(rng, 0, 1);
            self.spawn_many(Species::Barracuda, n, rows, cols, Role::Predator, rng);
        }
        if settings.clock_fish {
            self.spawn_many(Species::Clock, 1, rows, cols, Role::Predator, rng);
        }

        if w > 45 {
            let whales = if volume > 1500 { span(rng, 0, 1) } else { 0 };
            let babies = if volume > 1000 { span(rng, 0, 1) } else { 0 };
            self.spawn_many(Species::Whale, whales, rows, cols, Role::Whale, rng);
            for i in 0..babies {
                let mut baby = self.place(Species::BabyWhale, rows, cols, rng);
                let mother = self.whales.first().and_then(|&id| self.agents.get(id)).map(|m| m.color);
                match mother {
                    Some(color) if i == 0 => {
                        baby.color = color;
                        self.add_agent(baby, Role::Calf);
                    }
                    _ => {
                        self.add_agent(baby, Role::Whale);
                    }
                }
            }
        }

        let jelly_rows = (rows.0, (rows.1 - rows.0) / 2);
        let n = span(rng, 4, 10);
        self.spawn_many(Species::Jellyfish, n, jelly_rows, wide, Role::Jellyfish, rng);

        for (species, hi) in [
            (Species::Snail, 3 * scale),
            (Species::SeaUrchin, 2 * scale),
            (Species::Lobster, 2 * scale),
        ] {
            let n = span(rng, 1, hi);
            self.spawn_many(species, n, floor, wide, Role::BottomFeeder, rng);
        }
        for &id in &self.bottom_feeders {
            if let Some(crawler) = self.agents.get_mut(id) {
                crawler.speed = 1;
                crawler.heading = Heading::new(0, sign(rng));
            }
        }
    }

    fn generate_schools<R: Rng + ?Sized>(&mut self, settings: &Settings, rng: &mut R) {
        if settings.topologies.is_empty() {
            return;
        }
        let tank = *self.surface.tank();
        let (w, h) = (tank.width, tank.height);
        let centers = [
            Position::new(h / 3, w / 7),
            Position::new(h / 3, w * 5 / 7),
            Position::new(h / 2, w / 7),
            Position::new(h / 2, w * 5 / 7),
            Position::new(h * 2 / 3, w / 7),
            Position::new(h * 2 / 3, w * 5 / 7),
        ];
        let max_fish = self.max_fish as i32;

        let sea_monkey_schools = span(rng, 2, 5);
        let minnow_schools = span(rng, 1, (sea_monkey_schools / 2).max(1));

        let avg = max_fish / sea_monkey_schools;
        let sea_monkey_sizes = (avg / 4 + 1, avg * 2 + 1);
        let avg = max_fish / 20;
        let minnow_sizes = (avg / 2 + 1, avg * 3 / 2 + 1);

        for (species, count, sizes) in [
            (Species::SeaMonkey, sea_monkey_schools, sea_monkey_sizes),
            (Species::Minnow, minnow_schools, minnow_sizes),
        ] {
            for _ in 0..count {
                let walk = |rng: &mut R| {
                    if rng.gen_bool(0.5) {
                        Walk::Calm(Calm::DEFAULT)
                    } else {
                        Walk::Random
                    }
                };
                let plan = SchoolPlan {
                    species,
                    topology: *settings.topologies.choose(rng).unwrap_or(&Topology::Line),
                    size: span(rng, sizes.0, sizes.1).max(0) as usize,
                    center: *centers.choose(rng).unwrap_or(&centers[0]),
                    lead: walk(rng),
                    follow: walk(rng),
                    follow_distance: 2,
                    color: *ALL_COLORS.choose(rng).unwrap_or(&Color::Red),
                };
                self.add_school(plan, rng);
            }
        }
    }

    /// Index of the school that wanders off on its own, if enabled.
    fn explorer(&self) -> Option<usize> {
        if !self.features.explorer_school {
            return None;
        }
        self.schools.iter().position(|s| s.species == Species::SeaMonkey)
    }

    /// One frame of life in the tank.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.features.ocean_drift {
            self.ocean_drift(rng);
        }
        self.scene.draw_midground(&mut self.surface);
        self.move_bottom_feeders(rng);
        self.scene.draw_cover(&mut self.surface);
        self.move_swimmers(rng);
        self.periodic_grouping(rng);
        self.school_behaviours(rng);
        for &id in &self.swimmers {
            if let Some(agent) = self.agents.get_mut(id) {
                agent.draw(&mut self.surface);
            }
        }
        if self.features.bubbles {
            self.move_bubbles(rng);
        }
        self.scene.draw_foreground(&mut self.surface);
    }

    fn move_bottom_feeders<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for &id in &self.bottom_feeders {
            let Some(crawler) = self.agents.get_mut(id) else {
                continue;
            };
            crawler.twitch(rng);
            if one_in(rng, 50) {
                crawler.random_walk(&mut self.surface, rng);
            } else {
                crawler.draw(&mut self.surface);
            }
        }
    }

    fn move_swimmers<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let predators = self.targets(&self.predators);
        let whales = self.targets(&self.whales);
        for &id in &self.fishies {
            let Some(fish) = self.agents.get_mut(id) else {
                continue;
            };
            fish.random_walk(&mut self.surface, rng);
            for threat in &predators {
                fish.flee(&mut self.surface, rng, threat, 3);
            }
            for threat in &whales {
                fish.flee(&mut self.surface, rng, threat, 6);
            }
        }

        for &id in &self.predators {
            let Some(hunter) = self.agents.get_mut(id) else {
                continue;
            };
            hunter.calm_walk(&mut self.surface, rng, Calm::DEFAULT);
            let whale = find_nearest(hunter.position, None, whales.iter().enumerate(), Edge::Tail);
            hunter.flee(&mut self.surface, rng, &whale, 4);
        }

        for &id in &self.whales {
            if let Some(whale) = self.agents.get_mut(id) {
                whale.calm_walk(&mut self.surface, rng, Calm::DEFAULT);
            }
        }

        for &id in &self.jellyfish {
            if let Some(jelly) = self.agents.get_mut(id) {
                jelly.calm_walk(&mut self.surface, rng, Calm::JELLYFISH);
            }
        }

        if let Some(calf) = self.calf {
            let mother = self.whales.first().and_then(|&id| self.agents.get(id)).map(Agent::target);
            if let (Some(mother), Some(baby)) = (mother, self.agents.get_mut(calf)) {
                baby.random_follow(&mut self.surface, rng, &mother, 7);
            }
        }

        let explorer = self.explorer();
        for (i, school) in self.schools.iter().enumerate() {
            if Some(i) != explorer {
                school.automate(&mut self.agents, &mut self.surface, rng);
            }
        }
    }

    /// Schools take turns gathering around a coral; predators take turns
    /// hunting the nearest fish.
    fn periodic_grouping<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let clock = self.coral_clock;
        for (i, school) in self.schools.iter_mut().enumerate() {
            let period = i as u32 * 100 + 500;
            let stay = i as u32 * 10 + 50;
            let phase = clock % period;
            if phase == 0 {
                school.rally = self.corals.choose(rng).copied();
            }
            if phase >= self.coral_search_time {
                continue;
            }
            let Some(rally) = school.rally else {
                continue;
            };
            if phase >= stay {
                school.everyone_follow(&mut self.agents, &mut self.surface, rng, &rally, 4);
                continue;
            }
            for &id in school.members() {
                let Some(fish) = self.agents.get_mut(id) else {
                    continue;
                };
                if one_in(rng, 2) {
                    fish.random_follow(&mut self.surface, rng, &rally, 4);
                }
            }
        }

        let fishies = self.targets(&self.fishies);
        for (i, &id) in self.predators.iter().enumerate() {
            let period = i as u32 * 200 + 500;
            let stay = i as u32 * 20 + 50;
            if clock % period >= stay {
                continue;
            }
            if let Some(hunter) = self.agents.get_mut(id) {
                let prey = find_nearest(hunter.position, None, fishies.iter().enumerate(), Edge::Tail);
                hunter.follow(&prey, 2);
            }
        }

        if self.coral_clock >= GROUPING_WRAP {
            self.coral_clock = 0;
        }
        self.coral_clock += 1;
    }

    /// Whole-school reactions: flee big things, sea monkeys flee minnows,
    /// minnows hunt sea monkeys, and the explorer does its own thing.
    fn school_behaviours<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut threats = self.targets(&self.whales);
        threats.extend(self.targets(&self.predators));
        for school in &self.schools {
            school.everyone_flee(&mut self.agents, &mut self.surface, rng, &threats, 4);
        }

        let (sea_monkeys, minnows): (Vec<usize>, Vec<usize>) = {
            let by = |species: Species| {
                self.schools
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.species == species)
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>()
            };
            (by(Species::SeaMonkey), by(Species::Minnow))
        };

        for &sm in &sea_monkeys {
            for &m in &minnows {
                let hunters = self.targets(self.schools[m].members());
                self.schools[sm].everyone_flee(&mut self.agents, &mut self.surface, rng, &hunters, 3);
            }
        }

        let prey: Vec<Target> = sea_monkeys
            .iter()
            .flat_map(|&sm| self.targets(self.schools[sm].members()))
            .collect();
        for &m in &minnows {
            self.schools[m].everyone_hunt(&mut self.agents, &prey, 2);
        }

        if let Some(index) = self.explorer() {
            let school = &self.schools[index];
            if self.coral_clock % EXPLORE_PERIOD < EXPLORE_SPAN {
                for &id in school.members() {
                    if let Some(fish) = self.agents.get_mut(id) {
                        let walk = *[Walk::Random, Walk::Calm(Calm::DEFAULT)].choose(rng).unwrap_or(&Walk::Random);
                        fish.walk(&mut self.surface, rng, walk);
                    }
                }
            } else {
                school.automate(&mut self.agents, &mut self.surface, rng);
            }
        }
    }

    fn move_bubbles<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let tank = *self.surface.tank();
        let freq = self.features.bubble_frequency;
        if self.bubble_clock % rng.gen_range(1..=freq) == 2 {
            let at = Position::new(tank.height - 5, span(rng, 1, tank.width - 3));
            let word = if self.words.is_empty() {
                None
            } else {
                self.words.choose(rng).map(String::as_str)
            };
            let look = Look::for_species(Species::Bubble, rng, word);
            let color = Species::Bubble.pick_color(rng);
            let bubble = Agent::new(Species::Bubble, at, Heading::new(-1, 0), color, look);
            self.add_agent(bubble, Role::Bubble);
        }
        self.bubble_clock = self.bubble_clock.wrapping_add(1);

        let mut gone = Vec::new();
        for &id in &self.bubbles {
            if let Some(bubble) = self.agents.get_mut(id) {
                bubble.drift(&mut self.surface, rng);
                if bubble.position.row <= tank.water_row - 5 {
                    gone.push(id);
                }
            }
        }
        for id in gone {
            self.remove_agent(id);
        }
    }

    /// Push swimmers and bubbles sideways, harder near the surface. They are
    /// erased here and repainted by their next move.
    fn ocean_drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let current = &mut self.current;
        if current.count == 0 {
            if one_in(rng, 50) {
                current.count = 2 * span(rng, 0, 10) * sign(rng);
                current.strength = 0;
            }
            return;
        }
        let drift = (current.strength * current.count).div_euclid(30);
        current.count -= current.count.signum();
        current.strength += 1;

        let tank = *self.surface.tank();
        let water_depth = tank.height - tank.water_row;
        for &id in self.swimmers.iter().chain(&self.bubbles) {
            let Some(agent) = self.agents.get_mut(id) else {
                continue;
            };
            agent.erase(&mut self.surface);
            let depth = agent.position.row;
            if depth <= 0 {
                continue;
            }
            let bands = water_depth.div_euclid(depth).div_euclid(3);
            agent.position.col += drift * bands;
        }
    }
}
