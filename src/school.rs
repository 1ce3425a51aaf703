//! Schools: a group of agents plus a following order saying who each
//! member chases.

use crate::agent::{Agent, AgentId, Walk};
use crate::facing::{find_nearest, Edge, Separation, Target};
use crate::species::Species;
use crate::surface::Surface;
use crossterm::style::Color;
use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

/// How a school decides who follows whom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// Everyone follows the first member.
    Monarch,
    /// Each branch leader is followed by two members.
    Tree,
    /// Everyone follows the member ahead of them.
    Line,
    /// A line whose head follows its tail.
    Circle,
    /// Everyone follows their nearest school-mate, recomputed every tick.
    Neighbor,
    /// Neighbor, but members that get too close back off.
    ShyNeighbor,
}

impl Topology {
    pub const ALL: [Topology; 6] = [
        Topology::Monarch,
        Topology::Tree,
        Topology::Line,
        Topology::Circle,
        Topology::Neighbor,
        Topology::ShyNeighbor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Topology::Monarch => "monarch",
            Topology::Tree => "tree",
            Topology::Line => "line",
            Topology::Circle => "circle",
            Topology::Neighbor => "neighbor",
            Topology::ShyNeighbor => "shy",
        }
    }

    /// Whether members follow a fixed order rather than their neighbours.
    pub fn is_static(self) -> bool {
        !matches!(self, Topology::Neighbor | Topology::ShyNeighbor)
    }
}

/// One entry of the following order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Leader,
    Follow(AgentId),
}

/// Build the following order for `members` under `topology`. Dynamic
/// topologies have no order.
pub fn following_order(topology: Topology, members: &[AgentId]) -> Vec<Slot> {
    let n = members.len();
    if n == 0 || !topology.is_static() {
        return Vec::new();
    }
    let mut order = Vec::with_capacity(n);
    match topology {
        Topology::Monarch => {
            order.push(Slot::Leader);
            order.extend(members[1..].iter().map(|_| Slot::Follow(members[0])));
        }
        Topology::Tree => {
            order.push(Slot::Leader);
            for &branch in &members[..n / 2] {
                order.push(Slot::Follow(branch));
                order.push(Slot::Follow(branch));
            }
            order.truncate(n);
        }
        Topology::Line => {
            order.push(Slot::Leader);
            order.extend(members[..n - 1].iter().map(|&id| Slot::Follow(id)));
        }
        Topology::Circle => {
            if n == 1 {
                order.push(Slot::Leader);
            } else {
                order.push(Slot::Follow(members[n - 1]));
                order.extend(members[..n - 1].iter().map(|&id| Slot::Follow(id)));
            }
        }
        Topology::Neighbor | Topology::ShyNeighbor => {}
    }
    order
}

#[derive(Clone, Debug)]
pub struct School {
    pub topology: Topology,
    pub species: Species,
    pub color: Color,
    pub lead: Walk,
    pub follow: Walk,
    pub follow_distance: i32,
    /// Coral the school is currently gathering around.
    pub rally: Option<Target>,
    members: Vec<AgentId>,
    order: Vec<Slot>,
}

impl School {
    pub fn new(
        topology: Topology,
        species: Species,
        color: Color,
        members: Vec<AgentId>,
        lead: Walk,
        follow: Walk,
        follow_distance: i32,
    ) -> Self {
        let order = following_order(topology, &members);
        Self {
            topology,
            species,
            color,
            lead,
            follow,
            follow_distance,
            rally: None,
            members,
            order,
        }
    }

    pub fn members(&self) -> &[AgentId] {
        &self.members
    }

    pub fn order(&self) -> &[Slot] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.members.contains(&id)
    }

    /// Drop `id` and rebuild the order. Returns whether it was a member.
    pub fn remove_member(&mut self, id: AgentId) -> bool {
        let before = self.members.len();
        self.members.retain(|&m| m != id);
        let removed = self.members.len() != before;
        if removed {
            self.order = following_order(self.topology, &self.members);
        }
        removed
    }

    /// Drop the last member and rebuild the order.
    pub fn pop_member(&mut self) -> Option<AgentId> {
        let id = self.members.pop()?;
        self.order = following_order(self.topology, &self.members);
        Some(id)
    }

    /// Live snapshots of every member, for neighbour queries.
    fn roster(&self, agents: &SlotMap<AgentId, Agent>) -> Vec<(AgentId, Target)> {
        self.members
            .iter()
            .filter_map(|&id| agents.get(id).map(|a| (id, a.target())))
            .collect()
    }

    fn nearest_mate(&self, agents: &SlotMap<AgentId, Agent>, id: AgentId) -> Target {
        let Some(me) = agents.get(id) else {
            return Target::FARAWAY;
        };
        let roster = self.roster(agents);
        find_nearest(me.position, Some(id), roster.iter().map(|(k, t)| (*k, t)), Edge::Tail)
    }

    /// Run one tick of the school's movement.
    pub fn automate<R: Rng + ?Sized>(&self, agents: &mut SlotMap<AgentId, Agent>, surface: &mut Surface, rng: &mut R) {
        match self.topology {
            Topology::Neighbor => self.follow_neighbors(agents, surface, rng),
            Topology::ShyNeighbor => {
                self.follow_neighbors(agents, surface, rng);
                self.keep_distance(agents, surface, rng);
            }
            _ => {
                for (&id, slot) in self.members.iter().zip(&self.order) {
                    let leader = match slot {
                        Slot::Leader => None,
                        Slot::Follow(leader) => agents.get(*leader).map(Agent::target),
                    };
                    let Some(agent) = agents.get_mut(id) else {
                        continue;
                    };
                    match leader {
                        Some(target) => agent.follow_then(surface, rng, &target, self.follow_distance, self.follow),
                        None => agent.walk(surface, rng, self.lead),
                    }
                }
            }
        }
    }

    fn follow_neighbors<R: Rng + ?Sized>(&self, agents: &mut SlotMap<AgentId, Agent>, surface: &mut Surface, rng: &mut R) {
        for &id in &self.members {
            let nearest = self.nearest_mate(agents, id);
            if let Some(agent) = agents.get_mut(id) {
                agent.follow_then(surface, rng, &nearest, self.follow_distance, self.follow);
            }
        }
    }

    fn keep_distance<R: Rng + ?Sized>(&self, agents: &mut SlotMap<AgentId, Agent>, surface: &mut Surface, rng: &mut R) {
        let d = self.follow_distance;
        for &id in &self.members {
            let nearest = self.nearest_mate(agents, id);
            if nearest.is_faraway() {
                continue;
            }
            if let Some(agent) = agents.get_mut(id) {
                if Separation::between(agent.position, &nearest).tail_sq <= d * d {
                    agent.flee(surface, rng, &nearest, d - 1);
                }
            }
        }
    }

    /// Every member seeks `target`, then wanders with the school's follow
    /// walk.
    pub fn everyone_follow<R: Rng + ?Sized>(
        &self,
        agents: &mut SlotMap<AgentId, Agent>,
        surface: &mut Surface,
        rng: &mut R,
        target: &Target,
        distance: i32,
    ) {
        for &id in &self.members {
            if let Some(agent) = agents.get_mut(id) {
                agent.follow_then(surface, rng, target, distance, self.follow);
            }
        }
    }

    /// Every member flees the nearest of `threats`.
    pub fn everyone_flee<R: Rng + ?Sized>(
        &self,
        agents: &mut SlotMap<AgentId, Agent>,
        surface: &mut Surface,
        rng: &mut R,
        threats: &[Target],
        distance: i32,
    ) {
        for &id in &self.members {
            if let Some(agent) = agents.get_mut(id) {
                let threat = find_nearest(agent.position, None, threats.iter().enumerate(), Edge::Tail);
                agent.flee(surface, rng, &threat, distance);
            }
        }
    }

    /// Every member steers toward the nearest of `prey` without moving.
    pub fn everyone_hunt(&self, agents: &mut SlotMap<AgentId, Agent>, prey: &[Target], distance: i32) {
        for &id in &self.members {
            if let Some(agent) = agents.get_mut(id) {
                let target = find_nearest(agent.position, None, prey.iter().enumerate(), Edge::Tail);
                agent.follow(&target, distance);
            }
        }
    }
}
