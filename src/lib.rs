//! An ASCII aquarium: scenery, wandering fish, flocking schools and a
//! controller that thins the population when frames run long.

pub mod agent;
pub mod app;
pub mod config;
pub(crate) mod dice;
pub mod ecosystem;
pub mod facing;
pub mod geometry;
pub mod population;
pub mod render;
pub mod scene;
pub mod school;
pub mod species;
pub mod sprite;
pub mod surface;
