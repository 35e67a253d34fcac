// Library exports for the snake bot
// The server binary and the offline planning tool both use the core from here

pub mod bot;
pub mod config;
pub mod error;
pub mod geometry;
pub mod obstacles;
pub mod orchestrator;
pub mod pathfinding;
pub mod scoring;
pub mod simple_profiler;
pub mod targets;
pub mod types;
