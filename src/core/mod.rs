// src/core/mod.rs — Simulation turn engine

pub mod turn;

pub use turn::{apply_side_effect, SideEffect, TurnOutcome, TurnRunner, WORLD_UPDATED_NOTICE};
