// sentinel/src/commands/mod.rs

pub mod inspect;
pub mod render;
pub mod rules;
pub mod run;
