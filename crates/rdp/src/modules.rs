//! Interfaces to external collaborators.

pub mod backend;
pub mod display;
