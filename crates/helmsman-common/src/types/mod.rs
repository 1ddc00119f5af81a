//! Core data types for the Helmsman decision layer

pub mod action;
pub mod decision;
pub mod environment;
pub mod state;
