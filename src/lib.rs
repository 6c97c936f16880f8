//! Family-universe reasoning benchmark.
//!
//! A small Datalog engine (`datalog`, `parser`, `engine`) holds a randomly
//! generated family universe (`generator`) under a static rule catalog
//! (`rules`). Question templates (`questions`) are instantiated against it,
//! answered by resolution, graded (`difficulty`) and written out (`dataset`).

pub mod config;
pub mod datalog;
pub mod dataset;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod generator;
pub mod parser;
pub mod questions;
pub mod rules;

pub use error::{Error, Result};
