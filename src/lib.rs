pub mod config;
pub mod engine;
pub mod error;
pub mod form_factor;
pub mod geometry;
pub mod material;
pub mod math;
pub mod patch;
pub mod render;
pub mod scene;
pub mod solver;
pub mod trace;

pub use error::{RadiosityError, Result};
