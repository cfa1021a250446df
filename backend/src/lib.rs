//! Interactive editing of data-bound vector visualizations.

pub mod app;
pub mod data;
pub mod error;
pub mod objects;
pub mod renderer;
pub mod scene_system;
