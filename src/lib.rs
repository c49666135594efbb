pub mod config;
pub mod editor;
pub mod error;
pub mod models;
pub mod renderer;
pub mod utils;
