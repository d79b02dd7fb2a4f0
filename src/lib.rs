pub mod analysis;
pub mod commands;
pub mod github;
pub mod models;
