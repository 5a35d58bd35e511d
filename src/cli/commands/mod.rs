pub mod config;
pub mod models;
pub mod refine;
pub mod serve;
