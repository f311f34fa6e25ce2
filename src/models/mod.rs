pub mod analysis;
pub mod config;
pub mod health;
pub mod view;
