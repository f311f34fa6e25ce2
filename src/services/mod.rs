pub mod aggregator;
pub mod analyzer;
pub mod export;
pub mod health;
pub mod lifecycle;
pub mod samples;
pub mod staging;
pub mod workflow;

#[cfg(test)]
pub(crate) mod fixtures;
