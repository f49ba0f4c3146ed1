pub mod adapters;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod registry;
pub mod sink;
pub mod transform;

#[cfg(test)]
mod testing;
