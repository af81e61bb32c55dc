pub mod config;
pub mod demo;
pub mod events;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod state;
