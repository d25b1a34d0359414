pub mod api_connection;
pub mod cli;
pub mod experiment;
pub mod generation;
pub mod grounding;
pub mod recipe;
pub mod retrieval;
