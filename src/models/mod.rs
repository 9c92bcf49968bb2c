pub mod graph;
pub mod message;
pub mod payload;
pub mod snapshot;
