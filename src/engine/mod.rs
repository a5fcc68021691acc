pub mod challenge;
pub mod coordinator;
pub mod error;
pub mod operators;
