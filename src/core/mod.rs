pub mod canvas;
pub mod domain;
pub mod geometry;
pub mod rng;
pub mod spatial;
