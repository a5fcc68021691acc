pub mod frame;
pub mod regions;
