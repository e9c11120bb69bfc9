pub mod aggregate;
pub mod keywords;
pub mod matcher;
pub mod normalize;
pub mod quality_gate;
