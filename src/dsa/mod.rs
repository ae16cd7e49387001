pub mod graph;
pub mod ksp;
