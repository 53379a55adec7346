pub mod constants;
pub mod math;
pub mod physics;
pub mod room;
pub mod simulation;
pub mod snake;
pub mod spawn;
pub mod types;
pub mod world;
