pub mod due;
pub mod quiz;
pub mod scheduler;
