pub mod queue;
pub mod recording;
pub mod study;
pub mod ticket;
