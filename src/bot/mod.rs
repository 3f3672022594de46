pub mod gate;
pub mod handler;
