//! Input validation helpers

pub mod port_range;
pub mod target;
