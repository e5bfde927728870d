pub mod schedule;
pub mod ticket;
