pub mod exec;
pub mod merge;
pub mod phase;
pub mod resources;
pub mod switch;
pub mod units;
