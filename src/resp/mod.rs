pub mod problem;
pub mod token;
