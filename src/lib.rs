#[macro_use]
mod macros;

pub mod apply;
pub mod objects;
pub mod plan;
pub mod repository;
pub mod utils;
