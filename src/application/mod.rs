//! Application services layer.

pub mod error;
pub mod pagination;
pub mod repos;
pub mod todos;
