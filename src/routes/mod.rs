pub mod catalog;
pub mod export;
pub mod generation;
pub mod health;
