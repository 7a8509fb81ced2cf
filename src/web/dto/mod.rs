pub mod account;
pub mod common;
pub mod courses;
pub mod player;
pub mod tree;
