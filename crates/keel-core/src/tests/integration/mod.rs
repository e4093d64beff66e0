#![cfg(test)]

pub mod common;
pub mod config_tests;
pub mod lifecycle_tests;
