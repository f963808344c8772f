#![allow(dead_code)]

pub mod config;
pub mod fixtures;
pub mod mock_inference;
pub mod server;
