#![deny(dead_code)]
#![deny(unused_imports)]

pub mod chunking;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;
