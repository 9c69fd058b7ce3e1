pub mod models;
pub mod gateway;
pub mod viewport;
pub mod services;
pub mod cli;
pub mod utils;

pub use anyhow::{Error, Result};
