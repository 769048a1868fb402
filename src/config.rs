//! Client configuration
//!
//! Read once from the environment at startup (`.env` supported via
//! `dotenvy` in the binary).

use std::env;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://arca-backend-208y.onrender.com";
const DEFAULT_DATA_DIR: &str = ".arca";

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the ARCA backend.
    pub api_url: String,
    /// Directory for durable client records (cart, token).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let api_url = env::var("ARCA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let data_dir = env::var("ARCA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        Self { api_url, data_dir }
    }
}
