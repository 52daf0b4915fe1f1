use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "pydrill", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: String,
}

impl CliArgs {
    /// Load the configuration from the specified file
    pub fn to_config(&self) -> std::io::Result<Config> {
        let file = std::fs::File::open(&self.config_path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| e.into())
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub problems: Vec<ProblemRecord>,
}

#[derive(Deserialize, Debug)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
}

/// One catalog entry. The suite and the reference solution stay server-side;
/// clients only ever see the summary projection (see `routes::problems`).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProblemRecord {
    pub id: u32,
    pub title: String,
    pub starter_source: String,
    pub test_source: String,
    pub reference_solution: Option<String>,
    pub misc: Option<serde_json::Value>,
}
