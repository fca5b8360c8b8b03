use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Command-line arguments. Positional values override the config file.
#[derive(Debug, Parser)]
#[command(name = "harbor")]
#[command(about = "Bounded-concurrency HTTP/1.1 file and upload server", long_about = None)]
pub struct Cli {
    /// Port to listen on [default: 8080]
    pub port: Option<u16>,

    /// Address to bind [default: 127.0.0.1]
    pub host: Option<String>,

    /// Worker pool size [default: 10]
    #[arg(value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(workers) = self.workers {
            config.server.workers = workers;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_workers(raw: &str) -> Result<usize, String> {
    let workers: usize = raw
        .parse()
        .map_err(|_| format!("invalid worker pool size: {raw}"))?;
    if workers == 0 {
        return Err("worker pool size must be at least 1".to_string());
    }
    Ok(workers)
}
