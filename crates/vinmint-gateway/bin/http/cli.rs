use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use vinmint_storage::redis::DEFAULT_KEY_PREFIX;
use vinmint_storage::{SelectorConfig, DEFAULT_SEQUENCE_FILE};
use vinmint_telemetry::{LogFormat, LOG_FORMAT_ENV};

pub const LISTEN_ADDR_ENV: &str = "VINMINT_GATEWAY_LISTEN_ADDR";
pub const REDIS_URL_ENV: &str = "VINMINT_REDIS_URL";
pub const SEQUENCE_FILE_ENV: &str = "VINMINT_SEQUENCE_FILE";
pub const REDIS_KEY_PREFIX_ENV: &str = "VINMINT_REDIS_KEY_PREFIX";
pub const ALLOCATION_TIMEOUT_ENV: &str = "VINMINT_ALLOCATION_TIMEOUT_MS";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_ALLOCATION_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Parser)]
#[command(name = "vinmint-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(long, env = REDIS_URL_ENV)]
    pub redis_url: Option<String>,

    #[arg(long, env = SEQUENCE_FILE_ENV, default_value = DEFAULT_SEQUENCE_FILE)]
    pub sequence_file: PathBuf,

    #[arg(long, env = REDIS_KEY_PREFIX_ENV, default_value = DEFAULT_KEY_PREFIX)]
    pub redis_key_prefix: String,

    #[arg(long, env = ALLOCATION_TIMEOUT_ENV, default_value_t = DEFAULT_ALLOCATION_TIMEOUT_MS)]
    pub allocation_timeout_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CLI {
    pub fn selector(&self) -> SelectorConfig {
        SelectorConfig::builder()
            .redis_url(self.redis_url.clone())
            .sequence_file(self.sequence_file.clone())
            .redis_key_prefix(self.redis_key_prefix.clone())
            .build()
    }

    pub fn allocation_timeout(&self) -> Duration {
        Duration::from_millis(self.allocation_timeout_ms)
    }
}
