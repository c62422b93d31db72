use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vinmint_storage::redis::DEFAULT_KEY_PREFIX;
use vinmint_storage::{SelectorConfig, DEFAULT_SEQUENCE_FILE};
use vinmint_telemetry::{LogFormat, LOG_FORMAT_ENV};

pub const REDIS_URL_ENV: &str = "VINMINT_REDIS_URL";
pub const SEQUENCE_FILE_ENV: &str = "VINMINT_SEQUENCE_FILE";
pub const REDIS_KEY_PREFIX_ENV: &str = "VINMINT_REDIS_KEY_PREFIX";
pub const ALLOCATION_TIMEOUT_ENV: &str = "VINMINT_ALLOCATION_TIMEOUT_MS";

pub const DEFAULT_ALLOCATION_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Parser)]
#[command(name = "vinmint", about = "Issue and check vehicle identification numbers")]
pub struct CLI {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Use the shared Redis counters at this URL instead of the local file.
    #[arg(long, env = REDIS_URL_ENV, global = true)]
    pub redis_url: Option<String>,

    #[arg(long, env = SEQUENCE_FILE_ENV, default_value = DEFAULT_SEQUENCE_FILE, global = true)]
    pub sequence_file: PathBuf,

    #[arg(long, env = REDIS_KEY_PREFIX_ENV, default_value = DEFAULT_KEY_PREFIX, global = true)]
    pub redis_key_prefix: String,

    /// Upper bound on the whole batch, in milliseconds.
    #[arg(long, env = ALLOCATION_TIMEOUT_ENV, default_value_t = DEFAULT_ALLOCATION_TIMEOUT_MS, global = true)]
    pub allocation_timeout_ms: u64,
}

impl StoreArgs {
    pub fn selector(&self) -> SelectorConfig {
        SelectorConfig::builder()
            .redis_url(self.redis_url.clone())
            .sequence_file(self.sequence_file.clone())
            .redis_key_prefix(self.redis_key_prefix.clone())
            .build()
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Allocate and print a batch of new codes.
    Generate {
        #[arg(long, short = 'n', default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        manufacturer_id: String,
        #[arg(long)]
        descriptor: String,
        #[arg(long)]
        model_year: i32,
        #[arg(long)]
        plant_code: String,
        /// Print the full batch as JSON instead of one code per line.
        #[arg(long)]
        json: bool,
    },
    /// Check one or more codes without touching any counter.
    Validate {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Show the last issued sequence number for a prefix.
    Current { prefix: String },
    /// Summarize every counter in the store.
    Stats,
    /// Overwrite a prefix counter. Can cause duplicate codes.
    Reset {
        prefix: String,
        #[arg(default_value_t = 0)]
        value: u64,
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_parses_fields() {
        let cli = CLI::try_parse_from([
            "vinmint",
            "generate",
            "-n",
            "5",
            "--manufacturer-id",
            "LZS",
            "--descriptor",
            "HCKZS",
            "--model-year",
            "2028",
            "--plant-code",
            "S",
        ])
        .unwrap();

        match cli.command {
            Command::Generate {
                quantity,
                model_year,
                json,
                ..
            } => {
                assert_eq!(quantity, 5);
                assert_eq!(model_year, 2028);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn store_flags_are_global() {
        let cli = CLI::try_parse_from([
            "vinmint",
            "stats",
            "--redis-url",
            "redis://127.0.0.1:6379",
            "--redis-key-prefix",
            "test:",
        ])
        .unwrap();

        let selector = cli.store.selector();
        assert_eq!(selector.redis_url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(selector.redis_key_prefix, "test:");
    }

    #[test]
    fn reset_defaults_to_zero() {
        let cli = CLI::try_parse_from(["vinmint", "reset", "LZSHCKZSWS", "--force"]).unwrap();
        match cli.command {
            Command::Reset { value, force, .. } => {
                assert_eq!(value, 0);
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn validate_requires_a_code() {
        assert!(CLI::try_parse_from(["vinmint", "validate"]).is_err());
    }
}
