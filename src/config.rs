//! Command-line configuration for the address miner.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::crypto::{Address, Digest};
use crate::matcher::{Pattern, PatternType};
use crate::worker::SearchConfig;

/// Ethereum key, signature and contract-address miner
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Mine a CREATE2 salt for a factory and init code
    Salt {
        /// Deploying factory address
        #[arg(long)]
        factory: String,

        /// keccak256 of the init code (32 bytes hex)
        #[arg(long, conflicts_with = "init_code", required_unless_present = "init_code")]
        init_code_hash: Option<String>,

        /// Init code (hex); hashed before mining
        #[arg(long)]
        init_code: Option<String>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Mine the CREATE nonce at which a creator deploys a matching contract
    Nonce {
        /// Deploying account address
        #[arg(long)]
        creator: String,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Mine a private key whose account (or deployed contract) address matches
    Key {
        /// Match the contract the account deploys at this nonce instead
        #[arg(long)]
        contract_nonce: Option<u64>,

        /// Write the found key to this file instead of printing it
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Mine an integer whose keccak256 ends in a matching address
    Preimage {
        #[command(flatten)]
        search: SearchArgs,
    },

    /// Generate a random private key
    Keygen {
        /// Write the key to this file instead of printing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the public key and address of a key file
    Inspect {
        /// Key file holding 64 hex characters
        #[arg(short = 'k', long)]
        key_file: PathBuf,
    },
}

/// Options shared by every mining subcommand.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Pattern to search for (hex characters only: 0-9, a-f)
    #[arg(short, long)]
    pub pattern: String,

    /// Suffix pattern (when used, --pattern becomes the prefix and matching uses both)
    #[arg(short = 's', long)]
    pub suffix: Option<String>,

    /// Pattern type: prefix, suffix, contains or exact
    #[arg(short = 't', long, default_value = "prefix")]
    pub pattern_type: PatternType,

    /// First candidate
    #[arg(long, default_value_t = 0)]
    pub start: u64,

    /// Last candidate (inclusive)
    #[arg(long, default_value_t = u64::MAX)]
    pub limit: u64,

    /// Candidates per chunk
    #[arg(short = 'i', long, default_value_t = 1_000_000)]
    pub interval: u64,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Append one line per finished chunk to this file (default: stderr)
    #[arg(long)]
    pub progress_log: Option<PathBuf>,
}

impl SearchArgs {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validates the pattern and the candidate range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pattern = self.normalized_pattern();
        check_hex_pattern("Pattern", &pattern)?;

        if let Some(suffix) = self.normalized_suffix() {
            check_hex_pattern("Suffix", &suffix)?;
            if pattern.len() + suffix.len() > 40 {
                return Err(ConfigError::InvalidPattern(
                    "Combined prefix + suffix cannot be longer than 40 characters".into(),
                ));
            }
        } else if self.pattern_type == PatternType::PrefixAndSuffix {
            return Err(ConfigError::InvalidPattern(
                "Pattern type prefix+suffix requires --suffix".into(),
            ));
        } else if self.pattern_type == PatternType::Exact && pattern.len() != 40 {
            return Err(ConfigError::InvalidPattern(
                "Exact pattern must be a full 40 character address".into(),
            ));
        }

        if self.start > self.limit {
            return Err(ConfigError::InvalidRange(format!(
                "start {} is greater than limit {}",
                self.start, self.limit
            )));
        }
        if self.interval == 0 {
            return Err(ConfigError::InvalidRange("interval must be at least 1".into()));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidRange("workers must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns the pattern lowercased with any `0x` removed.
    pub fn normalized_pattern(&self) -> String {
        strip_hex_prefix(&self.pattern.to_lowercase()).to_string()
    }

    pub fn normalized_suffix(&self) -> Option<String> {
        self.suffix
            .as_ref()
            .map(|s| strip_hex_prefix(&s.to_lowercase()).to_string())
    }

    /// Returns the effective pattern type, accounting for --suffix flag
    pub fn effective_pattern_type(&self) -> PatternType {
        if self.suffix.is_some() {
            PatternType::PrefixAndSuffix
        } else {
            self.pattern_type
        }
    }

    pub fn build_pattern(&self) -> Pattern {
        match self.normalized_suffix() {
            Some(suffix) => Pattern::new_prefix_and_suffix(self.normalized_pattern(), suffix),
            None => Pattern::new(self.normalized_pattern(), self.pattern_type),
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::new(self.start, self.limit, self.interval, self.worker_count())
    }
}

impl Config {
    /// Returns the mining options, if the subcommand mines.
    pub fn search(&self) -> Option<&SearchArgs> {
        match &self.command {
            Command::Salt { search, .. }
            | Command::Nonce { search, .. }
            | Command::Key { search, .. }
            | Command::Preimage { search } => Some(search),
            Command::Keygen { .. } | Command::Inspect { .. } => None,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(search) = self.search() {
            search.validate()?;
        }
        match &self.command {
            Command::Salt {
                factory,
                init_code_hash,
                init_code,
                ..
            } => {
                parse_address("factory", factory)?;
                match (init_code_hash, init_code) {
                    (Some(hash), _) => parse_digest("init-code-hash", hash).map(|_| ()),
                    (None, Some(code)) => parse_hex_bytes("init-code", code).map(|_| ()),
                    (None, None) => Err(ConfigError::InvalidArgument {
                        name: "init-code-hash",
                        reason: "either --init-code-hash or --init-code is required".into(),
                    }),
                }
            }
            Command::Nonce { creator, .. } => parse_address("creator", creator).map(|_| ()),
            _ => Ok(()),
        }
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn check_hex_pattern(what: &str, pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(format!("{} cannot be empty", what)));
    }
    if !pattern.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidPattern(format!(
            "{} must contain only hex characters (0-9, a-f)",
            what
        )));
    }
    if pattern.len() > 40 {
        return Err(ConfigError::InvalidPattern(format!(
            "{} cannot be longer than 40 characters (full address)",
            what
        )));
    }
    Ok(())
}

/// Parses a 20-byte address argument.
pub fn parse_address(name: &'static str, value: &str) -> Result<Address, ConfigError> {
    Address::from_hex(value).map_err(|e| ConfigError::InvalidArgument {
        name,
        reason: e.to_string(),
    })
}

/// Parses a 32-byte hash argument.
pub fn parse_digest(name: &'static str, value: &str) -> Result<Digest, ConfigError> {
    let bytes = parse_hex_bytes(name, value)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| ConfigError::InvalidArgument {
            name,
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        })
}

/// Parses an arbitrary hex byte string argument.
pub fn parse_hex_bytes(name: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    hex::decode(strip_hex_prefix(value)).map_err(|e| ConfigError::InvalidArgument {
        name,
        reason: e.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid --{name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}
