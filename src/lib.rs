//! # eth_addrgen
//!
//! Ethereum key handling, ECDSA signatures and account/contract address
//! derivation, plus a parallel miner that searches an integer keyspace for an
//! address matching a pattern.
//!
//! ## Architecture
//!
//! - `crypto`: Keccak hashing, key codec, signatures and address derivation
//! - `matcher`: Pattern matching strategies
//! - `worker`: Chunked, bounded-parallel search engine
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod worker;

pub use config::Config;
pub use crypto::{Address, CryptoError, PrivateKey, PublicKey, Signature, SignatureService};
pub use matcher::{MatchPredicate, Pattern, PatternType};
pub use worker::{MiningEngine, MiningError, SearchConfig, SearchOutcome, SearchReport};
