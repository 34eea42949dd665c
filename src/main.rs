//! Ethereum Address Miner CLI
//!
//! Usage:
//!   eth-addrgen salt --factory 0x.. --init-code-hash 0x.. -p badc0de -t suffix
//!   eth-addrgen nonce --creator 0x.. -p 0000
//!   eth-addrgen key -p dead                  # Find a key whose address starts with "dead"
//!   eth-addrgen key -p cafe --contract-nonce 0
//!   eth-addrgen keygen --out key.hex
//!   eth-addrgen inspect --key-file key.hex

use std::error::Error;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use eth_addrgen::config::{parse_address, parse_digest, parse_hex_bytes, Command, SearchArgs};
use eth_addrgen::crypto::{load_key_file, save_key_file, PrivateKey, SignatureService};
use eth_addrgen::worker::{
    CandidateEvaluator, KeyEvaluator, NonceEvaluator, PreimageEvaluator, ProgressLog,
    SaltEvaluator,
};
use eth_addrgen::{Config, MiningEngine, Pattern, SearchOutcome, SearchReport};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    // Print startup info
    println!("Ethereum Address Miner");
    println!("======================");

    if let Err(e) = run(config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config: Config) -> Result<(), Box<dyn Error>> {
    match config.command {
        Command::Salt {
            factory,
            init_code_hash,
            init_code,
            search,
        } => {
            let factory = parse_address("factory", &factory)?;
            let evaluator = match (init_code_hash, init_code) {
                (Some(hash), _) => {
                    SaltEvaluator::new(factory, parse_digest("init-code-hash", &hash)?)
                }
                (None, Some(code)) => {
                    SaltEvaluator::from_init_code(factory, &parse_hex_bytes("init-code", &code)?)
                }
                (None, None) => {
                    return Err("either --init-code-hash or --init-code is required".into())
                }
            };
            println!("Mode:       CREATE2 salt");
            println!("Factory:    {}", factory);
            println!("Init hash:  0x{}", hex::encode(evaluator.init_code_hash()));
            let engine = build_engine(evaluator, &search)?;
            if let Some(report) = mine(&engine, &search)? {
                if let SearchOutcome::Found(found) = report.outcome {
                    println!("Salt:        0x{:064x}", found.candidate);
                }
            }
        }
        Command::Nonce { creator, search } => {
            let creator = parse_address("creator", &creator)?;
            println!("Mode:       CREATE nonce");
            println!("Creator:    {}", creator);
            let engine = build_engine(NonceEvaluator::new(creator), &search)?;
            if let Some(report) = mine(&engine, &search)? {
                if let SearchOutcome::Found(found) = report.outcome {
                    println!("Nonce:       {}", found.candidate);
                }
            }
        }
        Command::Key {
            contract_nonce,
            out,
            search,
        } => {
            let mut evaluator = KeyEvaluator::random()?;
            match contract_nonce {
                Some(nonce) => {
                    println!("Mode:       private key (contract at nonce {})", nonce);
                    evaluator = evaluator.contract_at_nonce(nonce);
                }
                None => println!("Mode:       private key"),
            }
            let engine = build_engine(evaluator, &search)?;
            if let Some(report) = mine(&engine, &search)? {
                if let SearchOutcome::Found(found) = report.outcome {
                    let evaluator = engine.evaluator();
                    let key = evaluator.key_for(found.candidate)?;
                    if evaluator.contract_nonce().is_some() {
                        println!("Account:     {}", evaluator.account_for(found.candidate)?);
                    }
                    emit_key(&key, out.as_deref())?;
                }
            }
        }
        Command::Preimage { search } => {
            println!("Mode:       keccak256 preimage");
            let engine = build_engine(PreimageEvaluator, &search)?;
            if let Some(report) = mine(&engine, &search)? {
                if let SearchOutcome::Found(found) = report.outcome {
                    println!("Preimage:    {}", found.candidate);
                }
            }
        }
        Command::Keygen { out } => {
            let key = PrivateKey::generate()?;
            let address = SignatureService::secp256k1().address_of(&key)?;
            println!("Address:     {}", address);
            emit_key(&key, out.as_deref())?;
        }
        Command::Inspect { key_file } => {
            let key = load_key_file(&key_file)?;
            let service = SignatureService::secp256k1();
            let public_key = service.public_key(&key)?;
            println!("Public Key:  0x{}", hex::encode(public_key.to_uncompressed()));
            println!("Address:     {}", public_key.address());
        }
    }
    Ok(())
}

fn emit_key(key: &PrivateKey, out: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match out {
        Some(path) => {
            save_key_file(path, key)?;
            println!("Private Key: written to {}", path.display());
        }
        None => println!("Private Key: 0x{}", key.to_hex()),
    }
    Ok(())
}

fn build_engine<E: CandidateEvaluator>(
    evaluator: E,
    search: &SearchArgs,
) -> Result<MiningEngine<E, Pattern>, Box<dyn Error>> {
    let engine = MiningEngine::new(search.search_config(), evaluator, search.build_pattern())?;
    let engine = match &search.progress_log {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            engine.with_progress(ProgressLog::new(file))
        }
        None => engine.with_progress(ProgressLog::new(io::stderr())),
    };

    // Set up ctrl-c handler
    ctrlc_handler(engine.stop_flag_clone());
    Ok(engine)
}

/// Prints the banner, runs the search and prints the result block.
/// Returns `None` when nothing was found.
fn mine<E: CandidateEvaluator>(
    engine: &MiningEngine<E, Pattern>,
    search: &SearchArgs,
) -> Result<Option<SearchReport>, Box<dyn Error>> {
    let pattern = search.build_pattern();
    let config = engine.config();

    println!("Pattern:    {}", pattern);
    println!("Difficulty: {}", pattern.difficulty_description());
    println!("Range:      {} - {}", config.start, config.limit);
    println!("Chunk size: {}", format_number(config.interval));
    println!("Workers:    {}", config.max_workers);
    println!();
    println!("Searching... (Press Ctrl+C to stop)\n");

    let report = engine.run()?;

    let result = match report.outcome {
        SearchOutcome::Found(found) => {
            println!("=== Match ===");
            println!("Address:     {}", found.address);
            println!("Candidate:   {}", found.candidate);
            println!("Found after: {:.2}s", found.elapsed.as_secs_f64());
            Some(report)
        }
        SearchOutcome::Exhausted => {
            println!("Range exhausted without a match.");
            None
        }
        SearchOutcome::Cancelled => {
            println!("Stopped by user.");
            None
        }
    };

    // Print final stats
    println!("\n--- Final Statistics ---");
    println!("Candidates evaluated: {}", format_number(report.candidates_visited));
    println!("Chunks finished:      {}", report.chunks_completed);
    println!("Time elapsed:         {:.2}s", report.elapsed.as_secs_f64());
    println!(
        "Average speed:        {}/s",
        format_number(report.candidates_per_second() as u64)
    );
    println!();

    Ok(result)
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    })
    .expect("Error setting Ctrl-C handler");
}
