//! Peppermill operator CLI.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use peppermill_core::crypto::generate_pepper;
use peppermill_core::{
    new_key, Mac, PasswordHasher, PasswordPolicy, PeppermillError, RandomId, SecretKey,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

/// Key generation, message signing and peppered password hashing.
#[derive(Debug, Parser)]
#[command(name = "peppermill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON password policy (cost, input_limit, max_password_len).
    #[arg(short, long, env = "PEPPERMILL_POLICY")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a new 64-byte signing key as hex.
    Keygen,

    /// Print a new random pepper as hex.
    Pepper {
        #[arg(short, long, default_value_t = peppermill_core::policy::DEFAULT_PEPPER_LEN)]
        len: usize,
    },

    /// Print a new random identifier.
    Id,

    /// Sign a message with HMAC-SHA256.
    Sign {
        #[arg(short, long, env = "PEPPERMILL_KEY", hide_env_values = true)]
        key: String,
        #[arg(short, long)]
        message: String,
    },

    /// Verify an HMAC-SHA256 tag.
    Verify {
        #[arg(short, long, env = "PEPPERMILL_KEY", hide_env_values = true)]
        key: String,
        #[arg(short, long)]
        message: String,
        #[arg(long)]
        mac: String,
    },

    /// Hash a password with a pepper.
    Hash {
        #[arg(long, env = "PEPPERMILL_PEPPER", hide_env_values = true)]
        pepper: String,
        #[arg(long, env = "PEPPERMILL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Check a password against a stored hash.
    Check {
        #[arg(long, env = "PEPPERMILL_PEPPER", hide_env_values = true)]
        pepper: String,
        #[arg(long, env = "PEPPERMILL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        hash: String,
    },
}

fn load_policy(path: Option<&PathBuf>) -> Result<PasswordPolicy> {
    let Some(path) = path else {
        return Ok(PasswordPolicy::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading policy {}", path.display()))?;
    let policy = PasswordPolicy::from_json(&json)
        .with_context(|| format!("parsing policy {}", path.display()))?;
    tracing::debug!(
        cost = policy.cost,
        max_password_len = policy.max_password_len,
        "loaded password policy"
    );
    Ok(policy)
}

fn decode_pepper(encoded: &str) -> Result<Zeroizing<Vec<u8>>> {
    hex::decode(encoded.trim())
        .map(Zeroizing::new)
        .context("pepper must be hex")
}

fn report(valid: bool) -> ExitCode {
    if valid {
        println!("valid");
        ExitCode::SUCCESS
    } else {
        println!("invalid");
        ExitCode::FAILURE
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Keygen => {
            let key = new_key().context("generating key")?;
            println!("{}", key.to_hex().as_str());
        }
        Command::Pepper { len } => {
            anyhow::ensure!(len > 0, "pepper length must be positive");
            let pepper = generate_pepper(len).context("generating pepper")?;
            println!("{}", hex::encode(pepper.as_slice()));
        }
        Command::Id => {
            println!("{}", RandomId::new_random().context("generating id")?);
        }
        Command::Sign { key, message } => {
            let key = SecretKey::from_hex(&key).context("decoding key")?;
            println!("{}", key.sign(message.as_bytes()).to_hex());
        }
        Command::Verify { key, message, mac } => {
            let key = SecretKey::from_hex(&key).context("decoding key")?;
            let Ok(tag) = Mac::from_hex(&mac) else {
                return Ok(report(false));
            };
            return Ok(report(key.verify(message.as_bytes(), tag.as_bytes())));
        }
        Command::Hash { pepper, password } => {
            let hasher = PasswordHasher::new(load_policy(cli.config.as_ref())?)?;
            let pepper = decode_pepper(&pepper)?;
            let password = Zeroizing::new(password);
            let stored = hasher
                .hash(password.as_bytes(), &pepper)
                .context("hashing password")?;
            println!("{stored}");
        }
        Command::Check {
            pepper,
            password,
            hash,
        } => {
            let hasher = PasswordHasher::new(load_policy(cli.config.as_ref())?)?;
            let pepper = decode_pepper(&pepper)?;
            let password = Zeroizing::new(password);
            match hasher.verify_checked(password.as_bytes(), &pepper, hash.trim().as_bytes()) {
                Ok(matched) => {
                    if matched && hasher.needs_rehash(hash.trim().as_bytes()) {
                        eprintln!("note: hash cost differs from policy, rehash on next login");
                    }
                    return Ok(report(matched));
                }
                Err(err @ (PeppermillError::EmptyInput(_)
                | PeppermillError::InputTooLong { .. }
                | PeppermillError::MalformedHash)) => {
                    eprintln!("rejected: {err}");
                    return Ok(report(false));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
