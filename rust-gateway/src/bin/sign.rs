//! AlphaGate signing helper.
//!
//! Prints the `X-Hub-Signature` value for a payload, for use by signal
//! providers and for manual testing with curl:
//!
//! ```text
//! echo -n '{"dust":true}' | alphagate-sign
//! alphagate-sign --file signal.json --header
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use alphagate::config::ALPHAGATE_HMAC_SECRET;
use alphagate::web::{sign_body, SIGNATURE_HEADER};

#[derive(Parser)]
#[command(name = "alphagate-sign")]
#[command(about = "Compute the webhook signature for a signal payload", long_about = None)]
struct Cli {
    /// Shared HMAC secret
    #[arg(short, long, env = ALPHAGATE_HMAC_SECRET, hide_env_values = true)]
    secret: String,

    /// Read the payload from a file instead of stdin
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Strip one trailing newline from the payload before signing
    #[arg(long)]
    trim_newline: bool,

    /// Print a full header line instead of the bare signature
    #[arg(long)]
    header: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.secret.trim().is_empty() {
        bail!("{} must not be empty", ALPHAGATE_HMAC_SECRET);
    }

    let mut payload = match &cli.file {
        Some(path) => fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read payload from stdin")?;
            buf
        }
    };

    if cli.trim_newline && payload.last() == Some(&b'\n') {
        payload.pop();
        if payload.last() == Some(&b'\r') {
            payload.pop();
        }
    }

    let signature = sign_body(&cli.secret, &payload).context("Failed to compute signature")?;

    if cli.header {
        println!("{}: {}", SIGNATURE_HEADER, signature);
    } else {
        println!("{}", signature);
    }

    Ok(())
}
