//! Hash-pin command - produces the `[auth]` values for a PIN.

use anyhow::{Context as _, Result};
use clap::Args;

use warden_session::{check_pin_format, generate_salt, hash_pin};

use super::Context;

/// Arguments for the hash-pin command.
#[derive(Args, Debug)]
pub struct HashPinArgs {
    /// Four-digit PIN (or set WARDEN_PIN to keep it out of shell history)
    #[arg(env = "WARDEN_PIN", hide_env_values = true)]
    pub pin: String,

    /// Salt to use (default: freshly generated)
    #[arg(long)]
    pub salt: Option<String>,
}

/// Run the hash-pin command.
pub fn run(args: HashPinArgs, ctx: &Context) -> Result<()> {
    check_pin_format(&args.pin).context("PIN must be exactly 4 digits")?;

    let salt = match args.salt {
        Some(salt) if !salt.is_empty() => salt,
        _ => generate_salt()?,
    };
    let pin_hash = hash_pin(&args.pin, &salt);

    if ctx.json_output {
        let out = serde_json::json!({ "salt": salt, "pinHash": pin_hash });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("[auth]");
        println!("salt = \"{}\"", salt);
        println!("pin_hash = \"{}\"", pin_hash);
    }

    Ok(())
}
