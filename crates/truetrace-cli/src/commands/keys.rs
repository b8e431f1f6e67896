//! Keys command - manage the chain signing key.

use colored::Colorize;
use serde_json::json;
use truetrace_crypto::{KeyPair, PublicKey};

use crate::context::{Context, display};
use crate::formatter::print_json;
use crate::theme::Theme;

/// Show the configured key (public key hex and key ID).
pub(crate) fn show_key(ctx: &Context) -> anyhow::Result<()> {
    let private_path = ctx.private_key_path();
    let public_path = ctx.public_key_path();

    if !private_path.exists() {
        if ctx.json() {
            return print_json(&json!({
                "present": false,
                "private_key_file": display(&private_path),
            }));
        }
        println!(
            "{}",
            Theme::info("No key found. Run `truetrace keys generate` to create one.")
        );
        return Ok(());
    }

    let key = KeyPair::load(&private_path)?;
    let public_file = PublicKey::read_from(&public_path).ok();
    let public_matches = public_file == Some(key.public_key());

    if ctx.json() {
        return print_json(&json!({
            "present": true,
            "key_id": key.key_id_hex(),
            "public_key": key.public_key_hex(),
            "private_key_file": display(&private_path),
            "public_key_file": display(&public_path),
            "public_key_file_matches": public_matches,
        }));
    }

    println!("\n{}", Theme::header("Signing Key"));
    println!("{}", Theme::kv("Key ID", &key.key_id_hex()));
    println!("{}", Theme::kv("Public key", &key.public_key_hex()));
    println!("{}", Theme::kv("Key file", &display(&private_path)));
    println!("{}", Theme::kv("Public file", &display(&public_path)));
    match public_file {
        Some(_) if public_matches => {},
        Some(_) => println!(
            "{}",
            Theme::warning("Public key file does not match the private key.")
        ),
        None => println!("{}", Theme::warning("Public key file is missing or unreadable.")),
    }
    println!();

    Ok(())
}

/// Generate a new key pair, with confirmation if one already exists.
pub(crate) fn generate_key(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let private_path = ctx.private_key_path();
    let public_path = ctx.public_key_path();

    if private_path.exists() && !force {
        if ctx.json() {
            anyhow::bail!(
                "a key already exists at {}; pass --force to replace it",
                display(&private_path)
            );
        }
        println!(
            "{}",
            Theme::warning("A key already exists. This will replace it.")
        );
        println!(
            "{}",
            Theme::warning("New events will carry the new public key. Existing events keep verifying against the key they embed.")
        );
        println!();

        let confirm = dialoguer::Confirm::new()
            .with_prompt("Replace existing key?")
            .default(false)
            .interact()?;

        if !confirm {
            println!("{}", Theme::info("Aborted."));
            return Ok(());
        }
    }

    let key = KeyPair::generate();
    key.save(&private_path, true)?;
    key.public_key().write_to(&public_path)?;
    tracing::info!(key_id = %key.key_id_hex(), path = %private_path.display(), "Generated signing key");

    if ctx.json() {
        return print_json(&json!({
            "key_id": key.key_id_hex(),
            "public_key": key.public_key_hex(),
            "private_key_file": display(&private_path),
            "public_key_file": display(&public_path),
        }));
    }

    println!("{}", Theme::success("New key generated."));
    println!("{}", Theme::kv("Key ID", &key.key_id_hex()));
    println!("{}", Theme::kv("Public key", &key.public_key_hex()));
    println!("{}", Theme::kv("Key file", &display(&private_path)));
    println!("{}", Theme::kv("Public file", &display(&public_path)));
    println!("  {}", "Keep the key file private.".dimmed());
    println!();

    Ok(())
}
