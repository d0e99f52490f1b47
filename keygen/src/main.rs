//! One-time RSA key-pair generation for Keymint deployments.
//!
//! Run once on an operator machine. Ship the private key to the issuance
//! service (as a file or via `KEYMINT_KEY_PEM`) and embed the public key in
//! the client software that validates activation codes offline.
//!
//! Usage:
//!   keymint-keygen --out private.pem --public-out public.pem

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::rngs::OsRng;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

#[derive(Parser, Debug)]
#[command(name = "keymint-keygen")]
#[command(about = "Generate the Keymint signing key pair")]
struct Args {
    /// Where to write the PKCS#1 private key
    #[arg(long, default_value = "private.pem")]
    out: PathBuf,

    /// Where to write the matching public key
    #[arg(long, default_value = "public.pem")]
    public_out: PathBuf,

    /// RSA modulus size in bits
    #[arg(long, default_value = "2048")]
    bits: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.out.exists() {
        bail!(
            "refusing to overwrite existing private key at {}",
            args.out.display()
        );
    }

    eprintln!("Generating {}-bit RSA key pair...", args.bits);
    let private = RsaPrivateKey::new(&mut OsRng, args.bits).context("key generation failed")?;
    let public = RsaPublicKey::from(&private);

    let private_pem = private
        .to_pkcs1_pem(LineEnding::LF)
        .context("failed to encode private key")?;
    write_private(&args.out, private_pem.as_bytes())?;

    let public_pem = public
        .to_pkcs1_pem(LineEnding::LF)
        .context("failed to encode public key")?;
    fs::write(&args.public_out, public_pem.as_bytes())
        .with_context(|| format!("failed to write {}", args.public_out.display()))?;

    eprintln!("Private key: {}", args.out.display());
    eprintln!("Public key:  {}", args.public_out.display());
    Ok(())
}

/// Private key files are owner-readable only.
#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
