//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! echo 'long random passphrase' | ruchna admin hash-password
//! ```
//!
//! Put the printed PHC string in `ADMIN_PASSWORD_HASH`.

use std::io::BufRead;

use thiserror::Error;

use ruchna_admin::services::password::{PasswordError, hash_password as argon2_hash};

/// Shortest password the command will hash.
const MIN_PASSWORD_LEN: usize = 12;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Stdin could not be read.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// Password is too short to be worth hashing.
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    TooShort,

    /// Hashing failed.
    #[error(transparent)]
    Hash(#[from] PasswordError),
}

/// Read one line from stdin and print its Argon2 hash.
///
/// # Errors
///
/// Returns an error if stdin cannot be read, the password is too short,
/// or hashing fails.
pub fn hash_password() -> Result<(), AdminError> {
    tracing::info!("Reading password from stdin...");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    let hash = hash_line(&line)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}

fn hash_line(line: &str) -> Result<String, AdminError> {
    let password = line.trim_end_matches(['\r', '\n']);
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AdminError::TooShort);
    }
    Ok(argon2_hash(password)?)
}
