//! Password hashing helpers.
//!
//! bcrypt at the default cost, run under `spawn_blocking` so the adaptive
//! hash never stalls the async executor.
use anyhow::{Context, Result};

pub async fn hash(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .context("join password hashing task")?
        .context("hash password")
}

pub async fn verify(password: &str, hashed: &str) -> Result<bool> {
    let password = password.to_string();
    let hashed = hashed.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed))
        .await
        .context("join password verify task")?
        .context("verify password")
}
