//! Build script for the auth0-adapter crate.
//!
//! This script loads environment variables at compile time, making them available
//! to the `option_env!()` macro in `Auth0Config::from_env` and
//! `AuthProviderOptions::from_env`.
//!
//! Priority order:
//! 1. Environment variables already set (e.g., from CI/CD, system env)
//! 2. Variables from `.env` file (if it exists)
//! 3. Variables from `.env.example` file (fallback for CI builds)

use std::env;
use std::fs;
use std::path::PathBuf;

const REQUIRED_VARS: [&str; 2] = ["AUTH0_DOMAIN", "AUTH0_CLIENT_ID"];

const OPTIONAL_VARS: [&str; 3] = [
    "AUTH0_AUDIENCE",
    "AUTH0_LOGIN_REDIRECT_URL",
    "AUTH0_LOGOUT_REDIRECT_URL",
];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-changed=.env.example");
    for var in REQUIRED_VARS.iter().chain(OPTIONAL_VARS.iter()) {
        println!("cargo:rerun-if-env-changed={}", var);
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let env_file = manifest_dir.join(".env");
    let env_example_file = manifest_dir.join(".env.example");

    // Count how many required variables are already set in the environment
    let env_vars_set = REQUIRED_VARS
        .iter()
        .filter(|&var| env::var(var).is_ok())
        .count();

    let (file_to_load, file_description) = if env_file.exists() {
        (Some(env_file), ".env")
    } else if env_vars_set == 0 && env_example_file.exists() {
        (Some(env_example_file), ".env.example (fallback)")
    } else {
        (None, "")
    };

    if let Some(file_path) = file_to_load {
        println!(
            "cargo:warning=Found {} file, loading Auth0 configuration (environment variables take priority)",
            file_description
        );

        let contents = fs::read_to_string(&file_path).expect("Failed to read env file");

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');

                // Only AUTH0_* keys, and only if not already set in environment
                if key.starts_with("AUTH0_") && env::var(key).is_err() {
                    println!("cargo:rustc-env={}={}", key, value);
                }
            }
        }
    } else if env_vars_set < REQUIRED_VARS.len() {
        // Not fatal: the crate is usable with a configuration built at runtime.
        println!(
            "cargo:warning=Auth0 compile-time configuration incomplete ({}/{} required variables set); Auth0Config::from_env() will return None",
            env_vars_set,
            REQUIRED_VARS.len()
        );
    }
}
