// src/config/helpers.rs
// Environment lookup helpers shared by the domain configs

/// Read a mandatory variable. Startup cannot proceed without it, so a
/// missing value panics with the variable name.
pub fn require_env(key: &str) -> String {
    match std::env::var(key) {
        Ok(value) => value,
        Err(_) => panic!("Required env var {} is not set", key),
    }
}

/// Read a variable, falling back to `default` when unset.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse a variable; unset or unparseable values fall back to
/// `default`.
pub fn env_parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Boolean variable accepting true/false, 1/0, and yes/no in any case.
pub fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).map(|v| v.to_lowercase()) {
        Ok(v) if v == "true" || v == "1" || v == "yes" => true,
        Ok(v) if v == "false" || v == "0" || v == "no" => false,
        _ => default,
    }
}
