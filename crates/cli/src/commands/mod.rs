//! Subcommand implementations.

pub mod doctor;
pub mod gateway;
pub mod onboard;
pub mod publish;
pub mod resolve;

/// Parse a `NAME=VALUE` argument.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid NAME=VALUE: no `=` found in `{s}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid NAME=VALUE: empty name in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
