//! `cardpress resolve`: preview token resolution for a piece of text.

use std::collections::HashMap;

use cardpress_config::AppConfig;
use cardpress_core::token::{self, TokenTable};

/// Overlay command-line tokens on the configured table.
fn build_table(config: &AppConfig, tokens: Vec<(String, String)>) -> TokenTable {
    let mut table = config.tokens.clone();
    table.extend(tokens);
    table
}

pub async fn run(
    text: &str,
    tokens: Vec<(String, String)>,
    profile: Vec<(String, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let table = build_table(&config, tokens);

    let resolved = token::resolve(text, &table);
    println!("{resolved}");

    let unresolved = token::unresolved_static_tokens(text, &table);
    if !unresolved.is_empty() {
        eprintln!("⚠️  Unresolved tokens: {}", unresolved.join(", "));
    }

    if !profile.is_empty() {
        let profile: HashMap<String, String> = profile.into_iter().collect();
        println!("\n👤 Render-time preview:");
        println!("{}", token::render_profile(&resolved, &profile));
    }

    Ok(())
}
