//! `cardpress doctor`: diagnose configuration.

use cardpress_config::AppConfig;

/// Checks that only depend on a loaded config. Returns (ok, message) pairs.
fn config_checks(config: &AppConfig) -> Vec<(bool, String)> {
    let mut checks = Vec::new();

    match &config.source.host {
        Some(host) => checks.push((true, format!("Source host: {host}"))),
        None => checks.push((
            false,
            "No source host; set [source].host or pass --source-host".into(),
        )),
    }
    match &config.destination.host {
        Some(host) => checks.push((true, format!("Destination host: {host}"))),
        None => checks.push((
            false,
            "No destination host; set [destination].host or pass --destination-host".into(),
        )),
    }

    if config.destination.token.is_none() {
        checks.push((
            false,
            "No destination token; writes will be sent without Authorization".into(),
        ));
    }

    checks.push((
        true,
        format!("{} static token(s) configured", config.tokens.len()),
    ));
    checks
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Cardpress Doctor: Configuration Diagnostics");
    println!("==============================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file; run `cardpress onboard` (env overrides still apply)");
        issues += 1;
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            for (ok, message) in config_checks(&config) {
                if ok {
                    println!("  ✅ {message}");
                } else {
                    println!("  ⚠️  {message}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
