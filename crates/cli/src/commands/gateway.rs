//! `cardpress gateway`: start the HTTP trigger surface.

use cardpress_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🗂️  Cardpress Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Auth required: {}", config.gateway.api_token.is_some());
    println!("   Destination prefix: {}", config.destination.prefix);

    cardpress_gateway::start(config).await?;

    Ok(())
}
