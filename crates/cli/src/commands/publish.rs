//! `cardpress publish`: run one publish invocation.

use std::sync::Arc;

use cardpress_config::AppConfig;
use cardpress_publisher::{PublishRequest, Publisher};
use cardpress_stores::{HttpStore, InMemoryStore};

pub struct PublishArgs {
    pub path: Option<String>,
    pub source_host: Option<String>,
    pub destination_host: Option<String>,
    pub tokens: Vec<(String, String)>,
    pub dry_run: bool,
}

impl PublishArgs {
    fn into_request(self, config: &AppConfig) -> PublishRequest {
        PublishRequest {
            source_path: self.path,
            source_host: self.source_host,
            destination_host: self.destination_host,
            source_token: None,
            destination_token: None,
            static_tokens: self.tokens.into_iter().collect(),
        }
        .with_defaults(config)
    }
}

pub async fn run(args: PublishArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let http = Arc::new(HttpStore::from_config(&config.http)?);
    let dry_run = args.dry_run;
    let request = args.into_request(&config);

    let dry_run_store = Arc::new(InMemoryStore::new());
    let publisher = if dry_run {
        Publisher::new(http, dry_run_store.clone())
    } else {
        Publisher::new(http.clone(), http)
    }
    .with_destination_prefix(config.destination.prefix.clone());

    match publisher.publish(&request).await {
        Ok(receipt) => {
            if dry_run {
                println!("🧪 Dry run: nothing was written to {}", receipt.location);
                if let Some(artifact) = dry_run_store.artifact(&receipt.location).await {
                    println!("   Cache-Control: {}", artifact.cache);
                    println!("{}", String::from_utf8_lossy(&artifact.body));
                }
            } else {
                println!("✅ {}", receipt.message);
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {e}");
            eprintln!("   status: {} ({})", e.status_code(), e.kind());
            Err(e.into())
        }
    }
}
