//! WebAuthn Bridge Host Binary
//!
//! Serves `WebAuthn` plugin calls as JSON lines on stdin/stdout against the
//! simulated platform, scripted by an optional fixture file.

use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{error, info};

use webauthn_bridge::platforms::SimulatedCredentialManager;
use webauthn_bridge::{MainLoopExecutor, PlatformInfo, WebAuthnBridgeBuilder};
use webauthn_bridge_host::{
    logging, serve, FixtureScript, HostConfig, PluginRegistryBuilder, WebAuthnPlugin,
};

#[tokio::main]
async fn main() {
    let config = match HostConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = logging::init(config.log_level) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Platform
    let manager = SimulatedCredentialManager::new();
    if let Some(path) = &config.fixtures {
        match FixtureScript::load(path) {
            Ok(script) => {
                info!(
                    path = %path.display(),
                    create = script.create.len(),
                    get = script.get.len(),
                    "Loaded fixtures"
                );
                script.install(&manager);
            }
            Err(e) => {
                error!(error = %e, "Failed to load fixtures");
                std::process::exit(2);
            }
        }
    }

    let platform = PlatformInfo::new(config.api_level).with_min_api_level(config.min_api_level);
    let bridge = WebAuthnBridgeBuilder::new(Arc::new(manager))
        .executor(Arc::new(MainLoopExecutor::spawn()))
        .platform(platform)
        .patterns(config.patterns.clone())
        .build();

    let registry = PluginRegistryBuilder::new()
        .with_plugin(WebAuthnPlugin::new(Arc::new(bridge)))
        .build();

    info!(
        version = webauthn_bridge_core::VERSION,
        api_level = config.api_level,
        min_api_level = config.min_api_level,
        "Starting WebAuthn bridge host"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = serve(Arc::new(registry), stdin, tokio::io::stdout()).await {
        error!(error = %e, "Host stopped");
        std::process::exit(1);
    }
}
