use clap::Args;

use sealdrop_daemon::http_server::api::health::HealthRequest;
use sealdrop_daemon::state::AppState;

/// Check the local config and whether the daemon answers
#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:    {}", state.sealdrop_dir.display()));
                lines.push("  config.toml:  OK".to_string());
                match state.load_key() {
                    Ok(_) => lines.push("  key.pem:      OK".to_string()),
                    Err(e) => lines.push(format!("  key.pem:      {}", e)),
                }
                match state.load_public_key().map(|key| key.fingerprint()) {
                    Ok(Ok(fingerprint)) => {
                        lines.push(format!("  key.pub.jwk:  OK ({})", fingerprint))
                    }
                    Ok(Err(e)) => lines.push(format!("  key.pub.jwk:  {}", e)),
                    Err(e) => lines.push(format!("  key.pub.jwk:  {}", e)),
                }
                lines.push(format!("  port:         {}", state.config.port));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Check daemon health
        let base = ctx.client.base_url().clone();
        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        let mut client = ctx.client.clone();
        match client.call(HealthRequest).await {
            Ok(resp) if resp.status == "ok" => {
                lines.push(format!("  health:  OK ({})", resp.message));
            }
            Ok(resp) => {
                lines.push(format!("  health:  UNHEALTHY ({})", resp.status));
            }
            Err(e) if e.status().is_some() => {
                lines.push(format!("  health:  UNHEALTHY ({})", e));
            }
            Err(_) => {
                lines.push("  health:  NOT REACHABLE".to_string());
            }
        }

        // 3. Report daemon version
        let version_url = format!("{}/_status/version", base.as_str().trim_end_matches('/'));
        match ctx.client.http_client().get(&version_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let version = resp
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v.get("version").and_then(|v| v.as_str()).map(String::from))
                    .unwrap_or_else(|| "unknown".to_string());
                lines.push(format!("  version: {}", version));
            }
            Ok(resp) => {
                lines.push(format!("  version: UNAVAILABLE ({})", resp.status()));
            }
            Err(_) => {
                lines.push("  version: NOT REACHABLE".to_string());
            }
        }

        Ok(lines.join("\n"))
    }
}
