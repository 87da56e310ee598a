//! risk-assess
//!
//! Runs one assessment end to end and prints the outcome as JSON.
//!
//! Input comes from the path in the first argument or `RISK_INPUT_PATH`
//! (a `.csv` lab sheet or a JSON object of form fields), or from stdin as
//! JSON. Generative advice is used when `OPENAI_API_KEY` is set.

use anyhow::Context;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use diabetes_risk::{EngineConfig, RiskEngine, RiskError};
use llm_core::LlmProvider;
use llm_runtime::OpenAiProvider;
use risk_tools::Request;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    risk_tools::init();

    let config = EngineConfig::from_env()?;

    let provider: Option<Arc<dyn LlmProvider>> = match OpenAiProvider::from_env()? {
        Some(provider) => {
            match provider.health_check().await {
                Ok(true) => tracing::info!("✓ Connected to {}", provider.info().endpoint),
                Ok(false) | Err(_) => {
                    tracing::warn!("⚠ Advice service not reachable - rule-based advice will be used");
                }
            }
            Some(Arc::new(provider))
        }
        None => {
            tracing::warn!("⚠ OPENAI_API_KEY not set - rule-based advice only");
            None
        }
    };

    let engine = RiskEngine::from_config(&config, provider);

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("RISK_INPUT_PATH").ok())
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let text = match &path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let request = Request::parse(text, path.as_deref())?;
    let result = risk_tools::run(&engine, request).await;

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(err @ (RiskError::Validation(_) | RiskError::Intake(_))) => {
            eprintln!("{}", err.user_message());
            std::process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}
