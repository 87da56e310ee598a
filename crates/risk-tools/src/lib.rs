//! Shared start-up for the risk tools

use anyhow::Context;
use diabetes_risk::{AssessmentOutcome, RawInputs, RiskEngine};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Load `.env`, then install the tracing subscriber filtered by `RUST_LOG`
pub fn init() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// What a request file contains
#[derive(Debug, PartialEq)]
pub enum Request {
    /// CSV lab export
    LabSheet(String),

    /// JSON object of raw form fields
    Form(RawInputs),
}

impl Request {
    /// Interpret `text`; `.csv` paths are lab sheets, anything else is JSON
    pub fn parse(text: String, path: Option<&Path>) -> anyhow::Result<Self> {
        let is_csv = path
            .and_then(Path::extension)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            return Ok(Self::LabSheet(text));
        }

        let inputs: RawInputs = serde_json::from_str(&text).context("request is not a JSON object of input fields")?;
        Ok(Self::Form(inputs))
    }
}

/// Score one request through `engine`
pub async fn run(engine: &RiskEngine, request: Request) -> diabetes_risk::Result<AssessmentOutcome> {
    match request {
        Request::LabSheet(sheet) => engine.assess_lab_sheet(&sheet).await,
        Request::Form(inputs) => engine.assess(&inputs).await,
    }
}
