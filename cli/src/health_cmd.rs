use std::time::Instant;

use clap::Parser;
use moodlift_ollama::ConnectionStatus;
use moodlift_ollama::OllamaClient;
use serde::Serialize;

use crate::GlobalArgs;
use crate::exit_codes;

#[derive(Debug, Parser)]
pub struct HealthArgs {
    /// Output as JSON for automation
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    healthy: bool,
    status: ConnectionStatus,
    endpoint: String,
    model: String,
    model_available: bool,
    available_models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    latency_ms: u64,
}

pub async fn run(global: &GlobalArgs, args: HealthArgs) -> i32 {
    let config = match global.load_config() {
        Ok(config) => config,
        Err(e) => {
            if args.json {
                let body = serde_json::json!({ "healthy": false, "error": e.to_string() });
                println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
            } else {
                eprintln!("Configuration error: {e}");
            }
            return exit_codes::CONFIG_ERROR;
        }
    };

    let client = OllamaClient::new(&config.ollama.endpoint, &config.ollama.model)
        .with_timeout(config.ollama.timeout());
    let report = check(&client).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        print_report(&report);
    }

    if report.healthy {
        exit_codes::SUCCESS
    } else {
        exit_codes::FAILURE
    }
}

async fn check(client: &OllamaClient) -> HealthReport {
    let start = Instant::now();
    let status = client.check_health().await;

    let (available_models, error) = match status {
        ConnectionStatus::Connected => match client.list_models().await {
            Ok(models) => (models, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        },
        ConnectionStatus::Disconnected => (
            Vec::new(),
            Some(format!("Ollama is not running at {}", client.endpoint())),
        ),
        ConnectionStatus::Error => (
            Vec::new(),
            Some(format!("Ollama at {} is not responding correctly", client.endpoint())),
        ),
    };

    let model_available = has_model(&available_models, client.model());
    let error = error.or_else(|| {
        (!model_available).then(|| {
            format!(
                "Configured model '{}' not found; run `ollama pull {}`",
                client.model(),
                client.model()
            )
        })
    });

    HealthReport {
        healthy: status == ConnectionStatus::Connected && model_available,
        status,
        endpoint: client.endpoint().to_string(),
        model: client.model().to_string(),
        model_available,
        available_models,
        error,
        latency_ms: start.elapsed().as_millis() as u64,
    }
}

/// Ollama reports untagged models as `name:latest`.
fn has_model(installed: &[String], wanted: &str) -> bool {
    installed.iter().any(|name| {
        name == wanted || (!wanted.contains(':') && name.strip_suffix(":latest") == Some(wanted))
    })
}

fn print_report(report: &HealthReport) {
    if report.healthy {
        println!("✓ Ollama healthy");
    } else {
        println!("✗ Ollama unhealthy");
    }
    println!("  Endpoint: {}", report.endpoint);
    let availability = if report.model_available {
        "available"
    } else {
        "NOT FOUND"
    };
    println!("  Model: {} ({availability})", report.model);
    println!("  Latency: {}ms", report.latency_ms);
    if !report.available_models.is_empty() {
        println!("  Installed models: {}", report.available_models.join(", "));
    }
    if let Some(error) = &report.error {
        println!("  Error: {error}");
    }
}
