//! One-shot question answering: build the pipeline, ask, print, exit.

use std::io::Write;
use std::path::Path;

use campanile_config::AppConfig;
use campanile_core::{AgentResponse, Role};

use crate::pipeline;

pub async fn run(
    message: &str,
    corpus: Option<&Path>,
    user: &str,
    role: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    pipeline::ensure_api_key(&config)?;

    let role: Role = role.parse()?;
    let pipeline = pipeline::build(&config, corpus).await?;
    let session = pipeline.sessions.create_session(user, role).await;

    eprint!("  Thinking...");
    std::io::stderr().flush().ok();
    let response = pipeline.orchestrator.handle(message, &session.id).await;
    eprint!("\r              \r");

    println!("{}", response.text);
    print_provenance(&response);

    Ok(())
}

/// Shared footer for answers: citation list and cache marker.
pub fn print_provenance(response: &AgentResponse) {
    if !response.citations.is_empty() {
        let sources: Vec<String> = response
            .citations
            .iter()
            .map(|c| match c.page {
                Some(p) => format!("{} (p. {p})", c.document_id),
                None => c.document_id.clone(),
            })
            .collect();
        println!();
        println!("  Sources: {}", sources.join(", "));
    }
    if response.cached {
        println!("  (answered from the FAQ cache)");
    }
}
