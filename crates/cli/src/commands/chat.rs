//! Interactive REPL over a single session, so follow-up questions share memory.

use std::io::{BufRead, Write};
use std::path::Path;

use campanile_config::AppConfig;
use campanile_core::Role;

use crate::commands::ask::print_provenance;
use crate::pipeline;

pub async fn run(
    corpus: Option<&Path>,
    user: &str,
    role: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    pipeline::ensure_api_key(&config)?;

    let role: Role = role.parse()?;
    let pipeline = pipeline::build(&config, corpus).await?;
    let session = pipeline.sessions.create_session(user, role).await;

    println!();
    println!("  ╔══════════════════════════════════════════╗");
    println!("  ║   Campanile — University Assistant       ║");
    println!("  ╚══════════════════════════════════════════╝");
    println!();
    println!("  Model:  {}", config.provider.generation_model);
    println!("  Corpus: {} chunks", pipeline.corpus_chunks);
    println!("  User:   {user} ({role})");
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let stdin = std::io::stdin();
    loop {
        print!("  You > ");
        std::io::stdout().flush().ok();

        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let question = line?.trim().to_string();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        eprint!("  Thinking...");
        std::io::stderr().flush().ok();
        let response = pipeline.orchestrator.handle(&question, &session.id).await;
        eprint!("\r              \r");

        println!();
        for line in response.text.lines() {
            println!("  Assistant > {line}");
        }
        print_provenance(&response);
        println!();
    }

    println!();
    println!("  Goodbye! 👋");
    Ok(())
}
