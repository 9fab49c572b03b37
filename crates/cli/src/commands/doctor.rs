//! `campanile doctor` — Diagnose configuration and connectivity.

use campanile_config::AppConfig;
use campanile_core::GenerationProvider;
use campanile_memory::archive::ConversationArchive;
use campanile_providers::GeminiProvider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Campanile Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                Some(config)
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                None
            }
        }
    } else {
        println!("  ⚠️  No config file — defaults and env vars apply (run `campanile init`)");
        AppConfig::load().ok()
    };

    if let Some(config) = config {
        // Check API key
        if config.has_api_key() {
            println!("  ✅ API key configured");

            // Check provider reachability
            match GeminiProvider::from_config(&config) {
                Ok(provider) => match provider.health_check().await {
                    Ok(true) => println!("  ✅ Gemini API reachable"),
                    Ok(false) => {
                        println!("  ❌ Gemini API rejected the request — check your key");
                        issues += 1;
                    }
                    Err(e) => {
                        println!("  ❌ Gemini API unreachable: {e}");
                        issues += 1;
                    }
                },
                Err(e) => {
                    println!("  ❌ Provider setup failed: {e}");
                    issues += 1;
                }
            }
        } else {
            println!("  ❌ No API key — set CAMPANILE_API_KEY or GEMINI_API_KEY");
            issues += 1;
        }

        // Check archive
        match &config.memory.archive_path {
            Some(path) => match ConversationArchive::new(path).await {
                Ok(_) => println!("  ✅ Conversation archive reachable"),
                Err(e) => {
                    println!("  ❌ Conversation archive unreachable: {e}");
                    issues += 1;
                }
            },
            None => println!("  ✅ Conversation archive disabled"),
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
