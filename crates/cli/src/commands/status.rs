//! `campanile status` — Show configuration and archive state.

use campanile_config::AppConfig;
use campanile_memory::archive::ConversationArchive;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("🎓 Campanile Status");
    println!("===================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Model:        {}", config.provider.generation_model);
    println!(
        "  Embedding:    {} ({} dims)",
        config.provider.embedding_model, config.provider.embedding_dimension
    );
    println!("  Temperature:  {}", config.provider.temperature);
    println!(
        "  Retrieval:    top {} above {:.2}",
        config.retrieval.top_k, config.retrieval.similarity_threshold
    );
    println!("  Context:      {} chars max", config.context.max_context_length);
    println!(
        "  FAQ cache:    {} entries, {:.2} similarity, {}h ttl",
        config.cache.capacity, config.cache.similarity_threshold, config.cache.ttl_hours
    );
    println!(
        "  Memory:       {} turns, {} min session timeout",
        config.memory.window, config.memory.session_timeout_minutes
    );
    match &config.memory.archive_path {
        Some(path) => match ConversationArchive::new(path).await {
            Ok(archive) => {
                let count = archive.count().await.unwrap_or(0);
                println!("  Archive:      {path} ({count} conversations)");
            }
            Err(e) => println!("  Archive:      {path} (unreachable: {e})"),
        },
        None => println!("  Archive:      disabled"),
    }

    if config.has_api_key() {
        println!("\n  ✅ API key configured");
    } else {
        println!("\n  ⚠️  No API key — set CAMPANILE_API_KEY or GEMINI_API_KEY");
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — run `campanile init` first");
    }

    Ok(())
}
