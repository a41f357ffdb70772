//! `ragchat doctor` — Diagnose configuration, backend, and knowledge.

use ragchat_config::ChatConfig;
use ragchat_core::Provider;
use ragchat_knowledge::KnowledgeStore;

use super::Overrides;

pub async fn run(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 ragchat Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = overrides.config_path();
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ℹ️  No config file at {}, using defaults", config_path.display());
    }

    let config = match overrides.resolve() {
        Ok(config) => {
            println!("  ✅ Settings valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Fix the configuration before running other checks.");
            return Ok(());
        }
    };

    println!("     Server:       {}", config.ollama_base_url);
    println!("     Model:        {}", config.model_name);
    println!("     Temperature:  {}", config.temperature);
    println!("     Max tokens:   {}", config.max_tokens);
    println!("     Memory:       {} exchanges", config.conversation_memory_limit);
    println!();

    issues += check_backend(&config).await;
    issues += check_knowledge(&config);

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

async fn check_backend(config: &ChatConfig) -> usize {
    let provider = match ragchat_providers::build_from_config(config) {
        Ok(provider) => provider,
        Err(e) => {
            println!("  ❌ {e}");
            return 1;
        }
    };

    let mut issues = 0;
    match provider.list_models().await {
        Ok(models) if models.is_empty() => {
            println!("  ⚠️  Ollama reports no installed models");
            issues += 1;
        }
        Ok(models) => {
            let wanted = &config.model_name;
            let installed = models
                .iter()
                .any(|m| m == wanted || m.split_once(':').is_some_and(|(base, _)| base == wanted));
            if installed {
                println!("  ✅ Model '{wanted}' installed");
            } else {
                println!("  ⚠️  Model '{wanted}' not installed — run `ollama pull {wanted}`");
                println!("     Available: {}", models.join(", "));
                issues += 1;
            }
        }
        Err(e) => {
            println!("  ❌ Could not list models: {e}");
            issues += 1;
        }
    }

    if provider.health_check().await {
        println!("  ✅ Model responds to prompts");
    } else {
        println!("  ❌ Model did not answer a test prompt — is `ollama serve` running?");
        issues += 1;
    }

    issues
}

fn check_knowledge(config: &ChatConfig) -> usize {
    if !config.rag.enabled {
        println!("  ℹ️  Knowledge retrieval disabled");
        return 0;
    }

    let path = &config.rag.knowledge_file;
    if !path.exists() {
        println!(
            "  ℹ️  No knowledge file at {}; a starter file is created on first chat",
            path.display()
        );
        return 0;
    }

    match KnowledgeStore::open(path) {
        Ok(store) => {
            let stats = store.stats();
            println!(
                "  ✅ Knowledge file valid ({} entries, {} categories)",
                stats.total_entries, stats.total_categories
            );
            0
        }
        Err(e) => {
            println!("  ❌ {e}");
            1
        }
    }
}
