//! `ragchat knowledge` — Knowledge base summary.

use ragchat_config::ChatConfig;

use super::{build_session, print_knowledge_stats};

pub async fn run(config: ChatConfig) -> Result<(), Box<dyn std::error::Error>> {
    let session = build_session(config)?;

    println!("📚 Knowledge Base");
    println!("=================");
    println!();
    print_knowledge_stats(&session.knowledge_stats());

    Ok(())
}
