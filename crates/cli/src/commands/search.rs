//! `ragchat search` — Query the knowledge base without chatting.

use ragchat_config::ChatConfig;

use super::{build_session, print_results};

pub async fn run(config: ChatConfig, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = build_session(config)?;

    if !session.knowledge().is_enabled() {
        println!("  Knowledge retrieval is disabled");
        return Ok(());
    }

    print_results(query, &session.search(query));
    Ok(())
}
