//! `ragchat config` — Show the effective or default configuration.

use ragchat_config::ChatConfig;

use super::Overrides;

pub async fn run(overrides: &Overrides, defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if defaults {
        print!("{}", ChatConfig::default_toml());
        return Ok(());
    }

    let config = overrides.resolve()?;
    println!("# {}", overrides.config_path().display());
    print!("{}", config.to_toml());
    Ok(())
}
