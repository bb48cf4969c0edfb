use anyhow::Result;
use relpack::Config;
use std::path::Path;

pub fn run(action: &crate::ConfigAction, config: Config) -> Result<()> {
    use crate::ConfigAction;

    match action {
        ConfigAction::Show => show_config(&config),
        ConfigAction::Set { key, value } => set_config(config, key, value),
    }
}

fn show_config(config: &Config) -> Result<()> {
    let config_path = Config::default_path()?;

    println!();
    println!("relpack configuration");
    println!("  Config file: {}", config_path.display());
    println!();

    println!("[store]");
    println!("  packages_dir   = {}", format_path(config.store.packages_dir.as_deref()));
    println!("  machine_cache  = {}", format_path(config.store.machine_cache.as_deref()));
    println!("  selection      = {}", config.store.selection);
    println!();

    println!("[resolver]");
    println!("  max_depth      = {}", config.resolver.max_depth);
    println!();

    println!("[policy]");
    println!("  denied_platforms = {}", config.policy.denied_platforms.join(", "));
    println!("  oldest_runtime   = {}", config.policy.oldest_runtime);
    println!();

    println!("[log]");
    println!("  level          = {}", config.log.level);
    println!();

    println!("Modify settings:");
    println!("   relpack config set <key> <value>");
    println!();
    print_available_keys();

    Ok(())
}

fn set_config(mut config: Config, key: &str, value: &str) -> Result<()> {
    if let Err(e) = config.set(key, value) {
        eprintln!();
        print_available_keys();
        return Err(e.into());
    }

    config.save()?;
    println!("✓ {} = \"{}\"", key, value);
    println!("Configuration saved to {}", Config::default_path()?.display());

    Ok(())
}

fn print_available_keys() {
    println!("   Available keys:");
    for key in [
        "store.packages_dir",
        "store.machine_cache",
        "store.selection (first-match | highest-version)",
        "resolver.max_depth",
        "policy.denied_platforms (comma separated)",
        "policy.oldest_runtime",
        "log.level",
    ] {
        println!("     • {}", key);
    }
    println!();
}

fn format_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}
