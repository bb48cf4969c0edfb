//! Release command - turn an application package into a release package

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use relpack::{Config, ReleasePackage};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    packages: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input package does not exist: {}", input.display());
    }

    println!("Creating release package...");
    println!();

    let mut release = ReleasePackage::new(&input, false);
    let suggested = release
        .suggested_release_file_name()
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let output_path = match output {
        Some(out) if out.is_dir() => out.join(&suggested),
        Some(out) => out,
        None => input
            .parent()
            .map(|dir| dir.join(&suggested))
            .unwrap_or_else(|| PathBuf::from(&suggested)),
    };

    println!("  Input: {}", input.display());
    if let Some(dir) = packages.as_ref().or(config.store.packages_dir.as_ref()) {
        println!("  Packages: {}", dir.display());
    }
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message("Resolving dependencies and building archive...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let created = release.create_release_package_with_config(
        &output_path,
        packages.as_deref(),
        None,
        config,
    );
    spinner.finish_and_clear();
    let created = created?;

    let size = fs::metadata(&created)?.len();
    let checksum = calculate_checksum(&created)?;

    println!("✓ Release package created");
    println!();
    println!("  File: {}", created.display());
    println!("  Size: {}", format_size(size));
    println!("  SHA256: {}", checksum);
    println!();

    Ok(())
}

fn calculate_checksum(file_path: &Path) -> Result<String> {
    let mut file = File::open(file_path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    let hash = hasher.finalize();
    Ok(format!("{:x}", hash))
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
