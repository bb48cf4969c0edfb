use anyhow::Result;
use relpack::release::single_target_platform;
use relpack::{resolve_dependencies, Config, Package, PackageStore};
use std::path::PathBuf;

pub fn run(input: PathBuf, packages: Option<PathBuf>, config: &Config) -> Result<()> {
    let package = Package::open(&input)?;
    let target = single_target_platform(&package, &input)?;
    let store = PackageStore::from_config(packages.as_deref(), &config.store);
    let resolved = resolve_dependencies(&package, &target, &store, &config.resolver)?;

    println!();
    println!("{}", package.full_name());
    println!("  Target platform: {}", target);
    println!();

    if resolved.is_empty() {
        println!("  No dependencies");
    } else {
        println!("  Dependencies ({}):", resolved.len());
        for dep in &resolved {
            println!("    {} {}  ({})", dep.id(), dep.version(), dep.path().display());
        }
    }
    println!();

    Ok(())
}
