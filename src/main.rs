use anyhow::{bail, Context};
use filereg::{logging, FileRegistry, RegistryConfig};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut names = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config requires a file path")?;
                config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("usage: filereg [--config <file.json>] <name>...");
                return Ok(());
            }
            _ => names.push(arg),
        }
    }

    if names.is_empty() {
        bail!("usage: filereg [--config <file.json>] <name>...");
    }

    let config = match &config_path {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => RegistryConfig::default(),
    };
    logging::init(config.log_level, None);

    let mut registry: FileRegistry = FileRegistry::with_config(config);
    for name in &names {
        let index = registry
            .new_file_at(name)
            .with_context(|| format!("failed to open {}", name))?;
        let record = registry.get(index)?;

        println!("{}", serde_json::to_string_pretty(&record.snapshot())?);
        log::info!("{}: {}", record.name(), record.stat());
    }

    Ok(())
}
