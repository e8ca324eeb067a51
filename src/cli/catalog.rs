//! Catalog command implementation

use anyhow::{Result, bail};

use slerfhub::DefinitionKind;
use slerfhub::config::Config;
use slerfhub::tracker::Tracker;

/// List catalog definitions, optionally filtered by kind.
/// Vaults are listed when no kind is given.
pub fn catalog_command(config: &Config, kind: Option<String>) -> Result<()> {
    let kinds = match kind.as_deref() {
        None => vec![DefinitionKind::Mission, DefinitionKind::Quest],
        Some(raw) => match DefinitionKind::from_str(&raw.to_lowercase()) {
            Some(kind) => vec![kind],
            None => bail!("Unknown kind: {} (expected \"mission\" or \"quest\")", raw),
        },
    };

    let tracker = Tracker::from_config(config)?;

    for kind in kinds {
        let definitions = tracker.definitions(kind)?;
        println!("{}s ({}):\n", kind.label(), definitions.len());

        for def in definitions {
            let status = if def.active { "" } else { " [inactive]" };
            println!(
                "  #{} {} - {} $SLERF ({} x{}){}",
                def.id,
                def.title,
                def.reward,
                def.requirement.kind_name(),
                def.progress_max(),
                status
            );
            if !def.description.is_empty() {
                println!("    {}", def.description);
            }
        }
        println!();
    }

    if kind.is_none() {
        let vaults = tracker.vaults()?;
        println!("Vaults ({}):\n", vaults.len());
        for vault in vaults {
            println!(
                "  #{} {} - {}% APR, min {} $SLERF",
                vault.id, vault.name, vault.apr, vault.min_stake
            );
        }
        println!();
    }

    Ok(())
}
