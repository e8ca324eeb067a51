//! Status command implementation

use anyhow::Result;

use slerfhub::DefinitionKind;
use slerfhub::config::Config;
use slerfhub::tracker::Tracker;
use slerfhub::wallet::WalletProvider;

/// Show profile, stats, stakes and current-period progress for a wallet.
///
/// Like opening the rewards page, this registers the wallet and
/// initializes its records if needed.
pub fn status_command(config: &Config, provider: &dyn WalletProvider) -> Result<()> {
    let wallet = provider.resolve(None)?;
    let tracker = Tracker::from_config(config)?;

    let user = tracker.user(&wallet)?;
    let stats = tracker.stats(&wallet)?;

    println!("Wallet:   {} ({})", user.wallet_address, wallet.chain());
    println!("Tier:     {}", user.tier.as_str());
    println!("Balance:  {} $SLERF (earned {})", user.balance, user.total_earned);
    println!("Staked:   {} $SLERF", stats.staked);
    println!("Referral: {}", user.referral_code);
    println!("Trivia:   {}/{} correct", stats.trivia_correct, stats.trivia_total);
    println!();

    for kind in [DefinitionKind::Mission, DefinitionKind::Quest] {
        let progress = tracker.progress(&wallet, kind)?;
        println!("{}s ({}):\n", kind.label(), progress.len());
        for tracked in progress {
            let record = &tracked.record;
            println!(
                "  #{} [{}] {} {}/{} ({:.0}%) - {} $SLERF",
                record.id,
                record.state(),
                tracked.definition.title,
                record.progress,
                record.progress_max,
                record.ratio() * 100.0,
                tracked.definition.reward
            );
        }
        println!();
    }

    let stakes = tracker.stakes(&wallet)?;
    if !stakes.is_empty() {
        println!("Stakes ({}):\n", stakes.len());
        for tracked in stakes {
            println!(
                "  #{} {} {} $SLERF @ {}% - {} pending",
                tracked.stake.id,
                tracked.vault.name,
                tracked.stake.amount,
                tracked.vault.apr,
                tracked.pending_rewards
            );
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slerfhub::tracker::TrackerDb;
    use slerfhub::wallet::{StaticWalletProvider, WalletAddress};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_status_registers_the_static_wallet() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rewards.db");
        let mut config = Config::default();
        config.tracker.database = Some(db_path.clone());

        let wallet =
            WalletAddress::parse("7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV").unwrap();
        status_command(&config, &StaticWalletProvider::new(wallet.clone())).unwrap();

        let store = slerfhub::tracker::SqliteStore::new(TrackerDb::open(&db_path).unwrap());
        let tracker = Tracker::new(Arc::new(store));
        let missions = tracker.progress(&wallet, DefinitionKind::Mission).unwrap();
        assert_eq!(missions.len(), 3);
        assert_eq!(tracker.vaults().unwrap().len(), 3);
    }
}
