//! Built-in mission/quest catalog and seeding

use tracing::info;

use super::error::Result;
use super::store::ProgressStore;
use crate::domain::{DefinitionKind, NewDefinition, Requirement};

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

fn mission(
    title: &str,
    description: &str,
    reward: u64,
    icon: &str,
    requirement: Requirement,
) -> NewDefinition {
    NewDefinition {
        kind: DefinitionKind::Mission,
        title: title.to_string(),
        description: description.to_string(),
        reward,
        icon: icon.to_string(),
        requirement,
        active: true,
        expires_at: None,
    }
}

fn quest(
    title: &str,
    description: &str,
    reward: u64,
    icon: &str,
    requirement: Requirement,
    expires_at: i64,
) -> NewDefinition {
    NewDefinition {
        kind: DefinitionKind::Quest,
        title: title.to_string(),
        description: description.to_string(),
        reward,
        icon: icon.to_string(),
        requirement,
        active: true,
        expires_at: Some(expires_at),
    }
}

/// The stock catalog: three daily missions and four weekly quests.
/// Quests expire one week after `now_ms`.
pub fn default_catalog(now_ms: i64) -> Vec<NewDefinition> {
    let expires = now_ms + WEEK_MS;
    vec![
        mission(
            "Daily Check-in",
            "Visit SlerfHub daily to earn rewards",
            50,
            "ri-calendar-check-line",
            Requirement::Visit { count: 1 },
        ),
        mission(
            "Share on Twitter",
            "Post about SlerfHub with the hashtag #SlerfHub",
            100,
            "ri-twitter-x-line",
            Requirement::Social {
                platform: "twitter".into(),
                action: "post".into(),
            },
        ),
        mission(
            "Join Discord",
            "Join our Discord community and say hi",
            75,
            "ri-discord-line",
            Requirement::Social {
                platform: "discord".into(),
                action: "join".into(),
            },
        ),
        quest(
            "Stake 1000 $SLERF",
            "Stake $SLERF in our vaults for 7 days to complete this quest",
            500,
            "ri-vip-diamond-line",
            Requirement::Stake { amount: 1000 },
            expires,
        ),
        quest(
            "Refer 3 Friends",
            "Invite friends to join SlerfHub using your referral link",
            250,
            "ri-team-line",
            Requirement::Referral { count: 3 },
            expires,
        ),
        quest(
            "Win 5 Mini-Games",
            "Play and win our on-chain mini-games",
            350,
            "ri-gamepad-line",
            Requirement::Game { wins: 5 },
            expires,
        ),
        quest(
            "Mint a Slerf Booster NFT",
            "Mint your first NFT to boost your earnings",
            400,
            "ri-nft-line",
            Requirement::Mint { count: 1 },
            expires,
        ),
    ]
}

/// Insert `definitions` if the catalog is empty. Returns how many were inserted.
pub fn seed(store: &dyn ProgressStore, definitions: &[NewDefinition]) -> Result<usize> {
    if !store.definitions(None)?.is_empty() {
        return Ok(0);
    }
    for definition in definitions {
        store.insert_definition(definition)?;
    }
    info!("[slerfhub:catalog] Seeded {} definitions", definitions.len());
    Ok(definitions.len())
}
