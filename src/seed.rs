//! Sample data loader
//!
//! Setup-time tooling, runs before the app starts serving and only when `SEED_USERNAME` is set

use anyhow::Result;
use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use chrono::SubsecRound;
use chrono::TimeDelta;
use chrono::Utc;
use uuid::Uuid;

use crate::notes::Note;
use crate::notes::PageRequest;
use crate::notes::Priority;
use crate::password::generate;
use crate::password::hash;
use crate::storage::CreateUserValues;
use crate::storage::Storage;
use crate::users::User;
use crate::utils::env_var;
use crate::utils::env_var_or_else;

/// Age of the sample notes at the moment of seeding
const SAMPLE_NOTE_AGES: [TimeDelta; 10] = [
    TimeDelta::days(12),
    TimeDelta::days(11),
    TimeDelta::days(4),
    TimeDelta::days(3),
    TimeDelta::hours(12),
    TimeDelta::hours(8),
    TimeDelta::hours(6),
    TimeDelta::hours(4),
    TimeDelta::hours(2),
    TimeDelta::zero(),
];

/// Pick any priority
fn random_priority() -> Priority {
    let index = OsRng.next_u32() as usize % Priority::ALL.len();

    Priority::ALL[index]
}

/// Seed a user with sample notes
///
/// The user is created when missing, notes are only added when the user has no notes at all
pub async fn seed_sample_data<S: Storage>(storage: &S) -> Result<()> {
    let Some(username) = env_var("SEED_USERNAME") else {
        return Ok(());
    };

    let user = ensure_sample_user(storage, &username, || {
        env_var_or_else("SEED_PASSWORD", || {
            let seed_password = generate();
            tracing::info!("`SEED_PASSWORD` not set, generating new password: {seed_password}");
            seed_password
        })
    })
    .await?;

    let inserted = insert_sample_notes(storage, &user).await?;
    if inserted == 0 {
        tracing::info!("Sample user {username} already has notes, skipping sample notes");
    } else {
        tracing::info!("Created {inserted} sample notes for {username}");
    }

    Ok(())
}

/// Find the sample user, or create it with the password from `password`
async fn ensure_sample_user<S, P>(storage: &S, username: &str, password: P) -> Result<User>
where
    S: Storage,
    P: FnOnce() -> String,
{
    if let Some(user) = storage.find_single_user_by_username(username).await? {
        return Ok(user);
    }

    let hashed_password = hash(&password()).map_err(|err| anyhow!("{err}"))?;

    let values = CreateUserValues {
        username,
        hashed_password: &hashed_password,
    };

    let user = storage.create_user(&values).await?;
    tracing::info!("Created sample user: {username}");

    Ok(user)
}

/// Add the sample notes for a user without any active notes
///
/// Returns the number of notes added
async fn insert_sample_notes<S: Storage>(storage: &S, user: &User) -> Result<usize> {
    let owner_id = user.owner_id();

    let existing = storage
        .find_page_of_active_notes(&owner_id, &PageRequest::of(0))
        .await?;
    if !existing.items.is_empty() {
        return Ok(0);
    }

    let now = Utc::now().naive_utc().trunc_subsecs(6);

    for (index, age) in SAMPLE_NOTE_AGES.iter().enumerate() {
        let created_at = now - *age;

        let note = Note {
            id: Uuid::new_v4(),
            owner_id: owner_id.clone(),
            title: format!("Sample note {}", index + 1),
            content: format!("Content {}", index + 1),
            priority: random_priority(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };

        storage.save_note(&note).await?;
    }

    Ok(SAMPLE_NOTE_AGES.len())
}
