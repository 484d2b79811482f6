// Entity keys - Stable identity for a (site, tank) pair
use super::reading::TankReading;
use std::fmt;
use uuid::Uuid;

const ANONYMOUS_PREFIX: &str = "anon-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    value: String,
    stable: bool,
}

impl EntityKey {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// False when the tank had no identifying field and got a random key.
    /// Such keys never match across refresh cycles.
    pub fn is_stable(&self) -> bool {
        self.stable
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Derive the cache key for a tank within its site.
///
/// Tank identity falls through id, code and display name. Empty strings are
/// valid components here; only a fully absent identity gets a random key.
pub fn key_of(site_id: &str, tank: &TankReading) -> EntityKey {
    let identity = [&tank.tank_id, &tank.code, &tank.display_name]
        .into_iter()
        .flatten()
        .next();

    match identity {
        Some(tank_part) => EntityKey {
            value: format!("{}::{}", site_id, tank_part),
            stable: true,
        },
        None => {
            let value = format!("{}::{}{}", site_id, ANONYMOUS_PREFIX, Uuid::new_v4());
            tracing::debug!(site = site_id, key = %value, "tank has no stable identity");
            EntityKey {
                value,
                stable: false,
            }
        }
    }
}
