// Incremental render cache - Keyed card handles patched field by field
use crate::application::surface::{CardSurface, CardValues, RenderError, StatusLine};
use crate::domain::key::{EntityKey, key_of};
use crate::domain::reading::{SiteGroup, TankReading};
use std::collections::{HashMap, HashSet};

/// Retained card for one key plus the values last written to it.
#[derive(Debug)]
pub struct ViewHandle<H> {
    pub handle: H,
    pub section_id: String,
    pub last_known: CardValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { writes: usize },
    Updated { writes: usize },
    Unchanged,
}

#[derive(Debug)]
pub struct RenderFailure {
    pub key: EntityKey,
    pub error: RenderError,
}

#[derive(Debug, Default)]
pub struct RenderReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub evicted: usize,
    pub field_writes: usize,
    pub unstable_keys: usize,
    pub duplicate_keys: usize,
    pub failures: Vec<RenderFailure>,
}

pub struct RenderCache<S: CardSurface> {
    surface: S,
    entries: HashMap<EntityKey, ViewHandle<S::Handle>>,
    sections: HashMap<String, String>,
}

impl<S: CardSurface> RenderCache<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            entries: HashMap::new(),
            sections: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_status(&mut self, status: &StatusLine) {
        self.surface.set_status(status);
    }

    /// Create or reuse the card for `tank` and write only the fields that changed.
    pub fn upsert(
        &mut self,
        site: &SiteGroup,
        tank: &TankReading,
    ) -> Result<(EntityKey, UpsertOutcome), RenderError> {
        let key = key_of(&site.site_id, tank);
        let outcome = self.upsert_keyed(&key, site, tank)?;
        Ok((key, outcome))
    }

    fn upsert_keyed(
        &mut self,
        key: &EntityKey,
        site: &SiteGroup,
        tank: &TankReading,
    ) -> Result<UpsertOutcome, RenderError> {
        self.ensure_section(site)?;

        let created = !self.entries.contains_key(key);
        if created {
            let handle = self.surface.create_card(&site.site_id, key)?;
            self.entries.insert(
                key.clone(),
                ViewHandle {
                    handle,
                    section_id: site.site_id.clone(),
                    last_known: CardValues::default(),
                },
            );
        }

        let Some(entry) = self.entries.get_mut(key) else {
            return Err(RenderError::MissingCard(key.to_string()));
        };

        let next = CardValues::from_reading(tank);
        let changes: Vec<(_, String)> = next
            .changed_since(&entry.last_known)
            .map(|(field, value)| (field, value.to_string()))
            .collect();

        let mut writes = 0;
        for (field, value) in changes {
            self.surface.write_field(&entry.handle, field, &value)?;
            entry.last_known.set(field, value);
            writes += 1;
        }

        tracing::trace!(key = %key, created, writes, "card upserted");
        Ok(match (created, writes) {
            (true, _) => UpsertOutcome::Created { writes },
            (false, 0) => UpsertOutcome::Unchanged,
            (false, _) => UpsertOutcome::Updated { writes },
        })
    }

    fn ensure_section(&mut self, site: &SiteGroup) -> Result<(), RenderError> {
        let heading = site.heading();
        if self.sections.get(&site.site_id) != Some(&heading) {
            self.surface.ensure_section(&site.site_id, &heading)?;
            self.sections.insert(site.site_id.clone(), heading);
        }
        Ok(())
    }

    /// Apply a full snapshot: upsert every tank, then evict every key the
    /// snapshot no longer contains. Existing cards stay in place.
    pub fn render_all(&mut self, groups: &[SiteGroup]) -> RenderReport {
        let mut report = RenderReport::default();
        let mut seen: HashSet<EntityKey> = HashSet::new();

        for site in groups {
            for tank in &site.tanks {
                let key = key_of(&site.site_id, tank);
                if !key.is_stable() {
                    report.unstable_keys += 1;
                }
                if !seen.insert(key.clone()) {
                    report.duplicate_keys += 1;
                    tracing::warn!(key = %key, "duplicate key in snapshot, later reading wins");
                }

                match self.upsert_keyed(&key, site, tank) {
                    Ok(UpsertOutcome::Created { writes }) => {
                        report.created += 1;
                        report.field_writes += writes;
                    }
                    Ok(UpsertOutcome::Updated { writes }) => {
                        report.updated += 1;
                        report.field_writes += writes;
                    }
                    Ok(UpsertOutcome::Unchanged) => report.unchanged += 1,
                    Err(error) => {
                        tracing::warn!(key = %key, "card render failed: {}", error);
                        report.failures.push(RenderFailure { key, error });
                    }
                }
            }
        }

        report.evicted = self.evict_missing(&seen);

        tracing::debug!(
            "render pass: {} created, {} updated, {} unchanged, {} evicted, {} writes, {} failed",
            report.created,
            report.updated,
            report.unchanged,
            report.evicted,
            report.field_writes,
            report.failures.len()
        );
        report
    }

    fn evict_missing(&mut self, seen: &HashSet<EntityKey>) -> usize {
        let stale: Vec<EntityKey> = self
            .entries
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();

        for key in &stale {
            if let Some(entry) = self.entries.remove(key) {
                self.surface.remove_card(&entry.handle);
                tracing::trace!(key = %key, "card evicted");
            }
        }

        let occupied: HashSet<&str> = self
            .entries
            .values()
            .map(|entry| entry.section_id.as_str())
            .collect();
        let empty_sections: Vec<String> = self
            .sections
            .keys()
            .filter(|id| !occupied.contains(id.as_str()))
            .cloned()
            .collect();
        for section_id in empty_sections {
            self.surface.remove_section(&section_id);
            self.sections.remove(&section_id);
        }

        stale.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::surface::CardField;
    use crate::domain::reading::fixtures::tank;
    use crate::domain::reading::group_by_site;

    /// Surface that records every call, with optional injected failures.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub next_id: u64,
        pub cards: HashMap<u64, (String, HashMap<CardField, String>)>,
        pub sections: Vec<String>,
        pub writes: Vec<(String, CardField)>,
        pub fail_keys: HashSet<String>,
        pub status: Option<StatusLine>,
    }

    impl RecordingSurface {
        pub fn take_writes(&mut self) -> Vec<(String, CardField)> {
            std::mem::take(&mut self.writes)
        }
    }

    impl CardSurface for RecordingSurface {
        type Handle = u64;

        fn ensure_section(&mut self, section_id: &str, _heading: &str) -> Result<(), RenderError> {
            if !self.sections.iter().any(|s| s == section_id) {
                self.sections.push(section_id.to_string());
            }
            Ok(())
        }

        fn create_card(&mut self, _section_id: &str, key: &EntityKey) -> Result<u64, RenderError> {
            self.next_id += 1;
            self.cards.insert(self.next_id, (key.to_string(), HashMap::new()));
            Ok(self.next_id)
        }

        fn write_field(&mut self, handle: &u64, field: CardField, value: &str) -> Result<(), RenderError> {
            let (key, fields) = self
                .cards
                .get_mut(handle)
                .ok_or_else(|| RenderError::MissingCard(handle.to_string()))?;
            if self.fail_keys.contains(key.as_str()) {
                return Err(RenderError::Rejected {
                    field,
                    reason: "injected".to_string(),
                });
            }
            fields.insert(field, value.to_string());
            self.writes.push((key.clone(), field));
            Ok(())
        }

        fn remove_card(&mut self, handle: &u64) {
            self.cards.remove(handle);
        }

        fn remove_section(&mut self, section_id: &str) {
            self.sections.retain(|s| s != section_id);
        }

        fn set_status(&mut self, status: &StatusLine) {
            self.status = Some(status.clone());
        }
    }

    fn cache() -> RenderCache<RecordingSurface> {
        RenderCache::new(RecordingSurface::default())
    }

    fn site(id: &str) -> SiteGroup {
        SiteGroup {
            site_id: id.to_string(),
            site_name: None,
            tanks: vec![],
        }
    }

    #[test]
    fn test_first_upsert_paints_every_field() {
        let mut cache = cache();
        let (key, outcome) = cache.upsert(&site("ALM1"), &tank("ALM1", "T1", 41_000.0, 50_000.0)).unwrap();
        assert_eq!(key.as_str(), "ALM1::T1");
        assert_eq!(outcome, UpsertOutcome::Created { writes: CardField::ALL.len() });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unchanged_upsert_writes_nothing() {
        let mut cache = cache();
        let reading = tank("ALM1", "T1", 41_000.0, 50_000.0);
        cache.upsert(&site("ALM1"), &reading).unwrap();
        cache.surface.take_writes();

        let (_, outcome) = cache.upsert(&site("ALM1"), &reading).unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged);
        assert!(cache.surface.take_writes().is_empty());
    }

    #[test]
    fn test_level_change_only_touches_level_fields() {
        let mut cache = cache();
        cache.upsert(&site("ALM1"), &tank("ALM1", "T1", 19_000.0, 50_000.0)).unwrap();
        cache.surface.take_writes();

        let (_, outcome) = cache.upsert(&site("ALM1"), &tank("ALM1", "T1", 35_500.0, 50_000.0)).unwrap();
        let written: HashSet<CardField> = cache.surface.take_writes().into_iter().map(|(_, f)| f).collect();

        assert!(written.contains(&CardField::FillHeight));
        assert!(written.contains(&CardField::PercentLabel));
        assert!(!written.contains(&CardField::Name));
        assert!(!written.contains(&CardField::Color));
        assert!(!written.contains(&CardField::CapacityText));
        // 38% -> 71% also crosses Medium -> High and changes the volume text
        let expected: HashSet<CardField> = [
            CardField::FillHeight,
            CardField::PercentLabel,
            CardField::Tier,
            CardField::TierColor,
            CardField::VolumeText,
        ]
        .into_iter()
        .collect();
        assert_eq!(written, expected);
        assert_eq!(outcome, UpsertOutcome::Updated { writes: 5 });
    }

    #[test]
    fn test_render_all_evicts_missing_entities() {
        let mut cache = cache();
        let a = group_by_site(vec![
            tank("ALM1", "T1", 1.0, 10.0),
            tank("ALM1", "T2", 1.0, 10.0),
            tank("ALM2", "T1", 1.0, 10.0),
        ]);
        let report = cache.render_all(&a);
        assert_eq!(report.created, 3);
        assert_eq!(cache.surface.cards.len(), 3);

        let b = group_by_site(vec![tank("ALM1", "T1", 1.0, 10.0)]);
        let report = cache.render_all(&b);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.evicted, 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.surface.cards.len(), 1);
        assert_eq!(cache.surface.sections, vec!["ALM1".to_string()]);
    }

    #[test]
    fn test_reappearing_key_is_created_fresh() {
        let mut cache = cache();
        let with = group_by_site(vec![tank("A", "T1", 1.0, 10.0)]);
        cache.render_all(&with);
        cache.render_all(&[]);
        assert!(cache.is_empty());

        let report = cache.render_all(&with);
        assert_eq!(report.created, 1);
    }

    #[test]
    fn test_one_failing_card_does_not_stop_the_pass() {
        let mut cache = cache();
        cache.surface.fail_keys.insert("A::T2".to_string());
        let groups = group_by_site(vec![
            tank("A", "T1", 1.0, 10.0),
            tank("A", "T2", 1.0, 10.0),
            tank("A", "T3", 1.0, 10.0),
        ]);

        let report = cache.render_all(&groups);
        assert_eq!(report.created, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].key.as_str(), "A::T2");

        // retried on the next pass once the surface accepts it
        cache.surface.fail_keys.clear();
        let report = cache.render_all(&groups);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 2);
    }

    #[test]
    fn test_duplicate_keys_are_counted_and_last_wins() {
        let mut cache = cache();
        let groups = group_by_site(vec![
            tank("A", "T1", 1_000.0, 10_000.0),
            tank("A", "T1", 9_500.0, 10_000.0),
            tank("A", "T2", 1.0, 10.0),
        ]);

        let report = cache.render_all(&groups);
        assert_eq!(report.duplicate_keys, 1);
        assert_eq!(report.created, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(cache.len(), 2);
        let painted = cache.surface.cards.values().find(|(key, _)| key == "A::T1").unwrap();
        assert_eq!(painted.1.get(&CardField::PercentLabel).map(String::as_str), Some("95%"));
    }

    #[test]
    fn test_anonymous_tanks_never_diff() {
        let mut cache = cache();
        let mut anon = tank("A", "T1", 1.0, 10.0);
        anon.tank_id = None;
        anon.display_name = None;
        let groups = group_by_site(vec![anon]);

        cache.render_all(&groups);
        let report = cache.render_all(&groups);
        assert_eq!(report.created, 1);
        assert_eq!(report.evicted, 1);
        assert_eq!(report.unstable_keys, 1);
        assert_eq!(cache.len(), 1);
    }
}
