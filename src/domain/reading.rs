// Tank reading domain models
use super::color::{ColorSource, HexColor, color_for};
use super::level::{Tier, percentage};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    pub id: String,
    pub name: String,
}

impl Site {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }

    /// "ALM1 · Sevilla", or just the id when the name is unknown.
    pub fn label(&self) -> String {
        if self.name.is_empty() || self.name == self.id {
            self.id.clone()
        } else {
            format!("{} · {}", self.id, self.name)
        }
    }
}

/// A point-in-time reading of one tank.
///
/// Identity fields are kept exactly as received (including empty strings) so
/// the entity keyer can tell "absent" from "blank".
#[derive(Debug, Clone, PartialEq)]
pub struct TankReading {
    pub site_id: Option<String>,
    pub site_name: Option<String>,
    pub tank_id: Option<String>,
    pub code: Option<String>,
    pub display_name: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub capacity_liters: f64,
    pub volume_liters: f64,
    pub volume_15c_liters: Option<f64>,
    pub temperature_c: Option<f64>,
    pub color_source: ColorSource,
    pub last_reading: Option<String>,
}

impl TankReading {
    pub fn percentage(&self) -> f64 {
        percentage(self.volume_liters, self.capacity_liters)
    }

    pub fn tier(&self) -> Tier {
        Tier::from_percentage(self.percentage())
    }

    pub fn color(&self) -> HexColor {
        color_for(&self.color_source, self.product_name.as_deref())
    }

    /// Best label for the card title; blank fields are skipped.
    pub fn title(&self) -> String {
        let tank = [&self.display_name, &self.code, &self.tank_id]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("—");
        match self.product_name.as_deref().map(str::trim) {
            Some(product) if !product.is_empty() => format!("{} · {}", product, tank),
            _ => tank.to_string(),
        }
    }

    pub fn site_key(&self) -> String {
        self.site_id
            .clone()
            .or_else(|| self.site_name.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteGroup {
    pub site_id: String,
    pub site_name: Option<String>,
    pub tanks: Vec<TankReading>,
}

impl SiteGroup {
    pub fn heading(&self) -> String {
        match self.site_name.as_deref() {
            Some(name) if !name.trim().is_empty() && name != self.site_id => {
                format!("{} · {}", self.site_id, name.trim())
            }
            _ if self.site_id.is_empty() => "Unassigned".to_string(),
            _ => self.site_id.clone(),
        }
    }
}

/// Group readings by site, keeping first-appearance order of sites and tanks.
pub fn group_by_site(readings: Vec<TankReading>) -> Vec<SiteGroup> {
    let mut groups: Vec<SiteGroup> = Vec::new();
    for reading in readings {
        let site_id = reading.site_key();
        match groups.iter_mut().find(|g| g.site_id == site_id) {
            Some(group) => {
                if group.site_name.is_none() {
                    group.site_name = reading.site_name.clone();
                }
                group.tanks.push(reading);
            }
            None => groups.push(SiteGroup {
                site_id,
                site_name: reading.site_name.clone(),
                tanks: vec![reading],
            }),
        }
    }
    groups
}

/// One archived calibration record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalReading {
    pub timestamp: Option<DateTime<Utc>>,
    pub raw_timestamp: Option<String>,
    pub volume_liters: Option<f64>,
    pub volume_15c_liters: Option<f64>,
    pub temperature_c: Option<f64>,
}

/// The full set of readings fetched in one poll cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub groups: Vec<SiteGroup>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(groups: Vec<SiteGroup>) -> Self {
        Self {
            groups,
            fetched_at: Utc::now(),
        }
    }

    pub fn tanks(&self) -> impl Iterator<Item = &TankReading> {
        self.groups.iter().flat_map(|g| g.tanks.iter())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::tank;
    use super::*;

    #[test]
    fn test_group_by_site_keeps_order() {
        let groups = group_by_site(vec![
            tank("B", "1", 0.0, 1.0),
            tank("A", "1", 0.0, 1.0),
            tank("B", "2", 0.0, 1.0),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].site_id, "B");
        assert_eq!(groups[0].tanks.len(), 2);
        assert_eq!(groups[0].tanks[1].tank_id.as_deref(), Some("2"));
        assert_eq!(groups[1].site_id, "A");
    }

    #[test]
    fn test_title_skips_blank_fields() {
        let mut t = tank("A", "T1", 0.0, 1.0);
        t.display_name = Some("  ".to_string());
        assert_eq!(t.title(), "GASOLEO A · T1");
        t.product_name = None;
        t.tank_id = None;
        assert_eq!(t.title(), "—");
    }

    #[test]
    fn test_heading() {
        let group = SiteGroup {
            site_id: "ALM1".to_string(),
            site_name: Some("Sevilla".to_string()),
            tanks: vec![],
        };
        assert_eq!(group.heading(), "ALM1 · Sevilla");
        let unnamed = SiteGroup {
            site_id: String::new(),
            site_name: None,
            tanks: vec![],
        };
        assert_eq!(unnamed.heading(), "Unassigned");
    }
}
