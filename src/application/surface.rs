// Card surface - The retained UI the render cache patches
use crate::domain::key::EntityKey;
use crate::domain::normalize::parse_timestamp;
use crate::domain::reading::TankReading;
use crate::domain::summary::{format_liters, format_temperature};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Debug;
use thiserror::Error;

/// Every field of a card that can change between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CardField {
    FillHeight,
    PercentLabel,
    Color,
    Name,
    Product,
    Tier,
    TierColor,
    VolumeText,
    CapacityText,
    Temperature,
    TankRef,
    LastReading,
}

impl CardField {
    pub const ALL: [CardField; 12] = [
        CardField::FillHeight,
        CardField::PercentLabel,
        CardField::Color,
        CardField::Name,
        CardField::Product,
        CardField::Tier,
        CardField::TierColor,
        CardField::VolumeText,
        CardField::CapacityText,
        CardField::Temperature,
        CardField::TankRef,
        CardField::LastReading,
    ];
}

/// Rendered text for every field of one card.
///
/// Comparison happens on rendered text, so changes below display precision
/// never cause a write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardValues(BTreeMap<CardField, String>);

impl CardValues {
    pub fn from_reading(tank: &TankReading) -> Self {
        let pct = tank.percentage();
        let tier = tank.tier();
        let tank_ref = [&tank.tank_id, &tank.code, &tank.display_name]
            .into_iter()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_default();
        let last_reading = match tank.last_reading.as_deref() {
            Some(raw) => parse_timestamp(raw)
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| raw.to_string()),
            None => "—".to_string(),
        };

        let mut values = BTreeMap::new();
        values.insert(CardField::FillHeight, format!("{:.1}%", pct));
        values.insert(CardField::PercentLabel, format!("{:.0}%", pct));
        values.insert(CardField::Color, tank.color().to_string());
        values.insert(CardField::Name, tank.title());
        values.insert(CardField::Product, tank.product_name.clone().unwrap_or_default());
        values.insert(CardField::Tier, tier.label().to_string());
        values.insert(CardField::TierColor, tier.color().to_string());
        values.insert(CardField::VolumeText, format!("{} L", format_liters(tank.volume_liters)));
        values.insert(CardField::CapacityText, format!("{} L", format_liters(tank.capacity_liters)));
        values.insert(CardField::Temperature, format_temperature(tank.temperature_c));
        values.insert(CardField::TankRef, tank_ref);
        values.insert(CardField::LastReading, last_reading);
        Self(values)
    }

    pub fn get(&self, field: CardField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: CardField, value: String) {
        self.0.insert(field, value);
    }

    /// Fields whose value differs from `previous`, including ones never written.
    pub fn changed_since<'a>(&'a self, previous: &'a CardValues) -> impl Iterator<Item = (CardField, &'a str)> + 'a {
        self.0
            .iter()
            .filter(move |(field, value)| previous.get(**field) != Some(value.as_str()))
            .map(|(field, value)| (*field, value.as_str()))
    }
}

/// Line shown above the card grid.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusLine {
    Loading,
    Ready {
        summary: String,
        refreshed_at: DateTime<Utc>,
    },
    Failed {
        message: String,
        last_success: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("card {0} is not on the surface")]
    MissingCard(String),

    #[error("section {0} is not on the surface")]
    MissingSection(String),

    #[error("surface rejected {field:?}: {reason}")]
    Rejected { field: CardField, reason: String },
}

/// A retained UI: sections per site holding one card per tank.
///
/// Implementations only apply what they are told; deciding what changed is
/// the render cache's job.
pub trait CardSurface: Send {
    type Handle: Clone + Debug + Send;

    /// Create the section if missing, or retitle it if the heading changed.
    fn ensure_section(&mut self, section_id: &str, heading: &str) -> Result<(), RenderError>;

    /// Create an empty card at the end of a section.
    fn create_card(&mut self, section_id: &str, key: &EntityKey) -> Result<Self::Handle, RenderError>;

    fn write_field(
        &mut self,
        handle: &Self::Handle,
        field: CardField,
        value: &str,
    ) -> Result<(), RenderError>;

    fn remove_card(&mut self, handle: &Self::Handle);

    fn remove_section(&mut self, section_id: &str);

    fn set_status(&mut self, status: &StatusLine);
}
