// Retained HTML surface - The card document served by the dashboard
use crate::application::surface::{CardField, CardSurface, RenderError, StatusLine};
use crate::domain::key::EntityKey;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Write;

const WRITE_LOG_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardId(u64);

#[derive(Debug, Clone, PartialEq)]
struct Card {
    key: String,
    section_id: String,
    fields: BTreeMap<CardField, String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Section {
    id: String,
    heading: String,
    cards: Vec<CardId>,
}

/// One field write, kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub key: String,
    pub field: CardField,
}

/// In-memory card document. Cards keep their position across refreshes;
/// only the fields they are told about change.
#[derive(Debug)]
pub struct HtmlSurface {
    sections: Vec<Section>,
    cards: HashMap<CardId, Card>,
    next_id: u64,
    status: StatusLine,
    write_log: VecDeque<WriteRecord>,
    total_writes: u64,
}

impl Default for HtmlSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            cards: HashMap::new(),
            next_id: 0,
            status: StatusLine::Loading,
            write_log: VecDeque::new(),
            total_writes: 0,
        }
    }

    pub fn total_writes(&self) -> u64 {
        self.total_writes
    }

    /// Most recent field writes, oldest first. Clears the log.
    pub fn take_write_log(&mut self) -> Vec<WriteRecord> {
        self.write_log.drain(..).collect()
    }

    /// Site sections with their cards, or an explicit "no data" block.
    pub fn render_cards(&self) -> String {
        if self.cards.is_empty() {
            return r#"<p class="empty">No data</p>"#.to_string();
        }

        let mut html = String::new();
        for section in &self.sections {
            let _ = write!(
                html,
                r#"<section class="site" data-site="{}"><h2>{}</h2><div class="grid">"#,
                escape(&section.id),
                escape(&section.heading)
            );
            for card in section.cards.iter().filter_map(|id| self.cards.get(id)) {
                render_card(&mut html, card);
            }
            html.push_str("</div></section>");
        }
        html
    }

    pub fn render_status(&self) -> String {
        match &self.status {
            StatusLine::Loading => r#"<div class="status loading">Loading…</div>"#.to_string(),
            StatusLine::Ready {
                summary,
                refreshed_at,
            } => format!(
                r#"<div class="status ok">{} <span class="muted">· updated {}</span></div>"#,
                escape(summary),
                refreshed_at.format("%H:%M:%S")
            ),
            StatusLine::Failed {
                message,
                last_success,
            } => {
                let since = match last_success {
                    Some(at) => format!(" · showing data from {}", at.format("%H:%M:%S")),
                    None => " · no data".to_string(),
                };
                format!(
                    r#"<div class="status error" role="alert">{}{}</div>"#,
                    escape(message),
                    since
                )
            }
        }
    }

    fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }
}

fn render_card(html: &mut String, card: &Card) {
    let field = |f: CardField| card.fields.get(&f).map(String::as_str).unwrap_or("");
    let history_href = format!(
        "/sites/{}/tanks/{}/history",
        urlencoding::encode(&card.section_id),
        urlencoding::encode(field(CardField::TankRef))
    );
    let _ = write!(
        html,
        concat!(
            r#"<article class="card" data-key="{key}" style="--fill:{color}">"#,
            r#"<div class="tank"><div class="liquid" style="height:{fill}"></div>"#,
            r#"<div class="pct">{pct}</div></div>"#,
            r#"<div class="info"><h3><a href="{href}">{name}</a></h3>"#,
            r#"<span class="tier" style="--dot:{tier_color}">{tier}</span>"#,
            r#"<dl><dt>Product</dt><dd>{product}</dd>"#,
            r#"<dt>Capacity</dt><dd>{capacity}</dd>"#,
            r#"<dt>Stock</dt><dd>{volume}</dd>"#,
            r#"<dt>Temp</dt><dd>{temp}</dd>"#,
            r#"<dt>Read</dt><dd>{read}</dd></dl></div></article>"#
        ),
        key = escape(&card.key),
        color = escape(field(CardField::Color)),
        fill = escape(field(CardField::FillHeight)),
        pct = escape(field(CardField::PercentLabel)),
        href = escape(&history_href),
        name = escape(field(CardField::Name)),
        tier_color = escape(field(CardField::TierColor)),
        tier = escape(field(CardField::Tier)),
        product = escape(field(CardField::Product)),
        capacity = escape(field(CardField::CapacityText)),
        volume = escape(field(CardField::VolumeText)),
        temp = escape(field(CardField::Temperature)),
        read = escape(field(CardField::LastReading)),
    );
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl CardSurface for HtmlSurface {
    type Handle = CardId;

    fn ensure_section(&mut self, section_id: &str, heading: &str) -> Result<(), RenderError> {
        match self.section_mut(section_id) {
            Some(section) => section.heading = heading.to_string(),
            None => self.sections.push(Section {
                id: section_id.to_string(),
                heading: heading.to_string(),
                cards: Vec::new(),
            }),
        }
        Ok(())
    }

    fn create_card(&mut self, section_id: &str, key: &EntityKey) -> Result<CardId, RenderError> {
        let id = CardId(self.next_id);
        let section = self
            .section_mut(section_id)
            .ok_or_else(|| RenderError::MissingSection(section_id.to_string()))?;
        section.cards.push(id);
        self.next_id += 1;
        self.cards.insert(
            id,
            Card {
                key: key.to_string(),
                section_id: section_id.to_string(),
                fields: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    fn write_field(&mut self, handle: &CardId, field: CardField, value: &str) -> Result<(), RenderError> {
        let card = self
            .cards
            .get_mut(handle)
            .ok_or_else(|| RenderError::MissingCard(format!("{:?}", handle)))?;
        card.fields.insert(field, value.to_string());
        self.total_writes += 1;
        if self.write_log.len() == WRITE_LOG_CAPACITY {
            self.write_log.pop_front();
        }
        self.write_log.push_back(WriteRecord {
            key: card.key.clone(),
            field,
        });
        Ok(())
    }

    fn remove_card(&mut self, handle: &CardId) {
        if let Some(card) = self.cards.remove(handle) {
            if let Some(section) = self.section_mut(&card.section_id) {
                section.cards.retain(|id| id != handle);
            }
        }
    }

    fn remove_section(&mut self, section_id: &str) {
        let removed: Vec<CardId> = self
            .sections
            .iter()
            .filter(|s| s.id == section_id)
            .flat_map(|s| s.cards.iter().copied())
            .collect();
        for id in removed {
            self.cards.remove(&id);
        }
        self.sections.retain(|s| s.id != section_id);
    }

    fn set_status(&mut self, status: &StatusLine) {
        self.status = status.clone();
    }
}
