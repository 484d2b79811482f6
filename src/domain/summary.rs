// Dashboard summaries - Totals shown next to the gauge grid
use super::reading::TankReading;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub tank_count: usize,
    pub total_volume_liters: f64,
    pub low_tanks: usize,
}

impl DashboardSummary {
    pub fn from_readings<'a>(readings: impl IntoIterator<Item = &'a TankReading>) -> Self {
        let mut tank_count = 0;
        let mut total_volume_liters = 0.0;
        let mut low_tanks = 0;
        for reading in readings {
            tank_count += 1;
            total_volume_liters += reading.volume_liters.max(0.0);
            if reading.tier().is_alarm() {
                low_tanks += 1;
            }
        }
        Self {
            tank_count,
            total_volume_liters,
            low_tanks,
        }
    }

    pub fn text(&self) -> String {
        let mut text = format!(
            "Tanks: {} · Total stock: {} L",
            self.tank_count,
            format_liters(self.total_volume_liters)
        );
        if self.low_tanks > 0 {
            text.push_str(&format!(" · Low: {}", self.low_tanks));
        }
        text
    }
}

/// Per-product share of the stock at reference temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub product_name: String,
    pub color: String,
    pub total_volume_15c_liters: f64,
    pub tank_count: usize,
    pub share_percent: f64,
}

pub fn product_summary<'a>(readings: impl IntoIterator<Item = &'a TankReading>) -> Vec<ProductSummary> {
    let mut products: Vec<ProductSummary> = Vec::new();

    for reading in readings {
        let product_id = reading.product_id.clone().unwrap_or_default();
        let volume = reading
            .volume_15c_liters
            .unwrap_or(reading.volume_liters)
            .max(0.0);
        match products.iter_mut().find(|p| p.product_id == product_id) {
            Some(entry) => {
                entry.total_volume_15c_liters += volume;
                entry.tank_count += 1;
            }
            None => products.push(ProductSummary {
                product_name: reading
                    .product_name
                    .clone()
                    .unwrap_or_else(|| product_id.clone()),
                product_id,
                color: reading.color().to_string(),
                total_volume_15c_liters: volume,
                tank_count: 1,
                share_percent: 0.0,
            }),
        }
    }

    let grand_total: f64 = products.iter().map(|p| p.total_volume_15c_liters).sum();
    let divisor = if grand_total > 0.0 { grand_total } else { 1.0 };
    for entry in &mut products {
        entry.share_percent = (entry.total_volume_15c_liters / divisor * 1000.0).round() / 10.0;
    }

    products.sort_by(|a, b| b.total_volume_15c_liters.total_cmp(&a.total_volume_15c_liters));
    products
}

/// Whole liters with `.` thousands separators, e.g. `1.234.567`.
pub fn format_liters(liters: f64) -> String {
    if !liters.is_finite() {
        return "—".to_string();
    }
    let rounded = liters.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_temperature(celsius: Option<f64>) -> String {
    match celsius {
        Some(t) if t.is_finite() => format!("{:.1} °C", t).replace('.', ","),
        _ => "— °C".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::fixtures::tank;

    #[test]
    fn test_format_liters() {
        assert_eq!(format_liters(0.0), "0");
        assert_eq!(format_liters(999.4), "999");
        assert_eq!(format_liters(1000.0), "1.000");
        assert_eq!(format_liters(1234567.8), "1.234.568");
        assert_eq!(format_liters(-45000.0), "-45.000");
    }

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(Some(17.24)), "17,2 °C");
        assert_eq!(format_temperature(None), "— °C");
    }

    #[test]
    fn test_dashboard_summary_text() {
        let tanks = vec![tank("A", "1", 41000.0, 50000.0), tank("A", "2", 2500.0, 10000.0)];
        let summary = DashboardSummary::from_readings(&tanks);
        assert_eq!(summary.tank_count, 2);
        assert_eq!(summary.low_tanks, 0);
        assert_eq!(summary.text(), "Tanks: 2 · Total stock: 43.500 L");
    }

    #[test]
    fn test_summary_counts_low_tanks() {
        let tanks = vec![
            tank("A", "1", 41000.0, 50000.0),
            tank("A", "2", 1000.0, 10000.0),
            tank("A", "3", 0.0, 0.0),
        ];
        let summary = DashboardSummary::from_readings(&tanks);
        assert_eq!(summary.low_tanks, 2);
        assert_eq!(summary.text(), "Tanks: 3 · Total stock: 42.000 L · Low: 2");
    }

    #[test]
    fn test_product_summary_shares() {
        let mut a = tank("A", "1", 3000.0, 5000.0);
        a.volume_15c_liters = Some(3000.0);
        let mut b = tank("A", "2", 1000.0, 5000.0);
        b.product_id = Some("P2".to_string());
        b.product_name = Some("ADBLUE".to_string());
        let c = tank("B", "3", 0.0, 5000.0);

        let summary = product_summary(&[a, b, c]);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].product_id, "P1");
        assert_eq!(summary[0].tank_count, 2);
        assert_eq!(summary[0].share_percent, 75.0);
        assert_eq!(summary[1].share_percent, 25.0);
    }
}
