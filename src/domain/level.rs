// Fill level domain - Percentages and status tiers

/// Fill percentage in [0, 100]. Zero or negative capacity yields 0.
pub fn percentage(volume: f64, capacity: f64) -> f64 {
    if !capacity.is_finite() || capacity <= 0.0 || !volume.is_finite() {
        return 0.0;
    }
    (100.0 * volume / capacity).clamp(0.0, 100.0)
}

/// Discrete fill tier. Breakpoints: <=20 Low, <=50 Medium, <=90 High, else Full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Low,
    Medium,
    High,
    Full,
}

impl Tier {
    pub fn from_percentage(pct: f64) -> Self {
        if pct.is_nan() || pct <= 20.0 {
            Tier::Low
        } else if pct <= 50.0 {
            Tier::Medium
        } else if pct <= 90.0 {
            Tier::High
        } else {
            Tier::Full
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Low => "Low",
            Tier::Medium => "Medium",
            Tier::High => "High",
            Tier::Full => "Full",
        }
    }

    /// Status dot color.
    pub fn color(&self) -> &'static str {
        match self {
            Tier::Low => "#FF3B30",
            Tier::Medium => "#FFA500",
            Tier::High => "#00CC44",
            Tier::Full => "#66FF99",
        }
    }

    pub fn is_alarm(&self) -> bool {
        *self == Tier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_is_zero() {
        for capacity in [0.0, -1.0, -5000.0, f64::NAN] {
            for volume in [0.0, 10.0, -3.0, 1e9] {
                assert_eq!(percentage(volume, capacity), 0.0);
            }
        }
    }

    #[test]
    fn test_percentage_is_clamped() {
        let volumes = [-100.0, 0.0, 1.0, 49_999.0, 50_000.0, 75_000.0, f64::INFINITY];
        let capacities = [0.5, 1.0, 50_000.0, 1e12];
        for v in volumes {
            for c in capacities {
                let p = percentage(v, c);
                assert!((0.0..=100.0).contains(&p), "{v}/{c} gave {p}");
            }
        }
    }

    #[test]
    fn test_example_site_reading() {
        let p = percentage(41_000.0, 50_000.0);
        assert!((p - 82.0).abs() < 1e-9);
        assert_eq!(Tier::from_percentage(p), Tier::High);
    }

    #[test]
    fn test_tier_breakpoints() {
        assert_eq!(Tier::from_percentage(0.0), Tier::Low);
        assert_eq!(Tier::from_percentage(20.0), Tier::Low);
        assert_eq!(Tier::from_percentage(20.1), Tier::Medium);
        assert_eq!(Tier::from_percentage(50.0), Tier::Medium);
        assert_eq!(Tier::from_percentage(90.0), Tier::High);
        assert_eq!(Tier::from_percentage(90.5), Tier::Full);
        assert!(Tier::Low.is_alarm());
        assert!(!Tier::Full.is_alarm());
    }
}
