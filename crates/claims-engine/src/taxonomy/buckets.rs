//! Monetary range ladder.

use serde::{Deserialize, Serialize};

/// One rung of the ladder: amounts at or above `lower` (and below the next rung).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountBand {
    pub lower: f64,
    pub label: String,
}

impl AmountBand {
    pub fn new(lower: f64, label: impl Into<String>) -> Self {
        Self {
            lower,
            label: label.into(),
        }
    }
}

/// Ascending list of amount bands. The last band is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmountLadder {
    pub bands: Vec<AmountBand>,
}

impl Default for AmountLadder {
    fn default() -> Self {
        Self {
            bands: vec![
                AmountBand::new(0.0, "0-100"),
                AmountBand::new(100.0, "100-500"),
                AmountBand::new(500.0, "500-1K"),
                AmountBand::new(1_000.0, "1K-5K"),
                AmountBand::new(5_000.0, "5K-10K"),
                AmountBand::new(10_000.0, "10K-50K"),
                AmountBand::new(50_000.0, "50K+"),
            ],
        }
    }
}

impl AmountLadder {
    /// Label of the band containing `amount`.
    ///
    /// Amounts below the first rung (refunds, adjustments) fall into the first
    /// band so every finite amount lands in exactly one band. Returns `None`
    /// for non-finite amounts or an empty ladder.
    pub fn bucket(&self, amount: f64) -> Option<&str> {
        if !amount.is_finite() {
            return None;
        }
        let first = self.bands.first()?;
        let band = self
            .bands
            .iter()
            .rev()
            .find(|band| amount >= band.lower)
            .unwrap_or(first);
        Some(band.label.as_str())
    }

    /// True when lower bounds are finite and strictly ascending.
    pub fn is_ascending(&self) -> bool {
        self.bands.iter().all(|b| b.lower.is_finite())
            && self.bands.windows(2).all(|pair| pair[0].lower < pair[1].lower)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|b| b.label.as_str())
    }
}
