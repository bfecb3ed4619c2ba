use serde::{Deserialize, Serialize};

/// A (minimum quantity, discount fraction) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTier {
    pub min_quantity: u32,
    pub discount: f64,
}

/// Bulk-discount tiers of one supplier, sorted by threshold.
///
/// Exactly one tier applies to an order: the one with the largest
/// `min_quantity` that does not exceed the ordered quantity. Tiers never stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiscountSchedule {
    tiers: Vec<DiscountTier>,
}

impl DiscountSchedule {
    /// Build a schedule; tiers are sorted and a repeated threshold keeps the
    /// last tier given for it.
    pub fn new(mut tiers: Vec<DiscountTier>) -> Self {
        tiers.sort_by_key(|t| t.min_quantity);

        let mut deduped: Vec<DiscountTier> = Vec::with_capacity(tiers.len());
        for tier in tiers {
            match deduped.last_mut() {
                Some(last) if last.min_quantity == tier.min_quantity => *last = tier,
                _ => deduped.push(tier),
            }
        }

        Self { tiers: deduped }
    }

    pub fn tiers(&self) -> &[DiscountTier] {
        &self.tiers
    }

    /// Tier that applies to `quantity`, if any
    pub fn applicable_tier(&self, quantity: u32) -> Option<&DiscountTier> {
        let idx = self.tiers.partition_point(|t| t.min_quantity <= quantity);
        idx.checked_sub(1).map(|i| &self.tiers[i])
    }

    /// Discount fraction for `quantity`; zero when no tier qualifies
    pub fn discount_for(&self, quantity: u32) -> f64 {
        self.applicable_tier(quantity).map_or(0.0, |t| t.discount)
    }
}
