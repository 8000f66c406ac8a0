use nl_api_types::{TokenId, Usd};
use rand::Rng;

pub const RARITY_WEIGHT: f64 = 0.6;
pub const DEMAND_WEIGHT: f64 = 0.4;
/// Upper (exclusive) bound of each draw.
pub const DRAW_RANGE: f64 = 1000.0;

const MAX_VALUE: Usd = Usd::from_cents(99_999);

/// Source of per-token estimated values.
pub trait PricingOracle: Send + Sync {
    fn estimate(&self, token_id: TokenId) -> Usd;
}

/// Placeholder oracle: a weighted blend of two uniform draws, fresh each call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPricing;

impl PricingOracle for RandomPricing {
    fn estimate(&self, _token_id: TokenId) -> Usd {
        let mut rng = rand::thread_rng();
        let demand = rng.gen_range(0.0..DRAW_RANGE);
        let rarity = rng.gen_range(0.0..DRAW_RANGE);
        weighted_value(rarity, demand)
    }
}

/// `0.6 * rarity + 0.4 * demand`, rounded to cents and kept below 1000.00.
pub fn weighted_value(rarity: f64, demand: f64) -> Usd {
    let value = rarity * RARITY_WEIGHT + demand * DEMAND_WEIGHT;
    Usd::from_f64_rounded(value).clamp(Usd::ZERO, MAX_VALUE)
}
