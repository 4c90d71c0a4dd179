use crate::{
    prelude::*,
    quantity::{percent::Percent, rate::SpotRate},
};

/// Process-wide charging parameters, built once at startup and passed by
/// reference from there on.
#[derive(Debug)]
pub struct ChargeConfig {
    /// Tonight counts as cheap strictly below this rate.
    pub cheap_threshold: SpotRate,

    /// The low charge tier.
    pub min_percent: Percent,

    /// The high charge tier, used when tonight is cheap.
    pub max_percent: Percent,

    /// A charge limit above this is an operator override («trip mode»).
    pub trip_threshold: Percent,

    pub currency: String,
    pub price_area: String,
}

impl ChargeConfig {
    pub fn validated(self) -> Result<Self> {
        ensure!(self.min_percent > Percent::ZERO, "the minimum charge tier must be positive");
        ensure!(
            self.min_percent <= self.max_percent,
            "the minimum charge tier ({}) must not exceed the maximum ({})",
            self.min_percent,
            self.max_percent,
        );
        ensure!(
            self.max_percent <= Percent::FULL,
            "the maximum charge tier ({}) must not exceed {}",
            self.max_percent,
            Percent::FULL,
        );
        ensure!(
            self.trip_threshold <= Percent::FULL,
            "the trip-mode threshold ({}) must not exceed {}",
            self.trip_threshold,
            Percent::FULL,
        );
        Ok(self)
    }
}
