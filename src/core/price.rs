use crate::{
    core::{error::Error, series::PriceSeries},
    quantity::rate::SpotRate,
};

/// What the night ahead costs, and whether waiting a day would beat it.
#[derive(Copy, Clone, Debug)]
pub struct PriceDecision {
    /// Always concrete: the sentinel never leaves the normalizer.
    pub tonight: SpotRate,

    pub better_price_tomorrow: bool,
}

/// Collapse the two fetched days into a single decision input.
///
/// The feed publishes the next day's prices mid-afternoon. Before that moment
/// `tomorrow` is unavailable and the best estimate of tonight is today's last
/// hour; after it, tonight is tomorrow's midnight hour and the following
/// night (tomorrow's 23:00 hour) becomes the comparison candidate.
pub fn normalize(today: &PriceSeries, tomorrow: &PriceSeries) -> Result<PriceDecision, Error> {
    if let Some(tonight) = tomorrow.first_value() {
        // Ties favour acting tonight, the sooner decision point.
        let better_price_tomorrow =
            tomorrow.last_value().is_some_and(|tomorrow_night| tomorrow_night < tonight);
        Ok(PriceDecision { tonight, better_price_tomorrow })
    } else {
        let tonight = today.last_value().ok_or(Error::DataUnavailable)?;
        Ok(PriceDecision { tonight, better_price_tomorrow: false })
    }
}
