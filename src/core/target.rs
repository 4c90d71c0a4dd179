use crate::{
    core::{config::ChargeConfig, price::PriceDecision},
    quantity::percent::Percent,
};

/// Pick the charge tier for tonight. Pure: same inputs, same answer, no I/O.
///
/// The high tier needs tonight to be cheap in absolute terms *and* not
/// dominated by an even cheaper tomorrow night. In the latter case a later
/// run, closer to that night, gets to make the call.
#[must_use]
pub fn select(decision: &PriceDecision, config: &ChargeConfig) -> Percent {
    if decision.tonight < config.cheap_threshold && !decision.better_price_tomorrow {
        config.max_percent
    } else {
        config.min_percent
    }
}
