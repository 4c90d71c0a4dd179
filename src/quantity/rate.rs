use derive_more::{Display, From, FromStr};
use serde::{Deserialize, Serialize};

/// Day-ahead spot price per megawatt-hour in the configured currency.
///
/// «Not published yet» is never a rate: the feed's infinity sentinel is mapped
/// to an absent value before a rate is ever constructed.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Display, From, FromStr, Serialize, Deserialize)]
#[display("{_0:.2}")]
pub struct SpotRate(pub f64);
