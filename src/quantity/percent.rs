use derive_more::{Display, From, FromStr};
use serde::{Deserialize, Serialize};

/// Charge-limit percentage as the vehicle reports and accepts it.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Display,
    From,
    FromStr,
    Serialize,
    Deserialize,
)]
#[display("{_0}%")]
pub struct Percent(u8);

impl Percent {
    pub const FULL: Self = Self(100);
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }
}
