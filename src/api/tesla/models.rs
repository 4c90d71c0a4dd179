use serde::Deserialize;

use crate::quantity::percent::Percent;

/// Generic Owner API response envelope.
#[derive(Deserialize)]
pub struct Response<R> {
    pub response: R,
}

#[derive(Debug, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub vin: String,
    pub display_name: Option<String>,

    /// `online`, `asleep` or `offline`.
    pub state: String,
}

impl Vehicle {
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.state == "online"
    }
}

#[derive(Debug, Deserialize)]
pub struct ChargeState {
    #[serde(rename = "charge_limit_soc")]
    pub charge_limit: Percent,

    pub battery_level: Option<Percent>,

    pub charging_state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DriveState {
    pub latitude: f64,
    pub longitude: f64,
}

/// Command endpoints answer with a verdict instead of data.
#[derive(Debug, Deserialize)]
pub struct CommandResult {
    pub result: bool,
    pub reason: Option<String>,
}
