mod perch;
mod swoop;

use std::time::Duration;

use clap::{Parser, Subcommand};

pub use self::{perch::perch, swoop::swoop};
use crate::{
    api::tesla,
    core::{
        config::ChargeConfig,
        location::Place,
        reconcile::WakePolicy,
    },
    prelude::*,
    quantity::{percent::Percent, rate::SpotRate},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the prices, pick the charge target, and reconcile
    /// the vehicle.
    #[clap(name = "swoop")]
    Swoop(Box<SwoopArgs>),

    /// Development tools.
    #[clap(name = "perch")]
    Perch(Box<PerchArgs>),
}

#[derive(Parser)]
pub struct SwoopArgs {
    /// Do not send the charge-limit command to the vehicle (dry run).
    #[clap(long)]
    pub scout: bool,

    #[clap(flatten)]
    pub tesla: TeslaApiArgs,

    #[clap(flatten)]
    pub charge: ChargeArgs,

    #[clap(flatten)]
    pub wake: WakeArgs,

    #[clap(flatten)]
    pub places: PlacesArgs,
}

#[derive(Parser)]
pub struct TeslaApiArgs {
    /// Tesla API access token.
    #[clap(
        long = "tesla-token",
        env = "TESLA_TOKEN",
        conflicts_with_all = ["user", "pass"],
    )]
    pub token: Option<String>,

    /// Tesla account email, paired with the password.
    #[clap(long = "tesla-user", env = "TESLA_USER", requires = "pass")]
    pub user: Option<String>,

    /// Tesla account password, paired with the email.
    #[clap(long = "tesla-pass", env = "TESLA_PASS", requires = "user")]
    pub pass: Option<String>,
}

impl TeslaApiArgs {
    pub async fn try_new_client(&self) -> Result<tesla::Api> {
        match (&self.token, &self.user, &self.pass) {
            (Some(token), _, _) => tesla::Api::with_token(token),
            (None, Some(user), Some(pass)) => tesla::Api::with_credentials(user, pass).await,
            _ => bail!("either `TESLA_TOKEN` or `TESLA_USER` and `TESLA_PASS` must be set"),
        }
    }
}

#[derive(Parser)]
pub struct ChargeArgs {
    /// Tonight counts as cheap strictly below this rate.
    #[clap(long = "cheap-threshold", env = "CHEAP_THRESHOLD", default_value = "0")]
    pub cheap_threshold: SpotRate,

    /// Charge limit for a regular night.
    #[clap(long = "min-percent", env = "MIN_PERCENT", default_value = "60")]
    pub min_percent: Percent,

    /// Charge limit for a cheap night.
    #[clap(long = "max-percent", env = "MAX_PERCENT", default_value = "90")]
    pub max_percent: Percent,

    /// Charge limits above this are an operator override and are left alone.
    #[clap(long = "trip-threshold", env = "TRIP_THRESHOLD", default_value = "90")]
    pub trip_threshold: Percent,

    #[clap(long = "base-currency", env = "BASE_CURRENCY", default_value = "DKK")]
    pub currency: String,

    #[clap(long = "price-area", env = "PRICE_AREA", default_value = "DK2")]
    pub price_area: String,
}

impl ChargeArgs {
    pub fn to_config(&self) -> Result<ChargeConfig> {
        ChargeConfig {
            cheap_threshold: self.cheap_threshold,
            min_percent: self.min_percent,
            max_percent: self.max_percent,
            trip_threshold: self.trip_threshold,
            currency: self.currency.clone(),
            price_area: self.price_area.clone(),
        }
        .validated()
    }
}

#[derive(Copy, Clone, Parser)]
pub struct WakeArgs {
    /// Wake-and-poll attempts before giving up on the vehicle.
    #[clap(long = "wake-attempts", env = "WAKE_ATTEMPTS", default_value = "20")]
    pub attempts: u32,

    /// Seconds between wake-and-poll attempts.
    #[clap(
        long = "wake-poll-interval-secs",
        env = "WAKE_POLL_INTERVAL_SECS",
        default_value = "30"
    )]
    pub poll_interval_secs: u64,

    /// Seconds to back off before the single retry of a failed state query.
    #[clap(long = "retry-backoff-secs", env = "RETRY_BACKOFF_SECS", default_value = "10")]
    pub retry_backoff_secs: u64,
}

impl WakeArgs {
    #[must_use]
    pub const fn policy(&self) -> WakePolicy {
        WakePolicy {
            attempts: self.attempts,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            retry_backoff: Duration::from_secs(self.retry_backoff_secs),
        }
    }
}

/// Named places for the location log line. All optional, no decision hangs on
/// them.
#[derive(Parser)]
pub struct PlacesArgs {
    #[clap(long = "home-lat", env = "HOME_LAT")]
    pub home_lat: Option<f64>,

    #[clap(long = "home-long", env = "HOME_LONG")]
    pub home_long: Option<f64>,

    #[clap(long = "work1-lat", env = "WORK1_LAT")]
    pub work1_lat: Option<f64>,

    #[clap(long = "work1-long", env = "WORK1_LONG")]
    pub work1_long: Option<f64>,

    #[clap(long = "work2-lat", env = "WORK2_LAT")]
    pub work2_lat: Option<f64>,

    #[clap(long = "work2-long", env = "WORK2_LONG")]
    pub work2_long: Option<f64>,
}

impl PlacesArgs {
    #[must_use]
    pub fn places(&self) -> Vec<Place> {
        [
            ("home", self.home_lat, self.home_long),
            ("work1", self.work1_lat, self.work1_long),
            ("work2", self.work2_lat, self.work2_long),
        ]
        .into_iter()
        .filter_map(|(name, latitude, longitude)| {
            Some(Place { name: name.to_owned(), latitude: latitude?, longitude: longitude? })
        })
        .collect()
    }
}

#[derive(Parser)]
pub struct PerchArgs {
    #[command(subcommand)]
    pub command: PerchCommand,
}

#[derive(Subcommand)]
pub enum PerchCommand {
    /// Fetch and print today's and tomorrow's hourly price tables.
    Prices(PerchPricesArgs),

    /// List the vehicles on the account.
    Vehicles(PerchVehiclesArgs),

    /// Print the first vehicle's charge state.
    ChargeState(PerchVehiclesArgs),

    /// Send a single wake request to the first vehicle.
    Wake(PerchVehiclesArgs),
}

#[derive(Parser)]
pub struct PerchPricesArgs {
    #[clap(flatten)]
    pub charge: ChargeArgs,
}

#[derive(Parser)]
pub struct PerchVehiclesArgs {
    #[clap(flatten)]
    pub tesla: TeslaApiArgs,
}
