//! [Nord Pool](https://data.nordpoolgroup.com/) day-ahead price client.

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    core::series::{PricePoint, PriceSeries},
    prelude::*,
    quantity::rate::SpotRate,
};

const URL: &str = "https://dataportal-api.nordpoolgroup.com/api/DayAheadPrices";

pub struct Api(Client);

impl Api {
    pub fn try_new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("magpie")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }

    /// Fetch one delivery day for one price area.
    ///
    /// The portal answers `204 No Content` until the day is published
    /// (mid-afternoon CET for the next day), which comes back as an
    /// unavailable series.
    #[instrument(skip_all, fields(date = %date, area = area))]
    pub async fn get_hourly_prices(
        &self,
        date: NaiveDate,
        area: &str,
        currency: &str,
    ) -> Result<PriceSeries> {
        let response = self
            .0
            .get(URL)
            .query(&DayAheadPricesRequest { date, market: "DayAhead", delivery_area: area, currency })
            .send()
            .await
            .context("failed to call the price portal")?
            .error_for_status()
            .context("the price request failed")?;
        if response.status() == StatusCode::NO_CONTENT {
            info!("the day is not published yet");
            return Ok(PriceSeries::unavailable());
        }
        let response: DayAheadPricesResponse = response
            .json()
            .await
            .context("failed to deserialize the price response")?;
        into_series(response, area)
            .with_context(|| format!("the feed returned a malformed series for {date}"))
    }
}

fn into_series(response: DayAheadPricesResponse, area: &str) -> Result<PriceSeries> {
    let points = response
        .entries
        .into_iter()
        .map(|entry| PricePoint {
            start_at: entry.start_at,
            // Guards against the infinity sentinel some feeds put in
            // not-yet-published hours.
            value: entry
                .prices
                .get(area)
                .copied()
                .filter(|value| value.is_finite())
                .map(SpotRate),
        })
        .collect();
    Ok(PriceSeries::try_from_points(points)?)
}

#[derive(Serialize)]
struct DayAheadPricesRequest<'a> {
    date: NaiveDate,

    market: &'a str,

    #[serde(rename = "deliveryArea")]
    delivery_area: &'a str,

    currency: &'a str,
}

#[derive(Deserialize)]
struct DayAheadPricesResponse {
    #[serde(rename = "multiAreaEntries")]
    entries: Vec<MultiAreaEntry>,
}

#[derive(Deserialize)]
struct MultiAreaEntry {
    #[serde(rename = "deliveryStart")]
    start_at: DateTime<Utc>,

    #[serde(rename = "entryPerArea")]
    prices: HashMap<String, f64>,
}
