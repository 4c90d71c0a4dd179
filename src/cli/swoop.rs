use chrono::{Local, TimeDelta};

use crate::{
    api::{nordpool, tesla},
    cli::SwoopArgs,
    core::{
        location::locate,
        price::normalize,
        reconcile::{Outcome, Reconciler},
        target::select,
    },
    prelude::*,
};

/// The run: fetch the prices, pick the target, reconcile the vehicle.
#[instrument(skip_all)]
pub async fn swoop(args: &SwoopArgs) -> Result {
    let config = args.charge.to_config()?;

    let nordpool = nordpool::Api::try_new()?;
    let today = Local::now().date_naive();
    let prices_today =
        nordpool.get_hourly_prices(today, &config.price_area, &config.currency).await?;
    let prices_tomorrow = nordpool
        .get_hourly_prices(today + TimeDelta::days(1), &config.price_area, &config.currency)
        .await?;

    let decision = normalize(&prices_today, &prices_tomorrow)
        .context("cannot derive tonight's price, nothing to decide")?;
    info!(
        tonight = %decision.tonight,
        better_price_tomorrow = decision.better_price_tomorrow,
        currency = config.currency.as_str(),
        "normalized the prices",
    );

    let target = select(&decision, &config);
    info!(%target, cheap_threshold = %config.cheap_threshold, "picked the charge target");

    let tesla = args.tesla.try_new_client().await?;
    let vehicle = tesla
        .vehicles()
        .await?
        .into_iter()
        .next()
        .context("the account has no vehicles")?;
    info!(
        vehicle_id = vehicle.id,
        name = vehicle.display_name.as_deref().unwrap_or("-"),
        state = vehicle.state.as_str(),
        "picked the vehicle",
    );

    let handle = tesla.handle(vehicle.id);
    let outcome = Reconciler::builder()
        .gateway(&handle)
        .policy(args.wake.policy())
        .trip_threshold(config.trip_threshold)
        .scout(args.scout)
        .build()
        .run(target)
        .await?;
    info!(%outcome, "finished");

    log_location(&tesla, vehicle.id, args, &outcome).await;
    Ok(())
}

/// Purely informational: say where the vehicle is, if we know the place.
async fn log_location(tesla: &tesla::Api, vehicle_id: u64, args: &SwoopArgs, outcome: &Outcome) {
    let places = args.places.places();
    if places.is_empty() || matches!(outcome, Outcome::TimedOut) {
        return;
    }
    match tesla.drive_state(vehicle_id).await {
        Ok(drive_state) => match locate(&places, drive_state.latitude, drive_state.longitude) {
            Some(place) => info!(place = place.name.as_str(), "the vehicle is at a known place"),
            None => info!("I don't know where the vehicle is"),
        },
        Err(error) => warn!("failed to read the vehicle location: {error:#}"),
    }
}
