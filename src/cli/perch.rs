use chrono::{Local, NaiveDate, TimeDelta};

use crate::{
    api::{nordpool, tesla},
    cli::{PerchArgs, PerchCommand, PerchPricesArgs, PerchVehiclesArgs},
    prelude::*,
    tables::{build_price_series_table, build_vehicles_table},
};

pub async fn perch(args: &PerchArgs) -> Result {
    match &args.command {
        PerchCommand::Prices(args) => prices(args).await,
        PerchCommand::Vehicles(args) => vehicles(args).await,
        PerchCommand::ChargeState(args) => charge_state(args).await,
        PerchCommand::Wake(args) => wake(args).await,
    }
}

async fn prices(args: &PerchPricesArgs) -> Result {
    let config = args.charge.to_config()?;
    let nordpool = nordpool::Api::try_new()?;
    let today = Local::now().date_naive();
    print_day(&nordpool, today, &config.price_area, &config.currency).await?;
    print_day(&nordpool, today + TimeDelta::days(1), &config.price_area, &config.currency).await
}

async fn print_day(
    nordpool: &nordpool::Api,
    date: NaiveDate,
    area: &str,
    currency: &str,
) -> Result {
    let series = nordpool.get_hourly_prices(date, area, currency).await?;
    if series.is_available() {
        println!("{date}:");
        println!("{table}", table = build_price_series_table(&series, currency));
    } else {
        println!("{date}: not published yet");
    }
    Ok(())
}

async fn vehicles(args: &PerchVehiclesArgs) -> Result {
    let vehicles = args.tesla.try_new_client().await?.vehicles().await?;
    println!("{table}", table = build_vehicles_table(&vehicles));
    Ok(())
}

async fn charge_state(args: &PerchVehiclesArgs) -> Result {
    let tesla = args.tesla.try_new_client().await?;
    let vehicle = first_vehicle(&tesla).await?;
    let charge_state = tesla.charge_state(vehicle.id).await?;
    info!(
        vehicle_id = vehicle.id,
        charge_limit = %charge_state.charge_limit,
        battery_level = ?charge_state.battery_level,
        charging_state = charge_state.charging_state.as_deref().unwrap_or("-"),
        "gotcha",
    );
    Ok(())
}

async fn wake(args: &PerchVehiclesArgs) -> Result {
    let tesla = args.tesla.try_new_client().await?;
    let vehicle = first_vehicle(&tesla).await?;
    let vehicle = tesla.wake_up(vehicle.id).await?;
    info!(vehicle_id = vehicle.id, state = vehicle.state.as_str(), "woken");
    Ok(())
}

async fn first_vehicle(tesla: &tesla::Api) -> Result<tesla::models::Vehicle> {
    tesla.vehicles().await?.into_iter().next().context("the account has no vehicles")
}
