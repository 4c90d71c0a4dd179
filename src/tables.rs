use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{api::tesla::models::Vehicle, core::series::PriceSeries};

pub fn build_price_series_table(series: &PriceSeries, currency: &str) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Hour (UTC)"),
        Cell::new(format!("{currency}/MWh")),
    ]);
    for point in series.points() {
        table.add_row(vec![
            Cell::new(point.start_at.format("%b %d %H:%M")).add_attribute(Attribute::Dim),
            match point.value {
                Some(value) => Cell::new(value).set_alignment(CellAlignment::Right),
                None => Cell::new("n/a").add_attribute(Attribute::Dim),
            },
        ]);
    }
    table
}

pub fn build_vehicles_table(vehicles: &[Vehicle]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Id"),
        Cell::new("Name"),
        Cell::new("VIN"),
        Cell::new("State"),
    ]);
    for vehicle in vehicles {
        table.add_row(vec![
            Cell::new(vehicle.id).add_attribute(Attribute::Dim),
            Cell::new(vehicle.display_name.as_deref().unwrap_or("-")),
            Cell::new(&vehicle.vin),
            Cell::new(&vehicle.state).fg(if vehicle.is_online() {
                Color::Green
            } else {
                Color::DarkYellow
            }),
        ]);
    }
    table
}
