#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Headless demo session against a running immotep backend.
//!
//! Restores the persisted parameters, commits the filters given on the
//! command line, optionally recenters on a geocoded address, settles one
//! synthetic viewport around the current center, and prints what the map
//! would render: window aggregates, classified city colors and the sale
//! records. The parameter file carries filters, theme and position over
//! to the next run.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use immo_map_api::HttpSalesApi;
use immo_map_api_models::{contour_avgprice, LatLng, ViewportBounds};
use immo_map_choropleth::{city_contour_style, PriceScale};
use immo_map_layers::geocode::BanAddressSearch;
use immo_map_layers::{Engine, EngineConfig, LayerSnapshot, MapCommand, MapEvent};
use immo_map_store::storage::FileStorage;
use immo_map_store::{ParamStore, UiParams};

/// Drive one map session without a map.
#[derive(Parser)]
#[command(name = "immo_map_cli", about = "Headless immotep map session")]
struct Cli {
    /// Base URL of the immotep backend.
    #[arg(long, default_value = "http://localhost:8080")]
    api: String,

    /// Path of the persisted parameter file.
    #[arg(long, default_value = "data/immo-map.json")]
    state: PathBuf,

    /// Address to geocode and recenter on before the viewport settles.
    #[arg(long)]
    address: Option<String>,

    /// Department code to commit (e.g. "29").
    #[arg(long)]
    department: Option<String>,

    /// Year to commit, -1 for all years.
    #[arg(long)]
    year: Option<i32>,

    /// Result limit to commit.
    #[arg(long)]
    limit: Option<u32>,

    /// Half-size of the synthetic viewport, in degrees.
    #[arg(long, default_value_t = 0.05)]
    radius: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let store = Arc::new(ParamStore::restore(Arc::new(FileStorage::open(&cli.state))));
    let api = Arc::new(HttpSalesApi::new(&cli.api)?);
    let geocoder = Arc::new(BanAddressSearch::new()?);

    let (engine, mut commands, task) =
        Engine::start(api, geocoder, Arc::clone(&store), EngineConfig::default());

    if let Some(code) = cli.department {
        engine.send(MapEvent::DepartmentCommitted { code }).await;
    }
    if let Some(year) = cli.year {
        engine.send(MapEvent::YearSelected { year }).await;
    }
    if let Some(limit) = cli.limit {
        engine.send(MapEvent::LimitCommitted { limit }).await;
    }
    if let Some(query) = cli.address {
        engine.send(MapEvent::AddressSubmitted { query }).await;
    }
    engine.wait_idle().await;

    // play the rendering surface: follow any recenter command
    while let Ok(MapCommand::FlyTo { lat, lng }) = commands.try_recv() {
        log::info!("recentered on ({lat}, {lng})");
    }

    let [lat, lng] = store.position();
    let bounds = ViewportBounds::new(
        LatLng::new(lat + cli.radius, lng + cli.radius),
        LatLng::new(lat - cli.radius, lng - cli.radius),
    );
    engine
        .send(MapEvent::MoveSettled {
            center: bounds.center(),
            zoom: store.zoom(),
            bounds,
        })
        .await;
    engine.wait_idle().await;

    if let Some(snapshot) = engine.snapshot().await {
        print_session(&store, &snapshot);
    }

    engine.shutdown().await;
    task.await?;

    Ok(())
}

/// Prints the window the way the map surface would render it.
fn print_session(store: &ParamStore, snapshot: &LayerSnapshot) {
    let params = store.snapshot();
    println!(
        "viewport around ({:.4}, {:.4}) at zoom {}",
        params.position[0], params.position[1], params.zoom
    );

    println!("{}", aggregate_line(&params));

    println!(
        "{} regions, {} departments, {} cities in view",
        snapshot.regions.len(),
        snapshot.departments.len(),
        snapshot.cities.len()
    );

    let scale = PriceScale::default();
    for city in &snapshot.cities {
        let price = city.contour.as_ref().and_then(contour_avgprice);
        let style = city_contour_style(&scale, price);
        println!("  {} ({}): {}", city.name, city.zip, style.fill_color);
    }

    println!("{} sales", snapshot.sales.len());
    for sale in &snapshot.sales {
        println!(
            "  {} {}, {}: {:.0}€ ({:.0}€/m²)",
            sale.date.date_naive(),
            sale.address,
            sale.city,
            sale.price,
            sale.pricepsqm
        );
    }
}

/// Formats the window aggregates, one figure per populated slot.
///
/// The backend computes the two averages independently, so either slot can
/// hold the no-data sentinel while the other has a value; a sentinel slot
/// is omitted, never printed.
fn aggregate_line(params: &UiParams) -> String {
    let mut figures = Vec::new();
    if params.avg_price > 0.0 {
        figures.push(format!("average price {:.0}€", params.avg_price));
    }
    if params.avg_price_sqm > 0.0 {
        figures.push(format!("{:.0}€/m²", params.avg_price_sqm));
    }
    if figures.is_empty() {
        "no price data in this window".to_string()
    } else {
        figures.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use immo_map_store::storage::MemoryStorage;

    fn store_with_aggregates(price: f64, sqm: f64) -> ParamStore {
        let store = ParamStore::restore(Arc::new(MemoryStorage::new()));
        store.set_avg_price(price);
        store.set_avg_price_sqm(sqm);
        store
    }

    #[test]
    fn both_figures_share_the_line() {
        let store = store_with_aggregates(250_000.0, 3_125.0);
        assert_eq!(
            aggregate_line(&store.snapshot()),
            "average price 250000€, 3125€/m²"
        );
    }

    #[test]
    fn missing_sqm_figure_is_suppressed() {
        let store = store_with_aggregates(250_000.0, 0.0);
        let line = aggregate_line(&store.snapshot());
        assert_eq!(line, "average price 250000€");
        assert!(!line.contains("-1"));
    }

    #[test]
    fn missing_price_keeps_the_sqm_figure() {
        let store = store_with_aggregates(-5.0, 2_500.0);
        assert_eq!(aggregate_line(&store.snapshot()), "2500€/m²");
    }

    #[test]
    fn no_data_line_only_when_both_are_missing() {
        let store = store_with_aggregates(0.0, -1.0);
        assert_eq!(
            aggregate_line(&store.snapshot()),
            "no price data in this window"
        );
    }
}
