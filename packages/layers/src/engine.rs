#![allow(clippy::module_name_repetitions)]

//! The single-task event loop driving every layer.
//!
//! All mutation happens inside one task consuming one message queue:
//! surface events enter through [`EngineHandle::send`], and spawned fetch
//! completions re-enter the same queue tagged with their layer sequence
//! number. Handling a message never awaits, so queue order is the only
//! ordering there is and no layer state needs a lock.

use std::sync::Arc;

use immo_map_api::{ApiError, SalesApi};
use immo_map_api_models::{
    BoundedCities, BoundedTransactions, CityInfo, DepartmentInfo, RegionInfo, TransactionPoi,
    ViewportBounds,
};
use immo_map_geocoder::{GeocodeError, GeocodedPoint};
use immo_map_store::{ParamStore, Theme};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::composer::{self, QueryFilter};
use crate::events::{MapCommand, MapEvent};
use crate::geocode::AddressSearch;
use crate::sync::{dedupe_by_key, LayerState, Seq};
use crate::Layer;

const EVENT_CHANNEL_BUFFER: usize = 64;
const COMMAND_CHANNEL_BUFFER: usize = 16;

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// The layer whose bounds responses publish the shared window
    /// aggregates to the store. Responses from every other layer leave
    /// the aggregate slot alone.
    pub aggregate_owner: Layer,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            aggregate_owner: Layer::Sales,
        }
    }
}

/// Point-in-time copy of every layer dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSnapshot {
    /// Region contours with price averages.
    pub regions: Vec<RegionInfo>,
    /// Department contours with price averages.
    pub departments: Vec<DepartmentInfo>,
    /// City contours for the current window or listing.
    pub cities: Vec<CityInfo>,
    /// Sale markers for the current window or listing.
    pub sales: Vec<TransactionPoi>,
}

/// Messages consumed by the engine task.
enum EngineMsg {
    Event(MapEvent),
    Outcome(FetchOutcome),
    Snapshot { reply: oneshot::Sender<LayerSnapshot> },
    Drain { ack: oneshot::Sender<()> },
    Shutdown,
}

/// Completion of one spawned fetch, tagged with its layer sequence.
enum FetchOutcome {
    Regions {
        seq: Seq,
        result: Result<Vec<RegionInfo>, ApiError>,
    },
    Departments {
        seq: Seq,
        result: Result<Vec<DepartmentInfo>, ApiError>,
    },
    CityListing {
        seq: Seq,
        result: Result<Vec<CityInfo>, ApiError>,
    },
    CityBounds {
        seq: Seq,
        result: Result<BoundedCities, ApiError>,
    },
    SalesListing {
        seq: Seq,
        result: Result<Vec<TransactionPoi>, ApiError>,
    },
    SalesBounds {
        seq: Seq,
        result: Result<BoundedTransactions, ApiError>,
    },
    Geocoded {
        query: String,
        result: Result<Option<GeocodedPoint>, GeocodeError>,
    },
}

/// Client handle to a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    msg_tx: mpsc::Sender<EngineMsg>,
}

impl EngineHandle {
    /// Queues a surface event.
    pub async fn send(&self, event: MapEvent) {
        let _ = self.msg_tx.send(EngineMsg::Event(event)).await;
    }

    /// Resolves once every fetch spawned by already-queued messages has
    /// completed and been applied.
    pub async fn wait_idle(&self) {
        let (ack, done) = oneshot::channel();
        let _ = self.msg_tx.send(EngineMsg::Drain { ack }).await;
        let _ = done.await;
    }

    /// Returns a copy of every layer dataset, or `None` after shutdown.
    pub async fn snapshot(&self) -> Option<LayerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.msg_tx
            .send(EngineMsg::Snapshot { reply })
            .await
            .ok()?;
        response.await.ok()
    }

    /// Stops the engine task once the messages queued so far are handled.
    pub async fn shutdown(&self) {
        let _ = self.msg_tx.send(EngineMsg::Shutdown).await;
    }
}

/// The engine task state. Constructed and run through [`Engine::start`].
pub struct Engine {
    api: Arc<dyn SalesApi>,
    geocoder: Arc<dyn AddressSearch>,
    store: Arc<ParamStore>,
    config: EngineConfig,
    msg_tx: mpsc::Sender<EngineMsg>,
    commands: mpsc::Sender<MapCommand>,
    regions: LayerState<Vec<RegionInfo>>,
    departments: LayerState<Vec<DepartmentInfo>>,
    cities: LayerState<Vec<CityInfo>>,
    sales: LayerState<Vec<TransactionPoi>>,
    last_bounds: Option<ViewportBounds>,
    in_flight: usize,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl Engine {
    /// Spawns the engine task and kicks off the mount-time listing
    /// fetches.
    ///
    /// Returns the event handle, the command stream for the rendering
    /// surface, and the task handle. The engine runs until
    /// [`EngineHandle::shutdown`].
    #[must_use]
    pub fn start(
        api: Arc<dyn SalesApi>,
        geocoder: Arc<dyn AddressSearch>,
        store: Arc<ParamStore>,
        config: EngineConfig,
    ) -> (EngineHandle, mpsc::Receiver<MapCommand>, JoinHandle<()>) {
        let (msg_tx, msg_rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_BUFFER);

        let engine = Self {
            api,
            geocoder,
            store,
            config,
            msg_tx: msg_tx.clone(),
            commands: cmd_tx,
            regions: LayerState::new(Layer::Region, Vec::new()),
            departments: LayerState::new(Layer::Department, Vec::new()),
            cities: LayerState::new(Layer::City, Vec::new()),
            sales: LayerState::new(Layer::Sales, Vec::new()),
            last_bounds: None,
            in_flight: 0,
            idle_waiters: Vec::new(),
        };
        let task = tokio::spawn(engine.run(msg_rx));

        (EngineHandle { msg_tx }, cmd_rx, task)
    }

    async fn run(mut self, mut msg_rx: mpsc::Receiver<EngineMsg>) {
        self.mount_fetches();

        // The engine holds a sender to its own queue, so recv() cannot
        // return None; the loop exits through Shutdown.
        while let Some(msg) = msg_rx.recv().await {
            match msg {
                EngineMsg::Event(event) => self.handle_event(event),
                EngineMsg::Outcome(outcome) => self.apply_outcome(outcome),
                EngineMsg::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                EngineMsg::Drain { ack } => {
                    if self.in_flight == 0 {
                        let _ = ack.send(());
                    } else {
                        self.idle_waiters.push(ack);
                    }
                }
                EngineMsg::Shutdown => break,
            }
        }
        log::debug!("engine stopped");
    }

    fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::MoveSettled {
                bounds,
                center,
                zoom,
            } => {
                self.store.set_position([center.lat, center.lng]);
                self.store.set_zoom(zoom);
                self.last_bounds = Some(bounds);
                self.fetch_city_bounds(bounds);
                self.fetch_sales_bounds(bounds);
            }
            MapEvent::Click { at } => {
                log::debug!("map click at ({}, {})", at.lat, at.lng);
            }
            MapEvent::DepartmentCommitted { code } => {
                self.store.set_department(&code);
                self.fetch_city_listing();
            }
            MapEvent::YearSelected { year } => {
                self.store.set_year(year);
                self.refetch_sales();
            }
            MapEvent::LimitCommitted { limit } => {
                self.store.set_limit(limit);
                self.refetch_sales();
            }
            MapEvent::ThemeToggled => {
                let next = match self.store.theme() {
                    Theme::Dark => Theme::Light,
                    Theme::Light => Theme::Dark,
                };
                self.store.set_theme(next);
            }
            MapEvent::LanguageChanged { lang } => {
                self.store.set_lang(&lang);
            }
            MapEvent::AddressSubmitted { query } => {
                self.fetch_geocode(query);
            }
            MapEvent::PositionFix { at } => {
                self.store.set_position([at.lat, at.lng]);
                self.fly_to(at.lat, at.lng);
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            FetchOutcome::Regions { seq, result } => match result {
                Ok(regions) => {
                    let regions = dedupe_by_key(Layer::Region, regions, |r| r.name.clone());
                    self.regions.apply(seq, regions);
                }
                Err(err) => {
                    if self.regions.fail(seq) {
                        log::warn!("region fetch failed: {err}");
                    }
                }
            },
            FetchOutcome::Departments { seq, result } => match result {
                Ok(departments) => {
                    let departments =
                        dedupe_by_key(Layer::Department, departments, |d| d.name.clone());
                    self.departments.apply(seq, departments);
                }
                Err(err) => {
                    if self.departments.fail(seq) {
                        log::warn!("department fetch failed: {err}");
                    }
                }
            },
            FetchOutcome::CityListing { seq, result } => match result {
                Ok(cities) => {
                    let cities = dedupe_by_key(Layer::City, cities, |c| c.name.clone());
                    self.cities.apply(seq, cities);
                }
                Err(err) => {
                    if self.cities.fail(seq) {
                        log::warn!("city listing fetch failed: {err}");
                    }
                }
            },
            FetchOutcome::CityBounds { seq, result } => match result {
                Ok(bounded) => {
                    let BoundedCities {
                        cities,
                        avgprice,
                        avgprice_sqm,
                    } = bounded;
                    let cities = dedupe_by_key(Layer::City, cities, |c| c.name.clone());
                    if self.cities.apply(seq, cities) && self.config.aggregate_owner == Layer::City
                    {
                        self.publish_aggregates(avgprice, avgprice_sqm);
                    }
                }
                Err(err) => {
                    if self.cities.fail(seq) {
                        log::warn!("city window fetch failed: {err}");
                    }
                }
            },
            FetchOutcome::SalesListing { seq, result } => match result {
                Ok(transactions) => {
                    let transactions = dedupe_by_key(Layer::Sales, transactions, |t| t.id);
                    self.sales.apply(seq, transactions);
                }
                Err(err) => {
                    if self.sales.fail(seq) {
                        log::warn!("sales listing fetch failed: {err}");
                    }
                }
            },
            FetchOutcome::SalesBounds { seq, result } => match result {
                Ok(bounded) => {
                    let BoundedTransactions {
                        transactions,
                        avgprice,
                        avgprice_sqm,
                    } = bounded;
                    let transactions = dedupe_by_key(Layer::Sales, transactions, |t| t.id);
                    if self.sales.apply(seq, transactions)
                        && self.config.aggregate_owner == Layer::Sales
                    {
                        self.publish_aggregates(avgprice, avgprice_sqm);
                    }
                }
                Err(err) => {
                    if self.sales.fail(seq) {
                        log::warn!("sales window fetch failed: {err}");
                    }
                }
            },
            FetchOutcome::Geocoded { query, result } => match result {
                Ok(Some(point)) => {
                    log::debug!("address {query:?} resolved to ({}, {})", point.lat, point.lng);
                    self.store.set_position([point.lat, point.lng]);
                    self.fly_to(point.lat, point.lng);
                }
                Ok(None) => log::debug!("address {query:?} matched nothing"),
                Err(err) => log::warn!("address search failed: {err}"),
            },
        }

        if self.in_flight == 0 {
            for ack in self.idle_waiters.drain(..) {
                let _ = ack.send(());
            }
        }
    }

    // ── Fetch spawns ────────────────────────────────────────────────────

    fn mount_fetches(&mut self) {
        self.fetch_regions();
        self.fetch_departments();
        self.fetch_city_listing();
        self.fetch_sales_listing();
    }

    fn fetch_regions(&mut self) {
        let seq = self.regions.begin_fetch();
        let api = Arc::clone(&self.api);
        let tx = self.msg_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = api.regions().await;
            let _ = tx
                .send(EngineMsg::Outcome(FetchOutcome::Regions { seq, result }))
                .await;
        });
    }

    fn fetch_departments(&mut self) {
        let seq = self.departments.begin_fetch();
        let api = Arc::clone(&self.api);
        let tx = self.msg_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = api.departments().await;
            let _ = tx
                .send(EngineMsg::Outcome(FetchOutcome::Departments { seq, result }))
                .await;
        });
    }

    fn fetch_city_listing(&mut self) {
        let request = composer::city_listing_request(&self.query_filter());
        let seq = self.cities.begin_fetch();
        let api = Arc::clone(&self.api);
        let tx = self.msg_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = api.cities(request.limit, &request.department).await;
            let _ = tx
                .send(EngineMsg::Outcome(FetchOutcome::CityListing { seq, result }))
                .await;
        });
    }

    fn fetch_sales_listing(&mut self) {
        let limit = self.store.limit();
        let seq = self.sales.begin_fetch();
        let api = Arc::clone(&self.api);
        let tx = self.msg_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = api.pois(limit).await;
            let _ = tx
                .send(EngineMsg::Outcome(FetchOutcome::SalesListing { seq, result }))
                .await;
        });
    }

    fn fetch_city_bounds(&mut self, bounds: ViewportBounds) {
        let request = composer::city_bounds_request(bounds);
        let seq = self.cities.begin_fetch();
        let api = Arc::clone(&self.api);
        let tx = self.msg_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = api.cities_in_bounds(request.body, request.limit).await;
            let _ = tx
                .send(EngineMsg::Outcome(FetchOutcome::CityBounds { seq, result }))
                .await;
        });
    }

    fn fetch_sales_bounds(&mut self, bounds: ViewportBounds) {
        let request = composer::poi_filter_request(bounds, &self.query_filter());
        let seq = self.sales.begin_fetch();
        let api = Arc::clone(&self.api);
        let tx = self.msg_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = api
                .pois_in_bounds(&request.body, request.limit, request.year)
                .await;
            let _ = tx
                .send(EngineMsg::Outcome(FetchOutcome::SalesBounds { seq, result }))
                .await;
        });
    }

    fn refetch_sales(&mut self) {
        let Some(bounds) = self.last_bounds else {
            log::debug!("sales refetch skipped: no viewport observed yet");
            return;
        };
        self.fetch_sales_bounds(bounds);
    }

    fn fetch_geocode(&mut self, query: String) {
        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.msg_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = geocoder.resolve(&query).await;
            let _ = tx
                .send(EngineMsg::Outcome(FetchOutcome::Geocoded { query, result }))
                .await;
        });
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn query_filter(&self) -> QueryFilter {
        QueryFilter {
            department: self.store.department(),
            year: self.store.year(),
            limit: self.store.limit(),
        }
    }

    fn publish_aggregates(&self, avgprice: f64, avgprice_sqm: f64) {
        self.store.set_avg_price(avgprice);
        self.store.set_avg_price_sqm(avgprice_sqm);
    }

    fn fly_to(&self, lat: f64, lng: f64) {
        // fire and forget; an absent surface must not stall the queue
        let _ = self.commands.try_send(MapCommand::FlyTo { lat, lng });
    }

    fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            regions: self.regions.dataset().clone(),
            departments: self.departments.dataset().clone(),
            cities: self.cities.dataset().clone(),
            sales: self.sales.dataset().clone(),
        }
    }
}
