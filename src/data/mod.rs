//! Dataset loading: fetch the world topology, then the strike collection.
//!
//! The pipeline runs on a background thread and reports each stage as a
//! [`LoadEvent`]; the UI thread applies them between input events.

use std::fs;
use std::io::Read;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use geojson::{Feature, FeatureCollection, Value};
use tracing::{error, info};

use crate::config::{GlobeConfig, Source};
use crate::error::LoadError;
use crate::map::topology::Topology;
use crate::map::Strike;

/// Anything that can turn a [`Source`] into bytes
pub trait Fetch {
    fn fetch(&self, source: &Source) -> Result<Vec<u8>, LoadError>;
}

/// Blocking HTTP(S) client with a per-request timeout; also reads local files
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, source: &Source) -> Result<Vec<u8>, LoadError> {
        match source {
            Source::Http(url) => {
                let response = self.agent.get(url).call().map_err(|e| LoadError::Http {
                    url: url.clone(),
                    source: Box::new(e),
                })?;
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut bytes)
                    .map_err(|source| LoadError::Io {
                        location: url.clone(),
                        source,
                    })?;
                Ok(bytes)
            }
            Source::File(path) => fs::read(path).map_err(|source| LoadError::Io {
                location: path.display().to_string(),
                source,
            }),
        }
    }
}

/// What to load and from where
#[derive(Clone, Debug)]
pub struct LoadPlan {
    pub world: Source,
    pub countries_object: String,
    pub strikes: Source,
}

impl LoadPlan {
    pub fn from_config(config: &GlobeConfig) -> Self {
        Self {
            world: config.world.clone(),
            countries_object: config.countries_object.clone(),
            strikes: config.strikes.clone(),
        }
    }
}

/// Completion of one pipeline stage
#[derive(Debug)]
pub enum LoadEvent {
    World(Result<Vec<Feature>, LoadError>),
    Strikes(Result<Vec<Strike>, LoadError>),
}

/// Load the world, then (only if that succeeded) the strikes, reporting
/// each stage through `emit`. A failed stage ends the pipeline.
pub fn run_pipeline<F: Fetch + ?Sized>(
    fetcher: &F,
    plan: &LoadPlan,
    mut emit: impl FnMut(LoadEvent),
) {
    let world = load_world(fetcher, plan);
    if let Err(e) = &world {
        error!(error = %e, "world topology load failed");
    }
    let world_loaded = world.is_ok();
    emit(LoadEvent::World(world));
    if !world_loaded {
        return;
    }

    let strikes = load_strikes(fetcher, &plan.strikes);
    if let Err(e) = &strikes {
        error!(error = %e, "strike data load failed");
    }
    emit(LoadEvent::Strikes(strikes));
}

/// Run the pipeline on a named background thread, sending events to `tx`.
pub fn spawn_loader<F>(
    fetcher: F,
    plan: LoadPlan,
    tx: Sender<LoadEvent>,
) -> std::io::Result<JoinHandle<()>>
where
    F: Fetch + Send + 'static,
{
    thread::Builder::new()
        .name("globe-loader".to_string())
        .spawn(move || {
            run_pipeline(&fetcher, &plan, |event| {
                // Receiver gone means the UI has quit
                let _ = tx.send(event);
            })
        })
}

fn load_world<F: Fetch + ?Sized>(fetcher: &F, plan: &LoadPlan) -> Result<Vec<Feature>, LoadError> {
    let location = plan.world.location();
    info!(%location, "fetching world topology");

    let mut bytes = fetcher.fetch(&plan.world)?;
    let topology = Topology::from_slice(&mut bytes, &location)?;
    let countries = topology.features(&plan.countries_object)?;

    info!(countries = countries.len(), "world topology decoded");
    Ok(countries)
}

fn load_strikes<F: Fetch + ?Sized>(fetcher: &F, source: &Source) -> Result<Vec<Strike>, LoadError> {
    let location = source.location();
    info!(%location, "fetching strike data");

    let mut bytes = fetcher.fetch(source)?;
    let records = parse_strikes(&mut bytes, &location)?;
    let total = records.len();
    let located = retain_located(records);

    info!(total, located = located.len(), "strike data filtered");
    Ok(located.iter().filter_map(Strike::from_feature).collect())
}

/// Parse a GeoJSON FeatureCollection of strike records.
pub fn parse_strikes(bytes: &mut [u8], location: &str) -> Result<Vec<Feature>, LoadError> {
    let collection: FeatureCollection =
        simd_json::serde::from_slice(bytes).map_err(|source| LoadError::Json {
            location: location.to_string(),
            source,
        })?;
    Ok(collection.features)
}

/// Keep only records that carry coordinates. Survivors are returned
/// untouched and in their original order.
pub fn retain_located(records: Vec<Feature>) -> Vec<Feature> {
    records.into_iter().filter(has_coordinates).collect()
}

/// A record is plottable when its geometry is a Point with at least a
/// longitude and a latitude.
pub fn has_coordinates(record: &Feature) -> bool {
    matches!(
        record.geometry.as_ref().map(|g| &g.value),
        Some(Value::Point(coords)) if coords.len() >= 2
    )
}
