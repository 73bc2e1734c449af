use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::data::CoilSource;
use crate::dataset::{DataKind, Dataset};
use crate::events::events::{
    CoilLoadFailed, DataKindMissing, DatasetLoaded, SourceOpened, SyntheticReferenceUsed,
};
use crate::events::EventBus;
use crate::navigation::{
    NavigationEngine, NavigationError, NavigationEvent, NavigationState, DEFAULT_ROWS_PER_PAGE,
};

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Rows per table page
    pub rows_per_page: usize,

    /// How often the host should send `AutoAdvanceTick`
    pub auto_advance_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            auto_advance_interval: Duration::from_millis(2000),
        }
    }
}

/// One viewing session: a single active dataset and its navigation state
pub struct Session {
    /// The navigation engine
    pub navigation: Arc<NavigationEngine>,

    /// The event bus
    pub event_bus: Arc<EventBus>,

    /// The currently opened source
    source: Arc<RwLock<Option<Arc<dyn CoilSource>>>>,

    /// Coils listed by the current source
    coils: Arc<RwLock<Vec<String>>>,

    /// The active dataset
    dataset: Arc<RwLock<Option<Arc<Dataset>>>>,

    /// Serializes coil loads so dataset and navigation swap together
    load_guard: tokio::sync::Mutex<()>,

    settings: SessionSettings,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            navigation: Arc::new(NavigationEngine::new(settings.rows_per_page)),
            event_bus: Arc::new(EventBus::new()),
            source: Arc::new(RwLock::new(None)),
            coils: Arc::new(RwLock::new(Vec::new())),
            dataset: Arc::new(RwLock::new(None)),
            load_guard: tokio::sync::Mutex::new(()),
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Open a source, list its coils and load the first one
    pub async fn open_source(&self, source: Arc<dyn CoilSource>) -> anyhow::Result<Vec<String>> {
        let coils = source.coils().await?;
        if coils.is_empty() {
            anyhow::bail!("no coils found in {}", source.source_name());
        }
        tracing::info!("Opened {} with coils {:?}", source.source_name(), coils);

        *self.source.write() = Some(source.clone());
        *self.coils.write() = coils.clone();
        self.event_bus.publish(SourceOpened {
            source_name: source.source_name().to_string(),
            coils: coils.clone(),
        });

        self.select_coil(&coils[0]).await?;
        Ok(coils)
    }

    /// Load a coil and make it the active dataset.
    ///
    /// On failure the previous dataset stays active.
    pub async fn select_coil(&self, coil: &str) -> anyhow::Result<Arc<Dataset>> {
        let _guard = self.load_guard.lock().await;

        let source = self
            .source
            .read()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no source opened"))?;

        let dataset = match source.load_coil(coil).await {
            Ok(dataset) => Arc::new(dataset),
            Err(e) => {
                tracing::error!("Failed to load {} from {}: {}", coil, source.source_name(), e);
                self.event_bus.publish(CoilLoadFailed {
                    source_name: source.source_name().to_string(),
                    coil: coil.to_string(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        for kind in DataKind::ALL {
            match dataset.series(kind) {
                None => {
                    self.event_bus.publish(DataKindMissing {
                        coil: coil.to_string(),
                        kind,
                    });
                }
                Some(series) if series.has_synthetic_reference() => {
                    self.event_bus.publish(SyntheticReferenceUsed {
                        coil: coil.to_string(),
                        kind,
                    });
                }
                Some(_) => {}
            }
        }

        *self.dataset.write() = Some(dataset.clone());
        self.navigation.load_dataset(dataset.blank_info.clone());

        tracing::info!("Active dataset: {} ({} rows)", coil, dataset.row_count());
        self.event_bus.publish(DatasetLoaded {
            source_name: source.source_name().to_string(),
            coil: coil.to_string(),
            row_count: dataset.row_count(),
            kinds: dataset.kinds(),
            first_blank_info: dataset.blank_info.get(0),
        });

        Ok(dataset)
    }

    /// Apply a navigation event to the active dataset
    pub fn navigate(&self, event: NavigationEvent) -> Result<NavigationState, NavigationError> {
        self.navigation.dispatch(event)
    }

    /// Get the active dataset
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.read().clone()
    }

    /// Coils listed by the current source
    pub fn coils(&self) -> Vec<String> {
        self.coils.read().clone()
    }

    pub fn current_coil(&self) -> Option<String> {
        self.dataset.read().as_ref().map(|d| d.coil.clone())
    }

    /// Row index of a blank info number in the active dataset
    pub fn resolve_blank_info(&self, number: u64) -> Option<usize> {
        self.dataset
            .read()
            .as_ref()
            .and_then(|d| d.resolve_blank_info(number))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}
