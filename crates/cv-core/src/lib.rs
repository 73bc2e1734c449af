//! Core functionality for the coil measurement viewer
//!
//! This crate provides the dataset model, the row navigation state machine
//! and the session state shared by loaders and presentation layers.

pub mod dataset;
pub mod events;
pub mod navigation;
pub mod state;

// Re-export commonly used types
pub use dataset::{BlankInfo, DataKind, DataSeries, Dataset, ReferenceOrigin};
pub use navigation::{
    apply_navigation_event, NavigationEngine, NavigationError, NavigationEvent,
    NavigationState, NavigationSubscriber, RowSelection, ZoomMode,
};
pub use state::{Session, SessionSettings};
pub use data::CoilSource;

pub mod data {
    use crate::dataset::Dataset;

    /// Trait for sources of coil datasets (usually one measurement file)
    #[async_trait::async_trait]
    pub trait CoilSource: Send + Sync {
        /// List the coil identifiers available in this source, ordered by numeric key
        async fn coils(&self) -> anyhow::Result<Vec<String>>;

        /// Load a fresh dataset for one coil
        async fn load_coil(&self, coil: &str) -> anyhow::Result<Dataset>;

        /// Get the source name (display file name)
        fn source_name(&self) -> &str;
    }
}
