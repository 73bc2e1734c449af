use serde::{Serialize, Deserialize};
use thiserror::Error;

mod engine;
mod position;
mod state;
mod subscriber;
pub mod zoom;

pub use engine::NavigationEngine;
pub use position::{page_count, page_for_row, page_rows, RowSelection};
pub use state::{apply_navigation_event, NavigationState};
pub use subscriber::NavigationSubscriber;
pub use zoom::ViewWindow;

/// Rows shown per table page
pub const DEFAULT_ROWS_PER_PAGE: usize = 5;

/// View-bounds policy label for the curve graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMode {
    /// Fixed absolute window
    #[default]
    Default,
    /// Fit to data bounds
    Auto,
    /// Narrower window centered on the default window
    ZoomIn,
    /// Wider window centered on the default window
    ZoomOut,
}

impl ZoomMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoomMode::Default => "default",
            ZoomMode::Auto => "auto",
            ZoomMode::ZoomIn => "zoom_in",
            ZoomMode::ZoomOut => "zoom_out",
        }
    }
}

/// Events accepted by the navigation state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// Select a row by index; out-of-range values are clamped
    SelectRow(i64),
    /// Select row 0, used when the active view changes
    SelectFirstRow,
    Previous,
    Next,
    /// Select the row carrying a blank info number
    JumpToBlankInfo(u64),
    /// Timer tick; wraps to row 0 after the last row
    AutoAdvanceTick,
    ToggleAutoAdvance,
    SetAutoAdvance(bool),
    ToggleFullscreen,
    ExitFullscreen,
    SetZoom(ZoomMode),
    NextPage,
    PrevPage,
    /// A different coil or file became active
    OnCoilOrFileChange,
}

/// Rejected navigation requests. The state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("row {requested} out of range ({max_row} rows available)")]
    RowOutOfRange { requested: i64, max_row: usize },

    #[error("blank info {0} not found in the active dataset")]
    BlankInfoNotFound(u64),
}
