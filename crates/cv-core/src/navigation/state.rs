//! Navigation state and its transition function

use super::position::{page_count, page_for_row, RowSelection};
use super::{NavigationError, NavigationEvent, ZoomMode, DEFAULT_ROWS_PER_PAGE};
use crate::dataset::BlankInfo;

/// Row/page/view state for the active dataset
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    pub selection: RowSelection,
    /// 1-based
    pub current_page: usize,
    pub rows_per_page: usize,
    pub zoom_mode: ZoomMode,
    pub fullscreen: bool,
    pub auto_advance: bool,
    pub max_row: usize,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new(0, DEFAULT_ROWS_PER_PAGE)
    }
}

impl NavigationState {
    /// State for a freshly loaded dataset
    pub fn new(max_row: usize, rows_per_page: usize) -> Self {
        Self {
            selection: RowSelection::Unselected,
            current_page: 1,
            rows_per_page: rows_per_page.max(1),
            zoom_mode: ZoomMode::Default,
            fullscreen: false,
            auto_advance: false,
            max_row,
        }
    }

    pub fn current_row(&self) -> Option<usize> {
        self.selection.row()
    }

    pub fn page_count(&self) -> usize {
        page_count(self.max_row, self.rows_per_page)
    }

    /// Whether the auto-advance timer should be running
    pub fn auto_advance_active(&self) -> bool {
        self.auto_advance && self.selection.is_selected()
    }

    /// Apply one event against the active dataset's blank info.
    ///
    /// `max_row` is taken from `blank_info`. On error the caller keeps `self`.
    pub fn apply(
        &self,
        event: &NavigationEvent,
        blank_info: &BlankInfo,
    ) -> Result<Self, NavigationError> {
        let max_row = blank_info.len();
        let mut next = self.clone();
        next.max_row = max_row;

        match event {
            NavigationEvent::SelectRow(requested) => {
                let row = clamp_row(*requested, max_row)?;
                Ok(next.with_row(row))
            }
            NavigationEvent::SelectFirstRow => {
                let row = clamp_row(0, max_row)?;
                Ok(next.with_row(row))
            }
            NavigationEvent::Previous => {
                let current = self.current_row().unwrap_or(0) as i64;
                let row = clamp_row(current - 1, max_row)?;
                Ok(next.with_row(row))
            }
            NavigationEvent::Next => {
                let current = self.current_row().unwrap_or(0) as i64;
                let row = clamp_row(current + 1, max_row)?;
                Ok(next.with_row(row))
            }
            NavigationEvent::JumpToBlankInfo(number) => {
                match blank_info.resolve(*number) {
                    Some(row) if row < max_row => Ok(next.with_row(row)),
                    _ => Err(NavigationError::BlankInfoNotFound(*number)),
                }
            }
            NavigationEvent::AutoAdvanceTick => {
                match self.selection {
                    RowSelection::Selected(row) if self.auto_advance && max_row > 0 => {
                        Ok(next.with_row((row + 1) % max_row))
                    }
                    _ => Ok(next),
                }
            }
            NavigationEvent::ToggleAutoAdvance => {
                next.auto_advance = !self.auto_advance;
                Ok(next)
            }
            NavigationEvent::SetAutoAdvance(enabled) => {
                next.auto_advance = *enabled;
                Ok(next)
            }
            NavigationEvent::ToggleFullscreen => {
                next.fullscreen = !self.fullscreen;
                Ok(next)
            }
            NavigationEvent::ExitFullscreen => {
                next.fullscreen = false;
                Ok(next)
            }
            NavigationEvent::SetZoom(mode) => {
                next.zoom_mode = *mode;
                Ok(next)
            }
            NavigationEvent::NextPage => {
                next.current_page = (self.current_page + 1).min(next.page_count());
                Ok(next)
            }
            NavigationEvent::PrevPage => {
                next.current_page = self.current_page.saturating_sub(1).clamp(1, next.page_count());
                Ok(next)
            }
            NavigationEvent::OnCoilOrFileChange => {
                // fullscreen is a display preference and survives the switch
                let mut reset = NavigationState::new(max_row, self.rows_per_page);
                reset.fullscreen = self.fullscreen;
                Ok(reset)
            }
        }
    }

    fn with_row(mut self, row: usize) -> Self {
        self.selection = RowSelection::Selected(row);
        self.current_page = page_for_row(row, self.rows_per_page);
        self
    }
}

/// Apply a navigation event; see [`NavigationState::apply`]
pub fn apply_navigation_event(
    state: &NavigationState,
    event: &NavigationEvent,
    blank_info: &BlankInfo,
) -> Result<NavigationState, NavigationError> {
    state.apply(event, blank_info)
}

fn clamp_row(requested: i64, max_row: usize) -> Result<usize, NavigationError> {
    if max_row == 0 {
        return Err(NavigationError::RowOutOfRange { requested, max_row });
    }
    Ok(requested.clamp(0, max_row as i64 - 1) as usize)
}
