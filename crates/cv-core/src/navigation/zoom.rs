//! Numeric view windows behind the zoom modes

use super::ZoomMode;

/// Closed axis interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewWindow {
    pub min: f64,
    pub max: f64,
}

impl ViewWindow {
    /// Default window for the primary (screwdown/bending) axis
    pub const PRIMARY: ViewWindow = ViewWindow { min: -1000.0, max: 2000.0 };
    /// Default window for the secondary (profile) axis
    pub const SECONDARY: ViewWindow = ViewWindow { min: -600.0, max: 600.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Same center, span multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        let half = self.span() * factor / 2.0;
        Self::new(self.center() - half, self.center() + half)
    }

    /// Window for a zoom mode; `None` means fit to data
    pub fn for_mode(mode: ZoomMode, default: ViewWindow) -> Option<Self> {
        mode.scale_factor().map(|factor| default.scaled(factor))
    }
}

impl ZoomMode {
    /// Span multiplier relative to the default window
    pub fn scale_factor(&self) -> Option<f64> {
        match self {
            ZoomMode::Default => Some(1.0),
            ZoomMode::Auto => None,
            ZoomMode::ZoomIn => Some(0.75),
            ZoomMode::ZoomOut => Some(1.25),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_windows_share_center() {
        let default = ViewWindow::SECONDARY;
        let zoom_in = ViewWindow::for_mode(ZoomMode::ZoomIn, default).unwrap();
        let zoom_out = ViewWindow::for_mode(ZoomMode::ZoomOut, default).unwrap();

        assert_eq!(zoom_in, ViewWindow::new(-450.0, 450.0));
        assert_eq!(zoom_out, ViewWindow::new(-750.0, 750.0));
        assert_eq!(zoom_in.center(), default.center());
        assert!(zoom_in.span() < default.span() && default.span() < zoom_out.span());
    }

    #[test]
    fn test_auto_has_no_fixed_window() {
        assert_eq!(ViewWindow::for_mode(ZoomMode::Auto, ViewWindow::PRIMARY), None);
        assert_eq!(
            ViewWindow::for_mode(ZoomMode::Default, ViewWindow::PRIMARY),
            Some(ViewWindow::PRIMARY)
        );
    }
}
