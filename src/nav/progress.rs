//! Reading progress derived from the scroll state of the viewport.

/// Scroll state of one element, in px
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

/// Everything the navigation panel shows for one scroll position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Fraction read. Not clamped: it leaves [0, 1] when the root heading
    /// sits far from the top, and so do the values derived from it.
    pub progress: f64,
    pub bar_height: i64,
    pub panel_scroll_top: f64,
    /// Negative once the reader is past the end
    pub remaining_words: i64,
}

impl ProgressUpdate {
    pub fn percent(&self) -> f64 {
        self.progress * 100.0
    }
}

/// Fraction of the document read: the viewport offset plus the root
/// heading's own offset, over the full scroll height
pub fn reading_progress(root_position: f64, viewport: &ScrollMetrics) -> f64 {
    (viewport.scroll_top + root_position * viewport.scroll_height) / viewport.scroll_height
}

/// Compute the panel state for the current scroll position.
///
/// `container_height` is the client height of the outline container and
/// `panel` the scroll state of its parent, which is scrolled along so the
/// current position stays visible.
pub fn compute(
    root_position: f64,
    total_words: usize,
    viewport: &ScrollMetrics,
    container_height: f64,
    panel: Option<&ScrollMetrics>,
) -> ProgressUpdate {
    let progress = reading_progress(root_position, viewport);

    // NaN from missing geometry is zeroed
    let bar_height = finite_or_zero((progress * container_height).round()) as i64;
    let panel_scroll_top = panel.map_or(0.0, |panel| {
        finite_or_zero(progress * (panel.scroll_height - panel.client_height))
    });
    let remaining_words = finite_or_zero((total_words as f64 * (1.0 - progress)).round()) as i64;

    ProgressUpdate {
        progress,
        bar_height,
        panel_scroll_top,
        remaining_words,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(scroll_top: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top,
            scroll_height: 2000.0,
            client_height: 500.0,
        }
    }

    #[test]
    fn test_start_of_document() {
        let update = compute(0.0, 1000, &viewport(0.0), 200.0, None);
        assert_eq!(update.progress, 0.0);
        assert_eq!(update.remaining_words, 1000);
        assert_eq!(update.bar_height, 0);
        assert_eq!(update.panel_scroll_top, 0.0);
    }

    #[test]
    fn test_halfway() {
        let panel = ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 700.0,
            client_height: 300.0,
        };
        let update = compute(0.0, 1000, &viewport(1000.0), 200.0, Some(&panel));
        assert_eq!(update.progress, 0.5);
        assert_eq!(update.remaining_words, 500);
        assert_eq!(update.bar_height, 100);
        assert_eq!(update.panel_scroll_top, 200.0);
        assert_eq!(update.percent(), 50.0);
    }

    #[test]
    fn test_root_position_shifts_progress() {
        // root heading starts a quarter of the way down
        let update = compute(0.25, 400, &viewport(500.0), 100.0, None);
        assert_eq!(update.progress, 0.5);
        assert_eq!(update.remaining_words, 200);
    }

    #[test]
    fn test_progress_past_the_edges() {
        // (1500 + 0.9 * 2000) / 2000
        let panel = ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 300.0,
            client_height: 100.0,
        };
        let update = compute(0.9, 1000, &viewport(1500.0), 200.0, Some(&panel));
        assert_eq!(update.progress, 1.65);
        assert_eq!(update.bar_height, 330);
        assert_eq!(update.panel_scroll_top, 330.0);
        assert_eq!(update.remaining_words, -650);

        let update = compute(-0.5, 1000, &viewport(0.0), 200.0, None);
        assert_eq!(update.progress, -0.5);
        assert_eq!(update.bar_height, -100);
        assert_eq!(update.remaining_words, 1500);
    }

    #[test]
    fn test_missing_geometry_does_not_panic() {
        let empty = ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 0.0,
            client_height: 0.0,
        };
        let update = compute(0.0, 1000, &empty, 200.0, None);
        assert!(update.progress.is_nan());
        assert_eq!(update.bar_height, 0);
        assert_eq!(update.remaining_words, 0);
    }

    #[test]
    fn test_rounding() {
        let update = compute(0.0, 3, &viewport(1000.0), 101.0, None);
        // 1.5 and 50.5 round away from zero
        assert_eq!(update.remaining_words, 2);
        assert_eq!(update.bar_height, 51);
    }
}
