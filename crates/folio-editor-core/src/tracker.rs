//! Selection Tracker: decides whether the formatting toolbar shows, and
//! where.
//!
//! The host calls [`SelectionTracker::update`] on every selection change,
//! including each step of a drag. Updates are last-write-wins and never
//! touch the tree.

use crate::dom::Surface;
use crate::types::{Rect, Selection, Viewport};

/// Toolbar dimensions and spacing, in CSS pixels.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct ToolbarMetrics {
    pub width: f64,
    pub height: f64,
    /// Minimum distance to any viewport edge.
    pub edge_margin: f64,
    /// Distance between the selection and the toolbar.
    pub gap: f64,
}

impl Default for ToolbarMetrics {
    fn default() -> Self {
        Self {
            width: 350.0,
            height: 50.0,
            edge_margin: 10.0,
            gap: 10.0,
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Placement {
    Above,
    Below,
}

/// Top-left corner of the toolbar in viewport coordinates.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct ToolbarAnchor {
    pub left: f64,
    pub top: f64,
    pub placement: Placement,
}

/// Result of the last update.
#[derive(Clone, Debug, Copy, PartialEq, Default)]
pub enum TrackerState {
    #[default]
    Inactive,
    Active {
        selection: Selection,
        rect: Rect,
        anchor: ToolbarAnchor,
    },
}

impl TrackerState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn anchor(&self) -> Option<ToolbarAnchor> {
        match self {
            Self::Active { anchor, .. } => Some(*anchor),
            Self::Inactive => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SelectionTracker {
    metrics: ToolbarMetrics,
    state: TrackerState,
}

impl SelectionTracker {
    pub fn new(metrics: ToolbarMetrics) -> Self {
        Self {
            metrics,
            state: TrackerState::Inactive,
        }
    }

    pub fn metrics(&self) -> ToolbarMetrics {
        self.metrics
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Capture a selection change. Anything that can't be shown (no
    /// selection, a caret, a degenerate rectangle, a selection outside the
    /// surface) reports inactive.
    pub fn update(
        &mut self,
        surface: &Surface,
        selection: Option<Selection>,
        viewport: Viewport,
    ) -> &TrackerState {
        self.state = match selection {
            Some(selection) => self.evaluate(surface, selection, viewport),
            None => TrackerState::Inactive,
        };
        tracing::trace!(target: "folio::tracker", active = self.state.is_active(), "selection changed");
        &self.state
    }

    pub fn clear(&mut self) {
        self.state = TrackerState::Inactive;
    }

    fn evaluate(&self, surface: &Surface, selection: Selection, viewport: Viewport) -> TrackerState {
        if selection.is_collapsed() {
            return TrackerState::Inactive;
        }
        if !surface.contains(selection.anchor.node) || !surface.contains(selection.focus.node) {
            tracing::trace!(target: "folio::tracker", "selection outside surface");
            return TrackerState::Inactive;
        }
        let rect = selection.rect;
        if !rect.is_finite() || rect.is_empty() {
            return TrackerState::Inactive;
        }
        match toolbar_anchor(rect, viewport, self.metrics) {
            Some(anchor) => TrackerState::Active {
                selection,
                rect,
                anchor,
            },
            None => TrackerState::Inactive,
        }
    }
}

/// Place the toolbar centred above `rect`, flipping below when there is no
/// room, and keep it `edge_margin` away from every viewport edge.
///
/// `None` if the geometry is not usable.
pub fn toolbar_anchor(rect: Rect, viewport: Viewport, metrics: ToolbarMetrics) -> Option<ToolbarAnchor> {
    let ToolbarMetrics {
        width,
        height,
        edge_margin: margin,
        gap,
    } = metrics;
    let finite = [viewport.width, viewport.height, width, height, margin, gap]
        .iter()
        .all(|v| v.is_finite());
    if !finite || !rect.is_finite() {
        return None;
    }

    let centred = rect.left + rect.width / 2.0 - width / 2.0;
    let left = clamp(centred, margin, viewport.width - width - margin);

    let above = rect.top - height - gap;
    let (top, placement) = if above < margin {
        (rect.bottom() + gap, Placement::Below)
    } else {
        (above, Placement::Above)
    };
    let top = clamp(top, margin, viewport.height - height - margin);

    Some(ToolbarAnchor {
        left,
        top,
        placement,
    })
}

/// Clamp that prefers `min` when the window is narrower than the toolbar.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;
    use crate::types::Boundary;

    fn ranged(surface: &Surface, rect: Rect) -> Selection {
        let text = surface.text_segments()[0].0;
        Selection::new(Boundary::new(text, 0), Boundary::new(text, 3)).with_rect(rect)
    }

    #[test]
    fn test_centred_above() {
        let anchor = toolbar_anchor(
            Rect::new(400.0, 300.0, 100.0, 20.0),
            Viewport::new(1000.0, 800.0),
            ToolbarMetrics::default(),
        )
        .unwrap();
        assert_eq!(anchor.left, 275.0);
        assert_eq!(anchor.top, 240.0);
        assert_eq!(anchor.placement, Placement::Above);
    }

    #[test]
    fn test_clamped_to_edges() {
        let viewport = Viewport::new(1000.0, 800.0);
        let metrics = ToolbarMetrics::default();
        let left_edge = toolbar_anchor(Rect::new(0.0, 300.0, 40.0, 20.0), viewport, metrics).unwrap();
        assert_eq!(left_edge.left, 10.0);
        let right_edge = toolbar_anchor(Rect::new(950.0, 300.0, 40.0, 20.0), viewport, metrics).unwrap();
        assert_eq!(right_edge.left, 640.0);
    }

    #[test]
    fn test_flips_below_near_top() {
        let anchor = toolbar_anchor(
            Rect::new(500.0, 20.0, 100.0, 20.0),
            Viewport::new(1000.0, 800.0),
            ToolbarMetrics::default(),
        )
        .unwrap();
        assert_eq!(anchor.placement, Placement::Below);
        assert_eq!(anchor.top, 50.0);
    }

    #[test]
    fn test_tracker_reports_inactive_for_unusable_selections() {
        let surface = html::parse("<p>some text</p>");
        let viewport = Viewport::new(1000.0, 800.0);
        let mut tracker = SelectionTracker::default();

        let good = ranged(&surface, Rect::new(100.0, 200.0, 50.0, 18.0));
        assert!(tracker.update(&surface, Some(good), viewport).is_active());

        let caret = Selection::caret(good.anchor).with_rect(good.rect);
        assert!(!tracker.update(&surface, Some(caret), viewport).is_active());

        let flat = ranged(&surface, Rect::new(100.0, 200.0, 0.0, 18.0));
        assert!(!tracker.update(&surface, Some(flat), viewport).is_active());

        let nan = ranged(&surface, Rect::new(f64::NAN, 200.0, 10.0, 18.0));
        assert!(!tracker.update(&surface, Some(nan), viewport).is_active());

        let mut detached = surface.clone();
        let loose = detached.create_text("loose");
        let outside = Selection::new(Boundary::new(loose, 0), Boundary::new(loose, 3)).with_rect(good.rect);
        assert!(!tracker.update(&detached, Some(outside), viewport).is_active());

        assert!(tracker.update(&surface, Some(good), viewport).is_active());
        assert!(!tracker.update(&surface, None, viewport).is_active());
    }

    #[test]
    fn test_last_update_wins() {
        let surface = html::parse("<p>drag me</p>");
        let viewport = Viewport::new(1000.0, 800.0);
        let mut tracker = SelectionTracker::default();
        for x in [300.0, 320.0, 340.0] {
            tracker.update(&surface, Some(ranged(&surface, Rect::new(x, 300.0, 50.0, 18.0))), viewport);
        }
        assert_eq!(tracker.state().anchor().unwrap().left, 340.0 + 25.0 - 175.0);
    }
}
