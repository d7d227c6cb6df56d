//! Repaint tracking for regions that rows no longer cover.
//!
//! Closing a row shrinks the content, so the pixels its descendants used to
//! occupy must be repainted even though no row is there any more. The
//! [`DamageTracker`] accumulates those rectangles into a single bounding
//! rectangle until the next paint consumes it.

use crate::geometry::Rect;

/// Accumulates damaged regions into one bounding rectangle.
///
/// # Example
///
/// ```
/// use horizon_proptree::damage::DamageTracker;
/// use horizon_proptree::Rect;
///
/// let mut tracker = DamageTracker::new();
/// tracker.add_damage(Rect::new(10.0, 10.0, 50.0, 30.0));
/// tracker.add_damage(Rect::new(100.0, 100.0, 20.0, 20.0));
///
/// assert_eq!(tracker.take(), Some(Rect::new(10.0, 10.0, 110.0, 110.0)));
/// assert!(!tracker.has_damage());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DamageTracker {
    damage: Option<Rect>,
    full_repaint: bool,
    viewport: Option<Rect>,
}

impl DamageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the viewport bounds, e.g. after a resize.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = Some(viewport);
    }

    /// Add a damaged region. Empty rectangles and regions outside the
    /// viewport are ignored.
    pub fn add_damage(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let rect = match &self.viewport {
            Some(viewport) => match rect.intersect(viewport) {
                Some(clipped) => clipped,
                None => return,
            },
            None => rect,
        };

        self.damage = Some(match self.damage {
            Some(existing) => existing.union(&rect),
            None => rect,
        });
    }

    /// Mark the entire viewport as damaged.
    pub fn invalidate_all(&mut self) {
        self.full_repaint = true;
        self.damage = self.viewport;
    }

    /// The current damage, or the viewport after [`invalidate_all`](Self::invalidate_all).
    pub fn damage_region(&self) -> Option<Rect> {
        if self.full_repaint {
            self.viewport
        } else {
            self.damage
        }
    }

    #[inline]
    pub fn has_damage(&self) -> bool {
        self.damage.is_some() || self.full_repaint
    }

    #[inline]
    pub fn needs_full_repaint(&self) -> bool {
        self.full_repaint
    }

    /// Return the damage region and clear the tracker.
    pub fn take(&mut self) -> Option<Rect> {
        let region = self.damage_region();
        self.clear();
        region
    }

    pub fn clear(&mut self) {
        self.damage = None;
        self.full_repaint = false;
    }
}
