//! Scroll behavior of the message pane across poll refreshes.
//!
//! A refresh replaces the whole message list. The pane should follow the
//! conversation when the reader is at the bottom and stay put when they
//! are reading history.

use serde::{Deserialize, Serialize};

/// Distance from the bottom, in pixels, that still counts as "at the bottom".
pub const NEAR_BOTTOM_PX: f64 = 200.0;

/// Scroll metrics of the message pane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }
}

/// Whether the pane is within `threshold` of the bottom. A pane that is not
/// mounted counts as at the bottom.
pub fn is_near_bottom(viewport: Option<&Viewport>, threshold: f64) -> bool {
    viewport.map_or(true, |v| v.distance_from_bottom() < threshold)
}

/// What to do with the pane after a refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAction {
    ToBottom,
    /// Put `scroll_top` back where it was.
    Restore(f64),
    Keep,
}

/// Auto-scroll flag plus the near-bottom threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPolicy {
    auto_scroll: bool,
    threshold: f64,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self::with_threshold(NEAR_BOTTOM_PX)
    }
}

impl ScrollPolicy {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            auto_scroll: true,
            threshold,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.auto_scroll
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Follow the next refresh to the bottom. Used on conversation open and
    /// after the local user sends.
    pub fn arm(&mut self) {
        self.auto_scroll = true;
    }

    pub fn disarm(&mut self) {
        self.auto_scroll = false;
    }

    /// The reader scrolled. Leaving the bottom zone cancels auto-scroll;
    /// returning to it does not re-arm.
    pub fn on_user_scroll(&mut self, viewport: &Viewport) {
        if !is_near_bottom(Some(viewport), self.threshold) {
            self.auto_scroll = false;
        }
    }

    /// Decide the scroll action for a refresh. `before` is the pane as it was
    /// prior to the new list being rendered.
    pub fn on_refresh(&mut self, before: Option<&Viewport>, has_new: bool) -> ScrollAction {
        if self.auto_scroll {
            self.auto_scroll = false;
            return ScrollAction::ToBottom;
        }
        if has_new && is_near_bottom(before, self.threshold) {
            return ScrollAction::ToBottom;
        }
        match before {
            Some(v) => ScrollAction::Restore(v.scroll_top),
            None => ScrollAction::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading_history() -> Viewport {
        Viewport::new(100.0, 2000.0, 500.0)
    }

    fn at_bottom() -> Viewport {
        Viewport::new(1350.0, 2000.0, 500.0)
    }

    #[test]
    fn test_near_bottom() {
        assert!(is_near_bottom(Some(&at_bottom()), NEAR_BOTTOM_PX));
        assert!(!is_near_bottom(Some(&reading_history()), NEAR_BOTTOM_PX));
        assert!(is_near_bottom(None, NEAR_BOTTOM_PX));
        // Exactly 200px away is no longer near.
        assert!(!is_near_bottom(Some(&Viewport::new(1300.0, 2000.0, 500.0)), 200.0));
    }

    #[test]
    fn test_armed_refresh_scrolls_once() {
        let mut policy = ScrollPolicy::default();
        assert_eq!(
            policy.on_refresh(Some(&reading_history()), false),
            ScrollAction::ToBottom
        );
        assert!(!policy.is_armed());
        assert_eq!(
            policy.on_refresh(Some(&reading_history()), false),
            ScrollAction::Restore(100.0)
        );
    }

    #[test]
    fn test_new_messages_follow_when_at_bottom() {
        let mut policy = ScrollPolicy::default();
        policy.disarm();
        assert_eq!(policy.on_refresh(Some(&at_bottom()), true), ScrollAction::ToBottom);
        assert_eq!(
            policy.on_refresh(Some(&at_bottom()), false),
            ScrollAction::Restore(1350.0)
        );
    }

    #[test]
    fn test_reading_history_is_preserved() {
        let mut policy = ScrollPolicy::default();
        policy.disarm();
        assert_eq!(
            policy.on_refresh(Some(&reading_history()), true),
            ScrollAction::Restore(100.0)
        );
    }

    #[test]
    fn test_user_scroll_disarms() {
        let mut policy = ScrollPolicy::default();
        policy.on_user_scroll(&at_bottom());
        assert!(policy.is_armed());
        policy.on_user_scroll(&reading_history());
        assert!(!policy.is_armed());
        policy.on_user_scroll(&at_bottom());
        assert!(!policy.is_armed());
    }

    #[test]
    fn test_unmounted_pane() {
        let mut policy = ScrollPolicy::default();
        policy.disarm();
        assert_eq!(policy.on_refresh(None, true), ScrollAction::ToBottom);
        assert_eq!(policy.on_refresh(None, false), ScrollAction::Keep);
    }
}
