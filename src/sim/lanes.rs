//! Lane geometry
//!
//! Lane centers depend only on the viewport width, the lane count and the
//! track inset, so they are recomputed from scratch whenever any of those
//! can change instead of being cached.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Host viewport size in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Result<Self, ConfigError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }
}

/// Ordered lane-center X coordinates, left to right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneCenters(Vec<f32>);

impl LaneCenters {
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Center of `lane`; out-of-range lanes map to the nearest edge lane
    pub fn x(&self, lane: usize) -> f32 {
        self.0[lane.min(self.0.len().saturating_sub(1))]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Fractions of the usable track width at which lane centers sit
fn lane_fractions(lane_count: usize) -> &'static [f32] {
    match lane_count {
        4 => &[1.0 / 8.0, 3.0 / 8.0, 5.0 / 8.0, 7.0 / 8.0],
        3 => &[1.0 / 4.0, 2.0 / 4.0, 3.0 / 4.0],
        _ => &[1.0 / 3.0, 2.0 / 3.0],
    }
}

/// Compute lane centers for a viewport width.
///
/// `lane_count` must already be validated to 2..=4.
pub fn lane_centers(screen_width: f32, lane_count: usize, inset_fraction: f32) -> LaneCenters {
    debug_assert!((2..=4).contains(&lane_count));
    let margin = screen_width * inset_fraction;
    let track_width = screen_width - margin * 2.0;
    LaneCenters(
        lane_fractions(lane_count)
            .iter()
            .map(|f| margin + track_width * f)
            .collect(),
    )
}

/// Lane whose center is closest to `x`
pub fn nearest_lane(centers: &LaneCenters, x: f32) -> usize {
    centers
        .as_slice()
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - x)
                .abs()
                .partial_cmp(&(*b - x).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_centers(actual: &LaneCenters, expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.as_slice().iter().zip(expected) {
            assert!((a - e).abs() < 1e-3, "{a} != {e}");
        }
    }

    #[test]
    fn test_known_fractions() {
        // 800 wide with a 10% inset: usable width 640 starting at x=80
        assert_centers(&lane_centers(800.0, 4, 0.1), &[160.0, 320.0, 480.0, 640.0]);
        assert_centers(&lane_centers(800.0, 3, 0.1), &[240.0, 400.0, 560.0]);
        // 900 wide: margin 90, usable 720, thirds at 240/480
        assert_centers(&lane_centers(900.0, 2, 0.1), &[330.0, 570.0]);
    }

    #[test]
    fn test_resize_recomputes() {
        let small = lane_centers(640.0, 3, 0.22);
        let large = lane_centers(1920.0, 3, 0.22);
        assert!((large.x(1) - 960.0).abs() < 1e-3);
        assert!((small.x(1) - 320.0).abs() < 1e-3);
    }

    #[test]
    fn test_nearest_lane() {
        let c = lane_centers(800.0, 4, 0.1);
        assert_eq!(nearest_lane(&c, 0.0), 0);
        assert_eq!(nearest_lane(&c, 330.0), 1);
        assert_eq!(nearest_lane(&c, 10_000.0), 3);
    }

    #[test]
    fn test_viewport_validation() {
        assert!(Viewport::new(800.0, 600.0).is_ok());
        assert!(matches!(
            Viewport::new(0.0, 600.0),
            Err(ConfigError::InvalidViewport { .. })
        ));
        assert!(Viewport::new(800.0, f32::NAN).is_err());
    }

    proptest! {
        #[test]
        fn prop_centers_shape(
            width in 1.0f32..8000.0,
            lanes in 2usize..=4,
            inset in 0.001f32..0.499,
        ) {
            let c = lane_centers(width, lanes, inset);
            prop_assert_eq!(c.len(), lanes);
            for pair in c.as_slice().windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for (i, x) in c.as_slice().iter().enumerate() {
                prop_assert!(*x >= 0.0 && *x <= width);
                // Mirror lane sits at the same distance from the other edge
                let mirror = c.x(lanes - 1 - i);
                prop_assert!((*x - (width - mirror)).abs() <= width * 1e-4);
            }
        }
    }
}
