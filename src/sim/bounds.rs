//! Axis-aligned bounding boxes
//!
//! Screen space with y growing upward: the player sits near y = 0 and traffic
//! spawns above the top of the viewport, scrolling down toward the player.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A box anchored at its bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Bottom-left corner
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    /// Box of `size` horizontally centered on `center_x`, bottom edge at `y`
    pub fn centered_at(center_x: f32, y: f32, size: Vec2) -> Self {
        Self {
            pos: Vec2::new(center_x - size.x / 2.0, y),
            size,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Strict overlap: boxes that only touch along an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.pos.x < other.right()
            && self.right() > other.pos.x
            && self.pos.y < other.top()
            && self.top() > other.pos.y
    }

    pub fn translate_y(&mut self, dy: f32) {
        self.pos.y += dy;
    }

    /// Re-center horizontally without touching y
    pub fn set_center_x(&mut self, center_x: f32) {
        self.pos.x = center_x - self.size.x / 2.0;
    }
}
