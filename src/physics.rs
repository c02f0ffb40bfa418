//! AABB collision detection and resolution
//!
//! Everything collidable in the game is an axis-aligned box: blocks, the
//! player, mining probes, individual particles. Resolution follows the
//! minimum-penetration rule: push the moving box out along the axis with the
//! smaller overlap and report which side of the moving box made contact.

use macroquad::math::{vec2, Vec2};

/// Axis-aligned bounding box in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Shrink the box by `d` on every side.
    pub fn inset(&self, d: f32) -> Aabb {
        Aabb::new(self.x + d, self.y + d, self.w - d * 2.0, self.h - d * 2.0)
    }

    /// Strict interval intersection on both axes. Boxes that merely touch
    /// along an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Which side of the moving box made contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Result of pushing a moving box out of a static one.
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub side: Side,
}

/// Resolve an overlapping moving box against a static box.
///
/// Precondition: the boxes overlap. Picks the axis with the smaller minimum
/// penetration, pushes the moving box out along the shallower side on that
/// axis, and zeroes the velocity component along the pushed axis.
///
/// One resolution per pair per step; there is no iterative solver.
/// Multi-contact correctness comes from looping over all blocks once per
/// update.
pub fn resolve_aabb(moving: Aabb, vx: f32, vy: f32, fixed: Aabb) -> Resolution {
    let overlap_right = moving.right() - fixed.x;
    let overlap_left = fixed.right() - moving.x;
    let overlap_bottom = moving.bottom() - fixed.y;
    let overlap_top = fixed.bottom() - moving.y;

    let min_overlap_x = overlap_right.min(overlap_left);
    let min_overlap_y = overlap_bottom.min(overlap_top);

    if min_overlap_x < min_overlap_y {
        if overlap_right < overlap_left {
            Resolution { x: fixed.x - moving.w, y: moving.y, vx: 0.0, vy, side: Side::Right }
        } else {
            Resolution { x: fixed.right(), y: moving.y, vx: 0.0, vy, side: Side::Left }
        }
    } else if overlap_bottom < overlap_top {
        Resolution { x: moving.x, y: fixed.y - moving.h, vx, vy: 0.0, side: Side::Bottom }
    } else {
        Resolution { x: moving.x, y: fixed.bottom(), vx, vy: 0.0, side: Side::Top }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 32.0, 32.0);
        let b = Aabb::new(32.0, 0.0, 32.0, 32.0);
        assert!(!a.overlaps(&b));

        let c = Aabb::new(31.0, 0.0, 32.0, 32.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn resolves_shallow_bottom_contact() {
        // Box falling onto a block, penetrating 4px from above
        let moving = Aabb::new(8.0, 28.0, 16.0, 16.0);
        let fixed = Aabb::new(0.0, 40.0, 32.0, 32.0);
        assert!(moving.overlaps(&fixed));

        let r = resolve_aabb(moving, 3.0, 120.0, fixed);
        assert_eq!(r.side, Side::Bottom);
        assert_eq!(r.y, 24.0);
        assert_eq!(r.x, moving.x);
        assert_eq!(r.vy, 0.0);
        assert_eq!(r.vx, 3.0);

        // Resolved box no longer overlaps
        let resolved = Aabb::new(r.x, r.y, moving.w, moving.h);
        assert!(!resolved.overlaps(&fixed));
    }

    #[test]
    fn resolves_shallow_side_contacts() {
        let fixed = Aabb::new(32.0, 0.0, 32.0, 32.0);

        // Coming from the left, 2px into the block
        let from_left = Aabb::new(18.0, 8.0, 16.0, 16.0);
        let r = resolve_aabb(from_left, 60.0, 5.0, fixed);
        assert_eq!(r.side, Side::Right);
        assert_eq!(r.x, 16.0);
        assert_eq!(r.vx, 0.0);
        assert_eq!(r.vy, 5.0);

        // Coming from the right, 2px into the block
        let from_right = Aabb::new(62.0, 8.0, 16.0, 16.0);
        let r = resolve_aabb(from_right, -60.0, 5.0, fixed);
        assert_eq!(r.side, Side::Left);
        assert_eq!(r.x, 64.0);
        assert_eq!(r.vx, 0.0);
    }

    #[test]
    fn resolves_head_bump_as_top() {
        let fixed = Aabb::new(0.0, 0.0, 32.0, 32.0);
        let moving = Aabb::new(8.0, 30.0, 16.0, 16.0);
        let r = resolve_aabb(moving, 0.0, -200.0, fixed);
        assert_eq!(r.side, Side::Top);
        assert_eq!(r.y, 32.0);
        assert_eq!(r.vy, 0.0);
    }

    #[test]
    fn picks_axis_of_minimum_penetration() {
        // Deep horizontal overlap, shallow vertical overlap: must resolve vertically
        let fixed = Aabb::new(0.0, 32.0, 32.0, 32.0);
        let moving = Aabb::new(4.0, 20.0, 16.0, 16.0);
        let r = resolve_aabb(moving, 1.0, 1.0, fixed);
        assert!(matches!(r.side, Side::Bottom));
        let resolved = Aabb::new(r.x, r.y, moving.w, moving.h);
        assert!(!resolved.overlaps(&fixed));
    }

    #[test]
    fn inset_shrinks_every_side() {
        let a = Aabb::new(0.0, 0.0, 32.0, 32.0).inset(4.0);
        assert_eq!(a, Aabb::new(4.0, 4.0, 24.0, 24.0));
    }
}
