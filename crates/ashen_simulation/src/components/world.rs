//! World resources: walkable area (headless stand-in for a navmesh)

use bevy::prelude::*;

/// Walkable disc on the XZ plane.
///
/// Answers "can I reach point X" for the default navigation. Without this
/// resource every point is reachable.
#[derive(Resource, Debug, Clone, Copy, Reflect)]
pub struct WalkableArea {
    pub center: Vec3,
    pub radius: f32,
}

impl Default for WalkableArea {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 100.0,
        }
    }
}

impl WalkableArea {
    pub fn contains(&self, point: Vec3) -> bool {
        let offset = point - self.center;
        Vec2::new(offset.x, offset.z).length() <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkable_area_ignores_height() {
        let area = WalkableArea { center: Vec3::ZERO, radius: 10.0 };
        assert!(area.contains(Vec3::new(6.0, 50.0, 8.0)));
        assert!(!area.contains(Vec3::new(6.0, 0.0, 8.1)));
    }
}
