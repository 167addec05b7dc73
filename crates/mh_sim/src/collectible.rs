use glam::Vec3;

use crate::bounds::Aabb3;

/// A floating reward box. Position and points are fixed for the session;
/// the collected flag only ever goes from false to true.
#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    pub id: u32,
    pub position: Vec3,
    pub points: u32,
    /// Edge length of the cube.
    pub size: f32,
    /// Presentation tint (HSL hue in [0, 1)).
    pub hue: f32,
    collected: bool,
}

/// Emitted once per entity, on the step it was collected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionEvent {
    pub id: u32,
    pub points: u32,
    pub position: Vec3,
}

impl Collectible {
    pub fn new(id: u32, position: Vec3, points: u32, size: f32, hue: f32) -> Self {
        debug_assert!(points > 0, "collectible {id} must be worth at least one point");
        Self {
            id,
            position,
            points,
            size,
            hue,
            collected: false,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    pub fn bounds(&self) -> Aabb3 {
        Aabb3::from_center(self.position, Vec3::splat(self.size * 0.5))
    }

    /// Returns the event only on the false -> true transition.
    fn collect(&mut self) -> Option<CollectionEvent> {
        if self.collected {
            return None;
        }
        self.collected = true;
        Some(CollectionEvent {
            id: self.id,
            points: self.points,
            position: self.position,
        })
    }
}

/// "Hit from below": an uncollected box is taken when the avatar's box
/// overlaps it and the avatar's center is strictly lower than the box's.
/// This compares positions at a single instant; it does not track whether the
/// avatar was actually moving upward.
pub fn collect_overlaps(
    avatar_bounds: &Aabb3,
    avatar_y: f32,
    collectibles: &mut [Collectible],
) -> Vec<CollectionEvent> {
    let mut events = Vec::new();
    for entity in collectibles.iter_mut() {
        if entity.is_collected() {
            continue;
        }
        if !avatar_bounds.intersects(&entity.bounds()) {
            continue;
        }
        if avatar_y < entity.position.y {
            if let Some(event) = entity.collect() {
                events.push(event);
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avatar_box(center: Vec3) -> Aabb3 {
        Aabb3::from_center(center, Vec3::new(0.09, 0.09, 0.035))
    }

    #[test]
    fn overlap_from_below_collects_once() {
        let mut boxes = vec![Collectible::new(1, Vec3::new(0.0, 2.0, 0.0), 5, 0.04, 0.1)];
        let avatar = avatar_box(Vec3::new(0.0, 1.95, 0.0));

        let first = collect_overlaps(&avatar, 1.95, &mut boxes);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, 1);
        assert_eq!(first[0].points, 5);
        assert!(boxes[0].is_collected());

        let second = collect_overlaps(&avatar, 1.95, &mut boxes);
        assert!(second.is_empty());
        assert!(boxes[0].is_collected());
    }

    #[test]
    fn level_or_higher_avatar_does_not_collect() {
        let mut boxes = vec![Collectible::new(2, Vec3::new(0.0, 2.0, 0.0), 3, 0.04, 0.5)];
        for y in [2.0, 2.05] {
            let events = collect_overlaps(&avatar_box(Vec3::new(0.0, y, 0.0)), y, &mut boxes);
            assert!(events.is_empty(), "collected with avatar at y={y}");
        }
        assert!(!boxes[0].is_collected());
    }

    #[test]
    fn no_overlap_no_collection_even_when_below() {
        let mut boxes = vec![Collectible::new(3, Vec3::new(1.0, 2.0, 0.0), 4, 0.04, 0.9)];
        let events = collect_overlaps(&avatar_box(Vec3::new(0.0, 1.95, 0.0)), 1.95, &mut boxes);
        assert!(events.is_empty());
    }

    #[test]
    fn several_boxes_in_one_pass() {
        let mut boxes = vec![
            Collectible::new(1, Vec3::new(0.0, 2.0, 0.0), 2, 0.04, 0.0),
            Collectible::new(2, Vec3::new(0.05, 2.02, 0.0), 7, 0.04, 0.0),
            Collectible::new(3, Vec3::new(5.0, 2.0, 0.0), 9, 0.04, 0.0),
        ];
        let events = collect_overlaps(&avatar_box(Vec3::new(0.0, 1.95, 0.0)), 1.95, &mut boxes);
        let ids: Vec<u32> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(!boxes[2].is_collected());
    }
}
