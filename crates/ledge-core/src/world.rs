use slotmap::SlotMap;

use crate::ObjectKey;
use crate::geometry::{Point, collision_test};
use crate::platform::{Platform, SceneObject};
use crate::world_trait::PlatformWorld;

/// Arena of scene objects addressed by generational keys.
///
/// A removed object's key stays invalid forever, so controllers holding a
/// stale floor or grab reference see `None` instead of a recycled object.
#[derive(Debug, Default)]
pub struct World {
    objects: SlotMap<ObjectKey, SceneObject>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: SceneObject) -> ObjectKey {
        if !object.has_valid_hitbox() {
            tracing::warn!(
                name = %object.name,
                "Object hitbox is degenerate or concave, collisions may be wrong"
            );
        }
        self.objects.insert(object)
    }

    pub fn remove(&mut self, key: ObjectKey) -> Option<SceneObject> {
        self.objects.remove(key)
    }

    pub fn get(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut SceneObject> {
        self.objects.get_mut(key)
    }

    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    /// Deactivated platforms are skipped by the broad phase.
    pub fn set_active(&mut self, key: ObjectKey, active: bool) {
        if let Some(obj) = self.objects.get_mut(key) {
            obj.active = active;
        }
    }

    pub fn set_size(&mut self, key: ObjectKey, width: f64, height: f64) {
        if let Some(obj) = self.objects.get_mut(key) {
            obj.width = width;
            obj.height = height;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> {
        self.objects.iter()
    }

    /// Find the first object with the given name.
    pub fn find(&self, name: &str) -> Option<ObjectKey> {
        self.objects
            .iter()
            .find(|(_, obj)| obj.name == name)
            .map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl PlatformWorld for World {
    fn position(&self, object: ObjectKey) -> Option<Point> {
        self.objects.get(object).map(SceneObject::position)
    }

    fn set_position(&mut self, object: ObjectKey, position: Point) {
        if let Some(obj) = self.objects.get_mut(object) {
            obj.x = position.x;
            obj.y = position.y;
        }
    }

    fn height(&self, object: ObjectKey) -> Option<f64> {
        self.objects.get(object).map(|obj| obj.height)
    }

    fn platform(&self, object: ObjectKey) -> Option<Platform> {
        self.objects.get(object).and_then(|obj| obj.platform)
    }

    fn overlaps(&self, a: ObjectKey, b: ObjectKey, ignore_touching_edges: bool) -> bool {
        let (Some(obj_a), Some(obj_b)) = (self.objects.get(a), self.objects.get(b)) else {
            return false;
        };
        let (box_a, box_b) = (obj_a.aabb(), obj_b.aabb());
        if !box_a.intersects(&box_b) {
            return false;
        }
        collision_test(
            &obj_a.world_polygon(),
            &obj_b.world_polygon(),
            ignore_touching_edges,
        )
        .colliding
    }

    fn separate_from(
        &mut self,
        object: ObjectKey,
        obstacles: &[ObjectKey],
        ignore_touching_edges: bool,
    ) -> bool {
        let Some(obj) = self.objects.get(object) else {
            return false;
        };
        let polygon = obj.world_polygon();

        let mut moved = false;
        let (mut move_x, mut move_y) = (0.0, 0.0);
        for &other_key in obstacles {
            if other_key == object {
                continue;
            }
            let Some(other) = self.objects.get(other_key) else {
                continue;
            };
            let result = collision_test(&polygon, &other.world_polygon(), ignore_touching_edges);
            if result.colliding {
                move_x += result.move_x;
                move_y += result.move_y;
                moved = true;
            }
        }

        if moved && let Some(obj) = self.objects.get_mut(object) {
            obj.x += move_x;
            obj.y += move_y;
        }
        moved
    }

    fn platforms_near(&self, object: ObjectKey, max_distance: f64, out: &mut Vec<ObjectKey>) {
        out.clear();
        let Some(obj) = self.objects.get(object) else {
            return;
        };
        let area = obj.aabb().expanded(max_distance);
        out.extend(
            self.objects
                .iter()
                .filter(|(key, other)| {
                    *key != object
                        && other.active
                        && other.platform.is_some()
                        && area.intersects(&other.aabb())
                })
                .map(|(key, _)| key),
        );
    }
}
