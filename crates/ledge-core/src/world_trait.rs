use crate::ObjectKey;
use crate::geometry::Point;
use crate::platform::Platform;

/// What a character controller needs from the scene it moves through.
///
/// The controller owns no geometry. Every position read, collision query and
/// platform lookup goes through this trait, so any scene representation can
/// host controllers. Queries on a key that no longer exists answer `None`
/// or `false` instead of panicking.
pub trait PlatformWorld {
    /// Top-left position of an object.
    fn position(&self, object: ObjectKey) -> Option<Point>;

    /// Move an object. Ignored for unknown keys.
    fn set_position(&mut self, object: ObjectKey, position: Point);

    /// Current height of an object. Used to keep a character's feet on the
    /// floor when its hitbox changes size.
    fn height(&self, object: ObjectKey) -> Option<f64>;

    /// Platform data, if the object is a platform.
    fn platform(&self, object: ObjectKey) -> Option<Platform>;

    /// Narrow-phase overlap test between two objects' hitboxes.
    fn overlaps(&self, a: ObjectKey, b: ObjectKey, ignore_touching_edges: bool) -> bool;

    /// Push `object` out of every listed obstacle it overlaps, summing the
    /// minimum translations and applying them once. Returns whether the
    /// object moved.
    fn separate_from(
        &mut self,
        object: ObjectKey,
        obstacles: &[ObjectKey],
        ignore_touching_edges: bool,
    ) -> bool;

    /// Broad phase: collect active platforms whose bounding box comes within
    /// `max_distance` of `object`'s bounding box. `out` is cleared first. The
    /// object itself is never reported.
    fn platforms_near(&self, object: ObjectKey, max_distance: f64, out: &mut Vec<ObjectKey>);
}
