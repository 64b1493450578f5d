//! Authored training points.

use serde::{Deserialize, Serialize};

use crate::coords::DataPos;

/// A class label. Labels only exist for classification algorithms.
pub type Label = i64;

/// Stable identity of a stored point.
///
/// Two points with identical coordinates still have distinct ids, so each of
/// them can be removed on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u64);

/// A single training point, serialized as `{"x", "y", "label"?}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, label: None }
    }

    pub fn labeled(x: f64, y: f64, label: Label) -> Self {
        Self {
            x,
            y,
            label: Some(label),
        }
    }

    pub fn pos(&self) -> DataPos {
        DataPos::new(self.x, self.y)
    }
}

/// Ordered collection of training points, addressed by [`PointId`].
#[derive(Debug, Clone, Default)]
pub struct PointStore {
    entries: Vec<(PointId, Point)>,
    next_id: u64,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point and returns its identity.
    pub fn add(&mut self, point: Point) -> PointId {
        let id = PointId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, point));
        id
    }

    /// Removes the point with this identity, keeping the others in order.
    pub fn remove(&mut self, id: PointId) -> Option<Point> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Points in insertion order, with their identities.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, &Point)> {
        self.entries.iter().map(|(id, point)| (*id, point))
    }

    /// Copies the points, in order, for the wire.
    pub fn to_vec(&self) -> Vec<Point> {
        self.entries.iter().map(|(_, point)| *point).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_order_and_duplicates() {
        let mut store = PointStore::new();
        let a = store.add(Point::new(1.0, 1.0));
        let b = store.add(Point::new(1.0, 1.0));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.to_vec(), vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)]);
    }

    #[test]
    fn test_remove_by_identity() {
        let mut store = PointStore::new();
        let ids: Vec<_> = (0..5)
            .map(|i| store.add(Point::new(i as f64, -(i as f64))))
            .collect();

        let removed = store.remove(ids[2]);
        assert_eq!(removed, Some(Point::new(2.0, -2.0)));
        let xs: Vec<f64> = store.iter().map(|(_, p)| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 3.0, 4.0]);

        assert_eq!(store.remove(ids[2]), None);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_duplicate_coordinates_removed_independently() {
        let mut store = PointStore::new();
        let first = store.add(Point::new(3.0, 3.0));
        let second = store.add(Point::new(3.0, 3.0));
        store.remove(second);
        assert_eq!(store.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![first]);
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut store = PointStore::new();
        let before = store.add(Point::new(0.0, 0.0));
        store.clear();
        let after = store.add(Point::new(0.0, 0.0));
        assert_ne!(before, after);
        assert!(store.remove(before).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_serialization_omits_missing_label() {
        let json = serde_json::to_string(&Point::new(2.0, 3.0)).unwrap();
        assert_eq!(json, r#"{"x":2.0,"y":3.0}"#);
        let json = serde_json::to_string(&Point::labeled(2.0, 3.0, 1)).unwrap();
        assert_eq!(json, r#"{"x":2.0,"y":3.0,"label":1}"#);
    }
}
