use crate::state::{DotEntry, DotKey, HIT_RADIUS};

pub fn normalize_percent(x: f32, y: f32) -> Option<(f32, f32)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some((dotnotes_shared::clamp_coord(x), dotnotes_shared::clamp_coord(y)))
}

pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    (dx * dx + dy * dy).sqrt()
}

/// First dot in collection order within `HIT_RADIUS` of the pointer.
/// The radius is exclusive: a point exactly on the boundary misses.
pub fn hit_test(dots: &[DotEntry], x: f32, y: f32) -> Option<&DotKey> {
    dots.iter()
        .find(|entry| distance(entry.x, entry.y, x, y) < HIT_RADIUS)
        .map(|entry| &entry.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, x: f32, y: f32) -> DotEntry {
        DotEntry {
            key: DotKey::Draft(id),
            x,
            y,
            text: "note".into(),
        }
    }

    #[test]
    fn boundary_is_a_miss_center_is_a_hit() {
        let dots = vec![entry(1, 40.0, 50.0)];
        assert_eq!(hit_test(&dots, 40.0, 50.0), Some(&DotKey::Draft(1)));
        // Exactly HIT_RADIUS away, along one axis.
        assert_eq!(hit_test(&dots, 43.0, 50.0), None);
        assert!(hit_test(&dots, 42.999, 50.0).is_some());
    }

    #[test]
    fn nearby_click_hits() {
        let dots = vec![entry(1, 40.0, 50.0)];
        // distance ~1.41 < 3
        assert_eq!(hit_test(&dots, 41.0, 51.0), Some(&DotKey::Draft(1)));
    }

    #[test]
    fn first_match_in_collection_order_wins() {
        let dots = vec![entry(1, 40.0, 50.0), entry(2, 41.0, 50.0)];
        assert_eq!(hit_test(&dots, 40.6, 50.0), Some(&DotKey::Draft(1)));
    }

    #[test]
    fn non_finite_pointer_positions_are_rejected() {
        assert!(normalize_percent(f32::NAN, 10.0).is_none());
        assert!(normalize_percent(10.0, f32::INFINITY).is_none());
        assert_eq!(normalize_percent(-5.0, 120.0), Some((0.0, 100.0)));
    }
}
