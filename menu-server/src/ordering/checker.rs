//! Invariant checker
//!
//! A scope is valid when its positions are exactly `0..n-1`. Anything else
//! (duplicates, gaps, negatives) is repaired by sorting on
//! `(position, created_at, id)` and renumbering.

use super::{PositionChange, Sibling};

/// A scope in canonical order with dense positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Members ordered by position, `members[i].position == i`
    pub members: Vec<Sibling>,
    /// Writes needed to bring stored positions in line; empty when valid
    pub changes: Vec<PositionChange>,
}

impl Normalized {
    pub fn was_repaired(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn find(&self, id: i64) -> Option<&Sibling> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Member ids in order
    pub fn ids(&self) -> Vec<i64> {
        self.members.iter().map(|m| m.id).collect()
    }
}

/// Put members in canonical order and compute the repairs
pub fn inspect(mut members: Vec<Sibling>) -> Normalized {
    members.sort_by_key(|m| (m.position, m.created_at, m.id));

    let mut changes = Vec::new();
    for (index, member) in members.iter_mut().enumerate() {
        let expected = index as i32;
        if member.position != expected {
            changes.push(PositionChange {
                id: member.id,
                from: member.position,
                to: expected,
            });
            member.position = expected;
        }
    }

    Normalized { members, changes }
}

/// True when positions are a permutation of `0..n-1`
pub fn is_dense(members: &[Sibling]) -> bool {
    let mut seen = vec![false; members.len()];
    for member in members {
        let Ok(index) = usize::try_from(member.position) else {
            return false;
        };
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sibling(id: i64, position: i32, created_at: i64) -> Sibling {
        Sibling {
            id,
            position,
            created_at,
        }
    }

    #[test]
    fn test_valid_scope_needs_no_changes() {
        let members = vec![sibling(3, 2, 0), sibling(1, 0, 0), sibling(2, 1, 0)];
        let normalized = inspect(members);
        assert!(!normalized.was_repaired());
        assert_eq!(normalized.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicates_and_gap_are_repaired() {
        // [0, 0, 1, 3], second duplicate created later
        let members = vec![
            sibling(10, 0, 100),
            sibling(11, 0, 200),
            sibling(12, 1, 50),
            sibling(13, 3, 10),
        ];
        let normalized = inspect(members);

        assert_eq!(normalized.ids(), vec![10, 11, 12, 13]);
        let positions: Vec<i32> = normalized.members.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert_eq!(
            normalized.changes,
            vec![
                PositionChange { id: 11, from: 0, to: 1 },
                PositionChange { id: 12, from: 1, to: 2 },
            ]
        );
        // 13 was at 3 already after the shift
        assert!(normalized.changes.iter().all(|c| c.id != 13));
    }

    #[test]
    fn test_ties_break_on_created_at_then_id() {
        let members = vec![sibling(7, 0, 500), sibling(5, 0, 500), sibling(9, 0, 100)];
        let normalized = inspect(members);
        assert_eq!(normalized.ids(), vec![9, 5, 7]);
    }

    #[test]
    fn test_negative_positions_sort_first() {
        let members = vec![sibling(1, 0, 0), sibling(2, -4, 0)];
        let normalized = inspect(members);
        assert_eq!(normalized.ids(), vec![2, 1]);
        assert!(is_dense(&normalized.members));
    }

    #[test]
    fn test_inspect_is_idempotent() {
        let members = vec![sibling(1, 5, 3), sibling(2, 5, 1), sibling(3, -1, 2)];
        let once = inspect(members);
        let twice = inspect(once.members.clone());
        assert!(!twice.was_repaired());
        assert_eq!(once.members, twice.members);
    }

    #[test]
    fn test_is_dense() {
        assert!(is_dense(&[]));
        assert!(is_dense(&[sibling(1, 1, 0), sibling(2, 0, 0)]));
        assert!(!is_dense(&[sibling(1, 0, 0), sibling(2, 0, 0)]));
        assert!(!is_dense(&[sibling(1, 0, 0), sibling(2, 2, 0)]));
        assert!(!is_dense(&[sibling(1, -1, 0)]));
    }

    #[test]
    fn test_empty_scope() {
        let normalized = inspect(Vec::new());
        assert!(normalized.is_empty());
        assert!(!normalized.was_repaired());
    }
}
