//! Reorder planning
//!
//! Pure functions over a normalized scope (`members[i].position == i`).
//! Each returns the minimal set of position writes for one operation; the
//! engine applies them in a single transaction.

use super::error::{OrderError, OrderResult};
use super::scope::MemberRef;
use super::{MoveDirection, PositionChange, Sibling};

fn index_of(members: &[Sibling], member: MemberRef) -> OrderResult<usize> {
    members
        .iter()
        .position(|m| m.id == member.id)
        .ok_or_else(|| OrderError::not_found(member))
}

fn shift(member: &Sibling, to: usize) -> PositionChange {
    PositionChange {
        id: member.id,
        from: member.position,
        to: to as i32,
    }
}

/// Clamp a requested position into `[0, len - 1]`
pub fn clamp_target(target: i64, len: usize) -> OrderResult<usize> {
    if len == 0 {
        return Err(OrderError::InvalidTarget(
            "scope has no members".to_string(),
        ));
    }
    let last = (len - 1) as i64;
    Ok(target.clamp(0, last) as usize)
}

/// Swap the member with its neighbour; empty at the boundary
pub fn move_adjacent(
    members: &[Sibling],
    member: MemberRef,
    direction: MoveDirection,
) -> OrderResult<Vec<PositionChange>> {
    let current = index_of(members, member)?;
    let neighbour = match direction {
        MoveDirection::Up => current.checked_sub(1),
        MoveDirection::Down => Some(current + 1).filter(|&i| i < members.len()),
    };
    let Some(neighbour) = neighbour else {
        return Ok(Vec::new());
    };

    Ok(vec![
        shift(&members[current], neighbour),
        shift(&members[neighbour], current),
    ])
}

/// Place the member at `target`, shifting everything in between by one
pub fn reorder_explicit(
    members: &[Sibling],
    member: MemberRef,
    target: i64,
) -> OrderResult<Vec<PositionChange>> {
    let target = clamp_target(target, members.len())?;
    let current = index_of(members, member)?;

    let mut changes = Vec::new();
    if target > current {
        for index in current + 1..=target {
            changes.push(shift(&members[index], index - 1));
        }
    } else if target < current {
        for index in target..current {
            changes.push(shift(&members[index], index + 1));
        }
    } else {
        return Ok(changes);
    }
    changes.push(shift(&members[current], target));
    Ok(changes)
}

/// Shift everything after the member down by one
///
/// The member itself is not part of the result; it is being deleted or
/// leaving the scope.
pub fn close_gap(members: &[Sibling], member: MemberRef) -> OrderResult<Vec<PositionChange>> {
    let current = index_of(members, member)?;
    Ok(members[current + 1..]
        .iter()
        .enumerate()
        .map(|(offset, m)| shift(m, current + offset))
        .collect())
}

/// Make room for a newcomer
///
/// Returns the position the newcomer takes and the shifts for everyone at
/// or after it. `None` appends.
pub fn open_slot(members: &[Sibling], target: Option<i64>) -> (i32, Vec<PositionChange>) {
    let len = members.len();
    let slot = target.map_or(len, |t| t.clamp(0, len as i64) as usize);
    let changes = members[slot..]
        .iter()
        .enumerate()
        .map(|(offset, m)| shift(m, slot + offset + 1))
        .collect();
    (slot as i32, changes)
}

/// Apply changes to a normalized list and return it in the new order
pub fn apply(members: &[Sibling], changes: &[PositionChange]) -> Vec<Sibling> {
    let mut next: Vec<Sibling> = members
        .iter()
        .map(|m| match changes.iter().find(|c| c.id == m.id) {
            Some(change) => Sibling {
                position: change.to,
                ..*m
            },
            None => *m,
        })
        .collect();
    next.sort_by_key(|m| m.position);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::checker::is_dense;
    use crate::ordering::scope::EntityKind;

    fn scope_of(ids: &[i64]) -> Vec<Sibling> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| Sibling {
                id,
                position: i as i32,
                created_at: 0,
            })
            .collect()
    }

    fn item(id: i64) -> MemberRef {
        MemberRef::new(EntityKind::MenuItem, id)
    }

    fn order_after(members: &[Sibling], changes: &[PositionChange]) -> Vec<i64> {
        apply(members, changes).iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_move_adjacent_swaps_neighbours() {
        let members = scope_of(&[1, 2, 3]);
        let changes = move_adjacent(&members, item(2), MoveDirection::Up).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(order_after(&members, &changes), vec![2, 1, 3]);

        let changes = move_adjacent(&members, item(2), MoveDirection::Down).unwrap();
        assert_eq!(order_after(&members, &changes), vec![1, 3, 2]);
    }

    #[test]
    fn test_move_adjacent_at_boundary_is_noop() {
        let members = scope_of(&[1, 2, 3]);
        assert!(move_adjacent(&members, item(1), MoveDirection::Up).unwrap().is_empty());
        assert!(move_adjacent(&members, item(3), MoveDirection::Down).unwrap().is_empty());

        let single = scope_of(&[8]);
        assert!(move_adjacent(&single, item(8), MoveDirection::Up).unwrap().is_empty());
        assert!(move_adjacent(&single, item(8), MoveDirection::Down).unwrap().is_empty());
    }

    #[test]
    fn test_move_adjacent_unknown_member() {
        let members = scope_of(&[1, 2]);
        let err = move_adjacent(&members, item(99), MoveDirection::Up).unwrap_err();
        assert!(matches!(err, OrderError::NotFound { .. }));
    }

    #[test]
    fn test_reorder_moves_forward_and_back() {
        // A B C D E, move B to 3
        let members = scope_of(&[1, 2, 3, 4, 5]);
        let changes = reorder_explicit(&members, item(2), 3).unwrap();
        assert_eq!(order_after(&members, &changes), vec![1, 3, 4, 2, 5]);
        assert_eq!(changes.len(), 3);

        let changes = reorder_explicit(&members, item(5), 1).unwrap();
        assert_eq!(order_after(&members, &changes), vec![1, 5, 2, 3, 4]);
    }

    #[test]
    fn test_reorder_to_current_position_is_noop() {
        let members = scope_of(&[1, 2, 3]);
        assert!(reorder_explicit(&members, item(2), 1).unwrap().is_empty());
    }

    #[test]
    fn test_reorder_clamps_out_of_range_targets() {
        let members = scope_of(&[1, 2, 3]);
        let changes = reorder_explicit(&members, item(2), 100).unwrap();
        assert_eq!(order_after(&members, &changes), vec![1, 3, 2]);

        let changes = reorder_explicit(&members, item(3), -7).unwrap();
        assert_eq!(order_after(&members, &changes), vec![3, 1, 2]);
    }

    #[test]
    fn test_reorder_in_empty_scope_is_invalid() {
        let err = reorder_explicit(&[], item(1), 0).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTarget(_)));
    }

    #[test]
    fn test_close_gap_shifts_followers() {
        let members = scope_of(&[1, 2, 3, 4]);
        let changes = close_gap(&members, item(2)).unwrap();
        assert_eq!(
            changes,
            vec![
                PositionChange { id: 3, from: 2, to: 1 },
                PositionChange { id: 4, from: 3, to: 2 },
            ]
        );

        assert!(close_gap(&members, item(4)).unwrap().is_empty());
    }

    #[test]
    fn test_open_slot() {
        let members = scope_of(&[1, 2, 3]);

        let (slot, changes) = open_slot(&members, None);
        assert_eq!(slot, 3);
        assert!(changes.is_empty());

        let (slot, changes) = open_slot(&members, Some(1));
        assert_eq!(slot, 1);
        assert_eq!(changes.iter().map(|c| (c.id, c.to)).collect::<Vec<_>>(), vec![(2, 2), (3, 3)]);

        let (slot, _) = open_slot(&members, Some(-2));
        assert_eq!(slot, 0);
        let (slot, changes) = open_slot(&members, Some(40));
        assert_eq!(slot, 3);
        assert!(changes.is_empty());

        let (slot, changes) = open_slot(&[], Some(5));
        assert_eq!(slot, 0);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_plans_keep_scope_dense() {
        let members = scope_of(&[1, 2, 3, 4, 5, 6]);
        for id in 1..=6 {
            for target in -1..=7 {
                let changes = reorder_explicit(&members, item(id), target).unwrap();
                assert!(is_dense(&apply(&members, &changes)));
            }
        }
    }
}
