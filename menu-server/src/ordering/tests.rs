use super::*;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;

fn item(id: i64) -> MemberRef {
    MemberRef::new(EntityKind::MenuItem, id)
}

fn story(id: i64) -> MemberRef {
    MemberRef::new(EntityKind::Story, id)
}

/// Engine with a menu category (id returned) holding `count` dense items
async fn menu_with_items(count: usize) -> (ReorderEngine<MemoryStore>, ScopeKey, Vec<i64>) {
    let store = MemoryStore::new();
    let category = store.seed(ScopeKey::menu_categories(None), 0).await;
    let scope = ScopeKey::menu_items(category);
    let ids = store.seed_dense(scope, count).await;
    (ReorderEngine::new(store), scope, ids)
}

#[tokio::test]
async fn test_move_up_swaps_with_previous() {
    let (engine, scope, ids) = menu_with_items(3).await;

    let moved = engine.move_adjacent(item(ids[1]), MoveDirection::Up).await.unwrap();
    assert_eq!(moved.position, 0);
    assert_eq!(engine.store().order(scope).await, vec![ids[1], ids[0], ids[2]]);
    assert_eq!(engine.store().positions(scope).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_move_at_boundaries_is_noop() {
    let (engine, scope, ids) = menu_with_items(3).await;

    let first = engine.move_adjacent(item(ids[0]), MoveDirection::Up).await.unwrap();
    assert_eq!(first.position, 0);
    let last = engine.move_adjacent(item(ids[2]), MoveDirection::Down).await.unwrap();
    assert_eq!(last.position, 2);

    assert_eq!(engine.store().order(scope).await, ids);
}

#[tokio::test]
async fn test_move_single_member_scope() {
    let (engine, scope, ids) = menu_with_items(1).await;
    for direction in [MoveDirection::Up, MoveDirection::Down] {
        let moved = engine.move_adjacent(item(ids[0]), direction).await.unwrap();
        assert_eq!(moved.position, 0);
    }
    assert_eq!(engine.store().positions(scope).await, vec![0]);
}

#[tokio::test]
async fn test_move_down_then_up_restores_order() {
    let (engine, scope, ids) = menu_with_items(4).await;
    engine.move_adjacent(item(ids[1]), MoveDirection::Down).await.unwrap();
    engine.move_adjacent(item(ids[1]), MoveDirection::Up).await.unwrap();
    assert_eq!(engine.store().order(scope).await, ids);
}

#[tokio::test]
async fn test_move_repairs_duplicates_first() {
    // A=0, B=0 (created later), C=2
    let store = MemoryStore::new();
    let category = store.seed(ScopeKey::story_categories(), 0).await;
    let scope = ScopeKey::stories(category);
    let ids = store.seed_many(scope, &[0, 0, 2]).await;
    let engine = ReorderEngine::new(store);

    let moved = engine.move_adjacent(story(ids[1]), MoveDirection::Up).await.unwrap();
    assert_eq!(moved.position, 0);
    assert_eq!(engine.store().order(scope).await, vec![ids[1], ids[0], ids[2]]);
    assert_eq!(engine.store().positions(scope).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_reorder_explicit_shifts_between() {
    let (engine, scope, ids) = menu_with_items(5).await;

    let moved = engine.reorder_explicit(item(ids[1]), 3).await.unwrap();
    assert_eq!(moved.position, 3);
    assert_eq!(
        engine.store().order(scope).await,
        vec![ids[0], ids[2], ids[3], ids[1], ids[4]]
    );
}

#[tokio::test]
async fn test_reorder_explicit_clamps() {
    let (engine, scope, ids) = menu_with_items(3).await;

    let moved = engine.reorder_explicit(item(ids[0]), 99).await.unwrap();
    assert_eq!(moved.position, 2);
    let moved = engine.reorder_explicit(item(ids[2]), -5).await.unwrap();
    assert_eq!(moved.position, 0);
    assert_eq!(engine.store().order(scope).await, vec![ids[2], ids[1], ids[0]]);
}

#[tokio::test]
async fn test_reorder_to_same_position_changes_nothing() {
    let (engine, scope, ids) = menu_with_items(3).await;
    let moved = engine.reorder_explicit(item(ids[1]), 1).await.unwrap();
    assert_eq!(moved.position, 1);
    assert_eq!(engine.store().order(scope).await, ids);
}

#[tokio::test]
async fn test_unknown_member_is_not_found() {
    let (engine, scope, ids) = menu_with_items(2).await;

    let err = engine.move_adjacent(item(4242), MoveDirection::Up).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::NotFound { kind: Some(EntityKind::MenuItem), .. }
    ));
    let err = engine.reorder_explicit(item(4242), 0).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound { .. }));
    let err = engine.remove(item(4242)).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound { .. }));

    assert_eq!(engine.store().order(scope).await, ids);
}

#[tokio::test]
async fn test_remove_closes_gap() {
    let (engine, scope, ids) = menu_with_items(4).await;

    engine.remove(item(ids[1])).await.unwrap();
    assert!(!engine.store().contains(item(ids[1])).await);
    assert_eq!(engine.store().order(scope).await, vec![ids[0], ids[2], ids[3]]);
    assert_eq!(engine.store().positions(scope).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_remove_last_member_leaves_empty_scope() {
    let (engine, scope, ids) = menu_with_items(1).await;
    engine.remove(item(ids[0])).await.unwrap();
    assert!(engine.store().order(scope).await.is_empty());
}

#[tokio::test]
async fn test_remove_category_with_items_is_in_use() {
    let (engine, scope, ids) = menu_with_items(2).await;
    let category = MemberRef::new(EntityKind::MenuCategory, scope.parent().unwrap());

    let err = engine.remove(category).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InUse { kind: EntityKind::MenuCategory, .. }
    ));
    assert!(engine.store().contains(category).await);
    assert_eq!(engine.store().order(scope).await, ids);
}

#[tokio::test]
async fn test_remove_story_category_cascades() {
    let store = MemoryStore::new();
    let categories = store.seed_dense(ScopeKey::story_categories(), 2).await;
    let stories = store.seed_dense(ScopeKey::stories(categories[0]), 3).await;
    let engine = ReorderEngine::new(store);

    engine
        .remove(MemberRef::new(EntityKind::StoryCategory, categories[0]))
        .await
        .unwrap();

    for id in stories {
        assert!(!engine.store().contains(story(id)).await);
    }
    assert_eq!(
        engine.store().positions(ScopeKey::story_categories()).await,
        vec![0]
    );
}

#[tokio::test]
async fn test_normalize_persists_repairs_once() {
    let store = MemoryStore::new();
    let scope = ScopeKey::primary_categories();
    let ids = store.seed_many(scope, &[0, 0, 1, 3]).await;
    let engine = ReorderEngine::new(store);

    let first = engine.normalize(scope).await.unwrap();
    assert!(first.was_repaired());
    assert_eq!(first.ids(), ids);
    assert_eq!(engine.store().positions(scope).await, vec![0, 1, 2, 3]);

    let second = engine.normalize(scope).await.unwrap();
    assert!(!second.was_repaired());
    assert_eq!(second.members, first.members);
}

#[tokio::test]
async fn test_normalize_empty_scope() {
    let engine = ReorderEngine::new(MemoryStore::new());
    let normalized = engine.normalize(ScopeKey::menu_items(1)).await.unwrap();
    assert!(normalized.is_empty());
}

#[tokio::test]
async fn test_failed_write_rolls_back_everything() {
    let store = MemoryStore::new();
    let scope = ScopeKey::primary_categories();
    // corrupted, so the repair is the first write of the operation
    let ids = store.seed_many(scope, &[0, 0, 5]).await;
    let before = store.members(scope).await;
    let engine = ReorderEngine::new(store);

    // repair succeeds, the move itself fails
    engine.store().fail_writes_after(1);
    let err = engine
        .move_adjacent(MemberRef::new(EntityKind::PrimaryCategory, ids[2]), MoveDirection::Up)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Storage(_)));
    assert_eq!(engine.store().members(scope).await, before);

    engine.store().clear_faults();
    engine
        .move_adjacent(MemberRef::new(EntityKind::PrimaryCategory, ids[2]), MoveDirection::Up)
        .await
        .unwrap();
    assert_eq!(engine.store().order(scope).await, vec![ids[0], ids[2], ids[1]]);
}

#[tokio::test]
async fn test_failed_gap_closure_keeps_member() {
    let (engine, scope, ids) = menu_with_items(3).await;

    // delete succeeds, the shift of followers fails
    engine.store().fail_writes_after(1);
    let err = engine.remove(item(ids[0])).await.unwrap_err();
    assert!(matches!(err, OrderError::Storage(_)));
    engine.store().clear_faults();

    assert!(engine.store().contains(item(ids[0])).await);
    assert_eq!(engine.store().order(scope).await, ids);
}

#[tokio::test]
async fn test_change_scope_appends_and_closes_gap() {
    let store = MemoryStore::new();
    let categories = store.seed_dense(ScopeKey::menu_categories(None), 2).await;
    let from = ScopeKey::menu_items(categories[0]);
    let to = ScopeKey::menu_items(categories[1]);
    let left = store.seed_dense(from, 3).await;
    let right = store.seed_dense(to, 2).await;
    let engine = ReorderEngine::new(store);

    let moved = engine.change_scope(item(left[0]), to, None).await.unwrap();
    assert_eq!(moved.position, 2);

    assert_eq!(engine.store().order(from).await, vec![left[1], left[2]]);
    assert_eq!(engine.store().positions(from).await, vec![0, 1]);
    assert_eq!(engine.store().order(to).await, vec![right[0], right[1], left[0]]);
    assert_eq!(engine.store().positions(to).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_change_scope_inserts_at_position() {
    let store = MemoryStore::new();
    let categories = store.seed_dense(ScopeKey::story_categories(), 2).await;
    let from = ScopeKey::stories(categories[0]);
    let to = ScopeKey::stories(categories[1]);
    let left = store.seed_dense(from, 2).await;
    let right = store.seed_dense(to, 3).await;
    let engine = ReorderEngine::new(store);

    let moved = engine.change_scope(story(left[1]), to, Some(1)).await.unwrap();
    assert_eq!(moved.position, 1);
    assert_eq!(
        engine.store().order(to).await,
        vec![right[0], left[1], right[1], right[2]]
    );
    assert_eq!(engine.store().positions(to).await, vec![0, 1, 2, 3]);
    assert_eq!(engine.store().order(from).await, vec![left[0]]);
}

#[tokio::test]
async fn test_change_scope_detaches_menu_category() {
    let store = MemoryStore::new();
    let primary = store.seed(ScopeKey::primary_categories(), 0).await;
    let grouped = ScopeKey::menu_categories(Some(primary));
    let ids = store.seed_dense(grouped, 2).await;
    let engine = ReorderEngine::new(store);

    let category = MemberRef::new(EntityKind::MenuCategory, ids[0]);
    let moved = engine
        .change_scope(category, ScopeKey::menu_categories(None), None)
        .await
        .unwrap();
    assert_eq!(moved.position, 0);
    assert_eq!(engine.store().order(grouped).await, vec![ids[1]]);
    assert_eq!(engine.store().positions(grouped).await, vec![0]);
}

#[tokio::test]
async fn test_change_scope_same_scope() {
    let (engine, scope, ids) = menu_with_items(3).await;

    let unchanged = engine.change_scope(item(ids[2]), scope, None).await.unwrap();
    assert_eq!(unchanged.position, 2);
    assert_eq!(engine.store().order(scope).await, ids);

    let moved = engine.change_scope(item(ids[2]), scope, Some(0)).await.unwrap();
    assert_eq!(moved.position, 0);
    assert_eq!(engine.store().order(scope).await, vec![ids[2], ids[0], ids[1]]);
}

#[tokio::test]
async fn test_change_scope_rejects_other_kind() {
    let (engine, scope, ids) = menu_with_items(2).await;
    let err = engine
        .change_scope(item(ids[0]), ScopeKey::stories(1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::ScopeMismatch { .. }));
    assert_eq!(engine.store().order(scope).await, ids);
}

#[tokio::test]
async fn test_change_scope_to_missing_parent_rolls_back() {
    let (engine, scope, ids) = menu_with_items(3).await;
    let err = engine
        .change_scope(item(ids[0]), ScopeKey::menu_items(987_654), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::NotFound { kind: Some(EntityKind::MenuCategory), .. }
    ));
    assert_eq!(engine.store().order(scope).await, ids);
    assert_eq!(engine.store().positions(scope).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_change_scope_with_runs_update_in_same_transaction() {
    let store = MemoryStore::new();
    let categories = store.seed_dense(ScopeKey::story_categories(), 2).await;
    let from = ScopeKey::stories(categories[0]);
    let to = ScopeKey::stories(categories[1]);
    let left = store.seed_dense(from, 2).await;
    let right = store.seed_dense(to, 2).await;
    let engine = ReorderEngine::new(store);

    let (placed, seen) = engine
        .change_scope_with(story(left[1]), to, Some(0), move |tx, placed| {
            async move { tx.load(to).await.map(|members| (placed, members)) }.boxed()
        })
        .await
        .unwrap();
    assert_eq!(placed.position, 0);
    assert_eq!(
        seen.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![left[1], right[0], right[1]]
    );
    assert_eq!(engine.store().order(to).await, vec![left[1], right[0], right[1]]);
}

#[tokio::test]
async fn test_change_scope_with_failed_update_keeps_member_in_place() {
    let store = MemoryStore::new();
    let categories = store.seed_dense(ScopeKey::menu_categories(None), 2).await;
    let from = ScopeKey::menu_items(categories[0]);
    let to = ScopeKey::menu_items(categories[1]);
    let left = store.seed_dense(from, 3).await;
    let right = store.seed_dense(to, 2).await;
    let engine = ReorderEngine::new(store);

    let err = engine
        .change_scope_with(item(left[0]), to, None, |_, _| {
            async { Err::<(), _>(RepoError::Database("update rejected".to_string())) }.boxed()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Storage(_)));

    assert_eq!(engine.store().order(from).await, left);
    assert_eq!(engine.store().positions(from).await, vec![0, 1, 2]);
    assert_eq!(engine.store().order(to).await, right);
}

#[tokio::test]
async fn test_change_scope_with_same_scope_only_updates() {
    let (engine, scope, ids) = menu_with_items(3).await;

    let placed = engine
        .change_scope_with(item(ids[1]), scope, None, |_, placed| {
            async move { Ok(placed) }.boxed()
        })
        .await
        .unwrap();
    assert_eq!(placed.position, 1);
    assert_eq!(engine.store().order(scope).await, ids);
}

#[tokio::test]
async fn test_scope_locks_released_after_reads() {
    let engine = ReorderEngine::new(MemoryStore::new());
    for category in 0..1_000 {
        let normalized = engine.normalize(ScopeKey::menu_items(category)).await.unwrap();
        assert!(normalized.is_empty());
    }
    assert_eq!(engine.active_scopes(), 0);
}

#[tokio::test]
async fn test_scope_locks_released_after_failures() {
    let (engine, _, ids) = menu_with_items(2).await;

    engine.store().fail_writes_after(0);
    assert!(engine.remove(item(ids[0])).await.is_err());
    engine.store().clear_faults();
    assert!(engine.move_adjacent(item(999), MoveDirection::Up).await.is_err());
    assert!(
        engine
            .change_scope(item(ids[0]), ScopeKey::menu_items(424_242), None)
            .await
            .is_err()
    );

    assert_eq!(engine.active_scopes(), 0);
}

#[tokio::test]
async fn test_admit_appends_after_repair() {
    let store = MemoryStore::new();
    let scope = ScopeKey::story_categories();
    store.seed_many(scope, &[3, 3]).await;
    let engine = ReorderEngine::new(store);

    let id = engine
        .admit(scope, move |tx, position| {
            async move { tx.insert(scope, position) }.boxed()
        })
        .await
        .unwrap();

    let members = engine.store().members(scope).await;
    assert_eq!(members.last().map(|m| (m.id, m.position)), Some((id, 2)));
    assert!(is_dense(&members));
}

#[tokio::test]
async fn test_admit_failure_discards_repair() {
    let store = MemoryStore::new();
    let scope = ScopeKey::menu_items(555);
    store.seed_many(scope, &[1, 1]).await;
    let before = store.members(scope).await;
    let engine = ReorderEngine::new(store);

    // category 555 was never created
    let err = engine
        .admit(scope, move |tx, position| {
            async move { tx.insert(scope, position) }.boxed()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound { .. }));
    assert_eq!(engine.store().members(scope).await, before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_moves_keep_scope_dense() {
    let (engine, scope, ids) = menu_with_items(6).await;
    let engine = Arc::new(engine);

    let mut tasks = Vec::new();
    for round in 0..40 {
        let engine = engine.clone();
        let id = ids[round % ids.len()];
        tasks.push(tokio::spawn(async move {
            if round % 3 == 0 {
                engine.reorder_explicit(item(id), (round % 7) as i64).await
            } else {
                let direction = if round % 2 == 0 {
                    MoveDirection::Up
                } else {
                    MoveDirection::Down
                };
                engine.move_adjacent(item(id), direction).await
            }
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut order = engine.store().order(scope).await;
    assert_eq!(engine.store().positions(scope).await, vec![0, 1, 2, 3, 4, 5]);
    order.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(order, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cross_scope_moves_do_not_deadlock() {
    let store = MemoryStore::new();
    let categories = store.seed_dense(ScopeKey::menu_categories(None), 2).await;
    let a = ScopeKey::menu_items(categories[0]);
    let b = ScopeKey::menu_items(categories[1]);
    let left = store.seed_dense(a, 5).await;
    let right = store.seed_dense(b, 5).await;
    let engine = Arc::new(ReorderEngine::new(store));

    let mut tasks = Vec::new();
    for (l, r) in left.iter().zip(right.iter()) {
        let to_b = engine.clone();
        let l = *l;
        tasks.push(tokio::spawn(async move { to_b.change_scope(item(l), b, Some(0)).await }));
        let to_a = engine.clone();
        let r = *r;
        tasks.push(tokio::spawn(async move { to_a.change_scope(item(r), a, Some(0)).await }));
    }

    let joined = tokio::time::timeout(std::time::Duration::from_secs(10), async {
        for task in tasks {
            task.await.unwrap().unwrap();
        }
    })
    .await;
    assert!(joined.is_ok(), "cross-scope moves deadlocked");

    assert_eq!(engine.store().positions(a).await, vec![0, 1, 2, 3, 4]);
    assert_eq!(engine.store().positions(b).await, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_open_transaction_only_blocks_its_own_scope() {
    let store = MemoryStore::new();
    let categories = store.seed_dense(ScopeKey::menu_categories(None), 2).await;
    let busy = ScopeKey::menu_items(categories[0]);
    let free = ScopeKey::menu_items(categories[1]);
    store.seed_dense(busy, 2).await;
    let ids = store.seed_dense(free, 3).await;
    let engine = Arc::new(ReorderEngine::new(store));

    let (entered_tx, entered_rx) = tokio::sync::oneshot::channel::<()>();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let holder = engine.clone();
    let held = tokio::spawn(async move {
        holder
            .admit(busy, move |tx, position| {
                async move {
                    let _ = entered_tx.send(());
                    let _ = release_rx.await;
                    tx.insert(busy, position)
                }
                .boxed()
            })
            .await
    });
    entered_rx.await.unwrap();
    assert_eq!(engine.active_scopes(), 1);

    let moved = tokio::time::timeout(
        Duration::from_secs(1),
        engine.move_adjacent(item(ids[2]), MoveDirection::Up),
    )
    .await
    .expect("another scope waited on the open transaction")
    .unwrap();
    assert_eq!(moved.position, 1);
    assert_eq!(engine.store().order(free).await, vec![ids[0], ids[2], ids[1]]);

    let queued = tokio::time::timeout(Duration::from_millis(50), engine.normalize(busy)).await;
    assert!(queued.is_err(), "same scope ran inside an open transaction");

    release_tx.send(()).unwrap();
    held.await.unwrap().unwrap();
    assert_eq!(engine.store().positions(busy).await, vec![0, 1, 2]);
    assert_eq!(engine.active_scopes(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_store_serializes_transactions_on_one_scope() {
    // two raw transactions against the store, without the engine's locks
    let store = MemoryStore::new();
    let category = store.seed(ScopeKey::menu_categories(None), 0).await;
    let scope = ScopeKey::menu_items(category);
    store.seed_dense(scope, 1).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            let mut tx = store.begin().await?;
            tx.lock_scope(scope).await?;
            let position = tx.load(scope).await?.len() as i32;
            tokio::task::yield_now().await;
            tx.insert(scope, position)?;
            tx.commit().await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.positions(scope).await, (0..9).collect::<Vec<i32>>());
}
