//! Integration Tests for the Feature Showcase
//!
//! These tests drive the exported primitives and the runner end to end,
//! with delays shortened so the timing properties stay cheap to check.

mod common;
use common::*;

// ============================================================================
// Immutable Collections
// ============================================================================

mod immutable_collections {
    use feature_showcase::collections::{
        CollectionError, CollectionMut, ImmutableList, ImmutableMap, ImmutableSet, MapMut,
    };
    use feature_showcase::{FailureKind, ShowcaseError};
    use rand::Rng;

    fn random_words(len: usize) -> Vec<String> {
        let mut rng = rand::rng();
        (0..len)
            .map(|i| format!("w{}-{}", i, rng.random_range(0..1000)))
            .collect()
    }

    #[test]
    fn test_mutation_fails_and_leaves_contents_unchanged() {
        for len in 0..20 {
            let words = random_words(len);
            let mut list = ImmutableList::of(words.iter().cloned().map(Some)).unwrap();
            let before = list.clone();

            let err = list.add("extra".to_string()).unwrap_err();
            assert!(matches!(err, CollectionError::UnsupportedOperation(_)));
            assert!(list.clear_all().is_err());
            assert_eq!(list, before);

            let mut set = ImmutableSet::of(words.iter().cloned().map(Some)).unwrap();
            assert!(set.add("extra".to_string()).is_err());
            assert!(set.remove_value(&"w0".to_string()).is_err());
            assert_eq!(set.len(), len);
        }
    }

    #[test]
    fn test_absent_element_builds_nothing() {
        let mut rng = rand::rng();
        for _ in 0..20 {
            let len = rng.random_range(1..15);
            let hole = rng.random_range(0..len);
            let input: Vec<Option<u32>> = (0..len as u32)
                .map(|i| if i as usize == hole { None } else { Some(i) })
                .collect();

            let err = ImmutableList::of(input.clone()).unwrap_err();
            let err = ShowcaseError::from(err);
            assert_eq!(err.kind(), FailureKind::InvalidArgument);
            assert!(ImmutableSet::of(input).is_err());
        }
    }

    #[test]
    fn test_duplicates_rejected_only_by_set_and_map() {
        let list = ImmutableList::of([Some(1), Some(1), Some(2)]).unwrap();
        assert_eq!(list.len(), 3);

        let err = ImmutableSet::of([Some(1), Some(2), Some(1)]).unwrap_err();
        assert_eq!(
            err,
            CollectionError::InvalidArgument("duplicate element: 1".to_string())
        );

        let mut map = ImmutableMap::of([(Some("a"), Some(1)), (Some("b"), Some(2))]).unwrap();
        assert!(map.put("c", 3).is_err());
        assert!(map.remove_key(&"a").is_err());
        assert_eq!(map.get(&"a"), Some(&1));

        assert!(ImmutableMap::of([(Some("a"), Some(1)), (Some("a"), Some(2))]).is_err());
        assert!(ImmutableMap::of([(Some("a"), None::<i32>)]).is_err());
    }
}

// ============================================================================
// Structured Task Groups
// ============================================================================

mod structured_groups {
    use feature_showcase::tasks::structured::BoxError;
    use feature_showcase::tasks::{GroupError, GroupPhase, SubtaskState, TaskGroup};
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_two_successes_join_normally() {
        let mut group = TaskGroup::shutdown_on_failure();
        let a = group
            .fork(|cancel| async move {
                cancel.sleep(Duration::from_millis(40)).await?;
                Ok::<_, BoxError>("a")
            })
            .unwrap();
        let b = group
            .fork(|cancel| async move {
                cancel.sleep(Duration::from_millis(20)).await?;
                Ok::<_, BoxError>("b")
            })
            .unwrap();

        group.join().await.unwrap();
        assert!(group.throw_if_failed().is_ok());
        assert_eq!(group.phase(), GroupPhase::AllCompleted);
        assert_eq!((a.get(), b.get()), (Some("a"), Some("b")));
        group.close().await;
    }

    #[tokio::test]
    async fn test_failure_cancels_long_running_child() {
        let mut group = TaskGroup::shutdown_on_failure();
        let failing = group
            .fork(|_| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err::<(), BoxError>("original failure".into())
            })
            .unwrap();
        let long = group
            .fork(|cancel| async move {
                cancel.sleep(Duration::from_secs(30)).await?;
                Ok::<_, BoxError>(())
            })
            .unwrap();

        let start = Instant::now();
        group.join().await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));

        assert!(failing.state().is_terminal());
        assert!(long.state().is_terminal());
        assert_eq!(long.state(), SubtaskState::Cancelled);

        match group.throw_if_failed() {
            Err(err @ GroupError::ChildTaskFailure { .. }) => {
                assert_eq!(err.cause().unwrap().to_string(), "original failure");
            }
            other => panic!("expected ChildTaskFailure, got {:?}", other),
        }
        group.close().await;
    }

    #[tokio::test]
    async fn test_scope_leaves_no_running_child_on_error_exit() {
        let (result, handle) = TaskGroup::scope(|group| {
            Box::pin(async move {
                let handle = group
                    .fork(|cancel| async move {
                        cancel.sleep(Duration::from_secs(30)).await?;
                        Ok::<_, BoxError>(())
                    })
                    .unwrap();
                (Err::<(), &str>("body bailed out"), handle)
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(handle.state(), SubtaskState::Cancelled);
    }
}

// ============================================================================
// Scoped Bindings
// ============================================================================

mod scoped_bindings {
    use feature_showcase::{FailureKind, ScopeContext, ScopeError, ScopedSlot, ShowcaseError};

    #[test]
    fn test_nested_binding_shadows_and_expires() {
        let slot = ScopedSlot::new("USER");
        let root = ScopeContext::empty();

        let (inner, after_inner) = root.bind(&slot, "A").run(|outer| {
            let inner = outer.bind(&slot, "B").run(|ctx| slot.get(ctx));
            (inner, slot.get(outer))
        });
        assert_eq!(inner, Ok("B"));
        assert_eq!(after_inner, Ok("A"));

        let err = slot.get(&root).unwrap_err();
        assert_eq!(err, ScopeError::Unbound("USER"));
        assert_eq!(ShowcaseError::from(err).kind(), FailureKind::InvalidState);
    }

    #[tokio::test]
    async fn test_async_block_sees_binding_across_awaits() {
        let slot = ScopedSlot::new("REQUEST_ID");
        let seen = ScopeContext::empty()
            .bind(&slot, 42u64)
            .run_async(|ctx| async move {
                tokio::task::yield_now().await;
                slot.get(&ctx)
            })
            .await;
        assert_eq!(seen, Ok(42));
    }
}

// ============================================================================
// Sequenced Collections
// ============================================================================

mod sequenced_collections {
    use feature_showcase::collections::{Sequenced, SequencedList, SequencedMap, SequencedMapOps};
    use rand::Rng;

    #[test]
    fn test_reversed_view_is_live() {
        let mut rng = rand::rng();
        for _ in 0..20 {
            let len = rng.random_range(1..30);
            let values: Vec<u32> = (0..len).map(|_| rng.random_range(0..100)).collect();
            let mut list = SequencedList::from(values.clone());

            let reversed: Vec<u32> = list.reversed().items().into_iter().copied().collect();
            let mut expected = values.clone();
            expected.reverse();
            assert_eq!(reversed, expected);

            list.reversed().add_first(1000);
            assert_eq!(list.last(), Some(&1000));
            assert_eq!(list.first(), values.first());
        }
    }

    #[test]
    fn test_map_reversed_view_polls_from_the_back() {
        let mut map = SequencedMap::new();
        map.put_last(1, "one");
        map.put_last(2, "two");
        map.put_last(3, "three");

        assert_eq!(map.reversed().poll_first_entry(), Some((3, "three")));
        assert_eq!(map.reversed().first_entry(), Some((&2, &"two")));
        assert_eq!(map.len(), 2);
    }
}

// ============================================================================
// Task Executors
// ============================================================================

mod task_executors {
    use super::*;
    use feature_showcase::scenarios::tasks::{run_fixed_pool, run_lightweight};
    use feature_showcase::TaskConfig;
    use std::time::Duration;

    fn workload() -> TaskConfig {
        TaskConfig {
            pool_size: 4,
            task_count: 20,
            task_delay: Duration::from_millis(50),
            ..fast_task_config()
        }
    }

    #[test]
    fn test_fixed_pool_is_serialized_by_pool_size() {
        // ceil(20 / 4) waves of 50 ms
        let run = run_fixed_pool(&workload()).unwrap();
        assert_eq!(run.tally.completed, 20);
        assert!(run.elapsed >= Duration::from_millis(250));
        assert!(run.elapsed < Duration::from_secs(3));
    }

    #[test]
    fn test_lightweight_tasks_run_in_parallel() {
        let run = run_lightweight(&workload()).unwrap();
        assert_eq!(run.tally.completed, 20);
        assert!(run.elapsed >= Duration::from_millis(50));
        assert!(run.elapsed < Duration::from_millis(250));
    }
}

// ============================================================================
// Runner
// ============================================================================

mod runner {
    use super::*;
    use feature_showcase::{Runner, Transcript};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_run_covers_every_scenario() {
        let runner = Runner::new(fast_config());
        let mut out = Transcript::silent();
        let summary = runner.run(&mut out).await.unwrap();

        assert_eq!(
            summary.names(),
            vec![
                "immutable",
                "diagnostics",
                "tasks",
                "structured",
                "scoped",
                "sequenced"
            ]
        );
        assert!(summary.scenarios.iter().all(|s| s.lines > 0));
        assert!(out.contains("=== Immutable collection factories ==="));
        assert!(out.contains("All subtasks completed"));
        assert!(out.contains("Caught InvalidState"));
    }

    #[tokio::test]
    async fn test_only_runs_selected_scenarios() {
        let runner = Runner::new(fast_config_only(&["sequenced", "immutable"]));
        let mut out = Transcript::silent();
        let summary = runner.run(&mut out).await.unwrap();
        assert_eq!(summary.names(), vec!["immutable", "sequenced"]);
    }

    #[tokio::test]
    async fn test_unknown_scenario_fails_before_running() {
        let runner = Runner::new(fast_config_only(&["immutable", "missing"]));
        let mut out = Transcript::silent();
        assert!(runner.run(&mut out).await.is_err());
        assert!(out.is_empty());
    }
}
