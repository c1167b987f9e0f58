//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check random operation sequences against a plain HashMap
//! model. Timed puts use a lifetime far beyond the test run, so nothing
//! expires mid-sequence.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::cache::ExpiringCache;

// == Test Configuration ==
const LONG_LIFETIME: Duration = Duration::from_secs(3600);

/// Model of one slot: value and whether a waiter is pending.
type Model = HashMap<String, (u32, bool)>;

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: u32 },
    PutTimed { key: String, value: u32 },
    PutIfAbsent { key: String, value: u32 },
    PutTimedIfAbsent { key: String, value: u32 },
    GetOrCompute { key: String, value: u32 },
    GetOrComputeTimed { key: String, value: u32 },
    Get { key: String },
    Has { key: String },
    Remove { key: String },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        3 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::PutTimed { key, value }),
        2 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::PutIfAbsent { key, value }),
        2 => (key_strategy(), any::<u32>())
            .prop_map(|(key, value)| CacheOp::PutTimedIfAbsent { key, value }),
        2 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::GetOrCompute { key, value }),
        2 => (key_strategy(), any::<u32>())
            .prop_map(|(key, value)| CacheOp::GetOrComputeTimed { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Has { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        1 => Just(CacheOp::Clear),
    ]
}

/// Applies `op` to both cache and model, asserting matching outcomes.
async fn apply(
    cache: &ExpiringCache<u32>,
    model: &mut Model,
    op: CacheOp,
    creator_calls: &AtomicUsize,
) -> std::result::Result<(), TestCaseError> {
    let creator = |value: u32| {
        move |_: &str| {
            creator_calls.fetch_add(1, Ordering::SeqCst);
            value
        }
    };

    match op {
        CacheOp::Put { key, value } => {
            let existed = cache.put(&key, value).await;
            prop_assert_eq!(existed, model.insert(key, (value, false)).is_some());
        }
        CacheOp::PutTimed { key, value } => {
            let existed = cache.put_timed(&key, LONG_LIFETIME, value).await;
            prop_assert_eq!(existed, model.insert(key, (value, true)).is_some());
        }
        CacheOp::PutIfAbsent { key, value } => {
            let before = creator_calls.load(Ordering::SeqCst);
            let inserted = cache.put_if_absent(&key, creator(value)).await;
            let absent = !model.contains_key(&key);
            prop_assert_eq!(inserted, absent);
            prop_assert_eq!(creator_calls.load(Ordering::SeqCst) - before, absent as usize);
            if absent {
                model.insert(key, (value, false));
            }
        }
        CacheOp::PutTimedIfAbsent { key, value } => {
            let inserted = cache
                .put_timed_if_absent(&key, LONG_LIFETIME, creator(value))
                .await;
            let absent = !model.contains_key(&key);
            prop_assert_eq!(inserted, absent);
            if absent {
                model.insert(key, (value, true));
            }
        }
        CacheOp::GetOrCompute { key, value } => {
            let got = cache.get_or_compute(&key, creator(value)).await;
            let expected = match model.get(&key) {
                Some(&(existing, _)) => (existing, true),
                None => {
                    model.insert(key, (value, false));
                    (value, false)
                }
            };
            prop_assert_eq!(got, expected);
        }
        CacheOp::GetOrComputeTimed { key, value } => {
            let got = cache
                .get_or_compute_timed(&key, LONG_LIFETIME, creator(value))
                .await;
            let expected = match model.get(&key) {
                Some(&(existing, _)) => (existing, true),
                None => {
                    model.insert(key, (value, true));
                    (value, false)
                }
            };
            prop_assert_eq!(got, expected);
        }
        CacheOp::Get { key } => {
            prop_assert_eq!(cache.get(&key).await, model.get(&key).map(|(v, _)| *v));
        }
        CacheOp::Has { key } => {
            prop_assert_eq!(cache.has(&key).await, model.contains_key(&key));
        }
        CacheOp::Remove { key } => {
            prop_assert_eq!(cache.remove(&key).await, model.remove(&key).is_some());
        }
        CacheOp::Clear => {
            cache.clear().await;
            model.clear();
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, every return value matches the model,
    // and afterwards each key's presence, value and timed state match too.
    #[test]
    fn prop_matches_hashmap_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        tokio_test::block_on(async {
            let cache = ExpiringCache::new();
            let mut model = Model::new();
            let creator_calls = AtomicUsize::new(0);

            for op in ops {
                apply(&cache, &mut model, op, &creator_calls).await?;
            }

            prop_assert_eq!(cache.len().await, model.len());
            for (key, (value, timed)) in &model {
                prop_assert_eq!(cache.get(key).await, Some(*value));
                prop_assert_eq!(cache.is_timed(key).await, *timed);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    // For any key and values, a permanent put over a timed entry cancels its
    // waiter and the value is the last one written.
    #[test]
    fn prop_put_over_timed_cancels(key in key_strategy(), v1 in any::<u32>(), v2 in any::<u32>()) {
        tokio_test::block_on(async {
            let cache = ExpiringCache::new();
            prop_assert!(!cache.put_timed(&key, LONG_LIFETIME, v1).await);
            prop_assert!(cache.put(&key, v2).await);

            prop_assert_eq!(cache.get(&key).await, Some(v2));
            prop_assert!(!cache.is_timed(&key).await);
            prop_assert_eq!(cache.stats().await.cancelled_expiries, 1);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // For any set of keys, clear leaves nothing behind and cancels every waiter.
    #[test]
    fn prop_clear_removes_everything(
        keys in prop::collection::hash_set(key_strategy(), 1..20),
        timed_mask in any::<u32>()
    ) {
        tokio_test::block_on(async {
            let cache = ExpiringCache::new();
            let mut timed = 0u64;
            for (i, key) in keys.iter().enumerate() {
                if timed_mask & (1 << (i % 32)) != 0 {
                    cache.put_timed(key, LONG_LIFETIME, i as u32).await;
                    timed += 1;
                } else {
                    cache.put(key, i as u32).await;
                }
            }

            cache.clear().await;

            for key in &keys {
                prop_assert!(!cache.has(key).await);
            }
            let stats = cache.stats().await;
            prop_assert_eq!(stats.cancelled_expiries, timed);
            prop_assert_eq!(stats.removals, keys.len() as u64);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
