//! Scoped bindings carried by an explicit context
//!
//! A `ScopedSlot<T>` is a typed key. A `ScopeContext` is an immutable chain
//! of bindings. `ctx.bind(&slot, value).run(|inner| ...)` hands the block an
//! extended context; the caller's context is never modified, so the previous
//! binding is in force again as soon as the block returns, by any path.
//! Nested binds of the same slot shadow the outer value inside the inner
//! block only. There is no way to change a bound value in place.
//!
//! `ThreadSlot` wraps a mutable thread-local for comparison.

use std::any::Any;
use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::LocalKey;

use thiserror::Error;
use tracing::trace;

/// Errors raised when reading a scoped slot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("Scoped slot \"{0}\" is not bound in this scope")]
    Unbound(&'static str),
}

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(1);

/// Typed key for a scoped binding
#[derive(Debug)]
pub struct ScopedSlot<T> {
    id: u64,
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> ScopedSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            id: NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed),
            name,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Innermost value bound in `ctx`
    pub fn get(&self, ctx: &ScopeContext) -> Result<T, ScopeError> {
        ctx.lookup(self.id)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
            .ok_or(ScopeError::Unbound(self.name))
    }

    pub fn is_bound(&self, ctx: &ScopeContext) -> bool {
        ctx.lookup(self.id).is_some()
    }
}

struct Frame {
    slot: u64,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Frame>>,
}

/// Immutable set of scoped bindings in force for a block
#[derive(Clone, Default)]
pub struct ScopeContext {
    head: Option<Arc<Frame>>,
}

impl ScopeContext {
    /// Context with nothing bound
    pub fn empty() -> Self {
        Self::default()
    }

    /// Prepare a binding of `slot` to `value`
    pub fn bind<T>(&self, slot: &ScopedSlot<T>, value: T) -> Binding
    where
        T: Clone + Send + Sync + 'static,
    {
        Binding {
            ctx: self.clone(),
        }
        .bind(slot, value)
    }

    /// Number of frames, shadowed ones included
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            depth += 1;
            frame = f.parent.as_deref();
        }
        depth
    }

    fn lookup(&self, slot: u64) -> Option<&(dyn Any + Send + Sync)> {
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            if f.slot == slot {
                return Some(f.value.as_ref());
            }
            frame = f.parent.as_deref();
        }
        None
    }
}

impl std::fmt::Debug for ScopeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeContext")
            .field("depth", &self.depth())
            .finish()
    }
}

/// Pending bindings, applied for the extent of `run` / `run_async`
#[must_use = "bindings only take effect inside run or run_async"]
pub struct Binding {
    ctx: ScopeContext,
}

impl Binding {
    /// Add another binding
    pub fn bind<T>(self, slot: &ScopedSlot<T>, value: T) -> Binding
    where
        T: Clone + Send + Sync + 'static,
    {
        trace!("Binding scoped slot {}", slot.name);
        Binding {
            ctx: ScopeContext {
                head: Some(Arc::new(Frame {
                    slot: slot.id,
                    value: Arc::new(value),
                    parent: self.ctx.head,
                })),
            },
        }
    }

    /// Run `block` with the bindings in force
    pub fn run<R>(self, block: impl FnOnce(&ScopeContext) -> R) -> R {
        block(&self.ctx)
    }

    /// Run an async block with the bindings in force
    pub async fn run_async<R, F, Fut>(self, block: F) -> R
    where
        F: FnOnce(ScopeContext) -> Fut,
        Fut: Future<Output = R>,
    {
        block(self.ctx).await
    }
}

/// Mutable per-thread slot
///
/// Values persist on a thread until replaced or removed, so a pooled worker
/// keeps whatever the previous task left behind.
pub struct ThreadSlot<T: 'static> {
    key: &'static LocalKey<RefCell<Option<T>>>,
}

impl<T: Clone + 'static> ThreadSlot<T> {
    pub const fn new(key: &'static LocalKey<RefCell<Option<T>>>) -> Self {
        Self { key }
    }

    pub fn set(&self, value: T) {
        self.key.with(|cell| *cell.borrow_mut() = Some(value));
    }

    pub fn get(&self) -> Option<T> {
        self.key.with(|cell| cell.borrow().clone())
    }

    pub fn remove(&self) -> Option<T> {
        self.key.with(|cell| cell.borrow_mut().take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_read_fails() {
        let user: ScopedSlot<String> = ScopedSlot::new("USER");
        let err = user.get(&ScopeContext::empty()).unwrap_err();
        assert_eq!(err, ScopeError::Unbound("USER"));
    }

    #[test]
    fn test_nested_bind_shadows_then_restores() {
        let user = ScopedSlot::new("USER");
        let root = ScopeContext::empty();

        let seen = root.bind(&user, "A".to_string()).run(|outer| {
            let mut seen = vec![user.get(outer).unwrap()];
            let inner_seen = outer
                .bind(&user, "B".to_string())
                .run(|inner| user.get(inner).unwrap());
            seen.push(inner_seen);
            seen.push(user.get(outer).unwrap());
            seen
        });

        assert_eq!(seen, vec!["A", "B", "A"]);
        assert!(user.get(&root).is_err());
    }

    #[test]
    fn test_slots_are_independent() {
        let user = ScopedSlot::new("USER");
        let request = ScopedSlot::new("REQUEST_ID");
        ScopeContext::empty()
            .bind(&user, "alice")
            .bind(&request, 7u32)
            .run(|ctx| {
                assert_eq!(user.get(ctx), Ok("alice"));
                assert_eq!(request.get(ctx), Ok(7));
                assert_eq!(ctx.depth(), 2);
            });
    }

    #[test]
    fn test_same_name_different_slots_do_not_collide() {
        let a: ScopedSlot<i32> = ScopedSlot::new("X");
        let b: ScopedSlot<i32> = ScopedSlot::new("X");
        ScopeContext::empty().bind(&a, 1).run(|ctx| {
            assert!(a.is_bound(ctx));
            assert!(!b.is_bound(ctx));
        });
    }

    #[test]
    fn test_binding_ends_when_block_panics() {
        let user = ScopedSlot::new("USER");
        let root = ScopeContext::empty();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            root.bind(&user, 1).run(|_| panic!("block failed"));
        }));
        assert!(result.is_err());
        assert!(!user.is_bound(&root));
    }

    #[tokio::test]
    async fn test_child_task_inherits_binding() {
        let user = Arc::new(ScopedSlot::new("USER"));
        let root = ScopeContext::empty();

        let slot = Arc::clone(&user);
        let from_child = root
            .bind(&user, "alice".to_string())
            .run_async(|ctx| async move {
                tokio::spawn(async move { slot.get(&ctx) }).await.unwrap()
            })
            .await;
        assert_eq!(from_child.unwrap(), "alice");

        // Spawned from the unbound context
        let ctx = root.clone();
        let slot = Arc::clone(&user);
        let outside = tokio::spawn(async move { slot.get(&ctx) }).await.unwrap();
        assert!(outside.is_err());
    }

    thread_local! {
        static LEGACY: RefCell<Option<u32>> = const { RefCell::new(None) };
    }

    #[test]
    fn test_thread_slot_is_mutable_and_sticky() {
        let slot = ThreadSlot::new(&LEGACY);
        assert_eq!(slot.get(), None);
        slot.set(1);
        slot.set(2);
        assert_eq!(slot.get(), Some(2));
        assert_eq!(slot.remove(), Some(2));
        assert_eq!(slot.get(), None);
    }
}
