//! Deferred references to API resources.
//!
//! A [`LazyRef`] pairs an id with the context needed to fetch it. The first
//! `eval` fetches, later ones reuse the cached result. Resources that point
//! back at their owner (a beatmap inside its beatmapset) are seeded with a
//! weak parent pointer so no reference cycle is formed.

use crate::client::Client;
use crate::error::Result;
use crate::lock;
use async_trait::async_trait;
use futures::future::try_join_all;
use indexmap::IndexMap;
use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use tracing::trace;

/// A resource that can be fetched by id
#[async_trait]
pub trait LazyConstructor<C = Client>: Sized + Send + Sync + 'static {
    /// Fetch the resource, `None` when it does not exist
    async fn eval(context: &C, id: u64) -> Result<Option<Arc<Self>>>;
}

/// What to do after a fetch reported the resource as missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsentPolicy {
    /// Remember the absence
    #[default]
    Memoize,
    /// Fetch again on the next `eval`
    Refetch,
}

enum Slot<T> {
    Resolved(Option<Arc<T>>),
    Parent(Weak<T>),
}

struct LazyInner<T, C> {
    context: C,
    id: u64,
    policy: AbsentPolicy,
    cache: Mutex<Option<Slot<T>>>,
    /// Serializes fetches so concurrent evals share one request
    gate: tokio::sync::Mutex<()>,
}

/// Deferred, cached reference to the resource `T` with a given id
///
/// Clones share the cache.
pub struct LazyRef<T, C = Client> {
    inner: Arc<LazyInner<T, C>>,
}

impl<T, C> LazyRef<T, C>
where
    T: LazyConstructor<C>,
    C: Send + Sync + 'static,
{
    /// Create an unresolved reference
    pub fn new(context: C, id: u64) -> Self {
        Self::with_policy(context, id, AbsentPolicy::default())
    }

    /// Create an unresolved reference with an explicit absence policy
    pub fn with_policy(context: C, id: u64, policy: AbsentPolicy) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                context,
                id,
                policy,
                cache: Mutex::new(None),
                gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Resolve the reference
    ///
    /// Concurrent callers wait for a single fetch. Errors are not cached.
    pub async fn eval(&self) -> Result<Option<Arc<T>>> {
        if let Some(value) = self.cached() {
            return Ok(value);
        }

        let _gate = self.inner.gate.lock().await;
        if let Some(value) = self.cached() {
            return Ok(value);
        }

        trace!(
            id = self.inner.id,
            resource = type_name::<T>(),
            "Resolving lazy reference"
        );

        let value = <T as LazyConstructor<C>>::eval(&self.inner.context, self.inner.id).await?;
        *lock(&self.inner.cache) = Some(Slot::Resolved(value.clone()));
        Ok(value)
    }

    /// Seed the cache with a known resolution
    pub fn set(&self, value: Option<Arc<T>>) {
        *lock(&self.inner.cache) = Some(Slot::Resolved(value));
    }

    /// Seed the cache with the owning resource
    ///
    /// The parent is held weakly; once it is gone `eval` fetches again.
    pub fn set_parent(&self, parent: &Weak<T>) {
        *lock(&self.inner.cache) = Some(Slot::Parent(parent.clone()));
    }

    /// Whether `eval` would return without fetching
    pub fn is_evaluated(&self) -> bool {
        self.cached().is_some()
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn context(&self) -> &C {
        &self.inner.context
    }

    pub fn policy(&self) -> AbsentPolicy {
        self.inner.policy
    }

    fn cached(&self) -> Option<Option<Arc<T>>> {
        let cache = lock(&self.inner.cache);
        match cache.as_ref()? {
            Slot::Resolved(None) if self.inner.policy == AbsentPolicy::Refetch => None,
            Slot::Resolved(value) => Some(value.clone()),
            Slot::Parent(parent) => parent.upgrade().map(Some),
        }
    }
}

impl<T, C> Clone for LazyRef<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, C> fmt::Debug for LazyRef<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match lock(&self.inner.cache).as_ref() {
            None => "unresolved",
            Some(Slot::Resolved(Some(_))) => "resolved",
            Some(Slot::Resolved(None)) => "absent",
            Some(Slot::Parent(_)) => "parent",
        };
        f.debug_struct("LazyRef")
            .field("resource", &type_name::<T>())
            .field("id", &self.inner.id)
            .field("state", &state)
            .finish()
    }
}

/// Insertion-ordered set of lazy references sharing one context
pub struct LazyRefCollection<T, C = Client> {
    refs: IndexMap<u64, LazyRef<T, C>>,
}

impl<T, C> LazyRefCollection<T, C>
where
    T: LazyConstructor<C>,
    C: Clone + Send + Sync + 'static,
{
    /// One reference per distinct id, in first-seen order
    pub fn new(context: C, ids: impl IntoIterator<Item = u64>) -> Self {
        let mut refs = IndexMap::new();
        for id in ids {
            refs.entry(id)
                .or_insert_with(|| LazyRef::new(context.clone(), id));
        }
        Self { refs }
    }

    pub fn get(&self, id: u64) -> Option<&LazyRef<T, C>> {
        self.refs.get(&id)
    }

    /// Resolve one member; unknown ids resolve to `None` without a fetch
    pub async fn eval_one(&self, id: u64) -> Result<Option<Arc<T>>> {
        match self.refs.get(&id) {
            Some(lazy) => lazy.eval().await,
            None => Ok(None),
        }
    }

    /// Resolve every member concurrently
    ///
    /// The result keeps the collection's order. The first error fails the
    /// whole call; members that did resolve stay cached.
    pub async fn eval_all(&self) -> Result<IndexMap<u64, Option<Arc<T>>>> {
        let values = try_join_all(self.refs.values().map(|lazy| lazy.eval())).await?;
        Ok(self.refs.keys().copied().zip(values).collect())
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.refs.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &LazyRef<T, C>)> {
        self.refs.iter().map(|(id, lazy)| (*id, lazy))
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

impl<T, C> Clone for LazyRefCollection<T, C> {
    fn clone(&self) -> Self {
        Self {
            refs: self.refs.clone(),
        }
    }
}

impl<T, C> fmt::Debug for LazyRefCollection<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.refs.values()).finish()
    }
}
