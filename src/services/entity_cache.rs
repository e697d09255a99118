// ============================================================================
// ENTITY CACHE - Memoización por tipo de entidad y huella de la query
// ============================================================================
// Peticiones con la misma huella mientras hay una en vuelo comparten el mismo
// futuro. Las queries "no listas" (parámetros indefinidos con la estrategia
// `InvalidateOnUndefined`) nunca llegan al loader ni se cachean.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::error::{CampusError, CampusResult};
use crate::services::query::{FetchStrategy, Query};
use crate::utils::runtime::Runtime;

type SharedLoad<T> = Shared<LocalBoxFuture<'static, CampusResult<T>>>;
type Listener = Rc<dyn Fn()>;

enum CacheEntry<T> {
    Computing { id: u64, future: SharedLoad<T> },
    Completed { value: T, loaded_at: DateTime<Utc> },
    Failed(CampusError),
}

struct Entries<T> {
    map: HashMap<String, CacheEntry<T>>,
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Lo que ve una vista al pedir datos
#[derive(Clone, Debug, PartialEq)]
pub struct CacheStatus<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_error: bool,
}

impl<T> CacheStatus<T> {
    pub fn loading() -> Self {
        Self { data: None, is_loading: true, is_error: false }
    }

    pub fn loaded(value: T) -> Self {
        Self { data: Some(value), is_loading: false, is_error: false }
    }

    pub fn failed() -> Self {
        Self { data: None, is_loading: false, is_error: true }
    }
}

pub struct EntityCache<T> {
    namespace: String,
    kind: &'static str,
    entries: Rc<RefCell<Entries<T>>>,
    runtime: Runtime,
}

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            kind: self.kind,
            entries: self.entries.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T: Clone + 'static> EntityCache<T> {
    pub fn new(namespace: &str, kind: &'static str, runtime: Runtime) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind,
            entries: Rc::new(RefCell::new(Entries {
                map: HashMap::new(),
                next_id: 0,
                listeners: Vec::new(),
            })),
            runtime,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Clave de caché y query efectiva, o `None` si la query no está lista
    fn resolve(&self, query: &Query, strategy: FetchStrategy) -> Option<(String, Query)> {
        let effective = match strategy {
            FetchStrategy::InvalidateOnUndefined if query.has_undefined() => return None,
            FetchStrategy::InvalidateOnUndefined => query.clone(),
            FetchStrategy::Default => query.defined(),
        };
        let key = format!("{}/{}/{}", self.namespace, self.kind, effective.fingerprint());
        Some((key, effective))
    }

    /// Suscribirse a cada entrada que termina de cargar (o fallar)
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn() + 'static,
    {
        self.entries.borrow_mut().listeners.push(Rc::new(listener));
    }

    fn start<F, Fut>(&self, key: String, query: Query, loader: F) -> SharedLoad<T>
    where
        F: FnOnce(Query) -> Fut,
        Fut: Future<Output = CampusResult<T>> + 'static,
    {
        let id = {
            let mut entries = self.entries.borrow_mut();
            entries.next_id += 1;
            entries.next_id
        };

        log::debug!("Cargando {}", key);
        let pending = loader(query);
        let entries = self.entries.clone();
        let settle_key = key.clone();
        let future = async move {
            let result = pending.await;
            settle(&entries, &settle_key, id, &result);
            result
        }
        .boxed_local()
        .shared();

        self.entries
            .borrow_mut()
            .map
            .insert(key, CacheEntry::Computing { id, future: future.clone() });
        future
    }

    /// Versión síncrona para vistas: devuelve el estado actual y, si hace falta,
    /// lanza la carga en segundo plano.
    pub fn fetch<F, Fut>(&self, query: &Query, strategy: FetchStrategy, loader: F) -> CacheStatus<T>
    where
        F: FnOnce(Query) -> Fut,
        Fut: Future<Output = CampusResult<T>> + 'static,
    {
        let Some((key, effective)) = self.resolve(query, strategy) else {
            return CacheStatus::loading();
        };

        let needs_load = match self.entries.borrow().map.get(&key) {
            Some(CacheEntry::Completed { value, .. }) => return CacheStatus::loaded(value.clone()),
            Some(CacheEntry::Computing { .. }) => false,
            Some(CacheEntry::Failed(_)) | None => true,
        };

        if needs_load {
            let future = self.start(key, effective, loader);
            self.runtime.spawn(future.map(|_| ()));
        }
        CacheStatus::loading()
    }

    /// Espera el resultado. `Ok(None)` significa query no lista.
    pub async fn load<F, Fut>(&self, query: &Query, strategy: FetchStrategy, loader: F) -> CampusResult<Option<T>>
    where
        F: FnOnce(Query) -> Fut,
        Fut: Future<Output = CampusResult<T>> + 'static,
    {
        let Some((key, effective)) = self.resolve(query, strategy) else {
            return Ok(None);
        };

        let in_flight = match self.entries.borrow().map.get(&key) {
            Some(CacheEntry::Completed { value, .. }) => return Ok(Some(value.clone())),
            Some(CacheEntry::Computing { future, .. }) => Some(future.clone()),
            Some(CacheEntry::Failed(_)) | None => None,
        };

        let future = match in_flight {
            Some(future) => future,
            None => self.start(key, effective, loader),
        };
        future.await.map(Some)
    }

    /// Estado sin disparar cargas
    pub fn read(&self, query: &Query, strategy: FetchStrategy) -> CacheStatus<T> {
        let Some((key, _)) = self.resolve(query, strategy) else {
            return CacheStatus::loading();
        };
        match self.entries.borrow().map.get(&key) {
            Some(CacheEntry::Completed { value, .. }) => CacheStatus::loaded(value.clone()),
            Some(CacheEntry::Failed(_)) => CacheStatus::failed(),
            Some(CacheEntry::Computing { .. }) | None => CacheStatus::loading(),
        }
    }

    /// Error de la última carga, mientras no se reintente
    pub fn error(&self, query: &Query, strategy: FetchStrategy) -> Option<CampusError> {
        let (key, _) = self.resolve(query, strategy)?;
        match self.entries.borrow().map.get(&key) {
            Some(CacheEntry::Failed(e)) => Some(e.clone()),
            _ => None,
        }
    }

    pub fn loaded_at(&self, query: &Query, strategy: FetchStrategy) -> Option<DateTime<Utc>> {
        let (key, _) = self.resolve(query, strategy)?;
        match self.entries.borrow().map.get(&key) {
            Some(CacheEntry::Completed { loaded_at, .. }) => Some(*loaded_at),
            _ => None,
        }
    }

    /// Descarta la entrada. Una carga en vuelo termina pero su resultado no se guarda.
    pub fn invalidate(&self, query: &Query, strategy: FetchStrategy) {
        if let Some((key, _)) = self.resolve(query, strategy) {
            self.entries.borrow_mut().map.remove(&key);
        }
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().map.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn settle<T: Clone>(entries: &Rc<RefCell<Entries<T>>>, key: &str, id: u64, result: &CampusResult<T>) {
    let listeners = {
        let mut entries = entries.borrow_mut();
        let current = matches!(entries.map.get(key), Some(CacheEntry::Computing { id: current, .. }) if *current == id);
        if !current {
            log::debug!("Resultado descartado para {}", key);
            return;
        }

        let entry = match result {
            Ok(value) => CacheEntry::Completed { value: value.clone(), loaded_at: Utc::now() },
            Err(e) => {
                log::warn!("⚠️ Error cargando {}: {}", key, e);
                CacheEntry::Failed(e.clone())
            }
        };
        entries.map.insert(key.to_string(), entry);
        entries.listeners.clone()
    };

    for listener in listeners {
        listener();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::runtime::manual::ManualSleeper;
    use futures::channel::oneshot;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;
    use std::cell::Cell;

    fn cache(pool: &LocalPool) -> EntityCache<Vec<u64>> {
        let runtime = Runtime::new(Rc::new(pool.spawner()), Rc::new(ManualSleeper::default()));
        EntityCache::new("campus", "cursos", runtime)
    }

    #[test]
    fn test_identical_fetches_share_one_request() {
        let mut pool = LocalPool::new();
        let cache = cache(&pool);
        let calls = Rc::new(Cell::new(0));
        let results = Rc::new(RefCell::new(Vec::new()));
        let (tx, rx) = oneshot::channel::<Vec<u64>>();
        let rx = Rc::new(RefCell::new(Some(rx)));

        let query = Query::new().eq("ruta_id", 3);
        for _ in 0..2 {
            let (cache, query, calls, results, rx) =
                (cache.clone(), query.clone(), calls.clone(), results.clone(), rx.clone());
            pool.spawner()
                .spawn_local(async move {
                    let result = cache
                        .load(&query, FetchStrategy::Default, move |_| {
                            calls.set(calls.get() + 1);
                            let rx = rx.borrow_mut().take();
                            async move {
                                match rx {
                                    Some(rx) => rx.await.map_err(|_| CampusError::Network("cancelado".into())),
                                    None => Err(CampusError::Network("segunda petición".into())),
                                }
                            }
                        })
                        .await;
                    results.borrow_mut().push(result);
                })
                .unwrap();
        }

        pool.run_until_stalled();
        assert_eq!(calls.get(), 1);
        assert!(results.borrow().is_empty());

        tx.send(vec![1, 2]).unwrap();
        pool.run_until_stalled();

        assert_eq!(calls.get(), 1);
        assert_eq!(*results.borrow(), vec![Ok(Some(vec![1, 2])), Ok(Some(vec![1, 2]))]);
    }

    #[test]
    fn test_sync_fetch_dedups_and_notifies() {
        let mut pool = LocalPool::new();
        let cache = cache(&pool);
        let calls = Rc::new(Cell::new(0));
        let notified = Rc::new(Cell::new(0));

        let counter = notified.clone();
        cache.subscribe(move || counter.set(counter.get() + 1));

        let query = Query::new().eq("ruta_id", 3);
        for _ in 0..3 {
            let calls = calls.clone();
            let status = cache.fetch(&query, FetchStrategy::Default, move |_| {
                calls.set(calls.get() + 1);
                async { Ok(vec![7]) }
            });
            assert!(status.is_loading);
        }

        pool.run_until_stalled();

        assert_eq!(calls.get(), 1);
        assert_eq!(notified.get(), 1);
        assert_eq!(cache.read(&query, FetchStrategy::Default), CacheStatus::loaded(vec![7]));
        assert!(cache.loaded_at(&query, FetchStrategy::Default).is_some());
    }

    #[test]
    fn test_invalidate_on_undefined_skips_gateway_until_defined() {
        let mut pool = LocalPool::new();
        let cache = cache(&pool);
        let calls = Rc::new(Cell::new(0));

        let fetch = |cache: &EntityCache<Vec<u64>>, user_id: Option<u64>| {
            let calls = calls.clone();
            let query = Query::new().maybe("user_id", user_id);
            cache.fetch(&query, FetchStrategy::InvalidateOnUndefined, move |_| {
                calls.set(calls.get() + 1);
                async { Ok(vec![1]) }
            })
        };

        let status = fetch(&cache, None);
        assert_eq!(status, CacheStatus::loading());
        pool.run_until_stalled();
        assert_eq!(calls.get(), 0);
        assert!(cache.is_empty());

        fetch(&cache, Some(7));
        pool.run_until_stalled();
        let status = fetch(&cache, Some(7));

        assert_eq!(calls.get(), 1);
        assert_eq!(status, CacheStatus::loaded(vec![1]));
    }

    #[test]
    fn test_default_strategy_drops_undefined_params() {
        let pool = LocalPool::new();
        let cache = cache(&pool);
        let seen = Rc::new(RefCell::new(None));

        let sink = seen.clone();
        let query = Query::new().eq("curso_id", 2).maybe::<u64>("user_id", None);
        let result = futures::executor::block_on(cache.load(&query, FetchStrategy::Default, move |q| {
            *sink.borrow_mut() = Some(q.to_query_string());
            async { Ok(vec![]) }
        }));

        assert_eq!(result.unwrap(), Some(vec![]));
        assert_eq!(seen.borrow().as_deref(), Some("&curso_id=2"));
    }

    #[test]
    fn test_failed_load_is_reported_then_retried() {
        let pool = LocalPool::new();
        let cache = cache(&pool);
        let query = Query::new();

        let failed = futures::executor::block_on(cache.load(&query, FetchStrategy::Default, |_| async {
            Err(CampusError::Network("offline".into()))
        }));
        assert!(failed.is_err());
        assert!(cache.read(&query, FetchStrategy::Default).is_error);
        assert_eq!(
            cache.error(&query, FetchStrategy::Default),
            Some(CampusError::Network("offline".into()))
        );

        let retried = futures::executor::block_on(cache.load(&query, FetchStrategy::Default, |_| async { Ok(vec![4]) }));
        assert_eq!(retried.unwrap(), Some(vec![4]));
        assert_eq!(cache.error(&query, FetchStrategy::Default), None);
    }

    #[test]
    fn test_invalidated_in_flight_result_is_discarded() {
        let pool = LocalPool::new();
        let cache = cache(&pool);
        let query = Query::new().eq("id", 1);
        let (tx, rx) = oneshot::channel::<Vec<u64>>();

        let pending = cache.load(&query, FetchStrategy::Default, move |_| async move {
            rx.await.map_err(|_| CampusError::Network("cancelado".into()))
        });
        let pending = futures::executor::block_on(async {
            let mut pending = Box::pin(pending);
            // Primer poll: registra la entrada en vuelo
            assert!(futures::poll!(pending.as_mut()).is_pending());
            pending
        });

        cache.clear();
        tx.send(vec![9]).unwrap();

        let result = futures::executor::block_on(pending);
        assert_eq!(result.unwrap(), Some(vec![9]));
        assert!(cache.read(&query, FetchStrategy::Default).is_loading);
        assert!(cache.is_empty());
    }
}
