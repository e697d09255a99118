// ============================================================================
// RUNTIME - Spawner y temporizadores inyectables
// ============================================================================
// En el navegador las tareas van a `spawn_local` y las esperas a gloo-timers.
// Los tests sustituyen ambos por un LocalPool y un reloj manual.
// ============================================================================

use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::task::{LocalFutureObj, LocalSpawn, LocalSpawnExt, SpawnError};
use futures::FutureExt;

/// Espera asíncrona en milisegundos
pub trait Sleeper {
    fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()>;
}

pub struct GlooSleeper;

impl Sleeper for GlooSleeper {
    fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        gloo_timers::future::TimeoutFuture::new(millis).boxed_local()
    }
}

pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

/// Dónde se ejecutan las tareas en segundo plano y cómo se espera
#[derive(Clone)]
pub struct Runtime {
    spawner: Rc<dyn LocalSpawn>,
    sleeper: Rc<dyn Sleeper>,
}

impl Runtime {
    pub fn new(spawner: Rc<dyn LocalSpawn>, sleeper: Rc<dyn Sleeper>) -> Self {
        Self { spawner, sleeper }
    }

    pub fn browser() -> Self {
        Self::new(Rc::new(WasmSpawner), Rc::new(GlooSleeper))
    }

    /// Lanza una tarea sin esperar su resultado
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        if let Err(e) = self.spawner.spawn_local(future) {
            log::error!("❌ No se pudo lanzar la tarea: {}", e);
        }
    }

    pub fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        self.sleeper.sleep(millis)
    }
}


#[cfg(test)]
mod tests {
    use super::manual::ManualSleeper;
    use super::*;
    use futures::executor::LocalPool;
    use std::cell::Cell;

    #[test]
    fn test_sleep_resolves_only_after_advance() {
        let mut pool = LocalPool::new();
        let sleeper = ManualSleeper::default();
        let runtime = Runtime::new(Rc::new(pool.spawner()), Rc::new(sleeper.clone()));
        let done = Rc::new(Cell::new(false));

        let flag = done.clone();
        let rt = runtime.clone();
        runtime.spawn(async move {
            rt.sleep(1000).await;
            flag.set(true);
        });

        pool.run_until_stalled();
        assert!(!done.get());

        sleeper.advance(999);
        pool.run_until_stalled();
        assert!(!done.get());

        sleeper.advance(1);
        pool.run_until_stalled();
        assert!(done.get());
        assert_eq!(sleeper.pending(), 0);
    }
}
