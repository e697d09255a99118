// ============================================================================
// STORAGE - Persistencia clave/valor (localStorage / sessionStorage)
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use gloo_storage::Storage;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::{CampusError, CampusResult};
use crate::models::{LoginData, User};

pub const LOGIN_TOKEN: &str = "LOGIN_TOKEN";
pub const LOGIN_USER: &str = "LOGIN_USER";

/// Almacén de cadenas por clave
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> CampusResult<()>;
    fn remove_item(&self, key: &str) -> CampusResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowserArea {
    Local,
    Session,
}

/// Storage del navegador vía gloo-storage
#[derive(Clone, Copy, Debug)]
pub struct BrowserStorage {
    area: BrowserArea,
}

impl BrowserStorage {
    pub fn local() -> Self {
        Self { area: BrowserArea::Local }
    }

    pub fn session() -> Self {
        Self { area: BrowserArea::Session }
    }

    fn raw(&self) -> web_sys::Storage {
        match self.area {
            BrowserArea::Local => gloo_storage::LocalStorage::raw(),
            BrowserArea::Session => gloo_storage::SessionStorage::raw(),
        }
    }
}

impl KeyValueStorage for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.raw().get_item(key).ok()?
    }

    fn set_item(&self, key: &str, value: &str) -> CampusResult<()> {
        self.raw()
            .set_item(key, value)
            .map_err(|_| CampusError::Storage(format!("Error guardando {} en storage", key)))
    }

    fn remove_item(&self, key: &str) -> CampusResult<()> {
        self.raw()
            .remove_item(key)
            .map_err(|_| CampusError::Storage(format!("Error eliminando {} de storage", key)))
    }
}

/// Storage en memoria. Los clones comparten contenido.
#[derive(Clone, Default, Debug)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> CampusResult<()> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> CampusResult<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

pub fn save_to_storage<T: Serialize>(storage: &dyn KeyValueStorage, key: &str, value: &T) -> CampusResult<()> {
    let json = serde_json::to_string(value)?;
    storage.set_item(key, &json)
}

pub fn load_from_storage<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let json = storage.get_item(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("⚠️ Valor corrupto en storage ({}): {}", key, e);
            None
        }
    }
}

pub fn remove_from_storage(storage: &dyn KeyValueStorage, key: &str) -> CampusResult<()> {
    storage.remove_item(key)
}

/// Valor persistido junto a su caducidad (ms desde epoch)
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct Expiring<T> {
    value: T,
    expires_at: i64,
}

pub type Clock = Rc<dyn Fn() -> DateTime<Utc>>;

/// Persistencia de la sesión en dos niveles: duradero (días) y caducable (minutos).
/// Ambos usan las claves `LOGIN_TOKEN` y `LOGIN_USER`.
#[derive(Clone)]
pub struct SessionStorage {
    durable: Rc<dyn KeyValueStorage>,
    expiring: Rc<dyn KeyValueStorage>,
    config: SessionConfig,
    clock: Clock,
}

impl SessionStorage {
    pub fn new(durable: Rc<dyn KeyValueStorage>, expiring: Rc<dyn KeyValueStorage>, config: SessionConfig) -> Self {
        Self {
            durable,
            expiring,
            config,
            clock: Rc::new(Utc::now),
        }
    }

    /// localStorage para el nivel duradero, sessionStorage para el caducable
    pub fn browser(config: SessionConfig) -> Self {
        Self::new(Rc::new(BrowserStorage::local()), Rc::new(BrowserStorage::session()), config)
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Guarda en un solo nivel y vacía el otro, para que `load` no devuelva
    /// una sesión anterior
    pub fn save(&self, data: &LoginData, persist: bool) -> CampusResult<()> {
        let (storage, other, ttl) = if persist {
            (&self.durable, &self.expiring, Duration::days(self.config.durable_days))
        } else {
            (&self.expiring, &self.durable, Duration::minutes(self.config.expiring_minutes))
        };
        Self::purge_tier(other.as_ref());
        let expires_at = ((self.clock)() + ttl).timestamp_millis();

        save_to_storage(storage.as_ref(), LOGIN_TOKEN, &Expiring { value: &data.token, expires_at })?;
        save_to_storage(storage.as_ref(), LOGIN_USER, &Expiring { value: &data.user, expires_at })?;
        Ok(())
    }

    /// Primero el nivel duradero, después el caducable. Entradas caducadas se borran.
    /// El `bool` indica si venía del nivel duradero.
    pub fn load(&self) -> Option<(LoginData, bool)> {
        self.load_tier(self.durable.as_ref())
            .map(|data| (data, true))
            .or_else(|| self.load_tier(self.expiring.as_ref()).map(|data| (data, false)))
    }

    fn load_tier(&self, storage: &dyn KeyValueStorage) -> Option<LoginData> {
        let now = (self.clock)().timestamp_millis();
        let token: Option<Expiring<String>> = load_from_storage(storage, LOGIN_TOKEN);
        let user: Option<Expiring<User>> = load_from_storage(storage, LOGIN_USER);

        match (token, user) {
            (Some(token), Some(user)) if token.expires_at > now && user.expires_at > now => {
                Some(LoginData { token: token.value, user: user.value })
            }
            (None, None) => None,
            _ => {
                log::debug!("Sesión persistida caducada o incompleta, se descarta");
                Self::purge_tier(storage);
                None
            }
        }
    }

    fn purge_tier(storage: &dyn KeyValueStorage) {
        for key in [LOGIN_TOKEN, LOGIN_USER] {
            if let Err(e) = remove_from_storage(storage, key) {
                log::warn!("⚠️ {}", e);
            }
        }
    }

    /// Borra ambos niveles. No falla.
    pub fn clear(&self) {
        Self::purge_tier(self.durable.as_ref());
        Self::purge_tier(self.expiring.as_ref());
    }
}
