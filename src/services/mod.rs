pub mod query;
pub mod gateway;
pub mod api_client;
pub mod entity_cache;
pub mod catalog_service;
pub mod notifier;
pub mod events;

pub use query::{FetchStrategy, Query};
pub use gateway::DataGateway;
pub use api_client::ApiClient;
pub use entity_cache::{CacheStatus, EntityCache};
pub use catalog_service::CatalogService;
pub use notifier::{LogNotifier, Notifier, Toast, ToastKind};
pub use events::{EventBus, PlayerEvent};
