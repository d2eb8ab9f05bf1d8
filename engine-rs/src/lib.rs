pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod services;
pub mod storage;

pub use config::Config;
pub use engine::{Engine, EngineStats, Session};
pub use error::{AppError, AppResult, ErrorKind};
pub use scheduler::{Availability, ServiceStatus};
pub use storage::{DocumentStore, FileStore, MemoryStore, PersistSink, StorageKey};
