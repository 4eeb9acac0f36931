pub mod paths;
pub mod service;
pub mod settings;
pub mod validation;

pub use paths::AppPaths;
pub use service::{settings_from_value, ConfigService};
pub use settings::{AppConfig, LlmSettings, RagSettings, ServerSettings};
