use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "max_output_tokens", "tokens"];

/// Environment variables layered over the YAML file, as (variable, path, kind).
const ENV_OVERRIDES: [(&str, &[&str], EnvKind); 7] = [
    ("DOCQA_HOST", &["server", "host"], EnvKind::Text),
    ("PORT", &["server", "port"], EnvKind::Integer),
    ("GEMINI_API_KEY", &["llm", "api_key"], EnvKind::Text),
    ("GEMINI_API_BASE", &["llm", "api_base"], EnvKind::Text),
    ("LLM_TEMPERATURE", &["llm", "temperature"], EnvKind::Float),
    ("RETRIEVER_K", &["rag", "retriever_k"], EnvKind::Integer),
    ("CONTEXTUALIZE_Q_PROMPT", &["rag", "contextualize_prompt"], EnvKind::Text),
];

#[derive(Clone, Copy)]
enum EnvKind {
    Text,
    Integer,
    Float,
}

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("DOCQA_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        self.paths.user_data_dir.join("config.yml")
    }

    /// Raw configuration: the YAML file with environment overrides applied.
    pub fn load_config(&self) -> Value {
        let file_config = load_yaml_file(&self.config_path());
        let env_config = env_overrides(|name| env::var(name).ok());
        deep_merge(&file_config, &env_config)
    }

    pub fn load_settings(&self) -> Result<AppConfig, ApiError> {
        settings_from_value(self.load_config())
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

pub fn settings_from_value(config: Value) -> Result<AppConfig, ApiError> {
    validate_config(&config)?;
    serde_json::from_value(config)
        .map_err(|e| ApiError::Validation(format!("Invalid config: {}", e)))
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                tracing::warn!("{} is not a mapping; ignoring it", path.display());
                Value::Object(Map::new())
            }
            Err(err) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read {}: {}", path.display(), err);
            Value::Object(Map::new())
        }
    }
}

fn env_overrides<F>(lookup: F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    let mut root = Value::Object(Map::new());
    for (name, path, kind) in ENV_OVERRIDES {
        let Some(raw) = lookup(name) else {
            continue;
        };
        let raw = raw.trim().to_string();
        if raw.is_empty() {
            continue;
        }
        // Unparseable numbers stay strings so validation reports them by path.
        let value = match kind {
            EnvKind::Text => Value::String(raw),
            EnvKind::Integer => raw
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or(Value::String(raw)),
            EnvKind::Float => raw
                .parse::<f64>()
                .map(Value::from)
                .unwrap_or(Value::String(raw)),
        };
        insert_path(&mut root, path, value);
    }
    root
}

fn insert_path(config: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = config;
    for key in parents {
        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }
        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }

    if let Some(map) = current.as_object_mut() {
        map.insert((*last).to_string(), value);
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "llm": { "api_key": "file-key", "temperature": 0.2 },
            "rag": { "retriever_k": 3 }
        });
        let override_value = json!({
            "llm": { "api_key": "env-key" },
            "server": { "port": 9000 }
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "llm": { "api_key": "env-key", "temperature": 0.2 },
                "rag": { "retriever_k": 3 },
                "server": { "port": 9000 }
            })
        );
    }

    #[test]
    fn env_overrides_parse_numbers_and_skip_blanks() {
        let overrides = env_overrides(|name| match name {
            "RETRIEVER_K" => Some("8".to_string()),
            "LLM_TEMPERATURE" => Some("0.3".to_string()),
            "GEMINI_API_KEY" => Some("  ".to_string()),
            "PORT" => Some("eighty".to_string()),
            _ => None,
        });

        assert_eq!(
            overrides,
            json!({
                "rag": { "retriever_k": 8 },
                "llm": { "temperature": 0.3 },
                "server": { "port": "eighty" }
            })
        );
    }

    #[test]
    fn settings_fill_defaults_around_given_values() {
        let settings = settings_from_value(json!({
            "llm": { "api_key": "k" },
            "rag": { "retriever_k": 7 }
        }))
        .unwrap();

        assert_eq!(settings.rag.retriever_k, 7);
        assert_eq!(settings.rag.chunk_size, 1000);
        assert_eq!(settings.server.port, 8000);
        assert!((settings.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert!(settings.rag.contextualize_prompt.starts_with("Given a chat history"));
    }

    #[test]
    fn settings_require_api_key() {
        let err = settings_from_value(json!({})).unwrap_err();
        assert!(err.to_string().contains("llm.api_key"));
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "llm": {
                "api_key": "secret",
                "max_output_tokens": 42
            },
            "rag": { "retriever_k": 5 }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "llm": {
                    "api_key": "****",
                    "max_output_tokens": 42
                },
                "rag": { "retriever_k": 5 }
            })
        );
    }
}
