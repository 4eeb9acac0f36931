use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
        validate_u64_field(
            server,
            "server.max_upload_bytes",
            "max_upload_bytes",
            1,
            1_000_000_000,
        )?;
    }

    let llm = expect_optional_object(root, "llm")?
        .ok_or_else(|| ApiError::Validation(required_message("llm.api_key")))?;
    validate_required_string_field(llm, "llm.api_key", "api_key")?;
    validate_optional_string_field(llm, "llm.api_base", "api_base")?;
    validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
    validate_u64_field(
        llm,
        "llm.request_timeout_secs",
        "request_timeout_secs",
        1,
        3_600,
    )?;
    validate_optional_string_field(llm, "llm.embedding_model", "embedding_model")?;

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(rag, "rag.retriever_k", "retriever_k", 1, 100)?;
        validate_u64_field(rag, "rag.chunk_size", "chunk_size", 100, 100_000)?;
        validate_u64_field(rag, "rag.chunk_overlap", "chunk_overlap", 0, 50_000)?;
        validate_optional_string_field(rag, "rag.contextualize_prompt", "contextualize_prompt")?;

        let size = rag.get("chunk_size").and_then(|v| v.as_u64()).unwrap_or(1000);
        let overlap = rag.get("chunk_overlap").and_then(|v| v.as_u64()).unwrap_or(200);
        if overlap >= size {
            return Err(ApiError::Validation(
                "Invalid config at 'rag.chunk_overlap': must be smaller than rag.chunk_size"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(range_error(path, min, max));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(range_error(path, min, max));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section
        .get(key)
        .ok_or_else(|| ApiError::Validation(required_message(path)))?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::Validation(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::Validation(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn required_message(path: &str) -> String {
    format!("Invalid config at '{}': value is required", path)
}

fn range_error<T: std::fmt::Display>(path: &str, min: T, max: T) -> ApiError {
    ApiError::Validation(format!(
        "Invalid config at '{}': must be between {} and {}",
        path, min, max
    ))
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::Validation(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
