//! Plain-text extraction for uploaded documents.

use std::path::Path;

use scraper::{Html, Node};

use crate::core::errors::ApiError;

/// Extensions accepted for upload, with the leading dot, in display order.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".pdf", ".docx", ".html"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Html,
}

impl DocumentKind {
    /// Case-insensitive lookup on the final extension of `filename`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "html" => Some(DocumentKind::Html),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => ".pdf",
            DocumentKind::Docx => ".docx",
            DocumentKind::Html => ".html",
        }
    }
}

/// Reads `path` and extracts its text. Blocking; run it off the async executor.
pub fn load_text(path: &Path) -> Result<String, ApiError> {
    let name = path.to_string_lossy();
    let kind = DocumentKind::from_filename(&name).ok_or_else(|| {
        ApiError::Validation(format!(
            "Unsupported file type. Allowed types are: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;

    let data = std::fs::read(path)
        .map_err(|e| ApiError::internal(format!("Failed to read {}: {}", name, e)))?;

    extract_text(kind, &data)
}

pub fn extract_text(kind: DocumentKind, data: &[u8]) -> Result<String, ApiError> {
    match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(data)
            .map_err(|e| ApiError::Indexing(format!("PDF parse error: {}", e))),
        DocumentKind::Docx => extract_docx(data),
        DocumentKind::Html => Ok(extract_html(&String::from_utf8_lossy(data))),
    }
}

fn extract_docx(data: &[u8]) -> Result<String, ApiError> {
    let doc = docx_rs::read_docx(data)
        .map_err(|e| ApiError::Indexing(format!("DOCX parse error: {}", e)))?;

    let mut content = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            content.push_str(&t.text);
                        }
                    }
                }
            }
            content.push('\n');
        }
    }

    Ok(content)
}

fn extract_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name()))
            .map(|name| matches!(name, "script" | "style" | "noscript" | "head" | "title"))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    lines.join("\n")
}
