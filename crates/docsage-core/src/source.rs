//! Document source: turns files, directories and fetched bodies into `RawDocument`s.
//!
//! Extraction is best effort. Failures never escape as errors; they are recorded
//! in `RawDocument::status` and logged, and the pipeline treats such documents
//! as having no content.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::types::{keys, RawDocument};

/// Separator placed before code blocks pulled out of prose formats.
pub const CODE_EXAMPLES_MARKER: &str = "\n\nCode Examples:\n";

#[cfg(feature = "pdf")]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "markdown", "html", "htm", "pdf", "txt", "json", "yaml", "yml"];
#[cfg(not(feature = "pdf"))]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "markdown", "html", "htm", "txt", "json", "yaml", "yml"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(str::to_lowercase)
}

pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Load a single file. Missing files and extraction errors yield `DocStatus::Error`,
/// unknown extensions `DocStatus::UnsupportedFormat`.
pub fn load_file(path: &Path) -> RawDocument {
    let source = path.to_string_lossy().to_string();
    if !path.exists() {
        error!(%source, "file not found");
        return RawDocument::failed(source.clone(), format!("File not found: {source}"));
    }
    if !is_supported(path) {
        let ext = extension_of(path).map(|e| format!(".{e}")).unwrap_or_default();
        warn!(%source, extension = %ext, "unsupported file format");
        return RawDocument::unsupported(source, ext);
    }
    let ext = extension_of(path).unwrap_or_default();
    match extract_file(path, &ext) {
        Ok(content) => RawDocument::new(source, content).with_metadata(keys::INGESTED_AT, now_rfc3339()),
        Err(e) => {
            error!(%source, error = %e, "error processing file");
            RawDocument::failed(source, e.to_string())
        }
    }
}

/// Recursively load every supported file under `dir`, sorted by path. Documents
/// that end up without content are dropped.
pub fn load_directory(dir: &Path) -> Vec<RawDocument> {
    if !dir.is_dir() {
        error!(dir = %dir.display(), "directory not found or not a directory");
        return Vec::new();
    }
    let files = list_supported_files(dir);
    let docs: Vec<RawDocument> = files.iter().map(|p| load_file(p)).filter(|d| !d.content.is_empty()).collect();
    info!(dir = %dir.display(), files = files.len(), documents = docs.len(), "loaded directory");
    docs
}

pub fn list_supported_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Build a document from an already-fetched body (e.g. an HTTP response),
/// dispatching on the reported content type.
pub fn load_content(source: &str, body: &str, content_type: &str) -> RawDocument {
    let content_type = content_type.to_lowercase();
    let content = if content_type.contains("text/html") {
        html_to_text(body)
    } else if content_type.contains("application/json") {
        json_to_text(body)
    } else if content_type.contains("yaml") || content_type.contains("yml") {
        yaml_to_text(body)
    } else {
        body.to_string()
    };
    RawDocument::new(source, content)
        .with_metadata(keys::URL, source)
        .with_metadata(keys::CONTENT_TYPE, content_type)
        .with_metadata(keys::INGESTED_AT, now_rfc3339())
}

fn extract_file(path: &Path, ext: &str) -> Result<String> {
    match ext {
        "md" | "markdown" => Ok(markdown_to_text(&read_text(path)?)),
        "html" | "htm" => Ok(html_to_text(&read_text(path)?)),
        #[cfg(feature = "pdf")]
        "pdf" => pdf_extract::extract_text(path).map_err(|e| crate::error::Error::Source(format!("pdf {}: {}", path.display(), e))),
        "json" => Ok(json_to_text(&read_text(path)?)),
        "yaml" | "yml" => Ok(yaml_to_text(&read_text(path)?)),
        _ => read_text(path),
    }
}

fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

fn with_code_examples(mut text: String, code_blocks: &[String]) -> String {
    if !code_blocks.is_empty() {
        text.push_str(CODE_EXAMPLES_MARKER);
        text.push_str(&code_blocks.join("\n"));
    }
    text
}

/// Prose of a Markdown document with code (fenced, indented and inline) moved to the end.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut prose = String::new();
    let mut code_blocks = Vec::new();
    let mut current_block: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => current_block = Some(String::new()),
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = current_block.take() {
                    code_blocks.push(block);
                }
            }
            Event::Text(text) => match current_block.as_mut() {
                Some(block) => block.push_str(&text),
                None => prose.push_str(&text),
            },
            Event::Code(code) => code_blocks.push(code.to_string()),
            Event::SoftBreak | Event::HardBreak => prose.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => prose.push('\n'),
            _ => {}
        }
    }
    with_code_examples(prose, &code_blocks)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn texts_of(soup: &scrape_core::Soup, selector: &str) -> Vec<String> {
    match soup.find_all(selector) {
        Ok(tags) => tags.into_iter().map(|tag| tag.text()).collect(),
        Err(e) => {
            warn!(%selector, error = %e, "html selector failed");
            Vec::new()
        }
    }
}

/// Visible text of an HTML page (scripts and styles dropped, whitespace collapsed)
/// followed by its `<pre>`/`<code>` contents.
pub fn html_to_text(html: &str) -> String {
    let soup = scrape_core::Soup::parse(html);
    let mut body = texts_of(&soup, "body").join(" ");
    if body.trim().is_empty() {
        body = html.to_string();
    }
    for hidden in texts_of(&soup, "script").into_iter().chain(texts_of(&soup, "style")) {
        if !hidden.is_empty() {
            body = body.replace(&hidden, " ");
        }
    }
    let code_blocks: Vec<String> = texts_of(&soup, "pre, code").into_iter().filter(|c| !c.trim().is_empty()).collect();
    with_code_examples(collapse_whitespace(&body), &code_blocks)
}

fn is_api_spec(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.contains_key("openapi") || o.contains_key("swagger"))
}

/// Pretty JSON, or an endpoint summary when the document is an OpenAPI/Swagger spec.
pub fn json_to_text(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if is_api_spec(&value) => openapi_summary(&value),
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| raw.to_string()),
        Err(e) => {
            warn!(error = %e, "invalid json, keeping raw text");
            raw.to_string()
        }
    }
}

/// Normalized YAML, or an endpoint summary when the document is an OpenAPI/Swagger spec.
pub fn yaml_to_text(raw: &str) -> String {
    let parsed: serde_yaml::Value = match serde_yaml::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "invalid yaml, keeping raw text");
            return raw.to_string();
        }
    };
    if let Ok(json) = serde_json::to_value(&parsed) {
        if is_api_spec(&json) {
            return openapi_summary(&json);
        }
    }
    serde_yaml::to_string(&parsed).unwrap_or_else(|_| raw.to_string())
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Human-readable digest of an OpenAPI/Swagger document: info, servers, endpoints, models.
pub fn openapi_summary(spec: &Value) -> String {
    let mut out = Vec::new();
    let info = spec.get("info").cloned().unwrap_or(Value::Null);
    out.push(format!("API: {}", str_field(&info, "title").unwrap_or("Unknown API")));
    out.push(format!("Version: {}", str_field(&info, "version").unwrap_or("Unknown")));
    if let Some(description) = str_field(&info, "description") {
        out.push(format!("Description: {description}"));
    }

    if let Some(servers) = spec.get("servers").and_then(Value::as_array).filter(|s| !s.is_empty()) {
        out.push("\nServers:".to_string());
        for server in servers {
            out.push(format!("- {}", str_field(server, "url").unwrap_or("Unknown URL")));
        }
    }

    if let Some(paths) = spec.get("paths").and_then(Value::as_object).filter(|p| !p.is_empty()) {
        out.push("\nAPI Endpoints:".to_string());
        for (path, methods) in paths {
            out.push(format!("\nPath: {path}"));
            let Some(methods) = methods.as_object() else { continue };
            for (method, operation) in methods {
                if !operation.is_object() {
                    continue;
                }
                let method = method.to_uppercase();
                out.push(format!("  {}: {}", method, str_field(operation, "summary").unwrap_or(&method)));
                if let Some(description) = str_field(operation, "description") {
                    out.push(format!("    Description: {description}"));
                }
            }
        }
    }

    let schemas = spec.get("components").and_then(|c| c.get("schemas")).and_then(Value::as_object);
    if let Some(schemas) = schemas.filter(|s| !s.is_empty()) {
        out.push("\nData Models:".to_string());
        for (name, schema) in schemas {
            out.push(format!("- {name}"));
            if let Some(description) = str_field(schema, "description") {
                out.push(format!("  Description: {description}"));
            }
        }
    }
    out.join("\n")
}
