//! File tools - Save, read, and list files under the output directory

use super::str_arg;
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolCategory, ToolDefinition};
use crate::schema::{ParamSpec, ParamType};
use serde_json::{json, Map, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Base directory every file capability is confined to
#[derive(Debug, Clone)]
pub struct OutputDir {
    base: PathBuf,
}

impl OutputDir {
    /// Create a new output directory handle (the directory is created lazily)
    #[must_use]
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    /// Base path
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a caller-supplied relative path inside the base directory.
    ///
    /// Absolute paths and `..` components are rejected.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);

        if path.is_absolute() || relative.starts_with('/') || relative.starts_with('\\') {
            warn!(path = %relative, "Absolute path rejected");
            return Err(Error::PermissionDenied(format!(
                "Access to '{}' is restricted: paths must be relative",
                relative
            )));
        }

        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    warn!(path = %relative, "Path traversal attempt detected");
                    return Err(Error::PermissionDenied(
                        "Path traversal (..) is not allowed".to_string(),
                    ));
                }
            }
        }

        Ok(self.base.join(path))
    }
}

// ============================================================================
// Save File Tool
// ============================================================================

/// Tool for writing a file
pub struct SaveFileTool {
    definition: ToolDefinition,
    output: Arc<OutputDir>,
}

impl SaveFileTool {
    /// Create a new save tool
    #[must_use]
    pub fn new(output: Arc<OutputDir>) -> Self {
        let definition = ToolDefinition::new("save_file", "Save content to a file")
            .with_category(ToolCategory::File)
            .with_param(ParamSpec::required(
                "filename",
                ParamType::String,
                "Name or relative path of the file",
            ))
            .with_param(ParamSpec::required(
                "content",
                ParamType::String,
                "Content to save",
            ));

        Self { definition, output }
    }
}

#[async_trait::async_trait]
impl Tool for SaveFileTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value> {
        let filename = str_arg(&arguments, "filename")?;
        let content = str_arg(&arguments, "content")?;
        let path = self.output.resolve(filename)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        debug!(path = %path.display(), bytes = content.len(), "File saved");

        Ok(json!({
            "status": "success",
            "path": path.display().to_string(),
            "message": format!("Saved to {}", path.display()),
        }))
    }
}

// ============================================================================
// Read File Tool
// ============================================================================

/// Tool for reading a file
pub struct ReadFileTool {
    definition: ToolDefinition,
    output: Arc<OutputDir>,
}

impl ReadFileTool {
    /// Create a new read tool
    #[must_use]
    pub fn new(output: Arc<OutputDir>) -> Self {
        let definition = ToolDefinition::new("read_file", "Read content from a file")
            .with_category(ToolCategory::File)
            .with_param(ParamSpec::required(
                "filename",
                ParamType::String,
                "Name or relative path of the file",
            ));

        Self { definition, output }
    }
}

#[async_trait::async_trait]
impl Tool for ReadFileTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value> {
        let filename = str_arg(&arguments, "filename")?;
        let path = self.output.resolve(filename)?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::NotFound(format!("File not found: {}", filename)));
        }

        let content = tokio::fs::read_to_string(&path).await?;

        Ok(json!({
            "status": "success",
            "message": format!("Read {} characters from {}", content.chars().count(), filename),
            "content": content,
        }))
    }
}

// ============================================================================
// List Files Tool
// ============================================================================

/// Tool for listing a directory
pub struct ListFilesTool {
    definition: ToolDefinition,
    output: Arc<OutputDir>,
}

impl ListFilesTool {
    /// Create a new list tool
    #[must_use]
    pub fn new(output: Arc<OutputDir>) -> Self {
        let definition = ToolDefinition::new("list_files", "List files in a directory")
            .with_category(ToolCategory::File)
            .with_param(ParamSpec::optional(
                "directory",
                ParamType::String,
                "Directory relative to the output directory",
                json!("."),
            ));

        Self { definition, output }
    }
}

#[async_trait::async_trait]
impl Tool for ListFilesTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value> {
        let directory = arguments
            .get("directory")
            .and_then(Value::as_str)
            .unwrap_or(".");
        let path = self.output.resolve(directory)?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::NotFound(format!("Directory not found: {}", directory)));
        }

        let mut entries = tokio::fs::read_dir(&path).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            files.push(json!({
                "name": entry.file_name().to_string_lossy(),
                "type": if metadata.is_dir() { "directory" } else { "file" },
                "size": if metadata.is_file() { Some(metadata.len()) } else { None },
            }));
        }
        files.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

        Ok(json!({
            "status": "success",
            "message": format!("Found {} items", files.len()),
            "files": files,
        }))
    }
}
