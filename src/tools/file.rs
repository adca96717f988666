use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{Arguments, ParamKind, ReturnKind, Tool, ToolDescriptor};

/// Create an empty file at `path` unless something already exists there.
///
/// Never truncates: an existing file keeps its content.
pub async fn ensure_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(_) => {
            debug!(path = %path.display(), "created file");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to create file: {}", path.display())),
    }
}

/// Create a directory and any missing parents unless the path already exists.
pub async fn ensure_folder(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("failed to check path: {}", path.display()))?
    {
        return Ok(());
    }

    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("failed to create directory: {}", path.display()))?;
    debug!(path = %path.display(), "created directory");
    Ok(())
}

/// Overwrite the file at `path` with `content`, creating it and its parents if needed.
pub async fn write_text(content: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
    }

    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

/// Tool for creating a file if it does not exist
pub struct CreateFileTool {
    descriptor: ToolDescriptor,
}

impl CreateFileTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                "create_file_if_not_exists",
                "Create an empty file if nothing exists at the path yet. \
                 An existing file is left untouched.",
            )
            .param("path", ParamKind::String, "Path to file")
            .returns(ReturnKind::Nothing, ""),
        }
    }
}

impl Default for CreateFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CreateFileTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        ensure_file(args.str("path")?).await?;
        Ok(Value::Null)
    }
}

/// Tool for creating a folder if it does not exist
pub struct CreateFolderTool {
    descriptor: ToolDescriptor,
}

impl CreateFolderTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                "create_folder_if_not_exists",
                "Create a folder, including missing parent folders, if it does not exist yet.",
            )
            .param("path", ParamKind::String, "Path to folder")
            .returns(ReturnKind::Nothing, ""),
        }
    }
}

impl Default for CreateFolderTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CreateFolderTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        ensure_folder(args.str("path")?).await?;
        Ok(Value::Null)
    }
}

/// Tool for writing findings to a text file
pub struct WriteFindingsTool {
    descriptor: ToolDescriptor,
}

impl WriteFindingsTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                "write_findings_to_text_file",
                "Write findings to a text file. Overwrites the file if it exists \
                 and creates it (and its parent folders) otherwise.",
            )
            .param("findings", ParamKind::String, "Findings")
            .param("path", ParamKind::String, "Path to save findings")
            .returns(ReturnKind::Nothing, ""),
        }
    }
}

impl Default for WriteFindingsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WriteFindingsTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &Arguments) -> Result<Value> {
        let findings = args.str("findings")?;
        let path = args.str("path")?;
        write_text(findings, path).await?;
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ensure_file_creates_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");

        ensure_file(&path).await.unwrap();
        assert!(path.is_file());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        ensure_file(&path).await.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn ensure_file_does_not_truncate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.txt");
        fs::write(&path, "keep me").unwrap();

        ensure_file(&path).await.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn ensure_file_fails_when_parent_is_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("file.txt");
        let err = ensure_file(&path).await.unwrap_err();
        assert!(err.to_string().contains("failed to create file"));
    }

    #[tokio::test]
    async fn ensure_folder_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("c");

        ensure_folder(&path).await.unwrap();
        ensure_folder(&path).await.unwrap();
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn write_text_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("findings.txt");

        write_text("first draft that is long", &path).await.unwrap();
        write_text("final", &path).await.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "final");
    }

    #[tokio::test]
    async fn write_text_round_trips_exact_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");
        let content = "line one\n\n  indented\ttab\nunicode: é ✓\n";

        write_text(content, &path).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), content);
    }

    #[tokio::test]
    async fn write_findings_tool_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let tool = WriteFindingsTool::new();

        let result = tool
            .execute(&Arguments::from_json(json!({
                "findings": "17 is prime",
                "path": path.to_str().unwrap(),
            })))
            .await
            .unwrap();

        assert_eq!(result, Value::Null);
        assert_eq!(fs::read_to_string(&path).unwrap(), "17 is prime");
    }
}
