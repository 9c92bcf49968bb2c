use crate::error::FileOpenError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;

/// Opens a source location in an editor.
#[async_trait]
pub trait FileOpener: Send + Sync {
    async fn open(&self, path: &str, line: u32) -> Result<(), FileOpenError>;
}

/// Launches an editor from a command template such as
/// `code --goto {path}:{line}`.
#[derive(Debug, Clone)]
pub struct EditorCommandOpener {
    template: String,
}

impl EditorCommandOpener {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

#[async_trait]
impl FileOpener for EditorCommandOpener {
    async fn open(&self, path: &str, line: u32) -> Result<(), FileOpenError> {
        ensure_exists(path)?;

        let argv = expand_editor_command(&self.template, path, line);
        let (program, args) = argv.split_first().ok_or(FileOpenError::EmptyCommand)?;

        tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FileOpenError::Launch(format!("{program}: {e}")))?;

        log::info!("Opened {path}:{line} with {program}");
        Ok(())
    }
}

pub fn ensure_exists(path: &str) -> Result<(), FileOpenError> {
    if Path::new(path).exists() {
        Ok(())
    } else {
        Err(FileOpenError::NotFound(path.to_string()))
    }
}

/// Split the template on whitespace and fill in `{path}` and `{line}`.
pub fn expand_editor_command(template: &str, path: &str, line: u32) -> Vec<String> {
    template
        .split_whitespace()
        .map(|part| {
            part.replace("{path}", path)
                .replace("{line}", &line.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_placeholders() {
        assert_eq!(
            expand_editor_command("code --goto {path}:{line}", "/src/a.e", 42),
            vec!["code", "--goto", "/src/a.e:42"]
        );
        assert!(expand_editor_command("   ", "/a", 1).is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let opener = EditorCommandOpener::new("true {path}");
        let err = opener.open("/definitely/not/here.e", 1).await.unwrap_err();
        assert!(matches!(err, FileOpenError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_template_and_bad_program_fail() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_string_lossy().to_string();

        let err = EditorCommandOpener::new("").open(&path, 1).await.unwrap_err();
        assert!(matches!(err, FileOpenError::EmptyCommand));

        let err = EditorCommandOpener::new("contractlens-no-such-editor {path}")
            .open(&path, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FileOpenError::Launch(_)));
    }
}
