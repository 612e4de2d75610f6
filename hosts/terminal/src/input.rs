use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use fixit_atoms::media::{LocalImage, MediaError, MediaPicker};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Line reader over stdin, shared by the command loop and the picker.
#[derive(Clone)]
pub struct Input {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Input {
    pub fn stdin() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Print `prompt` and read one line. `None` at end of input.
    pub async fn prompt(&self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        self.lines.lock().await.next_line().await
    }
}

/// Picks images by asking for a local file path.
pub struct TerminalPicker {
    input: Input,
}

impl TerminalPicker {
    pub fn new(input: Input) -> Self {
        Self { input }
    }
}

#[async_trait]
impl MediaPicker for TerminalPicker {
    async fn pick_image(&self) -> Result<Option<LocalImage>, MediaError> {
        let line = self
            .input
            .prompt("Image path (blank to cancel): ")
            .await
            .map_err(|e| MediaError::Picker(e.to_string()))?;

        let path = match line.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(path) => path.to_string(),
        };

        if !Path::new(&path).is_file() {
            return Err(MediaError::Unreadable {
                uri: path,
                message: "no such file".to_string(),
            });
        }
        Ok(Some(LocalImage::new(format!("file://{}", path))))
    }
}
