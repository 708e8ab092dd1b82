//! Clipboard output
//!
//! The builder only ever writes to the clipboard, so the seam is a single
//! write method. The system implementation wraps `arboard`.

use arboard::Clipboard;
use tracing::debug;

use crate::error::{FormError, Result};

/// Write-only clipboard
pub trait ClipboardSink {
    /// Replace the clipboard contents with `text`
    ///
    /// # Errors
    /// Returns [`FormError::Clipboard`] if the write fails
    fn set_text(&mut self, text: &str) -> Result<()>;

    /// Write `text` for a process that is about to exit
    ///
    /// Sinks whose contents vanish with their owner keep serving the text
    /// until another application takes the clipboard over.
    ///
    /// # Errors
    /// Returns [`FormError::Clipboard`] if the write fails
    fn set_text_and_wait(&mut self, text: &str) -> Result<()> {
        self.set_text(text)
    }
}

/// System clipboard, opened on first write
///
/// The handle is kept for the lifetime of the sink: on X11 the copied text
/// is only served while the owning handle exists.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl SystemClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut Clipboard> {
        match self.inner {
            Some(ref mut clipboard) => Ok(clipboard),
            None => {
                let clipboard =
                    Clipboard::new().map_err(|e| FormError::Clipboard(e.to_string()))?;
                debug!("Opened system clipboard");
                Ok(self.inner.insert(clipboard))
            }
        }
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.handle()?
            .set_text(text.to_string())
            .map_err(|e| FormError::Clipboard(e.to_string()))
    }

    // X11 and Wayland serve the selection from the owning process, so a
    // one-shot copy blocks until another client takes ownership.
    fn set_text_and_wait(&mut self, text: &str) -> Result<()> {
        let clipboard = self.handle()?;

        #[cfg(target_os = "linux")]
        let result = {
            use arboard::SetExtLinux;
            debug!("Serving clipboard until another application replaces it");
            clipboard.set().wait().text(text.to_string())
        };
        #[cfg(not(target_os = "linux"))]
        let result = clipboard.set_text(text.to_string());

        result.map_err(|e| FormError::Clipboard(e.to_string()))
    }
}

/// In-memory clipboard for tests and headless runs
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
    writes: usize,
    held: bool,
    failure: Option<String>,
}

impl MemoryClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose writes always fail with `reason`
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Number of successful writes
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// True if the last write was made with [`ClipboardSink::set_text_and_wait`]
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if let Some(reason) = &self.failure {
            return Err(FormError::Clipboard(reason.clone()));
        }
        self.contents = Some(text.to_string());
        self.writes += 1;
        self.held = false;
        Ok(())
    }

    fn set_text_and_wait(&mut self, text: &str) -> Result<()> {
        self.set_text(text)?;
        self.held = true;
        Ok(())
    }
}
