use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgencyError;

/// HTML to PDF conversion engine.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, AgencyError>;
}

/// Runs `wkhtmltopdf - -`: HTML on stdin, PDF on stdout.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    program: String,
    timeout: Duration,
}

impl WkhtmltopdfRenderer {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PdfRenderer for WkhtmltopdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, AgencyError> {
        let mut child = Command::new(&self.program)
            .args(["--quiet", "--encoding", "utf-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgencyError::PdfEngine(format!("failed to start {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgencyError::PdfEngine("engine stdin unavailable".to_string()))?;
        let input = html.as_bytes().to_vec();
        // stdout must be drained while stdin is written, or large documents deadlock
        let writer = tokio::spawn(async move {
            let res = stdin.write_all(&input).await;
            drop(stdin);
            res
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AgencyError::PdfEngine(format!("engine timed out after {:?}", self.timeout))
            })?
            .map_err(|e| AgencyError::PdfEngine(format!("engine wait failed: {e}")))?;

        if let Err(e) = writer.await? {
            warn!(error = %e, "failed to stream HTML to PDF engine");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgencyError::PdfEngine(format!(
                "engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(AgencyError::PdfEngine("engine produced no output".to_string()));
        }

        debug!(bytes = output.stdout.len(), "PDF rendered");
        Ok(output.stdout)
    }
}
