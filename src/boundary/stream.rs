use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::boundary::error::BoundaryError;

/// Generic JSONL stream parser
pub struct JsonlStreamParser;

impl JsonlStreamParser {
    /// Parse JSONL from a runtime's stdout and send each object to the channel.
    ///
    /// Lines that are not JSON are skipped: whatever the runtime prints
    /// outside the wire protocol is noise, not a failure.
    pub async fn parse_stream<R, T>(reader: R, tx: mpsc::Sender<T>) -> Result<(), BoundaryError>
    where
        R: AsyncRead + Unpin,
        T: for<'de> Deserialize<'de> + Send + 'static,
    {
        let reader = BufReader::new(reader);
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            tracing::trace!("JSONL raw line: {}", &line);

            match serde_json::from_str::<T>(&line) {
                Ok(message) => {
                    if tx.send(message).await.is_err() {
                        // Receiver dropped, boundary was replaced
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!("Skipping non-protocol line: {e}. Line: {line}");
                }
            }
        }

        Ok(())
    }
}
