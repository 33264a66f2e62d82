use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{info, warn};

use common::{EngineEvent, Result};

use crate::EngineHandle;

/// Source of inbound events for the engine.
#[async_trait]
pub trait EventSource: Send {
    /// Next event, or `None` once the source is exhausted.
    async fn next_event(&mut self) -> Result<Option<EngineEvent>>;
}

/// Reads one JSON-encoded `EngineEvent` per line.
///
/// ```text
/// {"event":"market_data","instrument":"BTCUSDT","timestamp":"2024-01-01T00:00:00Z","bid_price":99.5,"ask_price":100.5,"last_price":100.0}
/// {"event":"fill","instrument":"BTCUSDT","side":"BUY","quantity":1.0,"price":100.0,"timestamp":"2024-01-01T00:00:01Z"}
/// {"event":"risk","risk_type":"LOSS_LIMIT","message":"daily loss limit hit"}
/// ```
pub struct JsonLinesFeed<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for JsonLinesFeed<R> {
    async fn next_event(&mut self) -> Result<Option<EngineEvent>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return match serde_json::from_str(line) {
                Ok(event) => Ok(Some(event)),
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "Malformed event line");
                    Err(e.into())
                }
            };
        }
        Ok(None)
    }
}

/// Forward every event from `source` into the engine. Returns the number of
/// events forwarded once the source is exhausted.
pub async fn pump<S: EventSource>(mut source: S, handle: EngineHandle) -> Result<usize> {
    let mut count = 0;
    while let Some(event) = source.next_event().await? {
        handle.send(event).await?;
        count += 1;
    }
    info!(events = count, "Event source exhausted");
    Ok(count)
}
