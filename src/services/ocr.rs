use std::sync::Arc;

use futures::future::BoxFuture;

use super::ServiceError;

/// Where a submitted recognition job's results can be fetched later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLocation(pub String);

/// The wire shape of the text recognition service: submit the bitmap, then
/// poll the returned location until results appear.
///
/// The fixed delay between submit and poll belongs to the transport, which
/// knows its service's latency; [`TextRecognizer`] only bounds the number of
/// polls.
pub trait OcrTransport: Send + Sync {
    /// Submits bitmap bytes for analysis.
    fn submit(&self, png: Vec<u8>) -> BoxFuture<'static, Result<OperationLocation, ServiceError>>;

    /// Polls for results; `Ok(None)` means not ready yet.
    fn poll(
        &self,
        location: &OperationLocation,
    ) -> BoxFuture<'static, Result<Option<Vec<String>>, ServiceError>>;
}

pub const DEFAULT_MAX_POLLS: u32 = 3;

/// Recognizes handwritten text in a bitmap via the polling handoff.
pub struct TextRecognizer {
    transport: Arc<dyn OcrTransport>,
    max_polls: u32,
}

impl TextRecognizer {
    pub fn new(transport: Arc<dyn OcrTransport>) -> Self {
        Self {
            transport,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Returns the recognized lines joined with `.`, or an empty string when
    /// the service found no text (or never became ready).
    pub async fn recognize(&self, png: Vec<u8>) -> Result<String, ServiceError> {
        let location = self.transport.submit(png).await?;
        for attempt in 0..self.max_polls {
            if let Some(lines) = self.transport.poll(&location).await? {
                let text: Vec<String> = lines.into_iter().filter(|line| !line.is_empty()).collect();
                return Ok(text.join("."));
            }
            log::debug!("text recognition not ready yet (attempt {attempt})");
        }
        Ok(String::new())
    }
}
