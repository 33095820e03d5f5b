use serde::Serialize;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::config::IngestConfig;
use crate::error::StreamError;
use crate::model::record::Record;
use crate::pipeline::decoder::DecodeReport;
use crate::pipeline::decoder::DecoderConfig;
use crate::pipeline::decoder::RecordDecoder;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub decoded: usize,
    pub skipped: usize,
    pub processed_bytes: u64,
}

/// Events emitted while a byte source is consumed. `Complete` and `Error` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    Progress {
        processed_bytes: u64,
        total_bytes: Option<u64>,
    },
    // A full batch; the receiver owns concatenating batches
    Data {
        records: Vec<Record>,
    },
    // Only the final partial batch travels here
    Complete {
        records: Vec<Record>,
        summary: IngestSummary,
    },
    Error {
        error: String,
    },
}

impl IngestEvent {
    pub fn is_terminal(&self) -> bool { matches!(self, IngestEvent::Complete { .. } | IngestEvent::Error { .. }) }
}

/// Reads a byte source incrementally and hands line-complete chunks to a [`RecordDecoder`].
#[derive(Debug, Clone)]
pub struct ChunkedIngestor {
    config: IngestConfig,
    decoder_config: DecoderConfig,
}

struct ChunkState {
    decoder: RecordDecoder,
    batch: Vec<Record>,
    report: DecodeReport,
    processed_bytes: u64,
    total_bytes: Option<u64>,
}

impl ChunkedIngestor {
    pub fn new(
        config: IngestConfig,
        decoder_config: DecoderConfig,
    ) -> Self {
        Self { config, decoder_config }
    }

    pub fn with_chunk_threshold(
        mut self,
        chunk_threshold: usize,
    ) -> Self {
        self.config.chunk_threshold = chunk_threshold;
        self
    }

    /// Runs the ingestor on its own task; events arrive on the returned bounded channel.
    pub fn spawn<R>(
        self,
        source: R,
        total_bytes: Option<u64>,
        cancellation_token: CancellationToken,
    ) -> (mpsc::Receiver<IngestEvent>, JoinHandle<Result<IngestSummary, StreamError>>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(self.config.channel_capacity.max(1));
        let handle = tokio::spawn(async move { self.run(source, total_bytes, sender, cancellation_token).await });
        (receiver, handle)
    }

    /// Consumes `source` to exhaustion. Sends exactly one terminal event unless cancelled
    /// or the receiver goes away.
    pub async fn run<R>(
        &self,
        mut source: R,
        total_bytes: Option<u64>,
        events: mpsc::Sender<IngestEvent>,
        cancellation_token: CancellationToken,
    ) -> Result<IngestSummary, StreamError>
    where
        R: AsyncRead + Unpin,
    {
        let mut state = ChunkState {
            decoder: RecordDecoder::new(self.decoder_config.clone()),
            batch: Vec::new(),
            report: DecodeReport::default(),
            processed_bytes: 0,
            total_bytes,
        };
        let mut carry: Vec<u8> = Vec::new();
        let mut buffer = vec![0u8; self.config.read_buffer_size.max(1)];

        loop {
            let read = tokio::select! {
                _ = cancellation_token.cancelled() => {
                    debug!("ingest::cancelled::processed_bytes::{}", state.processed_bytes);
                    return Err(StreamError::Cancelled);
                },
                read = source.read(&mut buffer) => read,
            };

            let n = match read {
                Ok(n) => n,
                Err(source) => {
                    let err = StreamError::ReadError {
                        processed_bytes: state.processed_bytes,
                        source,
                    };
                    error!("ingest::read_failed::error::{}", err);
                    let _ = events.send(IngestEvent::Error { error: err.to_string() }).await;
                    return Err(err);
                },
            };
            if n == 0 {
                break;
            }

            state.processed_bytes += n as u64;
            carry.extend_from_slice(&buffer[..n]);

            if carry.len() > self.config.chunk_threshold {
                // Only complete lines are decoded; the tail waits for the next read
                if let Some(last_newline) = carry.iter().rposition(|b| *b == b'\n') {
                    let remainder = carry.split_off(last_newline + 1);
                    let processable = std::mem::replace(&mut carry, remainder);
                    self.submit(&mut state, &processable, &events).await?;
                }
            }
        }

        if !carry.is_empty() {
            self.submit(&mut state, &carry, &events).await?;
        }

        let summary = IngestSummary {
            decoded: state.report.decoded,
            skipped: state.report.skipped,
            processed_bytes: state.processed_bytes,
        };
        info!(
            "ingest::complete::decoded::{}::skipped::{}::bytes::{}",
            summary.decoded, summary.skipped, summary.processed_bytes
        );

        events
            .send(IngestEvent::Complete {
                records: std::mem::take(&mut state.batch),
                summary,
            })
            .await
            .map_err(|_| StreamError::Cancelled)?;

        Ok(summary)
    }

    async fn submit(
        &self,
        state: &mut ChunkState,
        chunk: &[u8],
        events: &mpsc::Sender<IngestEvent>,
    ) -> Result<(), StreamError> {
        // Splits happen on b'\n', so a chunk never cuts a multi-byte character
        let text = String::from_utf8_lossy(chunk);
        let report = state.decoder.decode_chunk(&text, &mut state.batch);
        state.report.merge(report);
        debug!(
            "ingest::chunk_decoded::bytes::{}::rows::{}::skipped::{}",
            chunk.len(),
            report.decoded,
            report.skipped
        );

        send(events, IngestEvent::Progress {
            processed_bytes: state.processed_bytes,
            total_bytes: state.total_bytes,
        })
        .await?;

        if state.batch.len() >= self.config.batch_size {
            let records = std::mem::take(&mut state.batch);
            debug!("ingest::batch_emitted::records::{}", records.len());
            send(events, IngestEvent::Data { records }).await?;
        }
        Ok(())
    }
}

async fn send(
    events: &mpsc::Sender<IngestEvent>,
    event: IngestEvent,
) -> Result<(), StreamError> {
    // A dropped receiver means nobody wants the rest of the stream
    events.send(event).await.map_err(|_| StreamError::Cancelled)
}
