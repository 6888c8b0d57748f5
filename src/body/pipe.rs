use std::fmt;
use std::io::{self, BufWriter, Write};
use std::mem;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use bytes::{Buf, Bytes};

use crate::error::{BoxError, EncodeError};
use crate::format::Format;

const CHUNK_SIZE: usize = 8 * 1024;
const PIPE_CAPACITY: usize = 4;

type Producer = Box<dyn FnOnce(&mut dyn Write) -> Result<(), BoxError> + Send>;

/// Holds the error of a failed encoder until dispatch collects it.
#[derive(Clone, Debug, Default)]
pub(crate) struct EncodeSlot(Arc<Mutex<Option<EncodeError>>>);

impl EncodeSlot {
    fn store(&self, error: EncodeError) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub(crate) fn take(&self) -> Option<EncodeError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

enum Chunk {
    Data(Vec<u8>),
    End,
    Failed(EncodeError),
}

enum Failure {
    Encode(EncodeError),
    Stopped(String),
}

impl Failure {
    /// Read error for the failed stream; an encode failure is its inner error.
    fn to_io_error(&self) -> io::Error {
        match self {
            Failure::Encode(error) => io::Error::other(error.clone()),
            Failure::Stopped(message) => io::Error::other(message.clone()),
        }
    }
}

enum State {
    Idle(Producer),
    Streaming {
        rx: Receiver<Chunk>,
        current: Bytes,
        worker: JoinHandle<()>,
    },
    Done,
    Failed(Failure),
}

/// Read end of the encoder pipe.
///
/// The encoder thread is spawned on the first read and joined when the
/// stream ends or the reader is dropped. Dropping the reader closes the pipe,
/// so a blocked encoder fails its next write and exits.
pub(crate) struct EncodedReader {
    format: Format,
    slot: EncodeSlot,
    state: State,
}

impl EncodedReader {
    pub(crate) fn new<F>(format: Format, slot: EncodeSlot, producer: F) -> Self
    where
        F: FnOnce(&mut dyn Write) -> Result<(), BoxError> + Send + 'static,
    {
        EncodedReader {
            format,
            slot,
            state: State::Idle(Box::new(producer)),
        }
    }

    fn start(&mut self) {
        let State::Idle(producer) = mem::replace(&mut self.state, State::Done) else {
            return;
        };
        let (tx, rx) = mpsc::sync_channel(PIPE_CAPACITY);
        let format = self.format;
        let slot = self.slot.clone();

        let spawned = thread::Builder::new()
            .name("fluent-request-encoder".to_string())
            .spawn(move || encode(format, slot, producer, tx));

        self.state = match spawned {
            Ok(worker) => State::Streaming {
                rx,
                current: Bytes::new(),
                worker,
            },
            Err(e) => State::Failed(Failure::Stopped(format!(
                "failed to start {format} encoder: {e}"
            ))),
        };
    }

    fn finish(&mut self, next: State) {
        if let State::Streaming { rx, worker, .. } = mem::replace(&mut self.state, next) {
            drop(rx);
            if worker.join().is_err() {
                tracing::warn!(target: "fluent_request::body", "{} encoder panicked", self.format);
            }
        }
    }
}

impl io::Read for EncodedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let chunk = match &mut self.state {
                State::Idle(_) => {
                    self.start();
                    continue;
                }
                State::Streaming { rx, current, .. } => {
                    if !current.is_empty() {
                        let n = buf.len().min(current.len());
                        buf[..n].copy_from_slice(&current[..n]);
                        current.advance(n);
                        return Ok(n);
                    }
                    rx.recv()
                }
                State::Done => return Ok(0),
                State::Failed(failure) => return Err(failure.to_io_error()),
            };

            match chunk {
                Ok(Chunk::Data(data)) => {
                    if let State::Streaming { current, .. } = &mut self.state {
                        *current = Bytes::from(data);
                    }
                }
                Ok(Chunk::End) => self.finish(State::Done),
                Ok(Chunk::Failed(error)) => self.finish(State::Failed(Failure::Encode(error))),
                Err(_) => self.finish(State::Failed(Failure::Stopped(format!(
                    "{} encoder stopped before finishing",
                    self.format
                )))),
            }
        }
    }
}

impl Drop for EncodedReader {
    fn drop(&mut self) {
        self.finish(State::Done);
    }
}

impl fmt::Debug for EncodedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Idle(_) => "idle",
            State::Streaming { .. } => "streaming",
            State::Done => "done",
            State::Failed(_) => "failed",
        };
        f.debug_struct("EncodedReader")
            .field("format", &self.format)
            .field("state", &state)
            .finish()
    }
}

fn encode(format: Format, slot: EncodeSlot, producer: Producer, tx: SyncSender<Chunk>) {
    let mut writer = BufWriter::with_capacity(
        CHUNK_SIZE,
        ChannelWriter {
            tx: tx.clone(),
            closed: false,
        },
    );
    let result = producer(&mut writer).and_then(|()| writer.flush().map_err(Into::into));
    let (sink, _) = writer.into_parts();

    match result {
        Ok(()) => {
            let _ = tx.send(Chunk::End);
        }
        Err(_) if sink.closed => {
            tracing::trace!(target: "fluent_request::body", "{} body reader went away", format);
        }
        Err(source) => {
            let error = EncodeError::new(format, source);
            tracing::warn!(target: "fluent_request::body", "{}", error);
            slot.store(error.clone());
            let _ = tx.send(Chunk::Failed(error));
        }
    }
}

struct ChannelWriter {
    tx: SyncSender<Chunk>,
    closed: bool,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.tx.send(Chunk::Data(buf.to_vec())).is_err() {
            self.closed = true;
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
