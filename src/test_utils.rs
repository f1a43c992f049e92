//! Test utilities: frame byte builders and a scripted transport
//!
//! [`ScriptedTransport`] plays back one script per connect attempt, so
//! receiver tests can describe refused connects, short reads, mid-frame
//! closes and stalls without a socket. Pair it with
//! `#[tokio::test(start_paused = true)]` to make backoff and read timeouts
//! elapse instantly.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::codec::{HeaderShape, encode_header};
use crate::transport::{Connection, Transport};
use crate::types::{ByteOrder, FrameHeader};
use crate::{Result, StreamError};

/// Header for a packed depth frame (pixel stride 2) with explicit length.
pub fn depth_header(timestamp: i64, width: u32, height: u32) -> FrameHeader {
    FrameHeader {
        timestamp,
        image_width: width,
        image_height: height,
        pixel_stride: 2,
        payload_length: Some(width * height * 2),
        ..Default::default()
    }
}

/// Depth payload whose sample at `i` is `i`, little-endian.
pub fn depth_payload(width: u32, height: u32) -> Vec<u8> {
    (0..width * height).flat_map(|i| (i as u16).to_le_bytes()).collect()
}

/// Encoded header followed by `payload`.
pub fn frame_bytes(
    header: &FrameHeader,
    payload: &[u8],
    shape: &HeaderShape,
    order: ByteOrder,
) -> Vec<u8> {
    let mut bytes = encode_header(header, shape, order);
    bytes.extend_from_slice(payload);
    bytes
}

/// Minimal-shape little-endian depth frame.
pub fn depth_frame(timestamp: i64, width: u32, height: u32) -> Vec<u8> {
    frame_bytes(
        &depth_header(timestamp, width, height),
        &depth_payload(width, height),
        &HeaderShape::minimal(),
        ByteOrder::Little,
    )
}

/// One scripted event on a connection.
#[derive(Debug, Clone)]
pub enum Step {
    /// Bytes handed out over as many reads as the caller's buffer needs.
    Bytes(Vec<u8>),
    /// Bytes handed out at most `chunk` per read.
    Chunked(Vec<u8>, usize),
    /// Peer closes: reads return 0.
    Close,
    /// Read fails with this error kind.
    Fail(io::ErrorKind),
    /// Read never completes.
    Stall,
}

/// Outcome of one connect attempt.
#[derive(Debug, Clone)]
pub enum Attempt {
    Refuse,
    /// Connect never answers; the transport times out.
    Hang,
    Accept(Vec<Step>),
}

#[derive(Debug, Default)]
struct Script {
    attempts: VecDeque<Attempt>,
    connects: Vec<Instant>,
    closes: usize,
}

/// Transport that replays [`Attempt`]s in order, then refuses forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new(attempts: impl IntoIterator<Item = Attempt>) -> Self {
        let script = Script { attempts: attempts.into_iter().collect(), ..Default::default() };
        Self { script: Arc::new(Mutex::new(script)) }
    }

    /// Instants of every connect attempt so far.
    pub fn connect_times(&self) -> Vec<Instant> {
        self.lock().connects.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.lock().connects.len()
    }

    pub fn close_count(&self) -> usize {
        self.lock().closes
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>> {
        let attempt = {
            let mut script = self.lock();
            script.connects.push(Instant::now());
            script.attempts.pop_front().unwrap_or(Attempt::Refuse)
        };

        match attempt {
            Attempt::Refuse => Err(StreamError::connect_failed(
                host,
                port,
                io::ErrorKind::ConnectionRefused.into(),
            )),
            Attempt::Hang => {
                tokio::time::sleep(timeout).await;
                Err(StreamError::ConnectTimeout { host: host.to_string(), port, timeout })
            }
            Attempt::Accept(steps) => Ok(Box::new(ScriptedConnection {
                steps: steps.into(),
                script: self.script.clone(),
            })),
        }
    }
}

struct ScriptedConnection {
    steps: VecDeque<Step>,
    script: Arc<Mutex<Script>>,
}

#[async_trait::async_trait]
impl Connection for ScriptedConnection {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let Some(step) = self.steps.front_mut() else {
                return Ok(0);
            };

            match step {
                Step::Bytes(bytes) | Step::Chunked(bytes, _) if bytes.is_empty() => {
                    self.steps.pop_front();
                }
                Step::Bytes(bytes) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    bytes.drain(..n);
                    return Ok(n);
                }
                Step::Chunked(bytes, chunk) => {
                    let n = bytes.len().min(buf.len()).min((*chunk).max(1));
                    buf[..n].copy_from_slice(&bytes[..n]);
                    bytes.drain(..n);
                    return Ok(n);
                }
                Step::Close => return Ok(0),
                Step::Fail(kind) => {
                    let kind = *kind;
                    self.steps.pop_front();
                    return Err(kind.into());
                }
                Step::Stall => std::future::pending::<()>().await,
            }
        }
    }

    async fn close(&mut self) {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).closes += 1;
    }
}
