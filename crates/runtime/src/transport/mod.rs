//! Length-prefixed JSON framing over the driver's stdio pipes.
//!
//! Every message is a 4-byte little-endian length followed by that many bytes
//! of UTF-8 JSON. The framing matches what the driver's `run-driver` mode
//! speaks on stdin/stdout.
//!
//! [`PipeTransport`] owns both pipe halves. [`PipeTransport::into_parts`]
//! splits it into an outgoing [`PipeSender`] and an incoming [`PipeReceiver`]
//! so the connection can run them on separate tasks.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Error, Result};

#[cfg(test)]
mod tests;

/// Outgoing half of a transport.
///
/// Boxed-future form so the connection can hold the sender as a trait object.
pub trait Transport: Send {
	/// Frames and writes one message.
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Incoming half of a transport.
pub trait TransportReceiver: Send {
	/// Reads frames until EOF, transport failure, or the message channel closes.
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Transport halves handed to the connection.
pub struct TransportParts {
	/// Writes outgoing messages.
	pub sender: Box<dyn Transport>,
	/// Read loop to spawn.
	pub receiver: Box<dyn TransportReceiver>,
	/// Receives every message the read loop produces.
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Transport over a spawned driver's stdin/stdout pipes.
pub struct PipeTransport {
	sender: PipeSender,
	receiver: PipeReceiver,
}

impl PipeTransport {
	/// Creates a transport writing to `stdin` and reading from `stdout`.
	///
	/// The returned receiver yields each incoming message once
	/// [`PipeTransport::run`] (or the split receiver's run loop) is driven.
	pub fn new(
		stdin: impl AsyncWrite + Unpin + Send + 'static,
		stdout: impl AsyncRead + Unpin + Send + 'static,
	) -> (Self, mpsc::UnboundedReceiver<Value>) {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let transport = Self {
			sender: PipeSender {
				writer: Box::new(stdin),
			},
			receiver: PipeReceiver {
				reader: Box::new(stdout),
				message_tx,
			},
		};
		(transport, message_rx)
	}

	/// Runs the read loop on this transport's incoming half.
	pub async fn run(&mut self) -> Result<()> {
		self.receiver.read_loop().await
	}

	/// Splits into concrete sender and receiver halves.
	pub fn into_parts(self) -> (PipeSender, PipeReceiver) {
		(self.sender, self.receiver)
	}

	/// Boxes the halves together with the message channel for the connection.
	pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
		let (sender, receiver) = self.into_parts();
		TransportParts {
			sender: Box::new(sender),
			receiver: Box::new(receiver),
			message_rx,
		}
	}
}

/// Writes framed messages to the driver's stdin.
pub struct PipeSender {
	writer: Box<dyn AsyncWrite + Unpin + Send>,
}

impl PipeSender {
	/// Frames and writes one message, then flushes.
	pub async fn send(&mut self, message: Value) -> Result<()> {
		let payload = serde_json::to_vec(&message)?;
		let length = u32::try_from(payload.len())
			.map_err(|_| Error::TransportError("message exceeds u32 length prefix".to_string()))?;

		trace!(bytes = payload.len(), "transport send");

		self.writer
			.write_all(&length.to_le_bytes())
			.await
			.map_err(|e| Error::TransportError(format!("Failed to write length prefix: {e}")))?;
		self.writer
			.write_all(&payload)
			.await
			.map_err(|e| Error::TransportError(format!("Failed to write message body: {e}")))?;
		self.writer
			.flush()
			.await
			.map_err(|e| Error::TransportError(format!("Failed to flush transport: {e}")))?;
		Ok(())
	}
}

impl Transport for PipeSender {
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(self.send(message))
	}
}

/// Reads framed messages from the driver's stdout.
pub struct PipeReceiver {
	reader: Box<dyn AsyncRead + Unpin + Send>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl PipeReceiver {
	/// Reads frames until the pipe closes or the message channel is dropped.
	///
	/// `read_exact` loops internally, so bodies larger than the pipe buffer
	/// (traces and screenshots routinely exceed 32KB) arrive intact.
	pub async fn read_loop(&mut self) -> Result<()> {
		loop {
			let mut length_buf = [0u8; 4];
			self.reader
				.read_exact(&mut length_buf)
				.await
				.map_err(|e| Error::TransportError(format!("Failed to read length prefix: {e}")))?;
			let length = u32::from_le_bytes(length_buf) as usize;

			let mut payload = vec![0u8; length];
			self.reader
				.read_exact(&mut payload)
				.await
				.map_err(|e| Error::TransportError(format!("Failed to read message body: {e}")))?;

			let message: Value = serde_json::from_slice(&payload)
				.map_err(|e| Error::TransportError(format!("Failed to parse message: {e}")))?;

			trace!(bytes = length, "transport recv");

			if self.message_tx.send(message).is_err() {
				// Receiver dropped, the connection is shutting down.
				return Ok(());
			}
		}
	}
}

impl TransportReceiver for PipeReceiver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move { self.read_loop().await })
	}
}
