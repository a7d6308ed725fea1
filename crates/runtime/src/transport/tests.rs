use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::*;

#[test]
fn test_length_prefix_is_little_endian() {
	let length: u32 = 1234;
	let bytes = length.to_le_bytes();

	assert_eq!(bytes[0], (length & 0xFF) as u8);
	assert_eq!(bytes[1], ((length >> 8) & 0xFF) as u8);
	assert_eq!(bytes[2], ((length >> 16) & 0xFF) as u8);
	assert_eq!(bytes[3], ((length >> 24) & 0xFF) as u8);
	assert_eq!(u32::from_le_bytes(bytes), length);
}

#[test]
fn test_frame_layout() {
	// A frame is [length (4 bytes LE)][JSON bytes], nothing else.
	let message = serde_json::json!({"test": "hello"});
	let json_bytes = serde_json::to_vec(&message).unwrap();
	let length_bytes = (json_bytes.len() as u32).to_le_bytes();

	let mut frame = Vec::new();
	frame.extend_from_slice(&length_bytes);
	frame.extend_from_slice(&json_bytes);

	assert_eq!(frame.len(), 4 + json_bytes.len());
	assert_eq!(&frame[0..4], &length_bytes);
	assert_eq!(&frame[4..], &json_bytes);
}

#[tokio::test]
async fn test_send_writes_framed_message() {
	// Two duplex pipes stand in for the driver's stdin and stdout.
	let (stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, _stdout_write) = tokio::io::duplex(1024);

	let (transport, _rx) = PipeTransport::new(stdin_write, stdout_read);
	let (mut sender, _receiver) = transport.into_parts();

	let message = serde_json::json!({
		"id": 1,
		"method": "initialize",
		"params": {"sdkLanguage": "rust"}
	});
	sender.send(message.clone()).await.unwrap();

	// Read back what the sender wrote to "stdin".
	let (mut read_half, _write_half) = tokio::io::split(stdin_read);
	let mut len_buf = [0u8; 4];
	read_half.read_exact(&mut len_buf).await.unwrap();
	let length = u32::from_le_bytes(len_buf) as usize;

	let mut body = vec![0u8; length];
	read_half.read_exact(&mut body).await.unwrap();

	let received: serde_json::Value = serde_json::from_slice(&body).unwrap();
	assert_eq!(received, message);
}

#[tokio::test]
async fn test_receives_messages_in_order() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(4096);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(4096);

	let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	let messages = vec![
		serde_json::json!({"id": 1, "method": "first"}),
		serde_json::json!({"id": 2, "method": "second"}),
		serde_json::json!({"id": 3, "method": "third"}),
	];

	for msg in &messages {
		let payload = serde_json::to_vec(msg).unwrap();
		stdout_write
			.write_all(&(payload.len() as u32).to_le_bytes())
			.await
			.unwrap();
		stdout_write.write_all(&payload).await.unwrap();
	}
	stdout_write.flush().await.unwrap();

	for expected in &messages {
		let received = rx.recv().await.unwrap();
		assert_eq!(&received, expected);
	}

	drop(stdout_write);
	drop(rx);
	let _ = read_task.await;
}

#[tokio::test]
async fn test_large_message_survives_framing() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024 * 1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024 * 1024);

	let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	// Bodies larger than the 32KB pipe buffer arrive in several reads.
	let large = serde_json::json!({
		"id": 1,
		"data": "x".repeat(100_000)
	});
	let payload = serde_json::to_vec(&large).unwrap();
	assert!(payload.len() > 32_768);

	stdout_write
		.write_all(&(payload.len() as u32).to_le_bytes())
		.await
		.unwrap();
	stdout_write.write_all(&payload).await.unwrap();
	stdout_write.flush().await.unwrap();

	let received = rx.recv().await.unwrap();
	assert_eq!(received, large);

	drop(stdout_write);
	drop(rx);
	let _ = read_task.await;
}

#[tokio::test]
async fn test_truncated_length_prefix_errors() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

	// Two of the four header bytes, then EOF.
	stdout_write.write_all(&[0x01, 0x02]).await.unwrap();
	stdout_write.flush().await.unwrap();
	drop(stdout_write);

	let result = transport.run().await;
	assert!(result.is_err());
	assert!(
		result
			.unwrap_err()
			.to_string()
			.contains("Failed to read length prefix")
	);
}

#[tokio::test]
async fn test_closed_pipe_errors() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);
	drop(stdout_write);

	let read_task = tokio::spawn(async move { transport.run().await });
	let result = read_task.await.unwrap();
	assert!(result.is_err());
}

#[tokio::test]
async fn test_reader_exits_cleanly_when_channel_closes() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, rx) = PipeTransport::new(stdin_write, stdout_read);
	drop(rx);

	let read_task = tokio::spawn(async move { transport.run().await });

	// The next frame has nowhere to go; the reader should stop without error.
	let message = serde_json::json!({"id": 7, "method": "ping"});
	let payload = serde_json::to_vec(&message).unwrap();
	stdout_write
		.write_all(&(payload.len() as u32).to_le_bytes())
		.await
		.unwrap();
	stdout_write.write_all(&payload).await.unwrap();
	stdout_write.flush().await.unwrap();

	let result = read_task.await.unwrap();
	assert!(result.is_ok());
}
