//! Typed RPC proxy for protocol objects.
//!
//! Every [`ChannelOwner`](crate::channel_owner::ChannelOwner) holds a
//! [`Channel`] that sends method calls to the driver under the object's guid
//! and deserializes the result.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::connection::ConnectionLike;
use crate::error::Result;

/// RPC proxy bound to one protocol object guid.
#[derive(Clone)]
pub struct Channel {
	guid: Arc<str>,
	connection: Arc<dyn ConnectionLike>,
}

impl Channel {
	/// Creates a channel for the given object guid.
	pub fn new(guid: Arc<str>, connection: Arc<dyn ConnectionLike>) -> Self {
		Self { guid, connection }
	}

	/// Sends a method call and deserializes the response.
	pub async fn send<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R> {
		let params_value = serde_json::to_value(params)?;
		let response = self
			.connection
			.send_message(&self.guid, method, params_value)
			.await?;
		serde_json::from_value(response).map_err(Into::into)
	}

	/// Sends a method call with no parameters.
	pub async fn send_no_params<R: DeserializeOwned>(&self, method: &str) -> Result<R> {
		self.send(method, Value::Null).await
	}

	/// Sends a method call and discards the result.
	pub async fn send_no_result<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
		let _: Value = self.send(method, params).await?;
		Ok(())
	}

	/// The guid this channel speaks for.
	pub fn guid(&self) -> &str {
		&self.guid
	}
}
