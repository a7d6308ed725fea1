//! Protocol handshake: wires a [`Connection`] to a live `Playwright` object.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use drover_runtime::channel_owner::{ChannelOwner, ParentOrConnection};
use drover_runtime::connection::{Connection, ConnectionLike, ObjectFactory};
use drover_runtime::{Error, Result};

use crate::Playwright;
use crate::root::Root;

const INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs the driver handshake and returns the `Playwright` object.
///
/// Installs the object factory, registers a temporary [`Root`] under the
/// empty guid, sends `initialize`, and looks up the `Playwright` object the
/// driver announced before responding. The root is unregistered afterwards.
pub async fn initialize_client(connection: &Arc<Connection>) -> Result<Arc<dyn ChannelOwner>> {
	connection.set_factory(Arc::new(DefaultObjectFactory));

	let root = Arc::new(Root::new(
		Arc::clone(connection) as Arc<dyn ConnectionLike>
	));
	connection.register_object("", Arc::clone(&root) as Arc<dyn ChannelOwner>);

	tracing::debug!("root registered, sending initialize");

	let response = tokio::time::timeout(INIT_TIMEOUT, root.initialize())
		.await
		.map_err(|_| Error::Timeout("driver initialization timed out after 30s".to_string()))??;

	let playwright_guid = response["playwright"]["guid"].as_str().ok_or_else(|| {
		Error::ProtocolError("initialize response missing 'playwright.guid'".to_string())
	})?;

	tracing::debug!(guid = %playwright_guid, "driver initialized");

	// The __create__ for Playwright is dispatched before the initialize
	// response, but give stragglers a moment anyway.
	let playwright = connection
		.wait_for_object(playwright_guid, Duration::from_secs(1))
		.await?;

	if playwright.downcast_ref::<Playwright>().is_none() {
		return Err(Error::ProtocolError(format!(
			"object '{playwright_guid}' is not a Playwright instance"
		)));
	}

	connection.unregister_object("");

	Ok(playwright)
}

struct DefaultObjectFactory;

impl ObjectFactory for DefaultObjectFactory {
	fn create_object<'a>(
		&'a self,
		parent: ParentOrConnection,
		type_name: String,
		guid: String,
		initializer: Value,
	) -> std::pin::Pin<
		Box<dyn std::future::Future<Output = Result<Arc<dyn ChannelOwner>>> + Send + 'a>,
	> {
		Box::pin(async move {
			crate::object_factory::create_object(parent, type_name, Arc::from(guid), initializer)
				.await
		})
	}
}
