//! Entry point object giving access to the browser engines.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use drover_runtime::channel::Channel;
use drover_runtime::channel_owner::{ChannelOwner, ChannelOwnerImpl, ParentOrConnection};
use drover_runtime::connection::{Connection, ConnectionLike};
use drover_runtime::{DriverProcess, Error, PipeTransport, Result};

use crate::BrowserType;

/// Root protocol object exposing the three browser engines.
///
/// [`Playwright::launch`] spawns the driver process, connects the pipe
/// transport, and performs the handshake. Dropping the returned handle kills
/// the driver unless shutdown was already requested.
///
/// See <https://playwright.dev/docs/api/class-playwright>
pub struct Playwright {
	base: ChannelOwnerImpl,
	chromium: Arc<dyn ChannelOwner>,
	firefox: Arc<dyn ChannelOwner>,
	webkit: Arc<dyn ChannelOwner>,
	/// Driver process, present only on the handle returned by `launch`.
	driver: Arc<Mutex<Option<DriverProcess>>>,
	owns_driver: bool,
}

impl Playwright {
	/// Launches the driver and initializes the protocol.
	///
	/// # Errors
	///
	/// Fails when the driver cannot be found or spawned, the transport
	/// breaks, or the handshake does not complete within 30 seconds.
	pub async fn launch() -> Result<Self> {
		tracing::debug!("launching driver process");
		let mut driver = DriverProcess::launch().await?;

		let stdin = driver
			.process
			.stdin
			.take()
			.ok_or_else(|| Error::LaunchFailed("driver stdin not piped".to_string()))?;
		let stdout = driver
			.process
			.stdout
			.take()
			.ok_or_else(|| Error::LaunchFailed("driver stdout not piped".to_string()))?;

		let (transport, message_rx) = PipeTransport::new(stdin, stdout);
		let parts = transport.into_transport_parts(message_rx);
		let connection = Arc::new(Connection::new(parts));
		connection.run()?;

		let playwright_obj = crate::init::initialize_client(&connection).await?;
		let playwright = playwright_obj.downcast_ref::<Playwright>().ok_or_else(|| {
			Error::ProtocolError("initialized object is not Playwright".to_string())
		})?;

		Ok(Self {
			base: playwright.base.clone(),
			chromium: Arc::clone(&playwright.chromium),
			firefox: Arc::clone(&playwright.firefox),
			webkit: Arc::clone(&playwright.webkit),
			driver: Arc::new(Mutex::new(Some(driver))),
			owns_driver: true,
		})
	}

	/// Creates the factory-side object for the `Playwright` announcement.
	///
	/// The initializer references the browser type objects by guid; those
	/// are announced first, so plain registry lookups resolve them.
	pub async fn new(
		connection: Arc<dyn ConnectionLike>,
		type_name: String,
		guid: Arc<str>,
		initializer: Value,
	) -> Result<Self> {
		let base = ChannelOwnerImpl::new(
			ParentOrConnection::Connection(Arc::clone(&connection)),
			type_name,
			guid,
			initializer.clone(),
		);

		let browser_type = |field: &str| -> Result<Arc<dyn ChannelOwner>> {
			let guid = initializer[field]["guid"].as_str().ok_or_else(|| {
				Error::ProtocolError(format!("Playwright initializer missing '{field}.guid'"))
			})?;
			connection.get_object(guid).ok_or(Error::ObjectNotFound {
				guid: guid.to_string(),
				expected: Some("BrowserType"),
			})
		};

		let chromium = browser_type("chromium")?;
		let firefox = browser_type("firefox")?;
		let webkit = browser_type("webkit")?;

		Ok(Self {
			base,
			chromium,
			firefox,
			webkit,
			driver: Arc::new(Mutex::new(None)),
			owns_driver: false,
		})
	}

	/// Returns the Chromium browser type.
	pub fn chromium(&self) -> &BrowserType {
		self.chromium
			.downcast_ref::<BrowserType>()
			.expect("chromium is a BrowserType")
	}

	/// Returns the Firefox browser type.
	pub fn firefox(&self) -> &BrowserType {
		self.firefox
			.downcast_ref::<BrowserType>()
			.expect("firefox is a BrowserType")
	}

	/// Returns the WebKit browser type.
	pub fn webkit(&self) -> &BrowserType {
		self.webkit
			.downcast_ref::<BrowserType>()
			.expect("webkit is a BrowserType")
	}

	/// Returns the browser type with the given engine name.
	pub fn browser_type(&self, name: &str) -> Option<&BrowserType> {
		match name {
			"chromium" => Some(self.chromium()),
			"firefox" => Some(self.firefox()),
			"webkit" => Some(self.webkit()),
			_ => None,
		}
	}

	/// Shuts the driver process down gracefully.
	pub async fn shutdown(&self) -> Result<()> {
		let driver = self.driver.lock().take();
		if let Some(driver) = driver {
			tracing::debug!("shutting down driver process");
			driver.shutdown().await?;
		}
		Ok(())
	}
}

impl drover_runtime::channel_owner::private::Sealed for Playwright {}

impl ChannelOwner for Playwright {
	fn guid(&self) -> &str {
		self.base.guid()
	}

	fn type_name(&self) -> &str {
		self.base.type_name()
	}

	fn parent(&self) -> Option<Arc<dyn ChannelOwner>> {
		self.base.parent()
	}

	fn connection(&self) -> Arc<dyn ConnectionLike> {
		self.base.connection()
	}

	fn initializer(&self) -> &Value {
		self.base.initializer()
	}

	fn channel(&self) -> &Channel {
		self.base.channel()
	}

	fn dispose(&self, reason: drover_runtime::channel_owner::DisposeReason) {
		self.base.dispose(reason)
	}

	fn adopt(&self, child: Arc<dyn ChannelOwner>) {
		self.base.adopt(child)
	}

	fn add_child(&self, guid: Arc<str>, child: Arc<dyn ChannelOwner>) {
		self.base.add_child(guid, child)
	}

	fn remove_child(&self, guid: &str) {
		self.base.remove_child(guid)
	}

	fn on_event(&self, method: &str, params: Value) {
		self.base.on_event(method, params)
	}

	fn was_collected(&self) -> bool {
		self.base.was_collected()
	}
}

impl Drop for Playwright {
	fn drop(&mut self) {
		if !self.owns_driver {
			return;
		}

		if let Some(mut driver) = self.driver.lock().take() {
			tracing::debug!("drop: force-killing driver process");
			if let Err(e) = driver.process.start_kill() {
				tracing::warn!(error = %e, "failed to kill driver process");
			}
		}
	}
}

impl std::fmt::Debug for Playwright {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Playwright")
			.field("guid", &self.guid())
			.finish()
	}
}
