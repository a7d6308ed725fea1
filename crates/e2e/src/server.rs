//! Frontend dev-server lifecycle.
//!
//! The suite either reuses a server that is already listening on the
//! configured port or spawns the configured shell command and waits for the
//! port to answer. A spawned server is terminated when the suite is done.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, bail};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

const HEALTH_INTERVAL: Duration = Duration::from_millis(100);
const STARTUP_DEADLINE: Duration = Duration::from_secs(30);
const SIGTERM_GRACE: Duration = Duration::from_millis(500);

/// A running frontend server, either spawned by the suite or reused.
pub struct AppServer {
	child: Option<Child>,
	url: String,
}

impl AppServer {
	/// Make sure a server answers on `port`.
	///
	/// With `reuse` set, an already-listening server is adopted as-is and
	/// left running afterwards. Otherwise `command` is spawned through the
	/// shell and polled until it answers or the startup deadline passes.
	pub async fn ensure(command: &str, port: u16, reuse: bool) -> anyhow::Result<Self> {
		let url = format!("http://127.0.0.1:{port}");
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(2))
			.build()
			.context("building the health-check client")?;

		if reuse && probe(&client, &url).await {
			info!(%url, "reusing running frontend server");
			return Ok(Self { child: None, url });
		}

		info!(%command, %url, "starting frontend server");
		let child = Command::new("sh")
			.arg("-c")
			.arg(command)
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.kill_on_drop(true)
			.spawn()
			.with_context(|| format!("spawning frontend server: {command}"))?;

		let deadline = tokio::time::Instant::now() + STARTUP_DEADLINE;
		loop {
			if probe(&client, &url).await {
				return Ok(Self { child: Some(child), url });
			}
			if tokio::time::Instant::now() >= deadline {
				bail!("frontend server did not answer on {url} within {STARTUP_DEADLINE:?}");
			}
			tokio::time::sleep(HEALTH_INTERVAL).await;
		}
	}

	/// The origin the server answers on.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// Whether this suite spawned the server (and will stop it).
	pub fn is_managed(&self) -> bool {
		self.child.is_some()
	}

	/// Stop a spawned server: SIGTERM, a short grace period, then SIGKILL.
	/// A reused server is left alone.
	pub async fn stop(mut self) {
		let Some(mut child) = self.child.take() else {
			return;
		};

		#[cfg(unix)]
		if let Some(pid) = child.id() {
			use nix::sys::signal::{Signal, kill};
			use nix::unistd::Pid;
			let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
			match tokio::time::timeout(SIGTERM_GRACE, child.wait()).await {
				Ok(_) => {
					debug!("frontend server exited after SIGTERM");
					return;
				}
				Err(_) => debug!("frontend server ignored SIGTERM"),
			}
		}

		if let Err(err) = child.kill().await {
			warn!(error = %err, "failed to kill frontend server");
		}
	}
}

/// One health probe. Any HTTP response counts as listening, even an error
/// status; the port check only cares that something answers.
async fn probe(client: &reqwest::Client, url: &str) -> bool {
	match client.get(url).send().await {
		Ok(_) => true,
		Err(err) if err.is_connect() => false,
		Err(err) => {
			debug!(error = %err, "health probe failed");
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use tokio::io::AsyncWriteExt;
	use tokio::net::TcpListener;

	#[tokio::test]
	async fn ensure_reuses_a_listening_server() {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let port = listener.local_addr().unwrap().port();
		tokio::spawn(async move {
			while let Ok((mut stream, _)) = listener.accept().await {
				let _ = stream
					.write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
					.await;
			}
		});

		// `false` as the spawn command would fail immediately, so a success
		// here proves the running listener was adopted instead.
		let server = AppServer::ensure("false", port, true).await.unwrap();
		assert!(!server.is_managed());
		assert_eq!(server.url(), format!("http://127.0.0.1:{port}"));
		server.stop().await;
	}
}
