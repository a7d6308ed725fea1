//! Suite configuration: CLI flags with environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Configuration for one suite run.
///
/// Every option has a default matching the suite's standing setup: the Vite
/// dev server origin, the mocked backend origin, a 30 second scenario
/// deadline, no retries, and artifact capture only when something fails.
#[derive(Debug, Clone, Parser)]
#[command(name = "playlist-e2e")]
#[command(about = "End-to-end browser suite for the playlist-builder frontend", version)]
pub struct SuiteConfig {
	/// Frontend origin the scenarios navigate against.
	#[arg(long, env = "PLAYLIST_E2E_BASE_URL", default_value = "http://localhost:5173")]
	pub base_url: String,

	/// Backend origin the scenarios mock.
	#[arg(long, env = "PLAYLIST_E2E_API_URL", default_value = "http://127.0.0.1:5050")]
	pub api_url: String,

	/// Deadline for one scenario attempt, in milliseconds.
	#[arg(long, env = "PLAYLIST_E2E_TIMEOUT_MS", default_value_t = 30_000)]
	pub timeout_ms: u64,

	/// Extra attempts for a failed scenario.
	#[arg(long, env = "PLAYLIST_E2E_RETRIES", default_value_t = 0)]
	pub retries: u32,

	/// When to record a driver trace.
	#[arg(long, value_enum, default_value_t = TracePolicy::OnFirstRetry)]
	pub trace: TracePolicy,

	/// When to keep context video recordings.
	#[arg(long, value_enum, default_value_t = VideoPolicy::RetainOnFailure)]
	pub video: VideoPolicy,

	/// When to capture a screenshot.
	#[arg(long, value_enum, default_value_t = ScreenshotPolicy::OnlyOnFailure)]
	pub screenshot: ScreenshotPolicy,

	/// Browser engine to launch.
	#[arg(long, value_enum, default_value_t = Engine::Chromium)]
	pub browser: Engine,

	/// Run the browser without a visible window.
	#[arg(long, default_value_t = true, action = clap::ArgAction::Set, value_name = "BOOL")]
	pub headless: bool,

	/// Shell command that serves the frontend.
	#[arg(long, default_value = "npx http-server . -p 5173")]
	pub server_command: String,

	/// Port the frontend server listens on.
	#[arg(long, default_value_t = 5173)]
	pub server_port: u16,

	/// Reuse an already-listening server instead of spawning one.
	#[arg(long, default_value_t = true, action = clap::ArgAction::Set, value_name = "BOOL")]
	pub reuse_server: bool,

	/// Fail scenarios that finish with never-matched mock rules.
	#[arg(long)]
	pub strict_mocks: bool,

	/// Directory for failure artifacts.
	#[arg(long, env = "PLAYLIST_E2E_OUTPUT", default_value = "test-results")]
	pub output: PathBuf,

	/// Run only scenarios whose name contains this substring.
	#[arg(long)]
	pub name: Option<String>,

	/// Increase log verbosity (-v, -vv).
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

impl SuiteConfig {
	/// The per-attempt deadline.
	pub fn scenario_timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	/// Total attempts per scenario: the first run plus retries.
	pub fn attempts(&self) -> u32 {
		self.retries + 1
	}
}

/// When to record a driver trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracePolicy {
	/// Trace every attempt.
	On,
	/// Never trace.
	Off,
	/// Trace the first retry of a failed scenario.
	OnFirstRetry,
}

impl TracePolicy {
	/// Whether the given attempt (0-based) runs under tracing.
	pub fn applies(self, attempt: u32) -> bool {
		match self {
			TracePolicy::On => true,
			TracePolicy::Off => false,
			TracePolicy::OnFirstRetry => attempt == 1,
		}
	}
}

impl std::fmt::Display for TracePolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			TracePolicy::On => write!(f, "on"),
			TracePolicy::Off => write!(f, "off"),
			TracePolicy::OnFirstRetry => write!(f, "on-first-retry"),
		}
	}
}

/// When to keep context video recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VideoPolicy {
	/// Record and keep every attempt's video.
	On,
	/// Never record.
	Off,
	/// Record every attempt, keep the video only when it failed.
	RetainOnFailure,
}

impl VideoPolicy {
	/// Whether the context records video at all.
	pub fn record(self) -> bool {
		!matches!(self, VideoPolicy::Off)
	}

	/// Whether a passing attempt keeps its recording.
	pub fn keep_on_pass(self) -> bool {
		matches!(self, VideoPolicy::On)
	}
}

impl std::fmt::Display for VideoPolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			VideoPolicy::On => write!(f, "on"),
			VideoPolicy::Off => write!(f, "off"),
			VideoPolicy::RetainOnFailure => write!(f, "retain-on-failure"),
		}
	}
}

/// When to capture a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScreenshotPolicy {
	/// Capture after every attempt.
	On,
	/// Never capture.
	Off,
	/// Capture only when the attempt failed.
	OnlyOnFailure,
}

impl ScreenshotPolicy {
	/// Whether a failed attempt is captured.
	pub fn capture_on_failure(self) -> bool {
		!matches!(self, ScreenshotPolicy::Off)
	}

	/// Whether a passing attempt is captured.
	pub fn capture_on_pass(self) -> bool {
		matches!(self, ScreenshotPolicy::On)
	}
}

impl std::fmt::Display for ScreenshotPolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ScreenshotPolicy::On => write!(f, "on"),
			ScreenshotPolicy::Off => write!(f, "off"),
			ScreenshotPolicy::OnlyOnFailure => write!(f, "only-on-failure"),
		}
	}
}

/// Browser engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
	Chromium,
	Firefox,
	Webkit,
}

impl Engine {
	/// The engine name as the driver knows it.
	pub fn as_str(self) -> &'static str {
		match self {
			Engine::Chromium => "chromium",
			Engine::Firefox => "firefox",
			Engine::Webkit => "webkit",
		}
	}
}

impl std::fmt::Display for Engine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_suite_contract() {
		let config = SuiteConfig::parse_from(["playlist-e2e"]);
		assert_eq!(config.base_url, "http://localhost:5173");
		assert_eq!(config.api_url, "http://127.0.0.1:5050");
		assert_eq!(config.timeout_ms, 30_000);
		assert_eq!(config.retries, 0);
		assert_eq!(config.trace, TracePolicy::OnFirstRetry);
		assert_eq!(config.video, VideoPolicy::RetainOnFailure);
		assert_eq!(config.screenshot, ScreenshotPolicy::OnlyOnFailure);
		assert_eq!(config.browser, Engine::Chromium);
		assert!(config.headless);
		assert_eq!(config.server_command, "npx http-server . -p 5173");
		assert_eq!(config.server_port, 5173);
		assert!(config.reuse_server);
		assert!(!config.strict_mocks);
		assert_eq!(config.output, PathBuf::from("test-results"));
		assert!(config.name.is_none());
	}

	#[test]
	fn flags_override_defaults() {
		let config = SuiteConfig::parse_from([
			"playlist-e2e",
			"--base-url",
			"http://localhost:4000",
			"--retries",
			"2",
			"--trace",
			"on",
			"--video",
			"off",
			"--headless",
			"false",
			"--strict-mocks",
			"--name",
			"Spotify",
		]);
		assert_eq!(config.base_url, "http://localhost:4000");
		assert_eq!(config.retries, 2);
		assert_eq!(config.attempts(), 3);
		assert_eq!(config.trace, TracePolicy::On);
		assert_eq!(config.video, VideoPolicy::Off);
		assert!(!config.headless);
		assert!(config.strict_mocks);
		assert_eq!(config.name.as_deref(), Some("Spotify"));
	}

	#[test]
	fn scenario_timeout_comes_from_millis() {
		let config = SuiteConfig::parse_from(["playlist-e2e", "--timeout-ms", "1500"]);
		assert_eq!(config.scenario_timeout(), Duration::from_millis(1500));
	}

	#[test]
	fn trace_policy_covers_the_first_retry_only() {
		assert!(!TracePolicy::OnFirstRetry.applies(0));
		assert!(TracePolicy::OnFirstRetry.applies(1));
		assert!(!TracePolicy::OnFirstRetry.applies(2));
		assert!(TracePolicy::On.applies(0));
		assert!(!TracePolicy::Off.applies(1));
	}

	#[test]
	fn video_policy_records_but_discards_on_pass() {
		assert!(VideoPolicy::RetainOnFailure.record());
		assert!(!VideoPolicy::RetainOnFailure.keep_on_pass());
		assert!(VideoPolicy::On.keep_on_pass());
		assert!(!VideoPolicy::Off.record());
	}

	#[test]
	fn screenshot_policy_gates_both_outcomes() {
		assert!(ScreenshotPolicy::OnlyOnFailure.capture_on_failure());
		assert!(!ScreenshotPolicy::OnlyOnFailure.capture_on_pass());
		assert!(ScreenshotPolicy::On.capture_on_pass());
		assert!(!ScreenshotPolicy::Off.capture_on_failure());
	}

	#[test]
	fn engine_names_match_the_driver() {
		assert_eq!(Engine::Chromium.as_str(), "chromium");
		assert_eq!(Engine::Firefox.as_str(), "firefox");
		assert_eq!(Engine::Webkit.as_str(), "webkit");
	}
}
