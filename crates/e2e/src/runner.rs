//! Sequential scenario runner.
//!
//! Each scenario gets a fresh browser context and page, its own artifact
//! directory under the output root, and up to `retries + 1` attempts.
//! Traces, videos, and screenshots are captured according to the configured
//! policies; a passing attempt cleans its recordings back up.

use std::path::Path;
use std::time::Instant;

use anyhow::Context as _;
use drover::protocol::{ContextOptions, LaunchOptions, TracingStartOptions};
use drover::{Browser, Page, Playwright, Scenario};
use tracing::{debug, error, info, warn};

use crate::config::SuiteConfig;
use crate::fixtures::Api;
use crate::scenarios::{self, Spec};
use crate::server::AppServer;

/// Result of one scenario after all of its attempts.
#[derive(Debug, Clone)]
pub struct Outcome {
	pub name: String,
	pub passed: bool,
	pub attempts: u32,
	pub duration_ms: u64,
	pub error: Option<String>,
}

/// Suite tally across all scenarios.
#[derive(Debug, Clone)]
pub struct Summary {
	pub passed: usize,
	pub failed: usize,
	pub outcomes: Vec<Outcome>,
}

impl Summary {
	/// Process exit code: 0 when every scenario passed, 1 otherwise.
	pub fn exit_code(&self) -> i32 {
		if self.failed == 0 { 0 } else { 1 }
	}
}

/// Runs the configured scenarios and returns the tally.
///
/// An `Err` from here means the suite itself could not run (server or
/// driver setup); scenario failures are reported through the [`Summary`].
pub async fn run_suite(config: SuiteConfig) -> anyhow::Result<Summary> {
	let specs = filter_specs(scenarios::all(), config.name.as_deref());
	if specs.is_empty() {
		anyhow::bail!(
			"no scenario matches --name {:?}",
			config.name.as_deref().unwrap_or_default()
		);
	}
	info!(scenarios = specs.len(), browser = %config.browser, "starting suite");

	let server = AppServer::ensure(&config.server_command, config.server_port, config.reuse_server)
		.await
		.context("starting the frontend server")?;
	let playwright = Playwright::launch().await.context("launching the driver")?;

	let result = run_specs(&playwright, &specs, &config).await;

	if let Err(err) = playwright.shutdown().await {
		warn!(error = %err, "driver shutdown failed");
	}
	server.stop().await;
	result
}

async fn run_specs(
	playwright: &Playwright,
	specs: &[Spec],
	config: &SuiteConfig,
) -> anyhow::Result<Summary> {
	let browser_type = playwright
		.browser_type(config.browser.as_str())
		.with_context(|| format!("unknown browser engine {}", config.browser))?;
	let browser = browser_type
		.launch(Some(LaunchOptions::default().headless(config.headless)))
		.await
		.with_context(|| format!("launching {}", config.browser))?;

	let api = Api::new(&config.api_url);
	let mut outcomes = Vec::with_capacity(specs.len());
	for spec in specs {
		let outcome = run_scenario(&browser, spec, &api, config).await;
		if outcome.passed {
			info!("✓ {} ({} ms)", outcome.name, outcome.duration_ms);
		} else {
			error!(
				"✗ {} - {}",
				outcome.name,
				outcome.error.as_deref().unwrap_or("unknown error")
			);
		}
		outcomes.push(outcome);
	}

	if let Err(err) = browser.close().await {
		warn!(error = %err, "browser close failed");
	}

	let passed = outcomes.iter().filter(|o| o.passed).count();
	let failed = outcomes.len() - passed;
	info!("{passed} passed, {failed} failed ({} total)", outcomes.len());
	Ok(Summary { passed, failed, outcomes })
}

async fn run_scenario(browser: &Browser, spec: &Spec, api: &Api, config: &SuiteConfig) -> Outcome {
	let started = Instant::now();
	let slug = slugify(spec.name);
	let artifact_dir = config.output.join(&slug);

	let mut last_error = None;
	for attempt in 0..config.attempts() {
		match run_attempt(browser, spec, api, config, attempt, &artifact_dir).await {
			Ok(()) => {
				return Outcome {
					name: spec.name.to_string(),
					passed: true,
					attempts: attempt + 1,
					duration_ms: started.elapsed().as_millis() as u64,
					error: None,
				};
			}
			Err(err) => {
				let rendered = format!("{err:#}");
				if attempt + 1 < config.attempts() {
					warn!(scenario = spec.name, attempt = attempt + 1, error = %rendered, "attempt failed, retrying");
				}
				last_error = Some(rendered);
			}
		}
	}

	Outcome {
		name: spec.name.to_string(),
		passed: false,
		attempts: config.attempts(),
		duration_ms: started.elapsed().as_millis() as u64,
		error: last_error,
	}
}

async fn run_attempt(
	browser: &Browser,
	spec: &Spec,
	api: &Api,
	config: &SuiteConfig,
	attempt: u32,
	artifact_dir: &Path,
) -> anyhow::Result<()> {
	let video_dir = artifact_dir.join("video");
	let mut context_options = ContextOptions::default().base_url(&config.base_url);
	if config.video.record() {
		tokio::fs::create_dir_all(&video_dir)
			.await
			.context("creating the video directory")?;
		context_options = context_options.record_video(&video_dir);
	}

	let context = browser
		.new_context(Some(context_options))
		.await
		.context("opening a browser context")?;

	let tracing_active = config.trace.applies(attempt);
	if tracing_active {
		if let Some(tracing) = context.tracing() {
			if let Err(err) = tracing.start(TracingStartOptions::full().title(spec.name)).await {
				warn!(error = %err, "trace start failed");
			}
		}
	}

	let page = context.new_page().await.context("opening a page")?;
	let scenario =
		Scenario::new(page.clone(), &config.base_url).with_strict_mocks(config.strict_mocks);

	let run_result =
		tokio::time::timeout(config.scenario_timeout(), (spec.run)(&scenario, api)).await;
	let result: anyhow::Result<()> = match run_result {
		Ok(Ok(())) => scenario.finish().map_err(anyhow::Error::from),
		Ok(Err(err)) => Err(err),
		Err(_) => Err(anyhow::anyhow!(
			"scenario exceeded its {} ms deadline",
			config.timeout_ms
		)),
	};
	let failed = result.is_err();

	let capture = if failed {
		config.screenshot.capture_on_failure()
	} else {
		config.screenshot.capture_on_pass()
	};
	if capture {
		let stem = if failed { "failure" } else { "final" };
		capture_page_state(&page, artifact_dir, stem).await;
	}

	if tracing_active {
		if let Some(tracing) = context.tracing() {
			let dest = failed.then(|| artifact_dir.join("trace.zip"));
			if dest.is_some() {
				if let Err(err) = tokio::fs::create_dir_all(artifact_dir).await {
					warn!(error = %err, "creating the artifact directory failed");
				}
			}
			if let Err(err) = tracing.stop(dest.as_deref()).await {
				warn!(error = %err, "trace stop failed");
			}
		}
	}

	// The video handle must be taken before the context goes away; the
	// recording itself is only finalized by the close.
	let video = if config.video.record() { page.video() } else { None };
	if let Err(err) = context.close().await {
		warn!(error = %err, "context close failed");
	}

	if config.video.record() {
		if failed || config.video.keep_on_pass() {
			if let Some(video) = &video {
				match video.path().await {
					Ok(path) => info!(path = %path.display(), "video retained"),
					Err(err) => debug!(error = %err, "video path unavailable"),
				}
			}
		} else {
			if let Some(video) = &video {
				if let Err(err) = video.delete().await {
					debug!(error = %err, "video delete failed");
				}
			}
			let _ = tokio::fs::remove_dir_all(&video_dir).await;
			// Drops the scenario directory too when nothing else was kept.
			let _ = tokio::fs::remove_dir(artifact_dir).await;
		}
	}

	result
}

/// Best-effort page snapshot: a screenshot plus the serialized DOM.
async fn capture_page_state(page: &Page, dir: &Path, stem: &str) {
	if let Err(err) = tokio::fs::create_dir_all(dir).await {
		warn!(error = %err, "creating the artifact directory failed");
		return;
	}
	if let Err(err) = page.screenshot_to_file(&dir.join(format!("{stem}.png")), None).await {
		warn!(error = %err, "screenshot capture failed");
	}
	match page.evaluate_json("document.documentElement.outerHTML").await {
		Ok(serde_json::Value::String(html)) => {
			if let Err(err) = tokio::fs::write(dir.join(format!("{stem}.html")), html).await {
				warn!(error = %err, "dom snapshot write failed");
			}
		}
		Ok(other) => debug!(?other, "dom snapshot returned a non-string"),
		Err(err) => warn!(error = %err, "dom snapshot failed"),
	}
}

fn filter_specs(specs: Vec<Spec>, needle: Option<&str>) -> Vec<Spec> {
	match needle {
		Some(needle) => specs.into_iter().filter(|s| s.name.contains(needle)).collect(),
		None => specs,
	}
}

/// Turns a scenario name into a directory-safe slug.
pub fn slugify(name: &str) -> String {
	let mut slug = String::with_capacity(name.len());
	for ch in name.chars() {
		if ch.is_ascii_alphanumeric() {
			slug.push(ch.to_ascii_lowercase());
		} else if !slug.is_empty() && !slug.ends_with('-') {
			slug.push('-');
		}
	}
	while slug.ends_with('-') {
		slug.pop();
	}
	if slug.is_empty() { "scenario".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn slugify_maps_names_to_directories() {
		assert_eq!(slugify("fügt Song zur Playlist hinzu"), "f-gt-song-zur-playlist-hinzu");
		assert_eq!(
			slugify("Shortcut \"/\" fokussiert das Suchfeld"),
			"shortcut-fokussiert-das-suchfeld"
		);
		assert_eq!(slugify("!!!"), "scenario");
	}

	#[test]
	fn catalog_slugs_are_filesystem_safe_and_unique() {
		let mut seen = HashSet::new();
		for spec in scenarios::all() {
			let slug = slugify(spec.name);
			assert!(!slug.is_empty());
			assert!(
				slug.chars()
					.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
				"unsafe slug {slug:?} for {:?}",
				spec.name
			);
			assert!(!slug.starts_with('-') && !slug.ends_with('-'));
			assert!(seen.insert(slug), "duplicate slug for {:?}", spec.name);
		}
	}

	#[test]
	fn exit_code_is_zero_only_when_all_passed() {
		let clean = Summary {
			passed: 7,
			failed: 0,
			outcomes: vec![],
		};
		assert_eq!(clean.exit_code(), 0);

		let dirty = Summary {
			passed: 6,
			failed: 1,
			outcomes: vec![],
		};
		assert_eq!(dirty.exit_code(), 1);
	}

	#[test]
	fn name_filter_selects_by_substring() {
		let hits = filter_specs(scenarios::all(), Some("Spotify"));
		assert_eq!(hits.len(), 1);
		assert!(hits[0].name.contains("Spotify"));

		assert_eq!(filter_specs(scenarios::all(), None).len(), 7);
		assert!(filter_specs(scenarios::all(), Some("kein Treffer")).is_empty());
	}
}
