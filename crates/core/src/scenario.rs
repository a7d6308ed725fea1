//! Scenario harness driving a [`Page`] through scripted steps.
//!
//! A [`Scenario`] wraps one page with the operations an end-to-end test
//! needs: navigation, request mocking, DOM injection, input, bounded
//! assertions, dialog arming, and popup capture. Failures carry a typed
//! taxonomy ([`Error`]) so a runner can report what went wrong without
//! parsing driver messages.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;

use drover_runtime::Error as DriverError;

use drover_protocol::options::{ClickOptions, FillOptions, FulfillOptions, PressOptions};

use crate::handlers::{RouteMatcher, Subscription};
pub use crate::page::DialogAnswer;
use crate::page::Page;

const DEFAULT_ASSERT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INITIAL: Duration = Duration::from_millis(50);
const POLL_CAP: Duration = Duration::from_millis(250);

/// Scenario-level failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The page could not be reached or did not finish loading.
	#[error("navigation to {url} failed: {source}")]
	Navigation {
		/// The URL that was being loaded.
		url: String,
		#[source]
		source: DriverError,
	},

	/// An action or injection target matched no element.
	#[error("no element matches selector {selector:?}")]
	SelectorNotFound {
		/// The selector that failed to resolve.
		selector: String,
	},

	/// An expected text or count never showed up within the bound.
	#[error("assertion timed out after {waited_ms} ms: wanted {expected:?} at {selector:?}, last saw {last_seen:?}")]
	AssertionTimeout {
		/// The polled selector.
		selector: String,
		/// What was expected (substring or element count).
		expected: String,
		/// The last observed text or count.
		last_seen: String,
		/// How long the assertion polled.
		waited_ms: u64,
	},

	/// No popup window appeared within the bound.
	#[error("no popup appeared within {waited_ms} ms")]
	PopupTimeout {
		/// How long the waiter was armed.
		waited_ms: u64,
	},

	/// Strict-mock mode found a rule that never matched a request.
	#[error("mock for {pattern:?} was never matched")]
	UnusedMock {
		/// The unused rule's glob pattern.
		pattern: String,
	},

	/// Any driver-level failure, passed through unchanged.
	#[error(transparent)]
	Driver(#[from] DriverError),
}

/// Scenario result type.
pub type Result<T> = std::result::Result<T, Error>;

/// A canned response for requests matching a glob pattern.
///
/// Defaults to a `200 application/json` empty-object response matching any
/// HTTP method.
#[derive(Debug, Clone)]
pub struct MockRule {
	pattern: String,
	method: Option<String>,
	status: u16,
	content_type: String,
	body: String,
}

impl MockRule {
	/// Creates a rule for `pattern` (glob syntax, e.g. `**/api/search*`).
	pub fn new(pattern: impl Into<String>) -> Self {
		Self {
			pattern: pattern.into(),
			method: None,
			status: 200,
			content_type: "application/json".to_string(),
			body: "{}".to_string(),
		}
	}

	/// Narrows the rule to one HTTP method (case-insensitive).
	pub fn method(mut self, method: impl Into<String>) -> Self {
		self.method = Some(method.into().to_ascii_uppercase());
		self
	}

	/// Sets the response status code.
	pub fn status(mut self, status: u16) -> Self {
		self.status = status;
		self
	}

	/// Responds with a JSON body.
	pub fn json(mut self, body: &Value) -> Self {
		self.content_type = "application/json".to_string();
		self.body = body.to_string();
		self
	}

	/// Responds with a plain-text body.
	pub fn text(mut self, body: impl Into<String>) -> Self {
		self.content_type = "text/plain".to_string();
		self.body = body.into();
		self
	}

	/// Responds with `body` under an explicit content type.
	pub fn body(mut self, content_type: impl Into<String>, body: impl Into<String>) -> Self {
		self.content_type = content_type.into();
		self.body = body.into();
		self
	}

	/// The rule's glob pattern.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}
}

/// A compiled rule plus its hit counter.
struct RegisteredRule {
	pattern: String,
	matcher: RouteMatcher,
	method: Option<String>,
	status: u16,
	content_type: String,
	body: String,
	hits: Arc<AtomicU32>,
}

impl RegisteredRule {
	fn compile(rule: MockRule) -> Self {
		Self {
			matcher: RouteMatcher::new(&rule.pattern),
			pattern: rule.pattern,
			method: rule.method,
			status: rule.status,
			content_type: rule.content_type,
			body: rule.body,
			hits: Arc::new(AtomicU32::new(0)),
		}
	}
}

/// Picks the rule answering a request: last registered wins among matches.
fn find_rule(rules: &[RegisteredRule], url: &str, method: &str) -> Option<usize> {
	rules
		.iter()
		.enumerate()
		.rev()
		.find(|(_, rule)| {
			rule.matcher.is_match(url) && rule.method.as_deref().is_none_or(|m| m.eq_ignore_ascii_case(method))
		})
		.map(|(i, _)| i)
}

/// Maps an action deadline into the selector-not-found taxonomy; everything
/// else passes through as a driver error.
fn selector_error(selector: &str) -> impl FnOnce(DriverError) -> Error + '_ {
	move |e| {
		if e.is_timeout() {
			Error::SelectorNotFound {
				selector: selector.to_string(),
			}
		} else {
			Error::Driver(e)
		}
	}
}

/// Resolves a scenario target against the suite base URL.
fn resolve_url(base_url: &str, target: &str) -> String {
	if target.starts_with("http://") || target.starts_with("https://") {
		target.to_string()
	} else {
		format!("{}/{}", base_url.trim_end_matches('/'), target.trim_start_matches('/'))
	}
}

/// Expression assigning `html` to the container's innerHTML, returning
/// whether the container exists.
fn inject_expression(selector: &str, html: &str) -> String {
	let selector_lit = serde_json::Value::String(selector.to_string()).to_string();
	let html_lit = serde_json::Value::String(html.to_string()).to_string();
	format!(
		"(() => {{ const el = document.querySelector({selector_lit}); if (!el) return false; el.innerHTML = {html_lit}; return true; }})()"
	)
}

/// Expression reading the element's rendered text, or null when missing.
fn text_probe_expression(selector: &str) -> String {
	let selector_lit = serde_json::Value::String(selector.to_string()).to_string();
	format!("(() => {{ const el = document.querySelector({selector_lit}); return el ? el.innerText : null; }})()")
}

/// One scripted browser scenario over a fresh page.
///
/// Operations run strictly in sequence; assertions poll the live DOM with
/// backoff under a single deadline rather than snapshotting once.
pub struct Scenario {
	page: Page,
	base_url: String,
	assert_timeout: Duration,
	strict_mocks: bool,
	rules: Arc<Mutex<Vec<RegisteredRule>>>,
	subscriptions: Mutex<Vec<Subscription>>,
}

impl Scenario {
	/// Creates a scenario over `page`, resolving relative targets against
	/// `base_url`.
	pub fn new(page: Page, base_url: impl Into<String>) -> Self {
		Self {
			page,
			base_url: base_url.into(),
			assert_timeout: DEFAULT_ASSERT_TIMEOUT,
			strict_mocks: false,
			rules: Arc::new(Mutex::new(Vec::new())),
			subscriptions: Mutex::new(Vec::new()),
		}
	}

	/// Sets the deadline for assertions, actions, and popup waits.
	pub fn with_assert_timeout(mut self, timeout: Duration) -> Self {
		self.assert_timeout = timeout;
		self
	}

	/// Makes [`finish`](Self::finish) fail when a mock never matched.
	pub fn with_strict_mocks(mut self, strict: bool) -> Self {
		self.strict_mocks = strict;
		self
	}

	/// The page this scenario drives.
	pub fn page(&self) -> &Page {
		&self.page
	}

	fn action_timeout_ms(&self) -> f64 {
		self.assert_timeout.as_millis() as f64
	}

	/// Navigates to `target`, waiting for the load event.
	///
	/// Relative targets resolve against the base URL. Fails when the server
	/// is unreachable, the load times out, or the response status is not
	/// 2xx.
	pub async fn goto(&self, target: &str) -> Result<()> {
		let url = resolve_url(&self.base_url, target);
		tracing::debug!(%url, "navigate");

		let response = self
			.page
			.goto(&url, None)
			.await
			.map_err(|source| Error::Navigation { url: url.clone(), source })?;

		if let Some(response) = response {
			if !response.ok() {
				return Err(Error::Navigation {
					url,
					source: DriverError::ProtocolError(format!(
						"server responded with HTTP {}",
						response.status()
					)),
				});
			}
		}

		Ok(())
	}

	/// Reloads the current page, re-running startup fetches under whatever
	/// mocks are registered.
	pub async fn reload(&self) -> Result<()> {
		let url = self.page.url();
		tracing::debug!(%url, "reload");
		self.page
			.reload(None)
			.await
			.map(|_| ())
			.map_err(|source| Error::Navigation { url, source })
	}

	/// Registers a canned response for matching requests.
	///
	/// Matching requests never reach the network; requests no rule claims
	/// pass through untouched. When several rules match, the one registered
	/// last wins.
	pub async fn mock(&self, rule: MockRule) -> Result<()> {
		tracing::debug!(pattern = %rule.pattern, status = rule.status, "register mock");
		let pattern = rule.pattern.clone();
		self.rules.lock().push(RegisteredRule::compile(rule));

		let rules = Arc::clone(&self.rules);
		let subscription = self
			.page
			.route(&pattern, move |route| {
				let rules = Arc::clone(&rules);
				async move { dispatch_mock(&rules, route).await }
			})
			.await?;

		self.subscriptions.lock().push(subscription);
		Ok(())
	}

	/// Sets the innerHTML of the container matching `selector`.
	pub async fn inject_html(&self, selector: &str, html: &str) -> Result<()> {
		let expression = inject_expression(selector, html);
		match self.page.evaluate_json(&expression).await? {
			Value::Bool(true) => Ok(()),
			_ => Err(Error::SelectorNotFound {
				selector: selector.to_string(),
			}),
		}
	}

	/// Clicks the element matching `selector`.
	///
	/// Hidden, disabled, or missing targets fail once the action deadline
	/// passes.
	pub async fn click(&self, selector: &str) -> Result<()> {
		tracing::debug!(%selector, "click");
		let options = ClickOptions::default().timeout(self.action_timeout_ms());
		self.page
			.click(selector, Some(options))
			.await
			.map_err(selector_error(selector))
	}

	/// Fills the input matching `selector` with `text`, firing input and
	/// change events.
	pub async fn fill(&self, selector: &str, text: &str) -> Result<()> {
		tracing::debug!(%selector, "fill");
		let options = FillOptions::default().timeout(self.action_timeout_ms());
		self.page
			.fill(selector, text, Some(options))
			.await
			.map_err(selector_error(selector))
	}

	/// Focuses the element matching `selector` and presses `key`.
	pub async fn press(&self, selector: &str, key: &str) -> Result<()> {
		tracing::debug!(%selector, %key, "press");
		let options = PressOptions::default().timeout(self.action_timeout_ms());
		self.page
			.press(selector, key, Some(options))
			.await
			.map_err(selector_error(selector))
	}

	/// Presses `key` at page level, reaching whatever has focus. Used for
	/// global shortcuts that no single element owns.
	pub async fn press_key(&self, key: &str) -> Result<()> {
		tracing::debug!(%key, "press key");
		self.page.press_key(key).await.map_err(Error::Driver)
	}

	/// Waits until the rendered text of `selector` contains `needle`.
	pub async fn expect_text(&self, selector: &str, needle: &str) -> Result<()> {
		let expression = text_probe_expression(selector);
		let started = Instant::now();
		let deadline = started + self.assert_timeout;
		let mut delay = POLL_INITIAL;
		let mut last_seen: Option<String> = None;

		loop {
			match self.page.evaluate_json(&expression).await? {
				Value::String(text) => {
					if text.contains(needle) {
						return Ok(());
					}
					last_seen = Some(text);
				}
				_ => last_seen = None,
			}

			let now = Instant::now();
			if now >= deadline {
				break;
			}
			tokio::time::sleep(delay.min(deadline - now)).await;
			delay = (delay * 2).min(POLL_CAP);
		}

		Err(Error::AssertionTimeout {
			selector: selector.to_string(),
			expected: needle.to_string(),
			last_seen: last_seen.unwrap_or_else(|| "element not found".to_string()),
			waited_ms: started.elapsed().as_millis() as u64,
		})
	}

	/// Waits until exactly `expected` elements match `selector`.
	pub async fn expect_count(&self, selector: &str, expected: usize) -> Result<()> {
		let started = Instant::now();
		let deadline = started + self.assert_timeout;
		let mut delay = POLL_INITIAL;
		let mut last_count;

		loop {
			last_count = self.page.query_count(selector).await?;
			if last_count == expected {
				return Ok(());
			}

			let now = Instant::now();
			if now >= deadline {
				break;
			}
			tokio::time::sleep(delay.min(deadline - now)).await;
			delay = (delay * 2).min(POLL_CAP);
		}

		Err(Error::AssertionTimeout {
			selector: selector.to_string(),
			expected: format!("{expected} elements"),
			last_seen: format!("{last_count} elements"),
			waited_ms: started.elapsed().as_millis() as u64,
		})
	}

	/// Arms a one-shot answer for the next dialog. Inert when no dialog
	/// fires; unarmed dialogs are dismissed automatically.
	pub fn arm_dialog(&self, answer: DialogAnswer) {
		tracing::debug!(?answer, "arm dialog");
		self.page.arm_dialog(answer);
	}

	/// Runs `trigger` and returns the URL of the popup it opens.
	///
	/// The popup waiter is installed before the trigger runs, so a popup
	/// opening faster than the await cannot be missed.
	pub async fn expect_popup<Fut>(&self, trigger: Fut) -> Result<String>
	where
		Fut: Future<Output = Result<()>>,
	{
		let waiter = self.page.expect_popup(self.assert_timeout);
		trigger.await?;

		let started = Instant::now();
		let popup = match waiter.wait().await {
			Ok(popup) => popup,
			Err(e) if e.is_timeout() => {
				return Err(Error::PopupTimeout {
					waited_ms: started.elapsed().as_millis() as u64,
				});
			}
			Err(e) => return Err(Error::Driver(e)),
		};

		// The popup exists before it commits its navigation; give the URL a
		// moment to move past about:blank.
		let deadline = started + self.assert_timeout;
		let mut delay = POLL_INITIAL;
		loop {
			let url = popup.url();
			if url != "about:blank" {
				tracing::debug!(%url, "popup captured");
				return Ok(url);
			}
			let now = Instant::now();
			if now >= deadline {
				return Ok(url);
			}
			tokio::time::sleep(delay.min(deadline - now)).await;
			delay = (delay * 2).min(POLL_CAP);
		}
	}

	/// Reads `document.activeElement.id`, or `None` when nothing with an id
	/// has focus.
	pub async fn focused_element_id(&self) -> Result<Option<String>> {
		let value = self
			.page
			.evaluate_function("() => { const el = document.activeElement; return el && el.id ? el.id : null; }")
			.await?;
		match value {
			Value::String(id) => Ok(Some(id)),
			_ => Ok(None),
		}
	}

	/// Patterns of registered mocks that never matched a request.
	pub fn unused_mock_patterns(&self) -> Vec<String> {
		self.rules
			.lock()
			.iter()
			.filter(|rule| rule.hits.load(Ordering::SeqCst) == 0)
			.map(|rule| rule.pattern.clone())
			.collect()
	}

	/// Ends the scenario, unregistering its route handlers.
	///
	/// With strict mocks enabled, fails when any rule finished unused.
	pub fn finish(self) -> Result<()> {
		if self.strict_mocks {
			if let Some(pattern) = self.unused_mock_patterns().into_iter().next() {
				return Err(Error::UnusedMock { pattern });
			}
		}
		Ok(())
	}
}

impl std::fmt::Debug for Scenario {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scenario")
			.field("base_url", &self.base_url)
			.field("assert_timeout", &self.assert_timeout)
			.field("strict_mocks", &self.strict_mocks)
			.field("rules", &self.rules.lock().len())
			.finish()
	}
}

/// Answers an intercepted request from the rule list, or lets it through.
async fn dispatch_mock(rules: &Mutex<Vec<RegisteredRule>>, route: crate::Route) -> drover_runtime::Result<()> {
	let url = route.request().url().to_string();
	let method = route.request().method().to_string();

	let verdict = {
		let rules = rules.lock();
		find_rule(&rules, &url, &method).map(|i| {
			let rule = &rules[i];
			rule.hits.fetch_add(1, Ordering::SeqCst);
			(rule.status, rule.content_type.clone(), rule.body.clone())
		})
	};

	match verdict {
		Some((status, content_type, body)) => {
			tracing::debug!(%method, %url, status, "fulfilling from mock");
			route
				.fulfill(FulfillOptions {
					status: Some(status),
					content_type: Some(content_type),
					body: Some(body),
					..Default::default()
				})
				.await
		}
		None => {
			tracing::debug!(%method, %url, "no mock matched, continuing");
			route.continue_().await
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rule(pattern: &str) -> RegisteredRule {
		RegisteredRule::compile(MockRule::new(pattern))
	}

	#[test]
	fn mock_rule_defaults_to_empty_json_ok() {
		let rule = MockRule::new("**/api/playlist*");
		assert_eq!(rule.status, 200);
		assert_eq!(rule.content_type, "application/json");
		assert_eq!(rule.body, "{}");
		assert!(rule.method.is_none());
	}

	#[test]
	fn mock_rule_json_builder_serializes_body() {
		let rule = MockRule::new("**/api/search*").json(&serde_json::json!({
			"results": [{ "id": "song1", "title": "Numb", "artist": "Linkin Park" }]
		}));
		assert!(rule.body.contains(r#""title":"Numb""#));
		assert_eq!(rule.content_type, "application/json");
	}

	#[test]
	fn find_rule_last_registered_wins() {
		let rules = vec![rule("**/api/playlist*"), rule("**/api/*")];
		let found = find_rule(&rules, "http://127.0.0.1:5050/api/playlist", "GET");
		assert_eq!(found, Some(1));
	}

	#[test]
	fn find_rule_respects_method() {
		let rules = vec![
			RegisteredRule::compile(MockRule::new("**/api/add/*").method("POST")),
			RegisteredRule::compile(MockRule::new("**/api/add/*").method("DELETE")),
		];
		let found = find_rule(&rules, "http://127.0.0.1:5050/api/add/song1", "POST");
		assert_eq!(found, Some(0));
	}

	#[test]
	fn find_rule_skips_unmatched_urls() {
		let rules = vec![rule("**/api/search*")];
		assert_eq!(find_rule(&rules, "http://localhost:5173/index.html", "GET"), None);
	}

	#[test]
	fn resolve_url_joins_relative_targets() {
		assert_eq!(
			resolve_url("http://localhost:5173", "/index.html"),
			"http://localhost:5173/index.html"
		);
		assert_eq!(
			resolve_url("http://localhost:5173/", "index.html"),
			"http://localhost:5173/index.html"
		);
	}

	#[test]
	fn resolve_url_passes_absolute_targets_through() {
		assert_eq!(
			resolve_url("http://localhost:5173", "http://127.0.0.1:5050/api/ping"),
			"http://127.0.0.1:5050/api/ping"
		);
	}

	#[test]
	fn inject_expression_escapes_literals() {
		let expr = inject_expression("#results", r#"<div class="song-item">Numb</div>"#);
		assert!(expr.contains(r##""#results""##));
		assert!(expr.contains(r#"\"song-item\""#));
		assert!(expr.contains("return true"));
	}

	#[test]
	fn text_probe_expression_handles_quotes() {
		let expr = text_probe_expression("[data-name=\"q\"]");
		assert!(expr.contains(r#"[data-name=\"q\"]"#));
		assert!(expr.contains("innerText"));
	}

	#[test]
	fn unused_patterns_reports_only_unhit_rules() {
		let hit = rule("**/api/search*");
		hit.hits.fetch_add(1, Ordering::SeqCst);
		let rules = vec![hit, rule("**/api/playlist*")];

		let unused: Vec<&str> = rules
			.iter()
			.filter(|r| r.hits.load(Ordering::SeqCst) == 0)
			.map(|r| r.pattern.as_str())
			.collect();
		assert_eq!(unused, vec!["**/api/playlist*"]);
	}
}
