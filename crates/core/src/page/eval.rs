//! JavaScript evaluation methods for [`Page`].

use drover_runtime::Result;

use super::Page;

impl Page {
	/// Evaluates a JavaScript expression in the page, discarding the result.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-evaluate>
	pub async fn evaluate(&self, expression: &str) -> Result<()> {
		self.main_frame()?.evaluate(expression, false).await?;
		Ok(())
	}

	/// Evaluates a JavaScript expression and returns the result as JSON.
	///
	/// # Errors
	///
	/// Returns [`Error::Remote`](drover_runtime::Error::Remote) when the
	/// expression throws.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-evaluate>
	pub async fn evaluate_json(&self, expression: &str) -> Result<serde_json::Value> {
		self.main_frame()?.evaluate(expression, false).await
	}

	/// Invokes a JavaScript function literal in the page and returns the
	/// result as JSON.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-evaluate>
	pub async fn evaluate_function(&self, body: &str) -> Result<serde_json::Value> {
		self.main_frame()?.evaluate(body, true).await
	}

	/// Evaluates a JavaScript expression and deserializes the result to `T`.
	///
	/// See <https://playwright.dev/docs/api/class-page#page-evaluate>
	pub async fn evaluate_typed<T: serde::de::DeserializeOwned>(&self, expression: &str) -> Result<T> {
		self.main_frame()?.evaluate_typed(expression, false).await
	}
}
