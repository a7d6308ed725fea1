//! Core protocol types used across the wire.
//!
//! These types represent primitive values and enums used in the driver protocol.

use serde::{Deserialize, Serialize};

/// A name/value pair as it appears in protocol header lists.
///
/// The driver represents HTTP headers as an ordered list rather than a map so
/// that duplicate header names survive the round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
	/// Header name
	pub name: String,
	/// Header value
	pub value: String,
}

impl NameValue {
	/// Creates a new name/value pair.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
		}
	}
}

/// Mouse button for click actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
	/// Left mouse button (default)
	Left,
	/// Right mouse button
	Right,
	/// Middle mouse button
	Middle,
}

/// Keyboard modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyboardModifier {
	/// Alt key
	Alt,
	/// Control key
	Control,
	/// Meta key (Command on macOS, Windows key on Windows)
	Meta,
	/// Shift key
	Shift,
	/// Control on Windows/Linux, Meta on macOS
	ControlOrMeta,
}

/// Position for click actions.
///
/// Coordinates are relative to the top-left corner of the element's padding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
	/// X coordinate
	pub x: f64,
	/// Y coordinate
	pub y: f64,
}

/// Screenshot image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotType {
	/// PNG format (lossless, supports transparency)
	Png,
	/// JPEG format (lossy compression, smaller file size)
	Jpeg,
}

/// Page load state for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
	/// Consider navigation finished after the `load` event fires
	#[default]
	Load,
	/// Consider navigation finished when the DOMContentLoaded event fires
	#[serde(rename = "domcontentloaded")]
	DomContentLoaded,
	/// Consider navigation finished when there are no network connections for at least 500ms
	#[serde(rename = "networkidle")]
	NetworkIdle,
	/// Consider navigation finished once the response arrives and the document
	/// starts loading
	Commit,
}

/// Viewport dimensions for a browser context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
	/// Page width in pixels
	pub width: i32,
	/// Page height in pixels
	pub height: i32,
}
