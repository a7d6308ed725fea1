//! Canned backend data and mock-route addresses.
//!
//! The scenarios never talk to a real backend; every response they see is
//! built from the fixtures here. Keeping the payload shapes in one place
//! also documents the API contract the frontend codes against.

use serde::Serialize;

/// A track as the backend returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Song {
	pub id: &'static str,
	pub title: &'static str,
	pub artist: &'static str,
}

/// The track most scenarios add, remove, and assert on.
pub const NUMB: Song = Song {
	id: "song1",
	title: "Numb",
	artist: "Linkin Park",
};

/// Second search hit, only ever rendered in result lists.
pub const BLINDING_LIGHTS: Song = Song {
	id: "song2",
	title: "Blinding Lights",
	artist: "The Weeknd",
};

/// Authorize URL the mocked export endpoint hands back.
pub const SPOTIFY_AUTHORIZE_URL: &str = "https://spotify.com/authorize/test";

/// Envelope for `GET /search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
	pub results: Vec<Song>,
}

/// Envelope for `GET /playlist` and the add/remove endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
	pub playlist: Vec<Song>,
}

/// Envelope for `GET /spotify/create-url`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportUrl {
	pub url: String,
}

/// Builds the mock-route addresses for one backend origin.
#[derive(Debug, Clone)]
pub struct Api {
	base: String,
}

impl Api {
	pub fn new(base: impl Into<String>) -> Self {
		let mut base = base.into();
		while base.ends_with('/') {
			base.pop();
		}
		Self { base }
	}

	pub fn base(&self) -> &str {
		&self.base
	}

	/// Search endpoint. The trailing `*` tolerates any query string.
	pub fn search(&self) -> String {
		format!("{}/search*", self.base)
	}

	pub fn add(&self, id: &str) -> String {
		format!("{}/add/{id}", self.base)
	}

	pub fn remove(&self, id: &str) -> String {
		format!("{}/remove/{id}", self.base)
	}

	pub fn playlist(&self) -> String {
		format!("{}/playlist", self.base)
	}

	/// Export endpoint including the percent-encoded playlist name, exactly
	/// as the frontend requests it.
	pub fn spotify_create_url(&self, name: &str) -> String {
		format!("{}/spotify/create-url?name={}", self.base, name.replace(' ', "%20"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn song_serializes_in_field_order() {
		let json = serde_json::to_string(&NUMB).unwrap();
		assert_eq!(json, r#"{"id":"song1","title":"Numb","artist":"Linkin Park"}"#);
	}

	#[test]
	fn search_results_envelope_wraps_the_hits() {
		let payload = SearchResults {
			results: vec![NUMB, BLINDING_LIGHTS],
		};
		let json = serde_json::to_string(&payload).unwrap();
		assert_eq!(
			json,
			concat!(
				r#"{"results":[{"id":"song1","title":"Numb","artist":"Linkin Park"},"#,
				r#"{"id":"song2","title":"Blinding Lights","artist":"The Weeknd"}]}"#
			)
		);
	}

	#[test]
	fn empty_playlist_envelope() {
		let json = serde_json::to_string(&Playlist { playlist: vec![] }).unwrap();
		assert_eq!(json, r#"{"playlist":[]}"#);
	}

	#[test]
	fn export_url_envelope() {
		let payload = ExportUrl {
			url: SPOTIFY_AUTHORIZE_URL.to_string(),
		};
		let json = serde_json::to_string(&payload).unwrap();
		assert_eq!(json, r#"{"url":"https://spotify.com/authorize/test"}"#);
	}

	#[test]
	fn api_builds_the_expected_addresses() {
		let api = Api::new("http://127.0.0.1:5050");
		assert_eq!(api.search(), "http://127.0.0.1:5050/search*");
		assert_eq!(api.add("song1"), "http://127.0.0.1:5050/add/song1");
		assert_eq!(api.remove("song1"), "http://127.0.0.1:5050/remove/song1");
		assert_eq!(api.playlist(), "http://127.0.0.1:5050/playlist");
	}

	#[test]
	fn api_trims_trailing_slashes() {
		let api = Api::new("http://127.0.0.1:5050/");
		assert_eq!(api.base(), "http://127.0.0.1:5050");
		assert_eq!(api.playlist(), "http://127.0.0.1:5050/playlist");
	}

	#[test]
	fn export_address_percent_encodes_spaces() {
		let api = Api::new("http://127.0.0.1:5050");
		assert_eq!(
			api.spotify_create_url("My Playlist"),
			"http://127.0.0.1:5050/spotify/create-url?name=My%20Playlist"
		);
	}
}
