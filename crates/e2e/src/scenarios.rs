//! The scenario catalog: seven user flows against the playlist builder.
//!
//! Each scenario drives a fresh page through one flow with every backend
//! call mocked. Flows that need pre-existing rows inject the same markup
//! the frontend renders, so a click on `.action-add` or `.action-remove`
//! hits the app's real event delegation.

use std::future::Future;
use std::pin::Pin;

use drover::{DialogAnswer, MockRule, Scenario};

use crate::fixtures::{
	Api, BLINDING_LIGHTS, ExportUrl, NUMB, Playlist, SPOTIFY_AUTHORIZE_URL, SearchResults,
};

pub type ScenarioFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// A scenario body. Plain function pointers keep the catalog a flat table.
pub type ScenarioFn = for<'a> fn(&'a Scenario, &'a Api) -> ScenarioFuture<'a>;

/// One named scenario.
#[derive(Clone, Copy)]
pub struct Spec {
	pub name: &'static str,
	pub run: ScenarioFn,
}

/// The full catalog, in execution order.
pub fn all() -> Vec<Spec> {
	vec![
		Spec {
			name: "zeigt Fehlermeldung bei leerer Suche",
			run: empty_search_shows_error,
		},
		Spec {
			name: "führt erfolgreiche Suche aus und zeigt Ergebnisse",
			run: search_renders_mocked_results,
		},
		Spec {
			name: "fügt Song zur Playlist hinzu",
			run: add_song_updates_playlist,
		},
		Spec {
			name: "entfernt Song aus Playlist",
			run: remove_song_shows_confirmation,
		},
		Spec {
			name: "exportiert Playlist zu Spotify",
			run: export_opens_spotify_popup,
		},
		Spec {
			name: "Shortcut \"/\" fokussiert das Suchfeld",
			run: slash_shortcut_focuses_search,
		},
		Spec {
			name: "lädt leere Playlist beim Start",
			run: fresh_load_shows_empty_playlist,
		},
	]
}

/// A rendered search hit, as the frontend builds it for [`NUMB`].
const SEARCH_RESULT_ROW: &str = r#"<article class="song-item" data-id="song1">
	<div class="meta">
		<span class="title">Numb</span>
		<span class="artist">Linkin Park</span>
	</div>
	<div class="row-actions">
		<button class="icon-btn action-add" title="Hinzufügen"><i class="fa-solid fa-plus"></i></button>
	</div>
</article>"#;

/// A rendered playlist row, as the frontend builds it for [`NUMB`].
const PLAYLIST_ROW: &str = r#"<tr data-id="song1">
	<td>1</td>
	<td><span class="title">Numb</span></td>
	<td class="col-artist"><span class="artist">Linkin Park</span></td>
	<td class="col-actions">
		<button class="icon-btn danger action-remove" title="Entfernen"><i class="fa-solid fa-trash"></i></button>
	</td>
</tr>"#;

/// Searching with an empty field shows the validation message.
fn empty_search_shows_error<'a>(scenario: &'a Scenario, _api: &'a Api) -> ScenarioFuture<'a> {
	Box::pin(async move {
		scenario.goto("/").await?;
		scenario.click("#btn-search").await?;
		scenario.expect_text("body", "Bitte Suchbegriff eingeben.").await?;
		Ok(())
	})
}

/// A search renders the mocked hits as `.song-item` rows.
fn search_renders_mocked_results<'a>(scenario: &'a Scenario, api: &'a Api) -> ScenarioFuture<'a> {
	Box::pin(async move {
		scenario.goto("/").await?;
		let hits = serde_json::to_value(SearchResults {
			results: vec![NUMB, BLINDING_LIGHTS],
		})?;
		scenario.mock(MockRule::new(api.search()).json(&hits)).await?;
		scenario.fill("#q", "test").await?;
		scenario.click("#btn-search").await?;
		scenario.expect_count(".song-item", 2).await?;
		scenario.expect_text(".song-item", "Numb").await?;
		Ok(())
	})
}

/// Adding a hit posts to the backend, toasts, and re-renders the playlist.
fn add_song_updates_playlist<'a>(scenario: &'a Scenario, api: &'a Api) -> ScenarioFuture<'a> {
	Box::pin(async move {
		scenario.goto("/").await?;
		scenario.mock(MockRule::new(api.add(NUMB.id))).await?;
		let playlist = serde_json::to_value(Playlist {
			playlist: vec![NUMB],
		})?;
		scenario.mock(MockRule::new(api.playlist()).json(&playlist)).await?;
		scenario.inject_html("#results", SEARCH_RESULT_ROW).await?;
		scenario.click(".action-add").await?;
		scenario.expect_text("body", "Titel hinzugefügt").await?;
		scenario.expect_count("#playlist-body tr", 1).await?;
		scenario.expect_text("#playlist-body", "Numb").await?;
		Ok(())
	})
}

/// Removing a playlist row posts to the backend and toasts.
fn remove_song_shows_confirmation<'a>(scenario: &'a Scenario, api: &'a Api) -> ScenarioFuture<'a> {
	Box::pin(async move {
		scenario.goto("/").await?;
		scenario.mock(MockRule::new(api.remove(NUMB.id))).await?;
		let playlist = serde_json::to_value(Playlist { playlist: vec![] })?;
		scenario.mock(MockRule::new(api.playlist()).json(&playlist)).await?;
		scenario.inject_html("#playlist-body", PLAYLIST_ROW).await?;
		scenario.click(".action-remove").await?;
		scenario.expect_text("body", "Titel entfernt").await?;
		Ok(())
	})
}

/// Exporting prompts for a name, then opens the authorize URL in a popup.
fn export_opens_spotify_popup<'a>(scenario: &'a Scenario, api: &'a Api) -> ScenarioFuture<'a> {
	Box::pin(async move {
		scenario.goto("/").await?;
		let export = serde_json::to_value(ExportUrl {
			url: SPOTIFY_AUTHORIZE_URL.to_string(),
		})?;
		scenario
			.mock(MockRule::new(api.spotify_create_url("My Playlist")).json(&export))
			.await?;
		scenario.arm_dialog(DialogAnswer::Accept(Some("My Playlist".to_string())));
		let url = scenario
			.expect_popup(async { scenario.click("#btn-export").await })
			.await?;
		anyhow::ensure!(
			url.contains("spotify.com/authorize/test"),
			"popup opened an unexpected url: {url}"
		);
		Ok(())
	})
}

/// The `/` shortcut moves focus into the search field.
fn slash_shortcut_focuses_search<'a>(scenario: &'a Scenario, _api: &'a Api) -> ScenarioFuture<'a> {
	Box::pin(async move {
		scenario.goto("/").await?;
		scenario.press_key("/").await?;
		let focused = scenario.focused_element_id().await?;
		anyhow::ensure!(
			focused.as_deref() == Some("q"),
			"expected the search field to take focus, got {focused:?}"
		);
		Ok(())
	})
}

/// A fresh load with an empty backend playlist shows the placeholder row.
fn fresh_load_shows_empty_playlist<'a>(scenario: &'a Scenario, api: &'a Api) -> ScenarioFuture<'a> {
	Box::pin(async move {
		scenario.goto("/").await?;
		let playlist = serde_json::to_value(Playlist { playlist: vec![] })?;
		scenario.mock(MockRule::new(api.playlist()).json(&playlist)).await?;
		scenario.reload().await?;
		scenario.expect_text("#playlist-body", "Noch keine Titel").await?;
		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn catalog_has_seven_scenarios() {
		assert_eq!(all().len(), 7);
	}

	#[test]
	fn catalog_names_are_unique() {
		let specs = all();
		let names: HashSet<&str> = specs.iter().map(|s| s.name).collect();
		assert_eq!(names.len(), specs.len());
	}

	#[test]
	fn injected_fragments_carry_action_buttons() {
		assert!(SEARCH_RESULT_ROW.contains(r#"data-id="song1""#));
		assert!(SEARCH_RESULT_ROW.contains("action-add"));
		assert!(PLAYLIST_ROW.contains(r#"data-id="song1""#));
		assert!(PLAYLIST_ROW.contains("action-remove"));
	}
}
