//! Controller behavior tests
//!
//! Tests cover:
//! - List loading into selectors (order, value/label)
//! - Effective identifier resolution in both source modes
//! - Mode switching on catalog pick
//! - Play/stop ordering and idempotent stop
//! - Canonical, download and share links
//! - Restoring a deep link at load
//! - Load failure policy and invalid selections

use kphone_common::{CatalogEntry, PersistedSelection, SelectOption, ShareState, SourceMode};
use kphone_ui::{
    CatalogList, Controller, ControllerSettings, LoadStatus, PlaybackSession, PlaybackState,
    Player, UiError, UiEvent, View,
};

// =============================================================================
// Test doubles
// =============================================================================

#[derive(Debug, Default)]
struct RecordingView {
    catalog_options: Vec<SelectOption>,
    scale_options: Vec<SelectOption>,
    catalog_selection: Option<String>,
    scale_selection: Option<String>,
    speed_selection: Option<u32>,
    source_mode: Option<SourceMode>,
    free_text: String,
    plot_src: Option<String>,
    plot_updates: usize,
    share: Option<ShareState>,
    history: Vec<String>,
    playback_enabled: Option<bool>,
    listening: Option<String>,
    notices: Vec<String>,
}

impl View for RecordingView {
    fn set_catalog_options(&mut self, options: &[SelectOption]) {
        self.catalog_options = options.to_vec();
    }

    fn set_scale_options(&mut self, options: &[SelectOption]) {
        self.scale_options = options.to_vec();
    }

    fn set_catalog_selection(&mut self, id: Option<&str>) {
        self.catalog_selection = id.map(str::to_string);
    }

    fn set_scale_selection(&mut self, scale: Option<&str>) {
        self.scale_selection = scale.map(str::to_string);
    }

    fn set_speed_selection(&mut self, speed: u32) {
        self.speed_selection = Some(speed);
    }

    fn set_source_mode(&mut self, mode: SourceMode) {
        self.source_mode = Some(mode);
    }

    fn set_free_text(&mut self, text: &str) {
        self.free_text = text.to_string();
    }

    fn set_plot_src(&mut self, src: &str) {
        self.plot_src = Some(src.to_string());
        self.plot_updates += 1;
    }

    fn set_share_state(&mut self, share: &ShareState) {
        self.share = Some(share.clone());
    }

    fn replace_history(&mut self, url: &str) {
        self.history.push(url.to_string());
    }

    fn set_playback_enabled(&mut self, enabled: bool) {
        self.playback_enabled = Some(enabled);
    }

    fn set_listening(&mut self, message: Option<&str>) {
        self.listening = message.map(str::to_string);
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlayerCall {
    Stop,
    Play(String),
}

#[derive(Debug, Default)]
struct RecordingPlayer {
    calls: Vec<PlayerCall>,
    fail_next_play: bool,
    sessions: PlaybackSession,
}

impl Player for RecordingPlayer {
    fn play(&mut self, path: &str) -> kphone_ui::Result<PlaybackSession> {
        self.calls.push(PlayerCall::Play(path.to_string()));
        if self.fail_next_play {
            self.fail_next_play = false;
            return Err(UiError::Playback("device busy".to_string()));
        }
        self.sessions += 1;
        Ok(self.sessions)
    }

    fn stop(&mut self) {
        self.calls.push(PlayerCall::Stop);
    }
}

type TestController = Controller<RecordingView, RecordingPlayer>;

fn settings() -> ControllerSettings {
    ControllerSettings {
        origin: "http://host".to_string(),
        hashtag: "keplerphone".to_string(),
        speeds: vec![1, 2, 4, 8],
        default_speed: 4,
    }
}

fn controller() -> TestController {
    let mut controller = Controller::new(
        RecordingView::default(),
        RecordingPlayer::default(),
        settings(),
    );
    controller.initialize(None);
    controller
}

fn catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("K00752.01", "Kepler-227 b"),
        CatalogEntry::new("10666592", "K00002.01"),
        CatalogEntry::new("11446443", "K00001.01"),
    ]
}

fn scales() -> Vec<String> {
    vec!["major".to_string(), "C major".to_string(), "blues".to_string()]
}

fn loaded_controller() -> TestController {
    let mut controller = controller();
    controller.handle(UiEvent::CatalogLoaded(Ok(catalog()))).unwrap();
    controller.handle(UiEvent::ScalesLoaded(Ok(scales()))).unwrap();
    controller
}

// =============================================================================
// Catalog loading
// =============================================================================

#[test]
fn test_catalog_options_match_response() {
    let controller = loaded_controller();
    let options = &controller.view().catalog_options;

    assert_eq!(options.len(), 3);
    for (option, entry) in options.iter().zip(catalog()) {
        assert_eq!(option.value, entry.id);
        assert_eq!(option.label, entry.name);
    }
    assert_eq!(controller.view().catalog_selection.as_deref(), Some("K00752.01"));
}

#[test]
fn test_scale_options_match_response() {
    let controller = loaded_controller();
    let options = &controller.view().scale_options;

    let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(values, ["major", "C major", "blues"]);
    assert_eq!(labels, values);
    assert_eq!(controller.view().scale_selection.as_deref(), Some("major"));
}

#[test]
fn test_lists_may_arrive_in_either_order() {
    let mut controller = controller();
    controller.handle(UiEvent::ScalesLoaded(Ok(scales()))).unwrap();
    assert!(controller.view().share.is_none());

    controller.handle(UiEvent::CatalogLoaded(Ok(catalog()))).unwrap();
    let share = controller.view().share.as_ref().unwrap();
    assert_eq!(share.canonical_url, "http://host/K00752.01/major/4");
}

#[test]
fn test_empty_catalog_leaves_no_selection() {
    let mut controller = controller();
    controller.handle(UiEvent::CatalogLoaded(Ok(Vec::new()))).unwrap();

    assert!(controller.view().catalog_options.is_empty());
    assert_eq!(controller.selection().effective_id(), None);
    assert_eq!(controller.load_status(CatalogList::Ids), LoadStatus::Loaded);
}

// =============================================================================
// Identifier resolution and mode switching
// =============================================================================

#[test]
fn test_effective_id_follows_source_mode() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::FreeTextEdited("12345".to_string())).unwrap();

    // Typing does not switch mode
    assert_eq!(controller.selection().source_mode, SourceMode::Catalog);
    assert_eq!(controller.selection().effective_id(), Some("K00752.01"));

    controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();
    assert_eq!(controller.selection().effective_id(), Some("12345"));
    assert_eq!(controller.view().plot_src.as_deref(), Some("/img/12345"));

    controller.handle(UiEvent::ModeChosen(SourceMode::Catalog)).unwrap();
    assert_eq!(controller.selection().effective_id(), Some("K00752.01"));
}

#[test]
fn test_catalog_pick_forces_catalog_mode_and_stops() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::FreeTextEdited("12345".to_string())).unwrap();
    controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();
    controller.handle(UiEvent::Play).unwrap();
    assert_eq!(controller.playback_state(), PlaybackState::Playing);

    controller.handle(UiEvent::CatalogPicked("10666592".to_string())).unwrap();

    assert_eq!(controller.selection().source_mode, SourceMode::Catalog);
    assert_eq!(controller.view().source_mode, Some(SourceMode::Catalog));
    assert_eq!(controller.view().plot_src.as_deref(), Some("/img/10666592"));
    assert_eq!(controller.playback_state(), PlaybackState::Stopped);
    assert_eq!(controller.player().calls.last(), Some(&PlayerCall::Stop));
    assert!(controller
        .player()
        .calls
        .iter()
        .all(|c| !matches!(c, PlayerCall::Play(p) if p.contains("10666592"))));
}

#[test]
fn test_free_text_edit_does_not_refresh_plot() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();
    let updates = controller.view().plot_updates;

    controller.handle(UiEvent::FreeTextEdited("12345".to_string())).unwrap();
    assert_eq!(controller.view().plot_updates, updates);
}

#[test]
fn test_unknown_options_rejected() {
    let mut controller = loaded_controller();

    let result = controller.handle(UiEvent::CatalogPicked("999".to_string()));
    assert!(matches!(result, Err(UiError::UnknownOption { control: "object", .. })));

    let result = controller.handle(UiEvent::ScaleChosen("lydian".to_string()));
    assert!(matches!(result, Err(UiError::UnknownOption { control: "scale", .. })));

    let result = controller.handle(UiEvent::SpeedChosen(3));
    assert!(matches!(result, Err(UiError::UnknownOption { control: "speed", .. })));

    let selection = controller.selection();
    assert_eq!(selection.catalog_id.as_deref(), Some("K00752.01"));
    assert_eq!(selection.scale.as_deref(), Some("major"));
    assert_eq!(selection.speed, 4);
}

// =============================================================================
// Play and stop
// =============================================================================

#[test]
fn test_stop_without_playback_is_harmless() {
    let mut controller = controller();
    controller.handle(UiEvent::Stop).unwrap();
    controller.handle(UiEvent::Stop).unwrap();

    assert_eq!(controller.playback_state(), PlaybackState::Stopped);
    assert_eq!(controller.player().calls, vec![PlayerCall::Stop, PlayerCall::Stop]);
}

#[test]
fn test_play_always_stops_first() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::Play).unwrap();
    controller.handle(UiEvent::ScaleChosen("C major".to_string())).unwrap();
    controller.handle(UiEvent::Play).unwrap();

    assert_eq!(
        controller.player().calls,
        vec![
            PlayerCall::Stop,
            PlayerCall::Play("/keplerphone/K00752.01/major/4".to_string()),
            PlayerCall::Stop,
            PlayerCall::Play("/keplerphone/K00752.01/C%20major/4".to_string()),
        ]
    );
    assert_eq!(controller.playback_state(), PlaybackState::Playing);
}

#[test]
fn test_play_updates_plot_persists_and_listens() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::SpeedChosen(8)).unwrap();
    controller.handle(UiEvent::Play).unwrap();

    let view = controller.view();
    assert_eq!(view.plot_src.as_deref(), Some("/img/K00752.01"));
    assert_eq!(
        view.listening.as_deref(),
        Some("Listening to KICK00752.01 on The KeplerPhone")
    );
    assert_eq!(view.history.last().map(String::as_str), Some("http://host/K00752.01/major/8"));

    let persisted = controller.persisted().unwrap();
    assert_eq!(persisted.id, "K00752.01");
    assert_eq!(persisted.scale.as_deref(), Some("major"));
    assert_eq!(persisted.speed, Some(8));
}

#[test]
fn test_stop_clears_listening_and_refreshes_links() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::Play).unwrap();
    let history_len = controller.view().history.len();

    controller.handle(UiEvent::Stop).unwrap();

    assert_eq!(controller.playback_state(), PlaybackState::Stopped);
    assert_eq!(controller.view().listening, None);
    assert_eq!(controller.view().history.len(), history_len + 1);
}

#[test]
fn test_play_refuses_empty_identifier() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();

    let result = controller.handle(UiEvent::Play);

    assert!(matches!(result, Err(UiError::EmptyIdentifier)));
    assert_eq!(controller.player().calls, vec![PlayerCall::Stop]);
    assert_eq!(controller.playback_state(), PlaybackState::Stopped);
    assert_eq!(controller.view().notices.len(), 1);
}

#[test]
fn test_play_refuses_identifier_with_slash() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::FreeTextEdited("12/34".to_string())).unwrap();
    controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();

    let result = controller.handle(UiEvent::Play);
    assert!(matches!(result, Err(UiError::InvalidIdentifier(_))));
    assert!(!controller.player().calls.iter().any(|c| matches!(c, PlayerCall::Play(_))));
}

#[test]
fn test_play_refuses_identifier_with_url_delimiters() {
    for raw in ["123?x#y", "123#y", "12%2F34"] {
        let mut controller = loaded_controller();
        controller.handle(UiEvent::FreeTextEdited(raw.to_string())).unwrap();
        controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();

        let result = controller.handle(UiEvent::Play);

        assert!(matches!(result, Err(UiError::InvalidIdentifier(_))), "{}", raw);
        assert_eq!(controller.player().calls, vec![PlayerCall::Stop]);
        assert_eq!(controller.playback_state(), PlaybackState::Stopped);
        assert!(controller.persisted().is_none());
        let view = controller.view();
        assert!(view.history.iter().all(|url| !url.contains(raw)));
        assert!(view
            .share
            .as_ref()
            .map_or(true, |share| !share.canonical_url.contains(raw)));
    }
}

#[test]
fn test_played_canonical_link_restores_same_selection() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::FreeTextEdited("K00752.01-b".to_string())).unwrap();
    controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();
    controller.handle(UiEvent::ScaleChosen("C major".to_string())).unwrap();
    controller.handle(UiEvent::Play).unwrap();

    let link = controller.view().history.last().unwrap().clone();
    let restored = PersistedSelection::from_link(&link).unwrap();

    assert_eq!(Some(&restored), controller.persisted());
    assert_eq!(restored.id, "K00752.01-b");
    assert_eq!(restored.scale.as_deref(), Some("C major"));
}

#[test]
fn test_play_refuses_without_scale() {
    let mut controller = controller();
    controller.handle(UiEvent::CatalogLoaded(Ok(catalog()))).unwrap();

    let result = controller.handle(UiEvent::Play);
    assert!(matches!(result, Err(UiError::NoScale)));
}

#[test]
fn test_player_failure_leaves_stopped() {
    let player = RecordingPlayer {
        fail_next_play: true,
        ..RecordingPlayer::default()
    };
    let mut controller = Controller::new(RecordingView::default(), player, settings());
    controller.initialize(None);
    controller.handle(UiEvent::CatalogLoaded(Ok(catalog()))).unwrap();
    controller.handle(UiEvent::ScalesLoaded(Ok(scales()))).unwrap();

    let result = controller.handle(UiEvent::Play);
    assert!(matches!(result, Err(UiError::Playback(_))));
    assert_eq!(controller.playback_state(), PlaybackState::Stopped);
    assert_eq!(controller.view().listening, None);
    assert_eq!(controller.view().notices.len(), 1);

    // No retry; the next explicit play goes through
    controller.handle(UiEvent::Play).unwrap();
    assert_eq!(controller.playback_state(), PlaybackState::Playing);
}

#[test]
fn test_playback_end_of_current_session_stops() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::Play).unwrap();

    controller
        .handle(UiEvent::PlaybackEnded {
            session: 1,
            error: Some("connection reset".to_string()),
        })
        .unwrap();

    assert_eq!(controller.playback_state(), PlaybackState::Stopped);
    assert!(controller.view().notices[0].contains("connection reset"));
}

#[test]
fn test_stale_playback_end_is_ignored() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::Play).unwrap();
    controller.handle(UiEvent::Play).unwrap();

    controller
        .handle(UiEvent::PlaybackEnded {
            session: 1,
            error: None,
        })
        .unwrap();

    assert_eq!(controller.playback_state(), PlaybackState::Playing);
}

// =============================================================================
// Links
// =============================================================================

#[test]
fn test_canonical_url_form() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::SpeedChosen(4)).unwrap();

    let share = controller.view().share.as_ref().unwrap();
    assert_eq!(share.canonical_url, "http://host/K00752.01/major/4");
    assert_eq!(
        controller.view().history.last().map(String::as_str),
        Some("http://host/K00752.01/major/4")
    );
}

#[test]
fn test_scale_encoded_in_download_and_share_links() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::ScaleChosen("C major".to_string())).unwrap();

    let share = controller.view().share.as_ref().unwrap();
    assert_eq!(share.download_href, "/keplerphone/K00752.01/C%20major/4");
    assert!(share.share_href.contains("C%20major"));
    assert!(share
        .share_href
        .contains("&url=http%3A%2F%2Fhost%2FK00752.01%2FC%20major%2F4"));
    assert!(share.share_href.contains("&hashtags=keplerphone"));
}

#[test]
fn test_links_follow_free_text_in_free_mode() {
    let mut controller = loaded_controller();
    controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();
    controller.handle(UiEvent::FreeTextEdited("12345".to_string())).unwrap();

    let share = controller.view().share.as_ref().unwrap();
    assert_eq!(share.canonical_url, "http://host/12345/major/4");
}

// =============================================================================
// Deep link restore
// =============================================================================

#[test]
fn test_persisted_selection_seeds_free_mode() {
    let mut controller =
        Controller::new(RecordingView::default(), RecordingPlayer::default(), settings());
    let persisted = PersistedSelection::from_link("/12345/blues/2");
    controller.initialize(persisted);

    let view = controller.view();
    assert_eq!(view.free_text, "12345");
    assert_eq!(view.source_mode, Some(SourceMode::Free));
    assert_eq!(view.plot_src.as_deref(), Some("/img/12345"));
    assert_eq!(view.speed_selection, Some(2));
    assert_eq!(view.history.last().map(String::as_str), Some("http://host/12345/blues/2"));
    assert!(controller.player().calls.is_empty());
}

#[test]
fn test_persisted_scale_restored_after_scales_load() {
    let mut controller =
        Controller::new(RecordingView::default(), RecordingPlayer::default(), settings());
    controller.initialize(PersistedSelection::from_link("/12345/blues/4"));
    controller.handle(UiEvent::ScalesLoaded(Ok(scales()))).unwrap();

    assert_eq!(controller.selection().scale.as_deref(), Some("blues"));
    assert_eq!(controller.view().scale_selection.as_deref(), Some("blues"));
}

#[test]
fn test_unknown_persisted_scale_falls_back_to_first() {
    let mut controller =
        Controller::new(RecordingView::default(), RecordingPlayer::default(), settings());
    controller.initialize(PersistedSelection::from_link("/12345/lydian/16"));
    controller.handle(UiEvent::ScalesLoaded(Ok(scales()))).unwrap();

    assert_eq!(controller.selection().scale.as_deref(), Some("major"));
    // 16 is not offered
    assert_eq!(controller.selection().speed, 4);
}

// =============================================================================
// Load failures
// =============================================================================

#[test]
fn test_failed_list_disables_playback() {
    let mut controller = controller();
    controller
        .handle(UiEvent::CatalogLoaded(Err(UiError::Status(500, "boom".to_string()))))
        .unwrap();
    controller.handle(UiEvent::ScalesLoaded(Ok(scales()))).unwrap();

    assert!(controller.view().catalog_options.is_empty());
    assert_eq!(controller.view().playback_enabled, Some(false));
    assert_eq!(controller.load_status(CatalogList::Ids), LoadStatus::Failed);
    assert_eq!(controller.failed_lists(), vec![CatalogList::Ids]);

    controller.handle(UiEvent::FreeTextEdited("12345".to_string())).unwrap();
    controller.handle(UiEvent::ModeChosen(SourceMode::Free)).unwrap();
    let result = controller.handle(UiEvent::Play);
    assert!(matches!(result, Err(UiError::PlaybackDisabled)));
}

#[test]
fn test_successful_retry_reenables_playback() {
    let mut controller = controller();
    controller
        .handle(UiEvent::ScalesLoaded(Err(UiError::Decode("not json".to_string()))))
        .unwrap();
    controller.handle(UiEvent::CatalogLoaded(Ok(catalog()))).unwrap();
    assert!(!controller.playback_enabled());

    controller.handle(UiEvent::ScalesLoaded(Ok(scales()))).unwrap();

    assert!(controller.playback_enabled());
    assert!(controller.failed_lists().is_empty());
    assert_eq!(controller.view().playback_enabled, Some(true));
    controller.handle(UiEvent::Play).unwrap();
}
