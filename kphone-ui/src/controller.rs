//! Selection-and-Playback Controller
//!
//! Owns the control values, derives the selection from them on every read,
//! and pushes the derived outputs (plot image, share links, address) to the
//! [`View`]. Playback goes through the [`Player`] seam.
//!
//! All input arrives through [`Controller::handle`]; the controller is
//! single-threaded and never blocks.

use kphone_common::catalog::{catalog_options, scale_options};
use kphone_common::config::TomlConfig;
use kphone_common::links::{image_url, listening_message, playback_url};
use kphone_common::{
    CatalogEntry, ControlEdit, Controls, PersistedSelection, SelectionState, ShareState,
    SourceMode,
};
use tracing::{debug, info, warn};

use crate::error::{Result, UiError};
use crate::events::{CatalogList, UiEvent};
use crate::player::{PlaybackSession, PlaybackState, Player};
use crate::view::View;

/// Settings the controller needs from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Origin for canonical URLs, no trailing slash
    pub origin: String,
    pub hashtag: String,
    pub speeds: Vec<u32>,
    pub default_speed: u32,
}

impl ControllerSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            origin: config.origin().to_string(),
            hashtag: config.hashtag.clone(),
            speeds: config.speeds.clone(),
            default_speed: config.default_speed,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

/// Load progress of one server-fed list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Pending,
    Loaded,
    Failed,
}

/// Identifier, scale and speed of a validated playback request
struct PlaybackRequest {
    id: String,
    scale: String,
    speed: u32,
}

pub struct Controller<V: View, P: Player> {
    view: V,
    player: P,
    settings: ControllerSettings,
    controls: Controls,
    persisted: Option<PersistedSelection>,
    ids_status: LoadStatus,
    scales_status: LoadStatus,
    playback: PlaybackState,
    session: Option<PlaybackSession>,
}

impl<V: View, P: Player> Controller<V, P> {
    pub fn new(view: V, player: P, settings: ControllerSettings) -> Self {
        let controls = Controls::new(settings.speeds.clone(), settings.default_speed);
        Self {
            view,
            player,
            settings,
            controls,
            persisted: None,
            ids_status: LoadStatus::Pending,
            scales_status: LoadStatus::Pending,
            playback: PlaybackState::Stopped,
            session: None,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Current selection, recomputed from the controls
    pub fn selection(&self) -> SelectionState {
        self.controls.selection()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    pub fn persisted(&self) -> Option<&PersistedSelection> {
        self.persisted.as_ref()
    }

    pub fn load_status(&self, list: CatalogList) -> LoadStatus {
        match list {
            CatalogList::Ids => self.ids_status,
            CatalogList::Scales => self.scales_status,
        }
    }

    /// Playback is refused while either list is in the failed state
    pub fn playback_enabled(&self) -> bool {
        self.ids_status != LoadStatus::Failed && self.scales_status != LoadStatus::Failed
    }

    /// Lists whose last load failed and should be requested again
    pub fn failed_lists(&self) -> Vec<CatalogList> {
        [CatalogList::Ids, CatalogList::Scales]
            .into_iter()
            .filter(|list| self.load_status(*list) == LoadStatus::Failed)
            .collect()
    }

    /// Page-load setup. A persisted selection seeds the free-text field,
    /// switches to free mode and shows its plot before any user input.
    pub fn initialize(&mut self, persisted: Option<PersistedSelection>) {
        if let Some(persisted) = persisted {
            info!(id = %persisted.id, "Restoring persisted selection");

            if let Some(speed) = persisted.speed.filter(|s| self.controls.offers_speed(*s)) {
                self.controls.speed = speed;
            }
            // Provisional until the scale list arrives
            self.controls.scale = persisted.scale.clone();
            self.controls.free_text = persisted.id.clone();
            self.controls.source_mode = self
                .controls
                .source_mode
                .after(ControlEdit::ModeChosen(SourceMode::Free));
            self.persisted = Some(persisted);
        }

        self.view.set_free_text(&self.controls.free_text);
        self.view.set_source_mode(self.controls.source_mode);
        self.view.set_speed_selection(self.controls.speed);
        self.view.set_playback_enabled(self.playback_enabled());

        if self.persisted.is_some() {
            self.update_image();
            self.update_share_state();
        }
    }

    /// Single entry point for every event
    pub fn handle(&mut self, event: UiEvent) -> Result<()> {
        debug!(event = event.kind(), "Handling UI event");

        match event {
            UiEvent::CatalogLoaded(Ok(entries)) => self.on_catalog_loaded(entries),
            UiEvent::CatalogLoaded(Err(e)) => self.on_load_failed(CatalogList::Ids, e),
            UiEvent::ScalesLoaded(Ok(scales)) => self.on_scales_loaded(scales),
            UiEvent::ScalesLoaded(Err(e)) => self.on_load_failed(CatalogList::Scales, e),
            UiEvent::CatalogPicked(id) => return self.on_catalog_picked(id),
            UiEvent::FreeTextEdited(text) => self.on_free_text_edited(text),
            UiEvent::ModeChosen(mode) => self.on_mode_chosen(mode),
            UiEvent::ScaleChosen(scale) => return self.on_scale_chosen(scale),
            UiEvent::SpeedChosen(speed) => return self.on_speed_chosen(speed),
            UiEvent::Play => return self.play(),
            UiEvent::Stop => self.stop(),
            UiEvent::PlaybackEnded { session, error } => self.on_playback_ended(session, error),
        }
        Ok(())
    }

    /// Stop current playback, then start playback of the current selection.
    ///
    /// The player is always stopped first, even when the selection turns out
    /// to be unplayable.
    pub fn play(&mut self) -> Result<()> {
        self.player.stop();
        self.mark_stopped();

        let request = match self.playback_request() {
            Ok(request) => request,
            Err(e) => {
                debug!("Play refused: {}", e);
                self.view.notify(&e.to_string());
                return Err(e);
            }
        };

        self.view.set_plot_src(&image_url(&request.id));
        self.persisted = Some(PersistedSelection {
            id: request.id.clone(),
            scale: Some(request.scale.clone()),
            speed: Some(request.speed),
        });
        self.update_share_state();

        let path = playback_url(&request.id, &request.scale, request.speed);
        match self.player.play(&path) {
            Ok(session) => {
                info!(session, path = %path, "Playback started");
                self.playback = PlaybackState::Playing;
                self.session = Some(session);
                self.view.set_listening(Some(&listening_message(&request.id)));
                Ok(())
            }
            Err(e) => {
                warn!(path = %path, "Playback failed to start: {}", e);
                self.view.notify(&e.to_string());
                self.mark_stopped();
                Err(e)
            }
        }
    }

    /// Stop playback. Safe to call when nothing plays.
    pub fn stop(&mut self) {
        self.player.stop();
        if self.playback == PlaybackState::Playing {
            info!("Playback stopped");
        }
        self.mark_stopped();
        self.update_share_state();
    }

    /// Point the plot image at the effective identifier
    pub fn update_image(&mut self) {
        if let Some(id) = self.display_id() {
            let src = image_url(&id);
            debug!(src = %src, "Updating plot image");
            self.view.set_plot_src(&src);
        }
    }

    /// Rebuild canonical, download and share links and rewrite the address.
    /// Does nothing while the selection lacks an identifier or a scale.
    pub fn update_share_state(&mut self) {
        let Some(share) = self.share_state() else {
            debug!("Selection incomplete, share state unchanged");
            return;
        };
        self.view.set_share_state(&share);
        self.view.replace_history(&share.canonical_url);
    }

    /// Links for the current selection, if it is complete
    pub fn share_state(&self) -> Option<ShareState> {
        let id = self.display_id()?;
        let selection = self.controls.selection();
        let scale = selection.scale.as_deref()?;
        Some(ShareState::build(
            &self.settings.origin,
            &self.settings.hashtag,
            &id,
            scale,
            selection.speed,
        ))
    }

    fn on_catalog_loaded(&mut self, entries: Vec<CatalogEntry>) {
        info!(count = entries.len(), "Object list loaded");

        self.controls.catalog_options = catalog_options(&entries);
        let keep = self
            .controls
            .catalog_id
            .as_deref()
            .is_some_and(|id| self.controls.offers_catalog_id(id));
        if !keep {
            self.controls.catalog_id = self
                .controls
                .catalog_options
                .first()
                .map(|o| o.value.clone());
        }

        self.view.set_catalog_options(&self.controls.catalog_options);
        self.view.set_catalog_selection(self.controls.catalog_id.as_deref());
        self.ids_status = LoadStatus::Loaded;
        self.view.set_playback_enabled(self.playback_enabled());
        self.update_share_state();
    }

    fn on_scales_loaded(&mut self, scales: Vec<String>) {
        info!(count = scales.len(), "Scale list loaded");

        self.controls.scale_options = scale_options(&scales);
        let persisted_scale = self.persisted.as_ref().and_then(|p| p.scale.clone());
        self.controls.scale = [persisted_scale, self.controls.scale.clone()]
            .into_iter()
            .flatten()
            .find(|s| self.controls.offers_scale(s))
            .or_else(|| self.controls.scale_options.first().map(|o| o.value.clone()));

        self.view.set_scale_options(&self.controls.scale_options);
        self.view.set_scale_selection(self.controls.scale.as_deref());
        self.scales_status = LoadStatus::Loaded;
        self.view.set_playback_enabled(self.playback_enabled());
        self.update_share_state();
    }

    fn on_load_failed(&mut self, list: CatalogList, error: UiError) {
        warn!(%list, "Failed to load: {}", error);

        match list {
            CatalogList::Ids => {
                self.controls.catalog_options.clear();
                self.controls.catalog_id = None;
                self.view.set_catalog_options(&[]);
                self.view.set_catalog_selection(None);
                self.ids_status = LoadStatus::Failed;
            }
            CatalogList::Scales => {
                self.controls.scale_options.clear();
                self.controls.scale = None;
                self.view.set_scale_options(&[]);
                self.view.set_scale_selection(None);
                self.scales_status = LoadStatus::Failed;
            }
        }

        self.view.set_playback_enabled(false);
        self.view.notify(&format!(
            "Could not load the {}: {}. Playback is disabled until it loads.",
            list, error
        ));
    }

    fn on_catalog_picked(&mut self, id: String) -> Result<()> {
        if !self.controls.offers_catalog_id(&id) {
            return Err(UiError::UnknownOption {
                control: "object",
                value: id,
            });
        }

        self.controls.catalog_id = Some(id);
        self.controls.source_mode = self.controls.source_mode.after(ControlEdit::CatalogPicked);
        self.view.set_catalog_selection(self.controls.catalog_id.as_deref());
        self.view.set_source_mode(self.controls.source_mode);
        self.update_image();
        self.stop();
        Ok(())
    }

    fn on_free_text_edited(&mut self, text: String) {
        self.controls.free_text = text;
        self.controls.source_mode = self.controls.source_mode.after(ControlEdit::FreeTextEdited);
        self.view.set_free_text(&self.controls.free_text);
        self.update_share_state();
    }

    fn on_mode_chosen(&mut self, mode: SourceMode) {
        self.controls.source_mode = self.controls.source_mode.after(ControlEdit::ModeChosen(mode));
        self.view.set_source_mode(self.controls.source_mode);
        self.update_image();
        self.update_share_state();
    }

    fn on_scale_chosen(&mut self, scale: String) -> Result<()> {
        if !self.controls.offers_scale(&scale) {
            return Err(UiError::UnknownOption {
                control: "scale",
                value: scale,
            });
        }

        self.controls.scale = Some(scale);
        self.controls.source_mode = self.controls.source_mode.after(ControlEdit::ScaleChosen);
        self.view.set_scale_selection(self.controls.scale.as_deref());
        self.update_share_state();
        Ok(())
    }

    fn on_speed_chosen(&mut self, speed: u32) -> Result<()> {
        if !self.controls.offers_speed(speed) {
            return Err(UiError::UnknownOption {
                control: "speed",
                value: speed.to_string(),
            });
        }

        self.controls.speed = speed;
        self.controls.source_mode = self.controls.source_mode.after(ControlEdit::SpeedChosen);
        self.view.set_speed_selection(speed);
        self.update_share_state();
        Ok(())
    }

    fn on_playback_ended(&mut self, session: PlaybackSession, error: Option<String>) {
        if self.session != Some(session) {
            debug!(session, "Ignoring end of stale playback session");
            return;
        }

        match error {
            Some(error) => {
                warn!(session, "Playback failed: {}", error);
                self.view.notify(&format!("Playback failed: {}", error));
            }
            None => info!(session, "Playback finished"),
        }
        self.mark_stopped();
    }

    fn mark_stopped(&mut self) {
        self.playback = PlaybackState::Stopped;
        self.session = None;
        self.view.set_listening(None);
    }

    /// Effective identifier if it can be placed in a URL path
    fn display_id(&self) -> Option<String> {
        let selection = self.controls.selection();
        validate_identifier(selection.effective_id()).ok()
    }

    fn playback_request(&self) -> Result<PlaybackRequest> {
        if !self.playback_enabled() {
            return Err(UiError::PlaybackDisabled);
        }

        let selection = self.controls.selection();
        let id = validate_identifier(selection.effective_id())?;
        let scale = selection.scale.clone().ok_or(UiError::NoScale)?;

        Ok(PlaybackRequest {
            id,
            scale,
            speed: selection.speed,
        })
    }
}

/// Trim and check an identifier before it goes into a request path
pub fn validate_identifier(raw: Option<&str>) -> Result<String> {
    let id = raw.map(str::trim).unwrap_or("");
    if id.is_empty() {
        return Err(UiError::EmptyIdentifier);
    }
    // URL delimiters would change the links built from the id
    if id.contains(['/', '?', '#', '%'])
        || id.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(UiError::InvalidIdentifier(id.to_string()));
    }
    Ok(id.to_string())
}
