//! Events delivered to the controller
//!
//! Every user action, fetch completion and playback completion is turned
//! into one [`UiEvent`] and handled by `Controller::handle`.

use std::fmt;

use kphone_common::{CatalogEntry, SourceMode};

use crate::error::UiError;
use crate::player::PlaybackSession;

/// One of the two server-fed lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogList {
    /// `/ids`
    Ids,
    /// `/scales`
    Scales,
}

impl fmt::Display for CatalogList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogList::Ids => write!(f, "object list"),
            CatalogList::Scales => write!(f, "scale list"),
        }
    }
}

#[derive(Debug)]
pub enum UiEvent {
    /// `/ids` fetch completed
    CatalogLoaded(Result<Vec<CatalogEntry>, UiError>),
    /// `/scales` fetch completed
    ScalesLoaded(Result<Vec<String>, UiError>),
    /// Catalog selector changed
    CatalogPicked(String),
    /// Free-text field edited
    FreeTextEdited(String),
    /// Source radio changed
    ModeChosen(SourceMode),
    /// Scale selector changed
    ScaleChosen(String),
    /// Speed selector changed
    SpeedChosen(u32),
    Play,
    Stop,
    /// Playback backend finished or failed a session
    PlaybackEnded {
        session: PlaybackSession,
        error: Option<String>,
    },
}

impl UiEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            UiEvent::CatalogLoaded(_) => "catalog_loaded",
            UiEvent::ScalesLoaded(_) => "scales_loaded",
            UiEvent::CatalogPicked(_) => "catalog_picked",
            UiEvent::FreeTextEdited(_) => "free_text_edited",
            UiEvent::ModeChosen(_) => "mode_chosen",
            UiEvent::ScaleChosen(_) => "scale_chosen",
            UiEvent::SpeedChosen(_) => "speed_chosen",
            UiEvent::Play => "play",
            UiEvent::Stop => "stop",
            UiEvent::PlaybackEnded { .. } => "playback_ended",
        }
    }
}
