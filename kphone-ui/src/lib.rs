//! # KeplerPhone UI Library (kphone-ui)
//!
//! Selection-and-playback controller for the KeplerPhone sonification
//! service, with its async catalog client, MIDI playback backend and console
//! front end.
//!
//! **Architecture:** every input becomes a [`UiEvent`] handled by
//! [`Controller::handle`] on a single task. Output goes through the [`View`]
//! and [`Player`] traits.

pub mod catalog_client;
pub mod console;
pub mod controller;
pub mod error;
pub mod events;
pub mod midi_player;
pub mod player;
pub mod view;

pub use catalog_client::CatalogClient;
pub use controller::{Controller, ControllerSettings, LoadStatus};
pub use error::{Result, UiError};
pub use events::{CatalogList, UiEvent};
pub use player::{PlaybackSession, PlaybackState, Player};
pub use view::View;
