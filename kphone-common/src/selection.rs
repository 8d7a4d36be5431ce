//! Selection state and source mode transitions
//!
//! All selection state lives in [`Controls`], the stand-in for the page's
//! form controls. [`SelectionState`] is derived from it on every read and is
//! never stored on its own.

use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::catalog::SelectOption;
use crate::{Error, Result};

/// Where the effective identifier comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Identifier is the catalog selector's value
    #[default]
    Catalog,
    /// Identifier is the free-text field's value
    Free,
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Catalog => write!(f, "catalog"),
            SourceMode::Free => write!(f, "free"),
        }
    }
}

impl FromStr for SourceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "catalog" | "fixed" => Ok(SourceMode::Catalog),
            "free" => Ok(SourceMode::Free),
            other => Err(Error::InvalidInput(format!("unknown source mode '{}'", other))),
        }
    }
}

/// A user edit to one of the controls, as seen by the mode transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEdit {
    CatalogPicked,
    FreeTextEdited,
    ModeChosen(SourceMode),
    ScaleChosen,
    SpeedChosen,
}

impl SourceMode {
    /// Mode after applying `edit`.
    ///
    /// Picking a catalog entry forces catalog mode. Typing free text does
    /// not switch to free mode; that takes an explicit mode choice.
    pub fn after(self, edit: ControlEdit) -> SourceMode {
        match edit {
            ControlEdit::CatalogPicked => SourceMode::Catalog,
            ControlEdit::ModeChosen(mode) => mode,
            ControlEdit::FreeTextEdited | ControlEdit::ScaleChosen | ControlEdit::SpeedChosen => {
                self
            }
        }
    }
}

/// Current values of every control on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub catalog_options: Vec<SelectOption>,
    pub scale_options: Vec<SelectOption>,
    pub speed_options: Vec<u32>,
    pub catalog_id: Option<String>,
    pub free_text: String,
    pub source_mode: SourceMode,
    pub scale: Option<String>,
    pub speed: u32,
}

impl Controls {
    /// Empty selectors, catalog mode, `speed` preselected
    pub fn new(speed_options: Vec<u32>, speed: u32) -> Self {
        Self {
            catalog_options: Vec::new(),
            scale_options: Vec::new(),
            speed_options,
            catalog_id: None,
            free_text: String::new(),
            source_mode: SourceMode::Catalog,
            scale: None,
            speed,
        }
    }

    /// Recompute the selection from the current control values
    pub fn selection(&self) -> SelectionState {
        SelectionState {
            source_mode: self.source_mode,
            catalog_id: self.catalog_id.clone(),
            free_id: if self.free_text.is_empty() {
                None
            } else {
                Some(self.free_text.clone())
            },
            scale: self.scale.clone(),
            speed: self.speed,
        }
    }

    pub fn offers_catalog_id(&self, id: &str) -> bool {
        self.catalog_options.iter().any(|o| o.value == id)
    }

    pub fn offers_scale(&self, scale: &str) -> bool {
        self.scale_options.iter().any(|o| o.value == scale)
    }

    pub fn offers_speed(&self, speed: u32) -> bool {
        self.speed_options.contains(&speed)
    }
}

/// Snapshot of the user's selection, derived from [`Controls`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub source_mode: SourceMode,
    pub catalog_id: Option<String>,
    pub free_id: Option<String>,
    pub scale: Option<String>,
    pub speed: u32,
}

impl SelectionState {
    /// The identifier used for image and playback requests
    pub fn effective_id(&self) -> Option<&str> {
        match self.source_mode {
            SourceMode::Free => self.free_id.as_deref(),
            SourceMode::Catalog => self.catalog_id.as_deref(),
        }
    }
}

/// Selection carried in the deep-link path `/{id}/{scale}/{speed}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSelection {
    pub id: String,
    pub scale: Option<String>,
    pub speed: Option<u32>,
}

/// Placeholder the page template renders for a missing value
const ABSENT_SENTINEL: &str = "None";

impl PersistedSelection {
    /// Parse a deep link. Accepts a bare path or a full URL; query string and
    /// fragment are ignored. Returns `None` when no identifier is present.
    pub fn from_link(link: &str) -> Option<Self> {
        let path = match link.find("://") {
            Some(scheme_end) => {
                let rest = &link[scheme_end + 3..];
                rest.find('/').map(|i| &rest[i..]).unwrap_or("")
            }
            None => link,
        };
        let path = path.split(['?', '#']).next().unwrap_or("");

        let mut segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .map(|s| if s == ABSENT_SENTINEL { String::new() } else { s });

        let id = segments.next().filter(|s| !s.is_empty())?;
        let scale = segments.next().filter(|s| !s.is_empty());
        let speed = segments.next().and_then(|s| s.parse::<u32>().ok());

        Some(Self { id, scale, speed })
    }
}
