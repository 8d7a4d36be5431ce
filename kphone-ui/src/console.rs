//! Line-oriented console front end
//!
//! [`ConsoleView`] renders view updates as text, and [`parse_command`] turns
//! input lines into commands for the event loop.

use std::fmt;
use std::io::Write;

use kphone_common::{Controls, SelectOption, SelectionState, ShareState, SourceMode};
use tracing::debug;

use crate::error::{Result, UiError};
use crate::events::UiEvent;
use crate::player::PlaybackState;
use crate::view::View;

pub const HELP: &str = "\
commands:
  list              show the object list
  scales            show the scale list
  pick <id|#n>      select an object (switches to catalog mode)
  free <id>         type a free-text identifier
  mode catalog|free choose the identifier source
  scale <name>      select a scale
  speed <n>         select a speed
  play              play the current selection
  stop              stop playback
  retry             reload lists that failed to load
  status            show the current selection and links
  help              show this help
  quit              exit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Catalog pick by id, or by 1-based position when written `#n`
    Pick(String),
    Free(String),
    Mode(SourceMode),
    Scale(String),
    Speed(u32),
    Play,
    Stop,
    Retry,
    List,
    Scales,
    Status,
    Help,
    Quit,
}

/// Parse one input line; blank lines give `None`
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let argument = |name: &str| -> Result<String> {
        if rest.is_empty() {
            Err(UiError::Common(kphone_common::Error::InvalidInput(format!(
                "{} needs an argument",
                name
            ))))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "pick" => Command::Pick(argument("pick")?),
        // The free-text field may legitimately be cleared
        "free" => Command::Free(rest.to_string()),
        "mode" => Command::Mode(argument("mode")?.parse()?),
        "scale" => Command::Scale(argument("scale")?),
        "speed" => {
            let value = argument("speed")?;
            let speed = value.parse::<u32>().map_err(|_| {
                kphone_common::Error::InvalidInput(format!("speed must be a number, got {}", value))
            })?;
            Command::Speed(speed)
        }
        "play" => Command::Play,
        "stop" => Command::Stop,
        "retry" => Command::Retry,
        "list" => Command::List,
        "scales" => Command::Scales,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(UiError::Common(kphone_common::Error::InvalidInput(format!(
                "unknown command '{}' (try help)",
                other
            ))))
        }
    };
    Ok(Some(command))
}

impl Command {
    /// Controller event for this command, if it maps to one.
    ///
    /// `#n` picks are resolved against the current catalog options.
    pub fn to_event(&self, controls: &Controls) -> Result<Option<UiEvent>> {
        let event = match self {
            Command::Pick(target) => UiEvent::CatalogPicked(resolve_pick(target, controls)?),
            Command::Free(text) => UiEvent::FreeTextEdited(text.clone()),
            Command::Mode(mode) => UiEvent::ModeChosen(*mode),
            Command::Scale(scale) => UiEvent::ScaleChosen(scale.clone()),
            Command::Speed(speed) => UiEvent::SpeedChosen(*speed),
            Command::Play => UiEvent::Play,
            Command::Stop => UiEvent::Stop,
            Command::Retry
            | Command::List
            | Command::Scales
            | Command::Status
            | Command::Help
            | Command::Quit => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn resolve_pick(target: &str, controls: &Controls) -> Result<String> {
    let Some(position) = target.strip_prefix('#') else {
        return Ok(target.to_string());
    };

    position
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| controls.catalog_options.get(index))
        .map(|option| option.value.clone())
        .ok_or_else(|| UiError::UnknownOption {
            control: "object",
            value: target.to_string(),
        })
}

/// Text rendering of the page
pub struct ConsoleView<W: Write> {
    out: W,
    playback_enabled: Option<bool>,
    listening: bool,
    address: Option<String>,
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            playback_enabled: None,
            listening: false,
            address: None,
        }
    }

    /// Last address written by `replace_history`
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_help(&mut self) {
        self.line(format_args!("{}", HELP));
    }

    pub fn print_objects(&mut self, controls: &Controls) {
        if controls.catalog_options.is_empty() {
            self.line(format_args!("(object list is empty)"));
            return;
        }
        let selected = controls.catalog_id.clone();
        for (n, option) in controls.catalog_options.iter().enumerate() {
            let marker = if selected.as_deref() == Some(option.value.as_str()) { '*' } else { ' ' };
            let text = format!("{} #{:<4} {:<12} {}", marker, n + 1, option.value, option.label);
            self.line(format_args!("{}", text));
        }
    }

    pub fn print_scales(&mut self, controls: &Controls) {
        if controls.scale_options.is_empty() {
            self.line(format_args!("(scale list is empty)"));
            return;
        }
        let text = join_options(&controls.scale_options, controls.scale.as_deref());
        self.line(format_args!("scales: {}", text));
    }

    pub fn print_status(
        &mut self,
        selection: &SelectionState,
        playback: PlaybackState,
        share: Option<&ShareState>,
    ) {
        self.line(format_args!("source:   {}", selection.source_mode));
        self.line(format_args!(
            "object:   {}",
            selection.catalog_id.as_deref().unwrap_or("-")
        ));
        self.line(format_args!(
            "free:     {}",
            selection.free_id.as_deref().unwrap_or("-")
        ));
        self.line(format_args!(
            "scale:    {}",
            selection.scale.as_deref().unwrap_or("-")
        ));
        self.line(format_args!("speed:    {}", selection.speed));
        self.line(format_args!("playback: {}", playback));
        if let Some(share) = share {
            self.line(format_args!("link:     {}", share.canonical_url));
        }
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{}", args) {
            debug!("Console write failed: {}", e);
        }
    }
}

fn join_options(options: &[SelectOption], selected: Option<&str>) -> String {
    options
        .iter()
        .map(|o| {
            if Some(o.value.as_str()) == selected {
                format!("[{}]", o.label)
            } else {
                o.label.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl<W: Write> View for ConsoleView<W> {
    fn set_catalog_options(&mut self, options: &[SelectOption]) {
        self.line(format_args!("objects: {} available", options.len()));
    }

    fn set_scale_options(&mut self, options: &[SelectOption]) {
        self.line(format_args!("scales: {} available", options.len()));
    }

    fn set_catalog_selection(&mut self, id: Option<&str>) {
        if let Some(id) = id {
            self.line(format_args!("object: {}", id));
        }
    }

    fn set_scale_selection(&mut self, scale: Option<&str>) {
        if let Some(scale) = scale {
            self.line(format_args!("scale: {}", scale));
        }
    }

    fn set_speed_selection(&mut self, speed: u32) {
        self.line(format_args!("speed: {}", speed));
    }

    fn set_source_mode(&mut self, mode: SourceMode) {
        self.line(format_args!("source: {}", mode));
    }

    fn set_free_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.line(format_args!("free: {}", text));
        }
    }

    fn set_plot_src(&mut self, src: &str) {
        self.line(format_args!("plot: {}", src));
    }

    fn set_share_state(&mut self, share: &ShareState) {
        self.line(format_args!("download: {}", share.download_href));
        self.line(format_args!("share: {}", share.share_href));
    }

    fn replace_history(&mut self, url: &str) {
        if self.address.as_deref() != Some(url) {
            self.line(format_args!("link: {}", url));
            self.address = Some(url.to_string());
        }
    }

    fn set_playback_enabled(&mut self, enabled: bool) {
        if self.playback_enabled != Some(enabled) {
            let state = if enabled { "enabled" } else { "disabled" };
            self.line(format_args!("playback {}", state));
            self.playback_enabled = Some(enabled);
        }
    }

    fn set_listening(&mut self, message: Option<&str>) {
        match message {
            Some(message) => {
                self.line(format_args!("~ {}", message));
                self.listening = true;
            }
            None if self.listening => {
                self.line(format_args!("~ stopped"));
                self.listening = false;
            }
            None => {}
        }
    }

    fn notify(&mut self, message: &str) {
        self.line(format_args!("! {}", message));
    }
}
