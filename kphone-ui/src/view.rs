//! Output side of the page
//!
//! The controller owns the control values and pushes every visible change
//! through a [`View`]. Implementations only render; they never read back.

use kphone_common::{SelectOption, ShareState, SourceMode};

pub trait View {
    /// Replace the catalog selector's options
    fn set_catalog_options(&mut self, options: &[SelectOption]);

    /// Replace the scale selector's options
    fn set_scale_options(&mut self, options: &[SelectOption]);

    /// Reflect the selected value of the catalog selector
    fn set_catalog_selection(&mut self, id: Option<&str>);

    /// Reflect the selected scale
    fn set_scale_selection(&mut self, scale: Option<&str>);

    /// Reflect the selected speed
    fn set_speed_selection(&mut self, speed: u32);

    /// Reflect the source radio
    fn set_source_mode(&mut self, mode: SourceMode);

    /// Set the free-text field's contents
    fn set_free_text(&mut self, text: &str);

    /// Set the plot image source
    fn set_plot_src(&mut self, src: &str);

    /// Update the link field, download link and share link
    fn set_share_state(&mut self, share: &ShareState);

    /// Replace the current address without navigating
    fn replace_history(&mut self, url: &str);

    fn set_playback_enabled(&mut self, enabled: bool);

    /// Show or clear the "listening to" indication
    fn set_listening(&mut self, message: Option<&str>);

    /// User-visible notice (validation and load failures)
    fn notify(&mut self, message: &str);
}
