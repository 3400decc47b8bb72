//! Nerd Font glyphs. Requires a Nerd Font (https://www.nerdfonts.com).

#[derive(Debug, Clone)]
pub struct Icons {
    pub play: &'static str,
    pub pause: &'static str,
    pub stop: &'static str,

    pub volume_mute: &'static str,
    pub volume_low: &'static str,
    pub volume_high: &'static str,

    pub search: &'static str,
    pub playlist: &'static str,
    pub help: &'static str,

    pub success: &'static str,
    pub error: &'static str,
    pub music: &'static str,
    pub file: &'static str,

    pub selected: &'static str,
    pub unselected: &'static str,

    pub progress_full: &'static str,
    pub progress_empty: &'static str,
    pub progress_head: &'static str,
}

impl Icons {
    pub const fn nerd() -> Self {
        Self {
            play: "\u{f04b}",        // nf-fa-play
            pause: "\u{f04c}",       // nf-fa-pause
            stop: "\u{f04d}",        // nf-fa-stop

            volume_mute: "\u{f026}", // nf-fa-volume_off
            volume_low: "\u{f027}",  // nf-fa-volume_down
            volume_high: "\u{f028}", // nf-fa-volume_up

            search: "\u{f002}",      // nf-fa-search
            playlist: "\u{f0cb}",    // nf-fa-list_ol
            help: "\u{f059}",        // nf-fa-question_circle

            success: "\u{f00c}",     // nf-fa-check
            error: "\u{f00d}",       // nf-fa-times
            music: "\u{f001}",       // nf-fa-music
            file: "\u{f15b}",        // nf-fa-file

            selected: "\u{f054}",    // nf-fa-chevron_right
            unselected: " ",

            progress_full: "━",
            progress_empty: "─",
            progress_head: "●",
        }
    }
}

pub struct LoadingSpinner;

impl LoadingSpinner {
    pub const BRAILLE: [&'static str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

    pub fn frame(tick: u64) -> &'static str {
        let idx = (tick / 4) as usize % Self::BRAILLE.len();
        Self::BRAILLE[idx]
    }
}
