// ============================================================================
// src/ui.rs – Console output helpers (styling & flow feedback)
// ============================================================================

use console::Style;
use std::io::{self, Write};

/// Unified console voice for the sign-in flows. `quiet` drops the banner
/// and informational chatter; warnings and errors always print.
#[derive(Debug, Clone)]
pub struct UX {
    pub quiet: bool,
}

impl UX {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn banner(&self) {
        if self.quiet {
            return;
        }
        let frame = Style::new().cyan().bold();
        println!("{}", frame.apply_to("══════════════════════════════════════"));
        println!("{}", frame.apply_to("  RENTGUARD — admin console sign-in"));
        println!("{}", frame.apply_to("══════════════════════════════════════"));
    }

    pub fn info(&self, msg: &str) {
        if self.quiet {
            return;
        }
        println!("{} {}", Style::new().cyan().apply_to("ℹ"), msg);
    }

    pub fn success(&self, msg: &str) {
        println!("{} {}", Style::new().green().bold().apply_to("✔"), msg);
    }

    pub fn warn(&self, msg: &str) {
        println!("{} {}", Style::new().yellow().bold().apply_to("⚠"), msg);
    }

    pub fn error(&self, msg: &str) {
        println!("{} {}", Style::new().red().bold().apply_to("✖"), msg);
    }
}

/// `MM:SS` rendering of a remaining-seconds value, minutes unpadded past 99.
pub fn format_mmss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Human phrasing for a lockout length: whole minutes when even, seconds
/// otherwise ("1 minute", "5 minutes", "90 seconds").
pub fn format_block_duration(secs: u64) -> String {
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    } else if secs == 1 {
        "1 second".to_string()
    } else {
        format!("{secs} seconds")
    }
}

/// In-place countdown line for an active lockout. Rewrites the same row
/// each tick; `render_countdown_end` closes it out with a newline.
pub fn render_countdown_tick(remaining: u64) {
    let style = Style::new().yellow().bold();
    print!(
        "\r{} Account is temporarily blocked. Try again in {}   ",
        style.apply_to("⏳"),
        format_mmss(remaining)
    );
    let _ = io::stdout().flush();
}

pub fn render_countdown_end() {
    println!();
}
