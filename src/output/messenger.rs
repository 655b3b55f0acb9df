//! `TerminalMessenger` — presentation-layer implementation of `Messenger`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::Messenger`
//! trait so the orchestration can emit stage progress without depending on
//! any presentation type directly.

use std::sync::Mutex;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::Messenger;
use crate::output::{OutputContext, progress};

/// Terminal messenger that wraps an `OutputContext`.
///
/// On a TTY, `step()` shows a live spinner that the next message replaces;
/// off-TTY it degrades to plain `→` lines. All output is suppressed when
/// `ctx.quiet`.
pub struct TerminalMessenger<'a> {
    ctx: &'a OutputContext,
    spinner: Mutex<Option<ProgressBar>>,
}

impl<'a> TerminalMessenger<'a> {
    /// Create a new `TerminalMessenger` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            spinner: Mutex::new(None),
        }
    }

    fn clear_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Messenger for TerminalMessenger<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        self.clear_spinner();
        if self.ctx.show_progress() {
            if let Ok(mut slot) = self.spinner.lock() {
                *slot = Some(progress::spinner(message));
            }
        } else {
            println!("  {} {message}", "→".style(self.ctx.styles.step));
        }
    }

    fn success(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        self.clear_spinner();
        println!("  {} {message}", "✓".style(self.ctx.styles.success));
    }

    fn warn(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        self.clear_spinner();
        println!("  {} {message}", "!".style(self.ctx.styles.warning));
    }
}

impl Drop for TerminalMessenger<'_> {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}
