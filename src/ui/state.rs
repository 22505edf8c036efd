use std::fmt::Debug;

use crate::{event::TICK_FPS, metrics::epoch_secs, ui::theme::Theme};
use tui_logger::*;

pub struct UiState {
    pub tick: f64,
    /// Wall-clock seconds at the last tick; the right edge of every sparkline.
    pub now: f64,
    pub theme: Theme,
    pub debug: bool,
    pub logger_state: TuiWidgetState,
}

impl Debug for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiState")
            .field("tick", &self.tick)
            .field("now", &self.now)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logger_state: TuiWidgetState::new(),
            tick: Default::default(),
            now: epoch_secs(),
            theme: Theme::dark(),
            debug: false,
        }
    }
}

impl UiState {
    pub fn tick(&mut self) {
        self.tick += 1.0;
        if self.tick > 2.0 * TICK_FPS {
            self.tick = 0.0;
        }
        self.now = epoch_secs();
    }

    pub fn step_of_8_in_1_second(&self) -> usize {
        (self.tick * 8.0 / TICK_FPS) as usize % 8
    }

    pub fn step_of_4_in_1_second(&self) -> usize {
        (self.tick * 4.0 / TICK_FPS) as usize % 4
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
    }
}
