//! Highlight scanning for switch-accessible input: a toolbar scan loop over
//! individual buttons and a section guide that alternates between whole
//! regions. Both are tick-driven state machines polled by the main loop with
//! a monotonic clock, so ticks are strictly sequential and cancellation is
//! cooperative (a stop takes effect before the next deadline is observed).
//!
//! Every run carries a generation number, bumped on each start and stop; a
//! wake that belongs to a previous generation is structurally inert.

use clap::ValueEnum;
use std::time::{Duration, Instant};

pub const DEFAULT_SCAN_DELAY_MS: u64 = 700;
pub const DEFAULT_SCAN_GAP_MS: u64 = 150;

/// Dwell and pause lengths for one scan step.
#[derive(Debug, Clone, Copy)]
pub struct ScanTiming {
    pub delay: Duration,
    pub gap: Duration,
}

impl ScanTiming {
    pub fn from_millis(delay_ms: u64, gap_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            gap: Duration::from_millis(gap_ms),
        }
    }
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self::from_millis(DEFAULT_SCAN_DELAY_MS, DEFAULT_SCAN_GAP_MS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanPhase {
    /// The current candidate is highlighted; expires after `delay`.
    Highlight,
    /// Between candidates, nothing highlighted; expires after `gap`.
    Gap,
}

#[derive(Debug)]
struct ScanRun {
    generation: u64,
    index: usize,
    phase: ScanPhase,
    deadline: Instant,
    highlighted: Option<String>,
}

/// Timed scan over the ordered toolbar button identifiers. The id list is
/// re-read on every tick so the loop stays correct when the toolbar
/// re-renders mid-scan.
#[derive(Debug)]
pub struct ToolbarScan {
    timing: ScanTiming,
    generation: u64,
    run: Option<ScanRun>,
}

impl ToolbarScan {
    pub fn new(timing: ScanTiming) -> Self {
        Self {
            timing,
            generation: 0,
            run: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// The id currently highlighted, if the loop is in its dwell phase.
    pub fn highlighted(&self) -> Option<&str> {
        self.run.as_ref()?.highlighted.as_deref()
    }

    /// Begin scanning from the first button. No-op while already scanning or
    /// with nothing to scan.
    pub fn start(&mut self, now: Instant, ids: &[String]) {
        if self.run.is_some() || ids.is_empty() {
            return;
        }
        self.generation += 1;
        self.run = Some(ScanRun {
            generation: self.generation,
            index: 0,
            phase: ScanPhase::Highlight,
            deadline: now + self.timing.delay,
            highlighted: Some(ids[0].clone()),
        });
    }

    /// Clear the highlight synchronously and invalidate any pending wake.
    pub fn stop(&mut self) {
        self.generation += 1;
        self.run = None;
    }

    /// Advance the loop if its current deadline has passed.
    pub fn tick(&mut self, now: Instant, ids: &[String]) {
        let (generation, deadline) = match self.run.as_ref() {
            Some(run) => (run.generation, run.deadline),
            None => return,
        };
        if generation != self.generation {
            // wake from a run that was stopped before it fired
            self.run = None;
            return;
        }
        if ids.is_empty() {
            self.stop();
            return;
        }
        if now < deadline {
            return;
        }
        let Some(run) = self.run.as_mut() else {
            return;
        };
        match run.phase {
            ScanPhase::Highlight => {
                run.highlighted = None;
                run.phase = ScanPhase::Gap;
                run.deadline = now + self.timing.gap;
            }
            ScanPhase::Gap => {
                run.index = (run.index + 1) % ids.len();
                run.highlighted = Some(ids[run.index].clone());
                run.phase = ScanPhase::Highlight;
                run.deadline = now + self.timing.delay;
            }
        }
    }

    /// The id a confirm press would activate right now. The loop keeps
    /// running; the activated button decides whether to stop it.
    pub fn confirm(&self) -> Option<String> {
        self.run.as_ref()?.highlighted.clone()
    }
}

/// Larger regions visited by the section guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideTarget {
    Toolbar,
    Keyboard,
}

/// Which regions the section guide alternates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GuideMode {
    Toolbar,
    Keyboard,
    Both,
}

impl GuideMode {
    fn targets(self) -> &'static [GuideTarget] {
        match self {
            GuideMode::Toolbar => &[GuideTarget::Toolbar],
            GuideMode::Keyboard => &[GuideTarget::Keyboard],
            GuideMode::Both => &[GuideTarget::Toolbar, GuideTarget::Keyboard],
        }
    }
}

#[derive(Debug)]
struct GuideRun {
    generation: u64,
    index: usize,
    phase: ScanPhase,
    deadline: Instant,
    lit: bool,
}

/// Region-level scan loop. Highlights one whole target region per dwell
/// phase; a confirm while running selects the region under scan (dwell or
/// gap) and hands off to the region-specific highlighting.
#[derive(Debug)]
pub struct SectionGuide {
    timing: ScanTiming,
    mode: GuideMode,
    generation: u64,
    run: Option<GuideRun>,
}

impl SectionGuide {
    pub fn new(timing: ScanTiming, mode: GuideMode) -> Self {
        Self {
            timing,
            mode,
            generation: 0,
            run: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// The region currently lit, if the guide is in its dwell phase.
    pub fn highlighted(&self) -> Option<GuideTarget> {
        let run = self.run.as_ref()?;
        run.lit.then(|| self.mode.targets()[run.index])
    }

    /// The region the guide is sitting on, lit or not.
    pub fn current_target(&self) -> Option<GuideTarget> {
        let run = self.run.as_ref()?;
        Some(self.mode.targets()[run.index])
    }

    pub fn start(&mut self, now: Instant) {
        if self.run.is_some() {
            return;
        }
        self.generation += 1;
        self.run = Some(GuideRun {
            generation: self.generation,
            index: 0,
            phase: ScanPhase::Highlight,
            deadline: now + self.timing.delay,
            lit: true,
        });
    }

    pub fn stop(&mut self) {
        self.generation += 1;
        self.run = None;
    }

    pub fn tick(&mut self, now: Instant) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if run.generation != self.generation {
            self.run = None;
            return;
        }
        if now < run.deadline {
            return;
        }
        match run.phase {
            ScanPhase::Highlight => {
                run.lit = false;
                run.phase = ScanPhase::Gap;
                run.deadline = now + self.timing.gap;
            }
            ScanPhase::Gap => {
                run.index = (run.index + 1) % self.mode.targets().len();
                run.lit = true;
                run.phase = ScanPhase::Highlight;
                run.deadline = now + self.timing.delay;
            }
        }
    }
}

/// What a confirm press committed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Toolbar scan had a live highlight: synthesize an activation.
    ActivateButton(String),
    /// Section guide handed off to a region-specific engine.
    GuideHandoff(GuideTarget),
    Ignored,
}

/// Owns both scan engines plus the keyboard-highlight flag and enforces that
/// at most one of the three ever drives confirm-key semantics. The toggle
/// checks them in a fixed priority order: section guide, then toolbar scan,
/// then the keyboard flag.
#[derive(Debug)]
pub struct HighlightController {
    toolbar: ToolbarScan,
    guide: SectionGuide,
    keyboard_highlighting: bool,
}

impl HighlightController {
    pub fn new(timing: ScanTiming, mode: GuideMode) -> Self {
        Self {
            toolbar: ToolbarScan::new(timing),
            guide: SectionGuide::new(timing, mode),
            keyboard_highlighting: false,
        }
    }

    pub fn toolbar_highlight(&self) -> Option<&str> {
        self.toolbar.highlighted()
    }

    pub fn guide_highlight(&self) -> Option<GuideTarget> {
        self.guide.highlighted()
    }

    pub fn keyboard_highlighting(&self) -> bool {
        self.keyboard_highlighting
    }

    pub fn is_toolbar_scanning(&self) -> bool {
        self.toolbar.is_running()
    }

    pub fn is_guide_scanning(&self) -> bool {
        self.guide.is_running()
    }

    /// True when any of the three highlighting modes is live.
    pub fn is_active(&self) -> bool {
        self.guide.is_running() || self.toolbar.is_running() || self.keyboard_highlighting
    }

    /// The three-way stop/start switch. Stops whichever mode is live, in
    /// priority order; starts the section guide when nothing is.
    pub fn toggle(&mut self, now: Instant) {
        if self.guide.is_running() {
            self.guide.stop();
        } else if self.toolbar.is_running() {
            self.toolbar.stop();
        } else if self.keyboard_highlighting {
            self.keyboard_highlighting = false;
        } else {
            self.guide.start(now);
        }
    }

    /// Start the toolbar scan, stopping anything else first.
    pub fn ensure_toolbar_highlighting(&mut self, now: Instant, ids: &[String]) {
        self.guide.stop();
        self.keyboard_highlighting = false;
        self.toolbar.start(now, ids);
    }

    /// Flip the external keyboard-highlight flag, stopping the scan loops
    /// when enabling it.
    pub fn set_keyboard_highlighting(&mut self, enabled: bool) {
        if enabled {
            self.guide.stop();
            self.toolbar.stop();
        }
        self.keyboard_highlighting = enabled;
    }

    /// Stop everything; used on teardown so no pending wake outlives the
    /// session state.
    pub fn stop_all(&mut self) {
        self.guide.stop();
        self.toolbar.stop();
        self.keyboard_highlighting = false;
    }

    /// Handle a confirm-key press. Guide commits take priority; toolbar
    /// commits require a live highlight and no native input holding focus.
    pub fn confirm(&mut self, now: Instant, ids: &[String], input_has_focus: bool) -> ConfirmOutcome {
        if self.guide.is_running() {
            let Some(target) = self.guide.current_target() else {
                return ConfirmOutcome::Ignored;
            };
            self.guide.stop();
            match target {
                GuideTarget::Toolbar => self.ensure_toolbar_highlighting(now, ids),
                GuideTarget::Keyboard => self.set_keyboard_highlighting(true),
            }
            return ConfirmOutcome::GuideHandoff(target);
        }
        if input_has_focus {
            return ConfirmOutcome::Ignored;
        }
        match self.toolbar.confirm() {
            Some(id) => ConfirmOutcome::ActivateButton(id),
            None => ConfirmOutcome::Ignored,
        }
    }

    pub fn tick(&mut self, now: Instant, ids: &[String]) {
        self.guide.tick(now);
        self.toolbar.tick(now, ids);
    }
}
