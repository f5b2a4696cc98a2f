//! crates/learnai_core/src/focus.rs
//!
//! Pure scheduling data for the focus timer: the preset modes, the
//! focus/break alternation, and progress computation. The ticking itself
//! belongs to the client; nothing here does I/O.

/// The selectable focus modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    Pomodoro,
    Deep,
    Sprint,
    Custom,
}

/// Whether the running session is a work block or a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    Focus,
    Break,
}

/// A focus preset: display name plus focus/break durations in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusPreset {
    pub mode: FocusMode,
    pub name: &'static str,
    pub focus_minutes: u32,
    pub break_minutes: u32,
}

pub const FOCUS_PRESETS: [FocusPreset; 4] = [
    FocusPreset { mode: FocusMode::Pomodoro, name: "Pomodoro", focus_minutes: 25, break_minutes: 5 },
    FocusPreset { mode: FocusMode::Deep, name: "Deep Focus", focus_minutes: 45, break_minutes: 10 },
    FocusPreset { mode: FocusMode::Sprint, name: "Sprint", focus_minutes: 15, break_minutes: 5 },
    FocusPreset { mode: FocusMode::Custom, name: "Libre", focus_minutes: 25, break_minutes: 5 },
];

impl FocusMode {
    pub fn preset(&self) -> FocusPreset {
        FOCUS_PRESETS
            .iter()
            .copied()
            .find(|p| p.mode == *self)
            .unwrap_or(FOCUS_PRESETS[0])
    }
}

/// A completed session alternates to the other session type.
pub fn next_session(current: SessionType) -> SessionType {
    match current {
        SessionType::Focus => SessionType::Break,
        SessionType::Break => SessionType::Focus,
    }
}

/// Fraction of the session elapsed, in `0.0..=1.0`.
pub fn progress(total_seconds: u32, remaining_seconds: u32) -> f32 {
    if total_seconds == 0 {
        return 0.0;
    }
    let elapsed = total_seconds.saturating_sub(remaining_seconds);
    elapsed as f32 / total_seconds as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_the_known_modes() {
        assert_eq!(FocusMode::Pomodoro.preset().focus_minutes, 25);
        assert_eq!(FocusMode::Deep.preset().break_minutes, 10);
        assert_eq!(FocusMode::Sprint.preset().focus_minutes, 15);
    }

    #[test]
    fn sessions_alternate() {
        assert_eq!(next_session(SessionType::Focus), SessionType::Break);
        assert_eq!(next_session(SessionType::Break), SessionType::Focus);
    }

    #[test]
    fn progress_is_bounded() {
        assert_eq!(progress(0, 0), 0.0);
        assert_eq!(progress(1500, 1500), 0.0);
        assert_eq!(progress(1500, 0), 1.0);
        assert!((progress(1500, 750) - 0.5).abs() < f32::EPSILON);
    }
}
