//! Live session state as exposed to observers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DeviceId, Timestamp};

/// Requested playback quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    Low,
    Medium,
    High,
}

impl Default for StreamQuality {
    fn default() -> Self {
        StreamQuality::High
    }
}

impl fmt::Display for StreamQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamQuality::Low => "low",
            StreamQuality::Medium => "medium",
            StreamQuality::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of the single live-viewing session.
///
/// `stream_url` is only ever `Some` while `is_active` is true; the mutators
/// below keep the two in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub device_id: Option<DeviceId>,
    pub is_active: bool,
    pub is_recording: bool,
    pub is_mic_on: bool,
    pub move_mode: bool,
    pub stream_url: Option<String>,
    pub quality: StreamQuality,
    pub error: Option<String>,
    pub last_update: Timestamp,
}

impl SessionState {
    /// Idle state with every toggle off.
    pub fn idle() -> Self {
        Self {
            device_id: None,
            is_active: false,
            is_recording: false,
            is_mic_on: false,
            move_mode: false,
            stream_url: None,
            quality: StreamQuality::default(),
            error: None,
            last_update: Timestamp::now(),
        }
    }

    /// Optimistic start: active, no error, no stream yet.
    pub(crate) fn begin(&mut self, device_id: DeviceId) {
        self.device_id = Some(device_id);
        self.is_active = true;
        self.stream_url = None;
        self.error = None;
        self.touch();
    }

    /// Stream resolved and playable.
    pub(crate) fn activate(&mut self, stream_url: String) {
        self.is_active = true;
        self.stream_url = Some(stream_url);
        self.quality = StreamQuality::High;
        self.error = None;
        self.touch();
    }

    /// Fatal startup failure: inactive, stream cleared, error recorded.
    pub(crate) fn fail(&mut self, message: String) {
        self.is_active = false;
        self.stream_url = None;
        self.error = Some(message);
        self.touch();
    }

    /// Back to defaults.
    pub(crate) fn reset(&mut self) {
        *self = Self::idle();
    }

    pub(crate) fn touch(&mut self) {
        self.last_update = Timestamp::now();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Whether the stream was seen to exist before the session went active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamAvailability {
    /// An availability check succeeded.
    Confirmed,
    /// The polling deadline passed without a successful check.
    Assumed,
}

/// Outcome of a successful `start()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStarted {
    pub device_id: DeviceId,
    pub stream_url: String,
    pub availability: StreamAvailability,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam() -> DeviceId {
        DeviceId::new("cam-1").unwrap()
    }

    #[test]
    fn idle_state_is_inactive() {
        let state = SessionState::idle();
        assert!(!state.is_active);
        assert!(state.stream_url.is_none());
        assert_eq!(state.quality, StreamQuality::High);
    }

    #[test]
    fn begin_is_active_without_stream() {
        let mut state = SessionState::idle();
        state.error = Some("old".to_string());
        state.begin(cam());
        assert!(state.is_active);
        assert!(state.stream_url.is_none());
        assert!(state.error.is_none());
        assert_eq!(state.device_id, Some(cam()));
    }

    #[test]
    fn fail_clears_stream_with_activity() {
        let mut state = SessionState::idle();
        state.begin(cam());
        state.activate("https://relay/cam-1.m3u8".to_string());
        state.fail("relay down".to_string());
        assert!(!state.is_active);
        assert!(state.stream_url.is_none());
        assert_eq!(state.error.as_deref(), Some("relay down"));
    }

    #[test]
    fn reset_clears_toggles() {
        let mut state = SessionState::idle();
        state.begin(cam());
        state.is_recording = true;
        state.is_mic_on = true;
        state.move_mode = true;
        state.reset();
        assert!(!state.is_recording && !state.is_mic_on && !state.move_mode);
        assert!(state.device_id.is_none());
    }

    #[test]
    fn state_serializes_snake_case_fields() {
        let json = serde_json::to_value(SessionState::idle()).unwrap();
        assert_eq!(json["is_active"], false);
        assert_eq!(json["quality"], "high");
    }
}
