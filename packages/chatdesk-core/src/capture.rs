//! Capture state machines for the media send flows.
//!
//! The browser front end drove audio recording and image attachment through
//! ad-hoc callbacks; here each flow is an explicit state machine with events
//! as inputs and no UI dependency. Invalid transitions are errors, never
//! panics, so a confused caller cannot corrupt a draft.

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// States of the audio recording flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Stopped,
    Previewed,
    Sent,
}

/// Audio recorder: `Idle → Recording → Stopped → Previewed → Sent`.
///
/// Chunks accumulate only while recording; `discard` returns to idle from
/// any state and drops buffered audio.
#[derive(Debug, Clone, Default)]
pub struct AudioRecorder {
    state: RecorderState,
    chunks: Vec<Vec<u8>>,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
}

impl AudioRecorder {
    /// Create an idle recorder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Total bytes buffered so far.
    pub fn len_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Wall-clock duration of the recording, once stopped.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.stopped_at) {
            (Some(started), Some(stopped)) => Some(stopped - started),
            _ => None,
        }
    }

    /// Begin a new recording. Valid from idle or after a completed send.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.state {
            RecorderState::Idle | RecorderState::Sent => {
                self.state = RecorderState::Recording;
                self.chunks.clear();
                self.started_at = Some(now);
                self.stopped_at = None;
                Ok(())
            }
            state => Err(Error::InvalidTransition(format!(
                "cannot start recording from {:?}",
                state
            ))),
        }
    }

    /// Buffer a chunk of captured audio. Valid only while recording.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if self.state != RecorderState::Recording {
            return Err(Error::InvalidTransition(format!(
                "cannot buffer audio from {:?}",
                self.state
            )));
        }
        self.chunks.push(chunk.to_vec());
        Ok(())
    }

    /// Stop the recording.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != RecorderState::Recording {
            return Err(Error::InvalidTransition(format!(
                "cannot stop from {:?}",
                self.state
            )));
        }
        self.state = RecorderState::Stopped;
        self.stopped_at = Some(now);
        Ok(())
    }

    /// Move to preview and expose the assembled audio.
    pub fn preview(&mut self) -> Result<Vec<u8>> {
        if self.state != RecorderState::Stopped {
            return Err(Error::InvalidTransition(format!(
                "cannot preview from {:?}",
                self.state
            )));
        }
        self.state = RecorderState::Previewed;
        Ok(self.chunks.concat())
    }

    /// Mark the previewed recording as sent, returning the audio bytes.
    pub fn mark_sent(&mut self) -> Result<Vec<u8>> {
        if self.state != RecorderState::Previewed {
            return Err(Error::InvalidTransition(format!(
                "cannot send from {:?}",
                self.state
            )));
        }
        self.state = RecorderState::Sent;
        Ok(std::mem::take(&mut self.chunks).concat())
    }

    /// Abandon the current recording from any state.
    pub fn discard(&mut self) {
        *self = Self::default();
    }
}

/// States of the image attachment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftState {
    #[default]
    Empty,
    Selected,
    Previewed,
    Sent,
}

/// Image attachment draft: `Empty → Selected → Previewed → Sent`.
#[derive(Debug, Clone)]
pub struct AttachmentDraft {
    state: DraftState,
    max_bytes: usize,
    file_name: Option<String>,
    bytes: Vec<u8>,
    caption: Option<String>,
}

impl AttachmentDraft {
    /// Create an empty draft with a selection size limit.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            state: DraftState::Empty,
            max_bytes,
            file_name: None,
            bytes: Vec::new(),
            caption: None,
        }
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Select a file. Oversized selections are rejected and the draft stays
    /// empty; re-selection is allowed after a completed send.
    pub fn select(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        match self.state {
            DraftState::Empty | DraftState::Sent => {}
            state => {
                return Err(Error::InvalidTransition(format!(
                    "cannot select a file from {:?}",
                    state
                )))
            }
        }
        if bytes.len() > self.max_bytes {
            return Err(Error::AttachmentTooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        self.state = DraftState::Selected;
        self.file_name = Some(file_name.to_string());
        self.bytes = bytes;
        self.caption = None;
        Ok(())
    }

    /// Attach or replace the caption. Valid once a file is selected.
    pub fn set_caption(&mut self, caption: &str) -> Result<()> {
        match self.state {
            DraftState::Selected | DraftState::Previewed => {
                self.caption = Some(caption.to_string());
                Ok(())
            }
            state => Err(Error::InvalidTransition(format!(
                "cannot caption from {:?}",
                state
            ))),
        }
    }

    /// Move to preview and expose the selected bytes.
    pub fn preview(&mut self) -> Result<&[u8]> {
        if self.state != DraftState::Selected {
            return Err(Error::InvalidTransition(format!(
                "cannot preview from {:?}",
                self.state
            )));
        }
        self.state = DraftState::Previewed;
        Ok(&self.bytes)
    }

    /// Mark the previewed attachment as sent, returning its bytes.
    pub fn mark_sent(&mut self) -> Result<Vec<u8>> {
        if self.state != DraftState::Previewed {
            return Err(Error::InvalidTransition(format!(
                "cannot send from {:?}",
                self.state
            )));
        }
        self.state = DraftState::Sent;
        self.file_name = None;
        Ok(std::mem::take(&mut self.bytes))
    }

    /// Abandon the draft from any state.
    pub fn discard(&mut self) {
        let max_bytes = self.max_bytes;
        *self = Self::new(max_bytes);
    }
}
