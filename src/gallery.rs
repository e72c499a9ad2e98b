//! Gallery navigation state machine.
//!
//! UI-free: the rendering layer owns presentation, this type only tracks
//! which photo of which sequence is current. Not persisted across sessions.

use crate::types::Photo;

/// Gallery state: either closed, or open over a photo sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gallery {
    #[default]
    Closed,
    Open {
        images: Vec<Photo>,
        index: usize,
    },
}

impl Gallery {
    pub fn new() -> Self {
        Self::Closed
    }

    /// Open over `images`, starting at `start_index` (wrapped into range).
    /// Opening with an empty sequence is a no-op; the engine's click
    /// contract never produces one.
    pub fn open_with(&mut self, images: Vec<Photo>, start_index: usize) {
        if images.is_empty() {
            return;
        }
        let index = start_index % images.len();
        *self = Self::Open { images, index };
    }

    /// Advance to the next image, wrapping at the end. Self-loop when
    /// closed or showing a single image.
    pub fn next(&mut self) {
        if let Self::Open { images, index } = self {
            if images.len() > 1 {
                *index = (*index + 1) % images.len();
            }
        }
    }

    /// Step to the previous image, wrapping at the start. Self-loop when
    /// closed or showing a single image.
    pub fn prev(&mut self) {
        if let Self::Open { images, index } = self {
            if images.len() > 1 {
                *index = (*index + images.len() - 1) % images.len();
            }
        }
    }

    pub fn close(&mut self) {
        *self = Self::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The photo currently shown, if any.
    pub fn current(&self) -> Option<&Photo> {
        match self {
            Self::Closed => None,
            Self::Open { images, index } => images.get(*index),
        }
    }

    /// Number of images in the open sequence (0 when closed).
    pub fn len(&self) -> usize {
        match self {
            Self::Closed => 0,
            Self::Open { images, .. } => images.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
