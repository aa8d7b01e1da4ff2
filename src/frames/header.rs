//! Frame header snapshots

use serde::{Deserialize, Serialize};

/// Copy of one slot's header as read from the region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Payload fully written and stable
    pub ready: bool,
    /// Consumer has released the slot
    pub consumed: bool,
    pub frame_id: u32,
    pub scene_length: u32,
    pub ui_length: u32,
}

impl FrameHeader {
    /// A published frame the consumer has not released yet
    pub fn is_pending(&self) -> bool {
        self.ready && !self.consumed
    }

    /// The producer may overwrite this slot
    pub fn is_free(&self) -> bool {
        !self.ready || self.consumed
    }
}

/// Whether frame `a` was published after frame `b`, tolerating id wraparound
pub fn is_newer(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states() {
        let initial = FrameHeader {
            consumed: true,
            ..Default::default()
        };
        assert!(initial.is_free());
        assert!(!initial.is_pending());

        let published = FrameHeader {
            ready: true,
            consumed: false,
            frame_id: 3,
            ..Default::default()
        };
        assert!(published.is_pending());
        assert!(!published.is_free());
    }

    #[test]
    fn test_newer_wraps() {
        assert!(is_newer(2, 1));
        assert!(!is_newer(1, 1));
        assert!(!is_newer(1, 2));
        assert!(is_newer(0, u32::MAX));
    }
}
