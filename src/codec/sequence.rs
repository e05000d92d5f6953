//! Frame sequence gap accounting

/// Tracks frame sequence numbers and counts frames the client never saw.
///
/// When a frame number does not immediately follow the previous one, the distance
/// between them is added to `skipped`. The counter is never decremented. A decreasing
/// sequence (device restart) wraps and records one large gap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSequence {
    previous: Option<u32>,
    skipped: u64,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully decoded frame number, returning the gap it added.
    pub fn observe(&mut self, frame_number: u32) -> u64 {
        let gap = match self.previous {
            Some(previous) if previous.wrapping_add(1) != frame_number => {
                u64::from(frame_number.wrapping_sub(previous))
            }
            _ => 0,
        };
        self.skipped += gap;
        self.previous = Some(frame_number);
        gap
    }

    /// Last decoded frame number, `None` until the first frame.
    pub fn previous(&self) -> Option<u32> {
        self.previous
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped_after(frames: &[u32]) -> u64 {
        let mut sequence = FrameSequence::new();
        for &frame in frames {
            sequence.observe(frame);
        }
        sequence.skipped()
    }

    #[test]
    fn gap_adds_distance() {
        assert_eq!(skipped_after(&[5, 6, 8, 9]), 2);
    }

    #[test]
    fn consecutive_frames_add_nothing() {
        assert_eq!(skipped_after(&[5, 6, 7, 8]), 0);
    }

    #[test]
    fn first_frame_sets_previous_only() {
        let mut sequence = FrameSequence::new();
        assert_eq!(sequence.previous(), None);
        assert_eq!(sequence.observe(1000), 0);
        assert_eq!(sequence.previous(), Some(1000));
    }

    #[test]
    fn decreasing_sequence_records_wrapping_gap() {
        let mut sequence = FrameSequence::new();
        sequence.observe(10);
        let gap = sequence.observe(0);
        assert_eq!(gap, u64::from(0u32.wrapping_sub(10)));
        assert_eq!(sequence.previous(), Some(0));
    }

    #[test]
    fn wraparound_at_u32_max_is_consecutive() {
        assert_eq!(skipped_after(&[u32::MAX - 1, u32::MAX, 0]), 0);
    }
}
