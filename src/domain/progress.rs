//! Session progress tracking.
//!
//! Pure state over the blocks of one session: which block is active, when a
//! block is done, and when the whole session is done. No I/O happens here.

use crate::domain::models::Block;
use std::sync::{Arc, Mutex};

/// Result of applying one made shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub block_id: i64,
    pub made_shots: u32,
    pub advanced: bool,
    pub session_complete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionProgress {
    session_id: i64,
    blocks: Vec<Block>,
    active_index: usize,
}

impl SessionProgress {
    /// Build from server block stats. The active block is the first one that
    /// has not reached its plan, so a resumed session picks up where it was.
    pub fn new(session_id: i64, blocks: Vec<Block>) -> Self {
        let mut progress = Self {
            session_id,
            blocks,
            active_index: 0,
        };
        progress.skip_finished();
        progress
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn is_complete(&self) -> bool {
        self.active_index >= self.blocks.len()
    }

    pub fn active_block(&self) -> Option<&Block> {
        self.blocks.get(self.active_index)
    }

    /// Move to the next block. Returns `true` if the session is complete
    /// afterwards, including when it already was.
    pub fn advance_block(&mut self) -> bool {
        if self.is_complete() {
            return true;
        }
        self.active_index += 1;
        self.skip_finished();
        self.is_complete()
    }

    /// Operator ends the active block early. No-op once the session is complete.
    pub fn finish_block_manually(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.advance_block();
        true
    }

    /// Count one made shot against `block_id`.
    ///
    /// Advances only when that block is the active one and has reached its
    /// plan. Unknown ids leave the state untouched.
    pub fn record_made(&mut self, block_id: i64) -> Option<ProgressUpdate> {
        let index = self.blocks.iter().position(|b| b.id == block_id)?;
        let block = &mut self.blocks[index];
        block.made_shots += 1;
        let made_shots = block.made_shots;
        let finished = block.is_finished();

        let advanced = index == self.active_index && finished;
        if advanced {
            self.advance_block();
        }

        Some(ProgressUpdate {
            block_id,
            made_shots,
            advanced,
            session_complete: self.is_complete(),
        })
    }

    pub fn made_total(&self) -> u32 {
        self.blocks.iter().map(|b| b.made_shots).sum()
    }

    pub fn missed_total(&self) -> u32 {
        self.blocks.iter().map(|b| b.missed_shots).sum()
    }

    pub fn planned_total(&self) -> u32 {
        self.blocks.iter().map(|b| b.shots_planned).sum()
    }

    fn skip_finished(&mut self) {
        while self
            .blocks
            .get(self.active_index)
            .is_some_and(|b| b.is_finished())
        {
            self.active_index += 1;
        }
    }
}

/// A session being played, together with the user it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub user_id: i64,
    pub progress: SessionProgress,
}

impl ActiveSession {
    pub fn session_id(&self) -> i64 {
        self.progress.session_id()
    }
}

/// Shared between the UI thread and the shot recorder task.
pub type SharedSession = Arc<Mutex<Option<ActiveSession>>>;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::models::TargetArea;

    pub(crate) fn block(id: i64, planned: u32, made: u32) -> Block {
        Block {
            id,
            target_area: TargetArea::TopRight,
            shots_planned: planned,
            made_shots: made,
            missed_shots: 0,
        }
    }

    #[test]
    fn test_reaching_plan_advances_to_next_block() {
        let mut progress = SessionProgress::new(1, vec![block(10, 5, 4), block(11, 5, 0)]);
        assert_eq!(progress.active_block().map(|b| b.id), Some(10));

        let update = progress.record_made(10).unwrap();
        assert_eq!(update.made_shots, 5);
        assert!(update.advanced);
        assert!(!update.session_complete);
        assert_eq!(progress.active_block().map(|b| b.id), Some(11));
    }

    #[test]
    fn test_last_block_completion_completes_session() {
        let mut progress = SessionProgress::new(1, vec![block(10, 5, 4)]);
        let update = progress.record_made(10).unwrap();
        assert!(update.session_complete);
        assert!(progress.is_complete());
        assert_eq!(progress.active_block(), None);
    }

    #[test]
    fn test_fully_made_session_is_complete_on_load() {
        let progress = SessionProgress::new(1, vec![block(10, 5, 5), block(11, 5, 5)]);
        assert!(progress.is_complete());
        assert_eq!(progress.active_index(), 2);
    }

    #[test]
    fn test_advance_on_complete_session_stays_complete() {
        let mut progress = SessionProgress::new(1, vec![block(10, 2, 2)]);
        assert!(progress.is_complete());
        assert!(progress.advance_block());
        assert_eq!(progress.active_index(), 1);
    }

    #[test]
    fn test_resume_skips_finished_blocks() {
        let progress = SessionProgress::new(1, vec![block(10, 3, 3), block(11, 4, 1)]);
        assert_eq!(progress.active_block().map(|b| b.id), Some(11));
    }

    #[test]
    fn test_manual_finish_moves_exactly_one_block() {
        let mut progress =
            SessionProgress::new(1, vec![block(10, 5, 0), block(11, 5, 0), block(12, 5, 0)]);
        assert!(progress.finish_block_manually());
        assert_eq!(progress.active_index(), 1);
        assert!(progress.finish_block_manually());
        assert!(progress.finish_block_manually());
        assert!(progress.is_complete());
        assert!(!progress.finish_block_manually());
        assert_eq!(progress.active_index(), 3);
    }

    #[test]
    fn test_made_shot_on_skipped_block_does_not_advance() {
        let mut progress = SessionProgress::new(1, vec![block(10, 1, 0), block(11, 2, 0)]);
        progress.finish_block_manually();

        let update = progress.record_made(10).unwrap();
        assert_eq!(update.made_shots, 1);
        assert!(!update.advanced);
        assert_eq!(progress.active_block().map(|b| b.id), Some(11));
    }

    #[test]
    fn test_unknown_block_is_ignored() {
        let mut progress = SessionProgress::new(1, vec![block(10, 2, 0)]);
        assert_eq!(progress.record_made(99), None);
        assert_eq!(progress.made_total(), 0);
    }

    #[test]
    fn test_totals() {
        let mut b = block(11, 4, 1);
        b.missed_shots = 2;
        let progress = SessionProgress::new(1, vec![block(10, 3, 3), b]);
        assert_eq!(progress.made_total(), 4);
        assert_eq!(progress.missed_total(), 2);
        assert_eq!(progress.planned_total(), 7);
    }
}
