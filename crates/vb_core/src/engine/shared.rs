//! Shared handle for one writer and many readers.
//!
//! Mutations take the write lock, reads take the read lock and return owned
//! copies, so a reader never sees rotation, phase and score from different
//! rallies.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::controller::MatchController;
use super::snapshot::{MatchSnapshot, RallyResult, RallyStatus};
use crate::error::{EngineError, Result};
use crate::models::{Action, Match, Rotation, ScoreCorrection};

#[derive(Debug, Clone)]
pub struct SharedMatch {
    inner: Arc<RwLock<MatchController>>,
}

impl SharedMatch {
    pub fn new(controller: MatchController) -> Self {
        Self { inner: Arc::new(RwLock::new(controller)) }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MatchController>> {
        self.inner.read().map_err(|_| EngineError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MatchController>> {
        self.inner.write().map_err(|_| EngineError::LockPoisoned)
    }

    pub fn snapshot(&self) -> Result<MatchSnapshot> {
        Ok(self.read()?.current_snapshot())
    }

    pub fn match_record(&self) -> Result<Match> {
        Ok(self.read()?.match_record().clone())
    }

    pub fn record_action(&self, action: Action) -> Result<RallyStatus> {
        self.write()?.record_action(action)
    }

    pub fn close_rally(&self) -> Result<RallyResult> {
        self.write()?.close_rally()
    }

    pub fn correct_score(&self, ours: u32, opponents: u32) -> Result<ScoreCorrection> {
        self.write()?.correct_score(ours, opponents)
    }

    pub fn undo_last_action(&self) -> Result<Option<Action>> {
        self.write()?.undo_last_action()
    }

    pub fn set_next_set_rotation(&self, rotation: Rotation) -> Result<()> {
        self.write()?.set_next_set_rotation(rotation)
    }

    /// Run `f` with exclusive access, for multi-step edits that must not
    /// interleave with other writers.
    pub fn with_controller<T>(&self, f: impl FnOnce(&mut MatchController) -> Result<T>) -> Result<T> {
        let mut guard = self.write()?;
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::models::{ActionKind, AttackOutcome, AttackType, Role, SetScore};
    use std::thread;

    fn kill() -> Action {
        Action::by(Role::Opposite, ActionKind::attack(AttackOutcome::Kill, AttackType::Tip)).unwrap()
    }

    #[test]
    fn test_readers_see_whole_rallies() {
        let shared = SharedMatch::new(MatchController::new(MatchConfig::default()).unwrap());
        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    shared.record_action(kill()).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let snap = shared.snapshot().unwrap();
                        // every sealed rally was won, so point == score + 1
                        assert_eq!(snap.point, snap.score.ours + 1);
                        assert_eq!(snap.score.opponents, 0);
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(shared.snapshot().unwrap().score, SetScore::new(20, 0));
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let shared = SharedMatch::new(MatchController::new(MatchConfig::default()).unwrap());
        let poisoner = shared.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("writer crashed");
        })
        .join();
        assert_eq!(shared.snapshot().unwrap_err(), EngineError::LockPoisoned);
    }

    #[test]
    fn test_with_controller_batches_edits() {
        let shared = SharedMatch::new(MatchController::new(MatchConfig::default()).unwrap());
        let score = shared
            .with_controller(|c| {
                c.record_action(kill())?;
                c.record_action(kill())?;
                Ok(c.current_snapshot().score)
            })
            .unwrap();
        assert_eq!(score, SetScore::new(2, 0));
    }

    #[test]
    fn test_next_set_rotation_through_handle() {
        let shared = SharedMatch::new(MatchController::new(MatchConfig::default()).unwrap());
        for _ in 0..25 {
            shared.record_action(kill()).unwrap();
        }
        let three = Rotation::new(3).unwrap();
        shared.set_next_set_rotation(three).unwrap();
        assert_eq!(shared.snapshot().unwrap().rotation, three);
    }
}
