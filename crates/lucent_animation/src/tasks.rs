//! Deferred one-shot tasks
//!
//! Tasks carry the generation that was current when they were scheduled. The
//! queue only hands back tasks whose due time has passed; deciding whether a
//! task is still relevant is left to the owner, which compares the stored
//! generation against its own.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    pub struct TaskId;
}

/// A scheduled task
#[derive(Clone, Debug, PartialEq)]
pub struct Deferred<T> {
    pub due: f64,
    pub generation: u64,
    pub payload: T,
}

/// Pending deferred tasks keyed by [`TaskId`]
pub struct TaskQueue<T> {
    tasks: SlotMap<TaskId, Deferred<T>>,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            tasks: SlotMap::with_key(),
        }
    }

    /// Schedule `payload` to run at `now + delay`
    pub fn schedule(&mut self, now: f64, delay: f64, generation: u64, payload: T) -> TaskId {
        self.tasks.insert(Deferred {
            due: now + delay.max(0.0),
            generation,
            payload,
        })
    }

    /// Cancel a task. Returns it if it was still pending.
    pub fn cancel(&mut self, id: TaskId) -> Option<Deferred<T>> {
        self.tasks.remove(id)
    }

    /// Cancel every task matching `predicate`
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) {
        self.tasks.retain(|_, task| !predicate(&task.payload));
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Earliest due time among pending tasks
    pub fn next_due(&self) -> Option<f64> {
        self.tasks.values().map(|task| task.due).reduce(f64::min)
    }

    /// Remove and return all tasks due at or before `now`, earliest first
    pub fn drain_due(&mut self, now: f64) -> SmallVec<[(TaskId, Deferred<T>); 4]> {
        let due: SmallVec<[TaskId; 4]> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due <= now)
            .map(|(id, _)| id)
            .collect();

        let mut drained: SmallVec<[(TaskId, Deferred<T>); 4]> = due
            .into_iter()
            .filter_map(|id| self.tasks.remove(id).map(|task| (id, task)))
            .collect();
        drained.sort_by(|a, b| a.1.due.total_cmp(&b.1.due));
        drained
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
