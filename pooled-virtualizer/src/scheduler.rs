use alloc::vec::Vec;

/// When a deferred task should run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lane {
    /// After the current synchronous work, before the next frame.
    Microtask,
    /// On the next paint.
    Frame,
    /// Only while the host is otherwise idle.
    Idle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Task {
    /// Full render pass. `reset_average` drops stale size estimates first (resize).
    Render { reset_average: bool },
    /// Scroll-driven recycle pass.
    Scroll,
    /// Grow the pool by the given number of slots (0 = just re-check).
    IncreasePool(usize),
}

impl Task {
    fn same_kind(&self, other: &Task) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    fn merge(self, previous: Task) -> Task {
        match (self, previous) {
            (
                Task::Render { reset_average: a },
                Task::Render { reset_average: b },
            ) => Task::Render {
                reset_average: a || b,
            },
            (next, _) => next,
        }
    }
}

/// A debounced, three-lane task queue.
///
/// Scheduling a task whose kind is already queued (in any lane) replaces the queued one, so
/// bursts of scroll events collapse into one pass and a pool-growth continuation can be moved
/// from the microtask lane to the idle lane.
#[derive(Clone, Debug, Default)]
pub(crate) struct Scheduler {
    queue: Vec<(Lane, Task)>,
}

impl Scheduler {
    pub(crate) fn debounce(&mut self, lane: Lane, task: Task) {
        let mut task = task;
        if let Some(pos) = self.queue.iter().position(|(_, t)| t.same_kind(&task)) {
            let (_, previous) = self.queue.remove(pos);
            task = task.merge(previous);
        }
        vtrace!(?lane, ?task, "schedule");
        self.queue.push((lane, task));
    }

    pub(crate) fn cancel_all(&mut self) {
        self.queue.clear();
    }

    /// Removes and returns the oldest task of `lane`.
    pub(crate) fn pop(&mut self, lane: Lane) -> Option<Task> {
        let pos = self.queue.iter().position(|(l, _)| *l == lane)?;
        Some(self.queue.remove(pos).1)
    }

    /// Removes and returns every task currently queued in `lane`.
    pub(crate) fn drain(&mut self, lane: Lane) -> Vec<Task> {
        let mut out = Vec::new();
        self.queue.retain(|(l, t)| {
            if *l == lane {
                out.push(*t);
                false
            } else {
                true
            }
        });
        out
    }

    pub(crate) fn has(&self, lane: Lane) -> bool {
        self.queue.iter().any(|(l, _)| *l == lane)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
