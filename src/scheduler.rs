//! Cooperative task scheduling
//!
//! The engine runs on the host's single UI thread. Work that the original
//! environment would defer to an animation frame or a timer is queued here as
//! explicit tasks with cancellable handles, and the host drives execution by
//! calling `GridEngine::tick` once per frame.
//!
//! Frame tasks scheduled while a frame is being drained land in the next
//! frame, which is what gives the visibility reconciler its two distinct
//! render passes on consecutive frame boundaries.

use crate::grid::registry::InstanceId;
use crate::preview::PreviewId;
use std::time::{Duration, Instant};

/// Handle to a scheduled task, usable to cancel it before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Which re-render pass to run for a freshly visible instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    /// Invalidate and redraw currently materialized rows.
    Visible,
    /// Force invalidation of every row.
    All,
}

/// Deferred work executed on a later tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// One pass of the visibility reconciler's two-pass re-render.
    Rerender {
        instance: InstanceId,
        pass: RenderPass,
    },
    /// Debounced canvas resize; `None` targets every live instance.
    Resize { target: Option<InstanceId> },
    /// Post-recreation settling: reassert columns and force a full redraw
    /// once the host has settled the mount's geometry.
    SettleRecreate { instance: InstanceId },
    /// Revert a preview's action controls to idle after a failure was shown.
    ResetActionFeedback { preview: PreviewId },
}

/// Frame and timer queues with cancellable entries.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    frame: Vec<(TaskId, Task)>,
    timers: Vec<(TaskId, Instant, Task)>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId(self.next_id)
    }

    /// Run `task` on the next frame boundary.
    pub fn schedule_frame(&mut self, task: Task) -> TaskId {
        let id = self.next_id();
        self.frame.push((id, task));
        id
    }

    /// Run `task` once `delay` has elapsed past `now`.
    pub fn schedule_after(&mut self, now: Instant, delay: Duration, task: Task) -> TaskId {
        let id = self.next_id();
        self.timers.push((id, now + delay, task));
        id
    }

    /// Cancel a pending task. Returns whether anything was removed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let frame_len = self.frame.len();
        self.frame.retain(|(task_id, _)| *task_id != id);
        if self.frame.len() != frame_len {
            return true;
        }
        let timer_len = self.timers.len();
        self.timers.retain(|(task_id, _, _)| *task_id != id);
        self.timers.len() != timer_len
    }

    /// Take everything due at `now`: the whole current frame queue plus any
    /// expired timers. Tasks scheduled during execution go to the next frame.
    pub fn take_due(&mut self, now: Instant) -> Vec<Task> {
        let mut due: Vec<Task> = std::mem::take(&mut self.frame)
            .into_iter()
            .map(|(_, task)| task)
            .collect();

        let mut remaining = Vec::with_capacity(self.timers.len());
        for (id, when, task) in self.timers.drain(..) {
            if when <= now {
                due.push(task);
            } else {
                remaining.push((id, when, task));
            }
        }
        self.timers = remaining;

        due
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.frame.clear();
        self.timers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty() && self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resize_task() -> Task {
        Task::Resize { target: None }
    }

    #[test]
    fn test_frame_tasks_run_on_next_take() {
        let mut scheduler = FrameScheduler::new();
        scheduler.schedule_frame(resize_task());
        let due = scheduler.take_due(Instant::now());
        assert_eq!(due.len(), 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_cancel_removes_pending_task() {
        let mut scheduler = FrameScheduler::new();
        let id = scheduler.schedule_frame(resize_task());
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.take_due(Instant::now()).is_empty());
    }

    #[test]
    fn test_timer_fires_only_after_delay() {
        let mut scheduler = FrameScheduler::new();
        let now = Instant::now();
        scheduler.schedule_after(now, Duration::from_millis(100), resize_task());

        assert!(scheduler.take_due(now).is_empty());
        let due = scheduler.take_due(now + Duration::from_millis(150));
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn test_timer_cancellation() {
        let mut scheduler = FrameScheduler::new();
        let now = Instant::now();
        let id = scheduler.schedule_after(now, Duration::from_millis(10), resize_task());
        assert!(scheduler.cancel(id));
        assert!(scheduler
            .take_due(now + Duration::from_millis(50))
            .is_empty());
    }

    #[test]
    fn test_frame_queue_drains_as_snapshot() {
        // A task scheduled while draining must not run in the same frame.
        let mut scheduler = FrameScheduler::new();
        scheduler.schedule_frame(resize_task());
        let due = scheduler.take_due(Instant::now());
        assert_eq!(due.len(), 1);
        scheduler.schedule_frame(resize_task());
        // Still queued for the next frame, untouched by the drain above.
        assert!(!scheduler.is_empty());
    }
}
