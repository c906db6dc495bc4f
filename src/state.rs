//! Progress/cancellation handle threaded through every blocking
//! operation (spec §5, REDESIGN FLAGS §9).
//!
//! A [`State`] node declares its step plan up front with
//! [`State::set_steps`], then calls [`State::done`] after each step;
//! descending into a sub-operation creates a child via
//! [`State::child`] whose `done` calls propagate weighted progress to
//! the parent. Percentages never decrease.
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

struct Inner {
    weights: Vec<u32>,
    completed: u32,
    total_weight: u32,
    last_percent: u32,
    action: String,
}

impl Default for Inner {
    fn default() -> Self {
        Inner {
            weights: Vec::new(),
            completed: 0,
            total_weight: 0,
            last_percent: 0,
            action: String::new(),
        }
    }
}

pub struct State {
    inner: Mutex<Inner>,
    cancelled: Arc<AtomicBool>,
    parent_share: Option<(Arc<State>, u32, u32)>, // (parent, this child's index, weight)
    step_index: AtomicU32,
}

impl State {
    pub fn root() -> Arc<Self> {
        Arc::new(State {
            inner: Mutex::new(Inner::default()),
            cancelled: Arc::new(AtomicBool::new(false)),
            parent_share: None,
            step_index: AtomicU32::new(0),
        })
    }

    /// Declares the relative weight of each step this operation will
    /// call `done()` for.
    pub fn set_steps(self: &Arc<Self>, weights: &[u32]) {
        let mut inner = self.inner.lock().unwrap();
        inner.total_weight = weights.iter().sum();
        inner.weights = weights.to_vec();
        inner.completed = 0;
    }

    /// Creates a child handle that shares this node's cancellation token
    /// and reports a weighted slice of this node's progress.
    pub fn child(self: &Arc<Self>, weight: u32) -> Arc<State> {
        let idx = self.step_index.fetch_add(1, Ordering::SeqCst);
        Arc::new(State {
            inner: Mutex::new(Inner::default()),
            cancelled: self.cancelled.clone(),
            parent_share: Some((self.clone(), idx, weight)),
            step_index: AtomicU32::new(0),
        })
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn set_action(&self, action: impl Into<String>) {
        self.inner.lock().unwrap().action = action.into();
    }

    pub fn description(&self) -> String {
        self.inner.lock().unwrap().action.clone()
    }

    /// Marks the next declared step complete and propagates progress.
    /// Panics if called more times than steps were declared — a
    /// violated step plan is a programming error (§9).
    pub fn done(self: &Arc<Self>) {
        let percent = {
            let mut inner = self.inner.lock().unwrap();
            let idx = inner.completed as usize;
            assert!(
                idx < inner.weights.len() || inner.weights.is_empty(),
                "State::done called more times than declared steps"
            );
            inner.completed += 1;
            if inner.total_weight == 0 {
                100
            } else {
                let done_weight: u32 = inner.weights.iter().take(inner.completed as usize).sum();
                (done_weight * 100) / inner.total_weight
            }
        };
        self.report(percent);
    }

    fn report(self: &Arc<Self>, percent: u32) {
        let mut inner = self.inner.lock().unwrap();
        if percent > inner.last_percent {
            inner.last_percent = percent;
        }
        let observed = inner.last_percent;
        drop(inner);
        if let Some((parent, _idx, weight)) = &self.parent_share {
            let parent_percent = observed * weight / 100;
            parent.report_child_progress(parent_percent);
        }
    }

    fn report_child_progress(self: &Arc<Self>, amount: u32) {
        let mut inner = self.inner.lock().unwrap();
        let candidate = inner.last_percent.saturating_add(amount).min(100);
        if candidate > inner.last_percent {
            inner.last_percent = candidate;
        }
    }

    pub fn percent(&self) -> u32 {
        self.inner.lock().unwrap().last_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_monotonic() {
        let state = State::root();
        state.set_steps(&[1, 1, 1, 1]);
        let mut last = 0;
        for _ in 0..4 {
            state.done();
            assert!(state.percent() >= last);
            last = state.percent();
        }
        assert_eq!(state.percent(), 100);
    }

    #[test]
    fn cancellation_is_observed_by_children() {
        let root = State::root();
        let child = root.child(100);
        root.cancel();
        assert!(child.is_cancelled());
    }
}
