use tokio::sync::watch;

use benor_common::NodeState;

/// Single-writer cell holding a node's `NodeState`, published as snapshots.
///
/// The driver writes through `update`; the only other write is `kill`. Both
/// go through the channel's lock, so no update can land after a kill.
#[derive(Debug)]
pub(crate) struct StateHandle {
    tx: watch::Sender<NodeState>,
}

impl StateHandle {
    pub(crate) fn new(initial: NodeState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn snapshot(&self) -> NodeState {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<NodeState> {
        self.tx.subscribe()
    }

    pub(crate) fn is_killed(&self) -> bool {
        self.tx.borrow().killed
    }

    /// Sets `killed`. Returns `true` only for the call that flipped it.
    pub(crate) fn kill(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.killed {
                false
            } else {
                state.killed = true;
                true
            }
        })
    }

    /// Applies `mutate` unless the node is killed. Returns whether it was applied.
    pub(crate) fn update(&self, mutate: impl FnOnce(&mut NodeState)) -> bool {
        self.tx.send_if_modified(|state| {
            if state.killed {
                false
            } else {
                mutate(state);
                true
            }
        })
    }
}
