use std::marker::PhantomData;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use benor_common::{NodeId, NodeState, ProtocolParams, Value};
use benor_p2p::Broadcaster;

use crate::config::ProtocolConfig;
use crate::consensus::store::RoundMessageStore;
use crate::consensus::tiebreak::{SelectedTieBreak, TieBreak};

use super::state::StateHandle;

/// One participant of a Ben-Or network.
///
/// Owns the node's state, its round buffer and its outbound broadcaster. The
/// lifecycle surface (`start`, `stop`, `is_live`, `get_state`) and the
/// inbound path (`receive`) are implemented in sibling modules.
pub struct ConsensusNode<B: Broadcaster, T: TieBreak = SelectedTieBreak> {
    pub(super) id: NodeId,
    pub(super) params: ProtocolParams,
    pub(super) config: ProtocolConfig,
    pub(super) faulty: bool,
    pub(super) state: Arc<StateHandle>,
    pub(super) store: Arc<RoundMessageStore>,
    pub(super) broadcaster: Arc<B>,
    pub(super) started: AtomicBool,
    pub(super) driver: Mutex<Option<JoinHandle<()>>>,
    pub(super) _tie_break: PhantomData<fn() -> T>,
}

impl<B: Broadcaster, T: TieBreak> ConsensusNode<B, T> {
    /// Builds an idle node. A faulty node ignores `initial` and keeps the
    /// null sentinel forever.
    pub fn new(
        id: NodeId,
        params: ProtocolParams,
        config: ProtocolConfig,
        initial: Value,
        faulty: bool,
        broadcaster: B,
    ) -> Self {
        let state = if faulty {
            NodeState::faulty()
        } else {
            NodeState::participating(initial)
        };

        Self {
            id,
            params,
            config,
            faulty,
            state: Arc::new(StateHandle::new(state)),
            store: Arc::new(RoundMessageStore::new()),
            broadcaster: Arc::new(broadcaster),
            started: AtomicBool::new(false),
            driver: Mutex::new(None),
            _tie_break: PhantomData,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn params(&self) -> ProtocolParams {
        self.params
    }

    pub fn is_faulty(&self) -> bool {
        self.faulty
    }

    /// Observes every state change, e.g. to wait for a decision.
    pub fn subscribe(&self) -> watch::Receiver<NodeState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &RoundMessageStore {
        &self.store
    }
}
