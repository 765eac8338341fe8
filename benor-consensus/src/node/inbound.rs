use tracing::trace;

use benor_common::Message;
use benor_p2p::{Broadcaster, MessageSink};

use crate::consensus::tiebreak::TieBreak;

use super::core::ConsensusNode;

impl<B: Broadcaster, T: TieBreak> ConsensusNode<B, T> {
    /// Inbound delivery. Returns whether the message was retained.
    ///
    /// Faulty, killed and decided nodes acknowledge but drop the content.
    pub fn receive(&self, message: Message) -> bool {
        if self.faulty {
            return false;
        }

        let state = self.state.snapshot();
        if state.killed || state.is_decided() {
            trace!("{} dropped {:?}", self.id, message);
            return false;
        }

        self.store.append(message)
    }
}

impl<B: Broadcaster, T: TieBreak> MessageSink for ConsensusNode<B, T> {
    fn deliver(&self, message: Message) {
        self.receive(message);
    }
}
