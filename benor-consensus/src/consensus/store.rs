use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use benor_common::{Message, Phase, Value};

#[derive(Debug, Default)]
struct Buffers {
    // Round -> messages in arrival order.
    rounds: BTreeMap<u64, Vec<Message>>,
    // Every round <= this one has been evicted.
    evicted_through: u64,
}

/// Per-round message buffer shared by inbound delivery (append) and the
/// round driver (read, evict).
///
/// Every accepted append bumps an arrival counter that waiters subscribe to.
#[derive(Debug)]
pub struct RoundMessageStore {
    buffers: Mutex<Buffers>,
    arrivals: watch::Sender<u64>,
}

impl Default for RoundMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundMessageStore {
    pub fn new() -> Self {
        let (arrivals, _) = watch::channel(0);
        Self {
            buffers: Mutex::new(Buffers::default()),
            arrivals,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Buffers> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Buffers `message`. Returns `false` if its round was already evicted.
    pub fn append(&self, message: Message) -> bool {
        {
            let mut buffers = self.lock();
            if message.round <= buffers.evicted_through {
                return false;
            }
            buffers.rounds.entry(message.round).or_default().push(message);
        }
        self.arrivals.send_modify(|count| *count += 1);
        true
    }

    /// Snapshot of the messages buffered for `round` in `phase`.
    pub fn read(&self, round: u64, phase: Phase) -> Vec<Message> {
        self.lock()
            .rounds
            .get(&round)
            .map(|msgs| msgs.iter().filter(|m| m.phase == phase).copied().collect())
            .unwrap_or_default()
    }

    pub fn values(&self, round: u64, phase: Phase) -> Vec<Value> {
        self.read(round, phase).into_iter().map(|m| m.value).collect()
    }

    pub fn count(&self, round: u64, phase: Phase) -> usize {
        self.lock()
            .rounds
            .get(&round)
            .map(|msgs| msgs.iter().filter(|m| m.phase == phase).count())
            .unwrap_or(0)
    }

    /// Drops `round` and everything older. Later appends for those rounds are refused.
    pub fn evict(&self, round: u64) {
        let mut buffers = self.lock();
        let kept = buffers.rounds.split_off(&(round + 1));
        buffers.rounds = kept;
        buffers.evicted_through = buffers.evicted_through.max(round);
    }

    /// Rounds that currently hold at least one message.
    pub fn buffered_rounds(&self) -> Vec<u64> {
        self.lock().rounds.keys().copied().collect()
    }

    /// Notified on every accepted append.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.arrivals.subscribe()
    }
}
