use arbor_consensus_core::{block::Block, utxo::UtxoMap};
use arbor_core::{debug, warn};
use async_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Emitted once per block whose connection was committed
#[derive(Debug, Clone)]
pub struct BlockConnectedNotification {
    pub block: Block,
    pub height: u32,
    /// The outputs spent by the block, for subscribers which asked for them
    pub spent_outputs: Option<Arc<UtxoMap>>,
}

struct Subscriber {
    include_spent_outputs: bool,
    sender: Sender<BlockConnectedNotification>,
}

/// Fans block connection events out to subscribers. Delivery never blocks the engine:
/// subscribers get unbounded channels and closed channels are dropped on the next send.
#[derive(Default)]
pub struct ConsensusNotificationRoot {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ConsensusNotificationRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, include_spent_outputs: bool) -> Receiver<BlockConnectedNotification> {
        let (sender, receiver) = async_channel::unbounded();
        self.subscribers.lock().push(Subscriber { include_spent_outputs, sender });
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn notify_block_connected(&self, block: &Block, height: u32, spent_outputs: UtxoMap) {
        let mut subscribers = self.subscribers.lock();
        if subscribers.is_empty() {
            return;
        }
        let spent_outputs = subscribers.iter().any(|s| s.include_spent_outputs).then(|| Arc::new(spent_outputs));
        subscribers.retain(|subscriber| {
            let notification = BlockConnectedNotification {
                block: block.clone(),
                height,
                spent_outputs: if subscriber.include_spent_outputs { spent_outputs.clone() } else { None },
            };
            match subscriber.sender.try_send(notification) {
                Ok(()) => true,
                Err(TrySendError::Closed(_)) => {
                    debug!("dropping a closed block notification subscriber");
                    false
                }
                Err(TrySendError::Full(_)) => {
                    warn!("block notification subscriber is full, skipping block {}", block.hash());
                    true
                }
            }
        });
    }
}
