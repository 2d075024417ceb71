use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;

use minhton::config::NetworkParams;
use minhton::fsm::FsmState;
use minhton::id::NodeInfo;
use minhton::local_data::ValueType;
use minhton::messages::Message;
use minhton::network_info::NetworkInfo;
use minhton::participant::{Event, Participant};
use minhton::position::LogicalPosition;
use minhton::uuid_gen::{AscendingCounter, UuidGenerator};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration, Instant};

/// Spins up a participant bound to a real loopback TCP listener and starts
/// both its inbound-message bridge and its event loop as background tasks.
///
/// Grounded on the teacher's `TestNodeBuilder` (`tests/utils.rs`):
/// builder methods configure a node, `create()` wires it up and hands back
/// a handle the test drives. The participant is kept behind a `Mutex` so
/// the test can poll its state between events instead of needing a second
/// channel for every possible observation.
pub struct TestParticipantBuilder {
    fanout: u8,
}

impl TestParticipantBuilder {
    pub fn new() -> Self {
        Self { fanout: 2 }
    }

    pub fn fanout(mut self, fanout: u8) -> Self {
        self.fanout = fanout;
        self
    }

    pub async fn create(self) -> TestParticipant {
        self.spawn(false).await
    }

    /// The first participant of a network occupies the root directly,
    /// without anything to bootstrap against (spec.md §4.3's base case).
    pub async fn create_root(self) -> TestParticipant {
        self.spawn(true).await
    }

    async fn spawn(self, as_root: bool) -> TestParticipant {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = match listener.local_addr().unwrap() {
            std::net::SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };

        let counter = AscendingCounter::new();
        let id = UuidGenerator::Ascending.generate(counter.inner());
        let node = NodeInfo::new(id, NetworkInfo::new(*addr.ip(), addr.port()));

        let config = NetworkParams::new(self.fanout).unwrap();
        let (participant, event_tx, mut inbound) = if as_root {
            Participant::new_as_root(node, config, UuidGenerator::Ascending)
        } else {
            Participant::new(node, config, UuidGenerator::Ascending)
        };
        let participant = Arc::new(Mutex::new(participant));

        let (msg_tx, mut msg_rx) = mpsc::channel::<Message>(128);
        tokio::spawn(minhton::transport::tcp::serve(listener, msg_tx));

        let bridge_tx = event_tx.clone();
        tokio::spawn(async move {
            while let Some(message) = msg_rx.recv().await {
                if bridge_tx.send(Event::Inbound(message)).await.is_err() {
                    break;
                }
            }
        });

        let loop_handle = participant.clone();
        tokio::spawn(async move {
            while let Some(event) = inbound.recv().await {
                let mut guard = loop_handle.lock().await;
                let _ = guard.handle_event(event).await;
            }
        });

        TestParticipant {
            node,
            addr,
            event_tx,
            participant,
        }
    }
}

pub struct TestParticipant {
    pub node: NodeInfo,
    pub addr: SocketAddrV4,
    pub event_tx: mpsc::Sender<Event>,
    participant: Arc<Mutex<Participant>>,
}

impl TestParticipant {
    pub fn loopback_ip() -> Ipv4Addr {
        Ipv4Addr::LOCALHOST
    }

    pub fn root_position(fanout: u8) -> LogicalPosition {
        LogicalPosition::root(fanout).unwrap()
    }

    pub async fn state(&self) -> FsmState {
        self.participant.lock().await.state()
    }

    pub async fn is_initialized(&self) -> bool {
        self.participant.lock().await.routing().self_node().is_initialized()
    }

    pub async fn participant_self_position(&self) -> LogicalPosition {
        self.participant
            .lock()
            .await
            .routing()
            .self_position()
            .expect("participant should be positioned")
    }

    pub async fn children_count(&self) -> usize {
        self.participant.lock().await.routing().children().count()
    }

    pub async fn local_insert(&self, key: &str, value: &str, value_type: ValueType) {
        self.participant
            .lock()
            .await
            .local_insert(key, value.to_string(), value_type)
            .await
            .unwrap();
    }

    pub async fn subscriber_count(&self, attribute: &str) -> usize {
        self.participant.lock().await.local_data().subscribers_of(attribute).len()
    }

    /// Polls `predicate` against this participant's locked state until it
    /// holds or `timeout` elapses, to synchronize on asynchronous protocol
    /// completion without a fixed sleep.
    pub async fn wait_until(&self, timeout: Duration, predicate: impl Fn(FsmState) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if predicate(self.state().await) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }
}
