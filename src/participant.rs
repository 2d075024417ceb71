use tokio::sync::mpsc;

use crate::algorithms::{bootstrap, entity_search, join, leave, response, search_exact};
use crate::config::NetworkParams;
use crate::continuation::{ContinuationKind, ContinuationTable};
use crate::error::{Error, Result};
use crate::fsm::{self, EventKind, FsmState, SignalType};
use crate::id::NodeInfo;
use crate::local_data::{DsnHandler, LocalData, ValueType};
use crate::messages::bootstrap::BootstrapResponse;
use crate::messages::entity_search::{
    AttributeInquiryAnswer, AttributeInquiryRequest, FindQueryAnswer, FindQueryRequest,
    SubscriptionOrder, SubscriptionUpdate,
};
use crate::messages::join::{Join, JoinAccept, JoinAcceptAck};
use crate::messages::leave::{
    FindReplacement, LockNeighborRequest, LockNeighborResponse, ReplacementAck, ReplacementNack,
    ReplacementOffer, ReplacementUpdate, SignOffParentAnswer, SignOffParentRequest, UnlockNeighbor,
};
use crate::messages::response::{GetNeighbors, RemoveAndUpdateNeighbor, UpdateNeighbors};
use crate::messages::search_exact::{SearchExact, SearchExactFailure};
use crate::messages::{Message, MessageHeader, MessageType, MessageVariant};
use crate::neighbor::NeighborRelationship;
use crate::network_facade::NetworkFacade;
use crate::routing_information::RoutingInformation;
use crate::timeout::TimeoutType;
use crate::uuid_gen::{generate_event_id, AscendingCounter, UuidGenerator};

/// Something the event loop reacts to: a decoded inbound message, an armed
/// deadline firing, or a locally-raised signal (join/leave/cleanup).
#[derive(Debug)]
pub enum Event {
    Inbound(Message),
    TimeoutFired { event_id: u64, kind: TimeoutType },
    Signal(SignalType),
}

/// Ties routing information, FSM state, the continuation table, local data
/// and the network facade into the single-threaded cooperative actor
/// described in spec.md §5.
///
/// Grounded on the teacher's `Elder` struct (`states/elder/mod.rs`): one
/// struct holding every subsystem, with a dispatch method per inbound kind
/// and `self.state`/`self.routing` mutated in place as handlers run to
/// completion.
pub struct Participant {
    routing: RoutingInformation,
    state: FsmState,
    config: NetworkParams,
    continuations: ContinuationTable,
    local_data: LocalData,
    dsn_handler: DsnHandler,
    uuid_generator: UuidGenerator,
    ascending_counter: AscendingCounter,
    facade: NetworkFacade,
    /// The node this participant is in the middle of replacing, set once it
    /// has volunteered as a `FindReplacement` candidate and cleared once the
    /// lock-handoff quorum completes the handoff.
    pending_replacement: Option<NodeInfo>,
}

impl Participant {
    pub fn new(
        self_node: NodeInfo,
        config: NetworkParams,
        uuid_generator: UuidGenerator,
    ) -> (Self, mpsc::Sender<Event>, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(128);
        let participant = Self {
            routing: RoutingInformation::new(self_node),
            state: FsmState::Idle,
            config,
            continuations: ContinuationTable::new(),
            local_data: LocalData::new(),
            dsn_handler: DsnHandler::new(),
            uuid_generator,
            ascending_counter: AscendingCounter::new(),
            facade: NetworkFacade::new(),
            pending_replacement: None,
        };
        (participant, tx, rx)
    }

    /// Constructs the very first participant of a network: the join
    /// algorithm's base case is a node that simply occupies the root with
    /// no peer to bootstrap against (spec.md §4.3).
    pub fn new_as_root(
        self_node: NodeInfo,
        config: NetworkParams,
        uuid_generator: UuidGenerator,
    ) -> (Self, mpsc::Sender<Event>, mpsc::Receiver<Event>) {
        let (mut participant, tx, rx) = Self::new(self_node, config, uuid_generator);
        let root = crate::position::LogicalPosition::root(participant.config.fanout())
            .expect("default fanout is always valid");
        participant.routing.set_self_position(root);
        participant.state = FsmState::Connected;
        (participant, tx, rx)
    }

    pub fn state(&self) -> FsmState {
        self.state
    }

    pub fn routing(&self) -> &RoutingInformation {
        &self.routing
    }

    pub fn local_data(&self) -> &LocalData {
        &self.local_data
    }

    pub fn dsn_handler(&self) -> &DsnHandler {
        &self.dsn_handler
    }

    fn next_event_id(&self) -> u64 {
        generate_event_id()
    }

    fn advance(&mut self, event: EventKind) -> Result<()> {
        let current = self.state;
        match fsm::transition(current, event) {
            Some(transition) => {
                tracing::info!(state = ?current, ?event, next = ?transition.next_state, "fsm transition");
                self.state = transition.next_state;
                Ok(())
            }
            None => {
                tracing::error!(state = ?current, ?event, "no transition defined");
                self.state = FsmState::ErrorState;
                Err(Error::FsmViolation {
                    state: current,
                    event,
                })
            }
        }
    }

    /// Drains exactly one event per iteration and runs it to completion —
    /// no handler is preempted by another event arriving mid-handler,
    /// matching spec.md §5's concurrency guarantee. The receiver lives
    /// outside `self` so callers can inspect participant state between
    /// events (e.g. in tests) without fighting the event loop for `&mut`.
    pub async fn run(&mut self, inbound: &mut mpsc::Receiver<Event>) -> Result<()> {
        while let Some(event) = inbound.recv().await {
            if let Err(err) = self.handle_event(event).await {
                tracing::warn!(%err, "event handling failed");
            }
        }
        Ok(())
    }

    pub async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Signal(signal) => self.handle_signal(signal).await,
            Event::Inbound(message) => self.handle_message(message).await,
            Event::TimeoutFired { event_id, kind } => self.handle_timeout(event_id, kind).await,
        }
    }

    async fn handle_signal(&mut self, signal: SignalType) -> Result<()> {
        match signal {
            SignalType::JoinNetwork => {
                self.advance(EventKind::Signal(signal))?;
                let event_id = self.next_event_id();
                self.continuations.register(
                    event_id,
                    ContinuationKind::AwaitingBootstrapResponse,
                    self.config.timeout_for(TimeoutType::BootstrapResponseTimeout),
                );
                self.broadcast_bootstrap_discover(event_id).await
            }
            SignalType::LeaveNetwork => {
                self.advance(EventKind::Signal(signal))?;
                if leave::may_direct_leave_without_replacement(&self.routing) {
                    let sender = *self.routing.self_node();
                    let Some(parent) = self.routing.parent().copied() else {
                        tracing::warn!("leaf has no parent to sign off against");
                        return Ok(());
                    };
                    let header = self.facade.build_header(
                        &sender,
                        &parent,
                        MessageType::SignOffParentRequest,
                        self.next_event_id(),
                        None,
                    );
                    self.facade
                        .send(&parent, header, MessageVariant::SignOffParentRequest(SignOffParentRequest { leaving: sender }))
                        .await
                } else {
                    match leave::find_replacement(&self.routing) {
                        leave::ReplacementSearch::FoundHere => {
                            tracing::warn!("internal node's find-replacement search had nowhere to go");
                            Ok(())
                        }
                        leave::ReplacementSearch::Forward(next) => {
                            let sender = *self.routing.self_node();
                            let event_id = self.next_event_id();
                            let header = self.facade.build_header(
                                &sender,
                                &next,
                                MessageType::FindReplacement,
                                event_id,
                                None,
                            );
                            let variant = MessageVariant::FindReplacement(FindReplacement { leaving: sender });
                            self.facade.send(&next, header, variant).await
                        }
                    }
                }
            }
            SignalType::Cleanup => self.advance(EventKind::Signal(signal)),
        }
    }

    /// Broadcasts a `BootstrapDiscover` over UDP multicast. Sent as a full
    /// `Message` envelope (not a bare payload) so the responder's
    /// `BootstrapResponse` can carry back the same `event_id` this
    /// participant is waiting on, the same continuation mechanism used for
    /// every other request/response pair.
    async fn broadcast_bootstrap_discover(&self, event_id: u64) -> Result<()> {
        let address = self
            .routing
            .self_node()
            .network()
            .address()
            .ok_or_else(|| Error::TransportFatal("cannot bootstrap without a bound address".into()))?;
        let socket = crate::transport::udp::bind_for_send(address).await?;
        let sender = *self.routing.self_node();
        let header = MessageHeader::new(sender, sender, MessageType::BootstrapDiscover, event_id);
        let message = Message::new(
            header,
            MessageVariant::BootstrapDiscover(bootstrap::build_discover(sender)),
        );
        crate::transport::udp::send_discover(&socket, &message).await
    }

    async fn handle_timeout(&mut self, event_id: u64, kind: TimeoutType) -> Result<()> {
        self.continuations.cancel(event_id);
        self.advance(EventKind::Timeout(kind))
    }

    async fn handle_message(&mut self, message: Message) -> Result<()> {
        message.header.validate()?;
        let message_type = message.variant.message_type();
        self.advance(EventKind::Message(message_type))?;

        match message.variant {
            MessageVariant::BootstrapDiscover(_) => self.reply_bootstrap(&message).await,
            MessageVariant::BootstrapResponse(ref payload) => {
                self.handle_bootstrap_response(&message, payload).await
            }
            MessageVariant::Join(ref payload) => self.handle_join(&message, payload).await,
            MessageVariant::JoinAccept(ref payload) => self.handle_join_accept(&message, payload).await,
            MessageVariant::JoinAcceptAck(ref payload) => {
                self.handle_join_accept_ack(&message, payload).await
            }
            MessageVariant::GetNeighbors(ref payload) => {
                self.handle_get_neighbors(&message, payload).await
            }
            MessageVariant::UpdateNeighbors(ref payload) => {
                response::apply_update_neighbors(&mut self.routing, payload);
                Ok(())
            }
            MessageVariant::RemoveNeighbor(ref payload) => {
                response::apply_remove_neighbor(&mut self.routing, payload.relationship)
            }
            MessageVariant::RemoveAndUpdateNeighbor(ref payload) => {
                self.handle_remove_and_update_neighbor(payload)
            }
            MessageVariant::SearchExact(ref payload) => {
                self.handle_search_exact(&message, payload).await
            }
            MessageVariant::FindQueryRequest(ref payload) => {
                self.handle_find_query(&message, payload).await
            }
            MessageVariant::FindReplacement(ref payload) => {
                self.handle_find_replacement(&message, payload).await
            }
            MessageVariant::ReplacementOffer(ref payload) => {
                self.handle_replacement_offer(&message, payload).await
            }
            MessageVariant::ReplacementAck(ref payload) => {
                self.handle_replacement_ack(&message, payload).await
            }
            MessageVariant::ReplacementNack(ref payload) => {
                self.handle_replacement_nack(&message, payload)
            }
            MessageVariant::ReplacementUpdate(ref payload) => {
                self.handle_replacement_update(payload)
            }
            MessageVariant::LockNeighborRequest(ref payload) => {
                self.handle_lock_neighbor_request(&message, payload).await
            }
            MessageVariant::LockNeighborResponse(ref payload) => {
                self.handle_lock_neighbor_response(&message, payload).await
            }
            MessageVariant::UnlockNeighbor(ref payload) => self.handle_unlock_neighbor(payload),
            MessageVariant::SignOffParentRequest(ref payload) => {
                self.handle_sign_off_parent_request(&message, payload).await
            }
            MessageVariant::SignOffParentAnswer(ref payload) => {
                self.handle_sign_off_parent_answer(payload)
            }
            MessageVariant::SearchExactFailure(ref payload) => {
                self.handle_search_exact_failure(payload)
            }
            MessageVariant::AttributeInquiryRequest(ref payload) => {
                self.handle_attribute_inquiry_request(&message, payload).await
            }
            MessageVariant::AttributeInquiryAnswer(ref payload) => {
                self.handle_attribute_inquiry_answer(&message, payload).await
            }
            MessageVariant::SubscriptionOrder(ref payload) => self.handle_subscription_order(payload),
            MessageVariant::SubscriptionUpdate(ref payload) => self.handle_subscription_update(payload),
            _ => Ok(()),
        }
    }

    async fn reply_bootstrap(&mut self, incoming: &Message) -> Result<()> {
        let Some(response) = bootstrap::handle_discover(&self.routing) else {
            return Ok(());
        };
        let sender = *self.routing.self_node();
        let target = *incoming.header.sender();
        let header = self.facade.build_header(
            &sender,
            &target,
            MessageType::BootstrapResponse,
            self.next_event_id(),
            Some(incoming.header.event_id()),
        );
        self.facade
            .send(&target, header, MessageVariant::BootstrapResponse(response))
            .await
    }

    async fn handle_bootstrap_response(&mut self, incoming: &Message, payload: &BootstrapResponse) -> Result<()> {
        if let Some(ref_event_id) = incoming.header.ref_event_id() {
            self.continuations.resolve(ref_event_id);
        }
        let sender = *self.routing.self_node();
        let target = payload.entry_point;
        let event_id = self.next_event_id();
        self.continuations.register(
            event_id,
            ContinuationKind::AwaitingJoinAccept,
            self.config.timeout_for(TimeoutType::JoinAcceptResponseTimeout),
        );
        let header = self.facade.build_header(&sender, &target, MessageType::Join, event_id, None);
        self.facade
            .send(&target, header, MessageVariant::Join(Join { joiner: sender }))
            .await
    }

    async fn handle_join(&mut self, incoming: &Message, _payload: &Join) -> Result<()> {
        match join::handle_join(&self.routing, self.config.fanout()) {
            join::JoinOutcome::Accept(accept) => {
                let sender = *self.routing.self_node();
                let target = *incoming.header.sender();
                let event_id = self.next_event_id();
                self.continuations.register(
                    event_id,
                    ContinuationKind::AwaitingJoinAcceptAck,
                    self.config.timeout_for(TimeoutType::JoinAcceptAckResponseTimeout),
                );
                let header = self.facade.build_header(
                    &sender,
                    &target,
                    MessageType::JoinAccept,
                    event_id,
                    Some(incoming.header.event_id()),
                );
                self.facade
                    .send(&target, header, MessageVariant::JoinAccept(accept))
                    .await
            }
            join::JoinOutcome::Forward(next) => {
                let sender = *self.routing.self_node();
                let header = self.facade.build_header(
                    &sender,
                    &next,
                    MessageType::Join,
                    self.next_event_id(),
                    None,
                );
                self.facade
                    .send(&next, header, incoming.variant.clone())
                    .await
            }
        }
    }

    async fn handle_join_accept(&mut self, incoming: &Message, payload: &JoinAccept) -> Result<()> {
        if let Some(ref_event_id) = incoming.header.ref_event_id() {
            self.continuations.resolve(ref_event_id);
        }
        self.routing.set_self_position(payload.assigned_position);
        // Direct field assignment, not classify()-based `update_neighbor`:
        // the parent and an adjacent frequently coincide for a fresh join
        // (S2: a root's first child has the root as both parent and
        // adjacentRight), and a single relationship match per position
        // would drop whichever role loses that tie.
        self.routing.set_parent(Some(payload.parent));
        self.routing.set_adjacent_left(payload.adjacent_left);
        self.routing.set_adjacent_right(payload.adjacent_right);
        let sender = *self.routing.self_node();
        let target = *incoming.header.sender();
        let header = self.facade.build_header(
            &sender,
            &target,
            MessageType::JoinAcceptAck,
            self.next_event_id(),
            Some(incoming.header.event_id()),
        );
        self.facade
            .send(&target, header, MessageVariant::JoinAcceptAck(JoinAcceptAck { joiner: sender }))
            .await
    }

    /// Completes the join handshake: adds the new child and repoints
    /// whichever of this node's own old adjacents the child displaced.
    ///
    /// Grounded on spec.md §8/S2-S3: a first child takes over the parent's
    /// old adjacentLeft, a last (fanout-completing) child takes over the
    /// parent's old adjacentRight, and either old neighbor — if one existed
    /// — must be told its own adjacent pointer now points at the child
    /// instead of this node.
    async fn handle_join_accept_ack(&mut self, incoming: &Message, payload: &JoinAcceptAck) -> Result<()> {
        if let Some(ref_event_id) = incoming.header.ref_event_id() {
            self.continuations.resolve(ref_event_id);
        }
        let joiner = payload.joiner;
        let index = joiner.position().and_then(|p| p.child_index());
        let fanout = self.config.fanout();
        let old_adjacent_left = self.routing.adjacent_left().copied();
        let old_adjacent_right = self.routing.adjacent_right().copied();
        let previous_sibling = index.and_then(|i| if i > 0 { self.routing.child_at(i - 1).copied() } else { None });

        self.routing.update_neighbor(joiner)?;
        self.routing.set_adjacent_left(Some(joiner));

        if index == Some(0) {
            if let Some(old_left) = old_adjacent_left {
                self.send_update_neighbor(&old_left, NeighborRelationship::AdjacentRight, joiner).await?;
            }
        } else if let Some(sibling) = previous_sibling {
            // `sibling` was this node's in-order predecessor (its
            // `adjacentRight` pointed at us) until `joiner` took its place as
            // our newest, highest-index child.
            self.send_update_neighbor(&sibling, NeighborRelationship::AdjacentRight, joiner).await?;
        }
        if index == Some(fanout - 1) {
            if let Some(old_right) = old_adjacent_right {
                self.send_update_neighbor(&old_right, NeighborRelationship::AdjacentLeft, joiner).await?;
            }
        }
        Ok(())
    }

    /// Pushes a single-relationship `UpdateNeighbors` to `target`.
    async fn send_update_neighbor(
        &mut self,
        target: &NodeInfo,
        relationship: NeighborRelationship,
        node: NodeInfo,
    ) -> Result<()> {
        let sender = *self.routing.self_node();
        let header = self.facade.build_header(&sender, target, MessageType::UpdateNeighbors, self.next_event_id(), None);
        self.facade
            .send(target, header, MessageVariant::UpdateNeighbors(UpdateNeighbors { updates: vec![(relationship, node)] }))
            .await
    }

    async fn handle_get_neighbors(&mut self, incoming: &Message, payload: &GetNeighbors) -> Result<()> {
        let answer = response::build_inform_about_neighbors(&self.routing, payload)?;
        let sender = *self.routing.self_node();
        let header = self.facade.build_header(
            &sender,
            &payload.send_back_to,
            MessageType::InformAboutNeighbors,
            self.next_event_id(),
            Some(incoming.header.event_id()),
        );
        self.facade
            .send(&payload.send_back_to, header, MessageVariant::InformAboutNeighbors(answer))
            .await
    }

    fn handle_remove_and_update_neighbor(&mut self, payload: &RemoveAndUpdateNeighbor) -> Result<()> {
        response::apply_remove_neighbor(&mut self.routing, payload.remove)?;
        for (relationship, node) in &payload.updates {
            self.routing.set_neighbor(*relationship, *node);
        }
        Ok(())
    }

    async fn handle_search_exact(&mut self, incoming: &Message, payload: &SearchExact) -> Result<()> {
        match search_exact::next_hop(&self.routing, payload.destination) {
            search_exact::SearchOutcome::Forward(next) => {
                let sender = *self.routing.self_node();
                let header = self.facade.build_header(
                    &sender,
                    &next,
                    MessageType::SearchExact,
                    self.next_event_id(),
                    None,
                );
                self.facade.send(&next, header, incoming.variant.clone()).await
            }
            search_exact::SearchOutcome::AtDestination => {
                tracing::debug!(destination = ?payload.destination, "search-exact reached its target");
                Ok(())
            }
            search_exact::SearchOutcome::NoCloserNeighbor => {
                tracing::debug!(destination = ?payload.destination, "search-exact stalled, no neighbor is closer");
                if !payload.notify_about_failure {
                    return Ok(());
                }
                let sender = *self.routing.self_node();
                let header = self.facade.build_header(
                    &sender,
                    &payload.requester,
                    MessageType::SearchExactFailure,
                    self.next_event_id(),
                    Some(incoming.header.event_id()),
                );
                self.facade
                    .send(
                        &payload.requester,
                        header,
                        MessageVariant::SearchExactFailure(SearchExactFailure {
                            destination: payload.destination,
                            query_event_id: payload.query_event_id,
                        }),
                    )
                    .await
            }
        }
    }

    async fn handle_find_query(&mut self, incoming: &Message, payload: &FindQueryRequest) -> Result<()> {
        let raw = entity_search::matches_for(&self.dsn_handler, &payload.attribute, self.config.dsn_staleness_window());
        let matches = entity_search::truncate_to_scope(raw, payload.scope, self.config.find_query_some_scope_threshold());
        let sender = *self.routing.self_node();
        let target = payload.requester;
        let header = self.facade.build_header(
            &sender,
            &target,
            MessageType::FindQueryAnswer,
            self.next_event_id(),
            Some(incoming.header.event_id()),
        );
        self.facade
            .send(&target, header, MessageVariant::FindQueryAnswer(FindQueryAnswer { matches }))
            .await
    }

    /// A DSN (or the query initiator, on a freshness-threshold miss) is
    /// asking whether `self` currently holds `payload.attribute`.
    async fn handle_attribute_inquiry_request(&mut self, incoming: &Message, payload: &AttributeInquiryRequest) -> Result<()> {
        let reporter = *self.routing.self_node();
        let attributes = if self.local_data.get(&payload.attribute).is_some() {
            vec![payload.attribute.clone()]
        } else {
            Vec::new()
        };
        let target = payload.requester;
        let header = self.facade.build_header(
            &reporter,
            &target,
            MessageType::AttributeInquiryAnswer,
            self.next_event_id(),
            Some(incoming.header.event_id()),
        );
        self.facade
            .send(&target, header, MessageVariant::AttributeInquiryAnswer(AttributeInquiryAnswer { reporter, attributes }))
            .await
    }

    /// Records a node's pushed (or answered) attribute snapshot. The first
    /// time a node is seen for a given attribute, this DSN places a standing
    /// subscription on it so future changes keep the cache warm without
    /// further polling.
    async fn handle_attribute_inquiry_answer(&mut self, incoming: &Message, payload: &AttributeInquiryAnswer) -> Result<()> {
        let first_time = self.dsn_handler.record(payload.reporter, payload.attributes.clone());
        if !first_time {
            return Ok(());
        }
        let sender = *self.routing.self_node();
        for attribute in &payload.attributes {
            let header = self.facade.build_header(
                &sender,
                &payload.reporter,
                MessageType::SubscriptionOrder,
                self.next_event_id(),
                Some(incoming.header.event_id()),
            );
            self.facade
                .send(
                    &payload.reporter,
                    header,
                    MessageVariant::SubscriptionOrder(SubscriptionOrder {
                        attribute: attribute.clone(),
                        subscriber: sender,
                        subscribe: true,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    fn handle_subscription_order(&mut self, payload: &SubscriptionOrder) -> Result<()> {
        if payload.subscribe {
            self.local_data.subscribe(&payload.attribute, payload.subscriber);
        } else {
            self.local_data.unsubscribe(&payload.attribute, &payload.subscriber);
        }
        Ok(())
    }

    fn handle_subscription_update(&mut self, payload: &SubscriptionUpdate) -> Result<()> {
        tracing::info!(attribute = %payload.attribute, holders = payload.holders.len(), "subscription update received");
        Ok(())
    }

    /// Sets `key` on this node's own attribute store and propagates the
    /// change: current subscribers are pushed a `SubscriptionUpdate`, and
    /// unless this node is itself the covering DSN, the fresh snapshot is
    /// forwarded there via `AttributeInquiryAnswer`.
    pub async fn local_insert(&mut self, key: &str, value: String, value_type: ValueType) -> Result<()> {
        let sender = *self.routing.self_node();
        let effect = self.local_data.local_insert(key, value, value_type, sender);
        self.propagate_mutation(effect).await
    }

    pub async fn local_update(&mut self, key: &str, value: String) -> Result<()> {
        let sender = *self.routing.self_node();
        if let Some(effect) = self.local_data.local_update(key, value, sender) {
            self.propagate_mutation(effect).await?;
        }
        Ok(())
    }

    pub async fn local_remove(&mut self, key: &str) -> Result<()> {
        let sender = *self.routing.self_node();
        if let Some(effect) = self.local_data.local_remove(key, sender) {
            self.propagate_mutation(effect).await?;
        }
        Ok(())
    }

    async fn propagate_mutation(&mut self, effect: crate::local_data::MutationEffect) -> Result<()> {
        let sender = *self.routing.self_node();
        for subscriber in &effect.subscribers {
            let header = self.facade.build_header(
                &sender,
                subscriber,
                MessageType::SubscriptionUpdate,
                self.next_event_id(),
                None,
            );
            self.facade
                .send(
                    subscriber,
                    header,
                    MessageVariant::SubscriptionUpdate(SubscriptionUpdate {
                        attribute: effect.key.clone(),
                        holders: effect.holders.clone(),
                    }),
                )
                .await?;
        }

        let is_dsn = self
            .routing
            .self_position()
            .and_then(|pos| pos.ancestor_at_level(self.config.dsn_level()).map(|dsn| dsn == pos))
            .unwrap_or(false);
        if is_dsn {
            return Ok(());
        }
        let Some(dsn_position) = self
            .routing
            .self_position()
            .and_then(|pos| pos.ancestor_at_level(self.config.dsn_level()))
        else {
            return Ok(());
        };
        let Some(dsn_node) = self
            .routing
            .all_neighbors()
            .into_iter()
            .find(|n| n.position() == Some(dsn_position))
            .copied()
        else {
            tracing::debug!(?dsn_position, "covering DSN not among known neighbors, skipping push");
            return Ok(());
        };
        let header = self.facade.build_header(&sender, &dsn_node, MessageType::AttributeInquiryAnswer, self.next_event_id(), None);
        self.facade
            .send(
                &dsn_node,
                header,
                MessageVariant::AttributeInquiryAnswer(AttributeInquiryAnswer {
                    reporter: sender,
                    attributes: self.local_data.keys().map(str::to_string).collect(),
                }),
            )
            .await
    }

    /// A `FindReplacement` search hopped here: either this node is the leaf
    /// being searched for (the deepest, highest-numbered position in the
    /// leaving node's subtree), or it forwards the search into its own
    /// highest-indexed child.
    async fn handle_find_replacement(&mut self, incoming: &Message, payload: &FindReplacement) -> Result<()> {
        match leave::find_replacement(&self.routing) {
            leave::ReplacementSearch::FoundHere => {
                self.pending_replacement = Some(payload.leaving);
                let sender = *self.routing.self_node();
                let target = payload.leaving;
                let header = self.facade.build_header(
                    &sender,
                    &target,
                    MessageType::ReplacementOffer,
                    self.next_event_id(),
                    Some(incoming.header.event_id()),
                );
                self.facade
                    .send(&target, header, MessageVariant::ReplacementOffer(ReplacementOffer { candidate: sender }))
                    .await
            }
            leave::ReplacementSearch::Forward(next) => {
                let sender = *self.routing.self_node();
                let header = self.facade.build_header(
                    &sender,
                    &next,
                    MessageType::FindReplacement,
                    self.next_event_id(),
                    None,
                );
                self.facade.send(&next, header, incoming.variant.clone()).await
            }
        }
    }

    /// The leaving node received a candidate's offer; accept it (this
    /// implementation does not compare multiple competing offers) and let
    /// the candidate start the lock handoff.
    async fn handle_replacement_offer(&mut self, incoming: &Message, payload: &ReplacementOffer) -> Result<()> {
        let sender = *self.routing.self_node();
        let target = payload.candidate;
        let header = self.facade.build_header(
            &sender,
            &target,
            MessageType::ReplacementAck,
            self.next_event_id(),
            Some(incoming.header.event_id()),
        );
        self.facade
            .send(&target, header, MessageVariant::ReplacementAck(ReplacementAck { accepted: target }))
            .await
    }

    /// The candidate's offer was accepted: lock every neighbor the leaving
    /// node's vacated position will need repointed, in `lock_order()`.
    async fn handle_replacement_ack(&mut self, incoming: &Message, _payload: &ReplacementAck) -> Result<()> {
        if let Some(ref_event_id) = incoming.header.ref_event_id() {
            self.continuations.resolve(ref_event_id);
        }
        let order = leave::lock_order(&self.routing);
        let locked: Vec<(NeighborRelationship, NodeInfo)> = order
            .iter()
            .flat_map(|relationship| {
                self.routing
                    .neighbors_for(*relationship)
                    .into_iter()
                    .map(move |node| (*relationship, *node))
            })
            .collect();

        let sender = *self.routing.self_node();
        let event_id = self.next_event_id();
        self.continuations.register(
            event_id,
            ContinuationKind::AwaitingNeighborAck {
                remaining: locked.len() as u32,
                locked: locked.clone(),
            },
            self.config.timeout_for(TimeoutType::ReplacementAckResponseTimeout),
        );
        for (relationship, target) in &locked {
            let header = self.facade.build_header(&sender, target, MessageType::LockNeighborRequest, event_id, None);
            self.facade
                .send(
                    target,
                    header,
                    MessageVariant::LockNeighborRequest(LockNeighborRequest {
                        requester: sender,
                        relationship: *relationship,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    fn handle_replacement_nack(&mut self, incoming: &Message, _payload: &ReplacementNack) -> Result<()> {
        if let Some(ref_event_id) = incoming.header.ref_event_id() {
            self.continuations.resolve(ref_event_id);
        }
        tracing::info!("replacement offer was rejected");
        Ok(())
    }

    /// Grants every lock request unconditionally — this implementation has
    /// no concurrent-handoff detection, so there is nothing to contend over
    /// yet (see `Error::LockContention`, currently unconstructed).
    async fn handle_lock_neighbor_request(&mut self, incoming: &Message, payload: &LockNeighborRequest) -> Result<()> {
        let sender = *self.routing.self_node();
        let target = payload.requester;
        let header = self.facade.build_header(
            &sender,
            &target,
            MessageType::LockNeighborResponse,
            self.next_event_id(),
            Some(incoming.header.event_id()),
        );
        self.facade
            .send(&target, header, MessageVariant::LockNeighborResponse(LockNeighborResponse { granted: true }))
            .await
    }

    /// Once every lock in the handoff set has been granted, the candidate
    /// occupies the vacated position and broadcasts `ReplacementUpdate` to
    /// repoint the locked neighbors, then releases the locks in reverse
    /// order.
    async fn handle_lock_neighbor_response(&mut self, incoming: &Message, payload: &LockNeighborResponse) -> Result<()> {
        let Some(ref_event_id) = incoming.header.ref_event_id() else {
            return Ok(());
        };
        if !payload.granted {
            tracing::warn!("neighbor refused a lock request during replacement handoff");
        }
        let Some(locked) = self.continuations.ack_received(ref_event_id) else {
            return Ok(());
        };
        let Some(leaving) = self.pending_replacement.take() else {
            return Ok(());
        };
        if let Some(vacated) = leaving.position() {
            self.routing.set_self_position(vacated);
        }

        let sender = *self.routing.self_node();
        for (_, target) in &locked {
            let header = self.facade.build_header(&sender, target, MessageType::ReplacementUpdate, self.next_event_id(), None);
            self.facade
                .send(target, header, MessageVariant::ReplacementUpdate(ReplacementUpdate { replacement: sender }))
                .await?;
        }

        let relationships: Vec<NeighborRelationship> = locked.iter().map(|(r, _)| *r).collect();
        for relationship in leave::release_order(&relationships) {
            if let Some((_, target)) = locked.iter().find(|(r, _)| *r == relationship) {
                let header = self.facade.build_header(&sender, target, MessageType::UnlockNeighbor, self.next_event_id(), None);
                self.facade
                    .send(target, header, MessageVariant::UnlockNeighbor(UnlockNeighbor { relationship }))
                    .await?;
            }
        }
        Ok(())
    }

    fn handle_replacement_update(&mut self, payload: &ReplacementUpdate) -> Result<()> {
        self.routing.update_neighbor(payload.replacement)
    }

    fn handle_unlock_neighbor(&mut self, _payload: &UnlockNeighbor) -> Result<()> {
        Ok(())
    }

    async fn handle_sign_off_parent_request(&mut self, incoming: &Message, payload: &SignOffParentRequest) -> Result<()> {
        if let Some(position) = payload.leaving.position() {
            self.routing.remove_neighbor(&position);
        }
        let sender = *self.routing.self_node();
        let target = payload.leaving;
        let header = self.facade.build_header(
            &sender,
            &target,
            MessageType::SignOffParentAnswer,
            self.next_event_id(),
            Some(incoming.header.event_id()),
        );
        self.facade
            .send(&target, header, MessageVariant::SignOffParentAnswer(SignOffParentAnswer { acknowledged: true }))
            .await
    }

    fn handle_sign_off_parent_answer(&mut self, payload: &SignOffParentAnswer) -> Result<()> {
        if payload.acknowledged {
            tracing::info!("parent acknowledged direct leave without replacement");
        }
        Ok(())
    }

    fn handle_search_exact_failure(&mut self, payload: &SearchExactFailure) -> Result<()> {
        tracing::warn!(
            destination = ?payload.destination,
            query_event_id = payload.query_event_id,
            "search-exact could not reach its destination"
        );
        Ok(())
    }
}
