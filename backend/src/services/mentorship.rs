//! The mentorship connection protocol: request submission, mentor-side
//! resolution, and the live read views both parties watch.
//!
//! Stores and the channel provisioner are injected through traits so the
//! whole protocol runs identically against Postgres or the in-memory
//! backend. There is deliberately no cross-store transaction: accept is
//! sequenced so that a failure at any step leaves the request pending and
//! safely retryable (provision first, connection insert second, status flip
//! last), with the deterministic channel id and insert-if-absent connection
//! making retries converge instead of duplicating.

use chrono::Utc;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::constants::{CHANNEL_PROVISION_ATTEMPTS, MAX_MESSAGE_LENGTH};
use crate::db::{ConnectionStore, RequestStore};
use crate::error::Error;
use crate::models::{
    ChatRequest, ConnectionStatus, Decision, MentorshipConnection, NewChatRequest, RequestStatus,
    Role,
};
use crate::services::channels::{derive_channel_id, ChannelProvisioner};
use crate::services::events::{EventBus, StoreEvent};

/// Handle for a live read view. Each matching store change delivers a fresh
/// full set on `recv`; the first delivery is an immediate snapshot.
///
/// Delivery is through a watch channel holding the latest set, so a
/// subscriber that stops draining never backs up into the writer: it simply
/// observes the most recent set when it resumes, with intermediate sets
/// coalesced away.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`], which
/// consumes it) aborts the watcher task and releases the underlying event-bus
/// slot, after which no further deliveries occur.
pub struct Subscription<T: Clone + Send + Sync + 'static> {
    stream: WatchStream<Vec<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    pub async fn recv(&mut self) -> Option<Vec<T>> {
        self.stream.next().await
    }

    /// Explicit teardown. Consuming `self` makes double-unsubscribe
    /// unrepresentable.
    pub fn unsubscribe(self) {}
}

impl<T: Clone + Send + Sync + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<T: Clone + Send + Sync + 'static> Stream for Subscription<T> {
    type Item = Vec<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().stream).poll_next(cx)
    }
}

pub struct MentorshipService {
    requests: Arc<dyn RequestStore>,
    connections: Arc<dyn ConnectionStore>,
    channels: Arc<dyn ChannelProvisioner>,
    events: EventBus,
}

impl MentorshipService {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        connections: Arc<dyn ConnectionStore>,
        channels: Arc<dyn ChannelProvisioner>,
    ) -> Self {
        Self {
            requests,
            connections,
            channels,
            events: EventBus::new(),
        }
    }

    /// Create a new pending chat request from a student to a mentor.
    ///
    /// The store enforces the at-most-one-pending invariant for the pair, so
    /// a duplicate submission fails with [`Error::DuplicateRequest`] without
    /// writing anything.
    pub async fn submit_request(&self, new: NewChatRequest) -> Result<ChatRequest, Error> {
        let message = new.message.trim();
        if message.is_empty() {
            return Err(Error::EmptyMessage);
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(Error::MessageTooLong(MAX_MESSAGE_LENGTH));
        }
        if new.student_id.trim().is_empty() || new.mentor_id.trim().is_empty() {
            return Err(Error::MissingParticipant);
        }

        let now = Utc::now();
        let request = ChatRequest {
            id: Uuid::new_v4(),
            student_id: new.student_id,
            student_name: new.student_name,
            student_avatar: new.student_avatar,
            mentor_id: new.mentor_id,
            mentor_name: new.mentor_name,
            message: message.to_string(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.requests.insert_pending(&request).await?;
        tracing::info!(
            "chat request {} submitted: student {} -> mentor {}",
            request.id,
            request.student_id,
            request.mentor_id
        );

        self.events
            .publish(StoreEvent::RequestCreated {
                student_id: request.student_id.clone(),
                mentor_id: request.mentor_id.clone(),
            })
            .await;

        Ok(request)
    }

    /// Accept or decline a pending request. Returns the chat channel id on
    /// accept, `None` on decline.
    ///
    /// Resolving a request that is missing or already resolved is an error,
    /// never a silent re-apply.
    pub async fn resolve_request(
        &self,
        request_id: Uuid,
        decision: Decision,
    ) -> Result<Option<String>, Error> {
        let request = self
            .requests
            .get(request_id)
            .await?
            .ok_or(Error::RequestNotFound(request_id))?;

        if request.status != RequestStatus::Pending {
            return Err(Error::AlreadyResolved {
                id: request_id,
                status: request.status,
            });
        }

        match decision {
            Decision::Decline => {
                self.flip_status(&request, RequestStatus::Declined).await?;
                tracing::info!("chat request {} declined by mentor {}", request_id, request.mentor_id);
                Ok(None)
            }
            Decision::Accept => {
                let channel_id = self.accept(&request).await?;
                Ok(Some(channel_id))
            }
        }
    }

    /// The accept sequence. Ordering matters: the request stays pending
    /// until the channel exists and the connection row is durable, so a
    /// failure anywhere leaves the accept retryable.
    async fn accept(&self, request: &ChatRequest) -> Result<String, Error> {
        let channel_id = derive_channel_id(&request.mentor_id, &request.student_id);
        let channel_name = format!("{} & {}", request.mentor_name, request.student_name);
        let members = [request.mentor_id.clone(), request.student_id.clone()];

        self.provision_with_retry(&channel_id, &channel_name, &members)
            .await?;

        let now = Utc::now();
        let connection = MentorshipConnection {
            id: Uuid::new_v4(),
            student_id: request.student_id.clone(),
            mentor_id: request.mentor_id.clone(),
            status: ConnectionStatus::Active,
            chat_channel_id: channel_id.clone(),
            created_at: now,
            updated_at: now,
        };
        let stored = self.connections.insert_if_absent(&connection).await?;

        self.flip_status(request, RequestStatus::Accepted).await?;

        self.events
            .publish(StoreEvent::ConnectionCreated {
                student_id: stored.student_id.clone(),
                mentor_id: stored.mentor_id.clone(),
            })
            .await;

        tracing::info!(
            "chat request {} accepted: connection {} on channel {}",
            request.id,
            stored.id,
            stored.chat_channel_id
        );
        Ok(stored.chat_channel_id)
    }

    async fn provision_with_retry(
        &self,
        channel_id: &str,
        name: &str,
        members: &[String],
    ) -> Result<(), Error> {
        let mut last_err = None;
        for attempt in 1..=CHANNEL_PROVISION_ATTEMPTS {
            match self.channels.ensure_channel(channel_id, name, members).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        "channel provisioning attempt {}/{} failed for {}: {}",
                        attempt,
                        CHANNEL_PROVISION_ATTEMPTS,
                        channel_id,
                        e
                    );
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            Error::ChannelProvisioning(format!("no provisioning attempt made for {channel_id}"))
        }))
    }

    /// Guarded pending -> resolved transition plus the resolution event.
    async fn flip_status(&self, request: &ChatRequest, status: RequestStatus) -> Result<(), Error> {
        let flipped = self
            .requests
            .mark_resolved(request.id, status, Utc::now())
            .await?;
        if !flipped {
            // Someone else resolved it between our read and the flip.
            return match self.requests.get(request.id).await? {
                Some(current) => Err(Error::AlreadyResolved {
                    id: request.id,
                    status: current.status,
                }),
                None => Err(Error::RequestNotFound(request.id)),
            };
        }

        self.events
            .publish(StoreEvent::RequestResolved {
                student_id: request.student_id.clone(),
                mentor_id: request.mentor_id.clone(),
                status,
            })
            .await;
        Ok(())
    }

    /// Live view of a mentor's pending-request inbox, newest first.
    pub async fn subscribe_pending_requests(&self, mentor_id: &str) -> Subscription<ChatRequest> {
        let mut events = self.events.subscribe(None).await;
        let (tx, rx) = watch::channel(Vec::new());
        let store = Arc::clone(&self.requests);
        let mentor = mentor_id.to_string();

        let task = tokio::spawn(async move {
            deliver_pending(&*store, &mentor, &tx).await;
            while let Some(event) = events.recv().await {
                let relevant = matches!(
                    &event,
                    StoreEvent::RequestCreated { mentor_id, .. }
                    | StoreEvent::RequestResolved { mentor_id, .. }
                        if *mentor_id == mentor
                );
                if !relevant {
                    continue;
                }
                if tx.is_closed() {
                    break;
                }
                deliver_pending(&*store, &mentor, &tx).await;
            }
        });

        Subscription {
            stream: WatchStream::from_changes(rx),
            task,
        }
    }

    /// Live view of a user's active connections, from either side of the
    /// relationship.
    pub async fn subscribe_connections(
        &self,
        role: Role,
        user_id: &str,
    ) -> Subscription<MentorshipConnection> {
        let mut events = self.events.subscribe(None).await;
        let (tx, rx) = watch::channel(Vec::new());
        let store = Arc::clone(&self.connections);
        let user = user_id.to_string();

        let task = tokio::spawn(async move {
            deliver_connections(&*store, role, &user, &tx).await;
            while let Some(event) = events.recv().await {
                let relevant = match (&event, role) {
                    (StoreEvent::ConnectionCreated { student_id, .. }, Role::Student) => {
                        *student_id == user
                    }
                    (StoreEvent::ConnectionCreated { mentor_id, .. }, Role::Mentor) => {
                        *mentor_id == user
                    }
                    _ => false,
                };
                if !relevant {
                    continue;
                }
                if tx.is_closed() {
                    break;
                }
                deliver_connections(&*store, role, &user, &tx).await;
            }
        });

        Subscription {
            stream: WatchStream::from_changes(rx),
            task,
        }
    }
}

/// Re-query the pending set and publish it as the latest value. Publishing
/// to the watch channel never blocks, no matter how slow the subscriber is.
/// A failed query is logged and the stream stays alive; one bad delivery
/// must not tear down the subscription.
async fn deliver_pending(
    store: &dyn RequestStore,
    mentor_id: &str,
    tx: &watch::Sender<Vec<ChatRequest>>,
) {
    match store.list_pending_for_mentor(mentor_id).await {
        Ok(set) => {
            let _ = tx.send(set);
        }
        Err(e) => {
            tracing::warn!("pending-request delivery failed for mentor {}: {}", mentor_id, e);
        }
    }
}

async fn deliver_connections(
    store: &dyn ConnectionStore,
    role: Role,
    user_id: &str,
    tx: &watch::Sender<Vec<MentorshipConnection>>,
) {
    let result = match role {
        Role::Student => store.list_active_for_student(user_id).await,
        Role::Mentor => store.list_active_for_mentor(user_id).await,
    };
    match result {
        Ok(set) => {
            let _ = tx.send(set);
        }
        Err(e) => {
            tracing::warn!("connection delivery failed for {:?} {}: {}", role, user_id, e);
        }
    }
}
