//! Human Approval Gate
//!
//! The channel through which asks reach the human. `ApprovalGate` publishes
//! each ask as a `GateEvent::ApprovalRequest` on the host's event channel and
//! parks the caller on a oneshot until the host calls `resolve()`.
//! `ScriptedApprovals` answers from a queue instead, for headless hosts and
//! tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use uuid::Uuid;

use agent_gate_core::{AskKind, AskReply, CoreError, CoreResult, GateEvent};

/// Asynchronous request/response channel to the human.
#[async_trait]
pub trait ApprovalChannel: Send + Sync {
    /// Ask and wait for the answer.
    async fn ask(&self, kind: AskKind, payload: &str) -> CoreResult<AskReply>;

    /// Ask, answering with `fallback` if nobody responds within `timeout`.
    async fn ask_with_timeout(
        &self,
        kind: AskKind,
        payload: &str,
        timeout: Duration,
        fallback: AskReply,
    ) -> CoreResult<AskReply>;

    /// Render a still-streaming request. Never waits for an answer.
    async fn update_partial(&self, kind: AskKind, payload: &str) -> CoreResult<()>;
}

/// Event-driven approval gate shared between the dispatcher and the host.
///
/// Thread-safe: all fields use interior mutability. Wrap in `Arc` to share.
pub struct ApprovalGate {
    /// Pending requests awaiting a host response.
    /// Key: request_id, Value: oneshot sender to unblock the waiting future.
    pending_requests: Mutex<HashMap<String, oneshot::Sender<AskReply>>>,
    /// Event sender connected to the host UI.
    event_tx: RwLock<Option<mpsc::Sender<GateEvent>>>,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self {
            pending_requests: Mutex::new(HashMap::new()),
            event_tx: RwLock::new(None),
        }
    }

    /// Connect the event sender for approval request events.
    pub async fn set_event_tx(&self, tx: mpsc::Sender<GateEvent>) {
        let mut guard = self.event_tx.write().await;
        *guard = Some(tx);
    }

    /// Clear the event sender (e.g., when the run ends).
    pub async fn clear_event_tx(&self) {
        let mut guard = self.event_tx.write().await;
        *guard = None;
    }

    /// Number of asks currently waiting on the host.
    pub async fn pending_count(&self) -> usize {
        self.pending_requests.lock().await.len()
    }

    /// Answer a pending request (called by the host).
    ///
    /// Returns false if the request is unknown or already settled.
    pub async fn resolve(&self, request_id: &str, reply: AskReply) -> bool {
        let mut pending = self.pending_requests.lock().await;
        match pending.remove(request_id) {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    /// Cancel every pending request.
    ///
    /// Dropping the oneshot senders resolves each waiter as cancelled.
    pub async fn cancel_all(&self) {
        let mut pending = self.pending_requests.lock().await;
        if !pending.is_empty() {
            tracing::info!("[approval] cancelling {} pending request(s)", pending.len());
        }
        pending.clear();
    }

    async fn emit(&self, event: GateEvent) -> CoreResult<()> {
        let tx_guard = self.event_tx.read().await;
        let Some(tx) = tx_guard.as_ref() else {
            return Err(CoreError::internal(
                "No event channel available for approval requests",
            ));
        };
        tx.send(event)
            .await
            .map_err(|_| CoreError::internal("Approval request channel closed"))
    }

    /// Register a pending request and publish it.
    async fn open_request(
        &self,
        kind: AskKind,
        payload: &str,
    ) -> CoreResult<(String, oneshot::Receiver<AskReply>)> {
        let request_id = Uuid::new_v4().to_string();
        let (resp_tx, resp_rx) = oneshot::channel::<AskReply>();
        {
            let mut pending = self.pending_requests.lock().await;
            pending.insert(request_id.clone(), resp_tx);
        }

        let event = GateEvent::ApprovalRequest {
            request_id: request_id.clone(),
            kind,
            payload: payload.to_string(),
            partial: false,
        };
        if let Err(e) = self.emit(event).await {
            self.pending_requests.lock().await.remove(&request_id);
            return Err(e);
        }
        Ok((request_id, resp_rx))
    }
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApprovalChannel for ApprovalGate {
    async fn ask(&self, kind: AskKind, payload: &str) -> CoreResult<AskReply> {
        let (_, resp_rx) = self.open_request(kind, payload).await?;
        // No timeout: the human may take as long as they like
        resp_rx
            .await
            .map_err(|_| CoreError::cancelled("Approval request was cancelled"))
    }

    async fn ask_with_timeout(
        &self,
        kind: AskKind,
        payload: &str,
        timeout: Duration,
        fallback: AskReply,
    ) -> CoreResult<AskReply> {
        let (request_id, resp_rx) = self.open_request(kind, payload).await?;
        match tokio::time::timeout(timeout, resp_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(CoreError::cancelled("Approval request was cancelled")),
            Err(_) => {
                self.pending_requests.lock().await.remove(&request_id);
                tracing::info!(
                    "[approval] {} timed out after {:?}, using fallback",
                    kind.as_str(),
                    timeout
                );
                // Best effort: the host only uses this to dismiss the prompt
                let _ = self
                    .emit(GateEvent::ApprovalTimedOut {
                        request_id,
                        kind,
                    })
                    .await;
                Ok(fallback)
            }
        }
    }

    async fn update_partial(&self, kind: AskKind, payload: &str) -> CoreResult<()> {
        self.emit(GateEvent::ApprovalRequest {
            request_id: Uuid::new_v4().to_string(),
            kind,
            payload: payload.to_string(),
            partial: true,
        })
        .await
    }
}

/// Answers asks from a queue of prepared replies.
///
/// When the queue runs dry every further ask gets `default_reply`. Every
/// ask (partial previews included) is recorded for inspection.
pub struct ScriptedApprovals {
    replies: StdMutex<VecDeque<AskReply>>,
    default_reply: AskReply,
    asked: StdMutex<Vec<(AskKind, String)>>,
    partials: StdMutex<Vec<(AskKind, String)>>,
}

impl ScriptedApprovals {
    pub fn new(replies: impl IntoIterator<Item = AskReply>, default_reply: AskReply) -> Self {
        Self {
            replies: StdMutex::new(replies.into_iter().collect()),
            default_reply,
            asked: StdMutex::new(Vec::new()),
            partials: StdMutex::new(Vec::new()),
        }
    }

    /// Approve everything.
    pub fn approve_all() -> Self {
        Self::new([], AskReply::yes())
    }

    /// Reject everything.
    pub fn reject_all() -> Self {
        Self::new([], AskReply::no())
    }

    /// Blocking asks received so far.
    pub fn asked(&self) -> Vec<(AskKind, String)> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Partial previews received so far.
    pub fn partials(&self) -> Vec<(AskKind, String)> {
        self.partials.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn next_reply(&self, kind: AskKind, payload: &str) -> AskReply {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push((kind, payload.to_string()));
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

#[async_trait]
impl ApprovalChannel for ScriptedApprovals {
    async fn ask(&self, kind: AskKind, payload: &str) -> CoreResult<AskReply> {
        Ok(self.next_reply(kind, payload))
    }

    async fn ask_with_timeout(
        &self,
        kind: AskKind,
        payload: &str,
        _timeout: Duration,
        _fallback: AskReply,
    ) -> CoreResult<AskReply> {
        Ok(self.next_reply(kind, payload))
    }

    async fn update_partial(&self, kind: AskKind, payload: &str) -> CoreResult<()> {
        if let Ok(mut partials) = self.partials.lock() {
            partials.push((kind, payload.to_string()));
        }
        Ok(())
    }
}
