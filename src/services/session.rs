// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Active session registry: which reference each user is activating.

use crate::config::RefPolicy;
use crate::db::JsonStore;
use crate::error::{AppError, Result};
use crate::models::{Session, Summit, SummitRef};
use crate::services::{CallsignRegistry, SummitCache};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

type SessionMap = BTreeMap<String, Session>;

/// Result of opening a session.
#[derive(Debug, Clone)]
pub struct OpenedSession {
    pub session: Session,
    /// Summit metadata, when the reference resolved
    pub summit: Option<Summit>,
}

/// Maps a user identity to their active session.
///
/// A session copies the callsign at open time; later registrations do not
/// change it. Opening replaces any previous session wholesale.
#[derive(Clone)]
pub struct SessionRegistry {
    store: JsonStore<SessionMap>,
    sessions: Arc<Mutex<SessionMap>>,
    callsigns: CallsignRegistry,
    summits: SummitCache,
    policy: RefPolicy,
}

impl SessionRegistry {
    /// Open the registry, loading any prior state.
    pub async fn open(
        store: JsonStore<SessionMap>,
        callsigns: CallsignRegistry,
        summits: SummitCache,
        policy: RefPolicy,
    ) -> Self {
        let sessions = store.load_or_default().await;
        tracing::info!(
            path = %store.path().display(),
            count = sessions.len(),
            ?policy,
            "Session registry loaded"
        );
        Self {
            store,
            sessions: Arc::new(Mutex::new(sessions)),
            callsigns,
            summits,
            policy,
        }
    }

    /// Start (or replace) the session for `user_id` at `reference`.
    ///
    /// Checks, in order: a registered callsign, reference syntax, and
    /// (under [`RefPolicy::Validated`]) that the summit resolves.
    pub async fn open_session(&self, user_id: &str, reference: &str) -> Result<OpenedSession> {
        let callsign = self
            .callsigns
            .lookup(user_id)
            .await
            .ok_or(AppError::CallsignRequired)?;

        let summit_ref = SummitRef::parse(reference)?;

        let summit = match (self.summits.describe(&summit_ref.code()).await, self.policy) {
            (Ok(summit), _) => Some(summit),
            (Err(e), RefPolicy::Validated) => {
                tracing::info!(user_id, reference = %summit_ref, error = %e, "Reference rejected");
                return Err(match e {
                    AppError::NotFound(_) => {
                        AppError::NotFound(format!("unknown location {}", summit_ref))
                    }
                    other => other,
                });
            }
            (Err(e), RefPolicy::Permissive) => {
                tracing::warn!(
                    user_id,
                    reference = %summit_ref,
                    error = %e,
                    "Reference did not resolve, accepting anyway"
                );
                None
            }
        };

        let session = Session {
            reference: summit_ref.code(),
            callsign,
        };

        let mut sessions = self.sessions.lock().await;
        let mut updated = sessions.clone();
        updated.insert(user_id.to_string(), session.clone());
        self.store.save(&updated).await?;
        *sessions = updated;

        tracing::info!(
            user_id,
            callsign = %session.callsign,
            reference = %session.reference,
            "Session opened"
        );
        Ok(OpenedSession { session, summit })
    }

    pub async fn lookup(&self, user_id: &str) -> Option<Session> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    /// End the session for `user_id`. Closing a missing session is a no-op
    /// but still rewrites the state file. A failed save leaves the session
    /// in place.
    pub async fn close(&self, user_id: &str) -> Result<bool> {
        let mut sessions = self.sessions.lock().await;
        let mut updated = sessions.clone();
        let removed = updated.remove(user_id).is_some();
        self.store.save(&updated).await?;
        *sessions = updated;

        tracing::info!(user_id, removed, "Session closed");
        Ok(removed)
    }
}
