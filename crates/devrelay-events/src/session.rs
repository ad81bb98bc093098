//! Session analytics
//!
//! Tracks user login/logout and derives session durations. When no user id
//! has been set, login generates a stable anonymous id for the rest of the
//! session; anonymous ids survive logout so repeat logins from the same
//! process correlate.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use devrelay_delivery::{Envelope, ParallelDispatcher};
use tracing::{debug, info, warn};
use uuid::Uuid;

const ANONYMOUS_PREFIX: &str = "anon_";

pub struct SessionTracker {
    dispatcher: ParallelDispatcher,
    active_users: DashSet<String>,
    session_starts: DashMap<String, DateTime<Utc>>,
    current_user: Mutex<Option<String>>,
}

impl SessionTracker {
    pub fn new(dispatcher: ParallelDispatcher) -> Self {
        Self {
            dispatcher,
            active_users: DashSet::new(),
            session_starts: DashMap::new(),
            current_user: Mutex::new(None),
        }
    }

    pub fn set_current_user(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        let mut current = self.lock_current();
        *current = if user_id.trim().is_empty() {
            None
        } else {
            Some(user_id)
        };
    }

    pub fn current_user(&self) -> Option<String> {
        self.lock_current().clone()
    }

    pub fn active_user_count(&self) -> usize {
        self.active_users.len()
    }

    /// Marks the current user as logged in and starts their session clock.
    /// Without a prior `set_current_user` an anonymous id is generated.
    pub fn user_logged_in(&self) {
        let user_id = {
            let mut current = self.lock_current();
            match current.as_deref() {
                Some(id) if !id.trim().is_empty() => id.to_string(),
                _ => {
                    let anon = format!("{ANONYMOUS_PREFIX}{}", Uuid::new_v4());
                    info!(user = %anon, "Generated anonymous user id");
                    *current = Some(anon.clone());
                    anon
                }
            }
        };

        self.active_users.insert(user_id.clone());
        self.session_starts.insert(user_id.clone(), Utc::now());

        self.dispatcher.dispatch(Envelope::Analytics {
            subpath: String::new(),
            body: serde_json::json!({
                "eventType": "user_login",
                "data": {
                    "userId": user_id,
                    "activeUsers": self.active_users.len(),
                },
            }),
        });

        self.track_location();
    }

    /// Marks the current user as logged out and emits their session
    /// duration. A no-op when no user is set.
    pub fn user_logged_out(&self) {
        let Some(user_id) = self.current_user() else {
            warn!("No current user set, nothing to log out");
            return;
        };

        self.active_users.remove(&user_id);

        self.dispatcher.dispatch(Envelope::Analytics {
            subpath: String::new(),
            body: serde_json::json!({
                "eventType": "user_logout",
                "data": {
                    "userId": user_id,
                    "activeUsers": self.active_users.len(),
                },
            }),
        });

        self.track_session_duration(&user_id);

        // Anonymous ids are kept so a later login reuses the same identity.
        if !user_id.starts_with(ANONYMOUS_PREFIX) {
            *self.lock_current() = None;
        }
    }

    fn track_session_duration(&self, user_id: &str) {
        let Some((_, start)) = self.session_starts.remove(user_id) else {
            debug!(user = user_id, "No session start recorded, skipping duration");
            return;
        };

        let end = Utc::now();
        let duration_secs = (end - start).num_seconds().max(0);

        self.dispatcher.dispatch(Envelope::Analytics {
            subpath: "/session".to_string(),
            body: serde_json::json!({
                "eventType": "session_duration",
                "data": {
                    "userId": user_id,
                    "startTime": start.to_rfc3339(),
                    "endTime": end.to_rfc3339(),
                    "durationSeconds": duration_secs,
                },
            }),
        });
    }

    /// Emits a coarse location description derived from timezone and
    /// locale. No network lookups, nothing more precise than a region.
    pub fn track_location(&self) {
        self.dispatcher.dispatch(Envelope::Analytics {
            subpath: String::new(),
            body: serde_json::json!({
                "eventType": "location_info",
                "data": { "location": locale_location() },
            }),
        });
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        match self.current_user.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// `"<locale> (<timezone>)"`, each part degrading to `"unknown"`.
fn locale_location() -> String {
    let locale = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LANG"))
        .ok()
        .map(|l| l.split('.').next().unwrap_or(&l).to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let timezone = std::env::var("TZ")
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/timezone")
                .ok()
                .map(|tz| tz.trim().to_string())
        })
        .filter(|tz| !tz.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    format!("{locale} ({timezone})")
}
