//! The logged-in session.
//!
//! A [`Session`] holds the signed-in profile, that account's ledger, and the
//! displayed insight. It exists from login to logout. A [`SessionMarker`] is
//! the small record persisted so a later process can resume the session.
//!
//! Insight requests run asynchronously while the ledger stays editable. Each
//! request carries an [`InsightTicket`]; switching the active vehicle or
//! starting a newer request invalidates older tickets, so a late answer for a
//! previously selected vehicle is dropped instead of displayed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accounts::Profile;
use crate::error::Result;
use crate::ledger::{AppState, Vehicle};

/// Persisted pointer to the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMarker {
    /// Account id.
    pub account_id: String,
    /// Username at login time, for display.
    pub username: String,
    /// Profile photo at login time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl From<&Profile> for SessionMarker {
    fn from(profile: &Profile) -> Self {
        Self {
            account_id: profile.id.clone(),
            username: profile.username.clone(),
            photo: profile.photo.clone(),
        }
    }
}

/// Identifies one insight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightTicket {
    generation: u64,
    vehicle_id: String,
}

impl InsightTicket {
    /// The vehicle the request is about.
    #[must_use]
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }
}

#[derive(Debug, Default)]
struct InsightState {
    generation: u64,
    text: Option<String>,
    loading: bool,
}

/// A signed-in account and its ledger.
#[derive(Debug)]
pub struct Session {
    profile: Profile,
    ledger: AppState,
    insight: InsightState,
}

impl Session {
    /// Start a session for `profile` with its loaded ledger.
    #[must_use]
    pub fn new(profile: Profile, ledger: AppState) -> Self {
        Self {
            profile,
            ledger,
            insight: InsightState::default(),
        }
    }

    /// The signed-in profile.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub(crate) fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
    }

    /// The account's ledger.
    #[must_use]
    pub fn ledger(&self) -> &AppState {
        &self.ledger
    }

    /// Marker to persist for this session.
    #[must_use]
    pub fn marker(&self) -> SessionMarker {
        SessionMarker::from(&self.profile)
    }

    /// Apply a mutation to a copy of the ledger, hand the copy to `persist`,
    /// and adopt it only once that succeeds.
    ///
    /// If either step fails the session is left as it was. If the active
    /// vehicle changes, the displayed insight is cleared and pending insight
    /// requests are invalidated.
    ///
    /// # Errors
    ///
    /// Returns the error of `mutate` or `persist`.
    pub fn apply<T>(
        &mut self,
        mutate: impl FnOnce(&mut AppState) -> Result<T>,
        persist: impl FnOnce(&AppState) -> Result<()>,
    ) -> Result<T> {
        let mut candidate = self.ledger.clone();
        let value = mutate(&mut candidate)?;
        persist(&candidate)?;

        let switched = candidate.active_vehicle_id != self.ledger.active_vehicle_id;
        self.ledger = candidate;
        if switched {
            self.invalidate_insight();
        }
        Ok(value)
    }

    fn invalidate_insight(&mut self) {
        self.insight.generation += 1;
        self.insight.text = None;
        self.insight.loading = false;
        debug!(generation = self.insight.generation, "Insight invalidated");
    }

    /// Start an insight request for the active vehicle.
    ///
    /// Returns the ticket and a copy of the vehicle to send, or `None` when
    /// no vehicle is active. Any earlier outstanding ticket becomes stale.
    pub fn begin_insight(&mut self) -> Option<(InsightTicket, Vehicle)> {
        let vehicle = self.ledger.active_vehicle()?.clone();
        self.insight.generation += 1;
        self.insight.loading = true;
        let ticket = InsightTicket {
            generation: self.insight.generation,
            vehicle_id: vehicle.id.clone(),
        };
        Some((ticket, vehicle))
    }

    /// Deliver the result of an insight request.
    ///
    /// Returns `true` if the text is now displayed, or `false` if the ticket
    /// is stale and the text was discarded.
    pub fn complete_insight(&mut self, ticket: &InsightTicket, text: String) -> bool {
        let current = ticket.generation == self.insight.generation
            && self.ledger.active_vehicle_id.as_deref() == Some(ticket.vehicle_id.as_str());
        if !current {
            debug!(
                ticket = ticket.generation,
                current = self.insight.generation,
                "Discarding stale insight"
            );
            return false;
        }
        self.insight.text = Some(text);
        self.insight.loading = false;
        true
    }

    /// The insight currently displayed for the active vehicle.
    #[must_use]
    pub fn insight(&self) -> Option<&str> {
        self.insight.text.as_deref()
    }

    /// Whether an insight request is outstanding.
    #[must_use]
    pub fn is_insight_loading(&self) -> bool {
        self.insight.loading
    }
}
