//! The application controller.
//!
//! [`Tracker`] owns the store and the current [`Session`]. Every ledger
//! mutation goes through it: the change is applied to a copy of the ledger,
//! the whole snapshot is written back, and only then does the session adopt
//! the copy.

use tracing::{debug, info, warn};

use crate::accounts::{AccountDirectory, Profile};
use crate::config::AccountsConfig;
use crate::error::{Error, Result};
use crate::insight::{InsightProvider, InsightRequester};
use crate::ledger::{
    AppState, FuelEntry, FuelEntryInput, LedgerStore, MaintenanceEntry, MaintenanceInput,
    Vehicle, VehicleAttrs,
};
use crate::session::{InsightTicket, Session, SessionMarker};
use crate::storage::{KeyValueStore, SESSION_KEY};

/// Top-level controller over a key-value store.
#[derive(Debug)]
pub struct Tracker<S: KeyValueStore> {
    store: S,
    accounts: AccountsConfig,
    session: Option<Session>,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Create a tracker with nobody logged in.
    #[must_use]
    pub fn new(store: S, accounts: AccountsConfig) -> Self {
        Self {
            store,
            accounts,
            session: None,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The account directory.
    #[must_use]
    pub fn directory(&self) -> AccountDirectory<'_, S> {
        AccountDirectory::new(&self.store, &self.accounts)
    }

    fn ledgers(&self) -> LedgerStore<'_, S> {
        LedgerStore::new(&self.store)
    }

    /// The current session, if someone is logged in.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The current session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if nobody is logged in.
    pub fn require_session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NotLoggedIn)
    }

    /// The logged-in account's ledger.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if nobody is logged in.
    pub fn ledger(&self) -> Result<&AppState> {
        Ok(self.require_session()?.ledger())
    }

    fn start_session(&mut self, profile: Profile) -> Result<&Session> {
        let ledger = self.ledgers().load(&profile.id);
        let session = Session::new(profile, ledger);
        self.store.set_json(SESSION_KEY, &session.marker())?;
        info!(
            account = %session.profile().id,
            username = %session.profile().username,
            vehicles = session.ledger().vehicles.len(),
            "Session started"
        );
        let session: &Session = self.session.insert(session);
        Ok(session)
    }

    /// Create an account and log into it.
    ///
    /// # Errors
    ///
    /// Propagates registration errors (see [`AccountDirectory::register`]).
    pub fn register(&mut self, username: &str, password: Option<&str>) -> Result<&Session> {
        let profile = self.directory().register(username, password)?;
        self.start_session(profile)
    }

    /// Authenticate and load the account's ledger.
    ///
    /// # Errors
    ///
    /// Propagates authentication errors (see [`AccountDirectory::authenticate`]).
    pub fn login(&mut self, username: &str, password: Option<&str>) -> Result<&Session> {
        let profile = self.directory().authenticate(username, password)?;
        self.start_session(profile)
    }

    /// Restore the session recorded by an earlier login, if any.
    ///
    /// A marker that cannot be parsed or that names a vanished account is
    /// cleared and no session is started.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn resume(&mut self) -> Result<Option<&Session>> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };
        let marker: SessionMarker = match serde_json::from_str(&raw) {
            Ok(marker) => marker,
            Err(e) => {
                warn!(error = %e, "Malformed session marker, clearing");
                self.store.remove(SESSION_KEY)?;
                return Ok(None);
            }
        };

        let account = self.directory().find(&marker.account_id)?;
        let Some(account) = account else {
            warn!(account = %marker.account_id, "Session marker names unknown account, clearing");
            self.store.remove(SESSION_KEY)?;
            return Ok(None);
        };

        let profile = account.profile();
        let ledger = self.ledgers().load(&profile.id);
        debug!(username = %profile.username, "Resumed session");
        let session: &Session = self.session.insert(Session::new(profile, ledger));
        Ok(Some(session))
    }

    /// End the session and forget the marker.
    ///
    /// Returns `true` if someone was logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be removed.
    pub fn logout(&mut self) -> Result<bool> {
        self.store.remove(SESSION_KEY)?;
        match self.session.take() {
            Some(session) => {
                info!(username = %session.profile().username, "Logged out");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Rename the logged-in account and replace its photo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] or a directory error.
    pub fn update_profile(
        &mut self,
        new_username: &str,
        new_photo: Option<String>,
    ) -> Result<Profile> {
        let account_id = self.require_session()?.profile().id.clone();
        let profile = self
            .directory()
            .update_profile(&account_id, new_username, new_photo)?;

        let session = self.session.as_mut().ok_or(Error::NotLoggedIn)?;
        session.set_profile(profile.clone());
        let marker = session.marker();
        self.store.set_json(SESSION_KEY, &marker)?;
        Ok(profile)
    }

    /// Apply a ledger mutation and persist the result.
    ///
    /// Nothing is written if the mutation fails, and the in-memory ledger is
    /// only replaced once the write succeeds.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut AppState) -> Result<T>) -> Result<T> {
        let session = self.session.as_mut().ok_or(Error::NotLoggedIn)?;
        let account_id = session.profile().id.clone();
        let ledgers = LedgerStore::new(&self.store);
        session.apply(f, |candidate| ledgers.save(&account_id, candidate))
    }

    /// Add a vehicle; it becomes the active one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`], a validation error or a storage error.
    pub fn add_vehicle(&mut self, attrs: VehicleAttrs) -> Result<String> {
        self.mutate(|state| state.add_vehicle(attrs))
    }

    /// Edit a vehicle's attributes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] for an unknown id, among others.
    pub fn update_vehicle(&mut self, id: &str, attrs: VehicleAttrs) -> Result<()> {
        self.mutate(|state| {
            if state.update_vehicle(id, attrs)? {
                Ok(())
            } else {
                Err(Error::vehicle_not_found(id))
            }
        })
    }

    /// Delete a vehicle and its entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] for an unknown id, among others.
    pub fn remove_vehicle(&mut self, id: &str) -> Result<Vehicle> {
        self.mutate(|state| state.remove_vehicle(id))
    }

    /// Select the active vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] for an unknown id, among others.
    pub fn select_vehicle(&mut self, id: Option<&str>) -> Result<()> {
        self.mutate(|state| state.set_active_vehicle(id))
    }

    /// Record a fill-up.
    ///
    /// # Errors
    ///
    /// Returns a validation, lookup or storage error.
    pub fn add_fuel_entry(&mut self, vehicle_id: &str, input: FuelEntryInput) -> Result<String> {
        self.mutate(|state| state.add_fuel_entry(vehicle_id, input))
    }

    /// Edit a fill-up.
    ///
    /// # Errors
    ///
    /// Returns a validation, lookup or storage error.
    pub fn update_fuel_entry(
        &mut self,
        vehicle_id: &str,
        entry_id: &str,
        input: FuelEntryInput,
    ) -> Result<()> {
        self.mutate(|state| state.update_fuel_entry(vehicle_id, entry_id, input))
    }

    /// Delete a fill-up.
    ///
    /// # Errors
    ///
    /// Returns a lookup or storage error.
    pub fn remove_fuel_entry(&mut self, vehicle_id: &str, entry_id: &str) -> Result<FuelEntry> {
        self.mutate(|state| state.remove_fuel_entry(vehicle_id, entry_id))
    }

    /// Record a maintenance event.
    ///
    /// # Errors
    ///
    /// Returns a validation, lookup or storage error.
    pub fn add_maintenance_entry(
        &mut self,
        vehicle_id: &str,
        input: MaintenanceInput,
    ) -> Result<String> {
        self.mutate(|state| state.add_maintenance_entry(vehicle_id, input))
    }

    /// Edit a maintenance event.
    ///
    /// # Errors
    ///
    /// Returns a validation, lookup or storage error.
    pub fn update_maintenance_entry(
        &mut self,
        vehicle_id: &str,
        entry_id: &str,
        input: MaintenanceInput,
    ) -> Result<()> {
        self.mutate(|state| state.update_maintenance_entry(vehicle_id, entry_id, input))
    }

    /// Delete a maintenance event.
    ///
    /// # Errors
    ///
    /// Returns a lookup or storage error.
    pub fn remove_maintenance_entry(
        &mut self,
        vehicle_id: &str,
        entry_id: &str,
    ) -> Result<MaintenanceEntry> {
        self.mutate(|state| state.remove_maintenance_entry(vehicle_id, entry_id))
    }

    /// Start an insight request for the active vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if nobody is logged in.
    pub fn begin_insight(&mut self) -> Result<Option<(InsightTicket, Vehicle)>> {
        let session = self.session.as_mut().ok_or(Error::NotLoggedIn)?;
        Ok(session.begin_insight())
    }

    /// Deliver an insight; stale tickets are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if nobody is logged in.
    pub fn complete_insight(&mut self, ticket: &InsightTicket, text: String) -> Result<bool> {
        let session = self.session.as_mut().ok_or(Error::NotLoggedIn)?;
        Ok(session.complete_insight(ticket, text))
    }

    /// Fetch and display an insight for the active vehicle.
    ///
    /// Returns the displayed text, or `None` when no vehicle is active or the
    /// answer went stale while in flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if nobody is logged in.
    pub async fn refresh_insight<P: InsightProvider>(
        &mut self,
        requester: &InsightRequester<P>,
    ) -> Result<Option<String>> {
        let Some((ticket, vehicle)) = self.begin_insight()? else {
            return Ok(None);
        };
        let text = requester.get_insight(&vehicle).await;
        if self.complete_insight(&ticket, text.clone())? {
            Ok(Some(text))
        } else {
            Ok(None)
        }
    }
}
