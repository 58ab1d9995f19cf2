//! The account directory.
//!
//! Accounts namespace ledgers. Each one has a stable id that keys its ledger
//! snapshot, a username that is unique ignoring case, an optional bcrypt
//! password hash and an optional profile photo. The whole directory is one
//! JSON list under [`ACCOUNTS_KEY`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AccountsConfig;
use crate::error::{Error, Result};
use crate::ledger::vehicle::validate_photo;
use crate::storage::{KeyValueStore, ACCOUNTS_KEY};

/// Where an unparsable account directory is copied before it is overwritten.
pub const MALFORMED_ACCOUNTS_KEY: &str = "accounts.malformed";

/// A registered account as stored in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Stable identifier; never changes, even on rename.
    pub id: String,
    /// Display and login name.
    pub username: String,
    /// bcrypt hash, or `None` for a password-less account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Profile photo as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The public part of the account.
    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            username: self.username.clone(),
            photo: self.photo.clone(),
        }
    }

    /// Whether logging in requires a password.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    fn matches_username(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.trim().to_lowercase()
    }
}

/// What a successful login hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Account id.
    pub id: String,
    /// Username.
    pub username: String,
    /// Profile photo as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

fn normalize_username(username: &str) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::validation("username", "must not be empty"));
    }
    Ok(username.to_string())
}

fn non_blank(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}

/// Register, authenticate and edit accounts stored in a [`KeyValueStore`].
#[derive(Debug)]
pub struct AccountDirectory<'a, S: KeyValueStore> {
    store: &'a S,
    config: &'a AccountsConfig,
}

impl<'a, S: KeyValueStore> AccountDirectory<'a, S> {
    /// Wrap a store with the given account policy.
    #[must_use]
    pub fn new(store: &'a S, config: &'a AccountsConfig) -> Self {
        Self { store, config }
    }

    /// Every registered account, in registration order.
    ///
    /// A directory that cannot be parsed is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list(&self) -> Result<Vec<Account>> {
        let Some(raw) = self.store.get(ACCOUNTS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(accounts) => Ok(accounts),
            Err(e) => {
                warn!(error = %e, "Malformed account directory, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, accounts: &[Account]) -> Result<()> {
        self.store.set_json(ACCOUNTS_KEY, &accounts)
    }

    /// Copy an unparsable directory to [`MALFORMED_ACCOUNTS_KEY`] before it
    /// is overwritten.
    fn preserve_malformed(&self) -> Result<()> {
        let Some(raw) = self.store.get(ACCOUNTS_KEY)? else {
            return Ok(());
        };
        if serde_json::from_str::<Vec<Account>>(&raw).is_ok() {
            return Ok(());
        }
        self.store.set(MALFORMED_ACCOUNTS_KEY, &raw)?;
        error!(
            backup_key = MALFORMED_ACCOUNTS_KEY,
            "Overwriting malformed account directory; previous contents copied aside"
        );
        Ok(())
    }

    /// Look up an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn find(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.list()?.into_iter().find(|a| a.id == id))
    }

    /// Look up an account by username, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|a| a.matches_username(username)))
    }

    /// Create an account.
    ///
    /// An empty password counts as no password.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a blank username, or a missing password
    ///   when the directory requires one
    /// - [`Error::DuplicateAccount`] if the name is taken ignoring case
    /// - [`Error::PasswordHash`] if hashing fails
    pub fn register(&self, username: &str, password: Option<&str>) -> Result<Profile> {
        let username = normalize_username(username)?;
        let password = non_blank(password);
        if self.config.require_password && password.is_none() {
            return Err(Error::validation("password", "is required"));
        }

        let mut accounts = self.list()?;
        if accounts.iter().any(|a| a.matches_username(&username)) {
            return Err(Error::DuplicateAccount { username });
        }

        let password_hash = password
            .map(|p| bcrypt::hash(p, self.config.hash_cost))
            .transpose()?;

        let account = Account {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            photo: None,
            created_at: Utc::now(),
        };
        info!(account = %account.id, username = %account.username, "Registered account");

        let profile = account.profile();
        accounts.push(account);
        self.preserve_malformed()?;
        self.save(&accounts)?;
        Ok(profile)
    }

    /// Check credentials and return the account's profile.
    ///
    /// Accounts without a password accept any password.
    ///
    /// # Errors
    ///
    /// - [`Error::AccountNotFound`] if no account has this name
    /// - [`Error::InvalidCredentials`] if the password is missing or wrong
    pub fn authenticate(&self, username: &str, password: Option<&str>) -> Result<Profile> {
        let account = self
            .find_by_username(username)?
            .ok_or_else(|| Error::AccountNotFound {
                username: username.trim().to_string(),
            })?;

        if let Some(hash) = &account.password_hash {
            let password = non_blank(password).ok_or(Error::InvalidCredentials)?;
            if !bcrypt::verify(password, hash)? {
                debug!(username = %account.username, "Password mismatch");
                return Err(Error::InvalidCredentials);
            }
        }

        Ok(account.profile())
    }

    /// Rename an account and replace its photo.
    ///
    /// The account id, and therefore its ledger, is unaffected.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a blank username or malformed photo
    /// - [`Error::DuplicateAccount`] if another account already has the name
    /// - [`Error::AccountNotFound`] if the id is unknown
    pub fn update_profile(
        &self,
        account_id: &str,
        new_username: &str,
        new_photo: Option<String>,
    ) -> Result<Profile> {
        let new_username = normalize_username(new_username)?;
        if let Some(photo) = &new_photo {
            validate_photo(photo)?;
        }

        let mut accounts = self.list()?;
        if accounts
            .iter()
            .any(|a| a.id != account_id && a.matches_username(&new_username))
        {
            return Err(Error::DuplicateAccount {
                username: new_username,
            });
        }

        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| Error::AccountNotFound {
                username: account_id.to_string(),
            })?;
        if account.username != new_username {
            info!(account = %account_id, from = %account.username, to = %new_username, "Renamed account");
        }
        account.username = new_username;
        account.photo = new_photo;
        let profile = account.profile();

        self.save(&accounts)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn fast_config() -> AccountsConfig {
        AccountsConfig {
            require_password: false,
            hash_cost: 4,
        }
    }

    #[test]
    fn test_register_and_list() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);

        let profile = directory.register("  Ana ", None).unwrap();
        assert_eq!(profile.username, "Ana");
        assert!(profile.photo.is_none());

        let accounts = directory.list().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, profile.id);
        assert!(!accounts[0].has_password());
    }

    #[test]
    fn test_duplicate_ignoring_case() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);

        directory.register("Ana", None).unwrap();
        let err = directory.register("ANA", None).unwrap_err();
        assert!(err.is_duplicate_account());
        assert_eq!(directory.list().unwrap().len(), 1);
    }

    #[test]
    fn test_blank_username_rejected() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);
        assert!(directory.register("   ", None).unwrap_err().is_validation());
    }

    #[test]
    fn test_required_password() {
        let store = MemoryStore::new();
        let config = AccountsConfig {
            require_password: true,
            hash_cost: 4,
        };
        let directory = AccountDirectory::new(&store, &config);

        assert!(directory.register("Ana", None).unwrap_err().is_validation());
        assert!(directory.register("Ana", Some("")).unwrap_err().is_validation());
        assert!(directory.register("Ana", Some("s3cret")).is_ok());
    }

    #[test]
    fn test_password_is_hashed() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);
        directory.register("Ana", Some("s3cret")).unwrap();

        let raw = store.get(ACCOUNTS_KEY).unwrap().unwrap();
        assert!(!raw.contains("s3cret"));
        assert!(raw.contains("passwordHash"));
    }

    #[test]
    fn test_authenticate_with_password() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);
        let registered = directory.register("Ana", Some("s3cret")).unwrap();

        let profile = directory.authenticate("ana", Some("s3cret")).unwrap();
        assert_eq!(profile, registered);

        let err = directory.authenticate("Ana", Some("wrong")).unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        let err = directory.authenticate("Ana", None).unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
    }

    #[test]
    fn test_authenticate_without_password() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);
        directory.register("Bia", None).unwrap();

        assert!(directory.authenticate("BIA", None).is_ok());
        assert!(directory.authenticate("Bia", Some("anything")).is_ok());
    }

    #[test]
    fn test_authenticate_unknown() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);

        let err = directory.authenticate("ghost", None).unwrap_err();
        assert!(matches!(err, Error::AccountNotFound { .. }));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_update_profile_renames_in_place() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);
        let ana = directory.register("Ana", None).unwrap();

        let photo = crate::ledger::vehicle::photo_data_url("image/png", b"png");
        let updated = directory
            .update_profile(&ana.id, "Ana Paula", Some(photo.clone()))
            .unwrap();
        assert_eq!(updated.id, ana.id);
        assert_eq!(updated.username, "Ana Paula");
        assert_eq!(updated.photo.as_deref(), Some(photo.as_str()));

        assert!(directory.find_by_username("Ana").unwrap().is_none());
        assert!(directory.find_by_username("ana paula").unwrap().is_some());
    }

    #[test]
    fn test_update_profile_rejects_taken_name() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);
        let ana = directory.register("Ana", None).unwrap();
        directory.register("Bia", None).unwrap();

        let err = directory.update_profile(&ana.id, "bia", None).unwrap_err();
        assert!(err.is_duplicate_account());

        // Changing only the case of one's own name is fine.
        assert!(directory.update_profile(&ana.id, "ANA", None).is_ok());
    }

    #[test]
    fn test_update_profile_unknown_account() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);
        assert!(directory.update_profile("nope", "X", None).is_err());
    }

    #[test]
    fn test_malformed_directory_is_empty() {
        let store = MemoryStore::new();
        store.set(ACCOUNTS_KEY, "[{\"broken\"").unwrap();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);

        assert!(directory.list().unwrap().is_empty());
        assert!(directory.register("Ana", None).is_ok());
    }

    #[test]
    fn test_register_over_malformed_directory_keeps_copy() {
        let store = MemoryStore::new();
        store.set(ACCOUNTS_KEY, "[{\"broken\"").unwrap();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);

        directory.register("Ana", None).unwrap();
        assert_eq!(
            store.get(MALFORMED_ACCOUNTS_KEY).unwrap().as_deref(),
            Some("[{\"broken\"")
        );
        let accounts = directory.list().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "Ana");

        directory.register("Bia", None).unwrap();
        assert_eq!(
            store.get(MALFORMED_ACCOUNTS_KEY).unwrap().as_deref(),
            Some("[{\"broken\"")
        );
    }

    #[test]
    fn test_healthy_directory_is_not_copied() {
        let store = MemoryStore::new();
        let config = fast_config();
        let directory = AccountDirectory::new(&store, &config);

        directory.register("Ana", None).unwrap();
        directory.register("Bia", None).unwrap();
        assert!(store.get(MALFORMED_ACCOUNTS_KEY).unwrap().is_none());
    }
}
