//! Key/value implementation of [`AccountsRepository`].
//!
//! Two records are written per account, in one conditional batch:
//!
//! | Key | Purpose |
//! |-----|---------|
//! | `identity#{provider}#{external_id}` | point lookup during login |
//! | `account#{account_id}` | per-account queries |
//!
//! Each write is conditioned on its own key being absent. That condition is
//! the only concurrency control for account creation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use passage_storage::{StorageBackend, StorageError, WriteBatch};

use crate::{AccountId, AccountsError, AccountsRepository, IdGenerator, ProviderType, UuidV7Generator};

const IDENTITY_KEY_PREFIX: &str = "identity";
const ACCOUNT_KEY_PREFIX: &str = "account";

/// Names of the creation batch writes, by index.
const CREATE_OPERATIONS: [&str; 2] = ["put provider identity", "put account"];

/// Stored link between a provider identity and an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProviderRecord {
    /// Linked account.
    pub account_id: AccountId,
    /// Provider that asserted the identity.
    pub provider_type: ProviderType,
    /// Provider's subject id.
    pub provider_id: String,
    /// Creation time, RFC 3339 UTC.
    pub date_created: String,
}

/// Accounts repository over any [`StorageBackend`].
pub struct KvAccountsRepository {
    storage: Arc<dyn StorageBackend>,
    id_generator: Arc<dyn IdGenerator>,
}

impl KvAccountsRepository {
    /// Creates a repository that generates UUIDv7 account ids.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self::with_id_generator(storage, Arc::new(UuidV7Generator))
    }

    /// Creates a repository with a custom id generator.
    pub fn with_id_generator(
        storage: Arc<dyn StorageBackend>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            storage,
            id_generator,
        }
    }

    /// Storage key of the identity record.
    pub fn identity_key(provider_type: ProviderType, external_id: &str) -> String {
        format!("{IDENTITY_KEY_PREFIX}#{provider_type}#{external_id}")
    }

    /// Storage key of the account record.
    pub fn account_key(account_id: &AccountId) -> String {
        format!("{ACCOUNT_KEY_PREFIX}#{account_id}")
    }

    fn validate_external_id(external_id: &str) -> Result<(), AccountsError> {
        if external_id.is_empty() {
            return Err(AccountsError::InvalidInput(
                "external id cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountsRepository for KvAccountsRepository {
    async fn resolve_id_by_provider(
        &self,
        provider_type: ProviderType,
        external_id: &str,
    ) -> Result<AccountId, AccountsError> {
        Self::validate_external_id(external_id)?;

        let key = Self::identity_key(provider_type, external_id);
        let bytes = self
            .storage
            .get(&key)
            .await?
            .ok_or(AccountsError::NotFound)?;

        let record: AccountProviderRecord = serde_json::from_slice(&bytes)?;

        if record.provider_type != provider_type || record.provider_id != external_id {
            warn!(key = %key, "Identity record does not match its key");
            return Err(AccountsError::Integrity(format!(
                "identity record under {key} belongs to {}#{}",
                record.provider_type, record.provider_id
            )));
        }
        if record.account_id.is_empty() {
            warn!(key = %key, "Identity record has no account id");
            return Err(AccountsError::Integrity(format!(
                "identity record under {key} has an empty account id"
            )));
        }

        debug!(provider = %provider_type, account_id = %record.account_id, "Account resolved");
        Ok(record.account_id)
    }

    async fn create(
        &self,
        provider_type: ProviderType,
        external_id: &str,
    ) -> Result<AccountId, AccountsError> {
        Self::validate_external_id(external_id)?;

        let account_id = AccountId::new(self.id_generator.generate());
        if account_id.is_empty() {
            return Err(AccountsError::InvalidInput(
                "id generator returned an empty account id".into(),
            ));
        }

        let record = AccountProviderRecord {
            account_id: account_id.clone(),
            provider_type,
            provider_id: external_id.to_string(),
            date_created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let value = serde_json::to_vec(&record)?;

        let batch = WriteBatch::new()
            .put_if_absent(Self::identity_key(provider_type, external_id), value.clone())
            .put_if_absent(Self::account_key(&account_id), value);

        match self.storage.write_batch(batch).await {
            Ok(()) => {
                info!(provider = %provider_type, account_id = %account_id, "Account created");
                Ok(account_id)
            },
            Err(StorageError::ConditionFailed { index, key }) => {
                let operation = CREATE_OPERATIONS.get(index).copied().unwrap_or("unknown");
                debug!(provider = %provider_type, key = %key, operation, "Account creation lost a race");
                Err(AccountsError::AlreadyExists { operation })
            },
            Err(e) => Err(e.into()),
        }
    }
}
