use super::cache::{Cache, EntityKey, QueryKey};
use super::operations::Operation;
use super::{ClientError, GraphQlRequest, Transport};
use crate::preferences::PreferenceStore;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tasktrack_core::Organization;

/// Typed access to the API on top of a [`Transport`].
///
/// The organization scope of every request is read from the preference store when
/// the request is made.
pub struct RemoteClient<T: Transport, P: PreferenceStore> {
    transport: T,
    preferences: P,
    cache: Mutex<Cache>,
}

impl<T: Transport, P: PreferenceStore> RemoteClient<T, P> {
    pub fn new(transport: T, preferences: P) -> Self {
        Self {
            transport,
            preferences,
            cache: Mutex::new(Cache::new()),
        }
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn current_organization(&self) -> Option<Organization> {
        self.preferences.current_organization()
    }

    /// Slug of the selected organization.
    pub fn scope(&self) -> Option<String> {
        self.current_organization().map(|organization| organization.slug)
    }

    /// Runs a query.
    ///
    /// Returns `Ok(None)` without contacting the server when the operation is
    /// organization-scoped and no organization is selected.
    pub async fn query<O: Operation>(
        &self,
        variables: &O::Variables,
    ) -> Result<Option<O::Output>, ClientError> {
        let scope = self.scope();
        if O::SCOPED && scope.is_none() {
            tracing::debug!("Skipping {}: no organization selected", O::NAME);
            return Ok(None);
        }

        let variables = serde_json::to_value(variables)?;
        let key = QueryKey::new(O::NAME, scope.as_deref(), &variables);
        let data = self.send::<O>(variables, scope).await?;
        let output = decode::<O>(&data)?;

        self.cache().write_query(key, &data);
        Ok(Some(output))
    }

    /// Runs a mutation and merges any entities it returns into the cache.
    pub async fn mutate<O: Operation>(
        &self,
        variables: &O::Variables,
    ) -> Result<O::Output, ClientError> {
        let scope = self.scope();
        if O::SCOPED && scope.is_none() {
            return Err(ClientError::MissingScope);
        }

        let variables = serde_json::to_value(variables)?;
        let data = self.send::<O>(variables, scope).await?;
        let output = decode::<O>(&data)?;

        self.cache().merge(&data);
        Ok(output)
    }

    /// The last result of a query under the current scope, without a round trip.
    pub fn read_query<O: Operation>(&self, variables: &O::Variables) -> Option<O::Output> {
        let scope = self.scope();
        if O::SCOPED && scope.is_none() {
            return None;
        }
        let variables = serde_json::to_value(variables).ok()?;
        let key = QueryKey::new(O::NAME, scope.as_deref(), &variables);
        let data = self.cache().read_query(&key)?;
        match decode::<O>(&data) {
            Ok(output) => Some(output),
            Err(e) => {
                tracing::debug!("Cached {} no longer decodes: {}", O::NAME, e);
                None
            }
        }
    }

    /// Forgets an entity, typically after the server deleted it.
    pub fn evict(&self, typename: &str, id: &str) -> bool {
        self.cache().evict(&EntityKey::new(typename, id))
    }

    pub fn reset_cache(&self) {
        self.cache().reset();
    }

    async fn send<O: Operation>(
        &self,
        variables: Value,
        scope: Option<String>,
    ) -> Result<Value, ClientError> {
        tracing::debug!("Dispatching {} (scope {:?})", O::NAME, scope);
        self.transport
            .execute(GraphQlRequest {
                operation_name: O::NAME,
                query: O::DOCUMENT,
                variables,
                scope,
            })
            .await
    }

    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode<O: Operation>(data: &Value) -> Result<O::Output, ClientError> {
    let root = data.get(O::ROOT).ok_or(ClientError::MissingField(O::ROOT))?;
    Ok(serde_json::from_value(root.clone())?)
}
