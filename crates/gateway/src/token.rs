//! Bearer-token storage shared by every authorized request.

use std::sync::{Arc, Mutex};

use crate::remote::GatewayError;

/// Access/refresh token pair issued by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Durable storage for the persisted token pair.
///
/// Read on every authorized request and rewritten after verify/refresh;
/// cleared on logout. Integrations supply their own durable backend; the
/// in-memory implementation below covers tests and prototyping.
pub trait TokenStore: Send + Sync {
    /// Fetch the stored pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Store` if the backing store is unavailable.
    fn get(&self) -> Result<Option<TokenPair>, GatewayError>;

    /// Replace the stored pair.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Store` if the backing store is unavailable.
    fn set(&self, pair: TokenPair) -> Result<(), GatewayError>;

    /// Drop the stored pair.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Store` if the backing store is unavailable.
    fn clear(&self) -> Result<(), GatewayError>;
}

/// Simple in-memory token store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    pair: Arc<Mutex<Option<TokenPair>>>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            pair: Arc::new(Mutex::new(Some(pair))),
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get(&self) -> Result<Option<TokenPair>, GatewayError> {
        let guard = self
            .pair
            .lock()
            .map_err(|e| GatewayError::Store(e.to_string()))?;
        Ok(guard.clone())
    }

    fn set(&self, pair: TokenPair) -> Result<(), GatewayError> {
        let mut guard = self
            .pair
            .lock()
            .map_err(|e| GatewayError::Store(e.to_string()))?;
        *guard = Some(pair);
        Ok(())
    }

    fn clear(&self) -> Result<(), GatewayError> {
        let mut guard = self
            .pair
            .lock()
            .map_err(|e| GatewayError::Store(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}
