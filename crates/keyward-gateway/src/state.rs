//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use keyward_auth::JwtValidator;
use keyward_issuer::{ClientAuthenticator, KeyRing, TokenIssuer};
use keyward_store::ClientStore;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// This struct holds references to all services needed by the HTTP handlers.
pub struct GatewayState<S>
where
    S: ClientStore,
{
    /// Client-credentials grant.
    pub authenticator: Arc<ClientAuthenticator<S>>,
    /// Verifier for end-user tokens from the identity provider.
    pub user_validator: Arc<dyn JwtValidator>,
    /// Verifier for service tokens.
    pub service_validator: Arc<dyn JwtValidator>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<S> GatewayState<S>
where
    S: ClientStore,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        authenticator: Arc<ClientAuthenticator<S>>,
        user_validator: Arc<dyn JwtValidator>,
        service_validator: Arc<dyn JwtValidator>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            authenticator,
            user_validator,
            service_validator,
            config,
        }
    }

    /// The token issuer behind the authenticator.
    #[must_use]
    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        self.authenticator.issuer()
    }

    /// The issuer's key ring.
    #[must_use]
    pub fn key_ring(&self) -> &Arc<KeyRing> {
        self.issuer().key_ring()
    }
}

impl<S> Clone for GatewayState<S>
where
    S: ClientStore,
{
    fn clone(&self) -> Self {
        Self {
            authenticator: Arc::clone(&self.authenticator),
            user_validator: Arc::clone(&self.user_validator),
            service_validator: Arc::clone(&self.service_validator),
            config: self.config.clone(),
        }
    }
}
