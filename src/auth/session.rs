//! Session provider
//!
//! Holds the signed-in user for client-side consumers. Created explicitly
//! and handed to whoever needs it; changes are pushed to subscribers.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::verifier::SessionVerifier;
use crate::database::models::Profile;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub profile: Profile,
    /// Bearer token for gateway calls; empty for simulated users.
    pub access_token: String,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.profile.id
    }
}

#[derive(Clone)]
pub struct SessionProvider {
    verifier: Arc<dyn SessionVerifier>,
    state: Arc<watch::Sender<Option<CurrentUser>>>,
}

impl SessionProvider {
    pub fn new(verifier: Arc<dyn SessionVerifier>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            verifier,
            state: Arc::new(state),
        }
    }

    /// Startup: restore a stored token if there is one. An invalid stored
    /// token leaves the provider signed out rather than failing.
    pub async fn initialize(&self, stored_token: Option<&str>) -> Option<CurrentUser> {
        let token = stored_token?;
        match self.refresh(token).await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Stored session could not be restored: {}", e);
                None
            }
        }
    }

    /// Token changed (sign-in or renewal). On failure the provider is
    /// signed out.
    pub async fn refresh(&self, token: &str) -> Result<CurrentUser> {
        match self.verifier.verify(token).await {
            Ok(profile) => {
                let user = CurrentUser {
                    profile,
                    access_token: token.to_string(),
                };
                info!("Signed in as {} ({})", user.profile.email, user.profile.role.as_str());
                self.state.send_replace(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.state.send_replace(None);
                Err(e)
            }
        }
    }

    /// Sign in without a backend, for demonstrations. Pair with the
    /// simulation sentinel id so vote submission never touches the network.
    pub fn sign_in_simulated(&self, profile: Profile) -> CurrentUser {
        let user = CurrentUser {
            profile,
            access_token: String::new(),
        };
        self.state.send_replace(Some(user.clone()));
        user
    }

    pub fn sign_out(&self) {
        if self.state.send_replace(None).is_some() {
            info!("Signed out");
        }
    }

    pub fn current(&self) -> Option<CurrentUser> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.state.subscribe()
    }
}
