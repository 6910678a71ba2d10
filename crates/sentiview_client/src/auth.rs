use std::sync::{Arc, RwLock};

use sentiview_logging::sv_info;

/// Called with the new token (or `None` once cleared) so callers can persist it.
pub type TokenHook = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Client-side home of the auth token, shared by every request.
#[derive(Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
    on_change: Option<TokenHook>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token.into()))),
            on_change: None,
        }
    }

    pub fn on_change(mut self, hook: TokenHook) -> Self {
        self.on_change = Some(hook);
        self
    }

    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        if let Some(hook) = &self.on_change {
            hook(Some(&token));
        }
    }

    /// Returns true when a token was actually removed.
    pub fn clear(&self) -> bool {
        let removed = self
            .token
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some();
        if removed {
            sv_info!("Auth token cleared");
            if let Some(hook) = &self.on_change {
                hook(None);
            }
        }
        removed
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("present", &self.get().is_some())
            .finish()
    }
}
