use std::sync::Arc;

use crate::services::{DramaFinder, ReplyFormatter};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub finder: Arc<dyn DramaFinder>,
    pub formatter: ReplyFormatter,
    /// Expected value of the `x-bot-token` header
    pub bot_token: Arc<str>,
}

impl AppState {
    pub fn new(
        finder: Arc<dyn DramaFinder>,
        formatter: ReplyFormatter,
        bot_token: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            finder,
            formatter,
            bot_token: bot_token.into(),
        }
    }
}
