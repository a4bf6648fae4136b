//! Application state shared across handlers

use std::sync::Arc;

use crate::{jwt::TokenIssuer, modules::UserModule};

#[derive(Clone)]
pub struct AppState {
    pub user_module: UserModule,
    pub token_issuer: Arc<dyn TokenIssuer>,
}
