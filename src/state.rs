// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::blockchain::RelayerAccount;
use crate::error::ApiError;

#[derive(Clone, Default)]
pub struct AppState {
    relayer: Option<Arc<RelayerAccount>>,
}

impl AppState {
    pub fn new(relayer: RelayerAccount) -> Self {
        Self {
            relayer: Some(Arc::new(relayer)),
        }
    }

    /// The relayer account, or 503 when the service runs without a key.
    pub fn relayer(&self) -> Result<&RelayerAccount, ApiError> {
        self.relayer
            .as_deref()
            .ok_or_else(|| ApiError::service_unavailable("Relayer key not configured"))
    }
}
