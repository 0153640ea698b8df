// ABOUTME: Dataverse guides API integration for listing and creating guide records
// ABOUTME: Issues bearer-authenticated requests against the guides entity set
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Resource client for the downstream guides entity set.
//!
//! Both operations are single unconditional requests: no pagination, no
//! retry, no timeout. Transport failures propagate to the caller.

use crate::config::GuidesApiConfig;
use anyhow::Result;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

/// Fixed query string for the guides entity set
const GUIDES_QUERY: &str = "/msmrw_guides?$select=msmrw_name&$expand=msmrw_guide_Annotations";

/// Name used for guides created through the portal
pub const DEFAULT_GUIDE_NAME: &str = "REST Guide 22";

/// Client for the guides entity set
pub struct GuidesClient {
    client: Client,
    base_url: String,
}

impl GuidesClient {
    /// Create a client over the configured API base URL, reusing the shared
    /// HTTP connection pool
    #[must_use]
    pub fn new(config: &GuidesApiConfig) -> Self {
        Self {
            client: crate::utils::http_client::shared_client().clone(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn guides_url(&self) -> String {
        format!("{}{GUIDES_QUERY}", self.base_url)
    }

    /// List guides with their annotations.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response body is not
    /// JSON.
    pub async fn list_guides(&self, access_token: &str) -> Result<Value> {
        debug!("listing guides");
        let data = self
            .client
            .get(self.guides_url())
            .bearer_auth(access_token)
            .send()
            .await?
            .json::<Value>()
            .await?;
        Ok(data)
    }

    /// Create a guide record with one annotation placeholder.
    ///
    /// Returns `"Post complete"` concatenated with the raw response body.
    /// The HTTP status code is not consulted; a rejected create still
    /// reports completion with whatever body the API returned.
    ///
    /// # Errors
    ///
    /// Returns an error only on a transport-level failure.
    pub async fn create_guide(&self, access_token: &str, name: &str) -> Result<String> {
        debug!(guide = %name, "creating guide");
        let response = self
            .client
            .post(self.guides_url())
            .bearer_auth(access_token)
            .json(&guide_payload(name))
            .send()
            .await?;

        let text = response.text().await?;
        Ok(format!("Post complete{text}"))
    }
}

/// Fixed create payload: schema version 3 plus one annotation placeholder
#[must_use]
pub fn guide_payload(name: &str) -> Value {
    json!({
        "msmrw_schemaversion": 3,
        "msmrw_name": name,
        "msmrw_guide_Annotations": [
            {
                "mimetype": "application/octet-stream",
                "isdocument": true,
                "filename": "Name it whatever.json"
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guides_url_is_fixed_select_expand_query() {
        let client = GuidesClient::new(&GuidesApiConfig {
            base_url: "https://org.api.crm.dynamics.com/api/data/v9.1/".into(),
        });
        assert_eq!(
            client.guides_url(),
            "https://org.api.crm.dynamics.com/api/data/v9.1/msmrw_guides?$select=msmrw_name&$expand=msmrw_guide_Annotations"
        );
    }

    #[test]
    fn payload_matches_guide_record_shape() {
        let payload = guide_payload("REST Guide 22");
        assert_eq!(payload["msmrw_schemaversion"], 3);
        assert_eq!(payload["msmrw_name"], "REST Guide 22");
        let annotations = payload["msmrw_guide_Annotations"].as_array().unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0]["mimetype"], "application/octet-stream");
        assert_eq!(annotations[0]["isdocument"], true);
        assert_eq!(annotations[0]["filename"], "Name it whatever.json");
    }
}
