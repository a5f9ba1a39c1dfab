//! Table API gateway
//!
//! `GET`/`PATCH {instance}/api/now/table/{table}/{sys_id}` with
//! `sysparm_exclude_reference_link=true`. Field values are flattened to
//! strings before they reach the bridge.

use crate::config::{Credentials, InstanceConfig};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use snowsync_artifact::RecordData;
use snowsync_bridge::{GatewayError, RecordGateway};
use tracing::{debug, warn};

const MAX_ERROR_BODY: usize = 500;

/// [`RecordGateway`] over the ServiceNow Table API
#[derive(Debug, Clone)]
pub struct ServiceNowGateway {
    client: reqwest::Client,
    config: InstanceConfig,
}

impl ServiceNowGateway {
    /// Create gateway with its own HTTP client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: InstanceConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Instance base URL
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// URL of one record
    ///
    /// # Errors
    /// Returns error if the configured base URL is not a valid URL.
    pub fn record_url(&self, table: &str, sys_id: &str) -> Result<Url, GatewayError> {
        record_url(&self.config.base_url, table, sys_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, HeaderValue::from_static("application/json"));
        match &self.config.credentials {
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }
}

#[async_trait]
impl RecordGateway for ServiceNowGateway {
    async fn fetch(&self, table: &str, sys_id: &str) -> Result<Option<RecordData>, GatewayError> {
        let url = self.record_url(table, sys_id)?;
        debug!(%url, "fetching record");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| GatewayError::transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        parse_record(&body).map(Some)
    }

    async fn update(
        &self,
        table: &str,
        sys_id: &str,
        fields: &RecordData,
    ) -> Result<bool, GatewayError> {
        let url = self.record_url(table, sys_id)?;
        debug!(%url, fields = fields.len(), "updating record");

        let response = self
            .authorize(self.client.patch(url))
            .json(fields)
            .send()
            .await
            .map_err(|e| GatewayError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if is_auth_failure(status) {
            return Err(status_error(status, response).await);
        }

        let body = truncated_body(response).await;
        warn!(table, sys_id, status = status.as_u16(), %body, "update refused");
        Ok(false)
    }
}

/// Build a record URL under `base`
///
/// # Errors
/// Returns error if `base` is not a valid absolute URL.
pub fn record_url(base: &str, table: &str, sys_id: &str) -> Result<Url, GatewayError> {
    let mut url =
        Url::parse(base).map_err(|e| GatewayError::transport(format!("invalid instance url: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| GatewayError::transport("instance url cannot carry a path"))?
        .pop_if_empty()
        .extend(["api", "now", "table", table, sys_id]);
    url.query_pairs_mut()
        .append_pair("sysparm_exclude_reference_link", "true");
    Ok(url)
}

/// Flatten the `result` object of a Table API response
///
/// # Errors
/// Returns error if the body has no `result` object.
pub fn parse_record(body: &Value) -> Result<RecordData, GatewayError> {
    let result = body
        .get("result")
        .and_then(Value::as_object)
        .ok_or_else(|| GatewayError::InvalidResponse("missing 'result' object".into()))?;
    Ok(result
        .iter()
        .map(|(field, value)| (field.clone(), field_value(value)))
        .collect())
}

/// String form of one field value
///
/// `null` becomes empty; reference objects collapse to their `value`.
#[must_use]
pub fn field_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map
            .get("value")
            .map_or_else(|| value.to_string(), field_value),
        Value::Array(_) => value.to_string(),
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

async fn status_error(status: StatusCode, response: Response) -> GatewayError {
    let body = truncated_body(response).await;
    if is_auth_failure(status) {
        GatewayError::Auth(format!("{status}: {body}"))
    } else {
        GatewayError::Status {
            code: status.as_u16(),
            body,
        }
    }
}

async fn truncated_body(response: Response) -> String {
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn builds_record_url() {
        let url = record_url("https://dev1.service-now.com", "sp_widget", "abc123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev1.service-now.com/api/now/table/sp_widget/abc123?sysparm_exclude_reference_link=true"
        );
    }

    #[test]
    fn url_segments_are_escaped() {
        let url = record_url("https://dev1.service-now.com", "sp_widget", "a/b").unwrap();
        assert!(url.path().ends_with("/sp_widget/a%2Fb"));
    }

    #[test]
    fn invalid_base_is_an_error() {
        assert!(record_url("not a url", "t", "1").is_err());
    }

    #[test]
    fn flattens_result_values() {
        let body = json!({
            "result": {
                "sys_id": "abc",
                "name": "Widget",
                "active": true,
                "order": 100,
                "description": null,
                "sys_scope": { "link": "https://x/api/now/table/sys_scope/1", "value": "global" }
            }
        });
        let record = parse_record(&body).unwrap();

        let mut expected = RecordData::new();
        expected.insert("sys_id".into(), "abc".into());
        expected.insert("name".into(), "Widget".into());
        expected.insert("active".into(), "true".into());
        expected.insert("order".into(), "100".into());
        expected.insert("description".into(), String::new());
        expected.insert("sys_scope".into(), "global".into());
        assert_eq!(record, expected);
    }

    #[test]
    fn missing_result_is_invalid() {
        assert!(matches!(
            parse_record(&json!({"error": {"message": "nope"}})),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn gateway_uses_configured_base() {
        let config = InstanceConfig::new("dev1", Credentials::Bearer("t".into()));
        let gateway = ServiceNowGateway::new(config).unwrap();
        assert_eq!(gateway.base_url(), "https://dev1.service-now.com");
        assert!(gateway
            .record_url("sys_script", "1")
            .unwrap()
            .as_str()
            .contains("/api/now/table/sys_script/1"));
    }
}
