use std::time::Duration;

use ai_ox_common::{parse_error_response, snippet};
use reqwest::header::CONTENT_TYPE;

use crate::{
    ChatRequest, DashScopeRequestError,
    response::ChatResponse,
    stream::reassemble_response,
};

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// One configured endpoint + credential; performs single attempts
pub(crate) struct DashScopeRequestHelper {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl DashScopeRequestHelper {
    pub(crate) fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: format!("{}/{CHAT_COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            timeout,
        }
    }

    /// POST the request once and read the answer text
    pub(crate) async fn send_chat_request(
        &self,
        request: &ChatRequest,
    ) -> Result<String, DashScopeRequestError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let bytes = response.bytes().await?;
            return Err(parse_error_response(status, &bytes).into());
        }

        if request.is_streaming() {
            return reassemble_response(response).await;
        }

        let bytes = response.bytes().await?;
        let body: ChatResponse = serde_json::from_slice(&bytes).map_err(|e| {
            DashScopeRequestError::MalformedResponse(format!(
                "{e}; body: {}",
                snippet(&String::from_utf8_lossy(&bytes), 200)
            ))
        })?;

        body.text().ok_or_else(|| {
            DashScopeRequestError::MalformedResponse(format!(
                "no choices in response: {}",
                snippet(&String::from_utf8_lossy(&bytes), 200)
            ))
        })
    }
}
