use super::error::BackendError;
use super::types::{LLMRequest, LLMResponse};
use async_trait::async_trait;

#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError>;

    fn name(&self) -> &str;

    fn model_info(&self) -> Option<String> {
        None
    }

    /// Single-shot text completion: one system prompt, one user prompt, one answer.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, BackendError> {
        let request =
            LLMRequest::completion(system_prompt, user_prompt).with_temperature(temperature);
        let response = self.chat(request).await?;

        if response.content.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(response.content)
    }
}
