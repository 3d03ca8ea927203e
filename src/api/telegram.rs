use crate::models::{File, Message, SendMessageRequest, TelegramResponse, Update};
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;

const DEFAULT_API_ROOT: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
    file_base_url: String,
}

impl TelegramApi {
    pub fn new(token: String) -> Self {
        Self::new_with_base_url(format!("{}/bot{}", DEFAULT_API_ROOT, token))
    }

    /// `base_url` must end in `/bot<token>`; downloads go to the matching `/file/bot<token>`.
    pub fn new_with_base_url(base_url: String) -> Self {
        let file_base_url = match base_url.rsplit_once("/bot") {
            Some((root, token)) => format!("{}/file/bot{}", root, token),
            None => format!("{}/file", base_url),
        };
        Self {
            client: reqwest::Client::new(),
            base_url,
            file_base_url,
        }
    }

    fn unwrap_envelope<T>(resp: TelegramResponse<T>, method: &str) -> Result<T> {
        if !resp.ok {
            let error_msg = resp
                .description
                .unwrap_or_else(|| format!("{} failed", method));
            return Err(anyhow!("Telegram API error: {}", error_msg));
        }

        resp.result
            .ok_or_else(|| anyhow!("Telegram API error: missing result in response"))
    }

    async fn post_json<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let resp: TelegramResponse<T> = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        Self::unwrap_envelope(resp, method)
    }

    pub async fn send_message(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<i64> {
        let body = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            reply_to_message_id: reply_to,
            parse_mode: Some("HTML".to_string()),
        };

        let message: Message = self.post_json("sendMessage", &body).await?;
        Ok(message.message_id)
    }

    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": action,
        });

        let _: bool = self.post_json("sendChatAction", &body).await?;
        Ok(())
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        let body = serde_json::json!({ "file_id": file_id });
        self.post_json("getFile", &body).await
    }

    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.file_base_url, file_path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to request file download")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("File download failed with HTTP {}", status));
        }

        let bytes = resp
            .bytes()
            .await
            .context("Failed to read downloaded file body")?;
        Ok(bytes.to_vec())
    }

    pub async fn get_updates(&self, offset: Option<i64>, timeout: i32) -> Result<Vec<Update>> {
        let url = format!("{}/getUpdates", self.base_url);
        let mut params = vec![("timeout", timeout.to_string())];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        let resp: TelegramResponse<Vec<Update>> = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            let error_msg = resp
                .description
                .unwrap_or_else(|| "getUpdates failed".to_string());
            return Err(anyhow!("Telegram API error: {}", error_msg));
        }

        Ok(resp.result.unwrap_or_default())
    }

    pub async fn set_webhook(&self, webhook_url: &str, secret_token: Option<&str>) -> Result<()> {
        let mut body = serde_json::json!({ "url": webhook_url });
        if let Some(secret) = secret_token {
            body["secret_token"] = serde_json::Value::String(secret.to_string());
        }

        let _: bool = self.post_json("setWebhook", &body).await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self
            .post_json("deleteWebhook", &serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn get_webhook_info(&self) -> Result<serde_json::Value> {
        let url = format!("{}/getWebhookInfo", self.base_url);
        let resp: TelegramResponse<serde_json::Value> =
            self.client.get(&url).send().await?.json().await?;

        Self::unwrap_envelope(resp, "getWebhookInfo")
    }
}
