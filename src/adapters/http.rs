use crate::config::toml_config::ApiConfig;
use crate::domain::api::{
    CreateAccountRequest, CreateContractRequest, CreateRouterRequest, OperatorProfile,
    RegisterUserRequest, UserListQuery, UserPage,
};
use crate::domain::ports::ProvisioningApi;
use crate::utils::error::{ProvisionError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

/// 後台統一回應格式 `{ code, msg, data }`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default, alias = "message")]
    msg: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

/// 以 reqwest 實作的後台 API
pub struct HttpProvisioningApi {
    config: ApiConfig,
    client: Client,
}

impl HttpProvisioningApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn prepare(&self, mut request: RequestBuilder) -> RequestBuilder {
        // 添加自定義標頭
        if let Some(headers) = &self.config.headers {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        if let Some(timeout) = self.config.timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        request
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<serde_json::Value> {
        let url = self.endpoint(path);
        tracing::debug!("📡 POST {}", url);
        let request = self.prepare(self.client.post(&url).json(body));
        self.send(request).await
    }

    async fn get(&self, path: &str) -> Result<serde_json::Value> {
        let url = self.endpoint(path);
        tracing::debug!("📡 GET {}", url);
        let request = self.prepare(self.client.get(&url));
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<serde_json::Value> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|envelope| envelope.msg)
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(ProvisionError::BackendError {
                code: i64::from(status.as_u16()),
                message,
            });
        }

        let envelope: Envelope = response.json().await?;
        self.unwrap_envelope(envelope)
    }

    fn unwrap_envelope(&self, envelope: Envelope) -> Result<serde_json::Value> {
        match envelope.code {
            Some(code) if code == self.config.ok_code => Ok(envelope.data),
            Some(code) => Err(ProvisionError::BackendError {
                code,
                message: envelope.msg.unwrap_or_default(),
            }),
            None => Err(ProvisionError::ResponseFormatError {
                message: "response has no code field".to_string(),
            }),
        }
    }
}

/// 註冊回應裡的使用者 id 可能是字串、數字或包在物件裡
fn extract_user_id(data: &serde_json::Value) -> Option<String> {
    match data {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Object(obj) => ["user_id", "id", "uid"]
            .iter()
            .find_map(|key| obj.get(*key))
            .and_then(extract_user_id),
        _ => None,
    }
}

#[async_trait]
impl ProvisioningApi for HttpProvisioningApi {
    async fn register_user(&self, request: &RegisterUserRequest) -> Result<String> {
        let data = self.post("/user/register", request).await?;
        extract_user_id(&data).ok_or_else(|| ProvisionError::ResponseFormatError {
            message: format!("register response has no user id: {}", data),
        })
    }

    async fn list_users(&self, query: &UserListQuery) -> Result<UserPage> {
        let data = self.post("/user/list", query).await?;
        if data.is_null() {
            return Ok(UserPage::default());
        }
        Ok(serde_json::from_value(data)?)
    }

    async fn create_account(&self, request: &CreateAccountRequest) -> Result<()> {
        self.post("/user/account/create", request).await?;
        Ok(())
    }

    async fn create_contract(&self, request: &CreateContractRequest) -> Result<()> {
        self.post("/user/contract/create", request).await?;
        Ok(())
    }

    async fn create_router(&self, request: &CreateRouterRequest) -> Result<()> {
        self.post("/user/router/create", request).await?;
        Ok(())
    }

    async fn current_operator(&self) -> Result<OperatorProfile> {
        let data = self.get("/info").await?;
        Ok(serde_json::from_value(data)?)
    }
}
