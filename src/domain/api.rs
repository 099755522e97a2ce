//! 後台 API 的請求 / 回應結構

use crate::domain::model::{Account, Contract, EntityStatus, ProfileInfo, RouterRule, UserType};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterUserRequest {
    pub user_type: UserType,
    pub email: String,
    pub password: String,
    pub nickname: String,
    #[serde(rename = "type")]
    pub category: String,
    pub company_name: String,
    pub phone: String,
    pub phone_country_code: String,
    pub region: String,
    pub default_ccy: String,
    pub verify_code: String,
}

impl RegisterUserRequest {
    pub fn from_profile(user_type: UserType, profile: &ProfileInfo) -> Self {
        let name = profile.name.trim().to_string();
        Self {
            user_type,
            email: profile.email.trim().to_string(),
            password: profile.password.clone().unwrap_or_default(),
            company_name: profile
                .company_name
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| name.clone()),
            nickname: name,
            category: profile.category.clone(),
            phone: profile.phone.trim().to_string(),
            phone_country_code: profile.phone_country_code.clone(),
            region: profile.region.clone().unwrap_or_default(),
            default_ccy: profile.default_ccy.clone(),
            verify_code: profile.verify_code.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserListQuery {
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl UserListQuery {
    pub fn new(user_type: UserType) -> Self {
        Self {
            user_type,
            page: 1,
            size: 10,
            ..Default::default()
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserRecord {
    #[serde(alias = "user_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "nickname")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl UserRecord {
    /// 下拉選單上顯示的文字
    pub fn display_label(&self) -> String {
        match (self.name.is_empty(), self.email.is_empty()) {
            (false, false) => format!("{} ({})", self.name, self.email),
            (false, true) => self.name.clone(),
            (true, false) => self.email.clone(),
            (true, true) => self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub list: Vec<UserRecord>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateAccountRequest {
    pub user_id: String,
    pub user_type: UserType,
    pub ccy: String,
}

impl CreateAccountRequest {
    pub fn new(user_id: &str, user_type: UserType, account: &Account) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_type,
            ccy: account.ccy.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateContractRequest {
    pub user_id: String,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
    /// epoch 毫秒
    pub start_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<i64>,
    pub status: EntityStatus,
    pub payin: serde_json::Value,
    pub payout: serde_json::Value,
}

impl CreateContractRequest {
    pub fn new(user_id: &str, user_type: UserType, contract: &Contract) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_type,
            contract_id: contract
                .contract_id
                .clone()
                .filter(|id| !id.trim().is_empty()),
            start_at: contract.start_at.timestamp_millis(),
            expired_at: contract.expired_at.map(|at| at.timestamp_millis()),
            status: EntityStatus::from_active(contract.active),
            payin: contract.payin.clone().unwrap_or(serde_json::Value::Null),
            payout: contract.payout.clone().unwrap_or(serde_json::Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRouterRequest {
    pub user_id: String,
    pub user_type: UserType,
    pub trx_type: String,
    pub trx_method: String,
    pub ccy: String,
    pub country: String,
    pub min_amount: u64,
    pub max_amount: u64,
    pub channel_code: String,
    pub priority: u32,
    pub status: EntityStatus,
}

impl CreateRouterRequest {
    pub fn new(user_id: &str, user_type: UserType, rule: &RouterRule) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_type,
            trx_type: rule.trx_type.as_str().to_string(),
            trx_method: rule.trx_method.clone(),
            ccy: rule.ccy.clone(),
            country: rule.country_code().unwrap_or_default().to_string(),
            min_amount: rule.min_amount,
            max_amount: rule.max_amount,
            channel_code: rule.channel_code.clone(),
            priority: rule.priority,
            status: rule.status,
        }
    }
}

/// `GET /info` 回傳的目前操作員
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperatorProfile {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "username", alias = "nickname")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
