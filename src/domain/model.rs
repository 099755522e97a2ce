use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 開戶對象類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Merchant,
    CashierTeam,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Merchant => "merchant",
            UserType::CashierTeam => "cashier_team",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserType::Merchant => "商户",
            UserType::CashierTeam => "收银团队",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    #[default]
    Active,
    Inactive,
}

impl EntityStatus {
    pub fn from_active(active: bool) -> Self {
        if active {
            EntityStatus::Active
        } else {
            EntityStatus::Inactive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Inactive => "inactive",
        }
    }
}

/// 交易方向：代收 / 代付
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrxType {
    In,
    Out,
}

impl TrxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrxType::In => "in",
            TrxType::Out => "out",
        }
    }
}

impl fmt::Display for TrxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub phone_country_code: String,
    pub category: String,
    pub active: bool,
    pub default_ccy: String,
    pub region: Option<String>,
    pub company_name: Option<String>,
    pub password: Option<String>,
    pub verify_code: Option<String>,
}

impl Default for ProfileInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            phone_country_code: "+91".to_string(),
            category: "company".to_string(),
            active: true,
            default_ccy: String::new(),
            region: None,
            company_name: None,
            password: None,
            verify_code: None,
        }
    }
}

impl ProfileInfo {
    /// 第一步的放行條件
    pub fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty() && !self.phone.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub ccy: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub is_default: bool,
}

impl Account {
    pub fn new(ccy: impl Into<String>) -> Self {
        Self {
            ccy: ccy.into(),
            active: true,
            is_default: false,
        }
    }

    pub fn default_for(ccy: impl Into<String>) -> Self {
        Self {
            ccy: ccy.into(),
            active: true,
            is_default: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(default)]
    pub contract_id: Option<String>,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub expired_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// 代收權限，後台自行解讀
    #[serde(default)]
    pub payin: Option<serde_json::Value>,
    #[serde(default)]
    pub payout: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterRule {
    pub trx_type: TrxType,
    pub trx_method: String,
    pub ccy: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub min_amount: u64,
    /// 0 表示無上限
    #[serde(default)]
    pub max_amount: u64,
    pub channel_code: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub status: EntityStatus,
}

/// 路由唯一鍵 (trx_type, trx_method, ccy, country, channel_code)
pub type RouteKey<'a> = (TrxType, &'a str, &'a str, Option<&'a str>, &'a str);

impl RouterRule {
    pub fn country_code(&self) -> Option<&str> {
        self.country.as_deref().filter(|c| !c.trim().is_empty())
    }

    pub fn route_key(&self) -> RouteKey<'_> {
        (
            self.trx_type,
            self.trx_method.as_str(),
            self.ccy.as_str(),
            self.country_code(),
            self.channel_code.as_str(),
        )
    }
}

/// 精靈表單的唯一資料來源
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormAggregate {
    #[serde(default)]
    pub profile: ProfileInfo,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub routers: Vec<RouterRule>,
}

impl FormAggregate {
    pub fn is_pristine(&self) -> bool {
        *self == FormAggregate::default()
    }
}

/// 建立流程中的資源分組，宣告順序即執行順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    User,
    Account,
    Contract,
    Router,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Account => "account",
            ResourceKind::Contract => "contract",
            ResourceKind::Router => "router",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl ItemStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ItemStatus::Success | ItemStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Running => "running",
            ItemStatus::Success => "success",
            ItemStatus::Error => "error",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 重試時要重送的原始表單資料
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSource {
    User(ProfileInfo),
    Account(Account),
    Contract(Contract),
    Router(RouterRule),
}

impl ItemSource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ItemSource::User(_) => ResourceKind::User,
            ItemSource::Account(_) => ResourceKind::Account,
            ItemSource::Contract(_) => ResourceKind::Contract,
            ItemSource::Router(_) => ResourceKind::Router,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionItem {
    pub id: String,
    pub kind: ResourceKind,
    pub label: String,
    pub status: ItemStatus,
    pub error: Option<String>,
    pub source: ItemSource,
}

fn default_true() -> bool {
    true
}
