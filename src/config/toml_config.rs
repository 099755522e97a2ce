use crate::core::wizard::WizardShell;
use crate::domain::model::{Account, Contract, ProfileInfo, RouterRule, UserType};
use crate::utils::error::{ProvisionError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// 開戶請求檔：API 設定 + 表單內容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionFile {
    pub api: ApiConfig,
    #[serde(default)]
    pub run: RunConfig,
    pub profile: Option<ProfileInfo>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub routers: Vec<RouterRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// 回應 code 等於此值才算成功
    #[serde(default = "default_ok_code")]
    pub ok_code: i64,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default = "default_auto_close_seconds")]
    pub auto_close_seconds: u64,
    /// 無人值守時自動批次重試的輪數
    #[serde(default)]
    pub retry_rounds: u32,
    pub report_path: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            user_type: UserType::default(),
            auto_close_seconds: default_auto_close_seconds(),
            retry_rounds: 0,
            report_path: None,
        }
    }
}

impl RunConfig {
    pub fn auto_close(&self) -> Duration {
        Duration::from_secs(self.auto_close_seconds)
    }
}

fn default_ok_code() -> i64 {
    200
}

fn default_auto_close_seconds() -> u64 {
    6
}

impl ProvisionFile {
    /// 從 TOML 檔案載入
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProvisionError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ProvisionError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ADMIN_TOKEN})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProvisionError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 依步驟把檔案內容填進精靈，每一步都經過放行檢查，最後停在預覽頁
    pub fn to_wizard(&self) -> Result<WizardShell> {
        let mut wizard = WizardShell::new(self.run.user_type);

        if let Some(profile) = &self.profile {
            wizard.set_profile(profile.clone())?;
        }
        wizard.next()?;

        // 與預設幣種相同的條目併入推導出的預設帳戶，保留其 active 設定
        let mut accounts = wizard.form().accounts.clone();
        for account in &self.accounts {
            match accounts
                .iter_mut()
                .find(|existing| existing.is_default && existing.ccy == account.ccy)
            {
                Some(derived) => derived.active = account.active,
                None => accounts.push(account.clone()),
            }
        }
        wizard.set_accounts(accounts)?;
        wizard.next()?;

        wizard.set_contracts(self.contracts.clone())?;
        wizard.next()?;

        wizard.set_routers(self.routers.clone())?;
        wizard.next()?;

        Ok(wizard)
    }
}

impl Validate for ProvisionFile {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_required_field("profile", &self.profile)?;

        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_positive_number("api.timeout_seconds", timeout, 1)?;
        }

        validation::validate_range("run.auto_close_seconds", self.run.auto_close_seconds, 0, 3600)?;
        validation::validate_range("run.retry_rounds", self.run.retry_rounds, 0, 10)?;

        if let Some(report_path) = &self.run.report_path {
            validation::validate_path("run.report_path", report_path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wizard::WizardStep;
    use crate::domain::model::TrxType;

    const SAMPLE: &str = r#"
[api]
base_url = "https://admin.example.com/api"
timeout_seconds = 10

[api.headers]
authorization = "Bearer ${MERCHANT_WIZARD_TEST_TOKEN}"

[run]
user_type = "cashier_team"
retry_rounds = 2

[profile]
name = "Acme"
email = "ops@acme.test"
phone = "9876543210"
default_ccy = "INR"

[[accounts]]
ccy = "INR"

[[accounts]]
ccy = "USD"
active = false

[[contracts]]
contract_id = "C-1"
start_at = "2026-01-01T00:00:00Z"
expired_at = "2027-01-01T00:00:00Z"

[contracts.payin]
enabled = true
methods = ["upi"]

[[routers]]
trx_type = "in"
trx_method = "upi"
ccy = "INR"
max_amount = 500
channel_code = "paytm"
priority = 1
"#;

    #[test]
    fn test_parse_and_fill_wizard() {
        std::env::set_var("MERCHANT_WIZARD_TEST_TOKEN", "secret");
        let file = ProvisionFile::from_toml_str(SAMPLE).unwrap();
        file.validate().unwrap();

        assert_eq!(file.api.ok_code, 200);
        assert_eq!(
            file.api.headers.as_ref().unwrap()["authorization"],
            "Bearer secret"
        );
        assert_eq!(file.run.user_type, UserType::CashierTeam);
        assert_eq!(file.run.auto_close_seconds, 6);
        assert_eq!(file.routers[0].trx_type, TrxType::In);
        assert_eq!(
            file.contracts[0].payin.as_ref().unwrap()["methods"][0],
            "upi"
        );

        let wizard = file.to_wizard().unwrap();
        assert_eq!(wizard.current_step(), WizardStep::Preview);
        let form = wizard.submit().unwrap();
        assert_eq!(form.accounts.len(), 2);
        assert!(form.accounts[0].is_default);
        assert!(!form.accounts[1].active);
    }

    #[test]
    fn test_default_currency_entry_keeps_its_active_flag() {
        let content = SAMPLE.replacen(
            "[[accounts]]\nccy = \"INR\"\n",
            "[[accounts]]\nccy = \"INR\"\nactive = false\n",
            1,
        );
        let file = ProvisionFile::from_toml_str(&content).unwrap();
        let wizard = file.to_wizard().unwrap();
        let accounts = &wizard.form().accounts;

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].ccy, "INR");
        assert!(accounts[0].is_default);
        assert!(!accounts[0].active);
    }

    #[test]
    fn test_missing_routers_blocks_wizard() {
        let content = SAMPLE.split("[[routers]]").next().unwrap();
        let file = ProvisionFile::from_toml_str(content).unwrap();
        let err = file.to_wizard().unwrap_err();
        assert!(matches!(err, ProvisionError::StepNavigationError { .. }));
    }

    #[test]
    fn test_missing_profile_section_rejected() {
        let file = ProvisionFile::from_toml_str("[api]\nbase_url = \"https://admin.example.com\"\n").unwrap();
        let err = file.validate().unwrap_err();
        assert!(matches!(err, ProvisionError::MissingConfigError { ref field } if field == "profile"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let content = SAMPLE.replace("https://admin.example.com/api", "ftp://admin.example.com");
        let file = ProvisionFile::from_toml_str(&content).unwrap();
        assert!(file.validate().is_err());
    }

    #[test]
    fn test_unknown_env_var_kept() {
        let content = SAMPLE.replace("MERCHANT_WIZARD_TEST_TOKEN", "MERCHANT_WIZARD_UNSET_VAR");
        let file = ProvisionFile::from_toml_str(&content).unwrap();
        assert_eq!(
            file.api.headers.as_ref().unwrap()["authorization"],
            "Bearer ${MERCHANT_WIZARD_UNSET_VAR}"
        );
    }
}
