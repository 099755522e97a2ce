//! 表單條目的檢查規則，送出前攔下，不會送到後台

use crate::domain::model::{Account, Contract, ProfileInfo, RouterRule};
use crate::domain::options::{
    self, CHANNEL_CODES, COUNTRIES, CURRENCIES, PHONE_COUNTRY_CODES, TRX_METHODS, USER_CATEGORIES,
};
use crate::utils::error::{ProvisionError, Result};
use crate::utils::validation::{validate_email, validate_one_of};
use std::collections::HashSet;

pub fn validate_currency(field: &str, ccy: &str) -> Result<()> {
    validate_one_of(field, ccy, &options::codes(CURRENCIES))
}

/// 基本資料的選項檢查；必填欄位交給步驟放行條件處理
pub fn validate_profile_options(profile: &ProfileInfo) -> Result<()> {
    if !profile.default_ccy.is_empty() {
        validate_currency("profile.default_ccy", &profile.default_ccy)?;
    }
    if !profile.category.is_empty() {
        validate_one_of("profile.category", &profile.category, &options::codes(USER_CATEGORIES))?;
    }
    if !profile.phone_country_code.is_empty() {
        validate_one_of(
            "profile.phone_country_code",
            &profile.phone_country_code,
            &options::codes(PHONE_COUNTRY_CODES),
        )?;
    }
    if let Some(region) = profile.region.as_deref().filter(|r| !r.is_empty()) {
        validate_one_of("profile.region", region, &options::codes(COUNTRIES))?;
    }
    if !profile.email.trim().is_empty() {
        validate_email("profile.email", &profile.email)?;
    }
    Ok(())
}

/// 整批帳戶：幣種合法且不重複
pub fn validate_accounts(accounts: &[Account]) -> Result<()> {
    let mut seen = HashSet::new();
    for account in accounts {
        validate_currency("accounts.ccy", &account.ccy)?;
        if !seen.insert(account.ccy.as_str()) {
            return Err(duplicate_currency(&account.ccy));
        }
    }
    Ok(())
}

pub fn duplicate_currency(ccy: &str) -> ProvisionError {
    ProvisionError::validation("accounts.ccy", format!("币种 {} 的账户已存在", ccy))
}

pub fn validate_contract(contract: &Contract) -> Result<()> {
    if let Some(expired_at) = contract.expired_at {
        if expired_at <= contract.start_at {
            return Err(ProvisionError::validation(
                "contracts.expired_at",
                "合约到期时间必须晚于生效时间",
            ));
        }
    }
    Ok(())
}

/// 單條路由的欄位檢查（不含重複檢查）
pub fn validate_router(rule: &RouterRule) -> Result<()> {
    validate_currency("routers.ccy", &rule.ccy)?;
    validate_one_of("routers.trx_method", &rule.trx_method, &options::codes(TRX_METHODS))?;
    validate_one_of("routers.channel_code", &rule.channel_code, &options::codes(CHANNEL_CODES))?;
    if let Some(country) = rule.country_code() {
        validate_one_of("routers.country", country, &options::codes(COUNTRIES))?;
    }
    if rule.max_amount > 0 && rule.max_amount <= rule.min_amount {
        return Err(ProvisionError::validation(
            "routers.max_amount",
            format!(
                "最大金额 {} 必须大于最小金额 {}",
                rule.max_amount, rule.min_amount
            ),
        ));
    }
    Ok(())
}

/// `exclude` 為正在編輯的那一條，比對時跳過自己
pub fn ensure_unique_route(existing: &[RouterRule], candidate: &RouterRule, exclude: Option<usize>) -> Result<()> {
    let key = candidate.route_key();
    let collision = existing
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != exclude)
        .any(|(_, rule)| rule.route_key() == key);

    if collision {
        return Err(ProvisionError::validation(
            "routers",
            format!(
                "已存在相同的路由规则: {}/{}/{}/{}/{}",
                candidate.trx_type,
                candidate.trx_method,
                candidate.ccy,
                candidate.country_code().unwrap_or("-"),
                candidate.channel_code
            ),
        ));
    }
    Ok(())
}

pub fn validate_routers(routers: &[RouterRule]) -> Result<()> {
    for (index, rule) in routers.iter().enumerate() {
        validate_router(rule)?;
        ensure_unique_route(&routers[..index], rule, None)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EntityStatus, TrxType};
    use chrono::{Duration, Utc};

    fn rule(channel: &str, min: u64, max: u64) -> RouterRule {
        RouterRule {
            trx_type: TrxType::In,
            trx_method: "upi".to_string(),
            ccy: "INR".to_string(),
            country: Some("IN".to_string()),
            min_amount: min,
            max_amount: max,
            channel_code: channel.to_string(),
            priority: 1,
            status: EntityStatus::Active,
        }
    }

    #[test]
    fn test_amount_range_rules() {
        assert!(validate_router(&rule("paytm", 0, 0)).is_ok());
        assert!(validate_router(&rule("paytm", 100, 0)).is_ok());
        assert!(validate_router(&rule("paytm", 0, 500)).is_ok());
        assert!(validate_router(&rule("paytm", 500, 500)).is_err());
        assert!(validate_router(&rule("paytm", 600, 500)).is_err());
    }

    #[test]
    fn test_unknown_channel_rejected() {
        assert!(validate_router(&rule("nope", 0, 0)).is_err());
    }

    #[test]
    fn test_duplicate_route_excluding_self() {
        let routers = vec![rule("paytm", 0, 0), rule("razorpay", 0, 0)];

        assert!(ensure_unique_route(&routers, &rule("paytm", 10, 20), None).is_err());
        // 編輯自己時不算重複
        assert!(ensure_unique_route(&routers, &rule("paytm", 10, 20), Some(0)).is_ok());
        // 把第二條改成與第一條相同
        assert!(ensure_unique_route(&routers, &rule("paytm", 0, 0), Some(1)).is_err());
    }

    #[test]
    fn test_unknown_phone_country_code_rejected() {
        let mut profile = ProfileInfo {
            phone_country_code: "+999".to_string(),
            ..ProfileInfo::default()
        };
        assert!(validate_profile_options(&profile).is_err());

        profile.phone_country_code = "+55".to_string();
        assert!(validate_profile_options(&profile).is_ok());
    }

    #[test]
    fn test_duplicate_accounts() {
        let accounts = vec![Account::default_for("INR"), Account::new("INR")];
        assert!(validate_accounts(&accounts).is_err());
        assert!(validate_accounts(&[Account::new("INR"), Account::new("USD")]).is_ok());
    }

    #[test]
    fn test_contract_expiry_after_start() {
        let start = Utc::now();
        let mut contract = Contract {
            contract_id: None,
            start_at: start,
            expired_at: Some(start),
            active: true,
            payin: None,
            payout: None,
        };
        assert!(validate_contract(&contract).is_err());
        contract.expired_at = Some(start + Duration::days(30));
        assert!(validate_contract(&contract).is_ok());
        contract.expired_at = None;
        assert!(validate_contract(&contract).is_ok());
    }
}
