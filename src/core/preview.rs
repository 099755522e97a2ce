use crate::domain::model::{FormAggregate, RouterRule, UserType};
use crate::domain::options::{self, CHANNEL_CODES, CURRENCIES, TRX_METHODS, TRX_TYPES};

/// 預覽頁上方的數量統計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSummary {
    pub users: usize,
    pub accounts: usize,
    pub contracts: usize,
    pub routers: usize,
}

impl PreviewSummary {
    pub fn from_form(form: &FormAggregate) -> Self {
        Self {
            users: 1,
            accounts: form.accounts.len(),
            contracts: form.contracts.len(),
            routers: form.routers.len(),
        }
    }

    pub fn total_items(&self) -> usize {
        self.users + self.accounts + self.contracts + self.routers
    }
}

/// 金額區間顯示：0/0 不限，只有下限顯示「起」
pub fn format_amount_range(ccy: &str, min_amount: u64, max_amount: u64) -> String {
    match (min_amount, max_amount) {
        (0, 0) => format!("{} 不限", ccy),
        (min, 0) => format!("{} {} 起", ccy, min),
        (min, max) => format!("{} {} - {}", ccy, min, max),
    }
}

pub fn router_line(rule: &RouterRule) -> String {
    let trx_type = options::label_of(TRX_TYPES, rule.trx_type.as_str()).unwrap_or(rule.trx_type.as_str());
    let method = options::label_of(TRX_METHODS, &rule.trx_method).unwrap_or(rule.trx_method.as_str());
    let channel = options::label_of(CHANNEL_CODES, &rule.channel_code).unwrap_or(rule.channel_code.as_str());
    format!(
        "[P{}] {} / {} / {} / {} / {} ({})",
        rule.priority,
        trx_type,
        method,
        rule.country_code().unwrap_or("全部国家"),
        format_amount_range(&rule.ccy, rule.min_amount, rule.max_amount),
        channel,
        rule.status.as_str()
    )
}

/// 路由依優先級排序，數字越小越優先
pub fn routers_by_priority(form: &FormAggregate) -> Vec<&RouterRule> {
    let mut routers: Vec<&RouterRule> = form.routers.iter().collect();
    routers.sort_by_key(|rule| rule.priority);
    routers
}

/// 產生預覽頁的文字
pub fn render_preview(user_type: UserType, form: &FormAggregate) -> String {
    let summary = PreviewSummary::from_form(form);
    let profile = &form.profile;
    let mut lines = Vec::new();

    lines.push(format!(
        "📋 {} 开户预览: {} 用户 / {} 账户 / {} 合约 / {} 路由",
        user_type.display_name(),
        summary.users,
        summary.accounts,
        summary.contracts,
        summary.routers
    ));
    lines.push(String::new());
    lines.push("👤 基本信息".to_string());
    lines.push(format!("  名称: {}", profile.name));
    lines.push(format!("  邮箱: {}", profile.email));
    lines.push(format!("  手机: {} {}", profile.phone_country_code, profile.phone));
    lines.push(format!("  类别: {}", profile.category));
    lines.push(format!(
        "  默认币种: {}",
        if profile.default_ccy.is_empty() { "-" } else { profile.default_ccy.as_str() }
    ));
    lines.push(format!("  状态: {}", if profile.active { "启用" } else { "停用" }));

    lines.push(String::new());
    lines.push("💰 账户".to_string());
    for account in &form.accounts {
        let name = options::label_of(CURRENCIES, &account.ccy).unwrap_or("");
        lines.push(format!(
            "  {} {}{}{}",
            account.ccy,
            name,
            if account.is_default { " [默认]" } else { "" },
            if account.active { "" } else { " [停用]" }
        ));
    }

    lines.push(String::new());
    lines.push("📄 合约".to_string());
    for (index, contract) in form.contracts.iter().enumerate() {
        let expiry = contract
            .expired_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "长期".to_string());
        lines.push(format!(
            "  #{} {} {} ~ {}{}",
            index + 1,
            contract.contract_id.as_deref().unwrap_or("(自动编号)"),
            contract.start_at.format("%Y-%m-%d %H:%M"),
            expiry,
            if contract.active { "" } else { " [停用]" }
        ));
    }

    lines.push(String::new());
    lines.push("🔀 路由".to_string());
    for rule in routers_by_priority(form) {
        lines.push(format!("  {}", router_line(rule)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Account, Contract, EntityStatus, TrxType};
    use chrono::Utc;

    fn rule(channel: &str, priority: u32) -> RouterRule {
        RouterRule {
            trx_type: TrxType::In,
            trx_method: "upi".to_string(),
            ccy: "INR".to_string(),
            country: None,
            min_amount: 0,
            max_amount: 500,
            channel_code: channel.to_string(),
            priority,
            status: EntityStatus::Active,
        }
    }

    fn form() -> FormAggregate {
        let contract = Contract {
            contract_id: Some("C-1".to_string()),
            start_at: Utc::now(),
            expired_at: None,
            active: true,
            payin: None,
            payout: None,
        };
        FormAggregate {
            accounts: vec![Account::default_for("INR"), Account::new("USD")],
            contracts: vec![contract],
            routers: vec![rule("paytm", 3), rule("razorpay", 1), rule("cashfree", 2)],
            ..Default::default()
        }
    }

    #[test]
    fn test_amount_range_format() {
        assert_eq!(format_amount_range("INR", 0, 0), "INR 不限");
        assert_eq!(format_amount_range("INR", 0, 500), "INR 0 - 500");
        assert_eq!(format_amount_range("INR", 100, 0), "INR 100 起");
    }

    #[test]
    fn test_summary_counts() {
        let summary = PreviewSummary::from_form(&form());
        assert_eq!(
            summary,
            PreviewSummary {
                users: 1,
                accounts: 2,
                contracts: 1,
                routers: 3
            }
        );
        assert_eq!(summary.total_items(), 7);
    }

    #[test]
    fn test_routers_sorted_by_priority() {
        let form = form();
        let channels: Vec<&str> = routers_by_priority(&form)
            .iter()
            .map(|r| r.channel_code.as_str())
            .collect();
        assert_eq!(channels, vec!["razorpay", "cashfree", "paytm"]);
    }

    #[test]
    fn test_render_preview_header() {
        let text = render_preview(UserType::Merchant, &form());
        assert!(text.starts_with("📋 商户 开户预览: 1 用户 / 2 账户 / 1 合约 / 3 路由"));
        assert!(text.contains("INR 0 - 500"));
        assert!(text.contains("[默认]"));
    }
}
