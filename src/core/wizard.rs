use crate::core::rules;
use crate::domain::model::{Account, Contract, FormAggregate, ProfileInfo, RouterRule, UserType};
use crate::utils::error::{ProvisionError, Result};
use std::fmt;

/// 精靈步驟，宣告順序即流程順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Profile,
    Accounts,
    Contracts,
    Routers,
    Preview,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Profile,
        WizardStep::Accounts,
        WizardStep::Contracts,
        WizardStep::Routers,
        WizardStep::Preview,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<WizardStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Profile => "基本信息",
            WizardStep::Accounts => "账户",
            WizardStep::Contracts => "合约",
            WizardStep::Routers => "路由",
            WizardStep::Preview => "预览",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequest {
    /// 表單是空的，直接關閉
    Closed,
    /// 有填寫內容，需要使用者確認後呼叫 `discard`
    NeedsConfirmation,
}

/// 開戶精靈：持有唯一的 `FormAggregate`，所有修改都經過這裡
#[derive(Debug, Clone)]
pub struct WizardShell {
    user_type: UserType,
    form: FormAggregate,
    current: WizardStep,
    furthest: WizardStep,
}

impl WizardShell {
    pub fn new(user_type: UserType) -> Self {
        Self {
            user_type,
            form: FormAggregate::default(),
            current: WizardStep::Profile,
            furthest: WizardStep::Profile,
        }
    }

    pub fn user_type(&self) -> UserType {
        self.user_type
    }

    pub fn form(&self) -> &FormAggregate {
        &self.form
    }

    pub fn current_step(&self) -> WizardStep {
        self.current
    }

    pub fn is_visited(&self, step: WizardStep) -> bool {
        step <= self.furthest
    }

    // ---- 步驟放行 ----

    pub fn step_error(&self, step: WizardStep) -> Option<String> {
        match step {
            WizardStep::Profile if !self.form.profile.has_required_fields() => {
                Some("请填写名称、邮箱和手机号".to_string())
            }
            WizardStep::Accounts if self.form.accounts.is_empty() => Some("至少需要一个账户".to_string()),
            WizardStep::Contracts if self.form.contracts.is_empty() => Some("至少需要一份合约".to_string()),
            WizardStep::Routers if self.form.routers.is_empty() => Some("至少需要一条路由规则".to_string()),
            _ => None,
        }
    }

    pub fn is_step_valid(&self, step: WizardStep) -> bool {
        self.step_error(step).is_none()
    }

    fn ensure_step_valid(&self, step: WizardStep) -> Result<()> {
        match self.step_error(step) {
            Some(message) => Err(ProvisionError::StepNavigationError {
                step: step.title().to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    pub fn next(&mut self) -> Result<WizardStep> {
        let target = self.current.next().ok_or_else(|| ProvisionError::StepNavigationError {
            step: self.current.title().to_string(),
            message: "已经是最后一步".to_string(),
        })?;
        self.goto(target)?;
        Ok(target)
    }

    pub fn back(&mut self) -> Result<WizardStep> {
        let target = self.current.previous().ok_or_else(|| ProvisionError::StepNavigationError {
            step: self.current.title().to_string(),
            message: "已经是第一步".to_string(),
        })?;
        self.goto(target)?;
        Ok(target)
    }

    /// 往回可跳到任何走過的步驟；往前則沿途每一步都要通過檢查
    pub fn goto(&mut self, target: WizardStep) -> Result<()> {
        if target <= self.current {
            self.current = target;
            return Ok(());
        }

        let is_adjacent = self.current.next() == Some(target);
        if !is_adjacent && !self.is_visited(target) {
            return Err(ProvisionError::StepNavigationError {
                step: target.title().to_string(),
                message: "不能跳到尚未访问的步骤".to_string(),
            });
        }

        for step in WizardStep::ALL
            .iter()
            .filter(|step| **step >= self.current && **step < target)
        {
            self.ensure_step_valid(*step)?;
        }

        tracing::debug!("🧭 Wizard step {} -> {}", self.current, target);
        self.current = target;
        self.furthest = self.furthest.max(target);
        Ok(())
    }

    // ---- 基本資料 ----

    /// 整段替換基本資料，並同步預設幣種帳戶
    pub fn set_profile(&mut self, profile: ProfileInfo) -> Result<()> {
        rules::validate_profile_options(&profile)?;
        self.form.profile = profile;
        self.sync_default_account();
        Ok(())
    }

    fn sync_default_account(&mut self) {
        let ccy = self.form.profile.default_ccy.trim().to_string();
        self.form.accounts.retain(|account| !account.is_default || account.ccy == ccy);
        if ccy.is_empty() {
            return;
        }
        match self.form.accounts.iter_mut().find(|account| account.ccy == ccy) {
            Some(account) => account.is_default = true,
            None => self.form.accounts.insert(0, Account::default_for(ccy)),
        }
    }

    // ---- 帳戶 ----

    /// 整段替換帳戶；預設帳戶不能在替換中消失
    pub fn set_accounts(&mut self, accounts: Vec<Account>) -> Result<()> {
        rules::validate_accounts(&accounts)?;
        for existing in self.form.accounts.iter().filter(|a| a.is_default) {
            if !accounts.iter().any(|a| a.ccy == existing.ccy) {
                return Err(default_account_locked(&existing.ccy));
            }
        }
        let default_ccy = self.form.profile.default_ccy.clone();
        self.form.accounts = accounts
            .into_iter()
            .map(|mut account| {
                account.is_default = !default_ccy.is_empty() && account.ccy == default_ccy;
                account
            })
            .collect();
        Ok(())
    }

    pub fn add_account(&mut self, account: Account) -> Result<()> {
        rules::validate_currency("accounts.ccy", &account.ccy)?;
        if self.form.accounts.iter().any(|a| a.ccy == account.ccy) {
            return Err(rules::duplicate_currency(&account.ccy));
        }
        let is_default = account.ccy == self.form.profile.default_ccy;
        self.form.accounts.push(Account { is_default, ..account });
        Ok(())
    }

    pub fn remove_account(&mut self, ccy: &str) -> Result<Account> {
        let position = self
            .form
            .accounts
            .iter()
            .position(|a| a.ccy == ccy)
            .ok_or_else(|| ProvisionError::validation("accounts.ccy", format!("币种 {} 的账户不存在", ccy)))?;
        if self.form.accounts[position].is_default {
            return Err(default_account_locked(ccy));
        }
        Ok(self.form.accounts.remove(position))
    }

    // ---- 合約 ----

    pub fn set_contracts(&mut self, contracts: Vec<Contract>) -> Result<()> {
        for contract in &contracts {
            rules::validate_contract(contract)?;
        }
        self.form.contracts = contracts;
        Ok(())
    }

    pub fn add_contract(&mut self, contract: Contract) -> Result<()> {
        rules::validate_contract(&contract)?;
        self.form.contracts.push(contract);
        Ok(())
    }

    pub fn remove_contract(&mut self, index: usize) -> Option<Contract> {
        (index < self.form.contracts.len()).then(|| self.form.contracts.remove(index))
    }

    // ---- 路由 ----

    pub fn set_routers(&mut self, routers: Vec<RouterRule>) -> Result<()> {
        rules::validate_routers(&routers)?;
        self.form.routers = routers;
        Ok(())
    }

    pub fn add_router(&mut self, rule: RouterRule) -> Result<()> {
        rules::validate_router(&rule)?;
        rules::ensure_unique_route(&self.form.routers, &rule, None)?;
        self.form.routers.push(rule);
        Ok(())
    }

    pub fn update_router(&mut self, index: usize, rule: RouterRule) -> Result<()> {
        if index >= self.form.routers.len() {
            return Err(ProvisionError::validation("routers", format!("路由 #{} 不存在", index + 1)));
        }
        rules::validate_router(&rule)?;
        rules::ensure_unique_route(&self.form.routers, &rule, Some(index))?;
        self.form.routers[index] = rule;
        Ok(())
    }

    pub fn remove_router(&mut self, index: usize) -> Option<RouterRule> {
        (index < self.form.routers.len()).then(|| self.form.routers.remove(index))
    }

    // ---- 關閉 / 送出 ----

    pub fn is_dirty(&self) -> bool {
        !self.form.is_pristine()
    }

    pub fn request_close(&mut self) -> CloseRequest {
        if self.is_dirty() {
            return CloseRequest::NeedsConfirmation;
        }
        self.reset();
        CloseRequest::Closed
    }

    /// 確認放棄：清空整張表單並回到第一步
    pub fn discard(&mut self) {
        tracing::info!("🗑️ Discarding wizard form");
        self.reset();
    }

    fn reset(&mut self) {
        self.form = FormAggregate::default();
        self.current = WizardStep::Profile;
        self.furthest = WizardStep::Profile;
    }

    /// 只有在預覽步驟、且所有步驟都通過時才交出表單
    pub fn submit(&self) -> Result<FormAggregate> {
        if self.current != WizardStep::Preview {
            return Err(ProvisionError::StepNavigationError {
                step: self.current.title().to_string(),
                message: "请在预览页确认后再提交".to_string(),
            });
        }
        for step in WizardStep::ALL {
            self.ensure_step_valid(step)?;
        }
        rules::validate_accounts(&self.form.accounts)?;
        rules::validate_routers(&self.form.routers)?;
        Ok(self.form.clone())
    }

    /// 建立全部成功後清空表單
    pub fn finish_submission(&mut self) {
        self.reset();
    }
}

fn default_account_locked(ccy: &str) -> ProvisionError {
    ProvisionError::validation("accounts", format!("默认币种 {} 的账户不能删除", ccy))
}
