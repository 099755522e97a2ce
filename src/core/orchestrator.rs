use crate::domain::api::{CreateAccountRequest, CreateContractRequest, CreateRouterRequest, RegisterUserRequest};
use crate::domain::model::{
    ExecutionItem, FormAggregate, ItemSource, ItemStatus, ResourceKind, UserType,
};
use crate::domain::ports::ProvisioningApi;
use crate::utils::error::{ProvisionError, Result};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::watch;

pub const USER_ITEM_ID: &str = "user";

/// 初次執行或批次重試後的整體結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    AllSucceeded,
    PartialFailure { failed: usize, pending: usize },
}

impl RunOutcome {
    pub fn from_items(items: &[ExecutionItem]) -> Self {
        if items.iter().all(|item| item.status == ItemStatus::Success) {
            return RunOutcome::AllSucceeded;
        }
        RunOutcome::PartialFailure {
            failed: count_status(items, ItemStatus::Error),
            pending: count_status(items, ItemStatus::Pending),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::AllSucceeded)
    }

    /// 對話框上的提示文字
    pub fn toast(&self) -> String {
        match self {
            RunOutcome::AllSucceeded => "✅ 全部创建成功".to_string(),
            RunOutcome::PartialFailure { failed, pending: 0 } => {
                format!("⚠️ 部分创建失败：{} 项失败，可重试", failed)
            }
            RunOutcome::PartialFailure { failed, pending } => {
                format!("⚠️ 部分创建失败：{} 项失败，{} 项未执行", failed, pending)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRetryOutcome {
    pub attempted: Vec<String>,
    /// 沒有送出的項目：前置使用者仍失敗，或已被單項重試佔用
    pub skipped: Vec<String>,
    pub failures_remain: bool,
}

/// 依表單產生執行項目：使用者、帳戶、合約、路由，順序固定
pub fn build_items(user_type: UserType, form: &FormAggregate) -> Vec<ExecutionItem> {
    let mut items = Vec::with_capacity(1 + form.accounts.len() + form.contracts.len() + form.routers.len());

    items.push(pending_item(
        USER_ITEM_ID.to_string(),
        format!("创建{}: {}", user_type.display_name(), form.profile.name),
        ItemSource::User(form.profile.clone()),
    ));

    for (index, account) in form.accounts.iter().enumerate() {
        items.push(pending_item(
            format!("account-{}", index),
            format!("账户: {}", account.ccy),
            ItemSource::Account(account.clone()),
        ));
    }

    for (index, contract) in form.contracts.iter().enumerate() {
        let name = contract
            .contract_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("#{}", index + 1));
        items.push(pending_item(
            format!("contract-{}", index),
            format!("合约: {}", name),
            ItemSource::Contract(contract.clone()),
        ));
    }

    for (index, rule) in form.routers.iter().enumerate() {
        items.push(pending_item(
            format!("router-{}", index),
            format!(
                "路由: {}/{}/{}/{}",
                rule.trx_type, rule.trx_method, rule.ccy, rule.channel_code
            ),
            ItemSource::Router(rule.clone()),
        ));
    }

    items
}

fn pending_item(id: String, label: String, source: ItemSource) -> ExecutionItem {
    ExecutionItem {
        id,
        kind: source.kind(),
        label,
        status: ItemStatus::Pending,
        error: None,
        source,
    }
}

fn count_status(items: &[ExecutionItem], status: ItemStatus) -> usize {
    items.iter().filter(|item| item.status == status).count()
}

struct RunState {
    items: Vec<ExecutionItem>,
    user_id: Option<String>,
}

/// 一次開戶的執行器：先建使用者，再依序建帳戶、合約、路由
pub struct CreationOrchestrator<A: ProvisioningApi> {
    api: A,
    user_type: UserType,
    state: Mutex<RunState>,
    progress: watch::Sender<Vec<ExecutionItem>>,
}

impl<A: ProvisioningApi> CreationOrchestrator<A> {
    pub fn new(api: A, user_type: UserType, form: &FormAggregate) -> Self {
        let items = build_items(user_type, form);
        let (progress, _) = watch::channel(items.clone());
        Self {
            api,
            user_type,
            state: Mutex::new(RunState { items, user_id: None }),
            progress,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &RunState) {
        self.progress.send_replace(state.items.clone());
    }

    /// 訂閱狀態快照，每次狀態轉換都會推送
    pub fn subscribe(&self) -> watch::Receiver<Vec<ExecutionItem>> {
        self.progress.subscribe()
    }

    pub fn items(&self) -> Vec<ExecutionItem> {
        self.lock().items.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.lock().user_id.clone()
    }

    /// 以最新快照計算，不使用任何先前取得的副本
    pub fn outcome(&self) -> RunOutcome {
        RunOutcome::from_items(&self.lock().items)
    }

    pub fn is_busy(&self) -> bool {
        self.lock().items.iter().any(|item| item.status == ItemStatus::Running)
    }

    /// 執行整個流程，使用者建立失敗時不會碰任何相依項目
    pub async fn run(&self) -> RunOutcome {
        let started = Instant::now();
        let total = self.lock().items.len();
        tracing::info!("🚀 Starting {} provisioning with {} items", self.user_type, total);

        if let Some(index) = self.claim_pending(0) {
            let status = self.execute(index).await;
            if status != ItemStatus::Success {
                tracing::error!("❌ User creation failed, dependent items are not attempted");
                return self.outcome();
            }
        }

        if self.user_id().is_some() {
            self.run_pending_dependents().await;
        }

        let outcome = self.outcome();
        tracing::info!(
            "🏁 Provisioning finished in {:?}: {:?}",
            started.elapsed(),
            outcome
        );
        outcome
    }

    /// 使用者已建立後，補跑從未執行過的相依項目，回傳執行數量
    pub async fn resume_pending(&self) -> usize {
        if self.user_id().is_none() {
            tracing::debug!("⏸️ No user id yet, nothing to resume");
            return 0;
        }
        self.run_pending_dependents().await
    }

    async fn run_pending_dependents(&self) -> usize {
        let total = self.lock().items.len();
        let mut attempted = 0;
        for index in 1..total {
            if let Some(index) = self.claim_pending(index) {
                self.execute(index).await;
                attempted += 1;
            }
        }
        attempted
    }

    /// 重試單一失敗項目；只重送同一個請求，只更新這一項
    pub async fn retry_item(&self, id: &str) -> Result<ItemStatus> {
        let index = self.claim_failed(id)?;
        tracing::info!("🔄 Retrying item: {}", id);
        Ok(self.execute(index).await)
    }

    /// 依 使用者 → 帳戶 → 合約 → 路由 順序重試所有失敗項目
    pub async fn retry_failed(&self) -> Result<BatchRetryOutcome> {
        let mut failed: Vec<(ResourceKind, String)> = {
            let state = self.lock();
            if state.items.iter().any(|item| item.status == ItemStatus::Running) {
                return Err(ProvisionError::RetryRejected {
                    item_id: "*".to_string(),
                    reason: "仍有项目在执行中，请稍后再批量重试".to_string(),
                });
            }
            state
                .items
                .iter()
                .filter(|item| item.status == ItemStatus::Error)
                .map(|item| (item.kind, item.id.clone()))
                .collect()
        };
        failed.sort_by_key(|(kind, _)| *kind);

        tracing::info!("🔁 Batch retry of {} failed items", failed.len());
        let mut outcome = BatchRetryOutcome::default();
        let mut queue = failed.into_iter();

        while let Some((kind, id)) = queue.next() {
            let status = match self.retry_item(&id).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!("⏭️ Skipping {}: {}", id, e);
                    outcome.skipped.push(id);
                    continue;
                }
            };
            outcome.attempted.push(id);

            if kind == ResourceKind::User && status != ItemStatus::Success {
                let before = outcome.skipped.len();
                outcome.skipped.extend(queue.by_ref().map(|(_, id)| id));
                tracing::warn!(
                    "⏭️ User still failing, skipped {} dependent retries",
                    outcome.skipped.len() - before
                );
                break;
            }
        }

        if self.user_id().is_some() {
            let resumed = self.run_pending_dependents().await;
            if resumed > 0 {
                tracing::info!("▶️ Ran {} items that were blocked by the user", resumed);
            }
        }

        outcome.failures_remain = self
            .items()
            .iter()
            .any(|item| item.status != ItemStatus::Success);
        Ok(outcome)
    }

    fn claim_pending(&self, index: usize) -> Option<usize> {
        let mut state = self.lock();
        let item = state.items.get_mut(index)?;
        if item.status != ItemStatus::Pending {
            return None;
        }
        item.status = ItemStatus::Running;
        self.publish(&state);
        Some(index)
    }

    /// 檢查與標記 running 在同一把鎖內完成，同一項目不會被重複送出
    fn claim_failed(&self, id: &str) -> Result<usize> {
        let mut state = self.lock();
        let has_user = state.user_id.is_some();
        let index = state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| rejected(id, "找不到该项目"))?;

        let item = &mut state.items[index];
        match item.status {
            ItemStatus::Error => {}
            ItemStatus::Running => return Err(rejected(id, "该项目正在执行中")),
            _ => return Err(rejected(id, "只有失败的项目可以重试")),
        }
        if item.kind != ResourceKind::User && !has_user {
            return Err(rejected(id, "用户尚未创建成功，请先重试用户"));
        }

        item.status = ItemStatus::Running;
        item.error = None;
        self.publish(&state);
        Ok(index)
    }

    /// 呼叫後台並寫回結果；任何錯誤都轉成項目上的錯誤訊息
    async fn execute(&self, index: usize) -> ItemStatus {
        let (id, source, user_id) = {
            let state = self.lock();
            let item = &state.items[index];
            (item.id.clone(), item.source.clone(), state.user_id.clone())
        };

        tracing::debug!("📡 Executing item {}", id);
        let result = self.call(&source, user_id.as_deref()).await;

        let mut state = self.lock();
        let status = match result {
            Ok(created_user_id) => {
                if let Some(user_id) = created_user_id {
                    tracing::info!("👤 User created with id {}", user_id);
                    state.user_id = Some(user_id);
                }
                let item = &mut state.items[index];
                item.status = ItemStatus::Success;
                item.error = None;
                tracing::info!("✅ {}", item.label);
                ItemStatus::Success
            }
            Err(e) => {
                let item = &mut state.items[index];
                let message = failure_message(item.kind, &e);
                tracing::error!("❌ {} failed: {} ({})", item.label, message, e);
                item.status = ItemStatus::Error;
                item.error = Some(message);
                ItemStatus::Error
            }
        };
        self.publish(&state);
        status
    }

    /// 使用者建立成功時回傳新 id，其他資源回傳 None
    async fn call(&self, source: &ItemSource, user_id: Option<&str>) -> Result<Option<String>> {
        if let ItemSource::User(profile) = source {
            let request = RegisterUserRequest::from_profile(self.user_type, profile);
            return self.api.register_user(&request).await.map(Some);
        }

        let user_id = user_id.ok_or_else(|| ProvisionError::RetryRejected {
            item_id: source.kind().to_string(),
            reason: "用户尚未创建".to_string(),
        })?;

        match source {
            ItemSource::Account(account) => {
                let request = CreateAccountRequest::new(user_id, self.user_type, account);
                self.api.create_account(&request).await?;
            }
            ItemSource::Contract(contract) => {
                let request = CreateContractRequest::new(user_id, self.user_type, contract);
                self.api.create_contract(&request).await?;
            }
            ItemSource::Router(rule) => {
                let request = CreateRouterRequest::new(user_id, self.user_type, rule);
                self.api.create_router(&request).await?;
            }
            ItemSource::User(_) => {}
        }
        Ok(None)
    }
}

fn rejected(id: &str, reason: &str) -> ProvisionError {
    ProvisionError::RetryRejected {
        item_id: id.to_string(),
        reason: reason.to_string(),
    }
}

/// 後台有訊息就用後台的，否則給通用訊息
fn failure_message(kind: ResourceKind, error: &ProvisionError) -> String {
    match error {
        ProvisionError::BackendError { message, .. } if !message.trim().is_empty() => message.clone(),
        ProvisionError::BackendError { .. } => {
            let name = match kind {
                ResourceKind::User => "用户",
                ResourceKind::Account => "账户",
                ResourceKind::Contract => "合约",
                ResourceKind::Router => "路由",
            };
            format!("{}创建失败，请稍后重试", name)
        }
        other => other.user_friendly_message(),
    }
}
