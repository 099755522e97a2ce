use crate::domain::model::{ExecutionItem, ItemStatus};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

pub const DEFAULT_AUTO_CLOSE: Duration = Duration::from_secs(6);

/// 進度面板的統計，純粹由項目清單計算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub running: usize,
    pub pending: usize,
    pub percent: u8,
}

impl ProgressSummary {
    pub fn from_items(items: &[ExecutionItem]) -> Self {
        let count = |status: ItemStatus| items.iter().filter(|item| item.status == status).count();
        let succeeded = count(ItemStatus::Success);
        let failed = count(ItemStatus::Error);
        let completed = items.iter().filter(|item| item.status.is_resolved()).count();
        let total = items.len();
        let percent = if total == 0 {
            0
        } else {
            (completed * 100 / total) as u8
        };

        Self {
            total,
            completed,
            succeeded,
            failed,
            running: count(ItemStatus::Running),
            pending: count(ItemStatus::Pending),
            percent,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    /// 全部完成且沒有錯誤才自動關閉
    pub fn should_auto_close(&self) -> bool {
        self.is_finished() && !self.has_errors()
    }

    /// 有項目在跑時不開放批次重試
    pub fn can_batch_retry(&self) -> bool {
        self.failed > 0 && self.running == 0
    }

    pub fn status_line(&self) -> String {
        format!(
            "📊 {}% ({}/{}) 成功 {} / 失败 {} / 执行中 {} / 等待 {}",
            self.percent,
            self.completed,
            self.total,
            self.succeeded,
            self.failed,
            self.running,
            self.pending
        )
    }
}

pub fn can_retry_item(item: &ExecutionItem) -> bool {
    item.status == ItemStatus::Error
}

pub fn render_items(items: &[ExecutionItem]) -> String {
    items
        .iter()
        .map(|item| {
            let icon = match item.status {
                ItemStatus::Pending => "⏳",
                ItemStatus::Running => "🔄",
                ItemStatus::Success => "✅",
                ItemStatus::Error => "❌",
            };
            match &item.error {
                Some(error) => format!("  {} [{}] {} - {}", icon, item.id, item.label, error),
                None => format!("  {} [{}] {}", icon, item.id, item.label),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Running { remaining: Duration },
    Expired,
    Cancelled,
}

/// 自動關閉倒數；(完成, 有錯) 任一改變就重新計時
#[derive(Debug, Clone)]
pub struct AutoCloseCountdown {
    duration: Duration,
    deadline: Option<Instant>,
    last_key: Option<(bool, bool)>,
    cancelled: bool,
}

impl AutoCloseCountdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
            last_key: None,
            cancelled: false,
        }
    }

    pub fn observe(&mut self, summary: &ProgressSummary, now: Instant) -> CountdownState {
        if self.cancelled {
            return CountdownState::Cancelled;
        }
        let key = (summary.is_finished(), summary.has_errors());
        if self.last_key != Some(key) {
            self.last_key = Some(key);
            self.deadline = summary.should_auto_close().then(|| now + self.duration);
            if self.deadline.is_some() {
                tracing::debug!("⏲️ Auto-close countdown started ({:?})", self.duration);
            }
        }
        self.state(now)
    }

    pub fn state(&self, now: Instant) -> CountdownState {
        if self.cancelled {
            return CountdownState::Cancelled;
        }
        match self.deadline {
            None => CountdownState::Idle,
            Some(deadline) if now >= deadline => CountdownState::Expired,
            Some(deadline) => CountdownState::Running {
                remaining: deadline - now,
            },
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        if self.cancelled {
            None
        } else {
            self.deadline
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.deadline = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoCloseOutcome {
    /// 倒數結束，對話框自動關閉
    Closed,
    /// 對話框已被關閉（快照來源結束）
    Cancelled,
}

/// 監看進度快照並驅動倒數，直到自動關閉或對話框被關掉
pub async fn watch_auto_close(
    mut updates: watch::Receiver<Vec<ExecutionItem>>,
    duration: Duration,
) -> AutoCloseOutcome {
    let mut countdown = AutoCloseCountdown::new(duration);

    loop {
        let summary = ProgressSummary::from_items(&updates.borrow_and_update());
        if countdown.observe(&summary, Instant::now()) == CountdownState::Expired {
            return AutoCloseOutcome::Closed;
        }

        match countdown.deadline() {
            Some(deadline) => {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            return AutoCloseOutcome::Cancelled;
                        }
                    }
                    _ = tokio::time::sleep_until(deadline) => {
                        tracing::info!("👋 Auto-closing progress dialog");
                        return AutoCloseOutcome::Closed;
                    }
                }
            }
            None => {
                if updates.changed().await.is_err() {
                    return AutoCloseOutcome::Cancelled;
                }
            }
        }
    }
}
