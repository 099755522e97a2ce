use crate::domain::api::{UserListQuery, UserRecord};
use crate::domain::model::UserType;
use crate::domain::ports::ProvisioningApi;
use crate::utils::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const SEARCH_PAGE_SIZE: u32 = 10;

type ClearCallback = Box<dyn Fn() + Send + Sync>;

/// 帶防抖的使用者搜尋選擇器
pub struct EntitySelector<A: ProvisioningApi> {
    api: A,
    user_type: UserType,
    debounce: Duration,
    generation: AtomicU64,
    selection: Mutex<Option<UserRecord>>,
    changes: watch::Sender<Option<UserRecord>>,
    on_clear: Option<ClearCallback>,
}

impl<A: ProvisioningApi> EntitySelector<A> {
    pub fn new(api: A, user_type: UserType) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            api,
            user_type,
            debounce: SEARCH_DEBOUNCE,
            generation: AtomicU64::new(0),
            selection: Mutex::new(None),
            changes,
            on_clear: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// 有設定時，清除不再廣播空選擇，改呼叫這個 callback
    pub fn with_on_clear(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_clear = Some(Box::new(callback));
        self
    }

    fn lock(&self) -> MutexGuard<'_, Option<UserRecord>> {
        self.selection.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserRecord>> {
        self.changes.subscribe()
    }

    pub fn selection(&self) -> Option<UserRecord> {
        self.lock().clone()
    }

    pub fn label(&self) -> Option<String> {
        self.lock().as_ref().map(UserRecord::display_label)
    }

    /// 防抖搜尋；被較新的輸入取代時回傳 `None` 且不送出請求
    pub async fn search(&self, query: &str) -> Result<Option<Vec<UserRecord>>> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!("🔍 Search '{}' superseded by newer input", query);
            return Ok(None);
        }

        let keyword = query.trim();
        let mut request = UserListQuery::new(self.user_type).with_size(SEARCH_PAGE_SIZE);
        if !keyword.is_empty() {
            request = request.with_keyword(keyword);
        }

        let page = self.api.list_users(&request).await?;
        tracing::debug!("🔍 Search '{}' returned {} candidates", keyword, page.list.len());
        Ok(Some(page.list))
    }

    pub fn select(&self, record: UserRecord) {
        *self.lock() = Some(record.clone());
        self.changes.send_replace(Some(record));
    }

    /// 外部帶入 id 時補查顯示名稱；與目前快取相同就不查
    pub async fn set_value(&self, id: &str) -> Result<Option<String>> {
        let id = id.trim();
        if id.is_empty() {
            self.clear();
            return Ok(None);
        }
        if let Some(record) = self.lock().as_ref().filter(|record| record.id == id) {
            return Ok(Some(record.display_label()));
        }

        let request = UserListQuery::new(self.user_type).with_id(id).with_size(1);
        let page = self.api.list_users(&request).await?;
        let found = page.list.into_iter().find(|record| record.id == id);

        match found {
            Some(record) => {
                let label = record.display_label();
                *self.lock() = Some(record.clone());
                self.changes.send_replace(Some(record));
                Ok(Some(label))
            }
            None => {
                tracing::warn!("🔍 No {} found with id {}", self.user_type, id);
                *self.lock() = None;
                self.changes.send_replace(None);
                Ok(None)
            }
        }
    }

    pub fn clear(&self) {
        *self.lock() = None;
        match &self.on_clear {
            Some(callback) => callback(),
            None => {
                self.changes.send_replace(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api::{
        CreateAccountRequest, CreateContractRequest, CreateRouterRequest, OperatorProfile,
        RegisterUserRequest, UserPage,
    };
    use crate::utils::error::ProvisionError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Clone, Default)]
    struct ListApi {
        queries: Arc<AsyncMutex<Vec<UserListQuery>>>,
    }

    fn record(id: &str, name: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@acme.test", id),
            phone: String::new(),
            status: None,
        }
    }

    #[async_trait]
    impl ProvisioningApi for ListApi {
        async fn register_user(&self, _request: &RegisterUserRequest) -> Result<String> {
            unimplemented!()
        }

        async fn list_users(&self, query: &UserListQuery) -> Result<UserPage> {
            self.queries.lock().await.push(query.clone());
            let list = match (&query.id, &query.keyword) {
                (Some(id), _) if id == "missing" => vec![],
                (Some(id), _) => vec![record(id, "Lookup")],
                (None, Some(keyword)) => vec![record("m1", keyword), record("m2", keyword)],
                (None, None) => vec![],
            };
            Ok(UserPage { total: list.len() as u64, list })
        }

        async fn create_account(&self, _request: &CreateAccountRequest) -> Result<()> {
            unimplemented!()
        }

        async fn create_contract(&self, _request: &CreateContractRequest) -> Result<()> {
            unimplemented!()
        }

        async fn create_router(&self, _request: &CreateRouterRequest) -> Result<()> {
            unimplemented!()
        }

        async fn current_operator(&self) -> Result<OperatorProfile> {
            Err(ProvisionError::ResponseFormatError {
                message: "not used".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_only_last_query_hits_api() {
        let api = ListApi::default();
        let selector = EntitySelector::new(api.clone(), UserType::Merchant);

        let (first, second, third) = tokio::join!(
            selector.search("a"),
            selector.search("ac"),
            selector.search("acme")
        );

        assert!(first.unwrap().is_none());
        assert!(second.unwrap().is_none());
        let results = third.unwrap().unwrap();
        assert_eq!(results.len(), 2);

        let queries = api.queries.lock().await;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].keyword.as_deref(), Some("acme"));
        assert_eq!(queries[0].size, SEARCH_PAGE_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_value_looks_up_unknown_id_once() {
        let api = ListApi::default();
        let selector = EntitySelector::new(api.clone(), UserType::CashierTeam);

        let label = selector.set_value("42").await.unwrap();
        assert_eq!(label.as_deref(), Some("Lookup (42@acme.test)"));
        // 已快取相同 id，不再查詢
        selector.set_value("42").await.unwrap();
        assert_eq!(api.queries.lock().await.len(), 1);
        assert_eq!(api.queries.lock().await[0].id.as_deref(), Some("42"));

        assert_eq!(selector.set_value("missing").await.unwrap(), None);
        assert_eq!(api.queries.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_set_value_unknown_id_drops_previous_selection() {
        let selector = EntitySelector::new(ListApi::default(), UserType::Merchant);
        let mut rx = selector.subscribe();

        selector.set_value("a1").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|r| r.id.clone()), Some("a1".to_string()));
        assert_eq!(selector.label().as_deref(), Some("Lookup (a1@acme.test)"));

        assert_eq!(selector.set_value("missing").await.unwrap(), None);
        assert!(selector.selection().is_none());
        assert!(selector.label().is_none());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_clear_emits_empty_selection() {
        let selector = EntitySelector::new(ListApi::default(), UserType::Merchant);
        let mut rx = selector.subscribe();

        selector.select(record("m1", "Acme"));
        assert!(rx.borrow_and_update().is_some());

        selector.clear();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert!(selector.selection().is_none());
    }

    #[tokio::test]
    async fn test_clear_uses_callback_when_supplied() {
        let cleared = Arc::new(AtomicUsize::new(0));
        let counter = cleared.clone();
        let selector = EntitySelector::new(ListApi::default(), UserType::Merchant)
            .with_on_clear(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let mut rx = selector.subscribe();

        selector.select(record("m1", "Acme"));
        rx.borrow_and_update();
        selector.clear();

        assert_eq!(cleared.load(Ordering::SeqCst), 1);
        assert!(!rx.has_changed().unwrap());
        assert!(selector.label().is_none());
    }
}
