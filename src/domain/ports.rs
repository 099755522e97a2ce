use crate::domain::api::{
    CreateAccountRequest, CreateContractRequest, CreateRouterRequest, OperatorProfile,
    RegisterUserRequest, UserListQuery, UserPage,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 後台開戶 API
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// 回傳新使用者 id
    async fn register_user(&self, request: &RegisterUserRequest) -> Result<String>;
    async fn list_users(&self, query: &UserListQuery) -> Result<UserPage>;
    async fn create_account(&self, request: &CreateAccountRequest) -> Result<()>;
    async fn create_contract(&self, request: &CreateContractRequest) -> Result<()>;
    async fn create_router(&self, request: &CreateRouterRequest) -> Result<()>;
    async fn current_operator(&self) -> Result<OperatorProfile>;
}
