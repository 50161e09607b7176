use crate::domain::model::Workbook;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 遠端服務的介面：一個已登入的 session
#[async_trait]
pub trait WorkbookService: Send + Sync {
    /// Every workbook visible to the session, in server order.
    async fn list_workbooks(&self) -> Result<Vec<Workbook>>;

    /// `Ok(None)` when the server does not know the id.
    async fn get_workbook(&self, workbook_id: &str) -> Result<Option<Workbook>>;

    /// Raw XML describing what the workbook loses at `product_version`.
    async fn get_degradations(&self, workbook_id: &str, product_version: &str) -> Result<String>;
}
