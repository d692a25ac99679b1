use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde_json::json;

use super::store::{StoreError, TableStore};
use super::types::{PageParams, Record, RecordPage, TableList, TableMeta, TableSchema, ID_FIELD};
use crate::retry::RetryPolicy;

/// NocoDB v2 REST client authenticated with a static `xc-token`.
#[derive(Debug, Clone)]
pub struct NocoClient {
    http: Client,
    base_url: String,
    api_token: String,
    base_id: Option<String>,
    retry: RetryPolicy,
}

impl NocoClient {
    pub fn new(http: Client, base_url: &str, api_token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            base_id: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Base (project) id, needed only for the table metadata endpoints.
    pub fn with_base_id(mut self, base_id: String) -> Self {
        self.base_id = Some(base_id);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, StoreError> {
        let raw = format!("{}/api/v2{}", self.base_url, path);
        Url::parse_with_params(&raw, query).map_err(|e| StoreError::Unexpected(format!("bad URL {raw}: {e}")))
    }

    fn tables_path(&self) -> Result<String, StoreError> {
        let base = self.base_id.as_deref().ok_or(StoreError::MissingBaseId)?;
        Ok(format!("/meta/bases/{base}/tables"))
    }

    /// Send one request under the retry policy and fail on any non-2xx status.
    async fn send<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Response, StoreError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let path = url.path().to_string();
        self.retry
            .run("nocodb", |_| {
                let mut req = self
                    .http
                    .request(method.clone(), url.clone())
                    .header("xc-token", &self.api_token);
                if let Some(body) = body {
                    req = req.json(body);
                }
                let method = method.clone();
                let path = path.clone();
                async move {
                    let resp = req.send().await?;
                    ensure_success(method, path, resp).await
                }
            })
            .await
    }
}

async fn ensure_success(method: Method, path: String, resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        method: method.to_string(),
        path,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TableStore for NocoClient {
    async fn list_tables(&self) -> Result<Vec<TableMeta>, StoreError> {
        let url = self.url(&self.tables_path()?, &[])?;
        let resp = self.send::<()>(Method::GET, url, None).await?;
        let tables: TableList = resp.json().await?;
        Ok(tables.list)
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<TableMeta, StoreError> {
        let url = self.url(&self.tables_path()?, &[])?;
        let resp = self.send(Method::POST, url, Some(schema)).await?;
        let meta: TableMeta = resp.json().await?;
        Ok(meta)
    }

    async fn get_records(&self, table_id: &str, params: &PageParams) -> Result<RecordPage, StoreError> {
        let url = self.url(&format!("/tables/{table_id}/records"), &params.to_query())?;
        let resp = self.send::<()>(Method::GET, url, None).await?;
        let page: RecordPage = resp.json().await?;
        Ok(page)
    }

    async fn insert_records(&self, table_id: &str, records: &[Record]) -> Result<(), StoreError> {
        let url = self.url(&format!("/tables/{table_id}/records"), &[])?;
        self.send(Method::POST, url, Some(records)).await?;
        Ok(())
    }

    async fn update_records(&self, table_id: &str, records: &[Record]) -> Result<(), StoreError> {
        let url = self.url(&format!("/tables/{table_id}/records"), &[])?;
        self.send(Method::PATCH, url, Some(records)).await?;
        Ok(())
    }

    async fn delete_records(&self, table_id: &str, ids: &[i64]) -> Result<(), StoreError> {
        let url = self.url(&format!("/tables/{table_id}/records"), &[])?;
        let body: Vec<_> = ids.iter().map(|id| json!({ ID_FIELD: id })).collect();
        self.send(Method::DELETE, url, Some(&body)).await?;
        Ok(())
    }
}
