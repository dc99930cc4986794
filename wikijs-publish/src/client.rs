#![doc = "Wiki.js GraphQL client: implements the core `WikiApi` contract on top of `HttpTransport`."]
//
//! # Wiki.js client
//!
//! Maps the three operations the pipeline needs onto Wiki.js GraphQL documents:
//! - `pages.list` for the page directory,
//! - `pages.create` and `pages.update` for publishing.
//!
//! Responses are checked for shape here; HTTP-level classification happens in
//! [`crate::transport`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use wikijs_publish_core::contract::{MutationResult, PageInput, RemotePage, WikiApi};
use wikijs_publish_core::PublishError;

use crate::transport::HttpTransport;

const LIST_PAGES: &str = "query { pages { list { id path title } } }";

const CREATE_PAGE: &str = "mutation ($content: String!, $description: String!, $editor: String!, $isPublished: Boolean!, $isPrivate: Boolean!, $locale: String!, $path: String!, $tags: [String]!, $title: String!) { pages { create(content: $content, description: $description, editor: $editor, isPublished: $isPublished, isPrivate: $isPrivate, locale: $locale, path: $path, tags: $tags, title: $title) { responseResult { succeeded errorCode slug message } page { id } } } }";

const UPDATE_PAGE: &str = "mutation ($id: Int!, $content: String!, $description: String!, $editor: String!, $isPublished: Boolean!, $isPrivate: Boolean!, $locale: String!, $path: String!, $tags: [String]!, $title: String!) { pages { update(id: $id, content: $content, description: $description, editor: $editor, isPublished: $isPublished, isPrivate: $isPrivate, locale: $locale, path: $path, tags: $tags, title: $title) { responseResult { succeeded errorCode slug message } } } }";

#[derive(Debug, Deserialize)]
struct ListedPage {
    id: i64,
    path: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseResult {
    succeeded: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

pub struct WikiJsClient {
    transport: HttpTransport,
}

impl WikiJsClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    async fn mutate(
        &self,
        document: &str,
        operation: &str,
        variables: Value,
    ) -> Result<MutationResult, PublishError> {
        let body = self.transport.graphql(document, variables).await?;
        let pointer = format!("/data/pages/{operation}/responseResult");
        let Some(raw_result) = body.pointer(&pointer) else {
            let message = first_graphql_error(&body)
                .unwrap_or_else(|| format!("response has no {operation} result"));
            tracing::error!(operation, message = %message, "Mutation returned no result");
            return Err(PublishError::RemoteMutationFailure { message });
        };
        let result: ResponseResult = serde_json::from_value(raw_result.clone()).map_err(|e| {
            PublishError::ResponseFormatError(format!("unexpected {operation} result: {e}"))
        })?;
        let page_id = body
            .pointer(&format!("/data/pages/{operation}/page/id"))
            .and_then(Value::as_i64);

        tracing::info!(
            operation,
            succeeded = result.succeeded,
            error_code = result.error_code.unwrap_or_default(),
            "Mutation completed"
        );
        Ok(MutationResult {
            succeeded: result.succeeded,
            error_code: result.error_code.unwrap_or_default(),
            message: result.message,
            page_id,
        })
    }
}

fn first_graphql_error(body: &Value) -> Option<String> {
    body.get("errors")?
        .as_array()?
        .iter()
        .find_map(|e| e.get("message").and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl WikiApi for WikiJsClient {
    async fn list_pages(&self) -> Result<Vec<RemotePage>, PublishError> {
        let body = self.transport.graphql(LIST_PAGES, Value::Object(Default::default())).await?;
        let Some(list) = body.pointer("/data/pages/list").filter(|v| v.is_array()) else {
            let reason = first_graphql_error(&body)
                .unwrap_or_else(|| "response has no data.pages.list".to_string());
            tracing::error!(reason = %reason, "Unexpected page listing response");
            return Err(PublishError::RemoteFetchError(reason));
        };
        let pages: Vec<ListedPage> = serde_json::from_value(list.clone())
            .map_err(|e| PublishError::RemoteFetchError(format!("malformed page entry: {e}")))?;
        Ok(pages
            .into_iter()
            .map(|p| RemotePage {
                id: p.id,
                path: p.path,
                title: p.title.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_page(&self, input: &PageInput) -> Result<MutationResult, PublishError> {
        tracing::info!(path = %input.path, "Creating page");
        let variables = serde_json::to_value(input)
            .map_err(|e| PublishError::ResponseFormatError(format!("cannot encode page: {e}")))?;
        self.mutate(CREATE_PAGE, "create", variables).await
    }

    async fn update_page(
        &self,
        id: i64,
        input: &PageInput,
    ) -> Result<MutationResult, PublishError> {
        tracing::info!(id, path = %input.path, "Updating page");
        let mut variables = serde_json::to_value(input)
            .map_err(|e| PublishError::ResponseFormatError(format!("cannot encode page: {e}")))?;
        if let Value::Object(map) = &mut variables {
            map.insert("id".to_string(), Value::from(id));
        }
        self.mutate(UPDATE_PAGE, "update", variables).await
    }
}
