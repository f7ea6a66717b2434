use crate::action::{Action, HttpMethod, Params, UploadFile};
use crate::response::Response;
use crate::transport::TransportRequest;
use crate::{Error, Result};
use std::path::Path;
use tracing::info;

use super::core::MediawikiClient;

pub const DEFAULT_PROTECTIONS: &str = "edit=sysop|move=sysop";

impl MediawikiClient {
    /// Edit a page. A `Failure` result is returned as [`Error::Edit`] carrying the response.
    pub async fn edit(&self, params: impl Into<Params>) -> Result<Response> {
        let response = self
            .dispatch(Action::from_params("edit", params.into())?)
            .await?;
        if response.data_str("result") == Some("Failure") {
            info!("edit reported failure");
            return Err(Error::Edit(Box::new(response)));
        }
        Ok(response)
    }

    pub async fn create_page(&self, title: &str, text: &str) -> Result<Response> {
        self.create_page_with(title, text, Params::new()).await
    }

    /// Create a page with extra edit options (summary, bot, ...).
    pub async fn create_page_with(
        &self,
        title: &str,
        text: &str,
        options: Params,
    ) -> Result<Response> {
        self.edit(options.with("title", title).with("text", text))
            .await
    }

    pub async fn delete_page(&self, title: &str, reason: &str) -> Result<Response> {
        self.action("delete", [("title", title), ("reason", reason)])
            .await
    }

    /// Protect a page; `None` uses [`DEFAULT_PROTECTIONS`].
    pub async fn protect_page(
        &self,
        title: &str,
        reason: &str,
        protections: Option<&str>,
    ) -> Result<Response> {
        let protections = protections.unwrap_or(DEFAULT_PROTECTIONS);
        self.action(
            "protect",
            [
                ("title", title),
                ("reason", reason),
                ("protections", protections),
            ],
        )
        .await
    }

    pub async fn watch_page(&self, title: &str) -> Result<Response> {
        self.dispatch(Action::new("watch").token_type("watch").param("titles", title))
            .await
    }

    pub async fn unwatch_page(&self, title: &str) -> Result<Response> {
        self.dispatch(
            Action::new("watch")
                .token_type("watch")
                .param("titles", title)
                .param("unwatch", true),
        )
        .await
    }

    /// Raw wikitext of a page, fetched from `index.php?action=raw`.
    pub async fn get_wikitext(&self, title: &str) -> Result<String> {
        let params = Params::new()
            .with("action", "raw")
            .with("title", title)
            .compile();
        self.fetch_text(TransportRequest {
            method: HttpMethod::Get,
            url: self.index_url.clone(),
            params,
        })
        .await
    }

    /// Upload a PNG image as multipart form data. `text` defaults to `comment`.
    pub async fn upload_image(
        &self,
        filename: &str,
        path: impl AsRef<Path>,
        comment: &str,
        ignore_warnings: bool,
        text: Option<&str>,
    ) -> Result<Response> {
        let file = UploadFile::from_path(path).await?.with_mime("image/png");
        self.dispatch(
            Action::new("upload")
                .param("filename", filename)
                .param("file", file)
                .param("comment", comment)
                .param("text", text.unwrap_or(comment))
                .param("ignorewarnings", ignore_warnings),
        )
        .await
    }
}
