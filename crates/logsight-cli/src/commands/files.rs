//! Log file command implementation.

use std::io::Write;
use std::path::Path;

use logsight_client::{Console, MultipartForm, Transport};
use tracing::info;

use super::enter_view;
use crate::cli::FileCommands;
use crate::error::CliError;
use crate::output::{FileList, OutputFormat};

/// Multipart field the server reads the upload from.
const UPLOAD_FIELD: &str = "file";

/// Handler for file subcommands.
pub struct FileCommand<'a, T> {
    console: &'a Console<T>,
}

impl<'a, T: Transport> FileCommand<'a, T> {
    /// Creates a new file command handler.
    #[must_use]
    pub const fn new(console: &'a Console<T>) -> Self {
        Self { console }
    }

    /// Executes the file subcommand.
    ///
    /// # Errors
    ///
    /// Returns error if the session is missing or the request fails.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &FileCommands,
    ) -> Result<(), CliError> {
        match command {
            FileCommands::List { page, per_page } => {
                self.list(out, format, *page, *per_page).await
            }
            FileCommands::Show { id } => self.show(out, format, *id).await,
            FileCommands::Upload { path } => self.upload(out, format, path).await,
            FileCommands::Delete { id } => self.delete(out, format, *id).await,
        }
    }

    async fn list<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        page: Option<u32>,
        per_page: u32,
    ) -> Result<(), CliError> {
        enter_view(self.console, "/files")?;
        let store = self.console.store();

        let list = match page {
            Some(page) => {
                if page == 0 || per_page == 0 {
                    return Err(CliError::InvalidArgument(
                        "page and per-page start at 1".into(),
                    ));
                }
                let page = store.fetch_log_files_page(page, per_page).await?;
                FileList {
                    total: page.total,
                    page: Some(page.current_page),
                    pages: Some(page.pages),
                    files: page.files,
                }
            }
            None => {
                let files = store.fetch_log_files().await?;
                FileList {
                    total: files.len() as u64,
                    page: None,
                    pages: None,
                    files,
                }
            }
        };

        format.write(out, &list)
    }

    async fn show<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: u64,
    ) -> Result<(), CliError> {
        enter_view(self.console, "/files")?;
        let file = self.console.store().fetch_log_file(id).await?;
        format.write(out, &file)
    }

    async fn upload<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        path: &Path,
    ) -> Result<(), CliError> {
        enter_view(self.console, "/upload")?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CliError::InvalidArgument(format!("{} is not a file name", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        info!(file = %name, size = bytes.len(), "uploading");

        let form = MultipartForm::new().file(UPLOAD_FIELD, name, bytes);
        let receipt = self.console.store().upload_log_file(form).await?;
        format.write(out, &receipt)
    }

    async fn delete<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: u64,
    ) -> Result<(), CliError> {
        enter_view(self.console, "/files")?;
        let ack = self.console.store().delete_log_file(id).await?;
        format.write(out, &ack)
    }
}
