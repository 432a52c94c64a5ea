//! The upload form controller.
//!
//! Two independent actions share one [`Session`], one [`BusyIndicator`] and one [`Presenter`]:
//!
//! - [`UploadController::submit`] validates the form (file and numeric `app_id`), POSTs it to the
//!   processing endpoint and offers the returned file for download, or alerts an error.
//! - [`UploadController::debug`] validates only the file, POSTs the same body to the echo
//!   endpoint and shows the JSON it returns, whatever the status.
//!
//! Neither action retries. Each holds the busy indicator from dispatch until its response has
//! been handled.

use std::sync::Arc;

use serde_json::Value;

use crate::busy::BusyIndicator;
use crate::config::Config;
use crate::download::ProcessedFile;
use crate::errors::{Error, Result};
use crate::form::{FormInput, FormSnapshot};
use crate::presenter::Presenter;
use crate::session::Session;
use crate::transport::{FormTransport, HttpResponse};

pub const DEFAULT_UPLOAD_PATH: &str = "/upload-file/";
pub const DEFAULT_DEBUG_PATH: &str = "/debug-form/";

/// Shown in the debug region when the echo endpoint gave no usable answer.
pub const DEBUG_ERROR_MESSAGE: &str = "Error contacting debug endpoint.";

/// Paths of the two endpoints, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub upload_path: String,
    pub debug_path: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            debug_path: DEFAULT_DEBUG_PATH.to_string(),
        }
    }
}

impl From<&Config> for Endpoints {
    fn from(config: &Config) -> Self {
        Self {
            upload_path: config.upload_path.clone(),
            debug_path: config.debug_path.clone(),
        }
    }
}

/// What the debug region shows after a debug submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    /// The echo endpoint answered with JSON (any status)
    Echo { status: u16, body: Value },
    /// No response, or a response that was not JSON
    Unreachable,
}

impl DebugOutput {
    /// Text for the debug region: the pretty-printed JSON, or the fixed error message.
    pub fn render(&self) -> String {
        match self {
            DebugOutput::Echo { body, .. } => serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string()),
            DebugOutput::Unreachable => DEBUG_ERROR_MESSAGE.to_string(),
        }
    }
}

pub struct UploadController {
    transport: Arc<dyn FormTransport>,
    presenter: Arc<dyn Presenter>,
    session: Arc<Session>,
    busy: BusyIndicator,
    endpoints: Endpoints,
}

impl UploadController {
    pub fn new(transport: Arc<dyn FormTransport>, presenter: Arc<dyn Presenter>, session: Arc<Session>) -> Self {
        Self {
            transport,
            presenter,
            session,
            busy: BusyIndicator::new(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Share an existing indicator, e.g. one already wired to a front-end.
    pub fn with_busy_indicator(mut self, busy: BusyIndicator) -> Self {
        self.busy = busy;
        self
    }

    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Primary submit: upload the form and offer the processed file for download.
    ///
    /// Every failure is alerted through the presenter before being returned, so callers only
    /// need the `Result` to decide what happens next.
    pub async fn submit(&self, input: &FormInput) -> Result<Arc<ProcessedFile>> {
        let snapshot = input.validate_for_upload().map_err(|err| self.report(err.into()))?;

        // Held until the outcome has been presented
        let _busy = self.busy.acquire();
        match self.upload(&snapshot).await {
            Ok(file) => {
                self.presenter.show_download(&file);
                Ok(file)
            }
            Err(err) => Err(self.report(err)),
        }
    }

    async fn upload(&self, snapshot: &FormSnapshot) -> Result<Arc<ProcessedFile>> {
        tracing::info!(
            filename = %snapshot.file.filename,
            product = %snapshot.product,
            version = %snapshot.version,
            app_id = %snapshot.app_id,
            "Uploading file for processing"
        );

        let response = self.transport.post_form(&self.endpoints.upload_path, snapshot).await?;
        if !response.is_success() {
            return Err(Error::Application {
                status: response.status,
                message: application_error_message(&response),
            });
        }

        let file = ProcessedFile::create(&snapshot.file.filename, response.body).await?;
        Ok(self.session.replace_result(file))
    }

    /// Debug submit: send the same form to the echo endpoint and show what came back.
    ///
    /// Only a missing file is an error here; transport failures end up in the debug region
    /// as [`DebugOutput::Unreachable`].
    pub async fn debug(&self, input: &FormInput) -> Result<DebugOutput> {
        let snapshot = input.validate_for_debug().map_err(|err| self.report(err.into()))?;

        let _busy = self.busy.acquire();
        tracing::info!(filename = %snapshot.file.filename, "Submitting form to debug endpoint");

        let output = match self.transport.post_form(&self.endpoints.debug_path, &snapshot).await {
            Ok(response) => match serde_json::from_slice::<Value>(&response.body) {
                Ok(body) => DebugOutput::Echo {
                    status: response.status,
                    body,
                },
                Err(e) => {
                    tracing::error!(status = response.status, error = %e, "Debug endpoint returned a non-JSON body");
                    DebugOutput::Unreachable
                }
            },
            Err(e) => {
                tracing::error!("Failed to contact debug endpoint: {:#}", e);
                DebugOutput::Unreachable
            }
        };

        self.session.set_debug_output(output.clone());
        self.presenter.show_debug(&output.render());
        Ok(output)
    }

    /// Log and alert an error, handing it back for the caller to return.
    fn report(&self, err: Error) -> Error {
        err.log();
        self.presenter.alert(&err.user_message());
        err
    }
}

/// Pick the best message from a failed response: `error`, then `detail` (as JSON), then the
/// status code. A body that is not JSON falls back to the status code.
pub fn application_error_message(response: &HttpResponse) -> String {
    let Ok(body) = serde_json::from_slice::<Value>(&response.body) else {
        return response.status.to_string();
    };

    match (present(body.get("error")), present(body.get("detail"))) {
        (Some(Value::String(error)), _) => error.clone(),
        (Some(error), _) => error.to_string(),
        (None, Some(detail)) => detail.to_string(),
        (None, None) => response.status.to_string(),
    }
}

/// Treat JSON `null` the same as a missing field.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
