//! # upctl: upload form controller
//!
//! `upctl` drives a file-processing service through its two form endpoints. A user fills in a
//! form (`product`, `version`, `app_id` and a file); the controller validates it, sends it as a
//! multipart body, and turns the answer into either a downloadable processed file or an error
//! message.
//!
//! ## Actions
//!
//! - **Upload** (`POST /upload-file/`): requires a file and a numeric `app_id`. A 2xx response
//!   body is the processed file, offered as `<name>_processed<ext>`. Failures are reported with
//!   the best message the service gave: its `error` field, then its `detail` field, then the
//!   status code.
//! - **Debug** (`POST /debug-form/`): requires only a file. Whatever JSON the echo endpoint
//!   returns is shown verbatim, pretty-printed, regardless of status.
//!
//! Both actions hold a shared, reference-counted [`busy::BusyIndicator`] while in flight, and
//! store their results in an explicit [`session::Session`] rather than global state.
//!
//! ## Layout
//!
//! The [`controller`] owns the action logic and reports through a [`presenter::Presenter`], so the
//! same core can sit behind the bundled command line front-end or any other UI. Requests go out
//! through a [`transport::FormTransport`]; [`transport::ReqwestTransport`] is the real one.
//!
//! ```no_run
//! use std::sync::Arc;
//! use upctl::{Config, controller::UploadController, form::{FormInput, SelectedFile}};
//! use upctl::{presenter::ConsolePresenter, session::Session, transport::ReqwestTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let transport = ReqwestTransport::from_config(&config)?;
//! let controller = UploadController::new(Arc::new(transport), Arc::new(ConsolePresenter), Arc::new(Session::new()));
//!
//! let input = FormInput {
//!     product: "Insights".into(),
//!     version: "2.0".into(),
//!     app_id: "12".into(),
//!     file: Some(SelectedFile::from_path("questions.xlsx").await?),
//! };
//! let processed = controller.submit(&input).await?;
//! processed.save_to("output").await?;
//! # Ok(())
//! # }
//! ```

pub mod busy;
pub mod config;
pub mod controller;
pub mod download;
pub mod errors;
pub mod filename;
pub mod form;
pub mod presenter;
pub mod session;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod test;

use std::path::PathBuf;
use std::sync::Arc;

pub use config::Config;

use crate::config::{Command, FormArgs};
use crate::controller::{Endpoints, UploadController};
use crate::errors::{Error, Result};
use crate::form::{FormInput, SelectedFile};
use crate::presenter::{ConsolePresenter, Presenter};
use crate::session::Session;
use crate::transport::{FormTransport, ReqwestTransport};

/// Command line application: one session, one controller, one presenter.
pub struct Application {
    config: Config,
    controller: Arc<UploadController>,
    presenter: Arc<dyn Presenter>,
}

impl Application {
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::from_config(&config)?;
        Ok(Self::with_parts(config, Arc::new(transport), Arc::new(ConsolePresenter)))
    }

    /// Assemble from an explicit transport and presenter.
    pub fn with_parts(config: Config, transport: Arc<dyn FormTransport>, presenter: Arc<dyn Presenter>) -> Self {
        let controller = UploadController::new(transport, presenter.clone(), Arc::new(Session::new()))
            .with_endpoints(Endpoints::from(&config));
        Self {
            config,
            controller: Arc::new(controller),
            presenter,
        }
    }

    pub fn controller(&self) -> &UploadController {
        &self.controller
    }

    /// Run one command. Failures have already been shown to the user when this returns `Err`.
    pub async fn run(&self, command: Command) -> Result<()> {
        let forwarder = self.controller.busy().forward_to(self.presenter.clone());

        let outcome = match command {
            Command::Upload { form, output_dir } => self.upload(&form, output_dir).await,
            Command::Debug { form } => self.debug(&form).await,
            Command::Both { form, output_dir } => {
                let (upload, debug) = tokio::join!(self.upload(&form, output_dir), self.debug(&form));
                upload.and(debug)
            }
        };

        // Guards are all released by now; let the presenter see the indicator go down
        forwarder.finish().await;
        // Session ends with the command; release the transient result
        self.controller.session().clear();
        outcome
    }

    async fn upload(&self, form: &FormArgs, output_dir: Option<PathBuf>) -> Result<()> {
        let input = self.read_form(form).await?;
        let processed = self.controller.submit(&input).await?;

        let dir = output_dir.unwrap_or_else(|| self.config.output_dir.clone());
        match processed.save_to(&dir).await {
            Ok(path) => {
                self.presenter.notice(&format!("Saved {}", path.display()));
                Ok(())
            }
            Err(err) => {
                err.log();
                self.presenter.alert(&format!("Could not save {} to {}", processed.filename(), dir.display()));
                Err(err)
            }
        }
    }

    async fn debug(&self, form: &FormArgs) -> Result<()> {
        let input = self.read_form(form).await?;
        self.controller.debug(&input).await?;
        Ok(())
    }

    /// Build the form from command line values, loading the selected file if one was given.
    async fn read_form(&self, form: &FormArgs) -> Result<FormInput> {
        let file = match &form.file {
            Some(path) => match SelectedFile::from_path(path).await {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to read selected file");
                    self.presenter.alert(&format!("Could not read {}: {e}", path.display()));
                    return Err(Error::Io(e));
                }
            },
            None => None,
        };

        Ok(FormInput {
            product: form.product.clone(),
            version: form.version.clone(),
            app_id: form.app_id.clone(),
            file,
        })
    }
}
