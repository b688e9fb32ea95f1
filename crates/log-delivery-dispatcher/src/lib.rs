//! Delivery of decrypted log content.
//!
//! The [`Dispatcher`] applies the configured steps in a fixed order:
//! syslog, local append, SFTP upload, local compression. Files that cannot be
//! processed are kept verbatim by [`Quarantine`].

mod compress;
mod dispatcher;
mod error;
mod quarantine;
mod selector;
mod sftp;
mod syslog;

pub use compress::{append_local, gzip_file};
pub use dispatcher::{DeliveryReport, DispatchSettings, Dispatcher, StepOutcome};
pub use error::{DeliveryError, DeliveryResult};
pub use quarantine::Quarantine;
pub use selector::{EndpointSelector, RandomSelector};
pub use sftp::{default_sftp_uploader, SftpUploader};
#[cfg(feature = "sftp")]
pub use sftp::Ssh2Uploader;
pub use syslog::{SyslogTransport, TcpSyslogTransport};
