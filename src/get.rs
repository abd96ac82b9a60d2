//! Entry orchestration: parse tags, resolve, assemble, execute, and report.
//!
//! Resolution failures abort before any network activity. Request failures are reported but do
//! not make the invocation itself fail; whether they affect the process exit code is decided by
//! the [`ExitPolicy`].

use crate::error::{Error, FailureKind};
use crate::metadata::TrustRegistry;
use crate::params::assemble;
use crate::tags::parse_tags;
use crate::transport::{RequestError, RequestExecutor, Response};
use log::{debug, warn};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

/// Environment variable selecting [`ExitPolicy::ByFailureKind`] when set to `1`, `true` or `yes`.
pub const STRICT_EXIT_ENV: &str = "FEDTLS_STRICT_EXIT";

/// Prefix of the diagnostic printed when the request fails.
pub const REQUEST_FAILED_PREFIX: &str = "Failed to perform GET: ";

/// Inputs of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Metadata source: a path or `file://` URL.
    pub metadata: String,
    /// Identifier of the entity to connect to.
    pub entity: String,
    /// Comma separated server tags; empty for no filter.
    pub server_tags: String,
    /// PEM client certificate.
    pub cert: PathBuf,
    /// PEM client private key.
    pub key: PathBuf,
    /// Path appended to the server's base URL.
    pub path: String,
}

/// How an invocation that got past resolution ended.
#[derive(Debug)]
pub enum Outcome {
    /// The exchange completed.
    Completed(Response),
    /// The request failed at the transport level.
    RequestFailed(RequestError),
}

/// Runs one resolve-then-request invocation.
///
/// The executor is only invoked after a successful resolution, and the CA store of the resolved
/// server stays alive until it returns.
///
/// # Errors
///
/// Returns [`Error::Resolution`] if the registry cannot resolve the entity. Request failures are
/// returned as [`Outcome::RequestFailed`].
pub fn run<R, E>(registry: &R, executor: &E, invocation: &Invocation) -> Result<Outcome, Error>
where
    R: TrustRegistry + ?Sized,
    E: RequestExecutor + ?Sized,
{
    let tags = parse_tags(&invocation.server_tags);
    debug!("resolving {} with tags {tags:?}", invocation.entity);

    let conn = registry.resolve(&invocation.metadata, &invocation.entity, &tags)?;
    let params = assemble(&conn, &invocation.path, &invocation.cert, &invocation.key);

    let outcome = match executor.execute_get(&params) {
        Ok(response) => Outcome::Completed(response),
        Err(e) => {
            warn!("GET {} failed: {e}", params.server_url);
            Outcome::RequestFailed(e)
        }
    };

    // `conn` (and its CA store) is released only here, after the executor returned.
    drop(conn);

    Ok(outcome)
}

/// Writes the result of [`run`]: the response body to `out`, one diagnostic line per failure to
/// `err`.
///
/// Returns the kind of failure reported, if any.
///
/// # Errors
///
/// Returns an IO error if writing to `out` or `err` fails.
pub fn report<O, W>(
    result: &Result<Outcome, Error>,
    out: &mut O,
    err: &mut W,
) -> io::Result<Option<FailureKind>>
where
    O: Write + ?Sized,
    W: Write + ?Sized,
{
    match result {
        Ok(Outcome::Completed(response)) => {
            out.write_all(&response.body)?;
            out.flush()?;
            Ok(None)
        }
        Ok(Outcome::RequestFailed(e)) => {
            writeln!(err, "{REQUEST_FAILED_PREFIX}{e}")?;
            Ok(Some(FailureKind::Request))
        }
        Err(e) => {
            writeln!(err, "{e}")?;
            Ok(Some(e.kind()))
        }
    }
}

/// Maps the reported failure of an invocation to a process exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Exit 0 whatever happened; failures are visible on stderr only.
    #[default]
    AlwaysSuccess,
    /// Exit with [`FailureKind::exit_code`] on failure, 0 otherwise.
    ByFailureKind,
}

impl ExitPolicy {
    /// Reads the policy from [`STRICT_EXIT_ENV`].
    pub fn from_env() -> Self {
        Self::from_env_value(env::var(STRICT_EXIT_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1" | "true" | "yes") => ExitPolicy::ByFailureKind,
            _ => ExitPolicy::AlwaysSuccess,
        }
    }

    /// Returns the exit code for an invocation that reported `failure`.
    pub fn exit_code(self, failure: Option<FailureKind>) -> u8 {
        match (self, failure) {
            (ExitPolicy::ByFailureKind, Some(kind)) => kind.exit_code(),
            _ => 0,
        }
    }
}
