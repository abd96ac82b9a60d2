use clap::error::ErrorKind;
use clap::Parser;
use fedtls::get::{report, run, ExitPolicy, Invocation};
use fedtls::{FailureKind, HttpsExecutor, MetadataRegistry, Transport};
use log::error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// GET a path from a federation member's server over pinned mutual TLS.
///
/// The server, its trusted CAs and its pinned public keys are taken from verified federation
/// metadata.
#[derive(Parser, Debug)]
#[command(name = "fedtls-get", version, about, long_about = None)]
struct Cli {
    /// Path to metadata
    #[arg(long, env = "FEDTLS_METADATA", value_name = "PATH")]
    metadata: String,

    /// Entity to connect to
    #[arg(long, value_name = "ID")]
    entity: String,

    /// Tags for servers to connect to (comma separated)
    #[arg(long, value_name = "TAGS")]
    server_tags: Option<String>,

    /// Client certificate
    #[arg(long, env = "FEDTLS_CERT", value_name = "PATH")]
    cert: PathBuf,

    /// Client private key
    #[arg(long, env = "FEDTLS_KEY", value_name = "PATH")]
    key: PathBuf,

    /// Path to GET
    #[arg(long, value_name = "SUFFIX")]
    path: String,
}

impl From<Cli> for Invocation {
    fn from(cli: Cli) -> Self {
        Self {
            metadata: cli.metadata,
            entity: cli.entity,
            server_tags: cli.server_tags.unwrap_or_default(),
            cert: cli.cert,
            key: cli.key,
            path: cli.path,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let policy = ExitPolicy::from_env();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout; anything else is an argument error on stderr.
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(policy.exit_code(Some(FailureKind::Argument))),
            };
        }
    };

    let transport = Transport::init();
    let result = run(
        &MetadataRegistry::new(),
        &HttpsExecutor::new(&transport),
        &Invocation::from(cli),
    );

    let failure = report(&result, &mut io::stdout().lock(), &mut io::stderr().lock())
        .unwrap_or_else(|e| {
            error!("failed writing output: {e}");
            Some(FailureKind::Request)
        });

    drop(transport);

    ExitCode::from(policy.exit_code(failure))
}
