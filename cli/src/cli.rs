use clap::{builder::TypedValueParser, Parser};

#[derive(Parser, Debug)]
#[clap(name = "rzmq-lifecycle", version, about = "rzmq_lifecycle Command Line Utility")]
pub struct Cli {
  #[clap(subcommand)]
  pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
  /// Open a context and sockets, then release them in reverse order
  Smoke(SmokeArgs),
  /// List the recognized socket patterns and their numeric IDs
  Patterns,
}

#[derive(Parser, Debug)]
pub struct SmokeArgs {
  /// Socket pattern to open (name such as REQ/REQUEST, or numeric ID)
  #[clap(long, short, default_value = "REQ")]
  pub pattern: String,

  /// Number of sockets to open on the context
  #[clap(long, short, default_value_t = 1)]
  pub sockets: usize,

  /// I/O threads for the context runtime (0 = no dedicated threads)
  #[clap(long, default_value_t = 1)]
  pub io_threads: usize,

  /// What closing the context does with sockets that are still open
  #[clap(long, value_parser = clap::builder::PossibleValuesParser::new(["reject", "force"]).map(|s| s.to_lowercase()), default_value = "reject")]
  pub policy: String,

  /// Leave the sockets open and go straight to closing the context
  #[clap(long, action)]
  pub skip_socket_close: bool,
}
