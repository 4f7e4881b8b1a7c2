use crate::cli::SmokeArgs;

use anyhow::{bail, Context as AnyhowContext, Result};
use rzmq_lifecycle::{ContextOptions, LifecycleManager, ManagerConfig, SocketType, TeardownPolicy};

pub fn run(args: SmokeArgs) -> Result<()> {
  if args.sockets == 0 {
    bail!("--sockets must be at least 1");
  }
  let socket_type = parse_pattern(&args.pattern)?;
  let policy = match args.policy.as_str() {
    "force" => TeardownPolicy::ForceClose,
    _ => TeardownPolicy::Reject,
  };

  let manager = LifecycleManager::with_config(ManagerConfig {
    defaults: ContextOptions {
      io_threads: args.io_threads,
      ..ContextOptions::default()
    },
    policy,
    ..ManagerConfig::default()
  });

  let ctx = manager.open_context().context("Failed to open context")?;
  println!("[1] Context {} opened ({:?})", ctx.id(), policy);

  let mut sockets = Vec::with_capacity(args.sockets);
  for _ in 0..args.sockets {
    let socket = manager
      .open_socket(&ctx, socket_type)
      .with_context(|| format!("Failed to open {} socket", socket_type))?;
    println!("[2] Socket {} opened ({})", socket.id(), socket_type);
    sockets.push(socket);
  }

  if args.skip_socket_close {
    println!("[3] Skipping socket close; {} still open", ctx.open_socket_count());
  } else {
    // Innermost first.
    for socket in sockets.iter().rev() {
      manager
        .close_socket(socket)
        .with_context(|| format!("Failed to close socket {}", socket.id()))?;
      println!("[3] Socket {} closed", socket.id());
    }
  }

  manager
    .close_context(&ctx)
    .with_context(|| format!("Failed to close context {}", ctx.id()))?;
  println!("[4] Context {} closed", ctx.id());

  for socket in &sockets {
    println!("    socket {} -> {}", socket.id(), socket.state());
  }
  println!("    context {} -> {}", ctx.id(), ctx.state());
  Ok(())
}

fn parse_pattern(pattern: &str) -> Result<SocketType> {
  let parsed = match pattern.trim().parse::<i32>() {
    Ok(raw) => SocketType::try_from(raw),
    Err(_) => pattern.parse::<SocketType>(),
  };
  parsed.with_context(|| format!("Unrecognized socket pattern '{}'", pattern))
}
