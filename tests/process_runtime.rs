// tests/process_runtime.rs
//
// These tests observe process-wide state (`live_runtimes()` and the default
// manager), so every test here runs serially.

use rzmq_lifecycle::backend::live_runtimes;
use rzmq_lifecycle::{default_manager, HandleState, LifecycleError, SocketType, TeardownPolicy};
use serial_test::serial;

mod common;

#[test]
#[serial]
fn test_each_context_owns_one_runtime() -> Result<(), LifecycleError> {
  let manager = common::test_manager(TeardownPolicy::Reject);
  let before = live_runtimes();

  let first = manager.open_context()?;
  let second = manager.open_context()?;
  assert_eq!(live_runtimes(), before + 2);

  first.close()?;
  assert_eq!(live_runtimes(), before + 1);
  drop(second);
  assert_eq!(live_runtimes(), before);
  Ok(())
}

#[test]
#[serial]
fn test_failed_open_does_not_leak_runtime() -> Result<(), LifecycleError> {
  let (manager, backend) = common::faulty_manager(TeardownPolicy::Reject);
  let before = live_runtimes();

  backend.fail_create_context.store(true, std::sync::atomic::Ordering::SeqCst);
  assert!(manager.open_context().is_err());
  assert_eq!(live_runtimes(), before);
  Ok(())
}

#[test]
#[serial]
fn test_context_outlives_its_manager() -> Result<(), LifecycleError> {
  let manager = common::test_manager(TeardownPolicy::Reject);
  let before = live_runtimes();
  let ctx = manager.open_context()?;
  drop(manager);

  // The context keeps its backend alive.
  assert_eq!(ctx.state(), HandleState::Open);
  let sock = ctx.socket(SocketType::Pair)?;
  sock.close()?;
  assert_eq!(live_runtimes(), before + 1);

  drop(ctx);
  assert_eq!(live_runtimes(), before);
  Ok(())
}

#[test]
#[serial]
fn test_default_context_function() -> Result<(), LifecycleError> {
  common::setup_tracing();
  let before = default_manager().open_context_count();

  let ctx = rzmq_lifecycle::context()?;
  assert_eq!(default_manager().open_context_count(), before + 1);
  assert_eq!(ctx.teardown_policy(), TeardownPolicy::Reject);

  let requester = ctx.socket("REQ")?;
  requester.close()?;
  ctx.close()?;
  assert_eq!(default_manager().open_context_count(), before);
  Ok(())
}
