// benches/lifecycle_throughput.rs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rzmq_lifecycle::{ContextOptions, LifecycleManager, ManagerConfig, SocketType, TeardownPolicy};
use std::time::Duration;

// --- Benchmarking Constants ---
const SOCKET_BATCHES: [usize; 3] = [1, 16, 256];

fn bench_manager(policy: TeardownPolicy) -> LifecycleManager {
  LifecycleManager::with_config(ManagerConfig {
    defaults: ContextOptions {
      io_threads: 1,
      linger: Duration::from_millis(10),
      ..ContextOptions::default()
    },
    policy,
    ..ManagerConfig::default()
  })
}

// Socket open/close on an already-open context; no runtime start-up in the loop.
fn socket_open_close(c: &mut Criterion) {
  let manager = bench_manager(TeardownPolicy::Reject);
  let ctx = manager.open_context().expect("Context open failed");

  let mut group = c.benchmark_group("Socket_Open_Close");
  for &batch in SOCKET_BATCHES.iter() {
    group.throughput(Throughput::Elements(batch as u64));
    group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
      b.iter(|| {
        let sockets: Vec<_> = (0..batch)
          .map(|_| ctx.socket(SocketType::Dealer).expect("Socket open failed"))
          .collect();
        for socket in sockets.iter().rev() {
          socket.close().expect("Socket close failed");
        }
        black_box(sockets);
      });
    });
  }
  group.finish();

  ctx.close().expect("Context close failed");
}

// Full lifecycle including the context runtime, with sockets left for ForceClose.
fn context_teardown(c: &mut Criterion) {
  let manager = bench_manager(TeardownPolicy::ForceClose);

  let mut group = c.benchmark_group("Context_Force_Teardown");
  group.sample_size(20);
  for &batch in SOCKET_BATCHES.iter() {
    group.throughput(Throughput::Elements(batch as u64));
    group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
      b.iter(|| {
        let ctx = manager.open_context().expect("Context open failed");
        let sockets: Vec<_> = (0..batch)
          .map(|_| ctx.socket(SocketType::Pub).expect("Socket open failed"))
          .collect();
        ctx.close().expect("Context close failed");
        black_box(sockets);
      });
    });
  }
  group.finish();
}

criterion_group!(benches, socket_open_close, context_teardown);
criterion_main!(benches);
