use criterion::{criterion_group, criterion_main, Criterion};
use kv_probe::thread_pool::{SharedQueueThreadPool, ThreadPool};
use kv_probe::{probe, KvClient, KvServer, MemoryStore};
use std::thread;

fn probe_round_trips(c: &mut Criterion) {
    let pool = SharedQueueThreadPool::new(2).unwrap();
    let server = KvServer::new("127.0.0.1:0", MemoryStore::new(), pool).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle().unwrap();
    // get the server running on the other thread
    let join_handle = thread::spawn(move || server.run().unwrap());

    let mut group = c.benchmark_group("client_round_trips");
    let mut client = KvClient::connect(addr).expect("Cannot Connect");

    group.bench_function("set_get", |b| {
        b.iter(|| {
            client.set("key".to_owned(), "value".to_owned()).unwrap();
            client.get("key".to_owned()).unwrap()
        })
    });

    group.bench_function("strings_probe", |b| {
        b.iter(|| probe::run_strings(&mut client, "c", "xxxxx").unwrap())
    });

    group.finish();

    // the pool only joins once every connection is closed
    client.shutdown().expect("Cannot Shutdown");
    shutdown.shutdown();
    join_handle.join().unwrap();
}

criterion_group!(benches, probe_round_trips);
criterion_main!(benches);
