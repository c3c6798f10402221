use spscring::{CachedCursorBuffer, Config, RetryPolicy, SharedRing};
use std::thread;
use std::time::Instant;

/// A market-data style record: fixed size, `Copy`, no heap pointers.
#[derive(Debug, Clone, Copy)]
struct Tick {
    seq: u64,
    price: f64,
    qty: u32,
}

fn main() {
    println!("spscring Pipeline Example");
    println!("=========================\n");

    const TICKS: u64 = 5_000_000;
    let config = Config::from_bits(14).with_metrics(true);

    println!("Configuration:");
    println!("  Ring capacity: {} slots", config.capacity);
    println!("  Item size: {} bytes", std::mem::size_of::<Tick>());
    println!("  Total items: {TICKS}\n");

    let (mut tx, mut rx) = CachedCursorBuffer::<Tick>::with_config(config)
        .expect("valid configuration")
        .split();

    let start = Instant::now();

    let producer = thread::spawn(move || {
        let policy = RetryPolicy::Adaptive;
        let mut backoff = spscring::Backoff::new();
        for seq in 0..TICKS {
            let tick = Tick {
                seq,
                price: 100.0 + (seq % 100) as f64 * 0.01,
                qty: (seq % 7) as u32 + 1,
            };
            while !tx.enqueue(tick) {
                policy.pause(&mut backoff);
            }
            backoff.reset();
        }
    });

    let policy = RetryPolicy::Adaptive;
    let mut backoff = spscring::Backoff::new();
    let mut notional = 0.0;
    let mut next = 0;
    while next < TICKS {
        match rx.dequeue() {
            Some(tick) => {
                assert_eq!(tick.seq, next, "out of order tick");
                notional += tick.price * f64::from(tick.qty);
                next += 1;
                backoff.reset();
            }
            None => policy.pause(&mut backoff),
        }
    }

    producer.join().unwrap();
    let elapsed = start.elapsed();
    let m = rx.metrics();

    println!("Results:");
    println!("  Received: {next} ticks in {elapsed:?}");
    println!(
        "  Throughput: {:.2} M ticks/s",
        next as f64 / elapsed.as_secs_f64() / 1e6
    );
    println!("  Notional: {notional:.2}");
    println!(
        "  Refreshes: producer {}, consumer {}",
        m.producer_refreshes, m.consumer_refreshes
    );
    println!(
        "  Failures: full {}, empty {}",
        m.full_failures, m.empty_failures
    );
}
