//! Model of the generated wrapper's runtime contract
//!
//! The generated wrapper keeps its proxy in a function-local static. These
//! tests model that shape with `OnceLock`: the proxy is constructed exactly
//! once, lazily on the first call, even when several threads make that first
//! call together, and recursive calls through the wrapper hit the cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::thread;

/// Rust stand-in for the adapter's proxy object
struct Memoized {
    function: fn(u64) -> u64,
    cache: Mutex<HashMap<u64, u64>>,
}

impl Memoized {
    fn new(function: fn(u64) -> u64) -> Self {
        Memoized {
            function,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn call(&self, n: u64) -> u64 {
        if let Some(value) = self.cache.lock().unwrap().get(&n) {
            return *value;
        }
        // Lock released while the original runs, so recursion cannot deadlock
        let value = (self.function)(n);
        self.cache.lock().unwrap().insert(n, value);
        value
    }
}

mod sequential {
    use super::*;

    pub static PROXY: OnceLock<Memoized> = OnceLock::new();
    pub static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);
    pub static CALLS: AtomicUsize = AtomicUsize::new(0);

    /// The wrapper: takes over the original name
    pub fn fib(n: u64) -> u64 {
        PROXY
            .get_or_init(|| {
                CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
                Memoized::new(fib_original)
            })
            .call(n)
    }

    /// The renamed original: its recursive calls still name `fib`
    fn fib_original(n: u64) -> u64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        if n < 2 {
            n
        } else {
            fib(n - 1) + fib(n - 2)
        }
    }
}

mod concurrent {
    use super::*;

    pub static PROXY: OnceLock<Memoized> = OnceLock::new();
    pub static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

    pub fn fib(n: u64) -> u64 {
        PROXY
            .get_or_init(|| {
                CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
                Memoized::new(fib_original)
            })
            .call(n)
    }

    fn fib_original(n: u64) -> u64 {
        if n < 2 {
            n
        } else {
            fib(n - 1) + fib(n - 2)
        }
    }
}

#[test]
fn test_proxy_is_lazy_and_built_once() {
    assert!(sequential::PROXY.get().is_none());
    assert_eq!(sequential::CONSTRUCTIONS.load(Ordering::SeqCst), 0);

    assert_eq!(sequential::fib(40), 102_334_155);
    assert_eq!(sequential::CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    // One evaluation of the original per distinct argument 0..=40
    assert_eq!(sequential::CALLS.load(Ordering::SeqCst), 41);

    // Later calls are served from the cache
    assert_eq!(sequential::fib(40), 102_334_155);
    assert_eq!(sequential::fib(10), 55);
    assert_eq!(sequential::CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    assert_eq!(sequential::CALLS.load(Ordering::SeqCst), 41);
}

#[test]
fn test_concurrent_first_calls_share_one_proxy() {
    let results: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| concurrent::fib(50))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|&value| value == 12_586_269_025));
    assert_eq!(concurrent::CONSTRUCTIONS.load(Ordering::SeqCst), 1);
}
