//! Simple profiling guards using thread-local storage
//!
//! Lightweight timing for the searches without changing function signatures.
//! Enable with environment variable: SNAKE_PROFILE=1

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    single_goal_ns: u64,
    single_goal_calls: usize,
    multi_goal_ns: u64,
    multi_goal_calls: usize,
    ranking_ns: u64,
    ranking_calls: usize,
    expansions: usize,
    timeouts: usize,
    overflows: usize,
}

thread_local! {
    static LOCAL: RefCell<Counters> = RefCell::new(Counters::default());
}

static GLOBAL_SINGLE_GOAL_NS: AtomicU64 = AtomicU64::new(0);
static GLOBAL_SINGLE_GOAL_CALLS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_MULTI_GOAL_NS: AtomicU64 = AtomicU64::new(0);
static GLOBAL_MULTI_GOAL_CALLS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_RANKING_NS: AtomicU64 = AtomicU64::new(0);
static GLOBAL_RANKING_CALLS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_EXPANSIONS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_TIMEOUTS: AtomicUsize = AtomicUsize::new(0);
static GLOBAL_OVERFLOWS: AtomicUsize = AtomicUsize::new(0);

#[inline]
pub fn is_profiling_enabled() -> bool {
    std::env::var("SNAKE_PROFILE").is_ok()
}

pub struct ProfileGuard {
    start: Instant,
    category: &'static str,
}

impl ProfileGuard {
    pub fn new(category: &'static str) -> Option<Self> {
        if is_profiling_enabled() {
            Some(ProfileGuard {
                start: Instant::now(),
                category,
            })
        } else {
            None
        }
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;

        LOCAL.with(|c| {
            let mut c = c.borrow_mut();
            match self.category {
                "single_goal" => {
                    c.single_goal_ns += elapsed_ns;
                    c.single_goal_calls += 1;
                }
                "multi_goal" => {
                    c.multi_goal_ns += elapsed_ns;
                    c.multi_goal_calls += 1;
                }
                "ranking" => {
                    c.ranking_ns += elapsed_ns;
                    c.ranking_calls += 1;
                }
                _ => {}
            }
        });
    }
}

#[inline]
pub fn record_expansions(count: usize) {
    if is_profiling_enabled() {
        LOCAL.with(|c| c.borrow_mut().expansions += count);
    }
}

#[inline]
pub fn record_timeout() {
    if is_profiling_enabled() {
        LOCAL.with(|c| c.borrow_mut().timeouts += 1);
    }
}

#[inline]
pub fn record_overflow() {
    if is_profiling_enabled() {
        LOCAL.with(|c| c.borrow_mut().overflows += 1);
    }
}

/// Folds this thread's counters into the global totals and resets them
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }

    let local = LOCAL.with(|c| std::mem::take(&mut *c.borrow_mut()));

    GLOBAL_SINGLE_GOAL_NS.fetch_add(local.single_goal_ns, Ordering::Relaxed);
    GLOBAL_SINGLE_GOAL_CALLS.fetch_add(local.single_goal_calls, Ordering::Relaxed);
    GLOBAL_MULTI_GOAL_NS.fetch_add(local.multi_goal_ns, Ordering::Relaxed);
    GLOBAL_MULTI_GOAL_CALLS.fetch_add(local.multi_goal_calls, Ordering::Relaxed);
    GLOBAL_RANKING_NS.fetch_add(local.ranking_ns, Ordering::Relaxed);
    GLOBAL_RANKING_CALLS.fetch_add(local.ranking_calls, Ordering::Relaxed);
    GLOBAL_EXPANSIONS.fetch_add(local.expansions, Ordering::Relaxed);
    GLOBAL_TIMEOUTS.fetch_add(local.timeouts, Ordering::Relaxed);
    GLOBAL_OVERFLOWS.fetch_add(local.overflows, Ordering::Relaxed);
}

fn print_category(name: &str, time_ns: u64, calls: usize, total_ns: u64) {
    let ms = time_ns as f64 / 1_000_000.0;
    let pct = if total_ns > 0 { 100.0 * time_ns as f64 / total_ns as f64 } else { 0.0 };
    let avg_us = if calls > 0 { time_ns as f64 / (calls * 1000) as f64 } else { 0.0 };

    eprintln!("{}:", name);
    eprintln!("  Time:     {:.2}ms ({:.1}%)", ms, pct);
    eprintln!("  Calls:    {}", calls);
    eprintln!("  Avg:      {:.2}µs/call\n", avg_us);
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }

    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 SEARCH PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    print_category(
        "Single-Goal A*",
        GLOBAL_SINGLE_GOAL_NS.load(Ordering::Relaxed),
        GLOBAL_SINGLE_GOAL_CALLS.load(Ordering::Relaxed),
        total_ns,
    );
    print_category(
        "Multi-Goal A*",
        GLOBAL_MULTI_GOAL_NS.load(Ordering::Relaxed),
        GLOBAL_MULTI_GOAL_CALLS.load(Ordering::Relaxed),
        total_ns,
    );
    print_category(
        "Rich Region Ranking",
        GLOBAL_RANKING_NS.load(Ordering::Relaxed),
        GLOBAL_RANKING_CALLS.load(Ordering::Relaxed),
        total_ns,
    );

    eprintln!("Frontier:");
    eprintln!("  Expansions: {}", GLOBAL_EXPANSIONS.load(Ordering::Relaxed));
    eprintln!("  Timeouts:   {}", GLOBAL_TIMEOUTS.load(Ordering::Relaxed));
    eprintln!("  Overflows:  {}\n", GLOBAL_OVERFLOWS.load(Ordering::Relaxed));

    eprintln!("═══════════════════════════════════════════════════════════\n");
}

pub fn reset() {
    GLOBAL_SINGLE_GOAL_NS.store(0, Ordering::Relaxed);
    GLOBAL_SINGLE_GOAL_CALLS.store(0, Ordering::Relaxed);
    GLOBAL_MULTI_GOAL_NS.store(0, Ordering::Relaxed);
    GLOBAL_MULTI_GOAL_CALLS.store(0, Ordering::Relaxed);
    GLOBAL_RANKING_NS.store(0, Ordering::Relaxed);
    GLOBAL_RANKING_CALLS.store(0, Ordering::Relaxed);
    GLOBAL_EXPANSIONS.store(0, Ordering::Relaxed);
    GLOBAL_TIMEOUTS.store(0, Ordering::Relaxed);
    GLOBAL_OVERFLOWS.store(0, Ordering::Relaxed);
}
