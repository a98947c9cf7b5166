//! Customer and cook drivers plus the demo, benchmark, and stress runners.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::RestaurantConfig;
use crate::error::Result;
use crate::menu::MenuPicker;
use crate::order_queue::{OrderQueue, QueueStats, Take};
use crate::types::{CookId, CustomerId, OrderNumber, OrderRequest};

const CSV_HEADER: &str = "customers,orders_per_customer,cooks,capacity,total_orders,elapsed_ms,throughput_orders_per_s,avg_submit_wait_us,cpu_user_s,cpu_sys_s,peak_queue_len,duplicate_orders,numbering_dense";

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    use libc::{RUSAGE_SELF, getrusage, rusage};
    // SAFETY: rusage is plain old data; all-zero is a valid value.
    let mut usage: rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { getrusage(RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Served order numbers, shared by all cooks of one run.
#[derive(Default)]
struct ServedLedger {
    numbers: Mutex<Vec<OrderNumber>>,
}

impl ServedLedger {
    fn record(&self, number: OrderNumber) {
        let mut guard = self.numbers.lock().expect("served ledger mutex poisoned");
        guard.push(number);
    }

    /// Returns `(duplicates, dense)` where dense means the served set is
    /// exactly `1..=expected_total`.
    fn check(&self, expected_total: u64) -> (bool, bool) {
        let guard = self.numbers.lock().expect("served ledger mutex poisoned");
        let unique: HashSet<OrderNumber> = guard.iter().copied().collect();
        let duplicates = unique.len() != guard.len();
        let dense = unique.len() as u64 == expected_total
            && unique.iter().all(|&n| n >= 1 && n <= expected_total);
        (duplicates, dense)
    }
}

/// Everything observed during one full open-to-close run.
struct RunReport {
    expected_total: u64,
    per_cook_fulfilled: Vec<usize>,
    stats: QueueStats,
    elapsed_ms: f64,
    submit_wait_us: u64,
    duplicate_orders: bool,
    numbering_dense: bool,
}

fn spawn_customer(
    queue: Arc<OrderQueue>,
    customer_id: CustomerId,
    config: &RestaurantConfig,
    submit_wait_us: Arc<AtomicU64>,
    verbose: bool,
) -> thread::JoinHandle<()> {
    let orders = config.orders_per_customer;
    let seed = config.seed.map(|seed| seed.wrapping_add(customer_id));
    thread::Builder::new()
        .name(format!("customer-{customer_id}"))
        .spawn(move || {
            let mut picker = MenuPicker::new(seed);
            for _ in 0..orders {
                let item = picker.pick();
                let wait_start = Instant::now();
                let number = queue.submit(OrderRequest::new(item, customer_id));
                let waited = wait_start.elapsed().as_micros() as u64;
                submit_wait_us.fetch_add(waited, Ordering::SeqCst);
                if verbose {
                    println!("Customer #{customer_id} placed order #{number}: {item}");
                }
            }
        })
        .expect("failed to spawn customer thread")
}

fn spawn_cook(
    queue: Arc<OrderQueue>,
    cook_id: CookId,
    cook_ms: u64,
    ledger: Arc<ServedLedger>,
    verbose: bool,
) -> thread::JoinHandle<usize> {
    thread::Builder::new()
        .name(format!("cook-{cook_id}"))
        .spawn(move || {
            let mut fulfilled = 0usize;
            while let Take::Order(order) = queue.take() {
                if verbose {
                    println!(
                        "Cook #{cook_id} fulfilling order #{} ({}) for customer {}",
                        order.number(),
                        order.item,
                        order.customer_id
                    );
                }
                ledger.record(order.number());
                if cook_ms > 0 {
                    thread::sleep(Duration::from_millis(cook_ms));
                }
                fulfilled += 1;
            }
            debug!("cook {cook_id} observed end of work");
            if verbose {
                println!("Cook #{cook_id} fulfilled {fulfilled} orders");
            }
            fulfilled
        })
        .expect("failed to spawn cook thread")
}

/// Open the queue, run every customer and cook to completion, and close it.
fn run_restaurant(config: &RestaurantConfig, verbose: bool) -> Result<RunReport> {
    config.validate()?;
    let expected_total = config.expected_total()?;
    let queue = Arc::new(OrderQueue::open(config.capacity, expected_total)?);
    if verbose {
        println!("Restaurant is open!");
    }

    let ledger = Arc::new(ServedLedger::default());
    // Total time customers spent blocked on a full queue.
    let submit_wait_us = Arc::new(AtomicU64::new(0));

    let start = Instant::now();
    let customers: Vec<_> = (0..config.customers as u64)
        .map(|customer_id| {
            spawn_customer(
                Arc::clone(&queue),
                customer_id,
                config,
                Arc::clone(&submit_wait_us),
                verbose,
            )
        })
        .collect();
    let cooks: Vec<_> = (0..config.cooks as u64)
        .map(|cook_id| {
            spawn_cook(
                Arc::clone(&queue),
                cook_id,
                config.cook_ms,
                Arc::clone(&ledger),
                verbose,
            )
        })
        .collect();

    for handle in customers {
        handle.join().expect("customer thread panicked");
    }
    let per_cook_fulfilled: Vec<usize> = cooks
        .into_iter()
        .map(|handle| handle.join().expect("cook thread panicked"))
        .collect();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    // Every worker is joined, so this is the last handle.
    let queue = Arc::try_unwrap(queue)
        .unwrap_or_else(|_| panic!("order queue still shared after all workers joined"));
    debug!("all workers joined, {} orders left in queue", queue.len());
    let stats = queue.stats();
    queue.close();
    if verbose {
        println!("Restaurant is closed!");
    }

    let (duplicate_orders, numbering_dense) = ledger.check(expected_total);
    info!(
        "run finished orders={expected_total} elapsed_ms={elapsed_ms:.2} peak_len={}",
        stats.peak_len
    );

    Ok(RunReport {
        expected_total,
        per_cook_fulfilled,
        stats,
        elapsed_ms,
        submit_wait_us: submit_wait_us.load(Ordering::SeqCst),
        duplicate_orders,
        numbering_dense,
    })
}

/// Run the restaurant with console reporting and print a summary.
pub fn run_demo(config: &RestaurantConfig) -> Result<()> {
    let report = run_restaurant(config, true)?;
    let fulfilled: usize = report.per_cook_fulfilled.iter().sum();

    println!("RESTAURANT SUMMARY");
    println!("orders_expected={}", report.stats.expected_total);
    println!("orders_submitted={}", report.stats.submitted);
    println!("orders_completed={}", report.stats.completed);
    println!("orders_fulfilled={fulfilled}");
    println!("queue_len_at_close={}", report.stats.len);
    println!("per_cook_fulfilled={:?}", report.per_cook_fulfilled);
    println!("peak_queue_len={}", report.stats.peak_len);
    println!("capacity={}", report.stats.capacity);
    println!("duplicate_orders={}", report.duplicate_orders);
    println!("numbering_dense={}", report.numbering_dense);
    Ok(())
}

/// Aggregated metrics from a single benchmark run.
struct BenchResult {
    config: RestaurantConfig,
    report: RunReport,
    throughput: f64,
    avg_submit_wait_us: f64,
    cpu_user_s: Option<f64>,
    cpu_sys_s: Option<f64>,
}

impl BenchResult {
    fn csv_row(&self) -> String {
        let cpu_user = self
            .cpu_user_s
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string());
        let cpu_sys = self
            .cpu_sys_s
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string());
        format!(
            "{},{},{},{},{},{:.2},{:.2},{:.2},{},{},{},{},{}",
            self.config.customers,
            self.config.orders_per_customer,
            self.config.cooks,
            self.config.capacity,
            self.report.expected_total,
            self.report.elapsed_ms,
            self.throughput,
            self.avg_submit_wait_us,
            cpu_user,
            cpu_sys,
            self.report.stats.peak_len,
            self.report.duplicate_orders,
            self.report.numbering_dense
        )
    }

    fn report_violations(&self) {
        if self.report.stats.peak_len > self.config.capacity {
            eprintln!("# violation,capacity_exceeded");
        }
        if self.report.duplicate_orders {
            eprintln!("# violation,duplicate_orders");
        }
        if !self.report.numbering_dense {
            eprintln!("# violation,numbering_gap");
        }
    }
}

fn benchmark_once(config: RestaurantConfig) -> Result<BenchResult> {
    let cpu_start = cpu_times_seconds();
    let report = run_restaurant(&config, false)?;

    let total = report.expected_total as f64;
    let throughput = if report.elapsed_ms > 0.0 {
        total / (report.elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let avg_submit_wait_us = if report.expected_total > 0 {
        report.submit_wait_us as f64 / total
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    Ok(BenchResult {
        config,
        report,
        throughput,
        avg_submit_wait_us,
        cpu_user_s,
        cpu_sys_s,
    })
}

/// Run a single silent benchmark and print one CSV row.
pub fn run_benchmark(config: RestaurantConfig, validate: bool) -> Result<()> {
    let result = benchmark_once(config)?;
    println!("{CSV_HEADER}");
    println!("{}", result.csv_row());
    if validate {
        result.report_violations();
    }
    Ok(())
}

/// Parameter sets swept by [`run_stress`].
pub struct StressSets {
    pub customers: Vec<usize>,
    pub orders_per_customer: Vec<usize>,
    pub cooks: Vec<usize>,
    pub capacities: Vec<usize>,
}

impl Default for StressSets {
    fn default() -> Self {
        Self {
            customers: vec![1, 4, 16, 64],
            orders_per_customer: vec![1, 5, 20],
            cooks: vec![1, 2, 8],
            capacities: vec![1, 4, 32],
        }
    }
}

/// Expand the sets into one validated config per combination.
fn stress_configs(sets: &StressSets, cook_ms: u64) -> Result<Vec<RestaurantConfig>> {
    let mut configs = Vec::new();
    for &customers in &sets.customers {
        for &orders_per_customer in &sets.orders_per_customer {
            for &cooks in &sets.cooks {
                for &capacity in &sets.capacities {
                    let config = RestaurantConfig {
                        capacity,
                        customers,
                        cooks,
                        orders_per_customer,
                        cook_ms,
                        seed: Some(42),
                    };
                    config.validate()?;
                    configs.push(config);
                }
            }
        }
    }
    Ok(configs)
}

/// Sweep every combination of the sets and print CSV output.
///
/// All combinations are validated before anything is printed.
pub fn run_stress(sets: StressSets, cook_ms: u64, validate: bool) -> Result<()> {
    let configs = stress_configs(&sets, cook_ms)?;
    println!("{CSV_HEADER}");
    for config in configs {
        let result = benchmark_once(config)?;
        println!("{}", result.csv_row());
        if validate {
            result.report_violations();
        }
    }
    Ok(())
}
