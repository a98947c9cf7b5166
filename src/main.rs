mod config;
mod error;
mod logging;
mod menu;
mod order_queue;
mod restaurant;
mod types;

use config::RestaurantConfig;
use restaurant::StressSets;

// Bench and stress default to a short cooking time so sweeps finish quickly.
const BENCH_COOK_MS: u64 = 1;

fn parse_usize_list(arg: &str) -> Option<Vec<usize>> {
    if arg == "-" {
        return None;
    }
    let mut values = Vec::new();
    for part in arg.split(',') {
        if part.trim().is_empty() {
            return None;
        }
        let value = part.trim().parse::<usize>().ok()?;
        values.push(value);
    }
    Some(values)
}

fn print_usage(program: &str) {
    println!("Chilli Bowl restaurant CLI");
    println!("Usage:");
    println!("  {program} [customers] [orders_per_customer] [cooks] [capacity] [cook_ms] (run demo)");
    println!("  {program} bench [customers] [orders_per_customer] [cooks] [capacity] [cook_ms] [validate]");
    println!("  {program} stress [customer_sets] [order_sets] [cook_sets] [capacity_sets] [cook_ms] [validate]");
    println!("  {program} --help");
    println!();
    println!("Sets are comma-separated lists (e.g., 1,2,4). Use \"-\" to keep a default set.");
    println!("Trailing numeric arguments may be omitted to keep their defaults.");
    println!("Defaults:");
    println!("  demo   customers=90 orders_per_customer=3 cooks=10 capacity=100 cook_ms=10");
    println!("  bench  same sizes, cook_ms={BENCH_COOK_MS}");
    println!("  stress customers=1,4,16,64 orders=1,5,20 cooks=1,2,8 capacity=1,4,32 cook_ms={BENCH_COOK_MS}");
    println!("Flags:");
    println!("  validate  report capacity, duplicate, and numbering violations on stderr");
    println!("Environment:");
    println!("  RUST_LOG  log filter for stderr diagnostics (e.g. debug, warn)");
}

fn exit_with_usage(program: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(program);
    std::process::exit(2);
}

fn exit_on_error(result: error::Result<()>) {
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}

/// Fill the positional sizes of `config` in order: customers,
/// orders_per_customer, cooks, capacity, cook_ms. Returns the leftover
/// non-numeric arguments.
fn parse_sizes(
    program: &str,
    command: &str,
    args: impl Iterator<Item = String>,
    config: &mut RestaurantConfig,
) -> Vec<String> {
    let mut position = 0usize;
    let mut rest = Vec::new();
    for arg in args {
        let Ok(value) = arg.parse::<u64>() else {
            rest.push(arg);
            continue;
        };
        match position {
            0 => config.customers = value as usize,
            1 => config.orders_per_customer = value as usize,
            2 => config.cooks = value as usize,
            3 => config.capacity = value as usize,
            4 => config.cook_ms = value,
            _ => exit_with_usage(program, &format!("{command}: unexpected argument: {arg}")),
        }
        position += 1;
    }
    rest
}

fn main() {
    logging::init();
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "chilli_bowl".to_string());
    let mut args = std::env::args().skip(1).peekable();
    let command = args.peek().cloned();
    match command.as_deref() {
        Some("bench") => {
            args.next();
            let mut config = RestaurantConfig {
                cook_ms: BENCH_COOK_MS,
                ..RestaurantConfig::default()
            };
            let mut validate = false;
            for flag in parse_sizes(&program, "bench", args, &mut config) {
                match flag.as_str() {
                    "validate" => validate = true,
                    other => exit_with_usage(&program, &format!("bench: unknown flag: {other}")),
                }
            }
            exit_on_error(restaurant::run_benchmark(config, validate));
        }
        Some("stress") => {
            args.next();
            let defaults = StressSets::default();
            let mut customers: Option<Vec<usize>> = None;
            let mut orders: Option<Vec<usize>> = None;
            let mut cooks: Option<Vec<usize>> = None;
            let mut capacities: Option<Vec<usize>> = None;
            let mut cook_ms: Option<u64> = None;
            let mut sets_seen = 0usize;
            let mut validate = false;

            for arg in args {
                if arg == "validate" {
                    validate = true;
                    continue;
                }
                if sets_seen < 4 {
                    let parsed = parse_usize_list(&arg);
                    if parsed.is_none() && arg != "-" {
                        exit_with_usage(&program, &format!("stress: invalid set value: {arg}"));
                    }
                    match sets_seen {
                        0 => customers = parsed,
                        1 => orders = parsed,
                        2 => cooks = parsed,
                        _ => capacities = parsed,
                    }
                    sets_seen += 1;
                    continue;
                }
                if cook_ms.is_none() {
                    match arg.parse::<u64>() {
                        Ok(value) => cook_ms = Some(value),
                        Err(_) => {
                            exit_with_usage(&program, &format!("stress: invalid cook_ms value: {arg}"))
                        }
                    }
                    continue;
                }
                exit_with_usage(&program, &format!("stress: unexpected argument: {arg}"));
            }

            let sets = StressSets {
                customers: customers.unwrap_or(defaults.customers),
                orders_per_customer: orders.unwrap_or(defaults.orders_per_customer),
                cooks: cooks.unwrap_or(defaults.cooks),
                capacities: capacities.unwrap_or(defaults.capacities),
            };
            exit_on_error(restaurant::run_stress(
                sets,
                cook_ms.unwrap_or(BENCH_COOK_MS),
                validate,
            ));
        }
        Some("--help") | Some("-h") | Some("help") => print_usage(&program),
        _ => {
            let mut config = RestaurantConfig::default();
            let rest = parse_sizes(&program, "demo", args, &mut config);
            if let Some(other) = rest.first() {
                exit_with_usage(&program, &format!("unknown command: {other}"));
            }
            exit_on_error(restaurant::run_demo(&config));
        }
    }
}
