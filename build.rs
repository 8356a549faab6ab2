use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
struct Config {
    #[serde(default)]
    defaults: DefaultsSection,
    #[serde(default)]
    bucket: Vec<Bucket>,
}

#[derive(Deserialize, Default)]
struct DefaultsSection {
    heap_slots: Option<usize>,
    iterations: Option<usize>,
    threads: Option<usize>,
    foreign_allocs: Option<usize>,
    foreign_burst: Option<usize>,
}

#[derive(Deserialize)]
struct Bucket {
    size: usize,
    count: usize,
}

struct ResolvedDefaults {
    heap_slots: usize,
    iterations: usize,
    threads: usize,
    foreign_allocs: usize,
    foreign_burst: Option<usize>,
}

fn resolve_defaults(cfg: &DefaultsSection) -> ResolvedDefaults {
    let heap_slots = cfg.heap_slots.unwrap_or(1_000_000);
    let iterations = cfg.iterations.unwrap_or(100_000);
    let threads = cfg.threads.unwrap_or(16);
    let foreign_allocs = cfg.foreign_allocs.unwrap_or(10_000_000);

    assert!(heap_slots > 0, "heap_slots must be > 0");
    assert!(threads > 0, "threads must be > 0");
    assert!(
        heap_slots >= threads,
        "heap_slots ({}) must be >= threads ({})",
        heap_slots,
        threads
    );
    if let Some(burst) = cfg.foreign_burst {
        assert!(burst > 0, "foreign_burst must be > 0 when set");
    }

    ResolvedDefaults {
        heap_slots,
        iterations,
        threads,
        foreign_allocs,
        foreign_burst: cfg.foreign_burst,
    }
}

fn validate_buckets(buckets: &[Bucket]) {
    assert!(
        !buckets.is_empty(),
        "SH8BENCH_CONFIG: no histogram buckets defined"
    );
    for (i, b) in buckets.iter().enumerate() {
        assert!(b.size > 0, "bucket {}: size must be > 0", i);
    }
}

fn default_config_path() -> String {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    format!("{}/sh8bench.toml", manifest_dir)
}

fn generate_config(cfg: &ResolvedDefaults, out_path: &Path) {
    let burst = match cfg.foreign_burst {
        Some(n) => format!("Some({})", n),
        None => String::from("None"),
    };
    let code = format!(
        "// Auto-generated by build.rs. Do not edit.\n\n\
         pub const DEFAULT_HEAP_SLOTS: usize = {};\n\
         pub const DEFAULT_ITERATIONS: usize = {};\n\
         pub const DEFAULT_THREADS: usize = {};\n\
         pub const DEFAULT_FOREIGN_ALLOCS: usize = {};\n\
         pub const DEFAULT_FOREIGN_BURST: Option<usize> = {};\n",
        cfg.heap_slots, cfg.iterations, cfg.threads, cfg.foreign_allocs, burst,
    );
    fs::write(out_path, code).expect("failed to write config_gen.rs");
}

fn generate_histogram(buckets: &[Bucket], out_path: &Path) {
    let mut code = String::from("// Auto-generated by build.rs. Do not edit.\n\n");

    code.push_str(&format!(
        "pub static DEFAULT_HISTOGRAM: [HistogramEntry; {}] = [\n",
        buckets.len()
    ));
    for b in buckets {
        code.push_str(&format!(
            "    HistogramEntry {{ size: {}, count: {} }},\n",
            b.size, b.count
        ));
    }
    code.push_str("];\n");

    fs::write(out_path, code).expect("failed to write histogram_gen.rs");
}

fn main() {
    println!("cargo:rerun-if-env-changed=SH8BENCH_CONFIG");

    let out_dir = env::var("OUT_DIR").unwrap();

    let config_path = env::var("SH8BENCH_CONFIG").unwrap_or_else(|_| default_config_path());
    println!("cargo:rerun-if-changed={}", config_path);
    let content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", config_path, e));

    let config: Config = toml::from_str(&content).expect("failed to parse TOML config");

    let resolved = resolve_defaults(&config.defaults);
    validate_buckets(&config.bucket);

    generate_config(&resolved, &Path::new(&out_dir).join("config_gen.rs"));
    generate_histogram(&config.bucket, &Path::new(&out_dir).join("histogram_gen.rs"));
}
