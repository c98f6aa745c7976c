//! tree-stats: constraint cost of Merkle tree transitions.
//!
//! Runs the same append/update workload on the plain evaluator and on an
//! R1CS constraint system, checks both reach the same root, and reports
//! the size and satisfiability of the emitted system.
//!
//! Usage:
//!   tree-stats --depth 8,16,32 --appends 16 --updates 4
//!   tree-stats --config tree.json --json

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use ark_bn254::Fr;
use ark_relations::r1cs::ConstraintSystem;
use ark_serialize::CanonicalSerialize;
use clap::Parser;
use merkle_circuits::{
    Composer, MemoryStore, MerkleTree, NativeComposer, R1csComposer, TreeConfig, UpdatePolicy,
};
use num_bigint::BigUint;
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tree_hash::TreeHasher;

#[derive(Parser)]
#[command(name = "tree-stats")]
#[command(about = "Constraint statistics for Merkle tree transitions")]
struct Args {
    /// Tree depths to measure, comma separated. Overrides the config depth
    #[arg(long, value_delimiter = ',')]
    depth: Vec<usize>,

    /// Number of members appended
    #[arg(long, default_value_t = 4)]
    appends: u64,

    /// Number of in-place updates after the appends
    #[arg(long, default_value_t = 1)]
    updates: u64,

    /// JSON file holding a tree config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    depth: usize,
    update_policy: UpdatePolicy,
    appends: u64,
    updates: u64,
    constraints: usize,
    witnesses: usize,
    satisfied: bool,
    synthesis_ms: u128,
    native_assertions: usize,
    native_failures: Vec<String>,
    root: String,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let base = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<TreeConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => TreeConfig::default(),
    };

    let configs: Vec<TreeConfig> = if args.depth.is_empty() {
        vec![base]
    } else {
        args.depth
            .iter()
            .map(|&depth| TreeConfig {
                depth,
                ..base.clone()
            })
            .collect()
    };

    let hasher = Arc::new(TreeHasher::<Fr>::new());
    let reports = configs
        .par_iter()
        .map(|config| measure(config, hasher.clone(), args.appends, args.updates))
        .collect::<Result<Vec<_>>>()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    Ok(())
}

fn measure(
    config: &TreeConfig,
    hasher: Arc<TreeHasher<Fr>>,
    appends: u64,
    updates: u64,
) -> Result<Report> {
    config.validate()?;
    tracing::info!(depth = config.depth, appends, updates, "measuring");

    let native = NativeComposer::new(hasher.clone());
    let native_root = {
        let store = MemoryStore::new(config.depth, hasher.clone())?;
        let mut tree = MerkleTree::new(&native, store, config.clone())?;
        run_workload(&mut tree, appends, updates)?;
        tree.root_value()
    };

    let start = Instant::now();
    let cs = ConstraintSystem::<Fr>::new_ref();
    let r1cs = R1csComposer::new(cs.clone(), hasher.clone());
    let r1cs_root = {
        let store = MemoryStore::new(config.depth, hasher)?;
        let mut tree = MerkleTree::new(&r1cs, store, config.clone())?;
        run_workload(&mut tree, appends, updates)?;
        tree.root_value()
    };
    let synthesis_ms = start.elapsed().as_millis();

    ensure!(
        native_root == r1cs_root,
        "backends disagree on the root at depth {}",
        config.depth
    );

    let satisfied = cs.is_satisfied()?;
    if !satisfied {
        tracing::warn!(
            depth = config.depth,
            failures = ?native.failures(),
            "constraint system is unsatisfiable"
        );
    }

    let mut root = Vec::new();
    r1cs_root.serialize_compressed(&mut root)?;

    Ok(Report {
        depth: config.depth,
        update_policy: config.update_policy,
        appends,
        updates,
        constraints: r1cs.num_constraints(),
        witnesses: r1cs.num_witnesses(),
        satisfied,
        synthesis_ms,
        native_assertions: native.num_assertions(),
        native_failures: native.failures(),
        root: hex::encode(root),
    })
}

/// `appends` members at consecutive slots, then `updates` rewrites cycling
/// over the appended slots.
fn run_workload<C: Composer<Fr>>(
    tree: &mut MerkleTree<'_, Fr, C, MemoryStore<Fr>>,
    appends: u64,
    updates: u64,
) -> Result<()> {
    for i in 0..appends {
        tree.add_member(format!("member-{i}").as_bytes())
            .with_context(|| format!("append {i}"))?;
    }

    let slots = appends.max(1);
    for i in 0..updates {
        let index = BigUint::from(i % slots);
        tree.update_member(format!("updated-{i}").as_bytes(), &index)
            .with_context(|| format!("update {i} at slot {index}"))?;
    }

    Ok(())
}

fn print_report(report: &Report) {
    println!("depth {} ({:?})", report.depth, report.update_policy);
    println!("  appends:      {}", report.appends);
    println!("  updates:      {}", report.updates);
    println!("  constraints:  {}", report.constraints);
    println!("  witnesses:    {}", report.witnesses);
    println!("  satisfied:    {}", report.satisfied);
    println!("  synthesis:    {} ms", report.synthesis_ms);
    println!("  assertions:   {}", report.native_assertions);
    if !report.native_failures.is_empty() {
        println!("  failures:     {}", report.native_failures.join(", "));
    }
    println!("  root:         0x{}", report.root);
}
