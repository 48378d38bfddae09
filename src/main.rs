// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use std::time::Instant;

use guardstack::testing::{corrupt, SharedSink};
use guardstack::{FailurePolicy, GuardedStack, ProtectionLevel, StackConfig};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::display::{self, paint_dump_line, row, section_bot, section_top, verdict_badge};
use cli::{Cli, Commands, CorruptTarget};

type CliResult = Result<ExitCode, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Demo {
            values,
            protection,
            capacity,
        } => run_demo(&values, protection, capacity),
        Commands::Corrupt {
            target,
            protection,
            json,
            abort,
        } => run_corrupt(target, protection, json, abort),
        Commands::Stress {
            ops,
            protection,
            seed,
        } => run_stress(ops, protection, seed),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "guardstack=debug"
    } else {
        "guardstack=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Push `values`, pop them all, destroy. Runs with the abort policy.
fn run_demo(values: &[i32], protection: Option<ProtectionLevel>, capacity: usize) -> CliResult {
    let protection = protection.unwrap_or_else(ProtectionLevel::from_env);
    let config = StackConfig::default()
        .with_protection(protection)
        .with_initial_capacity(capacity);
    let mut stack = GuardedStack::with_config("intStack", config)?;

    section_top(&format!("PUSH ({} protection)", protection));
    for &value in values {
        stack.push(value)?;
        row(&format!(
            " push {:>12}    size {:>5}    capacity {:>5}",
            value,
            stack.len(),
            stack.capacity()
        ));
    }
    section_bot();

    section_top("POP");
    while !stack.is_empty() {
        let value = stack.pop()?;
        row(&format!(
            " pop  {:>12}    size {:>5}    capacity {:>5}",
            value,
            stack.len(),
            stack.capacity()
        ));
    }
    section_bot();

    println!("verdict: {}", verdict_badge(stack.verify()));
    stack.destroy()?;
    Ok(ExitCode::SUCCESS)
}

/// Damage a stack, run one more push, and show what the checker saw.
fn run_corrupt(
    target: CorruptTarget,
    protection: ProtectionLevel,
    json: bool,
    abort: bool,
) -> CliResult {
    let policy = if abort {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Report
    };
    let config = StackConfig::default()
        .with_protection(protection)
        .with_failure_policy(policy);

    // Under abort the dump has to reach stderr before the process dies.
    let sink = SharedSink::new();
    let mut stack = GuardedStack::with_config("victim", config)?;
    if !abort {
        stack = stack.with_sink(sink.clone());
    }

    for value in [5, 12, 17] {
        stack.push(value)?;
    }

    match target.corruption() {
        Some(corruption) => {
            corrupt(&mut stack, corruption);
        }
        None => stack.destroy()?,
    }

    match stack.push(13) {
        Ok(()) => {
            println!(
                "{:?} went unnoticed at protection level '{}'",
                target, protection
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            if json {
                println!("{}", stack.report().to_json()?);
            } else {
                for line in sink.contents().lines() {
                    println!("{}", paint_dump_line(line));
                }
            }
            eprintln!("detected: {}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Random walk of pushes and pops, cross-checked against a `Vec`.
fn run_stress(ops: usize, protection: ProtectionLevel, seed: u64) -> CliResult {
    let config = StackConfig::default().with_protection(protection);
    let mut stack = GuardedStack::with_config("stress", config)?;
    let mut model: Vec<i32> = Vec::new();
    let mut state = seed;
    let mut peak_capacity = stack.capacity();

    let start = Instant::now();
    for _ in 0..ops {
        let roll = splitmix64(&mut state);
        if model.is_empty() || roll & 1 == 0 {
            let value = (roll >> 32) as i32;
            stack.push(value)?;
            model.push(value);
        } else {
            let got = stack.pop()?;
            let want = model.pop();
            if want != Some(got) {
                return Err(format!("LIFO order broken: popped {}, expected {:?}", got, want).into());
            }
        }
        peak_capacity = peak_capacity.max(stack.capacity());
    }
    let elapsed = start.elapsed();
    let per_op = elapsed.as_nanos() as f64 / ops.max(1) as f64;

    section_top(&format!("STRESS ({} protection)", protection));
    row(&format!(" operations      {:>12}", ops));
    row(&format!(" final size      {:>12}", stack.len()));
    row(&format!(" final capacity  {:>12}", stack.capacity()));
    row(&format!(" peak capacity   {:>12}", peak_capacity));
    row(&format!(" ns / op         {}", display::timing_ns(per_op)));
    row(&format!(" verdict         {}", verdict_badge(stack.verify())));
    section_bot();

    stack.destroy()?;
    Ok(ExitCode::SUCCESS)
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
