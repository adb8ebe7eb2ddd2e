//! Command line driver for the storage buffer layout engine.
//!
//! Run with `--help` for usage. Logging is controlled with `RUST_LOG`
//! (default `info`).

mod args;

use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};
use ssbo_layout::{
    BufferMode, CaseConfig, InterfaceGenerator, LayoutCase, LayoutComputer, LayoutResult,
    Verdict,
};

use args::{Args, Command, GeneratorArgs};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    ssbo_layout::init();

    let args = Args::parse();
    let result = match args.command {
        Command::Dump { generator } => dump(&generator),
        Command::Check {
            generator,
            cases,
            buffer_mode,
            offset_alignment,
        } => check(&generator, cases, buffer_mode.into(), offset_alignment),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Illegal interface: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Print one generated interface and its reference layout.
fn dump(generator: &GeneratorArgs) -> LayoutResult<bool> {
    let interface = InterfaceGenerator::new(generator.seed, generator.features).generate()?;
    let reference = LayoutComputer::new(&interface).compute()?;

    println!("{interface}");
    print!("{}", reference.layout());
    for (index, instance) in reference.instances().iter().enumerate() {
        println!(
            "block {index}: {} rule, unsized array length {}, {} bytes",
            instance.rule,
            instance.last_unsized_array_size,
            reference.block_data_size(index)
        );
    }
    Ok(true)
}

/// Run `cases` generated cases; returns whether all passed.
fn check(
    generator: &GeneratorArgs,
    cases: u32,
    buffer_mode: BufferMode,
    offset_alignment: u64,
) -> LayoutResult<bool> {
    info!(
        "Checking {cases} cases (seed {}, {buffer_mode} buffers, features {:?})",
        generator.seed, generator.features
    );

    let mut interfaces = InterfaceGenerator::new(generator.seed, generator.features);
    let mut failed = 0u32;
    for index in 0..cases {
        let interface = interfaces.generate()?;
        let config = CaseConfig::new()
            .with_buffer_mode(buffer_mode)
            .with_offset_alignment(offset_alignment)
            .with_seed(generator.seed.wrapping_add(index as u64));
        let case = LayoutCase::new(format!("case_{index}"), interface, config)?;
        let mut program = case.dummy_program();

        if let Verdict::Fail(report) = case.run(&mut program) {
            failed += 1;
            warn!("{} failed:\n{}{report}", case.name(), case.interface());
        }
    }

    if failed == 0 {
        info!("All {cases} cases passed");
    } else {
        error!("{failed} of {cases} cases failed");
    }
    Ok(failed == 0)
}
