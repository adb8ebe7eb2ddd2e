//! Command line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use ssbo_layout::{BufferMode, BufferStorage, Features};

/// Buffer binding mode selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliBufferMode {
    /// One buffer per block instance.
    #[default]
    #[value(name = "per-block")]
    PerBlock,
    /// All block instances in one buffer at aligned offsets.
    Single,
}

impl From<CliBufferMode> for BufferMode {
    fn from(cli: CliBufferMode) -> Self {
        match cli {
            CliBufferMode::PerBlock => BufferMode::PerBlock,
            CliBufferMode::Single => BufferMode::Single,
        }
    }
}

/// Storage buffer layout reference engine.
#[derive(Parser, Debug)]
#[command(
    name = "ssbo-layout",
    about = "Compute and verify shader storage buffer layouts",
    long_about = "Generates random shader storage buffer interfaces, computes their \
        reference layouts under shared, packed, std140 and std430 rules, and verifies \
        them end to end against the built-in dummy program.\n\n\
        FEATURES:\n\
        A comma-separated list of: vectors, matrices, arrays, structs, nested-structs, \
        instance-arrays, unsized-arrays, arrays-of-arrays, std140, std430, shared, \
        packed, matrix-layout, access. Use 'all' (the default) or 'none'.\n\n\
        EXAMPLES:\n\
          # Print the declarations and reference layout of one interface\n\
          ssbo-layout dump --seed 7\n\
        \n\
          # Verify 100 std430-only cases packed into a single buffer\n\
          ssbo-layout check --cases 100 --features std430,arrays,structs --buffer-mode single",
    version
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a generated interface and its reference layout.
    Dump {
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Run generated cases against the dummy program.
    Check {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Number of cases to run.
        #[arg(long, default_value = "16")]
        cases: u32,

        /// How block instances are bound to buffers.
        #[arg(long, default_value = "per-block", value_enum)]
        buffer_mode: CliBufferMode,

        /// Alignment of block offsets in single-buffer mode.
        #[arg(long, default_value_t = BufferStorage::DEFAULT_OFFSET_ALIGNMENT)]
        offset_alignment: u64,
    },
}

#[derive(clap::Args, Debug)]
pub struct GeneratorArgs {
    /// Seed of the interface generator and buffer contents.
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Language features the generator may use.
    #[arg(long, default_value = "all", value_parser = parse_features)]
    pub features: Features,
}

/// Parse a comma-separated feature list.
fn parse_features(value: &str) -> Result<Features, String> {
    let mut features = Features::empty();
    for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        match name {
            "all" => features = Features::all(),
            "none" => {}
            _ => {
                let flag_name = name.to_uppercase().replace('-', "_");
                features |= Features::from_name(&flag_name)
                    .ok_or_else(|| format!("unknown feature '{name}'"))?;
            }
        }
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_features() {
        assert_eq!(parse_features("all").unwrap(), Features::all());
        assert_eq!(parse_features("none").unwrap(), Features::empty());
        assert_eq!(
            parse_features("std140, nested-structs").unwrap(),
            Features::STD140 | Features::NESTED_STRUCTS
        );
        assert!(parse_features("std999").is_err());
    }

    #[test]
    fn test_check_arguments() {
        let args = Args::parse_from([
            "ssbo-layout",
            "check",
            "--seed",
            "3",
            "--buffer-mode",
            "single",
            "--features",
            "std430,arrays",
        ]);
        let Command::Check {
            generator,
            cases,
            buffer_mode,
            offset_alignment,
        } = args.command
        else {
            panic!("expected check");
        };
        assert_eq!(generator.seed, 3);
        assert_eq!(generator.features, Features::STD430 | Features::ARRAYS);
        assert_eq!(cases, 16);
        assert_eq!(buffer_mode, CliBufferMode::Single);
        assert_eq!(offset_alignment, 256);
    }
}
