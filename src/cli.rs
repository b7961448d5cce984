//! Command-line surface
//!
//! Flags are accepted in the single-dash long form (`-platform aws`) as well
//! as the usual `--platform aws`. Mode, platform and action stay free-form
//! strings here so the router can reject them with guidance instead of clap
//! failing early.

use crate::router::{get_registry, Mode, Platform};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// Long flags that may be written with a single dash
const LONG_FLAGS: &[&str] = &[
    "platform",
    "action",
    "profile",
    "accounts-file",
    "region",
    "use-organization",
    "project-id",
    "subscription-id",
    "examples",
    "json",
    "max-depth",
    "log-level",
    "help",
    "version",
];

/// Enumerate exposed cloud resources, with or without credentials
#[derive(Parser, Debug, Default)]
#[command(name = "cloudenum", version = crate::VERSION, about, long_about = None)]
pub struct Args {
    /// Operating mode: auth or unauth
    pub mode: Option<String>,

    /// Cloud platform to use (aws, gcp, azure)
    #[arg(long)]
    pub platform: Option<String>,

    /// Action to perform
    #[arg(long)]
    pub action: Option<String>,

    /// AWS profile to use
    #[arg(long)]
    pub profile: Option<String>,

    /// Path to file containing AWS account IDs, one per line
    #[arg(long)]
    pub accounts_file: Option<PathBuf>,

    /// Specific region to check (default: all enabled regions)
    #[arg(long)]
    pub region: Option<String>,

    /// Use AWS Organizations to discover accounts
    #[arg(long)]
    pub use_organization: bool,

    /// GCP project ID to scan
    #[arg(long)]
    pub project_id: Option<String>,

    /// Azure subscription ID to scan
    #[arg(long)]
    pub subscription_id: Option<String>,

    /// Show detailed usage examples
    #[arg(long)]
    pub examples: bool,

    /// Print findings as one JSON object per line
    #[arg(long)]
    pub json: bool,

    /// Stop metadata tree walks below this depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogLevel {
    #[default]
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Rewrite single-dash long flags (`-accounts-file=x`) to their double-dash form.
/// The program name and anything after a bare `--` are left alone.
pub fn normalize_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }

        let rewritten = arg
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .filter(|rest| {
                let name = rest.split('=').next().unwrap_or(rest);
                LONG_FLAGS.contains(&name)
            })
            .map(|rest| format!("--{}", rest));

        out.push(rewritten.unwrap_or(arg));
    }

    out
}

/// Print extended usage, grouped by mode and platform
pub fn print_examples() {
    println!("cloudenum usage examples");
    println!("========================");
    println!();
    println!("unauth mode: API enumeration of other accounts, and probes of the");
    println!("metadata/runtime endpoints reachable from inside a cloud resource.");
    println!("auth mode: credentialed sweeps of your own regions.");

    for mode in [Mode::Unauth, Mode::Auth] {
        for platform in Platform::ALL {
            let routes: Vec<_> = get_registry()
                .routes
                .iter()
                .filter(|r| r.key.mode == mode && r.key.platform == platform)
                .collect();
            if routes.is_empty() {
                continue;
            }

            println!();
            println!("{} {}:", mode, platform);
            for route in routes {
                let required: String = route
                    .required
                    .iter()
                    .map(|p| format!(" {} {}", p.flag(), placeholder(p.flag())))
                    .collect();
                println!("  {}", route.description);
                println!(
                    "    cloudenum {} -platform {} -action {}{}",
                    mode, platform, route.key.action, required
                );
            }
        }
    }

    println!();
    println!("Additional options:");
    println!("  -region REGION       limit AWS sweeps to one region");
    println!("    cloudenum unauth -platform aws -action ami -profile audit -accounts-file accounts.txt -region us-west-2");
    println!("  -use-organization    add every account of the AWS organization");
    println!("    cloudenum unauth -platform aws -action ami -profile audit -use-organization");
    println!("  -json                one JSON object per finding");
    println!("  -max-depth N         bound metadata tree walks");
}

fn placeholder(flag: &str) -> &'static str {
    match flag {
        "-profile" => "myprofile",
        "-accounts-file" => "accounts.txt",
        "-project-id" => "my-project",
        "-subscription-id" => "00000000-0000-0000-0000-000000000000",
        _ => "VALUE",
    }
}
