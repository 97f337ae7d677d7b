// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_core::{DataPoint, SentinelConfig};
use sentinel_engine::Engine;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Runs one detection cycle over a batch of data points and prints the
/// resulting analysis as JSON. Historical context, when supplied, feeds
/// the statistical and temporal baselines without itself being scored.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file (falls back to built-in defaults).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a JSON array of `DataPoint`s to analyze this cycle.
    #[arg(short, long)]
    input: PathBuf,

    /// Path to a JSON array of `DataPoint`s used as historical context.
    #[arg(long)]
    historical: Option<PathBuf>,

    /// Pretty-print the resulting JSON instead of compact output.
    #[arg(long)]
    pretty: bool,
}

fn load_points(path: &PathBuf) -> Result<Vec<DataPoint>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {} as a JSON array of data points", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "sentinel=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            SentinelConfig::from_toml_str(&raw)?
        }
        None => SentinelConfig::default(),
    };

    let current = load_points(&args.input)?;
    let historical = args.historical.as_ref().map(load_points).transpose()?;

    let engine = Engine::new(Arc::new(config))?;
    let result = engine.analyze(&current, historical.as_deref()).await;

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");

    Ok(())
}
