//! pprl-sim: drive the secure Q-table with scripted updates
//!
//! Applies random (state, action, value) updates to an encrypted table,
//! checks every select against a plaintext shadow table, and reports the
//! final mean squared error.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use secure_qtable::bfv::BfvScheme;
use secure_qtable::codec::IntegerCodec;
use secure_qtable::params::{check_compatible, CodecParams, SchemeParams, TransportParams};
use secure_qtable::protocol::{ConfidentialityWaiver, KeyMaterial, SecureQtable};
use secure_qtable::transport::{seal_ciphertext, SealedChannel, TransportKeys};

#[derive(Parser)]
#[command(name = "pprl-sim")]
#[command(about = "Simulate privacy-preserving Q-table updates against a plaintext shadow")]
#[command(version)]
struct Args {
    /// JSON file with a full simulation config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of states S
    #[arg(long)]
    states: Option<usize>,

    /// Number of actions A (at most the slot count)
    #[arg(long)]
    actions: Option<usize>,

    /// Updates per trial
    #[arg(long)]
    steps: Option<usize>,

    /// Trials; the table is reset between trials
    #[arg(long)]
    trials: Option<usize>,

    /// Random seed for keys and the update script (optional)
    #[arg(long)]
    seed: Option<u64>,

    /// RSA modulus size for transport sealing
    #[arg(long)]
    key_bits: Option<usize>,

    /// Fixed-point scale
    #[arg(long)]
    coeff: Option<f64>,

    /// Fixed-point range bound N
    #[arg(long)]
    bound: Option<i64>,

    /// Write the sealed final table to this directory
    #[arg(long)]
    audit_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct SimConfig {
    states: usize,
    actions: usize,
    steps: usize,
    trials: usize,
    seed: Option<u64>,
    scheme: SchemeParams,
    transport: TransportParams,
    codec: CodecParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            states: 16,
            actions: 4,
            steps: 20,
            trials: 1,
            seed: None,
            scheme: SchemeParams::default(),
            transport: TransportParams::default(),
            codec: CodecParams::default(),
        }
    }
}

impl SimConfig {
    fn load(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Some(states) = args.states {
            config.states = states;
        }
        if let Some(actions) = args.actions {
            config.actions = actions;
        }
        if let Some(steps) = args.steps {
            config.steps = steps;
        }
        if let Some(trials) = args.trials {
            config.trials = trials;
        }
        if args.seed.is_some() {
            config.seed = args.seed;
        }
        if let Some(key_bits) = args.key_bits {
            config.transport.key_bits = key_bits;
        }
        if let Some(coeff) = args.coeff {
            config.codec.coeff = coeff;
        }
        if let Some(bound) = args.bound {
            config.codec.bound = bound;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = SimConfig::load(&args)?;
    config
        .scheme
        .validate()
        .map_err(|e| eyre::eyre!("Invalid scheme parameters: {}", e))?;
    check_compatible(&config.scheme, &config.codec)
        .map_err(|e| eyre::eyre!("Invalid parameters: {}", e))?;

    info!("Secure Q-table simulation");
    info!(
        "Table: {} states × {} actions, {} trial(s) of {} steps",
        config.states, config.actions, config.trials, config.steps
    );
    info!(
        "Scheme: n = {}, t = {}, log2(q) ≈ {}",
        config.scheme.ring_dim,
        config.scheme.t,
        128 - config.scheme.q.leading_zeros()
    );

    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    info!("Seed: {}", seed);

    let setup_start = Instant::now();
    let scheme = BfvScheme::with_seed(config.scheme.clone(), rng.gen())
        .wrap_err("Failed to generate BFV keys")?;
    let transport = TransportKeys::generate(&config.transport, &mut rng)
        .wrap_err("Failed to generate transport keys")?;
    info!(
        "Transport: {}-bit RSA-OAEP, {} bytes per chunk",
        config.transport.key_bits,
        transport.chunk_max()
    );
    let codec = IntegerCodec::new(&config.codec).wrap_err("Invalid codec parameters")?;
    let km = KeyMaterial::with_seed(scheme, transport, rng.gen());
    let mut table = SecureQtable::from_key_material(km, codec, config.states, config.actions)
        .wrap_err("Failed to create encrypted table")?;
    info!("Setup time: {:.2?}", setup_start.elapsed());

    // Keep scripted values well inside [-N, N) once scaled
    let limit = 0.9 * config.codec.bound as f64 / config.codec.coeff;
    let tolerance = 1.0 / config.codec.coeff;

    let total_steps = (config.trials * config.steps) as u64;
    let pb = ProgressBar::new(total_steps);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let run_start = Instant::now();
    let mut mismatches = 0usize;
    let mut shadow = vec![vec![0.0; config.actions]; config.states];

    for trial in 0..config.trials {
        if trial > 0 {
            table.reset().wrap_err("Failed to reset table")?;
            shadow.iter_mut().for_each(|row| row.fill(0.0));
        }

        for _ in 0..config.steps {
            let state = rng.gen_range(0..config.states);
            let action = rng.gen_range(0..config.actions);
            let raw: f64 = rng.gen_range(-limit..limit);
            let value = codec.decode(codec.encode(raw));

            table
                .update(state, action, value)
                .wrap_err_with(|| format!("Update({}, {}) failed", state, action))?;
            shadow[state][action] = value;

            let selected = table
                .select(state)
                .wrap_err_with(|| format!("Select({}) failed", state))?;
            let agrees = selected
                .iter()
                .zip(&shadow[state])
                .all(|(a, b)| (a - b).abs() <= tolerance);
            if !agrees {
                mismatches += 1;
                warn!("State {} diverged from shadow table", state);
            }
            pb.inc(1);
        }

        let greedy = table.select_action(0).wrap_err("Select action failed")?;
        info!("Trial {}: greedy action at state 0 is {}", trial, greedy);
    }
    pb.finish_with_message("Done");

    let run_time = run_start.elapsed();
    let mse = table
        .mse_against(&shadow, ConfidentialityWaiver::acknowledge())
        .wrap_err("Failed to compare against shadow table")?;

    if let Some(dir) = &args.audit_dir {
        let mut channel = SealedChannel::new();
        let km = table.key_material();
        for (i, row) in table.table().entries().iter().enumerate() {
            let sealed = seal_ciphertext(&km.scheme, row, &km.transport, &mut rng)?;
            channel.post(format!("Qtable_{}", i), sealed);
        }
        channel
            .persist(dir)
            .with_context(|| format!("Failed to write audit dir {}", dir.display()))?;
        info!("Sealed table written to {}", dir.display());
    }

    println!();
    println!("=== Simulation Complete ===");
    println!("Updates: {}", total_steps);
    println!("Select mismatches: {}", mismatches);
    println!("Final MSE vs shadow: {:.3e}", mse);
    println!(
        "Time per update+select: {:.2?}",
        run_time / total_steps.max(1) as u32
    );

    if mismatches > 0 {
        return Err(eyre::eyre!("{} selects diverged from the shadow table", mismatches));
    }
    Ok(())
}
