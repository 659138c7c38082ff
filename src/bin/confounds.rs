use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use confounds::{
    io::{read_scan, write_safetensors, write_tsv},
    Confounds, ConfoundsConfig, Strategy,
};

#[derive(Parser)]
#[command(name = "confounds", about = "Select fMRIPrep confounds by denoising strategy")]
struct Args {
    /// *_desc-confounds_timeseries.tsv from fMRIPrep
    #[arg(long)]
    tsv: PathBuf,

    /// Matching JSON sidecar (needed for compcor)
    #[arg(long)]
    json: Option<PathBuf>,

    /// JSON configuration file; fields not given keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Confound families, comma-separated (overrides the config file)
    #[arg(long)]
    strategy: Option<String>,

    /// Output path (.tsv or .safetensors)
    #[arg(long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ConfoundsConfig::from_json_str(&text)?
        }
        None => ConfoundsConfig::default(),
    };
    if let Some(list) = &args.strategy {
        let tags: Vec<&str> = list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        cfg.strategy = Strategy::parse(&tags)?;
    }

    let scan = read_scan(&args.tsv, args.json.as_deref())?;
    info!("Loaded {} columns × {} volumes", scan.table.columns().len(), scan.table.n_scans());

    let out = Confounds::new(cfg).load(&scan)?;
    eprintln!("Selected {} confounds", out.columns.len());

    match args.output.extension().and_then(|e| e.to_str()) {
        Some("tsv") => {
            let f = std::fs::File::create(&args.output)
                .with_context(|| format!("creating {}", args.output.display()))?;
            write_tsv(&out, std::io::BufWriter::new(f))?;
        }
        Some("safetensors") => write_safetensors(&out, &args.output)?,
        _ => bail!("unsupported output extension: {}", args.output.display()),
    }
    eprintln!("Written → {}", args.output.display());

    Ok(())
}
