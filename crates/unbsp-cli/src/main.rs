// main.rs — the unbsp batch decompiler front end.
//
// Argument parsing, settings assembly, and batch submission. Each input
// file becomes one scheduler job running decode -> reconstruct -> write;
// job logs are surfaced per file and the process exits nonzero when any
// job failed.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use unbsp_bsp::format::BspVariant;
use unbsp_bsp::BspFile;
use unbsp_decompile::{decompile, ProgressSink, Settings};
use unbsp_jobs::{JobContext, JobEvent, JobState, Scheduler};
use unbsp_write::{Dialect, WriteOptions};

#[derive(Parser)]
#[command(name = "unbsp", version, about = "Decompile compiled BSP levels into editable map text")]
struct Args {
    /// Input BSP files.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Force a format variant instead of auto-detecting (e.g. "goldsrc",
    /// "vindictus").
    #[arg(long)]
    format: Option<String>,

    /// Output directory; defaults to each input file's directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Worker pool size; defaults to the host CPU count.
    #[arg(long)]
    jobs: Option<usize>,

    /// Emit Source Hammer VMF.
    #[arg(long)]
    vmf: bool,
    /// Emit Nightfire Gearcraft MAP.
    #[arg(long)]
    gearcraft: bool,
    /// Emit Radiant MAP.
    #[arg(long)]
    radiant: bool,
    /// Emit MoH Radiant MAP.
    #[arg(long)]
    moh: bool,
    /// Emit DoomEdit MAP.
    #[arg(long)]
    doomedit: bool,
    /// Pick one dialect from the detected format family.
    #[arg(long, conflicts_with_all = ["vmf", "gearcraft", "radiant", "moh", "doomedit"])]
    auto: bool,

    /// Replace sky/nodraw/hint/skip surfaces with the null texture.
    #[arg(long)]
    replace_special_textures: bool,
    /// Zero out per-side surface flags.
    #[arg(long)]
    strip_face_flags: bool,
    /// Attach every brush to worldspawn.
    #[arg(long)]
    brushes_to_world: bool,
    /// Leave texture shifts baked to the level origin.
    #[arg(long)]
    no_texture_correction: bool,
    /// Skip legacy fire-action entity remapping.
    #[arg(long)]
    no_entity_correction: bool,
}

impl Args {
    fn explicit_dialects(&self) -> Vec<Dialect> {
        let mut dialects = Vec::new();
        if self.vmf {
            dialects.push(Dialect::Vmf);
        }
        if self.gearcraft {
            dialects.push(Dialect::Gearcraft);
        }
        if self.radiant {
            dialects.push(Dialect::Radiant);
        }
        if self.moh {
            dialects.push(Dialect::MohRadiant);
        }
        if self.doomedit {
            dialects.push(Dialect::DoomEdit);
        }
        dialects
    }

    fn settings(&self) -> Settings {
        Settings {
            replace_special_textures: self.replace_special_textures,
            strip_face_flags: self.strip_face_flags,
            brushes_to_world: self.brushes_to_world,
            texture_correction: !self.no_texture_correction,
            entity_correction: !self.no_entity_correction,
        }
    }
}

/// Bridges the engine's progress/log reporting onto a scheduler job.
struct JobSink<'a> {
    context: &'a JobContext,
}

impl ProgressSink for JobSink<'_> {
    fn progress(&self, fraction: f32) {
        self.context.progress(fraction);
    }
    fn log(&self, message: &str, is_error: bool) {
        self.context.log(message, is_error);
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(all_succeeded) => {
            if all_succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let hint = match &args.format {
        Some(name) => Some(
            BspVariant::from_name(name)
                .ok_or_else(|| anyhow!("unknown format variant {name:?}"))?,
        ),
        None => None,
    };
    let explicit = args.explicit_dialects();
    let settings = args.settings();
    let output_dir = args.output.clone();

    let scheduler = Scheduler::new(args.jobs);
    let mut handles = Vec::with_capacity(args.files.len());

    for path in &args.files {
        let path = path.clone();
        let name = path.display().to_string();
        let explicit = explicit.clone();
        let settings = settings.clone();
        let output_dir = output_dir.clone();

        let handle = scheduler.submit(name, move |context| {
            decompile_one(&path, hint, &explicit, &settings, output_dir, context)
                .map_err(|err| format!("{err:#}"))
        });
        handles.push(handle);
    }

    scheduler.wait_idle();

    let mut all_succeeded = true;
    for handle in &handles {
        for event in handle.events.try_iter() {
            if let JobEvent::Log(message) = event {
                if message.is_error {
                    eprintln!("{}: {}", handle.name(), message.text);
                } else {
                    println!("{}: {}", handle.name(), message.text);
                }
            }
        }
        if handle.state() == JobState::Failed {
            all_succeeded = false;
        }
    }
    Ok(all_succeeded)
}

fn decompile_one(
    path: &PathBuf,
    hint: Option<BspVariant>,
    explicit: &[Dialect],
    settings: &Settings,
    output_dir: Option<PathBuf>,
    context: &JobContext,
) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let bsp = BspFile::open(&bytes, hint)?;

    let sink = JobSink { context };
    let doc = decompile(&bsp, settings, &sink)?;

    let dialects = if explicit.is_empty() {
        vec![Dialect::auto_for(bsp.variant())]
    } else {
        explicit.to_vec()
    };
    let written = unbsp_write::write_all(
        &doc,
        path,
        &WriteOptions {
            dialects,
            output_dir,
            entity_correction: settings.entity_correction,
        },
    )?;
    for path in written {
        context.log(&format!("wrote {}", path.display()), false);
    }
    Ok(())
}
