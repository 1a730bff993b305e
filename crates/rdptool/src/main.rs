mod cli;
mod replay;
mod trace;

use std::path::Path;

use bytesize::ByteSize;
use clap::Parser;
use eyre_pretty::eyre::Result;
use rdp::Rdp;
use rdp::modules::display::NopDisplayModule;
use rdp::system::cmd::opcode::Opcode;
use rdp::system::scanout::Scaling;
use rdp::system::{self, Modules};

use crate::replay::Placement;
use crate::trace::{Trace, TraceBackend};

fn setup_tracing(path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let file = std::fs::File::options()
        .truncate(true)
        .create(true)
        .write(true)
        .open(path)?;

    let (file_nb, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer().with_writer(file_nb).with_ansi(false);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or(EnvFilter::new("rdp=debug,renderer=debug,rdptool=debug"));

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(env_filter);

    subscriber.init();

    Ok(guard)
}

fn load_config(cfg: &cli::Config) -> Result<system::Config> {
    let mut config = match &cfg.config {
        Some(path) => ron::from_str(&std::fs::read_to_string(path)?)?,
        None => system::Config::default(),
    };

    if let Some(size) = cfg.ram_size {
        config.ram_size = size.as_u64() as usize;
    }

    config.widescreen |= cfg.display.widescreen;
    config.crop_overscan |= cfg.display.crop_overscan;
    if cfg.display.integer_scaling {
        config.scaling = Scaling::Integer;
    }

    Ok(config)
}

fn print_trace(trace: &Trace) {
    println!(
        "forwarded {} commands ({} slots)",
        trace.total_commands(),
        trace.slots
    );

    let mut counts = trace
        .commands
        .iter()
        .enumerate()
        .filter(|(_, count)| **count != 0)
        .collect::<Vec<_>>();
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

    for (op, count) in counts {
        match Opcode::from_repr(op as u8) {
            Some(opcode) => println!("  {count:>8} {opcode:?}"),
            None => println!("  {count:>8} 0x{op:02X}"),
        }
    }

    println!(
        "signaled {} fences, waited {} times",
        trace.signaled.0,
        trace.waits.len()
    );
}

fn main() -> Result<()> {
    eyre_pretty::install()?;
    let cfg = cli::Config::parse();
    let _tracing_guard = setup_tracing(&cfg.log)?;

    let config = load_config(&cfg)?;
    let dump = std::fs::read(&cfg.input)?;
    let words = replay::words(&dump);
    tracing::info!(
        "replaying {} ({})",
        cfg.input.display(),
        ByteSize::b(dump.len() as u64)
    );

    let backend = TraceBackend::default();
    let modules = Modules {
        backend: Box::new(backend.clone()),
        display: Box::new(NopDisplayModule),
    };

    let mut rdp = Rdp::new(modules, config)?;
    let placement = if cfg.dmem {
        Placement::Dmem
    } else {
        Placement::Ram {
            address: cfg.address,
        }
    };

    replay::place(&mut rdp, placement, &words)?;
    let summary = replay::submit(&mut rdp, placement, words.len() / 2, cfg.chunk);
    rdp.present_frame();

    println!(
        "{} submissions, {} interrupts (last delay {})",
        summary.submissions, summary.interrupts, summary.last_delay
    );

    let pending = rdp.sys.cmd.buffer.pending();
    if pending != 0 {
        println!("{pending} slots left pending in an incomplete command");
    }

    if let Some(path) = &cfg.snapshot {
        let mut snapshot = vec![0; Rdp::snapshot_size()];
        rdp.save(&mut snapshot)?;
        std::fs::write(path, &snapshot)?;
        println!(
            "wrote snapshot to {} ({})",
            path.display(),
            ByteSize::b(snapshot.len() as u64)
        );
    }

    rdp.destroy();
    self::print_trace(&backend.trace());

    Ok(())
}
