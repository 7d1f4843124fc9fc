use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use log::{error, info, LevelFilter};
use signal_hook::consts::{SIGINT, SIGTERM};
use simple_logger::SimpleLogger;

use stagger::hydro::RunOutcome;
use stagger::message::{Communicator, LocalCommunicator, TcpCommunicator};
use stagger::{Config, Error, Hydro, Result};




#[derive(Debug, Parser)]
#[clap(version, about = "Staggered-mesh compressible hydrodynamics")]
struct Opts {
    /// Problem description in JSON; the built-in problem is used if omitted
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// Number of ranks to run as threads of this process
    #[clap(short = 'n', long, default_value = "1")]
    ranks: usize,

    /// Rank of this process in a TCP job
    #[clap(long, requires = "peers")]
    rank: Option<usize>,

    /// Comma-separated listening addresses of every rank in a TCP job
    #[clap(long, value_delimiter = ',')]
    peers: Vec<SocketAddr>,

    /// Tiles per chunk
    #[clap(short, long)]
    tiles: Option<usize>,

    #[clap(long)]
    end_step: Option<u64>,

    #[clap(long)]
    end_time: Option<f64>,

    /// Write the summary history to this file as CBOR
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Report time spent in each phase
    #[clap(long)]
    profile: bool,

    /// Pin each local rank thread to its own core
    #[clap(long)]
    pin_cores: bool,

    #[clap(short, long, default_value = "info")]
    log_level: LevelFilter,
}




// ============================================================================
fn load_config(opts: &Opts) -> Result<Config> {
    let mut config = match &opts.input {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(tiles) = opts.tiles {
        config.tiles_per_chunk = tiles
    }
    if let Some(end_step) = opts.end_step {
        config.end_step = end_step
    }
    if let Some(end_time) = opts.end_time {
        config.end_time = end_time
    }
    if opts.output.is_some() {
        config.summary_output = opts.output.clone()
    }
    if opts.profile {
        config.profiler = true
    }
    config.validate()?;
    Ok(config)
}




/**
 * Run one rank to completion. A failure on this rank, in setup or while
 * stepping, is passed to every peer through the abort path before it is
 * returned.
 */
fn run_rank<C: Communicator>(config: Config, comm: C, interrupt: Arc<AtomicBool>) -> Result<RunOutcome> {
    let rank = comm.rank();

    Hydro::new(config, comm)
        .and_then(|hydro| {
            let mut hydro = hydro.with_interrupt(interrupt);
            hydro.run().map_err(|e| {
                hydro.comm().abort(&e.to_string());
                e
            })
        })
        .map_err(|e| {
            error!("rank {}: {}", rank, e);
            e
        })
}




fn run_local(config: Config, ranks: usize, pin_cores: bool, interrupt: Arc<AtomicBool>) -> Result<()> {
    if ranks == 0 {
        return Err(Error::Config("at least one rank is needed".into()))
    }
    let cores = if pin_cores {
        core_affinity::get_core_ids().unwrap_or_default()
    } else {
        Vec::new()
    };

    let handles: Vec<_> = LocalCommunicator::group(ranks)
        .into_iter()
        .map(|comm| {
            let config = config.clone();
            let interrupt = interrupt.clone();
            let core = cores.get(comm.rank() % cores.len().max(1)).cloned();

            thread::spawn(move || {
                if let Some(core) = core {
                    core_affinity::set_for_current(core);
                }
                run_rank(config, comm, interrupt)
            })
        })
        .collect();

    let mut result = Ok(());

    for (rank, handle) in handles.into_iter().enumerate() {
        let outcome = match handle.join() {
            Ok(outcome) => outcome.map(|_| ()),
            Err(_) => Err(Error::Aborted { rank, reason: "rank thread panicked".into() }),
        };
        if result.is_ok() {
            result = outcome
        }
    }
    result
}




fn run(opts: Opts) -> Result<()> {
    let config = load_config(&opts)?;
    let interrupt = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&interrupt))?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&interrupt))?;

    match opts.rank {
        Some(rank) => {
            if rank == 0 {
                info!("{} x {} cells on {} ranks of {} tiles", config.grid.x_cells, config.grid.y_cells, opts.peers.len(), config.tiles_per_chunk);
            }
            let comm = TcpCommunicator::new(rank, opts.peers.clone())?;
            run_rank(config, comm, interrupt).map(|_| ())
        }
        None => {
            info!("{} x {} cells on {} local ranks of {} tiles", config.grid.x_cells, config.grid.y_cells, opts.ranks, config.tiles_per_chunk);
            run_local(config, opts.ranks, opts.pin_cores, interrupt)
        }
    }
}




// ============================================================================
fn main() {
    let opts = Opts::parse();

    if let Err(e) = SimpleLogger::new().with_level(opts.log_level).init() {
        eprintln!("{}", e);
    }
    if let Err(e) = run(opts) {
        error!("{}", e);
        std::process::exit(1);
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use stagger::grid::Grid;

    fn quiet() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn zero_ranks_is_a_config_error() {
        assert!(matches!(run_local(Config::default(), 0, false, quiet()), Err(Error::Config(_))));
    }

    #[test]
    fn local_ranks_run_to_the_step_limit() {
        let config = Config { end_step: 2, ..Config::default() };
        assert!(run_local(config, 2, false, quiet()).is_ok());
    }

    #[test]
    fn a_rank_that_cannot_be_tiled_fails_the_job() {
        let grid = Grid { x_cells: 7, y_cells: 1, xmin: 0.0, xmax: 7.0, ymin: 0.0, ymax: 1.0 };
        let config = Config { grid, tiles_per_chunk: 4, end_step: 2, ..Config::default() };
        assert!(run_local(config, 2, false, quiet()).is_err());
    }

    #[test]
    fn command_line_overrides_the_defaults() {
        let opts = Opts::parse_from(vec!["stagger", "--tiles", "3", "--end-step", "9", "--profile"]);
        let config = load_config(&opts).unwrap();
        assert_eq!(config.tiles_per_chunk, 3);
        assert_eq!(config.end_step, 9);
        assert!(config.profiler);
        assert_eq!(opts.ranks, 1);
    }
}
