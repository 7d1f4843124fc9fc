use std::time::{Duration, Instant};




/**
 * The phases whose wall-clock time the profiler accumulates. The last three
 * are the halo paths: sibling tile copies, the inter-process exchange, and
 * the reflective fill on the domain edge.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Timestep,
    IdealGas,
    Viscosity,
    PdV,
    Revert,
    Acceleration,
    Flux,
    CellAdvection,
    MomAdvection,
    Reset,
    Summary,
    TileHalo,
    MpiHalo,
    SelfHalo,
}

impl Phase {
    pub const ALL: [Phase; 14] = [
        Phase::Timestep,
        Phase::IdealGas,
        Phase::Viscosity,
        Phase::PdV,
        Phase::Revert,
        Phase::Acceleration,
        Phase::Flux,
        Phase::CellAdvection,
        Phase::MomAdvection,
        Phase::Reset,
        Phase::Summary,
        Phase::TileHalo,
        Phase::MpiHalo,
        Phase::SelfHalo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Timestep => "timestep",
            Phase::IdealGas => "ideal gas",
            Phase::Viscosity => "viscosity",
            Phase::PdV => "PdV",
            Phase::Revert => "revert",
            Phase::Acceleration => "acceleration",
            Phase::Flux => "fluxes",
            Phase::CellAdvection => "cell advection",
            Phase::MomAdvection => "momentum advection",
            Phase::Reset => "reset",
            Phase::Summary => "summary",
            Phase::TileHalo => "tile halo exchange",
            Phase::MpiHalo => "mpi halo exchange",
            Phase::SelfHalo => "self halo exchange",
        }
    }
}




/**
 * Per-phase timing, owned by whoever drives the run. When disabled, `time`
 * just runs the closure.
 */
#[derive(Clone, Debug)]
pub struct Profiler {
    enabled: bool,
    totals: [Duration; 14],
}




// ============================================================================
impl Profiler {

    pub fn new(enabled: bool) -> Self {
        Self { enabled, totals: [Duration::default(); 14] }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn time<T, F: FnOnce() -> T>(&mut self, phase: Phase, f: F) -> T {
        if !self.enabled {
            return f();
        }
        let start = Instant::now();
        let result = f();
        self.totals[phase as usize] += start.elapsed();
        result
    }

    pub fn total(&self, phase: Phase) -> Duration {
        self.totals[phase as usize]
    }

    /**
     * Seconds spent in each phase, in a fixed order, for reduction across
     * ranks.
     */
    pub fn seconds(&self) -> Vec<f64> {
        Phase::ALL.iter().map(|&p| self.total(p).as_secs_f64()).collect()
    }

    /**
     * Render a table of phase times (for example the maximum over ranks)
     * against the total wall-clock time of the run.
     */
    pub fn report(seconds: &[f64], wall_clock: f64) -> String {
        let mut lines = vec![format!("{:<24} {:>12} {:>10}", "Profiler Output", "Time", "Percentage")];
        let mut accounted = 0.0;

        for (phase, &t) in Phase::ALL.iter().zip(seconds) {
            accounted += t;
            lines.push(format!("{:<24} {:>12.4} {:>10.4}", phase.name(), t, 100.0 * t / wall_clock.max(f64::MIN_POSITIVE)))
        }
        lines.push(format!("{:<24} {:>12.4} {:>10.4}", "the rest", wall_clock - accounted, 100.0 * (wall_clock - accounted) / wall_clock.max(f64::MIN_POSITIVE)));
        lines.join("\n")
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn disabled_profiler_records_nothing() {
        let mut profiler = Profiler::new(false);
        assert_eq!(profiler.time(Phase::PdV, || 3), 3);
        assert_eq!(profiler.total(Phase::PdV), Duration::default());
    }

    #[test]
    fn enabled_profiler_accumulates_per_phase() {
        let mut profiler = Profiler::new(true);
        profiler.time(Phase::MpiHalo, || std::thread::sleep(Duration::from_millis(2)));
        profiler.time(Phase::MpiHalo, || std::thread::sleep(Duration::from_millis(2)));
        assert!(profiler.total(Phase::MpiHalo) >= Duration::from_millis(4));
        assert_eq!(profiler.total(Phase::Reset), Duration::default());
        assert_eq!(profiler.seconds().len(), Phase::ALL.len());
        assert!(Profiler::report(&profiler.seconds(), 1.0).contains("mpi halo exchange"));
    }
}
