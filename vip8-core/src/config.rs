/// How the delay and sound timers are clocked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimerMode {
    #[default]
    RealTime,
    /// One tick per executed instruction, as the legacy interpreter did.
    PerCycle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub cycle_rate: Option<u32>, // instructions per second, unthrottled when None
    pub timer_mode: TimerMode,
    pub index_overflow_flag: bool,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_rate: Some(700),
            timer_mode: TimerMode::RealTime,
            index_overflow_flag: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Unthrottled, per-cycle timers and a fixed seed: reproducible runs.
    pub fn deterministic(seed: u64) -> Self {
        Self {
            cycle_rate: None,
            timer_mode: TimerMode::PerCycle,
            seed: Some(seed),
            ..Self::default()
        }
    }
}
