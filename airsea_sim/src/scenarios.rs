//! Fleet scenarios for deterministic simulation.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// SIM-001: parked nodes with GPS noise under the movement threshold
    StationaryJitter,
    
    /// SIM-002: nodes driving around town with moderate noise
    Commute,
    
    /// SIM-003: intermittent and permanently lost GPS fixes
    GpsDropout,
    
    /// SIM-004: fast movers that overflow the track bound
    LongHaul,
    
    /// SIM-005: malformed payloads interleaved with real traffic
    Garbage,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::StationaryJitter,
            ScenarioId::Commute,
            ScenarioId::GpsDropout,
            ScenarioId::LongHaul,
            ScenarioId::Garbage,
        ]
    }
    
    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::StationaryJitter => "stationary_jitter",
            ScenarioId::Commute => "commute",
            ScenarioId::GpsDropout => "gps_dropout",
            ScenarioId::LongHaul => "long_haul",
            ScenarioId::Garbage => "garbage",
        }
    }
    
    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::StationaryJitter => "Parked nodes with 1m GPS noise, every track stays at one point",
            ScenarioId::Commute => "Nodes moving 2-15 m/s with 3m noise, spacing and bound hold",
            ScenarioId::GpsDropout => "30% fix dropouts plus a node that never gets a fix",
            ScenarioId::LongHaul => "50 m/s movers for 300 cycles, tracks capped at 200 points",
            ScenarioId::Garbage => "Malformed payloads every cycle, rejected without touching state",
        }
    }
    
    /// Poll cycles the scenario needs to exercise its invariants.
    pub fn default_cycles(&self) -> u64 {
        match self {
            ScenarioId::LongHaul => 300,
            _ => 60,
        }
    }
    
    /// Seconds between poll cycles.
    pub fn cycle_secs(&self) -> f64 {
        match self {
            ScenarioId::LongHaul => 1.0,
            _ => 5.0,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stationary_jitter" | "stationary" | "sim-001" => Ok(ScenarioId::StationaryJitter),
            "commute" | "sim-002" => Ok(ScenarioId::Commute),
            "gps_dropout" | "dropout" | "sim-003" => Ok(ScenarioId::GpsDropout),
            "long_haul" | "longhaul" | "sim-004" => Ok(ScenarioId::LongHaul),
            "garbage" | "sim-005" => Ok(ScenarioId::Garbage),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
