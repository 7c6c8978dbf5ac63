//! Planner constants and tuning knobs.

use serde::{Deserialize, Serialize};

/// Top-level planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub energy: EnergyRules,
    pub graph: GraphRules,
    pub search: SearchConfig,
    pub genetic: GeneticConfig,
    /// Segment samples used for zone crossing tests (steps + 1 points)
    pub zone_sample_steps: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            energy: EnergyRules::default(),
            graph: GraphRules::default(),
            search: SearchConfig::default(),
            genetic: GeneticConfig::default(),
            zone_sample_steps: crate::geometry::SEGMENT_SAMPLE_STEPS,
        }
    }
}

/// Energy, recharge and edge-cost rules shared by every planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyRules {
    /// Energy per distance unit with no payload
    pub base_consumption: f64,
    /// Extra fraction of consumption per unit of payload weight
    pub weight_factor: f64,
    /// Time spent on a full recharge
    pub recharge_delay: f64,
    /// Edge cost discount per priority level above 1
    pub priority_discount: f64,
}

impl Default for EnergyRules {
    fn default() -> Self {
        Self {
            base_consumption: 10.0,
            weight_factor: 0.2,
            recharge_delay: 5.0,
            priority_discount: 5.0,
        }
    }
}

/// Static delivery graph weights. Informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphRules {
    pub priority_cost: f64,
    pub zone_penalty: f64,
}

impl Default for GraphRules {
    fn default() -> Self {
        Self {
            priority_cost: 100.0,
            zone_penalty: 10_000.0,
        }
    }
}

/// Single-agent search budget and heuristic weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_expansions: usize,
    /// Heuristic penalty when the straight path crosses an active zone
    pub route_zone_penalty: f64,
    /// Heuristic penalty when the delivery point sits inside an active zone
    pub destination_zone_penalty: f64,
    /// Priority weight used by the greedy fallback ranking
    pub greedy_priority_weight: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_expansions: 100,
            route_zone_penalty: 50.0,
            destination_zone_penalty: 100.0,
            greedy_priority_weight: 2.0,
        }
    }
}

/// Genetic optimizer parameters and fitness weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub tournament_size: usize,
    /// One elite per this many individuals, rounded up
    pub elite_divisor: usize,
    pub min_elite: usize,
    pub completion_reward: f64,
    pub energy_weight: f64,
    pub violation_penalty: f64,
    /// Seed for the planner-owned RNG; entropy when unset
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            generations: 75,
            mutation_rate: 0.15,
            tournament_size: 3,
            elite_divisor: 10,
            min_elite: 2,
            completion_reward: 50.0,
            energy_weight: 0.1,
            violation_penalty: 100.0,
            seed: None,
        }
    }
}

impl GeneticConfig {
    /// Number of individuals carried over unchanged, never more than the population.
    pub fn elite_count(&self) -> usize {
        self.population_size
            .div_ceil(self.elite_divisor.max(1))
            .max(self.min_elite)
            .min(self.population_size)
    }
}
