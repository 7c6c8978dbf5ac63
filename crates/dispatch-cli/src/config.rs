//! Run defaults from environment.

use std::env;

use dispatch_core::PlannerConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub seed: Option<u64>,
    pub population: Option<usize>,
    pub generations: Option<usize>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparsable values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            seed: lookup("DISPATCH_SEED").and_then(|s| s.parse().ok()),
            population: lookup("DISPATCH_POPULATION").and_then(|s| s.parse().ok()),
            generations: lookup("DISPATCH_GENERATIONS").and_then(|s| s.parse().ok()),
        }
    }

    /// Later values win field by field.
    pub fn merge(self, overrides: Config) -> Self {
        Self {
            seed: overrides.seed.or(self.seed),
            population: overrides.population.or(self.population),
            generations: overrides.generations.or(self.generations),
        }
    }

    pub fn planner_config(&self) -> PlannerConfig {
        let mut config = PlannerConfig::default();
        if let Some(seed) = self.seed {
            config.genetic.seed = Some(seed);
        }
        if let Some(population) = self.population {
            config.genetic.population_size = population;
        }
        if let Some(generations) = self.generations {
            config.genetic.generations = generations;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn reads_known_keys_and_skips_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DISPATCH_SEED", "42"),
            ("DISPATCH_POPULATION", "not-a-number"),
            ("DISPATCH_GENERATIONS", "12"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.population, None);
        assert_eq!(config.generations, Some(12));
    }

    #[test]
    fn flags_override_environment() {
        let env = Config {
            seed: Some(1),
            population: Some(40),
            generations: None,
        };
        let flags = Config {
            seed: Some(7),
            population: None,
            generations: Some(5),
        };

        let merged = env.merge(flags);
        assert_eq!(merged.seed, Some(7));
        assert_eq!(merged.population, Some(40));

        let planner = merged.planner_config();
        assert_eq!(planner.genetic.seed, Some(7));
        assert_eq!(planner.genetic.population_size, 40);
        assert_eq!(planner.genetic.generations, 5);
    }

    #[test]
    fn unset_values_keep_planner_defaults() {
        let planner = Config::default().planner_config();
        assert_eq!(planner.genetic.population_size, 30);
        assert_eq!(planner.genetic.generations, 75);
        assert_eq!(planner.genetic.seed, None);
    }
}
