// Rarity draw and character selection.
// Two-step draw: inverse-CDF over the weight table, then a uniform pick within the tier.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GachaError;
use crate::types::*;

/// Draw a tier from a roll in `[0, 1)`.
///
/// Weights are accumulated rarest-first; the first tier whose cumulative sum
/// exceeds the roll wins. If rounding leaves the roll uncovered, the commonest
/// tier is returned.
pub fn determine_rarity(table: &RarityTable, roll: f64) -> Rarity {
    let mut cumulative = 0.0;
    for rarity in Rarity::DRAW_ORDER {
        cumulative += table.weight(rarity);
        if roll < cumulative {
            return rarity;
        }
    }
    Rarity::N
}

/// Characters of one tier, in pool order.
pub fn characters_by_rarity(pool: &[Character], rarity: Rarity) -> Vec<&Character> {
    pool.iter().filter(|c| c.rarity == rarity).collect()
}

/// Pick uniformly within a tier using a roll in `[0, 1)`.
///
/// An empty tier falls back to the first character of the whole pool; that
/// means the roster is misconfigured. Returns `None` only for an empty pool.
pub fn select_character(pool: &[Character], rarity: Rarity, roll: f64) -> Option<&Character> {
    let tier = characters_by_rarity(pool, rarity);
    if tier.is_empty() {
        log::warn!("No characters for rarity {}, falling back to first", rarity);
        return pool.first();
    }
    let index = ((roll * tier.len() as f64) as usize).min(tier.len() - 1);
    Some(tier[index])
}

/// Build a character from user-authored custom settings. Blank serif lines are dropped.
pub fn custom_character(custom: &CustomSettings) -> Character {
    Character {
        id: "custom".to_string(),
        name: custom.name.clone(),
        rarity: custom.rarity,
        serifs: custom
            .serifs
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect(),
        description: None,
    }
}

/// Options for a single pull.
#[derive(Debug, Clone, Copy, Default)]
pub struct PullOptions<'a> {
    /// Substitute these settings for the random draw when they are valid.
    pub custom: Option<&'a CustomSettings>,
}

/// Draw state: the weight table, the pool and the single in-flight result.
pub struct Gacha {
    table: RarityTable,
    pool: Vec<Character>,
    rng: StdRng,
    result: Option<GachaResult>,
}

impl Gacha {
    pub fn new(
        table: RarityTable,
        pool: Vec<Character>,
        seed: Option<u64>,
    ) -> Result<Self, GachaError> {
        table.validate()?;
        if pool.is_empty() {
            return Err(GachaError::InvalidConfig(
                "character pool is empty".to_string(),
            ));
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Gacha {
            table,
            pool,
            rng,
            result: None,
        })
    }

    /// True while a drawn result has not been reset.
    pub fn is_playing(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&GachaResult> {
        self.result.as_ref()
    }

    /// Draw a result. Returns `None` without touching state if a pull is already in flight.
    pub fn pull(&mut self, options: PullOptions<'_>, now: Timestamp) -> Option<&GachaResult> {
        if self.is_playing() {
            log::debug!("Pull ignored: a sequence is already playing");
            return None;
        }

        let character = match options.custom.filter(|c| c.is_valid()) {
            Some(custom) => custom_character(custom),
            None => self.draw(),
        };

        log::debug!(
            "Pulled {} '{}' ({}) at {}ms",
            character.rarity,
            character.name,
            character.id,
            now.as_millis()
        );

        self.result = Some(GachaResult {
            character,
            timestamp: now,
        });
        self.result.as_ref()
    }

    pub fn reset(&mut self) {
        self.result = None;
    }

    fn draw(&mut self) -> Character {
        let rarity = determine_rarity(&self.table, self.rng.gen::<f64>());
        let roll = self.rng.gen::<f64>();
        // Pool is non-empty by construction.
        select_character(&self.pool, rarity, roll)
            .unwrap_or(&self.pool[0])
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::default_characters;
    use proptest::prelude::*;

    fn scenario_table() -> RarityTable {
        RarityTable {
            ssr: 0.03,
            sr: 0.12,
            r: 0.35,
            n: 0.50,
        }
    }

    fn character(id: &str, rarity: Rarity) -> Character {
        Character {
            id: id.to_string(),
            name: id.to_uppercase(),
            rarity,
            serifs: vec!["line".to_string()],
            description: None,
        }
    }

    #[test]
    fn scenario_rolls_map_to_tiers() {
        let table = scenario_table();
        assert_eq!(determine_rarity(&table, 0.02), Rarity::Ssr);
        assert_eq!(determine_rarity(&table, 0.10), Rarity::Sr);
        assert_eq!(determine_rarity(&table, 0.40), Rarity::R);
        assert_eq!(determine_rarity(&table, 0.99), Rarity::N);
    }

    #[test]
    fn uncovered_roll_falls_back_to_commonest() {
        let table = RarityTable {
            ssr: 0.1,
            sr: 0.1,
            r: 0.1,
            n: 0.1,
        };
        assert_eq!(determine_rarity(&table, 0.95), Rarity::N);
    }

    #[test]
    fn select_picks_within_tier() {
        let pool = vec![
            character("a", Rarity::N),
            character("b", Rarity::Sr),
            character("c", Rarity::Sr),
        ];
        assert_eq!(select_character(&pool, Rarity::Sr, 0.0).unwrap().id, "b");
        assert_eq!(select_character(&pool, Rarity::Sr, 0.7).unwrap().id, "c");
        assert_eq!(select_character(&pool, Rarity::Sr, 0.9999).unwrap().id, "c");
    }

    #[test]
    fn empty_tier_falls_back_to_first_character() {
        let pool = vec![character("a", Rarity::N), character("b", Rarity::R)];
        assert_eq!(select_character(&pool, Rarity::Ssr, 0.5).unwrap().id, "a");
        assert!(select_character(&[], Rarity::Ssr, 0.5).is_none());
    }

    #[test]
    fn custom_pull_uses_settings_not_pool() {
        let mut gacha = Gacha::new(scenario_table(), default_characters(), Some(1)).unwrap();
        let custom = CustomSettings {
            rarity: Rarity::Sr,
            name: "Foo".to_string(),
            serifs: vec!["a".to_string(), "b".to_string()],
        };

        let result = gacha
            .pull(PullOptions { custom: Some(&custom) }, Timestamp::from_millis(42))
            .unwrap();

        assert_eq!(result.character.name, "Foo");
        assert_eq!(result.character.rarity, Rarity::Sr);
        assert_eq!(result.character.serifs, vec!["a", "b"]);
        assert_eq!(result.character.id, "custom");
        assert_eq!(result.timestamp, Timestamp::from_millis(42));
    }

    #[test]
    fn invalid_custom_falls_back_to_random_draw() {
        let pool = default_characters();
        let mut gacha = Gacha::new(scenario_table(), pool.clone(), Some(7)).unwrap();
        let custom = CustomSettings {
            rarity: Rarity::Sr,
            name: " ".to_string(),
            serifs: vec!["a".to_string()],
        };

        let result = gacha
            .pull(PullOptions { custom: Some(&custom) }, Timestamp::default())
            .unwrap();
        assert!(pool.contains(&result.character));
    }

    #[test]
    fn pull_is_noop_while_playing() {
        let mut gacha = Gacha::new(scenario_table(), default_characters(), Some(3)).unwrap();
        let first = gacha
            .pull(PullOptions::default(), Timestamp::from_millis(1))
            .cloned()
            .unwrap();

        assert!(gacha
            .pull(PullOptions::default(), Timestamp::from_millis(2))
            .is_none());
        assert_eq!(gacha.result(), Some(&first));

        gacha.reset();
        assert!(!gacha.is_playing());
        assert!(gacha
            .pull(PullOptions::default(), Timestamp::from_millis(3))
            .is_some());
    }

    #[test]
    fn rejects_empty_pool_and_bad_weights() {
        assert!(Gacha::new(scenario_table(), vec![], None).is_err());
        let bad = RarityTable {
            ssr: 0.9,
            ..scenario_table()
        };
        assert!(Gacha::new(bad, default_characters(), None).is_err());
    }

    fn table_strategy() -> impl Strategy<Value = RarityTable> {
        (0.01f64..1.0, 0.01f64..1.0, 0.01f64..1.0, 0.01f64..1.0).prop_map(|(a, b, c, d)| {
            let sum = a + b + c + d;
            let (ssr, sr, r) = (a / sum, b / sum, c / sum);
            RarityTable {
                ssr,
                sr,
                r,
                n: 1.0 - ssr - sr - r,
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Observed tier frequencies converge to the configured weights.
        #[test]
        fn draw_frequencies_converge(table in table_strategy(), seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let draws = 20_000;
            let mut counts = [0usize; 4];
            for _ in 0..draws {
                let rarity = determine_rarity(&table, rng.gen::<f64>());
                counts[rarity as usize] += 1;
            }
            for rarity in Rarity::ALL {
                let observed = counts[rarity as usize] as f64 / draws as f64;
                let expected = table.weight(rarity);
                prop_assert!(
                    (observed - expected).abs() < 0.02,
                    "{} observed {} expected {}", rarity, observed, expected
                );
            }
        }

        /// Filtering by tier keeps only that tier and preserves pool order.
        #[test]
        fn by_rarity_filters_in_order(tiers in prop::collection::vec(0usize..4, 0..40)) {
            let pool: Vec<Character> = tiers
                .iter()
                .enumerate()
                .map(|(i, t)| character(&format!("c{}", i), Rarity::ALL[*t]))
                .collect();

            for rarity in Rarity::ALL {
                let filtered = characters_by_rarity(&pool, rarity);
                prop_assert!(filtered.iter().all(|c| c.rarity == rarity));

                let expected: Vec<&Character> =
                    pool.iter().filter(|c| c.rarity == rarity).collect();
                prop_assert_eq!(filtered, expected);
            }
        }

        /// Every roll in range yields a tier with non-zero weight.
        #[test]
        fn roll_lands_on_weighted_tier(table in table_strategy(), roll in 0.0f64..1.0) {
            let rarity = determine_rarity(&table, roll);
            prop_assert!(table.weight(rarity) > 0.0 || rarity == Rarity::N);
        }
    }
}
