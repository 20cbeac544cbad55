//! Vacation block solver.
//!
//! Assigns each fellow up to two vacation blocks, spaced at least the
//! configured minimum apart, under a system-wide per-block capacity shared
//! across tiers. Candidate pairs are enumerated preference-tiered:
//! (preferred, preferred) first, then (preferred, other), then
//! (other, other), with each tier ordered to favor pairs centered in the
//! year.
//!
//! # Search
//! Backtracking over pair choices with an explicit frame stack (candidate
//! list + chosen index + undo via the load map), bounded by a try counter
//! and a wall-clock budget. Because a single ordering can stall, the solver
//! runs five independent fellow orderings (most-constrained-first,
//! least-constrained-first, two seeded shuffles, preference-count
//! descending) and accepts the first that places a full pair for every
//! fellow. When none does, the best greedy degradation (pairs where they
//! fit, then single blocks, then nothing) is returned with diagnostics.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::models::{Fellow, RotationTable, RuleConfig, VacationRules, BLOCKS_PER_YEAR, VACATION};

/// Result of a vacation solving run.
#[derive(Debug, Clone)]
pub struct VacationOutcome {
    /// Rotation table with vacation blocks filled in.
    pub table: RotationTable,
    /// Blocks granted per fellow, ascending.
    pub placements: HashMap<String, Vec<u8>>,
    /// Whether every fellow received a full pair.
    pub complete: bool,
    /// Human-readable notes on zero-pair fellows and saturated blocks.
    pub diagnostics: Vec<String>,
}

/// Vacation block solver over one roster.
pub struct VacationSolver<'a> {
    roster: &'a [Fellow],
    rules: &'a VacationRules,
    table: &'a RotationTable,
    block_load: HashMap<u8, u32>,
    seed: u64,
}

/// One decision point in the explicit search stack.
struct Frame {
    fellow: usize,
    options: Vec<(u8, u8)>,
    chosen: usize,
}

impl<'a> VacationSolver<'a> {
    /// Creates a solver over a roster and its rotation table.
    pub fn new(roster: &'a [Fellow], rules: &'a RuleConfig, table: &'a RotationTable) -> Self {
        Self {
            roster,
            rules: &rules.vacation,
            table,
            block_load: HashMap::new(),
            seed: 0,
        }
    }

    /// Seeds the per-block load with blocks already granted to other tiers
    /// this run, so cross-tier capacity holds.
    pub fn with_block_load(mut self, load: HashMap<u8, u32>) -> Self {
        self.block_load = load;
        self
    }

    /// Sets the random seed for the shuffled orderings.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Runs the solver.
    pub fn solve(&self) -> VacationOutcome {
        let mut diagnostics = self.structural_diagnostics();

        if self.rules.blocks_per_fellow < 2 {
            let placements = self.greedy(&(0..self.roster.len()).collect::<Vec<_>>());
            let complete = self.roster.iter().all(|f| {
                placements.get(&f.id).map(Vec::len).unwrap_or(0)
                    == usize::from(self.rules.blocks_per_fellow)
            });
            return self.finish(placements, complete, diagnostics);
        }

        for (label, order) in self.orderings() {
            debug!(ordering = label, "vacation solver attempt");
            if let Some(pairs) = self.backtrack(&order) {
                info!(ordering = label, "vacation solver placed all pairs");
                let placements = pairs
                    .into_iter()
                    .map(|(id, (a, b))| (id, vec![a, b]))
                    .collect();
                return self.finish(placements, true, diagnostics);
            }
        }

        warn!("vacation solver exhausted all orderings; degrading");
        let mut best: Option<(usize, HashMap<String, Vec<u8>>)> = None;
        for (_, order) in self.orderings() {
            let placements = self.greedy(&order);
            let pairs = placements.values().filter(|blocks| blocks.len() == 2).count();
            if best.as_ref().is_none_or(|(b, _)| pairs > *b) {
                best = Some((pairs, placements));
            }
        }
        let placements = best.map(|(_, p)| p).unwrap_or_default();
        for fellow in self.roster {
            let got = placements.get(&fellow.id).map(Vec::len).unwrap_or(0);
            if got < 2 {
                diagnostics.push(format!(
                    "{} received {got} of 2 vacation blocks",
                    fellow.id
                ));
            }
        }
        self.finish(placements, false, diagnostics)
    }

    fn finish(
        &self,
        placements: HashMap<String, Vec<u8>>,
        complete: bool,
        diagnostics: Vec<String>,
    ) -> VacationOutcome {
        let mut table = self.table.clone();
        for (fellow, blocks) in &placements {
            for block in blocks {
                table.set(fellow.clone(), *block, VACATION);
            }
        }
        VacationOutcome {
            table,
            placements,
            complete,
            diagnostics,
        }
    }

    /// Notes fellows with no structurally valid pair and blocks already
    /// saturated by previously solved tiers.
    fn structural_diagnostics(&self) -> Vec<String> {
        let mut notes = Vec::new();
        for (block, load) in &self.block_load {
            if *load >= self.rules.max_per_block {
                notes.push(format!("block {block} saturated before solving"));
            }
        }
        notes.sort();
        for fellow in self.roster {
            if self.pair_options(fellow, &self.block_load).is_empty() {
                notes.push(format!("{} has no valid vacation pair", fellow.id));
            }
        }
        notes
    }

    /// Candidate pairs for a fellow under the current load, best first.
    ///
    /// Preference tier (2, 1, then 0 preferred members) dominates; within a
    /// tier, pairs centered in the year come first.
    fn pair_options(&self, fellow: &Fellow, load: &HashMap<u8, u32>) -> Vec<(u8, u8)> {
        let gap = self.rules.min_gap_blocks;
        let mut options: Vec<(u8, u8)> = Vec::new();
        for a in 0..BLOCKS_PER_YEAR {
            for b in (a + gap)..BLOCKS_PER_YEAR {
                if self.block_open(a, load) && self.block_open(b, load) {
                    options.push((a, b));
                }
            }
        }
        let prefs = &fellow.vacation_prefs;
        let center = f64::from(BLOCKS_PER_YEAR - 1) / 2.0;
        options.sort_by(|x, y| {
            let tier = |p: &(u8, u8)| {
                2 - (prefs.contains(&p.0) as i32) - (prefs.contains(&p.1) as i32)
            };
            let off_center = |p: &(u8, u8)| {
                (f64::from(p.0 + p.1) / 2.0 - center).abs()
            };
            tier(x)
                .cmp(&tier(y))
                .then(off_center(x).total_cmp(&off_center(y)))
                .then(x.cmp(y))
        });
        options
    }

    fn block_open(&self, block: u8, load: &HashMap<u8, u32>) -> bool {
        load.get(&block).copied().unwrap_or(0) < self.rules.max_per_block
    }

    /// The five fellow orderings attempted, labeled for logging.
    fn orderings(&self) -> Vec<(&'static str, Vec<usize>)> {
        let seed_load = self.block_load.clone();
        let pref_pairs: Vec<usize> = self
            .roster
            .iter()
            .map(|f| {
                self.pair_options(f, &seed_load)
                    .iter()
                    .filter(|(a, b)| {
                        f.vacation_prefs.contains(a) && f.vacation_prefs.contains(b)
                    })
                    .count()
            })
            .collect();

        let mut most_constrained: Vec<usize> = (0..self.roster.len()).collect();
        most_constrained.sort_by_key(|&i| pref_pairs[i]);
        let least_constrained: Vec<usize> = most_constrained.iter().rev().copied().collect();

        let mut shuffle_a: Vec<usize> = (0..self.roster.len()).collect();
        shuffle_a.shuffle(&mut StdRng::seed_from_u64(self.seed));
        let mut shuffle_b: Vec<usize> = (0..self.roster.len()).collect();
        shuffle_b.shuffle(&mut StdRng::seed_from_u64(self.seed.wrapping_add(1)));

        let mut by_pref_count: Vec<usize> = (0..self.roster.len()).collect();
        by_pref_count
            .sort_by_key(|&i| std::cmp::Reverse(self.roster[i].vacation_prefs.len()));

        vec![
            ("most-constrained", most_constrained),
            ("least-constrained", least_constrained),
            ("shuffle-a", shuffle_a),
            ("shuffle-b", shuffle_b),
            ("pref-count", by_pref_count),
        ]
    }

    /// Bounded backtracking over pair choices in one fellow ordering.
    ///
    /// Returns the pair per fellow on full success, `None` when the search
    /// space or the budget is exhausted.
    fn backtrack(&self, order: &[usize]) -> Option<HashMap<String, (u8, u8)>> {
        let started = Instant::now();
        let budget = Duration::from_millis(self.rules.time_budget_ms);
        let mut tries: u32 = 0;
        let mut load = self.block_load.clone();
        let mut stack: Vec<Frame> = Vec::with_capacity(order.len());

        while stack.len() < order.len() {
            let fellow = order[stack.len()];
            let mut frame = Frame {
                fellow,
                options: self.pair_options(&self.roster[fellow], &load),
                chosen: 0,
            };

            loop {
                if let Some(&(a, b)) = frame.options.get(frame.chosen) {
                    tries += 1;
                    if tries > self.rules.attempt_limit || started.elapsed() > budget {
                        debug!(tries, "vacation attempt budget exhausted");
                        return None;
                    }
                    *load.entry(a).or_insert(0) += 1;
                    *load.entry(b).or_insert(0) += 1;
                    stack.push(frame);
                    break;
                }
                // Options exhausted: undo the previous placement and advance.
                let mut prev = stack.pop()?;
                let (a, b) = prev.options[prev.chosen];
                if let Some(n) = load.get_mut(&a) {
                    *n -= 1;
                }
                if let Some(n) = load.get_mut(&b) {
                    *n -= 1;
                }
                prev.chosen += 1;
                frame = prev;
            }
        }

        Some(
            stack
                .iter()
                .map(|f| {
                    let (a, b) = f.options[f.chosen];
                    (self.roster[f.fellow].id.clone(), (a, b))
                })
                .collect(),
        )
    }

    /// Greedy degradation: best pair if one fits, else best single, else
    /// nothing.
    fn greedy(&self, order: &[usize]) -> HashMap<String, Vec<u8>> {
        let mut load = self.block_load.clone();
        let mut placements: HashMap<String, Vec<u8>> = HashMap::new();
        let want = self.rules.blocks_per_fellow;
        for &idx in order {
            let fellow = &self.roster[idx];
            if want >= 2 {
                if let Some(&(a, b)) = self.pair_options(fellow, &load).first() {
                    *load.entry(a).or_insert(0) += 1;
                    *load.entry(b).or_insert(0) += 1;
                    placements.insert(fellow.id.clone(), vec![a, b]);
                    continue;
                }
            }
            if want >= 1 {
                if let Some(block) = self.single_option(fellow, &load) {
                    *load.entry(block).or_insert(0) += 1;
                    placements.insert(fellow.id.clone(), vec![block]);
                }
            }
        }
        placements
    }

    /// Best single block for a fellow: preferred blocks first, then
    /// year-centered.
    fn single_option(&self, fellow: &Fellow, load: &HashMap<u8, u32>) -> Option<u8> {
        let center = f64::from(BLOCKS_PER_YEAR - 1) / 2.0;
        let mut open: Vec<u8> = (0..BLOCKS_PER_YEAR)
            .filter(|b| self.block_open(*b, load))
            .collect();
        open.sort_by(|x, y| {
            let pref = |b: &u8| !fellow.vacation_prefs.contains(b);
            let off = |b: &u8| (f64::from(*b) - center).abs();
            pref(x)
                .cmp(&pref(y))
                .then(off(x).total_cmp(&off(y)))
                .then(x.cmp(y))
        });
        open.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PgyLevel;

    fn fellow(id: &str, prefs: Vec<u8>) -> Fellow {
        Fellow::new(id, id.to_uppercase(), PgyLevel::Pgy5).with_vacation_prefs(prefs)
    }

    #[test]
    fn test_preferred_pair_honored() {
        let roster = vec![fellow("f1", vec![2, 14])];
        let rules = RuleConfig::default();
        let table = RotationTable::new();
        let outcome = VacationSolver::new(&roster, &rules, &table).solve();
        assert!(outcome.complete);
        assert_eq!(outcome.placements["f1"], vec![2, 14]);
        assert!(outcome.table.is_vacation("f1", 2));
        assert!(outcome.table.is_vacation("f1", 14));
    }

    #[test]
    fn test_minimum_gap_enforced() {
        // Preferences too close together: the solver still spaces the pair.
        let roster = vec![fellow("f1", vec![10, 12])];
        let rules = RuleConfig::default();
        let table = RotationTable::new();
        let outcome = VacationSolver::new(&roster, &rules, &table).solve();
        assert!(outcome.complete);
        let blocks = &outcome.placements["f1"];
        assert!(blocks[1] - blocks[0] >= rules.vacation.min_gap_blocks);
    }

    #[test]
    fn test_block_capacity_respected() {
        // Five fellows all wanting the same two blocks: at most two can
        // have each.
        let roster: Vec<Fellow> = (0..5)
            .map(|i| fellow(&format!("f{i}"), vec![4, 16]))
            .collect();
        let rules = RuleConfig::default();
        let table = RotationTable::new();
        let outcome = VacationSolver::new(&roster, &rules, &table).solve();
        assert!(outcome.complete);

        let mut load: HashMap<u8, u32> = HashMap::new();
        for blocks in outcome.placements.values() {
            assert_eq!(blocks.len(), 2);
            assert!(blocks[1] - blocks[0] >= rules.vacation.min_gap_blocks);
            for b in blocks {
                *load.entry(*b).or_insert(0) += 1;
            }
        }
        assert!(load.values().all(|n| *n <= rules.vacation.max_per_block));
    }

    #[test]
    fn test_seed_load_counts_against_capacity() {
        let roster = vec![fellow("f1", vec![4, 16])];
        let rules = RuleConfig::default();
        let table = RotationTable::new();
        // Block 4 already holds two fellows from another tier.
        let outcome = VacationSolver::new(&roster, &rules, &table)
            .with_block_load(HashMap::from([(4u8, 2u32)]))
            .solve();
        assert!(outcome.complete);
        assert!(!outcome.placements["f1"].contains(&4));
        assert!(outcome
            .diagnostics
            .iter()
            .any(|n| n.contains("block 4 saturated")));
    }

    #[test]
    fn test_saturated_year_degrades_with_diagnostics() {
        let roster = vec![fellow("f1", vec![])];
        let rules = RuleConfig::default();
        let table = RotationTable::new();
        let load: HashMap<u8, u32> = (0..BLOCKS_PER_YEAR).map(|b| (b, 2)).collect();
        let outcome = VacationSolver::new(&roster, &rules, &table)
            .with_block_load(load)
            .solve();
        assert!(!outcome.complete);
        assert!(outcome.placements.get("f1").is_none());
        assert!(outcome
            .diagnostics
            .iter()
            .any(|n| n.contains("no valid vacation pair")));
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let roster: Vec<Fellow> = (0..6)
            .map(|i| fellow(&format!("f{i}"), vec![i as u8, i as u8 + 12]))
            .collect();
        let rules = RuleConfig::default();
        let table = RotationTable::new();
        let a = VacationSolver::new(&roster, &rules, &table)
            .with_seed(7)
            .solve();
        let b = VacationSolver::new(&roster, &rules, &table)
            .with_seed(7)
            .solve();
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn test_vacation_overwrites_rotation() {
        let roster = vec![fellow("f1", vec![0, 8])];
        let rules = RuleConfig::default();
        let table = RotationTable::new().with_assignment("f1", 0, "CCU");
        let outcome = VacationSolver::new(&roster, &rules, &table).solve();
        let blocks = &outcome.placements["f1"];
        for b in blocks {
            assert_eq!(outcome.table.get("f1", *b), Some(VACATION));
        }
    }
}
