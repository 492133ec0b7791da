//! Derived stats.
//!
//! Some stats get a flat contribution from other stats (Health from
//! Stamina, Attack from Strength, Power from the combat stats). The
//! contribution is `Σ coefficient × current value of input`, fed into
//! the dependent record's derived-bonus slot.

use crate::error::StatError;
use crate::graph::StatGraph;
use crate::stat_type::StatType;
use std::collections::BTreeMap;

/// Weighted inputs of one derived stat.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFormula {
    inputs: Vec<(StatType, f64)>,
}

impl DerivedFormula {
    pub fn new(inputs: Vec<(StatType, f64)>) -> Self {
        Self { inputs }
    }

    pub fn inputs(&self) -> &[(StatType, f64)] {
        &self.inputs
    }

    /// Evaluate with a lookup for input values; missing inputs count as zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::derived::standard_formula;
    /// use charstat::StatType;
    ///
    /// let health = standard_formula(&StatType::Health).unwrap();
    /// let bonus = health.evaluate(|stat| match stat {
    ///     StatType::Stamina => Some(12.0),
    ///     _ => None,
    /// });
    /// assert_eq!(bonus, 120.0);
    /// ```
    pub fn evaluate(&self, mut value_of: impl FnMut(&StatType) -> Option<f64>) -> f64 {
        self.inputs
            .iter()
            .filter_map(|(stat, coefficient)| value_of(stat).map(|v| v * coefficient))
            .sum()
    }
}

/// The built-in derived-stat table.
pub fn standard_formula(stat: &StatType) -> Option<DerivedFormula> {
    let inputs = match stat {
        StatType::Health => vec![(StatType::Stamina, 10.0)],
        StatType::Mana => vec![(StatType::Intelligence, 5.0)],
        StatType::Attack => vec![(StatType::Strength, 2.0)],
        StatType::Defense => vec![(StatType::Stamina, 0.5)],
        StatType::Speed => vec![(StatType::Agility, 0.1)],
        StatType::CritChance => vec![(StatType::Agility, 0.05)],
        StatType::Power => vec![
            (StatType::Attack, 1.0),
            (StatType::Defense, 1.5),
            (StatType::Health, 0.1),
            (StatType::Speed, 2.0),
        ],
        _ => return None,
    };
    Some(DerivedFormula::new(inputs))
}

/// The derived formulas active in one registry.
///
/// # Examples
///
/// ```rust
/// use charstat::derived::{DerivedFormula, DerivedRules};
/// use charstat::StatType;
///
/// let mut rules = DerivedRules::empty();
/// rules
///     .insert(StatType::custom("Dodge"), DerivedFormula::new(vec![(StatType::Agility, 0.2)]))
///     .unwrap();
///
/// // Agility -> Dodge -> Agility would be a cycle
/// let err = rules.insert(
///     StatType::Agility,
///     DerivedFormula::new(vec![(StatType::custom("Dodge"), 1.0)]),
/// );
/// assert!(err.is_err());
/// assert!(rules.formula(&StatType::Agility).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DerivedRules {
    formulas: BTreeMap<StatType, DerivedFormula>,
    graph: StatGraph,
    order: Vec<StatType>,
}

impl DerivedRules {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rules populated from `standard_formula` for every standard stat.
    pub fn standard() -> Self {
        let formulas: BTreeMap<StatType, DerivedFormula> = StatType::STANDARD
            .iter()
            .filter_map(|stat| standard_formula(stat).map(|f| (stat.clone(), f)))
            .collect();
        let graph = Self::build_graph(&formulas);
        // The built-in table is acyclic.
        let order = graph.topological_sort().unwrap_or_default();
        Self {
            formulas,
            graph,
            order,
        }
    }

    /// Add or replace the formula for `stat`.
    ///
    /// Rejected with `StatError::Cycle` (leaving the rules unchanged) if
    /// the new formula makes some stat depend on itself.
    pub fn insert(&mut self, stat: StatType, formula: DerivedFormula) -> Result<(), StatError> {
        let mut formulas = self.formulas.clone();
        formulas.insert(stat, formula);
        let graph = Self::build_graph(&formulas);
        let order = graph.topological_sort()?;

        self.formulas = formulas;
        self.graph = graph;
        self.order = order;
        Ok(())
    }

    pub fn formula(&self, stat: &StatType) -> Option<&DerivedFormula> {
        self.formulas.get(stat)
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Every derived stat, inputs before the stats derived from them.
    pub fn derived_in_order(&self) -> impl Iterator<Item = &StatType> {
        self.order
            .iter()
            .filter(|stat| self.formulas.contains_key(*stat))
    }

    /// Stats derived (transitively) from `stat`, in refresh order.
    pub fn dependents_of(&self, stat: &StatType) -> Vec<StatType> {
        let downstream = self.graph.downstream_of(stat);
        if downstream.is_empty() {
            return Vec::new();
        }
        self.order
            .iter()
            .filter(|s| downstream.contains(*s))
            .cloned()
            .collect()
    }

    fn build_graph(formulas: &BTreeMap<StatType, DerivedFormula>) -> StatGraph {
        let mut graph = StatGraph::new();
        for (stat, formula) in formulas {
            graph.add_node(stat.clone());
            for (input, _) in formula.inputs() {
                graph.add_edge(stat.clone(), input.clone());
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_lookup() {
        assert!(standard_formula(&StatType::Health).is_some());
        assert!(standard_formula(&StatType::Stamina).is_none());
        assert!(standard_formula(&StatType::custom("Luck")).is_none());
    }

    #[test]
    fn test_power_refreshed_after_its_inputs() {
        let rules = DerivedRules::standard();
        let order: Vec<&StatType> = rules.derived_in_order().collect();
        let pos = |s: &StatType| order.iter().position(|o| *o == s).unwrap();
        assert!(pos(&StatType::Attack) < pos(&StatType::Power));
        assert!(pos(&StatType::Health) < pos(&StatType::Power));
        assert!(!order.contains(&&StatType::Stamina));
    }

    #[test]
    fn test_dependents_of_stamina() {
        let rules = DerivedRules::standard();
        let deps = rules.dependents_of(&StatType::Stamina);
        assert!(deps.contains(&StatType::Health));
        assert!(deps.contains(&StatType::Defense));
        assert_eq!(deps.last(), Some(&StatType::Power));
        assert!(rules.dependents_of(&StatType::Power).is_empty());
    }

    #[test]
    fn test_evaluate_skips_missing_inputs() {
        let power = standard_formula(&StatType::Power).unwrap();
        let value = power.evaluate(|stat| match stat {
            StatType::Attack => Some(10.0),
            StatType::Speed => Some(1.0),
            _ => None,
        });
        assert_eq!(value, 12.0);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut rules = DerivedRules::empty();
        let err = rules
            .insert(
                StatType::Health,
                DerivedFormula::new(vec![(StatType::Health, 1.0)]),
            )
            .unwrap_err();
        assert!(matches!(err, StatError::Cycle { .. }));
        assert!(rules.is_empty());
    }
}
