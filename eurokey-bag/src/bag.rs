//! Construction du sac pondéré.
//!
//! Chaque numéro part avec [`BASE_COPIES`] occurrences. Les numéros en retard
//! (beaucoup de tirages manqués) en gagnent, les numéros souvent tirés en perdent.
//! Le premier numéro du sac de base n'est jamais retiré, et chaque numéro des
//! statistiques garde au moins une occurrence.

use std::collections::{BTreeMap, BTreeSet};

use eurokey_db::models::StatRow;
use log::debug;

use crate::error::BagError;
use crate::rng::RandomSource;

/// Occurrences initiales de chaque numéro.
pub const BASE_COPIES: usize = 10;
/// La moyenne des tirages manqués est divisée par ce facteur avant comparaison.
pub const MISSING_DRAWS_AVG_DIVISOR: f64 = 2.0;
/// Occurrences retirées par point de pourcentage au-dessus du minimum.
pub const FREQUENCY_FACTOR: f64 = 1.5;

/// Arrondi à l'entier le plus proche, les demis vers +∞ (`round(-2.5) == -2`).
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Multiset de numéros ; la multiplicité d'un numéro est son poids.
#[derive(Debug, Clone, PartialEq)]
pub struct Bag {
    items: Vec<u8>,
}

impl Bag {
    pub fn from_items(items: Vec<u8>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[u8] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn counts(&self) -> BTreeMap<u8, usize> {
        let mut counts = BTreeMap::new();
        for &n in &self.items {
            *counts.entry(n).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_of(&self, number: u8) -> usize {
        self.items.iter().filter(|&&n| n == number).count()
    }

    pub fn distinct(&self) -> BTreeSet<u8> {
        self.items.iter().copied().collect()
    }

    pub fn max_value(&self) -> Option<u8> {
        self.items.iter().copied().max()
    }

    /// Pourcentage de chaque valeur de 0 à max, arrondi à deux décimales (0 si absente).
    pub fn percentages(&self) -> Vec<(u8, f64)> {
        let Some(max) = self.max_value() else {
            return Vec::new();
        };
        let counts = self.counts();
        let len = self.items.len() as f64;
        (0..=max)
            .map(|n| {
                let count = counts.get(&n).copied().unwrap_or(0) as f64;
                let pct = round_half_up(count / len * 10_000.0) as f64 / 100.0;
                (n, pct)
            })
            .collect()
    }

    pub fn total_percentage(&self) -> f64 {
        self.percentages().iter().map(|(_, p)| p).sum()
    }
}

/// Table de comptage utilisée pendant les ajustements.
struct WeightTable {
    counts: BTreeMap<u8, usize>,
    head: u8,
}

impl WeightTable {
    /// Sac de base : chaque numéro distinct des lignes, `BASE_COPIES` fois.
    /// La tête est le plus petit numéro, premier élément du sac de base.
    fn seeded(rows: &[StatRow]) -> Option<Self> {
        let counts: BTreeMap<u8, usize> = rows.iter().map(|r| (r.number, BASE_COPIES)).collect();
        let head = *counts.keys().next()?;
        Some(Self { counts, head })
    }

    fn add(&mut self, number: u8, amount: usize) {
        *self.counts.entry(number).or_insert(0) += amount;
    }

    /// Retire une occurrence ; sans effet sur la tête ou un numéro déjà absent.
    fn remove_one(&mut self, number: u8) {
        if number == self.head {
            return;
        }
        if let Some(count) = self.counts.get_mut(&number) {
            *count = count.saturating_sub(1);
        }
    }

    fn remove(&mut self, number: u8, amount: i64) {
        for _ in 0..amount {
            self.remove_one(number);
        }
    }

    fn count(&self, number: u8) -> usize {
        self.counts.get(&number).copied().unwrap_or(0)
    }

    fn into_items(self) -> Vec<u8> {
        self.counts
            .into_iter()
            .flat_map(|(n, count)| std::iter::repeat(n).take(count))
            .collect()
    }
}

/// Construit le sac d'une catégorie à partir de ses lignes de statistiques.
pub fn build_bag<R: RandomSource>(rows: &[StatRow], rng: &mut R) -> Result<Bag, BagError> {
    let mut table = WeightTable::seeded(rows).ok_or_else(|| BagError::EmptyInput {
        category: String::new(),
    })?;

    let min_draw_percentage = rows
        .iter()
        .map(|r| r.total_draw_times_percentage)
        .fold(100.0f64, f64::min);
    let missing_draws_avg = rows.iter().map(|r| r.missing_draws as f64).sum::<f64>()
        / (rows.len() as f64 * MISSING_DRAWS_AVG_DIVISOR);

    for row in rows {
        let delta = round_half_up(row.missing_draws as f64 - missing_draws_avg);
        if delta > 0 {
            table.add(row.number, delta as usize);
        } else if delta < 0 {
            table.remove(row.number, -delta);
        }

        let extra_to_remove = round_half_up(
            (row.total_draw_times_percentage - min_draw_percentage) * FREQUENCY_FACTOR,
        );
        table.remove(row.number, extra_to_remove);

        if table.count(row.number) == 0 {
            table.add(row.number, 1);
        }
    }

    debug!(
        "bag: {} valeurs, tête {}, moyenne retards {:.2}, pourcentage min {:.2}",
        table.counts.len(),
        table.head,
        missing_draws_avg,
        min_draw_percentage
    );

    let mut items = table.into_items();
    rng.shuffle(&mut items);
    Ok(Bag { items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::make_rng;
    use chrono::NaiveDate;
    use eurokey_db::models::make_test_rows;

    fn row(number: u8, pct: f64, missing_draws: u32) -> StatRow {
        StatRow {
            number,
            total_draw_times: (pct * 10.0) as u32,
            total_draw_times_percentage: pct,
            last_draw_id: String::new(),
            last_draw_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            missing_draws,
        }
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(0.49), 0);
    }

    #[test]
    fn test_empty_rows_rejected() {
        let mut rng = make_rng(Some(1));
        assert!(matches!(build_bag(&[], &mut rng), Err(BagError::EmptyInput { .. })));
    }

    #[test]
    fn test_overdue_value_boosted() {
        // moyenne = 10 / 4 = 2.5 ; 1 : round(-2.5) = -2 mais c'est la tête ; 2 : round(7.5) = 8
        let rows = vec![row(1, 20.0, 0), row(2, 10.0, 10)];
        let bag = build_bag(&rows, &mut make_rng(Some(1))).unwrap();
        assert_eq!(bag.count_of(1), 10);
        assert_eq!(bag.count_of(2), 18);
        assert_eq!(bag.len(), 28);
    }

    #[test]
    fn test_head_is_never_removed() {
        let rows = vec![row(1, 50.0, 0), row(2, 10.0, 0)];
        let bag = build_bag(&rows, &mut make_rng(Some(1))).unwrap();
        assert_eq!(bag.count_of(1), 10);
        assert_eq!(bag.count_of(2), 10);
    }

    #[test]
    fn test_coverage_guard_keeps_one() {
        let rows = vec![row(1, 10.0, 0), row(2, 50.0, 0)];
        let bag = build_bag(&rows, &mut make_rng(Some(1))).unwrap();
        assert_eq!(bag.count_of(1), 10);
        assert_eq!(bag.count_of(2), 1);
    }

    #[test]
    fn test_single_row() {
        let bag = build_bag(&[row(7, 0.0, 0)], &mut make_rng(Some(1))).unwrap();
        assert_eq!(bag.items(), &[7; 10]);
    }

    #[test]
    fn test_known_counts_for_stars() {
        let bag = build_bag(&make_test_rows(12), &mut make_rng(Some(3))).unwrap();
        let expected = [16, 10, 19, 14, 9, 19, 13, 6, 18, 13, 5, 17];
        for (i, &count) in expected.iter().enumerate() {
            assert_eq!(bag.count_of(i as u8 + 1), count, "numéro {}", i + 1);
        }
        assert_eq!(bag.len(), 159);
    }

    #[test]
    fn test_coverage_matches_rows() {
        for size in [1u8, 3, 5, 12, 50] {
            let rows = make_test_rows(size);
            let bag = build_bag(&rows, &mut make_rng(Some(size as u64))).unwrap();
            let expected: BTreeSet<u8> = rows.iter().map(|r| r.number).collect();
            assert_eq!(bag.distinct(), expected);
        }
    }

    #[test]
    fn test_sparse_rows_only_cover_their_numbers() {
        let rows = vec![row(3, 10.0, 4), row(9, 12.0, 0), row(20, 10.0, 2)];
        let bag = build_bag(&rows, &mut make_rng(Some(1))).unwrap();
        assert_eq!(bag.distinct(), BTreeSet::from([3, 9, 20]));
    }

    #[test]
    fn test_mass_normalized() {
        for seed in 0..20 {
            let bag = build_bag(&make_test_rows(50), &mut make_rng(Some(seed))).unwrap();
            let total = bag.total_percentage();
            assert!((99.9..=100.1).contains(&total), "total = {}", total);
        }
    }

    #[test]
    fn test_counts_do_not_depend_on_seed() {
        let rows = make_test_rows(50);
        let a = build_bag(&rows, &mut make_rng(Some(1))).unwrap();
        let b = build_bag(&rows, &mut make_rng(Some(2))).unwrap();
        assert_eq!(a.counts(), b.counts());
    }

    #[test]
    fn test_higher_missing_draws_never_lighter() {
        // 2 et 3 ne diffèrent que par leurs retards ; aucun n'est la tête.
        for (low, high) in [(0, 1), (2, 9), (5, 30), (0, 100)] {
            let rows = vec![row(1, 10.0, 3), row(2, 11.0, low), row(3, 11.0, high), row(4, 10.0, 3)];
            let bag = build_bag(&rows, &mut make_rng(Some(1))).unwrap();
            assert!(
                bag.count_of(3) + 1 >= bag.count_of(2),
                "retards {}/{} : {} vs {}",
                low,
                high,
                bag.count_of(3),
                bag.count_of(2)
            );
        }
    }

    #[test]
    fn test_percentages_include_absent_values() {
        let bag = Bag::from_items(vec![2, 2, 4, 4]);
        assert_eq!(bag.percentages(), vec![(0, 0.0), (1, 0.0), (2, 50.0), (3, 0.0), (4, 50.0)]);
        assert!((bag.total_percentage() - 100.0).abs() < 1e-9);
        assert!(Bag::from_items(Vec::new()).percentages().is_empty());
    }
}
