use std::collections::BTreeSet;

use eurokey_db::models::StatRow;
use log::debug;

use crate::bag::Bag;
use crate::error::BagError;

pub const PERCENTAGE_ERROR_DELTA_LIMIT: f64 = 0.1;

pub const NOT_ALL_VALUES_MSG: &str = "Not all possible values can be picked.";
pub const PERCENTAGE_DELTA_MSG: &str = "Total percentage surpasses the error delta limit.";

/// Vérifie que le sac couvre exactement les numéros des lignes.
pub fn check_coverage(bag: &Bag, rows: &[StatRow]) -> Result<(), BagError> {
    let in_bag = bag.distinct();
    let expected: BTreeSet<u8> = rows.iter().map(|r| r.number).collect();
    if in_bag != expected || in_bag.len() != rows.len() {
        let missing: Vec<u8> = expected.difference(&in_bag).copied().collect();
        let extra: Vec<u8> = in_bag.difference(&expected).copied().collect();
        debug!("couverture : manquants {:?}, en trop {:?}", missing, extra);
        return Err(BagError::InvalidDistribution(NOT_ALL_VALUES_MSG.to_string()));
    }
    Ok(())
}

/// Vérifie que la somme des pourcentages arrondis reste à ±0.1 de 100.
pub fn check_total_percentage(bag: &Bag) -> Result<(), BagError> {
    let total = bag.total_percentage();
    if (total - 100.0).abs() > PERCENTAGE_ERROR_DELTA_LIMIT {
        debug!("pourcentages {:?}", bag.percentages());
        debug!("total {:.4} (limite ±{})", total, PERCENTAGE_ERROR_DELTA_LIMIT);
        return Err(BagError::InvalidDistribution(PERCENTAGE_DELTA_MSG.to_string()));
    }
    Ok(())
}

pub fn validate_bag(bag: &Bag, rows: &[StatRow]) -> Result<(), BagError> {
    check_coverage(bag, rows)?;
    check_total_percentage(bag)?;
    Ok(())
}

/// Premier diagnostic trouvé, `None` si le sac est correct.
pub fn diagnose(bag: &Bag, rows: &[StatRow]) -> Option<String> {
    match validate_bag(bag, rows) {
        Ok(()) => None,
        Err(BagError::InvalidDistribution(msg)) => Some(msg),
        Err(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::build_bag;
    use crate::rng::make_rng;
    use eurokey_db::models::make_test_rows;

    #[test]
    fn test_built_bag_is_valid() {
        let rows = make_test_rows(50);
        let bag = build_bag(&rows, &mut make_rng(Some(42))).unwrap();
        assert!(validate_bag(&bag, &rows).is_ok());
        assert_eq!(diagnose(&bag, &rows), None);
    }

    #[test]
    fn test_missing_value_fails_coverage() {
        let rows = make_test_rows(3);
        let bag = Bag::from_items(vec![1, 1, 2, 2]);
        assert_eq!(
            validate_bag(&bag, &rows),
            Err(BagError::InvalidDistribution(NOT_ALL_VALUES_MSG.to_string()))
        );
    }

    #[test]
    fn test_extra_value_fails_coverage() {
        let rows = make_test_rows(2);
        let bag = Bag::from_items(vec![1, 2, 3]);
        assert_eq!(diagnose(&bag, &rows), Some(NOT_ALL_VALUES_MSG.to_string()));
    }

    #[test]
    fn test_rounding_drift_fails_mass_check() {
        // 66 valeurs une fois chacune : 1.52 % arrondi, total 100.32
        let rows = make_test_rows(66);
        let bag = Bag::from_items((1..=66).collect());
        assert!(check_coverage(&bag, &rows).is_ok());
        assert_eq!(diagnose(&bag, &rows), Some(PERCENTAGE_DELTA_MSG.to_string()));
    }

    #[test]
    fn test_coverage_checked_first() {
        let rows = make_test_rows(67);
        let bag = Bag::from_items((1..=66).collect());
        assert_eq!(diagnose(&bag, &rows), Some(NOT_ALL_VALUES_MSG.to_string()));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let rows = make_test_rows(12);
        let bag = build_bag(&rows, &mut make_rng(Some(9))).unwrap();
        assert_eq!(diagnose(&bag, &rows), diagnose(&bag, &rows));

        let broken = Bag::from_items((1..=66).collect());
        let rows = make_test_rows(66);
        assert_eq!(diagnose(&broken, &rows), diagnose(&broken, &rows));
    }
}
