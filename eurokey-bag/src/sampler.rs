use crate::bag::Bag;
use crate::error::BagError;
use crate::rng::RandomSource;

/// Tire `count` valeurs distinctes du sac, triées par ordre croissant.
///
/// À chaque tour la copie de travail est mélangée, un indice est tiré
/// uniformément, puis toutes les occurrences de la valeur retenue sont
/// retirées : la multiplicité influe sur la chance d'être tirée, jamais
/// sur le nombre de fois.
pub fn sample_distinct<R: RandomSource>(
    bag: &Bag,
    count: usize,
    rng: &mut R,
) -> Result<Vec<u8>, BagError> {
    let available = bag.distinct().len();
    if count > available {
        return Err(BagError::InsufficientValues {
            requested: count,
            available,
        });
    }

    let mut copy = bag.items().to_vec();
    rng.shuffle(&mut copy);

    let mut selected = Vec::with_capacity(count);
    for _ in 0..count {
        let idx = rng.next_index(copy.len());
        let value = copy[idx];
        selected.push(value);
        copy.retain(|&n| n != value);
        rng.shuffle(&mut copy);
    }

    selected.sort();
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::build_bag;
    use crate::rng::make_rng;
    use eurokey_db::models::make_test_rows;

    #[test]
    fn test_distinct_sorted_from_bag() {
        let bag = build_bag(&make_test_rows(50), &mut make_rng(Some(1))).unwrap();
        let values = bag.distinct();
        let mut rng = make_rng(Some(2));
        for _ in 0..200 {
            let picked = sample_distinct(&bag, 5, &mut rng).unwrap();
            assert_eq!(picked.len(), 5);
            assert!(picked.windows(2).all(|w| w[0] < w[1]), "{:?}", picked);
            assert!(picked.iter().all(|n| values.contains(n)));
        }
    }

    #[test]
    fn test_take_everything() {
        let bag = Bag::from_items(vec![3, 1, 1, 2, 3, 3]);
        let picked = sample_distinct(&bag, 3, &mut make_rng(Some(5))).unwrap();
        assert_eq!(picked, vec![1, 2, 3]);
    }

    #[test]
    fn test_insufficient_values() {
        let bag = Bag::from_items(vec![1, 1, 2]);
        assert_eq!(
            sample_distinct(&bag, 3, &mut make_rng(Some(5))),
            Err(BagError::InsufficientValues { requested: 3, available: 2 })
        );
    }

    #[test]
    fn test_zero_count() {
        let bag = Bag::from_items(vec![1, 2]);
        assert!(sample_distinct(&bag, 0, &mut make_rng(Some(5))).unwrap().is_empty());
    }

    #[test]
    fn test_heavier_value_drawn_more_often() {
        let bag = Bag::from_items([vec![1u8; 10], vec![2u8; 40]].concat());
        let mut rng = make_rng(Some(11));
        let mut twos = 0;
        for _ in 0..1000 {
            if sample_distinct(&bag, 1, &mut rng).unwrap() == vec![2] {
                twos += 1;
            }
        }
        assert!(twos > 700, "2 tiré {} fois sur 1000", twos);
    }

    #[test]
    fn test_seed_determinism() {
        let bag = build_bag(&make_test_rows(50), &mut make_rng(Some(1))).unwrap();
        let a = sample_distinct(&bag, 5, &mut make_rng(Some(77))).unwrap();
        let b = sample_distinct(&bag, 5, &mut make_rng(Some(77))).unwrap();
        assert_eq!(a, b);
    }
}
