use eurokey_db::models::Category;
use log::info;

use crate::bag::build_bag;
use crate::error::BagError;
use crate::rng::RandomSource;
use crate::sampler::sample_distinct;
use crate::validator::validate_bag;

/// Tirage de chaque catégorie, dans l'ordre des catégories.
///
/// Pour chaque catégorie : construction du sac, validation, tirage. La
/// première erreur interrompt toute la génération.
pub fn generate_picks<R: RandomSource>(
    categories: &[Category],
    rng: &mut R,
) -> Result<Vec<Vec<u8>>, BagError> {
    let mut picks = Vec::with_capacity(categories.len());

    for category in categories {
        if category.rows.is_empty() {
            return Err(BagError::EmptyInput {
                category: category.name.clone(),
            });
        }

        let bag = build_bag(&category.rows, rng)?;
        validate_bag(&bag, &category.rows)?;
        let picked = sample_distinct(&bag, category.pick_count, rng)?;

        info!("{} : {:?} (sac de {} éléments)", category.name, picked, bag.len());
        picks.push(picked);
    }

    Ok(picks)
}

/// Clé à plat : les tirages triés de chaque catégorie, concaténés sans retri.
pub fn generate_key<R: RandomSource>(
    categories: &[Category],
    rng: &mut R,
) -> Result<Vec<u8>, BagError> {
    Ok(generate_picks(categories, rng)?.concat())
}
