use thiserror::Error;

/// Erreurs du moteur de tirage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BagError {
    /// Aucune ligne de statistiques pour la catégorie.
    #[error("No statistics rows for category '{category}'")]
    EmptyInput { category: String },

    /// Le sac ne passe pas la validation (couverture ou masse des pourcentages).
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Plus de valeurs demandées que de valeurs distinctes disponibles.
    #[error("Insufficient distinct values: requested {requested}, available {available}")]
    InsufficientValues { requested: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BagError::InsufficientValues { requested: 5, available: 3 };
        assert_eq!(
            err.to_string(),
            "Insufficient distinct values: requested 5, available 3"
        );

        let err = BagError::EmptyInput { category: "stars".to_string() };
        assert!(err.to_string().contains("'stars'"));
    }
}
