//! Static subscription plan catalogue. Prices are in whole XOF.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionPlan {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: i64,
    pub currency: &'static str,
    pub duration_days: i64,
    pub features: &'static [&'static str],
}

pub const PLANS: [SubscriptionPlan; 3] = [
    SubscriptionPlan {
        id: "free",
        name: "Basique",
        description: "Accès aux fonctionnalités de base",
        price: 0,
        currency: "XOF",
        duration_days: 30,
        features: &[
            "Création de profil",
            "Prise de mesures standards",
            "Visibilité limitée",
        ],
    },
    SubscriptionPlan {
        id: "premium",
        name: "Premium",
        description: "Accès complet à toutes les fonctionnalités",
        price: 5000,
        currency: "XOF",
        duration_days: 30,
        features: &[
            "Toutes les fonctionnalités de base",
            "Catalogue de modèles illimité",
            "Gestion avancée des commandes",
            "Paiements en ligne",
            "Support prioritaire",
        ],
    },
    SubscriptionPlan {
        id: "professional",
        name: "Professionnel",
        description: "Solution complète pour les tailleurs professionnels",
        price: 10000,
        currency: "XOF",
        duration_days: 30,
        features: &[
            "Toutes les fonctionnalités premium",
            "Support clientèle dédié",
            "Rapports analytiques avancés",
            "Personnalisation de l'interface",
            "Intégration à votre site web",
        ],
    },
];

pub fn find_plan(plan_id: &str) -> Option<&'static SubscriptionPlan> {
    PLANS.iter().find(|p| p.id == plan_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_costs_nothing() {
        let plan = find_plan("free").unwrap();
        assert_eq!(plan.price, 0);
    }

    #[test]
    fn unknown_plan_is_none() {
        assert!(find_plan("platinum").is_none());
    }
}
