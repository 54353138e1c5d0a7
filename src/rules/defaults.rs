//! Predefined allergen groups and interaction rules.
//!
//! Seventeen allergen keyword groups and thirteen interaction rules covering
//! the common active-ingredient conflicts. All of it is plain configuration
//! data: deployments override or extend it through [`crate::config::RuleConfig`].

use super::{AllergenGroup, InteractionRule};

fn group(id: &str, label: &str, keywords: &[&str]) -> AllergenGroup {
    AllergenGroup {
        id: id.to_string(),
        label: label.to_string(),
        keywords: keywords.iter().map(ToString::to_string).collect(),
    }
}

fn rule(ingredients: &[&str], warning: &str) -> InteractionRule {
    InteractionRule {
        ingredients: ingredients.iter().map(ToString::to_string).collect(),
        warning: warning.to_string(),
    }
}

/// The seventeen predefined allergen groups.
#[must_use]
pub fn allergen_groups() -> Vec<AllergenGroup> {
    vec![
        group(
            "fragrance_parfum",
            "Added Fragrance (Parfum/Fragrance)",
            &["fragrance", "parfum"],
        ),
        group(
            "fragrance_components",
            "Common Fragrance Allergens",
            &[
                "linalool",
                "limonene",
                "citronellol",
                "geraniol",
                "citral",
                "eugenol",
                "coumarin",
                "farnesol",
                "hexyl cinnamal",
                "hydroxycitronellal",
                "isoeugenol",
                "benzyl alcohol",
                "benzyl benzoate",
                "benzyl salicylate",
                "anisyl alcohol",
                "amyl cinnamal",
                "cinnamyl alcohol",
                "cinnamal",
                "alpha-isomethyl ionone",
                "methyl 2-octynoate",
                "evernia prunastri",
                "evernia furfuracea",
            ],
        ),
        group(
            "parabens_group",
            "Parabens",
            &[
                "paraben",
                "methylparaben",
                "ethylparaben",
                "propylparaben",
                "butylparaben",
                "isobutylparaben",
                "isopropylparaben",
            ],
        ),
        group(
            "sulfates_group",
            "Sulfates (SLS/SLES)",
            &[
                "sodium lauryl sulfate",
                "sodium laureth sulfate",
                "sls",
                "sles",
                "ammonium lauryl sulfate",
                "ammonium laureth sulfate",
                "als",
                "ales",
                "sodium c14-16 olefin sulfonate",
            ],
        ),
        group(
            "drying_alcohols",
            "Drying Alcohols",
            &[
                "alcohol denat.",
                "sd alcohol",
                "ethanol",
                "isopropyl alcohol",
                "alcohol",
            ],
        ),
        group(
            "silicones_group",
            "Silicones",
            &[
                "dimethicone",
                "cyclomethicone",
                "cyclopentasiloxane",
                "cyclohexasiloxane",
                "dimethiconol",
                "phenyl trimethicone",
                "amodimethicone",
                "cyclotetrasiloxane",
                "cetyl dimethicone",
                "dimethicone copolyol",
                "stearyl dimethicone",
                "-siloxane",
                "-cone",
            ],
        ),
        group(
            "chemical_sunscreens_group",
            "Chemical Sunscreens",
            &[
                "oxybenzone",
                "avobenzone",
                "octinoxate",
                "ethylhexyl methoxycinnamate",
                "octisalate",
                "ethylhexyl salicylate",
                "homosalate",
                "octocrylene",
                "benzophenone-3",
                "benzophenone-4",
                "ensulizole",
                "phenylbenzimidazole sulfonic acid",
                "ecamsule",
                "terephthalylidene dicamphor sulfonic acid",
                "drometrizole trisiloxane",
            ],
        ),
        group(
            "formaldehyde_releasers_group",
            "Formaldehyde Releasers",
            &[
                "dmdm hydantoin",
                "imidazolidinyl urea",
                "diazolidinyl urea",
                "quaternium-15",
                "bronopol",
                "2-bromo-2-nitropropane-1,3-diol",
                "5-bromo-5-nitro-1,3-dioxane",
                "sodium hydroxymethylglycinate",
                "methenamine",
                "benzylhemiformal",
            ],
        ),
        group(
            "mi_mci_group",
            "MI/MCI (Methylisothiazolinone/Methylchloroisothiazolinone)",
            &[
                "methylisothiazolinone",
                "mi",
                "mit",
                "methylchloroisothiazolinone",
                "mci",
                "mcit",
                "cmit",
            ],
        ),
        group(
            "propylene_glycol_group",
            "Propylene Glycol",
            &["propylene glycol", "pg", "1,2-propanediol"],
        ),
        group(
            "cocamidopropyl_betaine_group",
            "Cocamidopropyl Betaine",
            &["cocamidopropyl betaine", "capb"],
        ),
        group("phenoxyethanol_group", "Phenoxyethanol", &["phenoxyethanol"]),
        group(
            "lanolin_group",
            "Lanolin",
            &[
                "lanolin",
                "lanolin alcohol",
                "adeps lanae",
                "lanolin cera",
                "lanolin oil",
                "hydrogenated lanolin",
                "wool fat",
                "wool wax",
            ],
        ),
        group(
            "artificial_colorants_group",
            "Artificial Colorants (Synthetic Dyes)",
            &[
                "ci 19140",
                "ci 42090",
                "ci 16035",
                "ci 17200",
                "ci 60730",
                "ci 15850",
                "ci 45410",
                "fd&c yellow no. 5",
                "fd&c blue no. 1",
                "fd&c red no. 40",
                "d&c red no. 33",
                "ext. d&c violet no. 2",
                "d&c red no. 6",
                "d&c red no. 27",
                "yellow 5",
                "blue 1",
                "red 40",
                "red 33",
                "violet 2",
                "red 6",
                "red 27",
            ],
        ),
        group(
            "mineral_oil_petrolatum_group",
            "Mineral Oil & Petrolatum",
            &[
                "mineral oil",
                "paraffinum liquidum",
                "liquid paraffin",
                "huile minerale",
                "petrolatum",
                "white petrolatum",
                "petroleum jelly",
                "vaseline",
            ],
        ),
        group(
            "talc_group",
            "Talc",
            &["talc", "talcum powder", "cosmetic talc"],
        ),
        group(
            "bha_bht_group",
            "BHA/BHT (Preservatives)",
            &[
                "bha",
                "butylated hydroxyanisole",
                "bht",
                "butylated hydroxytoluene",
            ],
        ),
    ]
}

/// The thirteen predefined interaction rules.
#[must_use]
pub fn interaction_rules() -> Vec<InteractionRule> {
    vec![
        rule(
            &["retinol", "glycolic acid"],
            "Interaction: Retinol + Glycolic Acid (AHA).",
        ),
        rule(
            &["retinol", "salicylic acid"],
            "Interaction: Retinol + Salicylic Acid (BHA).",
        ),
        rule(
            &["ascorbic acid", "niacinamide"],
            "Interaction: Vit C (Ascorbic) + Niacinamide.",
        ),
        rule(
            &["benzoyl peroxide", "retinol"],
            "Interaction: Benzoyl Peroxide + Retinol (and other retinoids like tretinoin, \
             adapalene). Can deactivate each other (especially tretinoin) and increase \
             irritation. Some forms of adapalene are stable with BPO. Generally best to \
             alternate (e.g., BPO in AM, Retinol in PM) or use specialized combination \
             products.",
        ),
        rule(
            &["benzoyl peroxide", "tretinoin"],
            "Interaction: Benzoyl Peroxide + Tretinoin. High risk of deactivation of \
             tretinoin and increased irritation. Avoid simultaneous use unless specifically \
             formulated together.",
        ),
        rule(
            &["benzoyl peroxide", "adapalene"],
            "Interaction: Benzoyl Peroxide + Adapalene. Generally more stable together than \
             BPO + other retinoids, but still potential for irritation. Often formulated \
             together in products like Epiduo.",
        ),
        rule(
            &["ascorbic acid", "glycolic acid"],
            "Interaction: Vit C (L-Ascorbic Acid forms) + Glycolic Acid (AHA). Potential for \
             increased irritation, photosensitivity, and compromised skin barrier, especially \
             at high concentrations or low pH. Use with caution, ensure stable formulations, \
             or alternate.",
        ),
        rule(
            &["ascorbic acid", "lactic acid"],
            "Interaction: Vit C (L-Ascorbic Acid forms) + Lactic Acid (AHA). Potential for \
             increased irritation, photosensitivity, and compromised skin barrier. Use with \
             caution or alternate.",
        ),
        rule(
            &["ascorbic acid", "salicylic acid"],
            "Interaction: Vit C (L-Ascorbic Acid forms) + Salicylic Acid (BHA). Potential for \
             increased irritation and dryness. Use with caution or alternate.",
        ),
        rule(
            &["copper peptides", "ascorbic acid"],
            "Interaction: Copper Peptides + Vit C (Direct forms like L-Ascorbic Acid). May \
             oxidize and reduce efficacy of both ingredients. Best to use at different times \
             of day or use Vitamin C derivatives.",
        ),
        rule(
            &["benzoyl peroxide", "ascorbic acid"],
            "Interaction: Benzoyl Peroxide + Vit C (L-Ascorbic Acid). Benzoyl peroxide can \
             oxidize L-Ascorbic Acid, reducing its effectiveness. Apply at different times of \
             day.",
        ),
        rule(
            &["retinol", "ascorbic acid"],
            "Interaction: Retinol + Vit C (L-Ascorbic Acid). Can increase irritation due to \
             different pH requirements for optimal stability/penetration and combined \
             exfoliant effects. Often recommended to use at different times of day (e.g., \
             Vit C in AM, Retinol in PM).",
        ),
        rule(
            &["alpha hydroxy acid", "beta hydroxy acid"],
            "Interaction: AHA (e.g., Glycolic, Lactic) + BHA (Salicylic Acid). Using multiple \
             strong exfoliants together can lead to over-exfoliation, irritation, and damaged \
             skin barrier. Introduce slowly and monitor skin response; often better to \
             alternate.",
        ),
    ]
}
