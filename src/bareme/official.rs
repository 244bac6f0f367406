// Official AMV competition rubric (Level Up 2025 grid, 50 points)

use super::{Bareme, Criterion};
use crate::constants::OFFICIAL_BAREME_ID;

const MONTAGE: &str = "MONTAGE";
const VFX: &str = "VFX";
const ARTISTIC: &str = "CHOIX ARTISTIQUE";
const ENCODING: &str = "ENCODAGE";
const AUDIO_MIX: &str = "MIX AUDIO";

/// (id, name, max, category)
const OFFICIAL_CRITERIA: [(&str, &str, f64, &str); 10] = [
    ("rythme-synchro", "Rythme / Synchro", 10.0, MONTAGE),
    ("selection-scene", "Sélection de scène", 10.0, MONTAGE),
    ("incrustation", "Incrust / Intégration", 5.0, VFX),
    ("coherence", "Cohérence / Logique", 5.0, VFX),
    ("complexite", "Complexité technique", 5.0, VFX),
    ("cc-colorimetrie", "CC / Colorimétrie", 4.0, ARTISTIC),
    ("concept-story", "Concept / Story", 4.0, ARTISTIC),
    ("choix-jury", "Choix du jury", 3.0, ARTISTIC),
    ("encodage", "Encodage", 2.0, ENCODING),
    ("mix-audio", "Mix Audio", 2.0, AUDIO_MIX),
];

pub fn official_bareme() -> Bareme {
    let criteria = OFFICIAL_CRITERIA
        .iter()
        .map(|(id, name, max, category)| Criterion::numeric(*id, *name, *max).with_category(*category))
        .collect();

    let mut bareme = Bareme::new(OFFICIAL_BAREME_ID, "Barème Officiel AMV", criteria)
        .with_description("Barème standard pour les compétitions AMV (Level Up 2025)")
        .with_category_color(MONTAGE, "#fb923c")
        .with_category_color(VFX, "#a78bfa")
        .with_category_color(ARTISTIC, "#34d399")
        .with_category_color(ENCODING, "#f59e0b")
        .with_category_color(AUDIO_MIX, "#38bdf8");
    bareme.is_official = true;
    bareme.hide_totals_until_all_scored = true;
    bareme
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_official_totals() {
        let bareme = official_bareme();
        assert!(bareme.is_official);
        assert_eq!(bareme.total_points(), 50.0);
        assert!(bareme.check().is_ok());

        let groups = bareme.category_groups();
        let totals: Vec<(String, f64)> = groups.iter().map(|g| (g.category.clone(), g.total_max)).collect();
        assert_eq!(
            totals,
            vec![
                (MONTAGE.to_string(), 20.0),
                (VFX.to_string(), 15.0),
                (ARTISTIC.to_string(), 11.0),
                (ENCODING.to_string(), 2.0),
                (AUDIO_MIX.to_string(), 2.0),
            ]
        );
    }
}
