use super::records::{AnalysisResult, AnalyzedMedication, MedicationInfo};

/// Reference text shown in the medication detail view
#[derive(Debug, PartialEq, Eq)]
pub struct MedicationDetails {
    pub description: &'static str,
    pub side_effects: &'static [&'static str],
}

const AMOXICILLIN: MedicationDetails = MedicationDetails {
    description: "Amoxicillin is a penicillin antibiotic that fights bacteria. It is used to treat \
                  many different types of infection caused by bacteria, such as tonsillitis, \
                  bronchitis, pneumonia, and infections of the ear, nose, throat, skin, or \
                  urinary tract.",
    side_effects: &["Diarrhea", "Stomach upset", "Nausea", "Vomiting", "Rash"],
};

const IBUPROFEN: MedicationDetails = MedicationDetails {
    description: "Ibuprofen is a nonsteroidal anti-inflammatory drug (NSAID). It works by \
                  reducing hormones that cause inflammation and pain in the body. It is used to \
                  reduce fever and treat pain or inflammation caused by many conditions such as \
                  headache, toothache, back pain, arthritis, menstrual cramps, or minor injury.",
    side_effects: &["Upset stomach", "Mild heartburn", "Nausea", "Headache", "Dizziness"],
};

const UNKNOWN: MedicationDetails = MedicationDetails {
    description: "No reference information is available for this medication. Ask your \
                  pharmacist for details.",
    side_effects: &[],
};

/// Looks up detail text by medication name (case-insensitive).
pub fn details_for(name: &str) -> &'static MedicationDetails {
    match name.trim().to_ascii_lowercase().as_str() {
        "amoxicillin" => &AMOXICILLIN,
        "ibuprofen" => &IBUPROFEN,
        _ => &UNKNOWN,
    }
}

/// The hardcoded analysis returned for every prescription image.
pub fn fixed_analysis() -> AnalysisResult {
    AnalysisResult::new(
        vec![
            AnalyzedMedication::new(
                MedicationInfo::new("Amoxicillin", "500mg", "3 times daily", "7 days"),
                0.92,
            ),
            AnalyzedMedication::new(
                MedicationInfo::new("Ibuprofen", "400mg", "as needed", "5 days"),
                0.87,
            ),
        ],
        "good",
        1850,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_analysis_has_two_entries() {
        let result = fixed_analysis();
        let confidences: Vec<f64> = result.medications.iter().map(|m| m.confidence).collect();

        assert_eq!(result.medications.len(), 2);
        assert_eq!(confidences, vec![0.92, 0.87]);
        assert_eq!(result.ocr_quality, "good");
        assert_eq!(result.processing_time_ms, 1850);
    }

    #[test]
    fn details_are_found_regardless_of_case() {
        assert_eq!(details_for("AMOXICILLIN"), &AMOXICILLIN);
        assert_eq!(details_for(" ibuprofen "), &IBUPROFEN);
        assert!(details_for("Aspirin").side_effects.is_empty());
    }
}
