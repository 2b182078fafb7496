use thiserror::Error;

use crate::db::models::{GradeBoundary, Specialty};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown or mismatched specialties: {}", describe(.offending))]
pub(crate) struct BoundaryError {
    pub(crate) offending: Vec<Specialty>,
}

fn describe(specialties: &[Specialty]) -> String {
    specialties
        .iter()
        .map(|specialty| format!("{} ({})", specialty.name, specialty.id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every boundary must name a known specialty with the same id and the same name.
pub(crate) fn validate(
    boundaries: &[GradeBoundary],
    known_specialties: &[Specialty],
) -> Result<(), BoundaryError> {
    let offending: Vec<Specialty> = boundaries
        .iter()
        .filter(|boundary| !known_specialties.contains(&boundary.specialty))
        .map(|boundary| boundary.specialty.clone())
        .collect();

    if offending.is_empty() {
        Ok(())
    } else {
        Err(BoundaryError { offending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specialty(id: &str, name: &str) -> Specialty {
        Specialty { id: id.to_string(), name: name.to_string() }
    }

    fn boundary(id: &str, name: &str) -> GradeBoundary {
        GradeBoundary { specialty: specialty(id, name), min_score: 50.0 }
    }

    fn known() -> Vec<Specialty> {
        vec![specialty("s1", "Informatics"), specialty("s2", "Mathematics")]
    }

    #[test]
    fn matching_boundaries_pass() {
        let boundaries = vec![boundary("s1", "Informatics"), boundary("s2", "Mathematics")];
        assert_eq!(validate(&boundaries, &known()), Ok(()));
    }

    #[test]
    fn several_thresholds_for_one_specialty_pass() {
        let mut pass = boundary("s1", "Informatics");
        let mut excellent = boundary("s1", "Informatics");
        pass.min_score = 50.0;
        excellent.min_score = 85.0;
        assert_eq!(validate(&[pass, excellent], &known()), Ok(()));
    }

    #[test]
    fn empty_boundaries_pass() {
        assert_eq!(validate(&[], &[]), Ok(()));
    }

    #[test]
    fn id_match_with_different_name_fails() {
        let err = validate(&[boundary("s1", "Physics")], &known()).unwrap_err();
        assert_eq!(err.offending, vec![specialty("s1", "Physics")]);
    }

    #[test]
    fn unknown_specialty_fails_and_is_named() {
        let boundaries = vec![boundary("s1", "Informatics"), boundary("s9", "Chemistry")];
        let err = validate(&boundaries, &known()).unwrap_err();
        assert_eq!(err.offending, vec![specialty("s9", "Chemistry")]);
        assert!(err.to_string().contains("Chemistry (s9)"));
    }
}
