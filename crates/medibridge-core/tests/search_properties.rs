//! Property tests for keyword search over generated directories.

use medibridge_core::db::Database;
use medibridge_core::models::{Department, Doctor, DoctorListing, Hospital};
use medibridge_core::search::{DoctorSearch, KeywordSearch};
use proptest::prelude::*;

/// Generated doctor: expertise, specialty, profile link, score, department slot.
type GeneratedDoctor = (Option<String>, Option<String>, bool, Option<f64>, usize);

fn small_text() -> impl Strategy<Value = String> {
    "[abcAB ]{0,6}"
}

fn generated_doctor() -> impl Strategy<Value = GeneratedDoctor> {
    (
        proptest::option::of(small_text()),
        proptest::option::of(small_text()),
        any::<bool>(),
        proptest::option::of(0.0f64..=10.0),
        0usize..4,
    )
}

/// Two hospitals with two departments each.
fn build_directory(doctors: &[GeneratedDoctor]) -> Database {
    let db = Database::open_in_memory().unwrap();
    let mut departments = Vec::new();

    for (h, hospital_name) in ["aA Hospital", "Bc Hospital"].iter().enumerate() {
        let hospital_id = db.insert_hospital(&Hospital::new(hospital_name.to_string())).unwrap();
        for department_name in ["ab dept", "CB dept"] {
            let department_id = db
                .insert_department(&Department::new(
                    hospital_id,
                    format!("{department_name} {h}"),
                ))
                .unwrap();
            departments.push((hospital_id, department_id));
        }
    }

    for (i, (expertise, specialty, linked, score, slot)) in doctors.iter().enumerate() {
        let (hospital_id, department_id) = departments[*slot];
        let mut doctor = Doctor::new(hospital_id, department_id, format!("doctor-{i}"));
        doctor.expertise = expertise.clone();
        doctor.specialty = specialty.clone();
        doctor.recommendation_score = *score;
        if *linked {
            doctor.profile_url = Some(format!("https://www.haodf.com/doctor/{i}.html"));
        }
        db.insert_doctor(&doctor).unwrap();
    }

    db
}

fn rank_key(listing: &DoctorListing) -> (bool, Option<f64>) {
    (
        listing.doctor.profile_url.is_some(),
        listing.doctor.recommendation_score,
    )
}

proptest! {
    #[test]
    fn search_respects_limit_and_matches(
        doctors in proptest::collection::vec(generated_doctor(), 0..25),
        keywords in proptest::collection::vec("[abcAB]{1,2}", 1..4),
        limit in 0usize..15,
    ) {
        let db = build_directory(&doctors);
        let results = KeywordSearch.search(&db, &keywords, limit).unwrap();

        prop_assert!(results.len() <= limit);
        for listing in &results {
            prop_assert!(
                keywords.iter().any(|k| listing.matches_keyword(k)),
                "{} matched none of {:?}",
                listing.doctor.name,
                keywords
            );
        }
    }

    #[test]
    fn search_finds_every_match_when_unbounded(
        doctors in proptest::collection::vec(generated_doctor(), 0..25),
        keywords in proptest::collection::vec("[abcAB]{1,2}", 1..4),
    ) {
        let db = build_directory(&doctors);
        let results = KeywordSearch.search(&db, &keywords, 1000).unwrap();

        let expected = db
            .list_doctor_listings()
            .unwrap()
            .into_iter()
            .filter(|l| keywords.iter().any(|k| l.matches_keyword(k)))
            .count();
        prop_assert_eq!(results.len(), expected);
    }

    #[test]
    fn linked_doctors_precede_unlinked_then_score_descends(
        doctors in proptest::collection::vec(generated_doctor(), 0..25),
        keywords in proptest::collection::vec("[abcAB]{1,2}", 1..4),
    ) {
        let db = build_directory(&doctors);
        let results = KeywordSearch.search(&db, &keywords, 1000).unwrap();

        for pair in results.windows(2) {
            let (a_linked, a_score) = rank_key(&pair[0]);
            let (b_linked, b_score) = rank_key(&pair[1]);

            prop_assert!(a_linked || !b_linked, "unlinked doctor ranked above linked one");
            if a_linked == b_linked {
                match (a_score, b_score) {
                    (Some(a), Some(b)) => prop_assert!(a >= b),
                    (None, Some(_)) => prop_assert!(false, "null score ranked above a score"),
                    _ => {}
                }
            }
        }
    }
}
