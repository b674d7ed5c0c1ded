use serde::Serialize;
use tracing::{debug, warn};

use super::error::SchedulingError;
use super::types::{Doctor, GeoPoint, Patient, Specialization};

/// How many doctors an operator is shown by default
pub const DEFAULT_SUGGESTIONS: usize = 10;

/// A doctor suggested for a patient, with the distance from the doctor's
/// current position
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub doctor: String,
    pub specialization: Specialization,
    pub address: String,
    pub location: GeoPoint,
    pub distance_km: f64,
}

impl Candidate {
    /// Two-line label for selection lists
    pub fn label(&self) -> String {
        format!(
            "{} ({}) - {:.2} km\n{}",
            self.doctor, self.specialization, self.distance_km, self.address
        )
    }
}

/// Nearest-first candidates for one patient
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub patient: String,
    pub candidates: Vec<Candidate>,
    #[serde(skip)]
    empty_pool: bool,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// `NoCandidates` when there were no doctors to rank at all
    pub fn warning(&self) -> Option<SchedulingError> {
        self.empty_pool.then(|| SchedulingError::NoCandidates {
            patient: self.patient.clone(),
        })
    }
}

/// Ranks `doctors` by geodesic distance from the patient to each doctor's
/// current location, nearest first. Equal distances keep pool order. Doctors
/// are only read.
pub fn rank(patient: &Patient, doctors: &[Doctor], limit: usize) -> Ranking {
    if doctors.is_empty() {
        warn!("No doctors to suggest for {}", patient.name);
        return Ranking {
            patient: patient.name.clone(),
            candidates: Vec::new(),
            empty_pool: true,
        };
    }

    let mut distances: Vec<(f64, &Doctor)> = doctors
        .iter()
        .map(|doctor| (patient.location.distance_km(&doctor.location()), doctor))
        .collect();
    // sort_by is stable, so ties stay in pool order
    distances.sort_by(|a, b| a.0.total_cmp(&b.0));

    let candidates: Vec<Candidate> = distances
        .into_iter()
        .take(limit)
        .map(|(distance_km, doctor)| Candidate {
            doctor: doctor.name.clone(),
            specialization: doctor.specialization,
            address: doctor.address.clone(),
            location: doctor.location(),
            distance_km,
        })
        .collect();

    debug!(
        "Ranked {} of {} doctors for {}",
        candidates.len(),
        doctors.len(),
        patient.name
    );

    Ranking {
        patient: patient.name.clone(),
        candidates,
        empty_pool: false,
    }
}
