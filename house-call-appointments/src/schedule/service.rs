use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::allocator::try_assign;
use super::error::SchedulingError;
use super::proximity::{rank, Ranking};
use super::snapshot::ScheduleSnapshot;
use super::types::{Appointment, CommittedAppointment, Doctor, GeoPoint, Patient};

/// A successful booking
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub doctor: String,
    pub appointment: CommittedAppointment,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnassignedPatient {
    pub patient: String,
    pub reason: String,
}

/// Outcome of a batch run over the whole queue
#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoAssignReport {
    pub assigned: Vec<Assignment>,
    pub unassigned: Vec<UnassignedPatient>,
}

/// Owns the unscheduled queue and the doctor pool for one session
#[derive(Debug, Clone)]
pub struct SchedulingService {
    patients: Vec<Patient>,
    doctors: Vec<Doctor>,
}

impl SchedulingService {
    /// Names must be unique within the queue and within the pool. The queue
    /// is kept in preferred-slot order.
    pub fn new(mut patients: Vec<Patient>, doctors: Vec<Doctor>) -> Result<Self, SchedulingError> {
        ensure_unique(patients.iter().map(|p| p.name.as_str()))?;
        ensure_unique(doctors.iter().map(|d| d.name.as_str()))?;

        patients.sort_by_key(|p| p.preferred_slot.index());

        info!(
            "Scheduling session with {} unscheduled patients and {} doctors",
            patients.len(),
            doctors.len()
        );
        Ok(SchedulingService { patients, doctors })
    }

    pub fn unscheduled(&self) -> &[Patient] {
        &self.patients
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn patient(&self, name: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.name == name)
    }

    pub fn doctor(&self, name: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.name == name)
    }

    /// Suggests doctors for a queued patient, nearest first.
    ///
    /// Every doctor is first moved to their last committed appointment so the
    /// ranking sees where each doctor actually is.
    pub fn candidates_for(&mut self, patient: &str, limit: usize) -> Result<Ranking, SchedulingError> {
        self.relocate_all();
        let patient = self
            .patient(patient)
            .ok_or_else(|| SchedulingError::UnknownPatient(patient.to_string()))?;
        Ok(rank(patient, &self.doctors, limit))
    }

    /// Books `patient` with `doctor` at the patient's preferred slot.
    ///
    /// On success the patient leaves the queue and the doctor moves to the
    /// patient's location. On failure nothing changes.
    pub fn assign(&mut self, patient: &str, doctor: &str) -> Result<Assignment, SchedulingError> {
        let position = self
            .patients
            .iter()
            .position(|p| p.name == patient)
            .ok_or_else(|| SchedulingError::UnknownPatient(patient.to_string()))?;
        let chosen = self
            .doctors
            .iter_mut()
            .find(|d| d.name == doctor)
            .ok_or_else(|| SchedulingError::UnknownDoctor(doctor.to_string()))?;

        // Relocate from what was committed before this attempt
        if chosen.relocate_to_last_appointment() {
            debug!("{} starts from their last appointment", chosen.name);
        }

        let appointment = Appointment::for_patient(&self.patients[position]);
        let slots = try_assign(chosen.schedule_mut(), appointment.clone())?;

        chosen.relocate_to_last_appointment();
        let moved_to: GeoPoint = chosen.location();
        let doctor_name = chosen.name.clone();
        self.patients.remove(position);

        info!(
            "Assigned {} to {} at {}-{}; doctor now at ({:.5}, {:.5})",
            appointment.patient_name,
            doctor_name,
            slots.first(),
            slots.last(),
            moved_to.latitude,
            moved_to.longitude
        );

        Ok(Assignment {
            doctor: doctor_name,
            appointment: CommittedAppointment { appointment, slots },
        })
    }

    /// Works through the queue in order, booking each patient with the
    /// nearest doctor that has room.
    pub fn auto_assign(&mut self, limit: usize) -> Result<AutoAssignReport, SchedulingError> {
        let mut report = AutoAssignReport::default();
        let queue: Vec<String> = self.patients.iter().map(|p| p.name.clone()).collect();

        for patient in queue {
            let ranking = self.candidates_for(&patient, limit)?;
            let mut last_error = ranking.warning();
            let mut booked = None;

            for candidate in &ranking.candidates {
                match self.assign(&patient, &candidate.doctor) {
                    Ok(assignment) => {
                        booked = Some(assignment);
                        break;
                    }
                    // No other doctor can fix a slot that runs past closing
                    Err(e @ SchedulingError::OutOfDayBounds { .. }) => {
                        last_error = Some(e);
                        break;
                    }
                    Err(e) => last_error = Some(e),
                }
            }

            match booked {
                Some(assignment) => report.assigned.push(assignment),
                None => {
                    let reason = last_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| format!("No doctors suggested for {patient}"));
                    warn!("Could not assign {}: {}", patient, reason);
                    report.unassigned.push(UnassignedPatient { patient, reason });
                }
            }
        }

        info!(
            "Auto-assign finished: {} assigned, {} left unscheduled",
            report.assigned.len(),
            report.unassigned.len()
        );
        Ok(report)
    }

    pub fn schedule_snapshot(&self) -> ScheduleSnapshot {
        ScheduleSnapshot::from_doctors(&self.doctors)
    }

    fn relocate_all(&mut self) {
        for doctor in &mut self.doctors {
            doctor.relocate_to_last_appointment();
        }
    }
}

fn ensure_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), SchedulingError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SchedulingError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::time_grid::TimeGrid;
    use crate::schedule::types::{AppointmentKind, Specialization};
    use assert_matches::assert_matches;

    fn patient(name: &str, start: usize, latitude: f64, longitude: f64) -> Patient {
        Patient {
            name: name.to_string(),
            address: format!("{name}'s flat"),
            location: GeoPoint::new(latitude, longitude),
            kind: AppointmentKind::Consultation,
            preferred_slot: TimeGrid::global().slot(start).unwrap(),
        }
    }

    fn doctor(name: &str, latitude: f64, longitude: f64) -> Doctor {
        Doctor::new(
            name,
            Specialization::GeneralMedicine,
            format!("{name}'s clinic"),
            GeoPoint::new(latitude, longitude),
        )
    }

    fn service() -> SchedulingService {
        SchedulingService::new(
            vec![
                patient("Ethan Ng", 2, 1.30, 103.90),
                patient("Aarav Raj", 0, 1.35, 103.70),
                patient("Chloe Wong", 1, 1.40, 103.80),
                patient("Kumar Singh", 17, 1.32, 103.85),
            ],
            vec![doctor("Dr West", 1.34, 103.70), doctor("Dr East", 1.31, 103.91)],
        )
        .unwrap()
    }

    #[test]
    fn queue_is_ordered_by_preferred_slot() {
        let service = service();
        let names: Vec<_> = service.unscheduled().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Aarav Raj", "Chloe Wong", "Ethan Ng", "Kumar Singh"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = SchedulingService::new(
            vec![patient("Siti Ali", 0, 1.3, 103.8), patient("Siti Ali", 3, 1.3, 103.8)],
            vec![],
        );
        assert_matches!(result, Err(SchedulingError::DuplicateName(name)) if name == "Siti Ali");

        let result = SchedulingService::new(vec![], vec![doctor("Dr A", 1.3, 103.8), doctor("Dr A", 1.4, 103.9)]);
        assert_matches!(result, Err(SchedulingError::DuplicateName(_)));
    }

    #[test]
    fn successful_assign_dequeues_and_relocates() {
        let mut service = service();
        let assignment = service.assign("Aarav Raj", "Dr East").unwrap();

        assert_eq!(assignment.doctor, "Dr East");
        assert_eq!(assignment.appointment.slots.first().index(), 0);
        assert!(service.patient("Aarav Raj").is_none());
        assert_eq!(service.unscheduled().len(), 3);

        let east = service.doctor("Dr East").unwrap();
        assert_eq!(east.location(), GeoPoint::new(1.35, 103.70));
        assert_eq!(east.home, GeoPoint::new(1.31, 103.91));
        assert_eq!(east.schedule().len(), 1);
    }

    #[test]
    fn next_ranking_sees_the_relocated_doctor() {
        let mut service = service();
        // Dr East travels to the far west
        service.assign("Aarav Raj", "Dr East").unwrap();

        let ranking = service.candidates_for("Chloe Wong", 10).unwrap();
        let east = ranking.candidates.iter().find(|c| c.doctor == "Dr East").unwrap();
        assert_eq!(east.location, GeoPoint::new(1.35, 103.70));
        assert_eq!(east.address, "Dr East's clinic");
    }

    #[test]
    fn second_assign_starts_from_the_first_booking() {
        let mut service = service();
        service.assign("Aarav Raj", "Dr East").unwrap();
        service.assign("Ethan Ng", "Dr East").unwrap();

        let east = service.doctor("Dr East").unwrap();
        assert_eq!(east.location(), GeoPoint::new(1.30, 103.90));
        let booked: Vec<_> = east
            .schedule()
            .iter()
            .map(|a| a.appointment.patient_name.as_str())
            .collect();
        assert_eq!(booked, vec!["Aarav Raj", "Ethan Ng"]);
    }

    #[test]
    fn rejected_assign_changes_nothing() {
        let mut service = service();
        service.assign("Aarav Raj", "Dr West").unwrap();
        let west_before = service.doctor("Dr West").unwrap().location();

        // {1,2,3} against {0,1,2}
        assert_matches!(
            service.assign("Chloe Wong", "Dr West"),
            Err(SchedulingError::NoAvailableBlock { patient, preferred, doctor })
                if patient == "Chloe Wong" && preferred == "09:30 AM" && doctor == "Dr West"
        );
        assert!(service.patient("Chloe Wong").is_some());
        assert_eq!(service.unscheduled().len(), 3);
        let west = service.doctor("Dr West").unwrap();
        assert_eq!(west.schedule().len(), 1);
        assert_eq!(west.location(), west_before);
    }

    #[test]
    fn late_preference_is_out_of_bounds() {
        let mut service = service();
        assert_matches!(
            service.assign("Kumar Singh", "Dr West"),
            Err(SchedulingError::OutOfDayBounds { .. })
        );
        assert!(service.patient("Kumar Singh").is_some());
    }

    #[test]
    fn unknown_names_are_reported() {
        let mut service = service();
        assert_matches!(
            service.assign("Nobody", "Dr West"),
            Err(SchedulingError::UnknownPatient(name)) if name == "Nobody"
        );
        assert_matches!(
            service.assign("Aarav Raj", "Dr Who"),
            Err(SchedulingError::UnknownDoctor(name)) if name == "Dr Who"
        );
        assert_matches!(
            service.candidates_for("Nobody", 10),
            Err(SchedulingError::UnknownPatient(_))
        );

        service.assign("Aarav Raj", "Dr West").unwrap();
        // Already booked patients are no longer in the queue
        assert_matches!(
            service.assign("Aarav Raj", "Dr East"),
            Err(SchedulingError::UnknownPatient(_))
        );
    }

    #[test]
    fn empty_pool_gives_a_warning_and_keeps_the_queue() {
        let mut service = SchedulingService::new(vec![patient("Olivia Teo", 3, 1.3, 103.8)], vec![]).unwrap();
        let ranking = service.candidates_for("Olivia Teo", 10).unwrap();
        assert!(ranking.is_empty());
        assert_matches!(ranking.warning(), Some(SchedulingError::NoCandidates { .. }));
        assert_eq!(service.unscheduled().len(), 1);
    }

    #[test]
    fn snapshot_shows_both_names_on_a_shared_boundary() {
        let mut service = service();
        service.assign("Aarav Raj", "Dr West").unwrap();
        service.assign("Ethan Ng", "Dr West").unwrap();

        let snapshot = service.schedule_snapshot();
        assert_eq!(snapshot.slots.len(), TimeGrid::global().len());
        assert_eq!(snapshot.cell("Dr West", 0).unwrap(), ["Aarav Raj".to_string()]);
        assert_eq!(
            snapshot.cell("Dr West", 2).unwrap(),
            ["Aarav Raj".to_string(), "Ethan Ng".to_string()]
        );
        assert_eq!(snapshot.cell("Dr West", 4).unwrap(), ["Ethan Ng".to_string()]);
        assert!(snapshot.cell("Dr East", 0).unwrap().is_empty());
        assert_eq!(snapshot.booked_cells(), 5);
    }

    #[test]
    fn auto_assign_books_nearest_doctors_and_reports_the_rest() {
        let mut service = service();
        let report = service.auto_assign(10).unwrap();

        let booked: Vec<_> = report
            .assigned
            .iter()
            .map(|a| (a.appointment.appointment.patient_name.as_str(), a.doctor.as_str()))
            .collect();
        // Aarav is next to Dr West. Chloe clashes with Aarav there and goes
        // to Dr East, who follows her north. Ethan then clashes with Chloe
        // and lands on Dr West, touching Aarav's block at 10:00.
        assert_eq!(
            booked,
            vec![
                ("Aarav Raj", "Dr West"),
                ("Chloe Wong", "Dr East"),
                ("Ethan Ng", "Dr West"),
            ]
        );

        assert_eq!(report.unassigned.len(), 1);
        assert_eq!(report.unassigned[0].patient, "Kumar Singh");
        assert!(report.unassigned[0].reason.contains("closing time"));
        assert_eq!(service.unscheduled().len(), 1);
    }
}
