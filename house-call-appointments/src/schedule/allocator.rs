use tracing::{debug, warn};

use super::error::SchedulingError;
use super::overlap::overlap_allowed;
use super::time_grid::{OccupiedSlots, TimeGrid};
use super::types::{Appointment, CommittedAppointment, DoctorSchedule};

/// Places `appointment` on `schedule` as a 90-minute block starting at its
/// preferred slot.
///
/// The block is committed only if it is compatible with every appointment
/// already on the schedule under [`overlap_allowed`]. On rejection the
/// schedule is left exactly as it was.
pub fn try_assign(
    schedule: &mut DoctorSchedule,
    appointment: Appointment,
) -> Result<OccupiedSlots, SchedulingError> {
    let preferred = appointment.preferred_slot;

    let Some(block) = TimeGrid::global().block_starting_at(preferred.index()) else {
        warn!(
            "Preferred slot {} for {} runs past closing time",
            preferred, appointment.patient_name
        );
        return Err(SchedulingError::OutOfDayBounds {
            patient: appointment.patient_name,
            preferred: preferred.label().to_string(),
        });
    };

    let candidate = block.indices();
    let conflict = schedule
        .iter()
        .find(|existing| !overlap_allowed(&existing.slots.indices(), &candidate));

    if let Some(existing) = conflict {
        warn!(
            "Block {}-{} for {} conflicts with {} on {}'s schedule",
            block.first(),
            block.last(),
            appointment.patient_name,
            existing.appointment.patient_name,
            schedule.doctor()
        );
        return Err(SchedulingError::NoAvailableBlock {
            patient: appointment.patient_name,
            preferred: preferred.label().to_string(),
            doctor: schedule.doctor().to_string(),
        });
    }

    debug!(
        "Committing {} to {} at {}-{}",
        appointment.patient_name,
        schedule.doctor(),
        block.first(),
        block.last()
    );
    schedule.push(CommittedAppointment {
        appointment,
        slots: block,
    });

    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::{AppointmentKind, GeoPoint};
    use assert_matches::assert_matches;

    fn appointment(patient: &str, start: usize) -> Appointment {
        Appointment {
            patient_name: patient.to_string(),
            kind: AppointmentKind::Consultation,
            location: GeoPoint::new(1.35, 103.8),
            preferred_slot: TimeGrid::global().slot(start).unwrap(),
        }
    }

    fn booked_indices(schedule: &DoctorSchedule) -> Vec<Vec<usize>> {
        schedule
            .iter()
            .map(|a| a.slots.indices().into_iter().collect())
            .collect()
    }

    #[test]
    fn preferred_slot_is_the_start_of_the_block() {
        let mut schedule = DoctorSchedule::new("Dr A");
        let slots = try_assign(&mut schedule, appointment("Siti Ali", 4)).unwrap();
        assert_eq!(slots.indices().into_iter().collect::<Vec<_>>(), vec![4, 5, 6]);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.last().unwrap().slots, slots);
    }

    #[test]
    fn boundary_touching_and_interior_overlaps() {
        let mut schedule = DoctorSchedule::new("Dr D");
        try_assign(&mut schedule, appointment("First", 0)).unwrap();

        // {2,3,4} meets {0,1,2} at slot 2
        assert!(try_assign(&mut schedule, appointment("Boundary", 2)).is_ok());

        let mut fresh = DoctorSchedule::new("Dr D");
        try_assign(&mut fresh, appointment("First", 0)).unwrap();
        // {1,2,3} shares 1 and 2
        assert_matches!(
            try_assign(&mut fresh, appointment("Interior", 1)),
            Err(SchedulingError::NoAvailableBlock { patient, doctor, .. })
                if patient == "Interior" && doctor == "Dr D"
        );
        assert!(try_assign(&mut fresh, appointment("Later", 5)).is_ok());
    }

    #[test]
    fn rejection_leaves_schedule_untouched() {
        let mut schedule = DoctorSchedule::new("Dr B");
        try_assign(&mut schedule, appointment("First", 3)).unwrap();
        let before = booked_indices(&schedule);

        assert!(try_assign(&mut schedule, appointment("Clash", 3)).is_err());
        assert!(try_assign(&mut schedule, appointment("Late", 17)).is_err());

        assert_eq!(schedule.len(), 1);
        assert_eq!(booked_indices(&schedule), before);
        assert_eq!(schedule.last().unwrap().appointment.patient_name, "First");
    }

    #[test]
    fn last_fitting_start_succeeds_and_the_next_is_out_of_bounds() {
        let grid = TimeGrid::global();
        let last_start = grid.last_index() - 2;

        let mut schedule = DoctorSchedule::new("Dr C");
        let slots = try_assign(&mut schedule, appointment("Evening", last_start)).unwrap();
        assert_eq!(slots.first().label(), "04:30 PM");
        assert_eq!(slots.last().index(), grid.last_index());

        assert_matches!(
            try_assign(&mut schedule, appointment("Too Late", last_start + 1)),
            Err(SchedulingError::OutOfDayBounds { patient, preferred })
                if patient == "Too Late" && preferred == "05:00 PM"
        );
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn committed_blocks_never_double_book() {
        let grid = TimeGrid::global();
        let mut schedule = DoctorSchedule::new("Dr E");
        // Throw every start at the schedule, twice, in a scrambled order
        let starts: Vec<usize> = (0..grid.len()).rev().chain((0..grid.len()).step_by(2)).collect();
        for (n, start) in starts.into_iter().enumerate() {
            let _ = try_assign(&mut schedule, appointment(&format!("P{n}"), start));
        }
        assert!(!schedule.is_empty());

        let blocks: Vec<_> = schedule.iter().map(|a| a.slots.indices()).collect();
        for (i, a) in blocks.iter().enumerate() {
            for b in blocks.iter().skip(i + 1) {
                let shared: Vec<_> = a.intersection(b).copied().collect();
                assert!(shared.len() <= 1, "{a:?} and {b:?} share {shared:?}");
                if let [only] = shared.as_slice() {
                    let edge = (a.last() == Some(only) && b.first() == Some(only))
                        || (b.last() == Some(only) && a.first() == Some(only));
                    assert!(edge, "{a:?} and {b:?} share interior slot {only}");
                }
            }
        }
    }
}
