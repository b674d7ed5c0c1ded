use serde::Serialize;

use super::time_grid::TimeGrid;
use super::types::Doctor;

/// One doctor's day: for every grid slot, the patients holding it
#[derive(Debug, Clone, Serialize)]
pub struct DoctorRow {
    pub doctor: String,
    pub cells: Vec<Vec<String>>,
}

/// Read-only Doctor × TimeSlot view of every committed appointment.
///
/// Boundary-sharing appointments both appear in the shared cell; nothing is
/// overwritten.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleSnapshot {
    pub slots: Vec<String>,
    pub rows: Vec<DoctorRow>,
}

impl ScheduleSnapshot {
    pub fn from_doctors(doctors: &[Doctor]) -> Self {
        let grid = TimeGrid::global();
        let rows = doctors
            .iter()
            .map(|doctor| {
                let mut cells = vec![Vec::new(); grid.len()];
                for committed in doctor.schedule().iter() {
                    for slot in committed.slots.iter() {
                        cells[slot.index()].push(committed.appointment.patient_name.clone());
                    }
                }
                DoctorRow {
                    doctor: doctor.name.clone(),
                    cells,
                }
            })
            .collect();

        ScheduleSnapshot {
            slots: grid.labels().to_vec(),
            rows,
        }
    }

    /// Patients in `doctor`'s row at slot `index`
    pub fn cell(&self, doctor: &str, index: usize) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.doctor == doctor)
            .and_then(|row| row.cells.get(index))
            .map(Vec::as_slice)
    }

    pub fn booked_cells(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .filter(|cell| !cell.is_empty())
            .count()
    }
}
