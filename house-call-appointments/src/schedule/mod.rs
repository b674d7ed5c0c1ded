pub mod error;
pub mod time_grid;
pub mod types;
pub mod overlap;
pub mod allocator;
pub mod proximity;
pub mod snapshot;
pub mod service;

pub use error::SchedulingError;
pub use time_grid::{OccupiedSlots, TimeGrid, TimeSlot};
pub use types::{Appointment, AppointmentKind, CommittedAppointment, Doctor, DoctorSchedule, GeoPoint, Patient, Specialization};
pub use allocator::try_assign;
pub use proximity::{rank, Candidate, Ranking, DEFAULT_SUGGESTIONS};
pub use snapshot::{DoctorRow, ScheduleSnapshot};
pub use service::{Assignment, AutoAssignReport, SchedulingService, UnassignedPatient};
