use thiserror::Error;

/// Every way a ranking or assignment request can be turned down.
/// None of these leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("Preferred slot of {preferred} cannot fit 1.5 hours before closing time for {patient}")]
    OutOfDayBounds { patient: String, preferred: String },

    #[error("No available 1.5-hour block (with 30-min boundary overlap) for {patient} at {preferred} with {doctor}")]
    NoAvailableBlock {
        patient: String,
        preferred: String,
        doctor: String,
    },

    #[error("Patient not found in the unscheduled queue: {0}")]
    UnknownPatient(String),

    #[error("Doctor not found: {0}")]
    UnknownDoctor(String),

    #[error("No doctors available to suggest for {patient}")]
    NoCandidates { patient: String },

    #[error("Time slot is invalid or out of range: {0}")]
    UnknownTimeSlot(String),

    #[error("Name is already taken: {0}")]
    DuplicateName(String),
}

impl SchedulingError {
    /// Variant name, used as a stable machine-readable tag in API responses
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulingError::OutOfDayBounds { .. } => "OutOfDayBounds",
            SchedulingError::NoAvailableBlock { .. } => "NoAvailableBlock",
            SchedulingError::UnknownPatient(_) => "UnknownPatient",
            SchedulingError::UnknownDoctor(_) => "UnknownDoctor",
            SchedulingError::NoCandidates { .. } => "NoCandidates",
            SchedulingError::UnknownTimeSlot(_) => "UnknownTimeSlot",
            SchedulingError::DuplicateName(_) => "DuplicateName",
        }
    }
}
