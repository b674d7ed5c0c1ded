use std::fmt;

use geo::{GeodesicDistance, Point};
use serde::{Deserialize, Serialize};

use super::time_grid::{OccupiedSlots, TimeSlot};

/// Latitude/longitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint { latitude, longitude }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Geodesic (WGS-84 ellipsoid) distance in kilometers
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        // geo points are (x = longitude, y = latitude)
        let from = Point::new(self.longitude, self.latitude);
        let to = Point::new(other.longitude, other.latitude);
        from.geodesic_distance(&to) / 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentKind {
    Consultation,
    #[serde(rename = "Baby Vaccines")]
    BabyVaccines,
}

impl AppointmentKind {
    pub const ALL: [AppointmentKind; 2] = [AppointmentKind::Consultation, AppointmentKind::BabyVaccines];
}

impl fmt::Display for AppointmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentKind::Consultation => f.write_str("Consultation"),
            AppointmentKind::BabyVaccines => f.write_str("Baby Vaccines"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialization {
    #[serde(rename = "General Medicine")]
    GeneralMedicine,
    Pediatrics,
}

impl Specialization {
    pub const ALL: [Specialization; 2] = [Specialization::GeneralMedicine, Specialization::Pediatrics];
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specialization::GeneralMedicine => f.write_str("General Medicine"),
            Specialization::Pediatrics => f.write_str("Pediatrics"),
        }
    }
}

/// Someone waiting for a house call
#[derive(Debug, Clone, Serialize)]
pub struct Patient {
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
    pub kind: AppointmentKind,
    pub preferred_slot: TimeSlot,
}

/// An appointment that has not been placed on any schedule yet
#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub patient_name: String,
    pub kind: AppointmentKind,
    pub location: GeoPoint,
    pub preferred_slot: TimeSlot,
}

impl Appointment {
    pub fn for_patient(patient: &Patient) -> Self {
        Appointment {
            patient_name: patient.name.clone(),
            kind: patient.kind,
            location: patient.location,
            preferred_slot: patient.preferred_slot,
        }
    }
}

/// An appointment together with the block it holds on a doctor's calendar
#[derive(Debug, Clone, Serialize)]
pub struct CommittedAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub slots: OccupiedSlots,
}

/// Committed appointments for one doctor, in booking order.
/// Appointments only enter through the slot allocator.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorSchedule {
    doctor: String,
    appointments: Vec<CommittedAppointment>,
}

impl DoctorSchedule {
    pub fn new(doctor: impl Into<String>) -> Self {
        DoctorSchedule {
            doctor: doctor.into(),
            appointments: Vec::new(),
        }
    }

    pub fn doctor(&self) -> &str {
        &self.doctor
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommittedAppointment> {
        self.appointments.iter()
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    /// Most recently committed appointment
    pub fn last(&self) -> Option<&CommittedAppointment> {
        self.appointments.last()
    }

    pub(crate) fn push(&mut self, appointment: CommittedAppointment) {
        self.appointments.push(appointment);
    }
}

/// A mobile provider. `location` starts at home and follows the doctor to
/// each newly booked appointment.
#[derive(Debug, Clone, Serialize)]
pub struct Doctor {
    pub name: String,
    pub specialization: Specialization,
    pub address: String,
    pub home: GeoPoint,
    location: GeoPoint,
    schedule: DoctorSchedule,
}

impl Doctor {
    pub fn new(name: impl Into<String>, specialization: Specialization, address: impl Into<String>, home: GeoPoint) -> Self {
        let name = name.into();
        Doctor {
            schedule: DoctorSchedule::new(name.clone()),
            name,
            specialization,
            address: address.into(),
            home,
            location: home,
        }
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn schedule(&self) -> &DoctorSchedule {
        &self.schedule
    }

    pub(crate) fn schedule_mut(&mut self) -> &mut DoctorSchedule {
        &mut self.schedule
    }

    /// Moves the doctor to their last committed appointment.
    /// Returns false (and stays put) when nothing is booked yet.
    pub(crate) fn relocate_to_last_appointment(&mut self) -> bool {
        match self.schedule.last() {
            Some(last) => {
                self.location = last.appointment.location;
                true
            }
            None => false,
        }
    }
}
