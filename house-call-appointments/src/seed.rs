use csv::{Reader, StringRecord};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::schedule::{AppointmentKind, Doctor, GeoPoint, Patient, SchedulingError, SchedulingService, Specialization, TimeGrid};

const FIRST_NAMES: [&str; 15] = [
    "Aaliyah", "Aarav", "Chloe", "Ethan", "Isabella", "Liam", "Olivia", "Noah", "Sophia", "Lucas",
    "Mei Ling", "Jia Hao", "Siti", "Kumar", "Wei Ting",
];

const LAST_NAMES: [&str; 15] = [
    "Tan", "Lim", "Lee", "Ng", "Wong", "Chen", "Goh", "Raj", "Kumar", "Singh", "Abdullah", "Ali",
    "Hassan", "Ong", "Teo",
];

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read address catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Address catalog is missing the {0} column")]
    MissingColumn(&'static str),

    #[error("Address catalog has no usable rows")]
    EmptyCatalog,

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

impl SeedError {
    /// Stable tag for API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            SeedError::Csv(_) => "Csv",
            SeedError::Io(_) => "Io",
            SeedError::MissingColumn(_) => "MissingColumn",
            SeedError::EmptyCatalog => "EmptyCatalog",
            SeedError::Scheduling(e) => e.kind(),
        }
    }
}

/// One geocoded address from the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRecord {
    pub address: String,
    pub location: GeoPoint,
}

enum AddressColumns {
    Single(usize),
    BlockAndStreet { blk_no: usize, street: usize },
}

impl AddressColumns {
    fn read(&self, record: &StringRecord) -> String {
        match *self {
            AddressColumns::Single(col) => record.get(col).unwrap_or("").trim().to_string(),
            AddressColumns::BlockAndStreet { blk_no, street } => {
                let blk = record.get(blk_no).unwrap_or("").trim();
                let street = record.get(street).unwrap_or("").trim();
                if blk.is_empty() && street.is_empty() {
                    String::new()
                } else {
                    format!("Blk {} {}, Singapore", blk, street)
                }
            }
        }
    }
}

/// Geocoded addresses that patients and doctors are placed at.
/// Never empty once loaded.
#[derive(Debug, Clone)]
pub struct AddressCatalog {
    records: Vec<AddressRecord>,
}

impl AddressCatalog {
    pub fn from_path<P: AsRef<Path>>(csv_path: P) -> Result<Self, SeedError> {
        let path = csv_path.as_ref();
        let catalog = Self::from_csv(Reader::from_path(path)?)?;
        info!("Loaded {} addresses from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self, SeedError> {
        Self::from_csv(Reader::from_reader(rdr))
    }

    /// Accepts either an `address` column or `blk_no` + `street`, plus
    /// `latitude` and `longitude`. Rows without finite coordinates or an
    /// address are skipped.
    fn from_csv<R: io::Read>(mut reader: Reader<R>) -> Result<Self, SeedError> {
        let headers = reader.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));

        let latitude_col = find("latitude").ok_or(SeedError::MissingColumn("latitude"))?;
        let longitude_col = find("longitude").ok_or(SeedError::MissingColumn("longitude"))?;
        let address_cols = match (find("address"), find("blk_no"), find("street")) {
            (Some(col), _, _) => AddressColumns::Single(col),
            (None, Some(blk_no), Some(street)) => AddressColumns::BlockAndStreet { blk_no, street },
            _ => return Err(SeedError::MissingColumn("address")),
        };

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;

            let address = address_cols.read(&record);
            let latitude = parse_coordinate(record.get(latitude_col));
            let longitude = parse_coordinate(record.get(longitude_col));

            match (latitude, longitude) {
                (Some(latitude), Some(longitude)) if !address.is_empty() => {
                    records.push(AddressRecord {
                        address,
                        location: GeoPoint::new(latitude, longitude),
                    });
                }
                _ => warn!("Skipping catalog row {}: missing address or coordinates", row + 1),
            }
        }

        if records.is_empty() {
            return Err(SeedError::EmptyCatalog);
        }
        Ok(AddressCatalog { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AddressRecord] {
        &self.records
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> &AddressRecord {
        &self.records[rng.gen_range(0..self.records.len())]
    }
}

fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Draws synthetic patients and doctors from a catalog
pub struct SeedGenerator<'a, R: Rng> {
    catalog: &'a AddressCatalog,
    rng: R,
    used_names: HashSet<String>,
}

impl<'a, R: Rng> SeedGenerator<'a, R> {
    pub fn new(catalog: &'a AddressCatalog, rng: R) -> Self {
        SeedGenerator {
            catalog,
            rng,
            used_names: HashSet::new(),
        }
    }

    /// Patients with a random kind and a preferred slot from anywhere in the
    /// day, including starts too late to fit a full block
    pub fn patients(&mut self, count: usize) -> Vec<Patient> {
        let grid = TimeGrid::global();
        let slots: Vec<_> = grid.slots().collect();
        (0..count)
            .filter_map(|_| {
                let name = self.unique_name();
                let home = self.catalog.sample(&mut self.rng).clone();
                let kind = *AppointmentKind::ALL.choose(&mut self.rng)?;
                let preferred_slot = *slots.choose(&mut self.rng)?;
                Some(Patient {
                    name,
                    address: home.address,
                    location: home.location,
                    kind,
                    preferred_slot,
                })
            })
            .collect()
    }

    pub fn doctors(&mut self, count: usize) -> Vec<Doctor> {
        (0..count)
            .filter_map(|_| {
                let name = self.unique_name();
                let home = self.catalog.sample(&mut self.rng).clone();
                let specialization = *Specialization::ALL.choose(&mut self.rng)?;
                Some(Doctor::new(name, specialization, home.address, home.location))
            })
            .collect()
    }

    /// A random "First Last" name; repeats get a numeric suffix
    fn unique_name(&mut self) -> String {
        let first = FIRST_NAMES[self.rng.gen_range(0..FIRST_NAMES.len())];
        let last = LAST_NAMES[self.rng.gen_range(0..LAST_NAMES.len())];
        let base = format!("{} {}", first, last);
        if self.used_names.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{} {}", base, n);
            if self.used_names.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Builds a fresh session: `patients` queued patients and `doctors` doctors
/// placed at random catalog addresses. A fixed seed reproduces the session.
pub fn generate_session(
    catalog: &AddressCatalog,
    patients: usize,
    doctors: usize,
    seed: Option<u64>,
) -> Result<SchedulingService, SeedError> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut generator = SeedGenerator::new(catalog, rng);
    let patients = generator.patients(patients);
    let doctors = generator.doctors(doctors);
    Ok(SchedulingService::new(patients, doctors)?)
}
