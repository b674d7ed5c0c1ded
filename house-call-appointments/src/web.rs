use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::schedule::{Candidate, GeoPoint, SchedulingError, SchedulingService, Specialization};
use crate::seed::{generate_session, AddressCatalog};

/// One scheduling session shared by every request. The mutex makes each
/// ranking and assignment a single critical section over the queue and the
/// doctor pool.
pub struct AppState {
    pub service: Mutex<SchedulingService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(service: SchedulingService, config: AppConfig) -> Self {
        AppState {
            service: Mutex::new(service),
            config,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SchedulingService>> {
        self.service
            .lock()
            .map_err(|_| actix_web::error::ErrorInternalServerError("Scheduling state is unavailable"))
    }
}

#[derive(Deserialize)]
pub struct AssignRequest {
    patient: String,
    doctor: String,
}

#[derive(Deserialize)]
pub struct CandidatesQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
pub struct CandidatesResponse {
    patient: String,
    candidates: Vec<Candidate>,
    labels: Vec<String>,
    warning: Option<String>,
}

#[derive(Serialize)]
pub struct DoctorStatus {
    name: String,
    specialization: Specialization,
    address: String,
    home: GeoPoint,
    location: GeoPoint,
    appointments: usize,
}

fn error_response(err: &SchedulingError) -> HttpResponse {
    let mut builder = match err {
        SchedulingError::UnknownPatient(_) | SchedulingError::UnknownDoctor(_) => HttpResponse::NotFound(),
        SchedulingError::NoAvailableBlock { .. } => HttpResponse::Conflict(),
        SchedulingError::OutOfDayBounds { .. } | SchedulingError::UnknownTimeSlot(_) => {
            HttpResponse::UnprocessableEntity()
        }
        _ => HttpResponse::BadRequest(),
    };
    builder.json(serde_json::json!({
        "success": false,
        "error": err.to_string(),
        "kind": err.kind(),
    }))
}

// Unscheduled queue, in preferred-slot order
async fn list_patients(state: web::Data<AppState>) -> Result<HttpResponse> {
    let service = state.lock()?;
    Ok(HttpResponse::Ok().json(service.unscheduled()))
}

async fn list_doctors(state: web::Data<AppState>) -> Result<HttpResponse> {
    let service = state.lock()?;
    let doctors: Vec<DoctorStatus> = service
        .doctors()
        .iter()
        .map(|d| DoctorStatus {
            name: d.name.clone(),
            specialization: d.specialization,
            address: d.address.clone(),
            home: d.home,
            location: d.location(),
            appointments: d.schedule().len(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(doctors))
}

async fn get_candidates(
    patient: web::Path<String>,
    query: web::Query<CandidatesQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(state.config.suggestion_limit);
    let mut service = state.lock()?;

    match service.candidates_for(&patient, limit) {
        Ok(ranking) => Ok(HttpResponse::Ok().json(CandidatesResponse {
            warning: ranking.warning().map(|w| w.to_string()),
            labels: ranking.candidates.iter().map(Candidate::label).collect(),
            patient: ranking.patient,
            candidates: ranking.candidates,
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn assign(req: web::Json<AssignRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut service = state.lock()?;
    match service.assign(&req.patient, &req.doctor) {
        Ok(assignment) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "assignment": assignment,
        }))),
        Err(e) => {
            warn!("Assignment of {} to {} rejected: {}", req.patient, req.doctor, e);
            Ok(error_response(&e))
        }
    }
}

async fn auto_assign(state: web::Data<AppState>) -> Result<HttpResponse> {
    let limit = state.config.suggestion_limit;
    let mut service = state.lock()?;
    match service.auto_assign(limit) {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_schedule(state: web::Data<AppState>) -> Result<HttpResponse> {
    let service = state.lock()?;
    Ok(HttpResponse::Ok().json(service.schedule_snapshot()))
}

// Replaces the session with one generated from an uploaded address catalog
async fn upload_catalog(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    let config = &state.config;
    let session = AddressCatalog::from_reader(body.as_ref()).and_then(|catalog| {
        generate_session(&catalog, config.patient_count, config.doctor_count, config.rng_seed)
    });

    match session {
        Ok(session) => {
            let (patients, doctors) = (session.unscheduled().len(), session.doctors().len());
            *state.lock()? = session;
            info!("Session regenerated from uploaded catalog");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "patients": patients,
                "doctors": doctors,
            })))
        }
        Err(e) => {
            warn!("Rejected uploaded catalog: {}", e);
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Failed to process catalog: {}", e),
                "kind": e.kind(),
            })))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/patients", web::get().to(list_patients))
        .route("/api/patients/{name}/candidates", web::get().to(get_candidates))
        .route("/api/doctors", web::get().to(list_doctors))
        .route("/api/assign", web::post().to(assign))
        .route("/api/auto-assign", web::post().to(auto_assign))
        .route("/api/schedule", web::get().to(get_schedule))
        .route("/api/catalog", web::post().to(upload_catalog));
}

pub async fn start_server(port: u16, state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(state);

    info!("Listening on 0.0.0.0:{}", port);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
