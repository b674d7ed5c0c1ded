use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use house_call_appointments::config::AppConfig;
use house_call_appointments::display::{
    print_auto_assign_report, print_candidates, print_schedule, write_schedule_to_file,
};
use house_call_appointments::seed::{generate_session, AddressCatalog};
use house_call_appointments::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    info!("Loading address catalog from {}", config.catalog_path);
    let catalog = AddressCatalog::from_path(&config.catalog_path)?;
    let mut service = generate_session(&catalog, config.patient_count, config.doctor_count, config.rng_seed)?;

    // Check if we should run in web mode
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args.get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        println!("Starting web server on port {}...", port);
        println!("Access the API at http://localhost:{}/api/patients", port);

        web::start_server(port, AppState::new(service, config)).await?;
        return Ok(());
    }

    // CLI mode: book everyone we can, nearest doctor first
    println!("Unscheduled patients: {}", service.unscheduled().len());
    println!("Doctors on call: {}", service.doctors().len());

    if let Some(first) = service.unscheduled().first().map(|p| p.name.clone()) {
        let ranking = service.candidates_for(&first, config.suggestion_limit)?;
        print_candidates(&ranking);
    }

    let report = service.auto_assign(config.suggestion_limit)?;
    print_auto_assign_report(&report);

    let snapshot = service.schedule_snapshot();
    print_schedule("Existing Appointments", &snapshot)?;

    write_schedule_to_file("Existing Appointments", &snapshot, &config.output_path)?;
    println!("\nSchedule saved to {}", config.output_path);

    Ok(())
}
