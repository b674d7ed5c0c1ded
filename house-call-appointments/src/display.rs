use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::schedule::{AutoAssignReport, Ranking, ScheduleSnapshot};

/// A grid cell: "-" when free, otherwise every patient holding the slot
pub fn format_cell(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(" / ")
    }
}

/// Renders the snapshot as a fixed-width table, one row per doctor
pub fn render_schedule<W: Write>(out: &mut W, snapshot: &ScheduleSnapshot) -> io::Result<()> {
    let doctor_width = snapshot
        .rows
        .iter()
        .map(|r| r.doctor.len())
        .chain(std::iter::once("Doctor".len()))
        .max()
        .unwrap_or(0);

    // Column width per slot: widest of the label and every cell beneath it
    let widths: Vec<usize> = snapshot
        .slots
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            snapshot
                .rows
                .iter()
                .filter_map(|r| r.cells.get(idx))
                .map(|cell| format_cell(cell).len())
                .chain(std::iter::once(label.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    write!(out, "{:<width$}", "Doctor", width = doctor_width)?;
    for (label, width) in snapshot.slots.iter().zip(&widths) {
        write!(out, " | {:<width$}", label, width = width)?;
    }
    writeln!(out)?;

    for row in &snapshot.rows {
        write!(out, "{:<width$}", row.doctor, width = doctor_width)?;
        for (cell, width) in row.cells.iter().zip(&widths) {
            write!(out, " | {:<width$}", format_cell(cell), width = width)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Prints the snapshot to stdout
pub fn print_schedule(title: &str, snapshot: &ScheduleSnapshot) -> io::Result<()> {
    println!("\n=== {} ===", title);
    println!("Booked doctor-slots: {}", snapshot.booked_cells());
    let stdout = io::stdout();
    render_schedule(&mut stdout.lock(), snapshot)
}

/// Writes the snapshot to `filename` under a "** title **" header
pub fn write_schedule_to_file<P: AsRef<Path>>(
    title: &str,
    snapshot: &ScheduleSnapshot,
    filename: P,
) -> io::Result<()> {
    let mut file = File::create(filename)?;
    writeln!(file, "** {} **", title)?;
    render_schedule(&mut file, snapshot)
}

pub fn print_candidates(ranking: &Ranking) {
    println!("\nSuggested doctors for {}:", ranking.patient);
    if let Some(warning) = ranking.warning() {
        println!("  ⚠️  {}", warning);
        return;
    }
    for (n, candidate) in ranking.candidates.iter().enumerate() {
        let label = candidate.label().replace('\n', "\n     ");
        println!("  {:>2}. {}", n + 1, label);
    }
}

pub fn print_auto_assign_report(report: &AutoAssignReport) {
    println!("\n=== Auto-assign ===");
    println!("Appointments assigned: {}", report.assigned.len());
    for assignment in &report.assigned {
        let committed = &assignment.appointment;
        println!(
            "  {} ({}) -> {} at {}-{}",
            committed.appointment.patient_name,
            committed.appointment.kind,
            assignment.doctor,
            committed.slots.first(),
            committed.slots.last()
        );
    }

    if !report.unassigned.is_empty() {
        println!("⚠️  Unassigned patients ({}):", report.unassigned.len());
        for unassigned in &report.unassigned {
            println!("  - {}: {}", unassigned.patient, unassigned.reason);
        }
    }
}
