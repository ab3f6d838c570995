//! Config validation CLI tool
//!
//! Validates a salas configuration file and reports any errors.

use salas_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a salas configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match salas_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", salas_config::CURRENT_CONFIG_VERSION);
            println!("  Database: {}", policy.store.database.display());
            println!(
                "  Rules: {} min/day, {} active/week, {} month sanctions",
                policy.rules.daily_quota.num_minutes(),
                policy.rules.weekly_active_limit,
                policy.rules.sanction_months
            );
            println!("  Programs: {}", policy.catalog.programs.len());
            println!("  Rooms: {}", policy.catalog.rooms.len());
            println!("  Slots: {}", policy.catalog.slots.len());
            println!("  Participants: {}", policy.catalog.participants.len());

            if !policy.catalog.rooms.is_empty() {
                println!();
                println!("Rooms:");
                for room in &policy.catalog.rooms {
                    println!(
                        "  - {} [{}]: capacity {}",
                        room.room_ref(),
                        room.room_type,
                        room.capacity
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                salas_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                salas_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                salas_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                salas_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        salas_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
