use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kma_core::{Config, WeatherData, WeatherService};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "kma-weather", version, about = "KMA weather lookup CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the KMA data portal service key.
    Configure,

    /// Show current, hourly and 3-day weather for a coordinate.
    Show {
        /// Latitude in decimal degrees, e.g. 37.5665.
        latitude: f64,

        /// Longitude in decimal degrees, e.g. 126.9780.
        longitude: f64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                latitude,
                longitude,
            } => show(latitude, longitude).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = inquire::Password::new("KMA service key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read service key")?;

    config.set_service_key(key);
    config.save()?;

    println!(
        "Service key saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn show(latitude: f64, longitude: f64) -> Result<()> {
    let config = Config::load()?;
    let service = WeatherService::from_config(&config)?;

    let weather = service
        .get_weather(latitude, longitude)
        .await
        .with_context(|| format!("Failed to fetch weather for ({latitude}, {longitude})"))?;

    print_weather(&weather);
    Ok(())
}

fn print_weather(weather: &WeatherData) {
    println!(
        "Now: {:.1}°C  {} / {}",
        weather.temperature,
        weather.sky.label(),
        weather.precipitation.label()
    );
    println!(
        "Humidity {:.0}%  Wind {:.1} m/s  Low {:.1}°C  High {:.1}°C",
        weather.humidity, weather.wind_speed, weather.min_temp, weather.max_temp
    );

    if !weather.hourly.is_empty() {
        println!();
        println!("Next hours:");
        for slot in &weather.hourly {
            println!(
                "  {}  {:>5.1}°C  {} / {}",
                slot.time,
                slot.temperature,
                slot.sky.label(),
                slot.precipitation.label()
            );
        }
    }

    println!();
    println!("Outlook:");
    for day in &weather.daily {
        println!(
            "  {:<16} {:>5.1}°C .. {:>5.1}°C  {} / {}",
            day.label,
            day.min_temp,
            day.max_temp,
            day.sky.label(),
            day.precipitation.label()
        );
    }

    println!();
    println!(
        "Bulletins: current {}, daily {}",
        weather.bulletin_time_instant, weather.bulletin_time_daily
    );
}
