mod grid;
mod options;

use anyhow::Error as AnyError;
use clap::Parser;
use grid::GridFile;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use options::{Cli, Command as CliCmd, Format};
use serde::Serialize;
use std::io::Write;
use textplots::{Chart, Plot, Shape};
use viewshed::{
    dem::{ElevationGrid, Equirectangular, Projection},
    sightline::{line_of_sight, GeoPoint, PointLos},
    Config, PointLosReport, Viewshed, ViewshedReport, Window,
};

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();
    env_logger::init();

    let config = cli.config()?;
    let (grid, projection) = GridFile::load(&cli.grid)?.into_grid()?;

    match cli.cmd {
        CliCmd::Los {
            observer,
            target,
            format,
        } => {
            let los = line_of_sight(&grid, projection, observer, target, &config.los)?;
            match format {
                Format::Json => print_json(&PointLosReport::from(&los))?,
                Format::Csv => print_csv(&los, &projection)?,
                Format::Plot => plot_ascii(&los),
            }
        }
        CliCmd::Viewshed {
            observer,
            window,
            target_height,
            raw,
        } => {
            let report = run_viewshed(
                &grid,
                projection,
                &config,
                observer,
                target_height,
                window,
                raw,
            )?;
            print_json(&report)?;
        }
    }
    Ok(())
}

fn run_viewshed(
    grid: &ElevationGrid,
    projection: Equirectangular,
    config: &Config,
    observer: GeoPoint,
    target_height: f64,
    window: Option<Window>,
    raw: bool,
) -> Result<ViewshedReport, AnyError> {
    let window = window.unwrap_or_else(|| Window::full(grid));
    let progress = ProgressBar::new(window.height as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40} {pos}/{len} rows [{elapsed}]",
    )?);

    let mut viewshed = Viewshed::builder()
        .observer(observer)
        .target_height(target_height)
        .window(window)
        .config(config.los)
        .on_row(|| progress.inc(1))
        .build(grid, projection)?;
    progress.finish_and_clear();

    let denoise = if raw {
        None
    } else {
        Some(viewshed.raster.denoise(&config.denoise)?)
    };
    Ok(ViewshedReport::new(&viewshed, denoise))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AnyError> {
    let json = serde_json::to_string(value)?;
    println!("{json}");
    Ok(())
}

/// # Example with gnuplot
///
/// ```sh
/// cargo run -- --grid=dem.json los --observer=46.5,7.5,10 --target=46.52,7.55 csv | tr ',' ' ' > ~/.tmp/plot && gnuplot -p -e "plot for [col=4:5] '~/.tmp/plot' using 1:col with lines"
/// ```
fn print_csv(los: &PointLos, projection: &Equirectangular) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "Distance,Longitude,Latitude,Sightline,Terrain,Curvature"
    )?;
    for (sample, curvature) in los.profile.samples.iter().zip(&los.profile.curvature_m) {
        let location = projection.to_geographic(sample.position);
        let terrain = sample
            .terrain_m
            .map_or_else(|_| String::new(), |terrain| terrain.to_string());
        let fields = [
            sample.distance_m.to_string(),
            location.x.to_string(),
            location.y.to_string(),
            sample.sightline_m.to_string(),
            terrain,
            curvature.to_string(),
        ];
        writeln!(stdout, "{}", fields.iter().join(","))?;
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn plot_ascii(los: &PointLos) {
    let terrain: Vec<(f32, f32)> = los
        .profile
        .corrected_terrain()
        .map(|(distance, elevation)| (distance as f32, elevation as f32))
        .collect();
    let sightline: Vec<(f32, f32)> = los
        .profile
        .samples
        .iter()
        .map(|sample| (sample.distance_m as f32, sample.sightline_m as f32))
        .collect();
    Chart::new(300, 150, 0.0, los.distance_m().max(1.0) as f32)
        .lineplot(&Shape::Lines(&terrain))
        .lineplot(&Shape::Lines(&sightline))
        .display();
    match (los.visible(), los.result.obstruction) {
        (true, _) => println!("visible, clearance: {:?}", los.clearance_m()),
        (false, Some(obstruction)) => println!(
            "blocked at {:.1}m ({:?})",
            obstruction.distance_m, obstruction.cause
        ),
        (false, None) => println!("blocked"),
    }
}
