use anyhow::{Context, Error as AnyError};
use clap::{Parser, Subcommand, ValueEnum};
use std::{fs, path::PathBuf};
use viewshed::{
    sightline::{GeoPoint, NoDataPolicy, TieBreak},
    Config, Window,
};

/// Terrain line of sight and viewsheds over elevation grids.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Elevation grid JSON document.
    #[arg(short, long)]
    pub grid: PathBuf,

    /// JSON configuration; flags below take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Distance between sightline samples, in meters (defaults to the
    /// grid's cell size).
    #[arg(long)]
    pub step: Option<f64>,

    /// Atmospheric refraction coefficient.
    #[arg(long)]
    pub refraction: Option<f64>,

    /// Ignore earth curvature.
    #[arg(long, default_value_t = false)]
    pub no_curvature: bool,

    /// How samples without elevation affect a sightline.
    #[arg(long, value_enum)]
    pub no_data_policy: Option<NoDataArg>,

    /// Terrain exactly on the sightline blocks it.
    #[arg(long, default_value_t = false)]
    pub inclusive: bool,

    /// Denoise majority window, in cells.
    #[arg(long)]
    pub window_size: Option<usize>,

    /// Denoise closing iterations.
    #[arg(long)]
    pub iterations: Option<usize>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NoDataArg {
    Blocking,
    Visible,
}

impl From<NoDataArg> for NoDataPolicy {
    fn from(arg: NoDataArg) -> Self {
        match arg {
            NoDataArg::Blocking => Self::TreatAsBlocking,
            NoDataArg::Visible => Self::TreatAsVisible,
        }
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Point to point line of sight.
    Los {
        /// Observer "lat,lon[,height]", height in meters above ground.
        #[arg(long)]
        observer: GeoPoint,

        /// Target "lat,lon[,height]", height in meters above ground.
        #[arg(long)]
        target: GeoPoint,

        #[command(subcommand)]
        format: Format,
    },

    /// Visibility of every grid cell from one observer.
    Viewshed {
        /// Observer "lat,lon[,height]", height in meters above ground.
        #[arg(long)]
        observer: GeoPoint,

        /// Restrict to "row,col,height,width" of the grid.
        #[arg(long)]
        window: Option<Window>,

        /// Height of targets above ground, in meters.
        #[arg(long, default_value_t = 0.0)]
        target_height: f64,

        /// Skip denoising.
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
}

#[derive(Debug, Subcommand, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Print the result as JSON.
    Json,

    /// Print the sampled profile as CSV.
    Csv,

    /// Plot the profile to the terminal.
    Plot,
}

impl Cli {
    /// Loads `--config`, if any, and applies flag overrides.
    pub fn config(&self) -> Result<Config, AnyError> {
        let mut config: Config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => Config::default(),
        };
        if let Some(step) = self.step {
            config.los.sample_step_meters = Some(step);
        }
        if let Some(k) = self.refraction {
            config.los.refraction_coefficient = k;
        }
        if self.no_curvature {
            config.los.earth_curvature = false;
        }
        if let Some(policy) = self.no_data_policy {
            config.los.no_data_policy = policy.into();
        }
        if self.inclusive {
            config.los.tie_break = TieBreak::Inclusive;
        }
        if let Some(window_size) = self.window_size {
            config.denoise.window_size = window_size;
        }
        if let Some(iterations) = self.iterations {
            config.denoise.iterations = iterations;
        }
        config.validate()?;
        Ok(config)
    }
}
