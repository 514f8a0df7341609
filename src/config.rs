use std::env;
use std::str::FromStr;

use chrono::FixedOffset;

use crate::error::AppError;
use crate::map::controller::SurfaceSetup;
use crate::map::surface::TileLayer;
use crate::map::viewport::ViewportController;
use crate::models::collector::Coordinate;

const SATELLITE_TILE_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";
const SATELLITE_ATTRIBUTION: &str =
    "&copy; Esri &mdash; Source: Esri, i-cubed, USDA, AEX, GeoEye, Getmapping";
const LABEL_TILE_URL: &str =
    "https://{s}.basemaps.cartocdn.com/light_only_labels/{z}/{x}/{y}.png";
const LABEL_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> &copy; CARTO";

/// Ahmedabad.
const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 23.0225,
    lng: 72.5714,
};

#[derive(Debug, Clone)]
pub struct MapConfig {
    pub satellite_tile_url: String,
    pub label_tile_url: String,
    pub label_tile_opacity: f64,
    pub default_center: Coordinate,
    pub default_zoom: u8,
    pub selected_zoom: u8,
    pub fit_padding_px: u32,
    pub route_padding_px: u32,
    pub display_offset: FixedOffset,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            satellite_tile_url: SATELLITE_TILE_URL.to_string(),
            label_tile_url: LABEL_TILE_URL.to_string(),
            label_tile_opacity: 0.7,
            default_center: DEFAULT_CENTER,
            default_zoom: 12,
            selected_zoom: 15,
            fit_padding_px: 50,
            route_padding_px: 60,
            display_offset: ist(),
        }
    }
}

impl MapConfig {
    pub fn surface_setup(&self) -> SurfaceSetup {
        SurfaceSetup {
            satellite: TileLayer {
                url_template: self.satellite_tile_url.clone(),
                attribution: SATELLITE_ATTRIBUTION.to_string(),
                opacity: 1.0,
            },
            labels: TileLayer {
                url_template: self.label_tile_url.clone(),
                attribution: LABEL_ATTRIBUTION.to_string(),
                opacity: self.label_tile_opacity,
            },
            viewport: ViewportController {
                fit_padding_px: self.fit_padding_px,
                route_padding_px: self.route_padding_px,
                selected_zoom: self.selected_zoom,
            },
            display_offset: self.display_offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected compact or json, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub update_queue_size: usize,
    pub event_buffer_size: usize,
    pub visit_radius_m: f64,
    pub max_history_entries: usize,
    pub map: MapConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            update_queue_size: 1024,
            event_buffer_size: 1024,
            visit_radius_m: 75.0,
            max_history_entries: 500,
            map: MapConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Config::default();
        let map = defaults.map;

        let offset_minutes: i32 = parse_or_default("DISPLAY_UTC_OFFSET_MINUTES", 330)?;
        let display_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            AppError::Config(format!(
                "invalid DISPLAY_UTC_OFFSET_MINUTES: {offset_minutes} is out of range"
            ))
        })?;

        let label_tile_opacity: f64 = parse_or_default("LABEL_TILE_OPACITY", map.label_tile_opacity)?;
        if !(0.0..=1.0).contains(&label_tile_opacity) {
            return Err(AppError::Config(format!(
                "invalid LABEL_TILE_OPACITY: {label_tile_opacity} not in [0, 1]"
            )));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or_default("LOG_FORMAT", defaults.log_format)?,
            update_queue_size: parse_or_default("UPDATE_QUEUE_SIZE", defaults.update_queue_size)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            visit_radius_m: parse_or_default("VISIT_RADIUS_M", defaults.visit_radius_m)?,
            max_history_entries: parse_or_default(
                "MAX_HISTORY_ENTRIES",
                defaults.max_history_entries,
            )?,
            map: MapConfig {
                satellite_tile_url: env::var("SATELLITE_TILE_URL")
                    .unwrap_or(map.satellite_tile_url),
                label_tile_url: env::var("LABEL_TILE_URL").unwrap_or(map.label_tile_url),
                label_tile_opacity,
                default_center: map.default_center,
                default_zoom: parse_or_default("DEFAULT_ZOOM", map.default_zoom)?,
                selected_zoom: parse_or_default("SELECTED_ZOOM", map.selected_zoom)?,
                fit_padding_px: parse_or_default("FIT_PADDING_PX", map.fit_padding_px)?,
                route_padding_px: parse_or_default("ROUTE_PADDING_PX", map.route_padding_px)?,
                display_offset,
            },
        })
    }
}

fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("valid IST offset")
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Config(format!("{key}: {err}"))),
        Err(_) => Ok(default),
    }
}
